use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use geom::{Angle, Distance, Pt2D};
use marking_model::host::{ConnectionInput, ContourCurve, JunctionInput, LaneInput, NetworkClass};
use marking_model::{
    ContourStatus, EntranceID, FillerContour, FillerVertex, IntersectionEngine, LaneSlot,
    LineEdge, LineKind, LineStyle, Markup, MarkupConfig, PointID, PointKind, PointLocation,
    PointPair, PointSource,
};

// Four roads meeting at right angles, each with two 3m lanes, entrances 10m from the center.
fn crossroads() -> JunctionInput {
    let mut connections = Vec::new();
    for (i, degrees) in [0.0, 90.0, 180.0, 270.0].into_iter().enumerate() {
        let outward = Angle::degrees(degrees);
        let center = Pt2D::new(0.0, 0.0).project_away(Distance::meters(10.0), outward);
        let corner_dir = outward.rotate_degs(-90.0);
        connections.push(ConnectionInput {
            id: EntranceID(i as u16 + 1),
            is_start_side: true,
            lanes: [-1.5, 1.5]
                .into_iter()
                .map(|offset| lane(offset, 1.5, outward.opposite()))
                .collect(),
            left_corner: center.project_away(Distance::meters(-3.0), corner_dir),
            right_corner: center.project_away(Distance::meters(3.0), corner_dir),
            left_corner_dir: outward.opposite(),
            right_corner_dir: outward.opposite(),
        });
    }
    let mut contour = Vec::new();
    for i in 0..connections.len() {
        let next = &connections[(i + 1) % connections.len()];
        contour.push(ContourCurve::Straight {
            a: connections[i].right_corner,
            b: connections[i].left_corner,
        });
        contour.push(ContourCurve::Straight {
            a: connections[i].left_corner,
            b: next.right_corner,
        });
    }
    JunctionInput {
        connections,
        contour,
    }
}

fn lane(center: f64, half_width: f64, direction: Angle) -> LaneInput {
    LaneInput {
        center_offset: Distance::meters(center),
        half_width: Distance::meters(half_width),
        direction,
        network: NetworkClass::Car,
    }
}

fn enter(entrance: u16, index: u8) -> PointID {
    PointID::new(EntranceID(entrance), index, PointKind::Enter)
}

fn regular() -> LineKind {
    LineKind::Regular { rules: Vec::new() }
}

#[test]
fn point_pairs_ignore_order() {
    let a = enter(1, 2);
    let b = PointID::new(EntranceID(3), 1, PointKind::Normal);
    assert_eq!(PointPair::new(a, b), PointPair::new(b, a));
    assert_eq!(
        PointPair::new(a, b).hash_u64(),
        PointPair::new(b, a).hash_u64()
    );
}

#[test]
fn contour_completes_on_fourth_add() {
    let mut contour = FillerContour::new();
    let vertices = [enter(1, 1), enter(1, 2), enter(2, 3), enter(1, 1)];
    for (i, pt) in vertices.into_iter().enumerate() {
        let status = contour.add(FillerVertex::Point(pt));
        if i < 3 {
            assert_eq!(status, ContourStatus::Open);
            assert!(!contour.is_closed());
            assert!(!contour.is_empty());
        } else {
            assert_eq!(status, ContourStatus::Complete);
            assert!(contour.is_closed());
        }
    }
}

#[test]
fn separated_lanes_split_into_two_anchors() {
    let direction = Angle::degrees(180.0);
    let lanes = vec![lane(-2.0, 1.5, direction), lane(2.0, 1.5, direction)];
    let slots = LaneSlot::from_lanes(&lanes.iter().collect::<Vec<_>>());
    let sources = PointSource::classify(&slots, true);
    let locations: Vec<PointLocation> = sources.iter().map(|s| s.location).collect();
    assert_eq!(
        locations,
        vec![
            PointLocation::LeftEdge,
            PointLocation::RightEdge,
            PointLocation::LeftEdge,
            PointLocation::RightEdge,
        ]
    );
    assert_eq!(sources[1].lateral(), Distance::meters(-0.5));
    assert_eq!(sources[2].lateral(), Distance::meters(0.5));
}

#[test]
fn collinear_entrances_make_a_straight_line() {
    let mut markup = Markup::new(&crossroads(), MarkupConfig::default());
    let line = PointPair::new(enter(1, 2), enter(3, 2));
    markup.add_line(line, regular());
    let trajectory = markup.trajectory(line).unwrap();
    assert!(trajectory.is_straight());
    assert!(trajectory
        .position(0.5)
        .approx_eq(Pt2D::new(0.0, 0.0), Distance::meters(1e-9)));
}

#[test]
fn intersections_dont_depend_on_argument_order() {
    let mut markup = Markup::new(&crossroads(), MarkupConfig::default());
    let a = PointPair::new(enter(1, 1), enter(3, 2));
    let b = PointPair::new(enter(2, 2), enter(4, 3));
    markup.add_line(a, regular());
    markup.add_line(b, regular());

    let ta = markup.trajectory(a).unwrap().clone();
    let tb = markup.trajectory(b).unwrap().clone();
    let forwards = IntersectionEngine::new().calculate(a, &ta, b, &tb);
    let backwards = IntersectionEngine::new().calculate(b, &tb, a, &ta);
    assert!(forwards.is_intersect);
    assert!((forwards.t_for(a) - backwards.t_for(a)).abs() < 1e-9);
    assert!((forwards.t_for(b) - backwards.t_for(b)).abs() < 1e-9);

    let cached = markup.intersection(a, b).unwrap();
    assert_eq!(cached, markup.intersection(b, a).unwrap());
    assert!((cached.t_for(a) - forwards.t_for(a)).abs() < 1e-9);
}

#[test]
fn offsets_survive_a_save() {
    let junction = crossroads();
    let mut markup = Markup::new(&junction, MarkupConfig::default());
    let moved = [
        (enter(2, 1), 0.75),
        (enter(4, 3), -1.25),
        (PointID::new(EntranceID(1), 2, PointKind::Crosswalk), 2.0),
        (PointID::new(EntranceID(3), 1, PointKind::Normal), -0.5),
    ];
    for (id, offset) in moved {
        markup.set_point_offset(id, Distance::meters(offset));
    }

    let json = abstutil::to_json(&markup.to_document());
    let doc = serde_json::from_str(&json).unwrap();
    let mut fresh = Markup::new(&junction, MarkupConfig::default());
    let report = fresh.load_document(&doc, None).unwrap();
    assert_eq!(report.points, moved.len());
    for (id, _) in moved {
        let before = markup.point_geometry(id).unwrap().position;
        let after = fresh.point_geometry(id).unwrap().position;
        assert!(before.approx_eq(after, Distance::meters(1e-9)), "{} moved", id);
    }
}

#[test]
fn crossing_line_cuts_a_rule() {
    let mut markup = Markup::new(&crossroads(), MarkupConfig::default());
    // Line a runs east to west 4m south of the center, line b north to south 2m east of it.
    markup.set_point_offset(enter(1, 2), Distance::meters(4.0));
    markup.set_point_offset(enter(3, 2), Distance::meters(-4.0));
    markup.set_point_offset(enter(2, 2), Distance::meters(2.0));
    markup.set_point_offset(enter(4, 2), Distance::meters(-2.0));
    let a = PointPair::new(enter(1, 2), enter(3, 2));
    let b = PointPair::new(enter(2, 2), enter(4, 2));
    markup.add_line(a, regular());
    markup.add_line(b, regular());

    let crossing = markup.intersection(a, b).unwrap();
    assert!((crossing.t_for(a) - 0.4).abs() < 1e-6);
    assert!((crossing.t_for(b) - 0.7).abs() < 1e-6);

    markup.remove_rule(a, 0);
    markup
        .add_rule_between(
            a,
            LineEdge::Line(b),
            LineEdge::Point(enter(3, 2)),
            LineStyle::default(),
        )
        .unwrap();
    let spans = markup.rule_spans(a);
    assert_eq!(spans.len(), 2);
    let cut = spans
        .iter()
        .find(|s| s.from_t > 0.0)
        .expect("no span starts at the crossing");
    assert!((cut.from_t - 0.4).abs() < 1e-6);
    assert!(cut
        .trajectory
        .start()
        .approx_eq(Pt2D::new(2.0, -4.0), Distance::meters(1e-6)));
}

// Builds contours by picking random candidates and checks that the reachable range on every line
// through the latest vertex contains that vertex.
#[test]
fn candidate_bounds_contain_the_last_vertex() {
    let mut markup = Markup::new(&crossroads(), MarkupConfig::default());
    let lines = [
        PointPair::new(enter(1, 2), enter(3, 2)),
        PointPair::new(enter(2, 2), enter(4, 2)),
        PointPair::new(enter(1, 1), enter(2, 3)),
        PointPair::new(enter(1, 3), enter(3, 1)),
        PointPair::new(enter(2, 1), enter(4, 3)),
    ];
    for line in lines {
        markup.add_line(line, regular());
    }

    let mut rng = XorShiftRng::seed_from_u64(42);
    for _ in 0..50 {
        let mut contour = FillerContour::new();
        for _ in 0..8 {
            let candidates = markup.filler_candidates(&contour);
            if candidates.is_empty() || contour.is_closed() {
                break;
            }
            let next = candidates[rng.gen_range(0..candidates.len())];
            contour.add(next);
            if contour.is_closed() {
                break;
            }

            let through: Vec<(PointPair, f64)> = match next {
                FillerVertex::Point(pt) => markup
                    .lines_through(pt)
                    .into_iter()
                    .filter_map(|l| l.t_of(pt).map(|t| (l, t)))
                    .collect(),
                FillerVertex::Intersect(pair) => {
                    let crossing = markup.intersection(pair.first, pair.second).unwrap();
                    vec![
                        (pair.first, crossing.t_for(pair.first)),
                        (pair.second, crossing.t_for(pair.second)),
                    ]
                }
            };
            for (line, t) in through {
                let (min, max) = contour.min_max_t(&markup, line, t);
                assert!(min <= t + 1e-6 && t <= max + 1e-6, "{} at {}", line, t);
            }
        }
    }
}

#[test]
fn crosswalk_drawn_after_a_line_cuts_it() {
    let mut markup = Markup::new(&crossroads(), MarkupConfig::default());
    let line = PointPair::new(enter(1, 2), enter(3, 2));
    markup.add_line(line, regular());
    assert_eq!(markup.rule_spans(line)[0].from_t, 0.0);

    let crosswalk = PointPair::new(
        PointID::new(EntranceID(1), 1, PointKind::Crosswalk),
        PointID::new(EntranceID(1), 3, PointKind::Crosswalk),
    );
    markup.add_line(crosswalk, LineKind::default_for(crosswalk).unwrap());
    let crossing = markup.intersection(line, crosswalk).unwrap().t_for(line);
    assert!(crossing > 0.0);

    let spans = markup.rule_spans(line);
    assert_eq!(spans.len(), 1);
    assert!((spans[0].from_t - crossing).abs() < 1e-9);
    assert_eq!(spans[0].to_t, 1.0);
}
