use std::io::Write;

use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use geom::Pt2D;
use marking_model::{LineKind, Markup};

pub fn write_geojson_file(markup: &Markup, path: &str) -> Result<()> {
    let contents = geojson_string(markup);
    let mut file = fs_err::File::create(path)?;
    write!(file, "{}", contents)?;
    Ok(())
}

fn feature(geometry: Geometry) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: None,
        foreign_members: None,
    }
}

fn line_string(pts: Vec<Pt2D>) -> Geometry {
    Geometry::new(Value::LineString(
        pts.into_iter().map(|pt| vec![pt.x(), pt.y()]).collect(),
    ))
}

fn geojson_string(markup: &Markup) -> String {
    let mut features = Vec::new();

    for entrance in markup.entrances() {
        for pt in entrance.all_points() {
            let geometry = match markup.point_geometry(pt.id) {
                Some(g) => g,
                None => continue,
            };
            let pos = geometry.position;
            let mut f = feature(Geometry::new(Value::Point(vec![pos.x(), pos.y()])));
            f.set_property("type", "point");
            f.set_property("id", pt.id.to_string());
            f.set_property("offset", pt.offset.inner_meters());
            features.push(f);
        }
    }

    for line in markup.lines() {
        match line.kind {
            LineKind::Regular { .. } => {
                for (idx, span) in markup.rule_spans(line.id).into_iter().enumerate() {
                    let mut f = feature(line_string(span.trajectory.points()));
                    f.set_property("type", "rule");
                    f.set_property("line", line.id.to_string());
                    f.set_property("rule", idx);
                    f.set_property("width", span.style.total_width().inner_meters());
                    f.set_property("style", format!("{:?}", span.style));
                    features.push(f);
                }
            }
            _ => {
                if let Some(trajectory) = markup.trajectory(line.id) {
                    let mut f = feature(line_string(trajectory.points()));
                    f.set_property("type", line.kind.describe());
                    f.set_property("line", line.id.to_string());
                    if let Some(width) = line.kind.width() {
                        f.set_property("width", width.inner_meters());
                    }
                    features.push(f);
                }
                if let Some(corridor) = markup.lane_corridor(line.id) {
                    let mut f = feature(corridor.to_geojson());
                    f.set_property("type", "corridor");
                    f.set_property("line", line.id.to_string());
                    features.push(f);
                }
            }
        }
    }

    for filler in markup.fillers() {
        match markup.filler_outline(filler.id) {
            Some(outline) => {
                let mut f = feature(outline.to_geojson());
                f.set_property("type", "filler");
                f.set_property("id", filler.id.0);
                f.set_property("area", outline.area());
                f.set_property("perimeter", outline.perimeter().inner_meters());
                f.set_property("style", format!("{:?}", filler.style));
                features.push(f);
            }
            None => warn!("{} has no outline; skipping it", filler.id),
        }
    }

    info!("Exporting {} features", features.len());
    GeoJson::from(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
    .to_string()
}
