//! The saved form of a junction's markings. Points, lines and fillers are referenced by their
//! packed integer ids, so a document survives as long as the entrances it mentions do. Anything
//! that no longer resolves is dropped on load instead of failing the whole document.

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::{deserialize_btreemap, serialize_btreemap};
use geom::Distance;

use crate::{
    CrosswalkStyle, EntranceID, FillerContour, FillerStyle, FillerVertex, LineEdge, LineKind,
    LinePair, LineRule, LineStyle, MarkingLine, Markup, PointID, PointPair,
};

pub const DOCUMENT_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkupDocument {
    pub version: u32,
    pub points: Vec<PointRecord>,
    pub lines: Vec<LineRecord>,
    pub fillers: Vec<FillerRecord>,
}

/// Only points with a non-zero offset are written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: u32,
    pub offset: Distance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    /// The packed point pair.
    pub id: u64,
    pub kind: LineKindRecord,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LineKindRecord {
    Regular { rules: Vec<RuleRecord> },
    Stop { style: LineStyle },
    Crosswalk { style: CrosswalkStyle },
    Lane { style: LineStyle },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub from: EdgeRecord,
    pub to: EdgeRecord,
    pub style: LineStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum EdgeRecord {
    Point(u32),
    Line(u64),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FillerRecord {
    pub vertices: Vec<VertexRecord>,
    pub style: FillerStyle,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum VertexRecord {
    Point(u32),
    LinePair(u64, u64),
}

/// Moves markings between entrances, for pasting one junction's markings onto another. When a
/// map is used, entrances missing from it don't resolve.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectsMap {
    #[serde(
        serialize_with = "serialize_btreemap",
        deserialize_with = "deserialize_btreemap"
    )]
    pub entrances: BTreeMap<EntranceID, EntranceID>,
}

impl ObjectsMap {
    pub fn new() -> ObjectsMap {
        ObjectsMap::default()
    }

    pub fn insert(&mut self, from: EntranceID, to: EntranceID) {
        self.entrances.insert(from, to);
    }

    pub fn map_point(&self, id: PointID) -> Option<PointID> {
        let entrance = *self.entrances.get(&id.entrance)?;
        Some(PointID { entrance, ..id })
    }
}

/// What made it into the markup.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub points: usize,
    pub lines: usize,
    pub rules: usize,
    pub fillers: usize,
    pub dropped: usize,
}

impl MarkupDocument {
    pub fn load(path: &str) -> Result<MarkupDocument> {
        abstutil::read_json(path)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        abstutil::write_json(path, self)
    }
}

// Resolves packed ids, through the remap table when there is one.
struct Resolver<'a> {
    map: Option<&'a ObjectsMap>,
}

impl<'a> Resolver<'a> {
    fn point(&self, x: u32) -> Option<PointID> {
        let id = PointID::decode_u32(x)?;
        match self.map {
            Some(map) => map.map_point(id),
            None => Some(id),
        }
    }

    // Remapping can reorder the halves, so they're decoded separately and paired up again.
    fn pair(&self, x: u64) -> Option<PointPair> {
        let a = self.point((x >> 32) as u32)?;
        let b = self.point((x & 0xffff_ffff) as u32)?;
        if a == b {
            return None;
        }
        Some(PointPair::new(a, b))
    }

    fn edge(&self, edge: EdgeRecord) -> Option<LineEdge> {
        match edge {
            EdgeRecord::Point(x) => self.point(x).map(LineEdge::Point),
            EdgeRecord::Line(x) => self.pair(x).map(LineEdge::Line),
        }
    }

    fn vertex(&self, vertex: VertexRecord) -> Option<FillerVertex> {
        match vertex {
            VertexRecord::Point(x) => self.point(x).map(FillerVertex::Point),
            VertexRecord::LinePair(a, b) => {
                let (a, b) = (self.pair(a)?, self.pair(b)?);
                if a == b {
                    return None;
                }
                Some(FillerVertex::Intersect(LinePair::new(a, b)))
            }
        }
    }
}

impl Markup {
    pub fn to_document(&self) -> MarkupDocument {
        let mut points = Vec::new();
        for entrance in self.entrances() {
            for pt in entrance.all_points() {
                if pt.offset != Distance::ZERO {
                    points.push(PointRecord {
                        id: pt.id.encode_u32(),
                        offset: pt.offset,
                    });
                }
            }
        }

        let edge = |edge: LineEdge| match edge {
            LineEdge::Point(pt) => EdgeRecord::Point(pt.encode_u32()),
            LineEdge::Line(line) => EdgeRecord::Line(line.hash_u64()),
        };
        let lines = self
            .lines()
            .filter_map(|line| {
                let kind = match line.kind {
                    LineKind::Regular { ref rules } => LineKindRecord::Regular {
                        rules: rules
                            .iter()
                            .map(|r| RuleRecord {
                                from: edge(r.from),
                                to: edge(r.to),
                                style: r.style.clone(),
                            })
                            .collect(),
                    },
                    LineKind::Stop { ref style } => LineKindRecord::Stop {
                        style: style.clone(),
                    },
                    LineKind::Crosswalk { ref style } => LineKindRecord::Crosswalk {
                        style: style.clone(),
                    },
                    LineKind::Lane { ref style } => LineKindRecord::Lane {
                        style: style.clone(),
                    },
                    LineKind::Enter => return None,
                };
                Some(LineRecord {
                    id: line.id.hash_u64(),
                    kind,
                })
            })
            .collect();

        let fillers = self
            .fillers()
            .map(|filler| FillerRecord {
                vertices: filler
                    .contour
                    .vertices()
                    .iter()
                    .map(|v| match v {
                        FillerVertex::Point(pt) => VertexRecord::Point(pt.encode_u32()),
                        FillerVertex::Intersect(pair) => {
                            VertexRecord::LinePair(pair.first.hash_u64(), pair.second.hash_u64())
                        }
                    })
                    .collect(),
                style: filler.style.clone(),
            })
            .collect();

        MarkupDocument {
            version: DOCUMENT_VERSION,
            points,
            lines,
            fillers,
        }
    }

    /// Adds everything in the document on top of the current markings. Records that don't resolve
    /// against the current entrances are dropped with a warning. Only an unreadable document is
    /// an error.
    pub fn load_document(
        &mut self,
        doc: &MarkupDocument,
        map: Option<&ObjectsMap>,
    ) -> Result<LoadReport> {
        if doc.version > DOCUMENT_VERSION {
            bail!(
                "Document version {} is newer than the supported {}",
                doc.version,
                DOCUMENT_VERSION
            );
        }
        let resolve = Resolver { map };
        let mut report = LoadReport::default();

        for record in &doc.points {
            match resolve.point(record.id).filter(|id| self.point(*id).is_some()) {
                Some(id) => {
                    self.set_point_offset(id, record.offset);
                    report.points += 1;
                }
                None => {
                    warn!("Dropping offset of unknown point {:#x}", record.id);
                    report.dropped += 1;
                }
            }
        }

        // Every line goes in before any rule, since rules can be cut by lines later in the list
        let mut rules = Vec::new();
        for record in &doc.lines {
            let id = match resolve.pair(record.id) {
                Some(id) if self.point(id.first).is_some() && self.point(id.second).is_some() => id,
                _ => {
                    warn!("Dropping line {:#x}; its points are gone", record.id);
                    report.dropped += 1;
                    continue;
                }
            };
            let kind = match record.kind {
                LineKindRecord::Regular { rules: ref records } => {
                    rules.push((id, records));
                    LineKind::Regular { rules: Vec::new() }
                }
                LineKindRecord::Stop { ref style } => LineKind::Stop {
                    style: style.clone(),
                },
                LineKindRecord::Crosswalk { ref style } => LineKind::Crosswalk {
                    style: style.clone(),
                },
                LineKindRecord::Lane { ref style } => LineKind::Lane {
                    style: style.clone(),
                },
            };
            if !kind.allows(id) || self.line(id).is_some() {
                warn!("Dropping {} line {}", kind.describe(), id);
                report.dropped += 1;
                continue;
            }
            self.insert_line(MarkingLine::new(id, kind));
            report.lines += 1;
        }
        self.recalculate();

        for (line, records) in rules {
            if self.line(line).is_none() {
                continue;
            }
            for record in records {
                let rule = match (resolve.edge(record.from), resolve.edge(record.to)) {
                    (Some(from), Some(to)) => LineRule {
                        from,
                        to,
                        style: record.style.clone(),
                    },
                    _ => {
                        warn!("Dropping a rule of {}; an edge is gone", line);
                        report.dropped += 1;
                        continue;
                    }
                };
                match self.add_rule_between(line, rule.from, rule.to, rule.style) {
                    Ok(()) => report.rules += 1,
                    Err(err) => {
                        warn!("Dropping a rule of {}: {}", line, err);
                        report.dropped += 1;
                    }
                }
            }
            self.ensure_default_rule(line);
        }

        for record in &doc.fillers {
            let vertices: Option<Vec<FillerVertex>> =
                record.vertices.iter().map(|v| resolve.vertex(*v)).collect();
            let result = match vertices {
                Some(vertices) => FillerContour::from_vertices(vertices)
                    .and_then(|contour| self.add_filler(contour, record.style.clone())),
                None => Err(anyhow!("a vertex is gone")),
            };
            match result {
                Ok(_) => report.fillers += 1,
                Err(err) => {
                    warn!("Dropping a filler: {}", err);
                    report.dropped += 1;
                }
            }
        }

        info!(
            "Loaded {} offsets, {} lines, {} rules, {} fillers; dropped {}",
            report.points, report.lines, report.rules, report.fillers, report.dropped
        );
        Ok(report)
    }
}
