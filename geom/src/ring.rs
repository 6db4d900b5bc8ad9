use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Distance, Pt2D, EPSILON_DIST};

/// A closed outline. The first point equals the last.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    pts: Vec<Pt2D>,
}

impl Ring {
    pub fn new(pts: Vec<Pt2D>) -> Result<Ring> {
        if pts.len() < 4 {
            bail!("Can't make a ring with < 4 points");
        }
        if pts[0] != pts[pts.len() - 1] {
            bail!("Can't make a ring with mismatching first/last points");
        }
        if let Some(pair) = pts
            .windows(2)
            .find(|pair| pair[0].approx_eq(pair[1], EPSILON_DIST))
        {
            bail!("Ring has ~dupe adjacent pts near {}", pair[0]);
        }
        Ok(Ring { pts })
    }

    /// Closes the outline by repeating the first point, after dropping points that collapse onto
    /// their predecessor.
    pub fn closed_from(pts: &[Pt2D]) -> Result<Ring> {
        let mut result: Vec<Pt2D> = Vec::new();
        for pt in pts {
            if result
                .last()
                .map(|last| last.approx_eq(*pt, EPSILON_DIST))
                .unwrap_or(false)
            {
                continue;
            }
            result.push(*pt);
        }
        while result.len() > 1 && result[0].approx_eq(result[result.len() - 1], EPSILON_DIST) {
            result.pop();
        }
        if let Some(first) = result.first().cloned() {
            result.push(first);
        }
        Ring::new(result)
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    /// Shoelace formula; positive when the points run counterclockwise.
    pub fn signed_area(&self) -> f64 {
        self.pts
            .windows(2)
            .map(|pair| pair[0].x() * pair[1].y() - pair[1].x() * pair[0].y())
            .sum::<f64>()
            / 2.0
    }

    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }

    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn perimeter(&self) -> Distance {
        self.pts
            .windows(2)
            .map(|pair| pair[0].dist_to(pair[1]))
            .sum()
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.pts)
    }

    /// Exterior rings in GeoJSON run counterclockwise, so clockwise rings are flipped.
    pub fn to_geojson(&self) -> geojson::Geometry {
        let mut pts: Vec<Vec<f64>> = self.pts.iter().map(|pt| vec![pt.x(), pt.y()]).collect();
        if self.is_clockwise() {
            pts.reverse();
        }
        geojson::Geometry::new(geojson::Value::Polygon(vec![pts]))
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}
