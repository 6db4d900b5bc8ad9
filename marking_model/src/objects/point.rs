use std::cmp::Ordering;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use geom::{Angle, Distance, Pt2D};

use crate::{EntranceID, PointSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PointKind {
    /// On the entrance edge, derived from the lanes.
    Enter,
    /// Just inside the junction from an Enter point, where crosswalks start and end.
    Crosswalk,
    /// Across the junction from an Enter point, where its outward ray leaves the junction.
    Normal,
    /// Midway across one drive lane.
    Lane,
}

impl PointKind {
    fn code(self) -> u32 {
        match self {
            PointKind::Enter => 1,
            PointKind::Crosswalk => 2,
            PointKind::Normal => 4,
            PointKind::Lane => 8,
        }
    }

    fn from_code(code: u32) -> Option<PointKind> {
        match code {
            1 => Some(PointKind::Enter),
            2 => Some(PointKind::Crosswalk),
            4 => Some(PointKind::Normal),
            8 => Some(PointKind::Lane),
            _ => None,
        }
    }
}

/// A marking point is identified by its entrance, its 1-based index there, and its kind.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PointID {
    pub entrance: EntranceID,
    pub index: u8,
    pub kind: PointKind,
}

impl PointID {
    pub fn new(entrance: EntranceID, index: u8, kind: PointKind) -> PointID {
        PointID {
            entrance,
            index,
            kind,
        }
    }

    pub fn encode_u32(self) -> u32 {
        // 16 bits of entrance, then 8 of index, then 8 for the kind
        (self.entrance.0 as u32) | ((self.index as u32) << 16) | (self.kind.code() << 24)
    }

    /// None if the kind bits don't name a real kind.
    pub fn decode_u32(x: u32) -> Option<PointID> {
        let kind = PointKind::from_code(x >> 24)?;
        Some(PointID {
            entrance: EntranceID((x & 0xffff) as u16),
            index: ((x >> 16) & 0xff) as u8,
            kind,
        })
    }
}

// Ordered the same as the packed id, so sorted pairs and their hashes agree.
impl Ord for PointID {
    fn cmp(&self, other: &PointID) -> Ordering {
        self.encode_u32().cmp(&other.encode_u32())
    }
}

impl PartialOrd for PointID {
    fn partial_cmp(&self, other: &PointID) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PointID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{:?} point {} of {}",
            self.kind, self.index, self.entrance
        )
    }
}

impl Serialize for PointID {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.encode_u32().serialize(s)
    }
}

impl<'de> Deserialize<'de> for PointID {
    fn deserialize<D>(d: D) -> Result<PointID, D::Error>
    where
        D: Deserializer<'de>,
    {
        let x = <u32>::deserialize(d)?;
        PointID::decode_u32(x).ok_or_else(|| de::Error::custom(format!("bad point id {}", x)))
    }
}

/// Two distinct points, in canonical order. Identifies a line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointPair {
    pub first: PointID,
    pub second: PointID,
}

impl PointPair {
    pub fn new(a: PointID, b: PointID) -> PointPair {
        match a.cmp(&b) {
            Ordering::Less => PointPair {
                first: a,
                second: b,
            },
            Ordering::Greater => PointPair {
                first: b,
                second: a,
            },
            Ordering::Equal => panic!("A point pair needs two different points, got {} twice", a),
        }
    }

    pub fn hash_u64(self) -> u64 {
        ((self.first.encode_u32() as u64) << 32) | (self.second.encode_u32() as u64)
    }

    /// None if either half isn't a valid point or the halves aren't in canonical order.
    pub fn from_hash(x: u64) -> Option<PointPair> {
        let first = PointID::decode_u32((x >> 32) as u32)?;
        let second = PointID::decode_u32((x & 0xffff_ffff) as u32)?;
        if first >= second {
            return None;
        }
        Some(PointPair { first, second })
    }

    pub fn contains(self, pt: PointID) -> bool {
        self.first == pt || self.second == pt
    }

    /// Panics if `pt` isn't part of the pair.
    pub fn other(self, pt: PointID) -> PointID {
        if self.first == pt {
            self.second
        } else if self.second == pt {
            self.first
        } else {
            panic!("{} isn't part of {}", pt, self);
        }
    }

    pub fn shares_point(self, other: PointPair) -> bool {
        self.contains(other.first) || self.contains(other.second)
    }

    pub fn is_same_entrance(self) -> bool {
        self.first.entrance == self.second.entrance
    }

    pub fn both(self, kind: PointKind) -> bool {
        self.first.kind == kind && self.second.kind == kind
    }

    /// The parameter along this pair's trajectory where `pt` sits: 0 for the first point, 1 for
    /// the second.
    pub fn t_of(self, pt: PointID) -> Option<f64> {
        if self.first == pt {
            Some(0.0)
        } else if self.second == pt {
            Some(1.0)
        } else {
            None
        }
    }
}

impl fmt::Display for PointPair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Line ({}) - ({})", self.first, self.second)
    }
}

impl Serialize for PointPair {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.hash_u64().serialize(s)
    }
}

impl<'de> Deserialize<'de> for PointPair {
    fn deserialize<D>(d: D) -> Result<PointPair, D::Error>
    where
        D: Deserializer<'de>,
    {
        let x = <u64>::deserialize(d)?;
        PointPair::from_hash(x).ok_or_else(|| de::Error::custom(format!("bad point pair {}", x)))
    }
}

/// What a point's position is derived from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PointOrigin {
    /// Enter points come straight from the lanes.
    Lanes(PointSource),
    /// Crosswalk and Normal points follow the Enter point with this index.
    Enter(u8),
    /// Lane points sit between the Enter points on either edge of their lane.
    EnterPair(u8, u8),
}

/// An anchor for markings. Only the offset is state; the position is always derived.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkingPoint {
    pub id: PointID,
    pub offset: Distance,
    pub origin: PointOrigin,
}

impl MarkingPoint {
    pub fn new(id: PointID, origin: PointOrigin) -> MarkingPoint {
        MarkingPoint {
            id,
            offset: Distance::ZERO,
            origin,
        }
    }

    /// The Enter points this one follows, if any.
    pub fn sources(&self) -> Vec<PointID> {
        let enter = |index| PointID::new(self.id.entrance, index, PointKind::Enter);
        match self.origin {
            PointOrigin::Lanes(_) => Vec::new(),
            PointOrigin::Enter(index) => vec![enter(index)],
            PointOrigin::EnterPair(a, b) => vec![enter(a), enter(b)],
        }
    }
}

/// Where a point currently is. Directions point out of the junction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    pub position: Pt2D,
    pub direction: Angle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_packing() {
        let id = PointID::new(EntranceID(513), 7, PointKind::Crosswalk);
        assert_eq!(id.encode_u32(), 513 | (7 << 16) | (2 << 24));
        assert_eq!(PointID::decode_u32(id.encode_u32()), Some(id));
        assert_eq!(PointID::decode_u32(513 | (3 << 24)), None);
    }

    #[test]
    fn pair_is_symmetric() {
        let a = PointID::new(EntranceID(2), 1, PointKind::Enter);
        let b = PointID::new(EntranceID(1), 3, PointKind::Normal);
        let forwards = PointPair::new(a, b);
        let backwards = PointPair::new(b, a);
        assert_eq!(forwards, backwards);
        assert_eq!(forwards.hash_u64(), backwards.hash_u64());
        assert_eq!(PointPair::from_hash(forwards.hash_u64()), Some(forwards));
        assert_eq!(forwards.other(a), b);
        assert_eq!(forwards.t_of(forwards.first), Some(0.0));
    }

    #[test]
    fn pair_json() {
        let pair = PointPair::new(
            PointID::new(EntranceID(1), 1, PointKind::Enter),
            PointID::new(EntranceID(3), 2, PointKind::Enter),
        );
        let json = serde_json::to_string(&pair).unwrap();
        assert_eq!(json, pair.hash_u64().to_string());
        assert_eq!(serde_json::from_str::<PointPair>(&json).unwrap(), pair);
        // Reversed halves are not canonical
        let flipped = (pair.hash_u64() << 32) | (pair.hash_u64() >> 32);
        assert!(serde_json::from_str::<PointPair>(&flipped.to_string()).is_err());
    }

    #[test]
    #[should_panic]
    fn pair_needs_two_points() {
        let a = PointID::new(EntranceID(2), 1, PointKind::Enter);
        PointPair::new(a, a);
    }
}
