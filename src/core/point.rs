//! Markierungspunkte: Identität, Typ, Herkunft und Versatz.

use glam::Vec3;
use std::fmt;

/// Art eines Punkts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PointType {
    /// Kante einer Einfahrt (Anfang regulärer und Halte-Linien)
    Entrance,
    /// Endpunkt einer Normalen-Linie
    Normal,
    /// Ecke eines Fußgängerüberwegs
    Crosswalk,
    /// Spurmitte
    Lane,
}

impl PointType {
    pub fn code(self) -> u8 {
        match self {
            PointType::Entrance => 1,
            PointType::Normal => 2,
            PointType::Crosswalk => 3,
            PointType::Lane => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<PointType> {
        match code {
            1 => Some(PointType::Entrance),
            2 => Some(PointType::Normal),
            3 => Some(PointType::Crosswalk),
            4 => Some(PointType::Lane),
            _ => None,
        }
    }
}

/// Identität eines Punkts: Einfahrt, Typ und Index (0-basiert, je Typ)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId {
    pub entrance: u32,
    pub point_type: PointType,
    pub index: u8,
}

impl PointId {
    pub const fn new(entrance: u32, point_type: PointType, index: u8) -> Self {
        Self {
            entrance,
            point_type,
            index,
        }
    }

    pub const fn entrance(entrance: u32, index: u8) -> Self {
        Self::new(entrance, PointType::Entrance, index)
    }

    /// Gepackte Form `entrance << 16 | type << 8 | index` (XML-Attribute).
    pub fn raw(self) -> u64 {
        (u64::from(self.entrance) << 16) | (u64::from(self.point_type.code()) << 8) | u64::from(self.index)
    }

    pub fn from_raw(raw: u64) -> Option<PointId> {
        let entrance = u32::try_from(raw >> 16).ok()?;
        let point_type = PointType::from_code(((raw >> 8) & 0xFF) as u8)?;
        Some(Self::new(entrance, point_type, (raw & 0xFF) as u8))
    }

    /// Gleicher Anker, anderer Typ.
    pub fn with_type(self, point_type: PointType) -> Self {
        Self { point_type, ..self }
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}:{}", self.entrance, self.point_type, self.index)
    }
}

/// Lage eines Einfahrtspunkts relativ zu den Spuren
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Äußere Kante einer Spur (Fahrbahnrand oder Mittelstreifen)
    Edge,
    /// Spurmitte
    Centre,
    /// Zwischen zwei aneinanderliegenden Spuren
    Between,
}

/// Herkunft eines Punkts: Spur-Positionen links/rechts (nach Lage sortiert)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub left: Option<u8>,
    pub right: Option<u8>,
    pub location: Location,
}

/// Ein Punkt mit Nutzer-Versatz und abgeleiteter Position
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingPoint {
    pub id: PointId,
    /// Versatz entlang des Einfahrts-Querschnitts
    pub offset: f32,
    /// `None`, solange die Einfahrt keine Geometrie hat
    pub position: Option<Vec3>,
    /// Richtung in den Knoten hinein
    pub direction: Vec3,
    pub source: Option<Source>,
}

impl MarkingPoint {
    pub fn new(id: PointId, offset: f32) -> Self {
        Self {
            id,
            offset,
            position: None,
            direction: Vec3::ZERO,
            source: None,
        }
    }
}
