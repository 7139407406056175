//! Render-Primitive, Farben und Detailstufen, die die Stil-Engine erzeugt.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGBA-Farbe einer Markierung (8 Bit je Kanal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkingColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl MarkingColor {
    pub const WHITE: MarkingColor = MarkingColor::new(255, 255, 255, 255);
    pub const YELLOW: MarkingColor = MarkingColor::new(255, 204, 0, 255);
    /// Farbe erhöhter Flächen (Bordstein/Pflaster)
    pub const PAVEMENT: MarkingColor = MarkingColor::new(128, 128, 128, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Gepackte Darstellung `0xRRGGBBAA` (Format der Schema-Version 1).
    pub fn from_packed(value: u32) -> Self {
        let [r, g, b, a] = value.to_be_bytes();
        Self { r, g, b, a }
    }

    pub fn to_packed(self) -> u32 {
        u32::from_be_bytes([self.r, self.g, self.b, self.a])
    }
}

impl Default for MarkingColor {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for MarkingColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for MarkingColor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let channels = s
            .split(',')
            .map(|c| c.trim().parse::<u8>())
            .collect::<Result<Vec<u8>, _>>()?;
        match channels.as_slice() {
            [r, g, b] => Ok(Self::new(*r, *g, *b, 255)),
            [r, g, b, a] => Ok(Self::new(*r, *g, *b, *a)),
            _ => anyhow::bail!("Ungueltige Farbe '{}'", s),
        }
    }
}

/// Material einer Fläche
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialType {
    /// Fahrbahnfarbe
    #[default]
    Paint,
    /// Erhöhte Fläche (Bordstein, Verkehrsinsel)
    Pavement,
}

/// Detailstufe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lod {
    /// Nahbereich: alle Primitive
    Detailed,
    /// Fernbereich: nur flache Geometrie
    Distant,
}

impl Lod {
    pub const ALL: [Lod; 2] = [Lod::Detailed, Lod::Distant];

    fn bit(self) -> u8 {
        match self {
            Lod::Detailed => 0b01,
            Lod::Distant => 0b10,
        }
    }
}

/// Menge der von einem Stil unterstützten Detailstufen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LodMask(u8);

impl LodMask {
    pub const DETAILED: LodMask = LodMask(0b01);
    pub const ALL: LodMask = LodMask(0b11);

    pub fn contains(self, lod: Lod) -> bool {
        self.0 & lod.bit() != 0
    }
}

/// Flaches, orientiertes Viereck entlang einer Trajektorie.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingDash {
    pub start: Vec3,
    pub end: Vec3,
    /// Normierte Richtung von `start` nach `end`
    pub direction: Vec3,
    pub width: f32,
    pub color: MarkingColor,
    pub material: MaterialType,
}

impl MarkingDash {
    pub fn new(start: Vec3, end: Vec3, width: f32, color: MarkingColor) -> Self {
        let delta = end - start;
        let direction = Vec3::new(delta.x, 0.0, delta.z).normalize_or_zero();
        Self {
            start,
            end,
            direction,
            width,
            color,
            material: MaterialType::Paint,
        }
    }

    /// Strich mit vorgegebener Richtung (z.B. Querbalken eines Zebrastreifens).
    pub fn centered(center: Vec3, direction: Vec3, length: f32, width: f32, color: MarkingColor) -> Self {
        let half = direction * (length * 0.5);
        Self {
            start: center - half,
            end: center + half,
            direction,
            width,
            color,
            material: MaterialType::Paint,
        }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn center(&self) -> Vec3 {
        (self.start + self.end) * 0.5
    }
}

/// Geschlossene Fläche (Umriss ohne Wiederholung des ersten Punkts).
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingPolygon {
    pub points: Vec<Vec3>,
    pub color: MarkingColor,
    /// Höhe über der Fahrbahn
    pub elevation: f32,
    pub material: MaterialType,
}

/// Platzierung eines Props oder Baums
#[derive(Debug, Clone, PartialEq)]
pub struct PropPlacement {
    pub prefab: String,
    pub position: Vec3,
    /// Drehung um die Hochachse (Radiant)
    pub angle: f32,
    pub scale: f32,
    /// Neigung (Radiant)
    pub tilt: f32,
}

/// Platzierung eines Textes
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub text: String,
    pub font: String,
    pub position: Vec3,
    pub direction: Vec3,
    pub scale: f32,
    pub color: MarkingColor,
}

/// Ein wiederholtes Netz-Segment (z.B. Leitplanke)
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkPlacement {
    pub prefab: String,
    pub start: Vec3,
    pub end: Vec3,
    pub start_direction: Vec3,
    pub end_direction: Vec3,
    pub elevation: f32,
    pub scale: f32,
}

/// Ein Render-Primitiv
#[derive(Debug, Clone, PartialEq)]
pub enum MarkingPrimitive {
    Dash(MarkingDash),
    Polygon(MarkingPolygon),
    Prop(PropPlacement),
    Text(TextPlacement),
    Network(NetworkPlacement),
}

impl MarkingPrimitive {
    pub fn as_dash(&self) -> Option<&MarkingDash> {
        match self {
            MarkingPrimitive::Dash(dash) => Some(dash),
            _ => None,
        }
    }
}

/// Zwischengespeicherte Primitive eines Entities, nach Detailstufe gruppiert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrimitiveGroup {
    detailed: Vec<MarkingPrimitive>,
    distant: Vec<MarkingPrimitive>,
}

impl PrimitiveGroup {
    pub fn get(&self, lod: Lod) -> &[MarkingPrimitive] {
        match lod {
            Lod::Detailed => &self.detailed,
            Lod::Distant => &self.distant,
        }
    }

    pub fn extend(&mut self, lod: Lod, primitives: impl IntoIterator<Item = MarkingPrimitive>) {
        match lod {
            Lod::Detailed => self.detailed.extend(primitives),
            Lod::Distant => self.distant.extend(primitives),
        }
    }

    pub fn clear(&mut self) {
        self.detailed.clear();
        self.distant.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.detailed.is_empty() && self.distant.is_empty()
    }

    pub fn len(&self) -> usize {
        self.detailed.len() + self.distant.len()
    }
}
