//! Gestreute Objekte entlang einer Linie: Props, Bäume, Texte und Netz-Segmente.
//!
//! Zufallswerte kommen aus einem `ChaCha8Rng` mit festem Seed, damit das Layout
//! bei gleichem Entity und gleicher Regel stabil bleibt.

use super::primitive::{MarkingColor, MarkingPrimitive, NetworkPlacement, PropPlacement, TextPlacement};
use super::{
    pattern_count, read_color, read_flag, read_pattern_length, CalculateContext, MIN_PATTERN_LENGTH,
};
use crate::geometry::{right_normal, Trajectory};
use crate::shared::options;
use crate::xml::XmlElement;
use anyhow::{bail, Result};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;
use std::str::FromStr;

/// Bereich `[min, max]` für zufällige Werte
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn average(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Zieht einen Wert; feste Bereiche verbrauchen keinen Zufallswert.
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if hi - lo <= f32::EPSILON {
            lo
        } else {
            rng.gen_range(lo..=hi)
        }
    }
}

impl fmt::Display for FloatRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{};{}", self.min, self.max)
    }
}

impl FromStr for FloatRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(';')
            .map(|v| v.trim().parse::<f32>())
            .collect::<Result<Vec<f32>, _>>()?;
        match values.as_slice() {
            [value] => Ok(Self::fixed(*value)),
            [min, max] => Ok(Self::new(*min, *max)),
            _ => bail!("Ungueltiger Bereich '{}'", s),
        }
    }
}

/// Abstände entlang der Kurve: ab `before` im Takt `step`, Rest mittig verteilt.
fn sample_distances(length: f32, step: f32, before: f32, after: f32) -> Vec<f32> {
    let usable = length - before - after;
    if usable < 0.0 || step <= 0.0 {
        return Vec::new();
    }
    let count = pattern_count((usable / step + 1e-4).floor()) + 1;
    let first = before + (usable - (count - 1) as f32 * step) * 0.5;
    (0..count).map(|i| first + i as f32 * step).collect()
}

/// Gestreute Props bzw. Bäume
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterStyle {
    pub prefab: String,
    /// `None` = automatischer Abstand aus der Skalierung
    pub step: Option<f32>,
    /// Seitlicher Versatz, positiv nach rechts
    pub shift: f32,
    /// Drehung in Grad relativ zur Fahrtrichtung
    pub angle: FloatRange,
    pub scale: FloatRange,
    /// Neigung in Grad
    pub tilt: FloatRange,
    pub offset_before: f32,
    pub offset_after: f32,
}

impl ScatterStyle {
    pub fn new(prefab: impl Into<String>) -> Self {
        Self {
            prefab: prefab.into(),
            step: None,
            shift: 0.0,
            angle: FloatRange::fixed(0.0),
            scale: FloatRange::fixed(1.0),
            tilt: FloatRange::fixed(0.0),
            offset_before: 0.0,
            offset_after: 0.0,
        }
    }

    pub fn calculate(
        &self,
        trajectory: &Trajectory,
        auto_step: f32,
        ctx: &CalculateContext,
    ) -> Vec<MarkingPrimitive> {
        let length = trajectory.length();
        let step = self
            .step
            .unwrap_or_else(|| auto_step * self.scale.average().max(0.1));
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.seed);

        sample_distances(length, step, self.offset_before, self.offset_after)
            .into_iter()
            .map(|distance| {
                let t = trajectory.t_at_distance(distance);
                let tangent = trajectory.tangent(t);
                let position = trajectory.position(t) + right_normal(tangent) * self.shift;
                let heading = tangent.z.atan2(tangent.x);
                MarkingPrimitive::Prop(PropPlacement {
                    prefab: self.prefab.clone(),
                    position,
                    angle: heading + self.angle.sample(&mut rng).to_radians(),
                    scale: self.scale.sample(&mut rng),
                    tilt: self.tilt.sample(&mut rng).to_radians(),
                })
            })
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("PR", &self.prefab);
        if let Some(step) = self.step {
            element.set_attr("ST", step);
        }
        element.set_attr("SH", self.shift);
        element.set_attr("AN", self.angle);
        element.set_attr("SCL", self.scale);
        element.set_attr("TI", self.tilt);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
    }

    pub(crate) fn read_xml(element: &XmlElement, _version: u32) -> Result<Self> {
        Ok(Self {
            prefab: element.attr("PR").unwrap_or_default().to_string(),
            step: match element.parse_attr::<f32>("ST")? {
                Some(step) => Some(read_pattern_length(element, "ST", step, MIN_PATTERN_LENGTH)?),
                None => None,
            },
            shift: element.attr_or("SH", 0.0)?,
            angle: element.attr_or("AN", FloatRange::fixed(0.0))?,
            scale: element.attr_or("SCL", FloatRange::fixed(1.0))?,
            tilt: element.attr_or("TI", FloatRange::fixed(0.0))?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
        })
    }
}

/// Text auf der Fahrbahn, einzeln in der Mitte oder im Takt `step`
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub text: String,
    pub font: String,
    pub color: MarkingColor,
    pub scale: f32,
    /// Drehung in Grad relativ zur Fahrtrichtung
    pub angle: f32,
    pub shift: f32,
    pub step: Option<f32>,
}

impl TextStyle {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: String::new(),
            color: MarkingColor::WHITE,
            scale: 1.0,
            angle: 0.0,
            shift: 0.0,
            step: None,
        }
    }

    pub fn calculate(&self, trajectory: &Trajectory) -> Vec<MarkingPrimitive> {
        if self.text.is_empty() {
            return Vec::new();
        }
        let length = trajectory.length();
        let distances = match self.step {
            Some(step) => sample_distances(length, step, 0.0, 0.0),
            None => vec![length * 0.5],
        };
        let rotation = glam::Quat::from_rotation_y(-self.angle.to_radians());

        distances
            .into_iter()
            .map(|distance| {
                let t = trajectory.t_at_distance(distance);
                let tangent = trajectory.tangent(t);
                MarkingPrimitive::Text(TextPlacement {
                    text: self.text.clone(),
                    font: self.font.clone(),
                    position: trajectory.position(t) + right_normal(tangent) * self.shift,
                    direction: rotation * tangent,
                    scale: self.scale,
                    color: self.color,
                })
            })
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("TX", &self.text);
        element.set_attr("F", &self.font);
        element.set_attr("C", self.color);
        element.set_attr("SCL", self.scale);
        element.set_attr("A", self.angle);
        element.set_attr("SH", self.shift);
        if let Some(step) = self.step {
            element.set_attr("ST", step);
        }
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            text: element.attr("TX").unwrap_or_default().to_string(),
            font: element.attr("F").unwrap_or_default().to_string(),
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            scale: element.attr_or("SCL", 1.0)?,
            angle: element.attr_or("A", 0.0)?,
            shift: element.attr_or("SH", 0.0)?,
            step: match element.parse_attr::<f32>("ST")? {
                Some(step) => Some(read_pattern_length(element, "ST", step, MIN_PATTERN_LENGTH)?),
                None => None,
            },
        })
    }
}

/// Wiederholtes Netz-Segment (Leitplanke, Zaun) entlang der Linie
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkStyle {
    pub prefab: String,
    pub shift: f32,
    pub elevation: f32,
    pub scale: f32,
    pub repeat_distance: f32,
    pub offset_before: f32,
    pub offset_after: f32,
    /// Segmente entgegen der Linienrichtung ausrichten
    pub invert: bool,
}

impl NetworkStyle {
    pub fn new(prefab: impl Into<String>) -> Self {
        Self {
            prefab: prefab.into(),
            shift: 0.0,
            elevation: 0.0,
            scale: 1.0,
            repeat_distance: options::NETWORK_REPEAT_DISTANCE,
            offset_before: 0.0,
            offset_after: 0.0,
            invert: false,
        }
    }

    pub fn calculate(&self, trajectory: &Trajectory) -> Vec<MarkingPrimitive> {
        let length = trajectory.length();
        let usable = length - self.offset_before - self.offset_after;
        if usable <= 0.0 || self.repeat_distance <= 0.0 {
            return Vec::new();
        }
        let from = trajectory.t_at_distance(self.offset_before);
        let to = trajectory.t_at_distance(length - self.offset_after);
        let base = trajectory.cut(from, to);
        let base = if self.invert { base.invert() } else { base };
        let base = base.shift(self.shift);

        let count = pattern_count((usable / self.repeat_distance).round()).max(1);
        let lift = Vec3::Y * self.elevation;
        (0..count)
            .map(|i| {
                let t0 = i as f32 / count as f32;
                let t1 = (i + 1) as f32 / count as f32;
                MarkingPrimitive::Network(NetworkPlacement {
                    prefab: self.prefab.clone(),
                    start: base.position(t0) + lift,
                    end: base.position(t1) + lift,
                    start_direction: base.tangent(t0),
                    end_direction: base.tangent(t1),
                    elevation: self.elevation,
                    scale: self.scale,
                })
            })
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("PR", &self.prefab);
        element.set_attr("SH", self.shift);
        element.set_attr("E", self.elevation);
        element.set_attr("SCL", self.scale);
        element.set_attr("RD", self.repeat_distance);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
        element.set_attr("I", u8::from(self.invert));
    }

    pub(crate) fn read_xml(element: &XmlElement, _version: u32) -> Result<Self> {
        Ok(Self {
            prefab: element.attr("PR").unwrap_or_default().to_string(),
            shift: element.attr_or("SH", 0.0)?,
            elevation: element.attr_or("E", 0.0)?,
            scale: element.attr_or("SCL", 1.0)?,
            repeat_distance: read_pattern_length(element, "RD", options::NETWORK_REPEAT_DISTANCE, MIN_PATTERN_LENGTH)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
            invert: read_flag(element, "I")?,
        })
    }
}
