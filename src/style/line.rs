//! Linien-Stile: durchgezogen, gestrichelt, doppelt, Haifischzähne, Zickzack, Bordstein.

use super::dash::{border_limits, clamped_ranges, place_dashes, solid_parts};
use super::primitive::{MarkingColor, MarkingDash, MarkingPolygon, MarkingPrimitive, MaterialType};
use super::{
    pattern_count, read_color, read_flag, read_pattern_length, CalculateContext, MIN_PATTERN_LENGTH,
};
use crate::geometry::{right_normal, Trajectory};
use crate::shared::options;
use crate::xml::XmlElement;
use anyhow::Result;

fn dashes(items: Vec<MarkingDash>) -> impl Iterator<Item = MarkingPrimitive> {
    items.into_iter().map(MarkingPrimitive::Dash)
}

/// Durchgezogene Linie
#[derive(Debug, Clone, PartialEq)]
pub struct SolidLineStyle {
    pub color: MarkingColor,
    pub width: f32,
}

impl SolidLineStyle {
    pub fn calculate(
        &self,
        trajectory: &Trajectory,
        borders: &[Trajectory],
        ctx: &CalculateContext,
    ) -> Vec<MarkingPrimitive> {
        dashes(solid_parts(
            trajectory,
            borders,
            self.width,
            ctx.solid_max_angle,
            ctx.solid_max_length,
            self.color,
        ))
        .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("W", self.width);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            width: element.attr_or("W", options::LINE_WIDTH)?,
        })
    }
}

/// Gestrichelte Linie
#[derive(Debug, Clone, PartialEq)]
pub struct DashedLineStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub dash_length: f32,
    pub space_length: f32,
}

impl DashedLineStyle {
    pub fn calculate(&self, trajectory: &Trajectory, borders: &[Trajectory]) -> Vec<MarkingPrimitive> {
        dashes(place_dashes(
            trajectory,
            borders,
            self.dash_length,
            self.space_length,
            self.width,
            self.color,
        ))
        .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("W", self.width);
        element.set_attr("DL", self.dash_length);
        element.set_attr("SL", self.space_length);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            width: element.attr_or("W", options::LINE_WIDTH)?,
            dash_length: read_pattern_length(element, "DL", options::DASH_LENGTH, MIN_PATTERN_LENGTH)?,
            space_length: read_pattern_length(element, "SL", options::SPACE_LENGTH, 0.0)?,
        })
    }
}

/// Zwei parallele durchgezogene Linien im Abstand `±offset` zur Achse.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleSolidLineStyle {
    pub color: MarkingColor,
    pub second_color: MarkingColor,
    pub width: f32,
    pub offset: f32,
}

impl DoubleSolidLineStyle {
    pub fn calculate(
        &self,
        trajectory: &Trajectory,
        borders: &[Trajectory],
        ctx: &CalculateContext,
    ) -> Vec<MarkingPrimitive> {
        let sides = [
            (trajectory.shift(-self.offset), self.color),
            (trajectory.shift(self.offset), self.second_color),
        ];
        sides
            .iter()
            .flat_map(|(side, color)| {
                solid_parts(
                    side,
                    borders,
                    self.width,
                    ctx.solid_max_angle,
                    ctx.solid_max_length,
                    *color,
                )
            })
            .map(MarkingPrimitive::Dash)
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("SC", self.second_color);
        element.set_attr("W", self.width);
        element.set_attr("O", self.offset);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let color = read_color(element, "C", version, MarkingColor::WHITE)?;
        Ok(Self {
            color,
            second_color: read_color(element, "SC", version, color)?,
            width: element.attr_or("W", options::LINE_WIDTH)?,
            offset: element.attr_or("O", options::DOUBLE_OFFSET)?,
        })
    }
}

/// Zwei parallele gestrichelte Linien
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleDashedLineStyle {
    pub color: MarkingColor,
    pub second_color: MarkingColor,
    pub width: f32,
    pub offset: f32,
    pub dash_length: f32,
    pub space_length: f32,
}

impl DoubleDashedLineStyle {
    pub fn calculate(&self, trajectory: &Trajectory, borders: &[Trajectory]) -> Vec<MarkingPrimitive> {
        let sides = [
            (trajectory.shift(-self.offset), self.color),
            (trajectory.shift(self.offset), self.second_color),
        ];
        sides
            .iter()
            .flat_map(|(side, color)| {
                place_dashes(
                    side,
                    borders,
                    self.dash_length,
                    self.space_length,
                    self.width,
                    *color,
                )
            })
            .map(MarkingPrimitive::Dash)
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("SC", self.second_color);
        element.set_attr("W", self.width);
        element.set_attr("O", self.offset);
        element.set_attr("DL", self.dash_length);
        element.set_attr("SL", self.space_length);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let color = read_color(element, "C", version, MarkingColor::WHITE)?;
        Ok(Self {
            color,
            second_color: read_color(element, "SC", version, color)?,
            width: element.attr_or("W", options::LINE_WIDTH)?,
            offset: element.attr_or("O", options::DOUBLE_OFFSET)?,
            dash_length: read_pattern_length(element, "DL", options::DASH_LENGTH, MIN_PATTERN_LENGTH)?,
            space_length: read_pattern_length(element, "SL", options::SPACE_LENGTH, 0.0)?,
        })
    }
}

/// Links durchgezogen, rechts gestrichelt (`invert` tauscht die Seiten).
#[derive(Debug, Clone, PartialEq)]
pub struct SolidAndDashedLineStyle {
    pub color: MarkingColor,
    pub second_color: MarkingColor,
    pub width: f32,
    pub offset: f32,
    pub dash_length: f32,
    pub space_length: f32,
    pub invert: bool,
}

impl SolidAndDashedLineStyle {
    pub fn calculate(
        &self,
        trajectory: &Trajectory,
        borders: &[Trajectory],
        ctx: &CalculateContext,
    ) -> Vec<MarkingPrimitive> {
        let sign = if self.invert { -1.0 } else { 1.0 };
        let solid = trajectory.shift(-self.offset * sign);
        let dashed = trajectory.shift(self.offset * sign);

        let mut result: Vec<MarkingPrimitive> = dashes(solid_parts(
            &solid,
            borders,
            self.width,
            ctx.solid_max_angle,
            ctx.solid_max_length,
            self.color,
        ))
        .collect();
        result.extend(dashes(place_dashes(
            &dashed,
            borders,
            self.dash_length,
            self.space_length,
            self.width,
            self.second_color,
        )));
        result
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("SC", self.second_color);
        element.set_attr("W", self.width);
        element.set_attr("O", self.offset);
        element.set_attr("DL", self.dash_length);
        element.set_attr("SL", self.space_length);
        element.set_attr("I", u8::from(self.invert));
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let color = read_color(element, "C", version, MarkingColor::WHITE)?;
        Ok(Self {
            color,
            second_color: read_color(element, "SC", version, color)?,
            width: element.attr_or("W", options::LINE_WIDTH)?,
            offset: element.attr_or("O", options::DOUBLE_OFFSET)?,
            dash_length: read_pattern_length(element, "DL", options::DASH_LENGTH, MIN_PATTERN_LENGTH)?,
            space_length: read_pattern_length(element, "SL", options::SPACE_LENGTH, 0.0)?,
            invert: read_flag(element, "I")?,
        })
    }
}

/// Dreiecke entlang der Linie, Spitze nach rechts (`invert`: nach links).
#[derive(Debug, Clone, PartialEq)]
pub struct SharkTeethStyle {
    pub color: MarkingColor,
    pub base: f32,
    pub height: f32,
    pub space: f32,
    pub invert: bool,
}

impl SharkTeethStyle {
    pub fn calculate(&self, trajectory: &Trajectory, borders: &[Trajectory]) -> Vec<MarkingPrimitive> {
        let sign = if self.invert { -1.0 } else { 1.0 };
        clamped_ranges(trajectory, borders, self.base, self.space, self.height)
            .into_iter()
            .map(|(from, to)| {
                let middle = (from + to) * 0.5;
                let apex = trajectory.position(middle)
                    + right_normal(trajectory.tangent(middle)) * (self.height * sign);
                MarkingPrimitive::Polygon(MarkingPolygon {
                    points: vec![trajectory.position(from), apex, trajectory.position(to)],
                    color: self.color,
                    elevation: 0.0,
                    material: MaterialType::Paint,
                })
            })
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("B", self.base);
        element.set_attr("H", self.height);
        element.set_attr("SL", self.space);
        element.set_attr("I", u8::from(self.invert));
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            base: read_pattern_length(element, "B", options::SHARK_TEETH_BASE, MIN_PATTERN_LENGTH)?,
            height: element.attr_or("H", options::SHARK_TEETH_HEIGHT)?,
            space: read_pattern_length(element, "SL", options::SHARK_TEETH_SPACE, 0.0)?,
            invert: read_flag(element, "I")?,
        })
    }
}

/// Zickzack zwischen `-offset` und `+offset`
#[derive(Debug, Clone, PartialEq)]
pub struct ZigZagStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub step: f32,
    pub offset: f32,
    /// Erste Spitze links statt rechts
    pub invert: bool,
}

impl ZigZagStyle {
    pub fn calculate(&self, trajectory: &Trajectory, borders: &[Trajectory]) -> Vec<MarkingPrimitive> {
        let limits = border_limits(trajectory, borders, self.width);
        if limits.is_empty() || self.step <= 0.0 {
            return Vec::new();
        }
        let part = trajectory.cut(limits.start, limits.end);
        let half_steps = pattern_count((part.length() / self.step).round()).max(1) * 2;
        let sign = if self.invert { -1.0 } else { 1.0 };

        let vertices: Vec<_> = (0..=half_steps)
            .map(|i| {
                let t = i as f32 / half_steps as f32;
                let side = if i % 2 == 0 { sign } else { -sign };
                part.position(t) + right_normal(part.tangent(t)) * (self.offset * side)
            })
            .collect();

        vertices
            .windows(2)
            .map(|w| MarkingPrimitive::Dash(MarkingDash::new(w[0], w[1], self.width, self.color)))
            .collect()
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("W", self.width);
        element.set_attr("ST", self.step);
        element.set_attr("O", self.offset);
        element.set_attr("I", u8::from(self.invert));
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            width: element.attr_or("W", options::LINE_WIDTH)?,
            step: read_pattern_length(element, "ST", options::ZIGZAG_STEP, MIN_PATTERN_LENGTH)?,
            offset: element.attr_or("O", options::ZIGZAG_OFFSET)?,
            invert: read_flag(element, "I")?,
        })
    }
}

/// Erhöhter Streifen (Bordstein) entlang der Linie
#[derive(Debug, Clone, PartialEq)]
pub struct PavementLineStyle {
    pub width: f32,
    pub elevation: f32,
}

impl PavementLineStyle {
    pub fn calculate(
        &self,
        trajectory: &Trajectory,
        borders: &[Trajectory],
        ctx: &CalculateContext,
    ) -> Vec<MarkingPrimitive> {
        let limits = border_limits(trajectory, borders, self.width);
        if limits.is_empty() {
            return Vec::new();
        }
        let part = trajectory.cut(limits.start, limits.end);
        let steps = part.subdivide(ctx.solid_max_angle, ctx.solid_max_length);
        let half = self.width * 0.5;

        let mut points = Vec::with_capacity(steps.len() * 2);
        for &t in &steps {
            points.push(part.position(t) - right_normal(part.tangent(t)) * half);
        }
        for &t in steps.iter().rev() {
            points.push(part.position(t) + right_normal(part.tangent(t)) * half);
        }

        vec![MarkingPrimitive::Polygon(MarkingPolygon {
            points,
            color: MarkingColor::PAVEMENT,
            elevation: self.elevation,
            material: MaterialType::Pavement,
        })]
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("W", self.width);
        element.set_attr("E", self.elevation);
    }

    pub(crate) fn read_xml(element: &XmlElement, _version: u32) -> Result<Self> {
        Ok(Self {
            width: element.attr_or("W", options::PAVEMENT_WIDTH)?,
            elevation: element.attr_or("E", options::PAVEMENT_ELEVATION)?,
        })
    }
}
