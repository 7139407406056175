//! Fußgängerüberwege: Geometrie (Einfahrtslinie plus Seitengrenzen) und Stile.

use super::dash::{clamped_ranges, solid_parts};
use super::primitive::{MarkingColor, MarkingDash, MarkingPolygon, MarkingPrimitive, MaterialType};
use super::{
    pattern_count, read_color, read_flag, read_pattern_length, CalculateContext, MIN_PATTERN_LENGTH,
};
use crate::geometry::{Intersection, StraightTrajectory, Trajectory};
use crate::shared::options;
use crate::xml::XmlElement;
use anyhow::Result;
use glam::Vec3;

/// Aufgelöste Geometrie eines Überwegs.
///
/// `right` beginnt am Start der Einfahrtslinie, `left` an ihrem Ende;
/// beide laufen in Richtung `normal` in den Knoten hinein.
#[derive(Debug, Clone, PartialEq)]
pub struct CrosswalkGeometry {
    pub enter: StraightTrajectory,
    pub normal: Vec3,
    pub right: Trajectory,
    pub left: Trajectory,
    pub width: f32,
}

impl CrosswalkGeometry {
    /// Standardgrenzen: Projektion der Endpunkte entlang der Normalen.
    pub fn with_default_borders(enter: StraightTrajectory, normal: Vec3, width: f32) -> Self {
        Self {
            right: Self::default_border(enter.start, normal, width),
            left: Self::default_border(enter.end, normal, width),
            enter,
            normal,
            width,
        }
    }

    /// Geometrie mit optionalen Grenzlinien; ohne Schnitt gilt die Projektion.
    pub fn resolve(
        enter: StraightTrajectory,
        normal: Vec3,
        width: f32,
        right_border: Option<&Trajectory>,
        left_border: Option<&Trajectory>,
    ) -> Self {
        let far_edge = Self::far_edge(&enter, normal, width);
        let right = right_border
            .and_then(|border| Self::clip_border(border, enter.start, &far_edge))
            .unwrap_or_else(|| Self::default_border(enter.start, normal, width));
        let left = left_border
            .and_then(|border| Self::clip_border(border, enter.end, &far_edge))
            .unwrap_or_else(|| Self::default_border(enter.end, normal, width));
        Self {
            enter,
            normal,
            right,
            left,
            width,
        }
    }

    pub fn default_border(point: Vec3, normal: Vec3, width: f32) -> Trajectory {
        Trajectory::straight(point, point + normal * width)
    }

    /// Verlängerte ferne Kante des Überwegs.
    fn far_edge(enter: &StraightTrajectory, normal: Vec3, width: f32) -> Trajectory {
        let along = enter.direction();
        let extent = enter.length() + width * 4.0 + 1.0;
        let shift = normal * width;
        Trajectory::straight(
            enter.start + shift - along * extent,
            enter.end + shift + along * extent,
        )
    }

    /// Teil der Grenzlinie zwischen dem gemeinsamen Endpunkt und der fernen Kante.
    fn clip_border(border: &Trajectory, shared_point: Vec3, far_edge: &Trajectory) -> Option<Trajectory> {
        let hit = Intersection::calculate_single(border, far_edge);
        if !hit.is_intersect {
            return None;
        }
        let from_start = border.start_position().distance(shared_point);
        let from_end = border.end_position().distance(shared_point);
        if from_start <= from_end {
            Some(border.cut(0.0, hit.first_t))
        } else {
            Some(border.cut(1.0, hit.first_t))
        }
    }

    pub fn borders(&self) -> [Trajectory; 2] {
        [self.right.clone(), self.left.clone()]
    }

    /// Parallele zur Einfahrtslinie im Abstand `distance`, an den Grenzen beschnitten.
    pub fn line_at(&self, distance: f32) -> Trajectory {
        let shift = self.normal * distance;
        let along = self.enter.direction();
        let extent = self.enter.length() + self.width * 4.0 + 1.0;
        let probe = Trajectory::straight(
            self.enter.start + shift - along * extent,
            self.enter.end + shift + along * extent,
        );
        let clip = |border: &Trajectory| {
            let hit = Intersection::calculate_single(&probe, border);
            hit.is_intersect.then_some(hit.position)
        };
        let start = clip(&self.right).unwrap_or(self.enter.start + shift);
        let end = clip(&self.left).unwrap_or(self.enter.end + shift);
        Trajectory::straight(start, end)
    }

    /// Viereck zwischen zwei Abständen.
    fn band(&self, from: f32, to: f32) -> Vec<Vec3> {
        let near = self.line_at(from);
        let far = self.line_at(to);
        vec![
            near.start_position(),
            near.end_position(),
            far.end_position(),
            far.start_position(),
        ]
    }

    /// Querbalken zwischen `from` und `from + bar_length`.
    fn zebra_row(
        &self,
        from: f32,
        bar_length: f32,
        dash: f32,
        space: f32,
        color: MarkingColor,
    ) -> Vec<MarkingPrimitive> {
        let middle = self.line_at(from + bar_length * 0.5);
        let length = middle.length();
        clamped_ranges(&middle, &self.borders(), dash, space, bar_length)
            .into_iter()
            .map(|(t0, t1)| {
                let center = middle.position((t0 + t1) * 0.5);
                MarkingPrimitive::Dash(MarkingDash::centered(
                    center,
                    self.normal,
                    bar_length,
                    (t1 - t0) * length,
                    color,
                ))
            })
            .collect()
    }

    fn solid_line(&self, distance: f32, width: f32, color: MarkingColor, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        solid_parts(
            &self.line_at(distance),
            &self.borders(),
            width,
            ctx.solid_max_angle,
            ctx.solid_max_length,
            color,
        )
        .into_iter()
        .map(MarkingPrimitive::Dash)
        .collect()
    }
}

/// Vorhandener Überweg der Straße; erzeugt keine eigene Geometrie.
#[derive(Debug, Clone, PartialEq)]
pub struct ExistentCrosswalkStyle {
    pub width: f32,
}

impl ExistentCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.width
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("W", self.width);
    }

    pub(crate) fn read_xml(element: &XmlElement, _version: u32) -> Result<Self> {
        Ok(Self {
            width: element.attr_or("W", options::CROSSWALK_WIDTH)?,
        })
    }
}

/// Zebrastreifen
#[derive(Debug, Clone, PartialEq)]
pub struct ZebraCrosswalkStyle {
    pub color: MarkingColor,
    /// Balkenlänge quer zur Fahrbahn
    pub width: f32,
    /// Balkenbreite
    pub dash_length: f32,
    pub space_length: f32,
    pub offset_before: f32,
    pub offset_after: f32,
}

impl ZebraCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.offset_before + self.width + self.offset_after
    }

    pub fn calculate(&self, geometry: &CrosswalkGeometry) -> Vec<MarkingPrimitive> {
        geometry.zebra_row(
            self.offset_before,
            self.width,
            self.dash_length,
            self.space_length,
            self.color,
        )
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("W", self.width);
        element.set_attr("DL", self.dash_length);
        element.set_attr("SL", self.space_length);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            width: element.attr_or("W", options::CROSSWALK_WIDTH)?,
            dash_length: read_pattern_length(element, "DL", options::CROSSWALK_DASH_LENGTH, MIN_PATTERN_LENGTH)?,
            space_length: read_pattern_length(element, "SL", options::CROSSWALK_SPACE_LENGTH, 0.0)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
        })
    }
}

/// Zwei Reihen Zebrabalken mit Abstand `offset_between`
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleZebraCrosswalkStyle {
    pub color: MarkingColor,
    pub second_color: MarkingColor,
    pub width: f32,
    pub dash_length: f32,
    pub space_length: f32,
    pub offset_before: f32,
    pub offset_after: f32,
    pub offset_between: f32,
}

impl DoubleZebraCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.offset_before + self.width * 2.0 + self.offset_between + self.offset_after
    }

    pub fn calculate(&self, geometry: &CrosswalkGeometry) -> Vec<MarkingPrimitive> {
        let mut result = geometry.zebra_row(
            self.offset_before,
            self.width,
            self.dash_length,
            self.space_length,
            self.color,
        );
        result.extend(geometry.zebra_row(
            self.offset_before + self.width + self.offset_between,
            self.width,
            self.dash_length,
            self.space_length,
            self.second_color,
        ));
        result
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("SC", self.second_color);
        element.set_attr("W", self.width);
        element.set_attr("DL", self.dash_length);
        element.set_attr("SL", self.space_length);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
        element.set_attr("OBW", self.offset_between);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let color = read_color(element, "C", version, MarkingColor::WHITE)?;
        Ok(Self {
            color,
            second_color: read_color(element, "SC", version, color)?,
            width: element.attr_or("W", options::CROSSWALK_WIDTH)?,
            dash_length: read_pattern_length(element, "DL", options::CROSSWALK_DASH_LENGTH, MIN_PATTERN_LENGTH)?,
            space_length: read_pattern_length(element, "SL", options::CROSSWALK_SPACE_LENGTH, 0.0)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
            offset_between: element.attr_or("OBW", options::CROSSWALK_SPACE_LENGTH)?,
        })
    }
}

/// Zwei parallele Linien; `dashes` = `Some((Strich, Lücke))` für gestrichelte Linien.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelLinesCrosswalkStyle {
    pub color: MarkingColor,
    pub second_color: MarkingColor,
    /// Abstand zwischen den Linien
    pub width: f32,
    pub line_width: f32,
    pub offset_before: f32,
    pub offset_after: f32,
    pub dashes: Option<(f32, f32)>,
}

impl ParallelLinesCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.offset_before + self.line_width * 2.0 + self.width + self.offset_after
    }

    fn line_distances(&self) -> [f32; 2] {
        let first = self.offset_before + self.line_width * 0.5;
        [first, first + self.line_width + self.width]
    }

    pub fn calculate(&self, geometry: &CrosswalkGeometry, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        let [near, far] = self.line_distances();
        let lines = [(near, self.color), (far, self.second_color)];
        match self.dashes {
            None => lines
                .iter()
                .flat_map(|(distance, color)| geometry.solid_line(*distance, self.line_width, *color, ctx))
                .collect(),
            Some((dash, space)) => lines
                .iter()
                .flat_map(|(distance, color)| {
                    super::dash::place_dashes(
                        &geometry.line_at(*distance),
                        &geometry.borders(),
                        dash,
                        space,
                        self.line_width,
                        *color,
                    )
                })
                .map(MarkingPrimitive::Dash)
                .collect(),
        }
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("SC", self.second_color);
        element.set_attr("W", self.width);
        element.set_attr("LW", self.line_width);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
        if let Some((dash, space)) = self.dashes {
            element.set_attr("DL", dash);
            element.set_attr("SL", space);
        }
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32, dashed: bool) -> Result<Self> {
        let color = read_color(element, "C", version, MarkingColor::WHITE)?;
        let dashes = if dashed {
            Some((
                read_pattern_length(element, "DL", options::DASH_LENGTH, MIN_PATTERN_LENGTH)?,
                read_pattern_length(element, "SL", options::SPACE_LENGTH, 0.0)?,
            ))
        } else {
            None
        };
        Ok(Self {
            color,
            second_color: read_color(element, "SC", version, color)?,
            width: element.attr_or("W", options::CROSSWALK_WIDTH)?,
            line_width: element.attr_or("LW", options::CROSSWALK_LINE_WIDTH)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
            dashes,
        })
    }
}

/// Zwei Randlinien mit Zebrabalken dazwischen
#[derive(Debug, Clone, PartialEq)]
pub struct LadderCrosswalkStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub dash_length: f32,
    pub space_length: f32,
    pub line_width: f32,
    pub offset_before: f32,
    pub offset_after: f32,
}

impl LadderCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.offset_before + self.line_width * 2.0 + self.width + self.offset_after
    }

    pub fn calculate(&self, geometry: &CrosswalkGeometry, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        let near = self.offset_before + self.line_width * 0.5;
        let far = near + self.line_width + self.width;
        let mut result = geometry.solid_line(near, self.line_width, self.color, ctx);
        result.extend(geometry.solid_line(far, self.line_width, self.color, ctx));
        result.extend(geometry.zebra_row(
            self.offset_before + self.line_width,
            self.width,
            self.dash_length,
            self.space_length,
            self.color,
        ));
        result
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("W", self.width);
        element.set_attr("DL", self.dash_length);
        element.set_attr("SL", self.space_length);
        element.set_attr("LW", self.line_width);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            width: element.attr_or("W", options::CROSSWALK_WIDTH)?,
            dash_length: read_pattern_length(element, "DL", options::CROSSWALK_DASH_LENGTH, MIN_PATTERN_LENGTH)?,
            space_length: read_pattern_length(element, "SL", options::CROSSWALK_SPACE_LENGTH, 0.0)?,
            line_width: element.attr_or("LW", options::CROSSWALK_LINE_WIDTH)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
        })
    }
}

/// Vollflächiger Überweg
#[derive(Debug, Clone, PartialEq)]
pub struct SolidCrosswalkStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub offset_before: f32,
    pub offset_after: f32,
}

impl SolidCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.offset_before + self.width + self.offset_after
    }

    pub fn calculate(&self, geometry: &CrosswalkGeometry) -> Vec<MarkingPrimitive> {
        vec![MarkingPrimitive::Polygon(MarkingPolygon {
            points: geometry.band(self.offset_before, self.offset_before + self.width),
            color: self.color,
            elevation: 0.0,
            material: MaterialType::Paint,
        })]
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("W", self.width);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            width: element.attr_or("W", options::CROSSWALK_WIDTH)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
        })
    }
}

/// Schachbrett aus `line_count` Reihen
#[derive(Debug, Clone, PartialEq)]
pub struct ChessBoardCrosswalkStyle {
    pub color: MarkingColor,
    pub square_side: f32,
    pub line_count: u32,
    pub offset_before: f32,
    pub offset_after: f32,
    pub invert: bool,
}

impl ChessBoardCrosswalkStyle {
    pub fn total_width(&self) -> f32 {
        self.offset_before + self.square_side * self.line_count as f32 + self.offset_after
    }

    pub fn calculate(&self, geometry: &CrosswalkGeometry) -> Vec<MarkingPrimitive> {
        if self.square_side <= 0.0 {
            return Vec::new();
        }
        let half = geometry.normal * (self.square_side * 0.5);
        let mut result = Vec::new();

        for row in 0..pattern_count(self.line_count as f32) {
            let middle = geometry.line_at(self.offset_before + self.square_side * (row as f32 + 0.5));
            let length = middle.length();
            let count = pattern_count((length / self.square_side + 1e-4).floor());
            if count == 0 {
                continue;
            }
            let first = (length - count as f32 * self.square_side) * 0.5;
            for column in 0..count {
                if (column + row + usize::from(self.invert)) % 2 != 0 {
                    continue;
                }
                let a = middle.position((first + column as f32 * self.square_side) / length);
                let b = middle.position((first + (column + 1) as f32 * self.square_side) / length);
                result.push(MarkingPrimitive::Polygon(MarkingPolygon {
                    points: vec![a - half, b - half, b + half, a + half],
                    color: self.color,
                    elevation: 0.0,
                    material: MaterialType::Paint,
                }));
            }
        }
        result
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("SQ", self.square_side);
        element.set_attr("LC", self.line_count);
        element.set_attr("OB", self.offset_before);
        element.set_attr("OA", self.offset_after);
        element.set_attr("I", u8::from(self.invert));
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            square_side: read_pattern_length(element, "SQ", 1.0, MIN_PATTERN_LENGTH)?,
            line_count: element.attr_or("LC", 2)?,
            offset_before: element.attr_or("OB", 0.0)?,
            offset_after: element.attr_or("OA", 0.0)?,
            invert: read_flag(element, "I")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Einfahrt entlang X, Überweg läuft in +Z
    fn geometry(width: f32) -> CrosswalkGeometry {
        CrosswalkGeometry::with_default_borders(
            StraightTrajectory::new(Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0)),
            Vec3::Z,
            width,
        )
    }

    #[test]
    fn test_default_borders_have_total_width() {
        let geometry = geometry(2.0);
        assert_relative_eq!(geometry.right.length(), 2.0);
        assert_relative_eq!(geometry.left.length(), 2.0);
        assert_eq!(geometry.left.start_position(), Vec3::new(6.0, 0.0, 0.0));
    }

    #[test]
    fn test_border_clipped_at_far_edge() {
        // Schräge Grenzlinie, die am linken Endpunkt beginnt
        let border = Trajectory::straight(Vec3::new(6.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 4.0));
        let geometry = CrosswalkGeometry::resolve(
            StraightTrajectory::new(Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0)),
            Vec3::Z,
            2.0,
            None,
            Some(&border),
        );
        let end = geometry.left.end_position();
        assert_relative_eq!(end.x, 8.0, epsilon = 1e-4);
        assert_relative_eq!(end.z, 2.0, epsilon = 1e-4);
        assert_relative_eq!(geometry.right.length(), 2.0);
    }

    #[test]
    fn test_border_starting_at_far_side_is_inverted() {
        let border = Trajectory::straight(Vec3::new(10.0, 0.0, 4.0), Vec3::new(6.0, 0.0, 0.0));
        let geometry = CrosswalkGeometry::resolve(
            StraightTrajectory::new(Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0)),
            Vec3::Z,
            2.0,
            None,
            Some(&border),
        );
        let start = geometry.left.start_position();
        assert_relative_eq!(start.x, 6.0, epsilon = 1e-4);
        assert_relative_eq!(geometry.left.end_position().z, 2.0, epsilon = 1e-4);
    }

    #[test]
    fn test_parallel_border_falls_back_to_default() {
        // Grenze parallel zur fernen Kante → kein Schnitt
        let border = Trajectory::straight(Vec3::new(6.0, 0.0, 0.0), Vec3::new(12.0, 0.0, 0.0));
        let geometry = CrosswalkGeometry::resolve(
            StraightTrajectory::new(Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0)),
            Vec3::Z,
            2.0,
            None,
            Some(&border),
        );
        assert_eq!(
            geometry.left,
            CrosswalkGeometry::default_border(Vec3::new(6.0, 0.0, 0.0), Vec3::Z, 2.0)
        );
    }

    #[test]
    fn test_zebra_bars_across_road() {
        let style = ZebraCrosswalkStyle {
            color: MarkingColor::WHITE,
            width: 2.0,
            dash_length: 0.5,
            space_length: 0.5,
            offset_before: 0.0,
            offset_after: 0.0,
        };
        let result = style.calculate(&geometry(2.0));
        assert_eq!(result.len(), 6);
        let bar = result[0].as_dash().expect("Strich erwartet");
        assert_relative_eq!(bar.length(), 2.0, epsilon = 1e-4);
        assert_relative_eq!(bar.width, 0.5, epsilon = 1e-4);
        assert_relative_eq!(bar.center().z, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_parallel_lines_positions() {
        let style = ParallelLinesCrosswalkStyle {
            color: MarkingColor::WHITE,
            second_color: MarkingColor::WHITE,
            width: 2.0,
            line_width: 0.2,
            offset_before: 0.0,
            offset_after: 0.0,
            dashes: None,
        };
        let geometry = geometry(style.total_width());
        let result = style.calculate(&geometry, &CalculateContext::default());
        assert_eq!(result.len(), 2);
        assert_relative_eq!(result[0].as_dash().unwrap().start.z, 0.1, epsilon = 1e-4);
        assert_relative_eq!(result[1].as_dash().unwrap().start.z, 2.3, epsilon = 1e-4);
    }

    #[test]
    fn test_chessboard_alternates() {
        let style = ChessBoardCrosswalkStyle {
            color: MarkingColor::WHITE,
            square_side: 1.0,
            line_count: 2,
            offset_before: 0.0,
            offset_after: 0.0,
            invert: false,
        };
        let result = style.calculate(&geometry(style.total_width()));
        // 6 Felder je Reihe, jedes zweite gefüllt
        assert_eq!(result.len(), 6);
    }

    #[test]
    fn test_solid_band() {
        let style = SolidCrosswalkStyle {
            color: MarkingColor::WHITE,
            width: 2.0,
            offset_before: 0.5,
            offset_after: 0.0,
        };
        let result = style.calculate(&geometry(style.total_width()));
        let MarkingPrimitive::Polygon(polygon) = &result[0] else {
            panic!("Polygon erwartet");
        };
        assert_relative_eq!(polygon.points[0].z, 0.5, epsilon = 1e-4);
        assert_relative_eq!(polygon.points[2].z, 2.5, epsilon = 1e-4);
    }
}
