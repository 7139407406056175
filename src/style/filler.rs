//! Füllungen geschlossener Konturen: Streifen, Gitter, Winkel, Vollfläche, Bordstein.

use super::primitive::{MarkingColor, MarkingDash, MarkingPolygon, MarkingPrimitive, MaterialType};
use super::{
    pattern_count, read_color, read_flag, read_pattern_length, CalculateContext, MIN_PATTERN_LENGTH,
};
use crate::geometry::{ray_intersection, xz, Trajectory};
use crate::shared::options;
use crate::xml::XmlElement;
use anyhow::Result;
use glam::{Vec2, Vec3};

/// Geschlossene Kontur aus Teilkurven; Teil `i` endet dort, wo Teil `i + 1` beginnt.
#[derive(Debug, Clone, PartialEq)]
pub struct FillerContour {
    pub parts: Vec<Trajectory>,
}

impl FillerContour {
    pub fn new(parts: Vec<Trajectory>) -> Self {
        Self { parts }
    }

    /// Eckpunkte des Umrisses (Bögen werden unterteilt).
    pub fn points(&self, max_angle: f32, max_length: f32) -> Vec<Vec3> {
        let mut points = Vec::new();
        for part in &self.parts {
            let steps = part.subdivide(max_angle, max_length);
            // letzter Punkt ist der Anfang des nächsten Teils
            for &t in &steps[..steps.len().saturating_sub(1)] {
                points.push(part.position(t));
            }
        }
        points
    }

    /// Richtung des ersten Teils; Bezugsachse für Streifenwinkel.
    fn axis(&self) -> Vec2 {
        self.parts
            .first()
            .map(|part| xz(part.tangent(0.0)).normalize_or_zero())
            .filter(|axis| *axis != Vec2::ZERO)
            .unwrap_or(Vec2::X)
    }
}

/// Vorzeichenbehaftete Fläche in der XZ-Ebene.
fn signed_area(points: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        area += a.perp_dot(b);
    }
    area * 0.5
}

/// Verschiebt jede Kante um `offset` nach innen.
fn inset(points: &[Vec2], offset: f32) -> Vec<Vec2> {
    let count = points.len();
    if offset == 0.0 || count < 3 {
        return points.to_vec();
    }
    let orientation = signed_area(points).signum();
    let inward = |a: Vec2, b: Vec2| {
        let d = (b - a).normalize_or_zero();
        Vec2::new(-d.y, d.x) * orientation
    };

    (0..count)
        .map(|i| {
            let prev = points[(i + count - 1) % count];
            let current = points[i];
            let next = points[(i + 1) % count];
            let prev_shift = inward(prev, current) * offset;
            let next_shift = inward(current, next) * offset;
            let prev_start = prev + prev_shift;
            let next_start = current + next_shift;
            match ray_intersection(prev_start, current - prev, next_start, next - current) {
                Some((u, _)) => prev_start + (current - prev) * u,
                None => current + next_shift,
            }
        })
        .collect()
}

/// Streifen einer Richtung, die das Polygon durchqueren (Paare von Ein-/Austritt).
fn stripes(polygon: &[Vec2], direction: Vec2, step: f32) -> Vec<(Vec2, Vec2)> {
    if polygon.len() < 3 || step <= 0.0 {
        return Vec::new();
    }
    let normal = Vec2::new(-direction.y, direction.x);
    let (mut n_min, mut n_max) = (f32::MAX, f32::MIN);
    let (mut d_min, mut d_max) = (f32::MAX, f32::MIN);
    for p in polygon {
        n_min = n_min.min(p.dot(normal));
        n_max = n_max.max(p.dot(normal));
        d_min = d_min.min(p.dot(direction));
        d_max = d_max.max(p.dot(direction));
    }

    let first = (n_min / step - 0.5).ceil();
    let last = (n_max / step - 0.5).floor();
    let mut result = Vec::new();
    for k in 0..pattern_count(last - first + 1.0) {
        let c = (first + k as f32 + 0.5) * step;
        let start = normal * c + direction * (d_min - 1.0);
        let span = direction * (d_max - d_min + 2.0);

        let mut hits: Vec<f32> = (0..polygon.len())
            .filter_map(|i| {
                let a = polygon[i];
                let b = polygon[(i + 1) % polygon.len()];
                let (u, v) = ray_intersection(start, span, a, b - a)?;
                ((0.0..1.0).contains(&v) && (0.0..=1.0).contains(&u)).then_some(u)
            })
            .collect();
        hits.sort_by(f32::total_cmp);

        for pair in hits.chunks_exact(2) {
            if pair[1] - pair[0] > 1e-6 {
                result.push((start + span * pair[0], start + span * pair[1]));
            }
        }
    }
    result
}

/// Beschneidet ein Segment auf die Halbebene `side * perp_dot(axis, p - origin) >= 0`.
fn clip_half_plane(segment: (Vec2, Vec2), origin: Vec2, axis: Vec2, side: f32) -> Option<(Vec2, Vec2)> {
    let (p, q) = segment;
    let sp = axis.perp_dot(p - origin) * side;
    let sq = axis.perp_dot(q - origin) * side;
    match (sp >= 0.0, sq >= 0.0) {
        (true, true) => Some((p, q)),
        (false, false) => None,
        (inside_p, _) => {
            let cut = p + (q - p) * (sp / (sp - sq));
            if inside_p {
                Some((p, cut))
            } else {
                Some((cut, q))
            }
        }
    }
}

fn to_dashes(
    segments: Vec<(Vec2, Vec2)>,
    height: f32,
    width: f32,
    color: MarkingColor,
) -> Vec<MarkingPrimitive> {
    segments
        .into_iter()
        .map(|(a, b)| {
            MarkingPrimitive::Dash(MarkingDash::new(
                Vec3::new(a.x, height, a.y),
                Vec3::new(b.x, height, b.y),
                width,
                color,
            ))
        })
        .collect()
}

/// Umriss in der Ebene plus mittlere Höhe.
fn flatten(contour: &FillerContour, ctx: &CalculateContext, offset: f32) -> (Vec<Vec2>, f32) {
    let points = contour.points(ctx.solid_max_angle, ctx.solid_max_length);
    let height = if points.is_empty() {
        0.0
    } else {
        points.iter().map(|p| p.y).sum::<f32>() / points.len() as f32
    };
    let flat: Vec<Vec2> = points.into_iter().map(xz).collect();
    (inset(&flat, offset), height)
}

fn polygon_primitive(
    contour: &FillerContour,
    ctx: &CalculateContext,
    offset: f32,
    color: MarkingColor,
    elevation: f32,
    material: MaterialType,
) -> Vec<MarkingPrimitive> {
    let (points, height) = flatten(contour, ctx, offset);
    if points.len() < 3 {
        return Vec::new();
    }
    vec![MarkingPrimitive::Polygon(MarkingPolygon {
        points: points
            .into_iter()
            .map(|p| Vec3::new(p.x, height, p.y))
            .collect(),
        color,
        elevation,
        material,
    })]
}

/// Parallele Streifen unter `angle` Grad zur ersten Konturkante
#[derive(Debug, Clone, PartialEq)]
pub struct StripeFillerStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub step: f32,
    pub angle: f32,
    pub offset: f32,
}

impl StripeFillerStyle {
    pub fn calculate(&self, contour: &FillerContour, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        let (polygon, height) = flatten(contour, ctx, self.offset);
        let direction = Vec2::from_angle(self.angle.to_radians()).rotate(contour.axis());
        to_dashes(stripes(&polygon, direction, self.step), height, self.width, self.color)
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        write_striped(element, self.color, self.width, self.step, self.angle, self.offset);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let (color, width, step, angle, offset) = read_striped(element, version)?;
        Ok(Self {
            color,
            width,
            step,
            angle,
            offset,
        })
    }
}

/// Zwei gekreuzte Streifenscharen
#[derive(Debug, Clone, PartialEq)]
pub struct GridFillerStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub step: f32,
    pub angle: f32,
    pub offset: f32,
}

impl GridFillerStyle {
    pub fn calculate(&self, contour: &FillerContour, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        let (polygon, height) = flatten(contour, ctx, self.offset);
        let direction = Vec2::from_angle(self.angle.to_radians()).rotate(contour.axis());
        let mut segments = stripes(&polygon, direction, self.step);
        segments.extend(stripes(&polygon, direction.perp(), self.step));
        to_dashes(segments, height, self.width, self.color)
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        write_striped(element, self.color, self.width, self.step, self.angle, self.offset);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let (color, width, step, angle, offset) = read_striped(element, version)?;
        Ok(Self {
            color,
            width,
            step,
            angle,
            offset,
        })
    }
}

/// Winkelstreifen (V-Form) symmetrisch zur Achse durch den Schwerpunkt
#[derive(Debug, Clone, PartialEq)]
pub struct ChevronFillerStyle {
    pub color: MarkingColor,
    pub width: f32,
    pub step: f32,
    /// Halber Öffnungswinkel in Grad
    pub angle: f32,
    pub offset: f32,
    pub invert: bool,
}

impl ChevronFillerStyle {
    pub fn calculate(&self, contour: &FillerContour, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        let (polygon, height) = flatten(contour, ctx, self.offset);
        if polygon.len() < 3 {
            return Vec::new();
        }
        let axis = contour.axis();
        let center = polygon.iter().copied().sum::<Vec2>() / polygon.len() as f32;
        let angle = if self.invert { -self.angle } else { self.angle };

        let left = Vec2::from_angle(angle.to_radians()).rotate(axis);
        let right = Vec2::from_angle(-angle.to_radians()).rotate(axis);
        let mut segments: Vec<_> = stripes(&polygon, left, self.step)
            .into_iter()
            .filter_map(|s| clip_half_plane(s, center, axis, 1.0))
            .collect();
        segments.extend(
            stripes(&polygon, right, self.step)
                .into_iter()
                .filter_map(|s| clip_half_plane(s, center, axis, -1.0)),
        );
        to_dashes(segments, height, self.width, self.color)
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        write_striped(element, self.color, self.width, self.step, self.angle, self.offset);
        element.set_attr("I", u8::from(self.invert));
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        let (color, width, step, angle, offset) = read_striped(element, version)?;
        Ok(Self {
            color,
            width,
            step,
            angle,
            offset,
            invert: read_flag(element, "I")?,
        })
    }
}

/// Vollfläche in Farbe
#[derive(Debug, Clone, PartialEq)]
pub struct SolidFillerStyle {
    pub color: MarkingColor,
    pub offset: f32,
}

impl SolidFillerStyle {
    pub fn calculate(&self, contour: &FillerContour, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        polygon_primitive(contour, ctx, self.offset, self.color, 0.0, MaterialType::Paint)
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("C", self.color);
        element.set_attr("O", self.offset);
    }

    pub(crate) fn read_xml(element: &XmlElement, version: u32) -> Result<Self> {
        Ok(Self {
            color: read_color(element, "C", version, MarkingColor::WHITE)?,
            offset: element.attr_or("O", 0.0)?,
        })
    }
}

/// Erhöhte Insel
#[derive(Debug, Clone, PartialEq)]
pub struct PavementFillerStyle {
    pub elevation: f32,
    pub offset: f32,
}

impl PavementFillerStyle {
    pub fn calculate(&self, contour: &FillerContour, ctx: &CalculateContext) -> Vec<MarkingPrimitive> {
        polygon_primitive(
            contour,
            ctx,
            self.offset,
            MarkingColor::PAVEMENT,
            self.elevation,
            MaterialType::Pavement,
        )
    }

    pub(crate) fn write_xml(&self, element: &mut XmlElement) {
        element.set_attr("E", self.elevation);
        element.set_attr("O", self.offset);
    }

    pub(crate) fn read_xml(element: &XmlElement, _version: u32) -> Result<Self> {
        Ok(Self {
            elevation: element.attr_or("E", options::PAVEMENT_ELEVATION)?,
            offset: element.attr_or("O", 0.0)?,
        })
    }
}

fn write_striped(element: &mut XmlElement, color: MarkingColor, width: f32, step: f32, angle: f32, offset: f32) {
    element.set_attr("C", color);
    element.set_attr("W", width);
    element.set_attr("ST", step);
    element.set_attr("A", angle);
    element.set_attr("O", offset);
}

fn read_striped(element: &XmlElement, version: u32) -> Result<(MarkingColor, f32, f32, f32, f32)> {
    Ok((
        read_color(element, "C", version, MarkingColor::WHITE)?,
        element.attr_or("W", options::LINE_WIDTH)?,
        read_pattern_length(element, "ST", options::FILLER_STEP, MIN_PATTERN_LENGTH)?,
        element.attr_or("A", options::FILLER_ANGLE)?,
        element.attr_or("O", 0.0)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f32) -> FillerContour {
        let corners = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(size, 0.0, 0.0),
            Vec3::new(size, 0.0, size),
            Vec3::new(0.0, 0.0, size),
        ];
        FillerContour::new(
            (0..4)
                .map(|i| Trajectory::straight(corners[i], corners[(i + 1) % 4]))
                .collect(),
        )
    }

    #[test]
    fn test_inset_square() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ];
        let inner = inset(&points, 1.0);
        assert_relative_eq!(signed_area(&inner).abs(), 64.0, epsilon = 1e-3);
        assert_relative_eq!(inner[0].x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(inner[0].y, 1.0, epsilon = 1e-4);
    }

    #[test]
    fn test_stripes_parallel_to_first_edge() {
        let style = StripeFillerStyle {
            color: MarkingColor::WHITE,
            width: 0.15,
            step: 1.0,
            angle: 0.0,
            offset: 0.0,
        };
        let result = style.calculate(&square(10.0), &CalculateContext::default());
        assert_eq!(result.len(), 10);
        for stripe in &result {
            assert_relative_eq!(stripe.as_dash().unwrap().length(), 10.0, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_grid_doubles_stripes() {
        let style = GridFillerStyle {
            color: MarkingColor::WHITE,
            width: 0.15,
            step: 1.0,
            angle: 0.0,
            offset: 0.0,
        };
        assert_eq!(style.calculate(&square(10.0), &CalculateContext::default()).len(), 20);
    }

    #[test]
    fn test_chevron_stays_inside() {
        let style = ChevronFillerStyle {
            color: MarkingColor::WHITE,
            width: 0.15,
            step: 1.0,
            angle: 45.0,
            offset: 0.0,
            invert: false,
        };
        let result = style.calculate(&square(10.0), &CalculateContext::default());
        assert!(!result.is_empty());
        for primitive in &result {
            let dash = primitive.as_dash().expect("Strich erwartet");
            for p in [dash.start, dash.end] {
                assert!((-1e-3..=10.001).contains(&p.x) && (-1e-3..=10.001).contains(&p.z));
            }
        }
    }

    #[test]
    fn test_solid_and_pavement_polygons() {
        let ctx = CalculateContext::default();
        let solid = SolidFillerStyle {
            color: MarkingColor::YELLOW,
            offset: 0.0,
        }
        .calculate(&square(4.0), &ctx);
        let MarkingPrimitive::Polygon(polygon) = &solid[0] else {
            panic!("Polygon erwartet");
        };
        assert_eq!(polygon.points.len(), 4);

        let pavement = PavementFillerStyle {
            elevation: 0.3,
            offset: 0.5,
        }
        .calculate(&square(4.0), &ctx);
        let MarkingPrimitive::Polygon(island) = &pavement[0] else {
            panic!("Polygon erwartet");
        };
        assert_eq!(island.material, MaterialType::Pavement);
        assert_relative_eq!(island.points[0].x, 0.5, epsilon = 1e-4);
    }
}
