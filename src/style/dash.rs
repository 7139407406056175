//! Strich-Platzierung entlang einer Trajektorie mit Begrenzung an Grenzlinien.

use super::pattern_count;
use super::primitive::{MarkingColor, MarkingDash};
use crate::geometry::{butt_offset, Intersection, Trajectory, PARALLEL_OFFSET_SENTINEL};

/// Geklemmte Striche kürzer als dieser Anteil der Strichlänge gelten als Splitter.
/// Empirisch abgestimmt, nicht verändern.
pub const DISCARD_LENGTH_RATIO: f32 = 0.9;
/// Geklemmte Striche kürzer als dieser Anteil der Breite gelten als Splitter.
/// Empirisch abgestimmt, nicht verändern.
pub const DISCARD_WIDTH_RATIO: f32 = 0.67;

/// Parameterbereich `[start, end]`, in dem Striche liegen dürfen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderLimits {
    pub start: f32,
    pub end: f32,
}

impl BorderLimits {
    pub const FULL: BorderLimits = BorderLimits { start: 0.0, end: 1.0 };

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Schneidet einen Bereich auf die Grenzen zu.
    pub fn clamp(&self, from: f32, to: f32) -> Option<(f32, f32)> {
        let from = from.max(self.start);
        let to = to.min(self.end);
        (to > from).then_some((from, to))
    }
}

/// Innerste Grenzschnitte einer Trajektorie.
///
/// Ein Schnitt in der ersten Hälfte begrenzt den Anfang, sonst das Ende.
/// Der Grenzwert wird um den Gehrungsversatz der halben Breite nach innen gezogen;
/// parallele Grenzen (Sentinel-Versatz) werden ignoriert.
pub fn border_limits(trajectory: &Trajectory, borders: &[Trajectory], width: f32) -> BorderLimits {
    let length = trajectory.length();
    let mut limits = BorderLimits::FULL;
    if length <= 0.0 {
        return limits;
    }

    for border in borders {
        for hit in Intersection::calculate(trajectory, border) {
            let offset = butt_offset(
                width * 0.5,
                trajectory.tangent(hit.first_t),
                border.tangent(hit.second_t),
            );
            if offset >= PARALLEL_OFFSET_SENTINEL {
                continue;
            }
            let offset_t = offset / length;
            if hit.first_t <= 0.5 {
                limits.start = limits.start.max(hit.first_t + offset_t);
            } else {
                limits.end = limits.end.min(hit.first_t - offset_t);
            }
        }
    }
    limits
}

/// Ungeklemmte Strich-Bereiche (Parameter) für Länge `length`.
///
/// `n = floor((L + s) / (d + s))` Striche, das Muster ist mittig auf der Kurve.
pub fn dash_ranges(length: f32, dash: f32, space: f32) -> Vec<(f32, f32)> {
    if length <= 0.0 || dash <= 0.0 || space < 0.0 {
        return Vec::new();
    }
    let period = dash + space;
    let count = pattern_count(((length + space) / period + 1e-4).floor());
    if count == 0 {
        return Vec::new();
    }

    let pattern = count as f32 * dash + (count - 1) as f32 * space;
    let first = (length - pattern) * 0.5;
    (0..count)
        .map(|i| {
            let start = first + i as f32 * period;
            (start / length, (start + dash) / length)
        })
        .collect()
}

/// Striche nach Grenzen klemmen und Splitter verwerfen.
pub fn clamped_ranges(
    trajectory: &Trajectory,
    borders: &[Trajectory],
    dash: f32,
    space: f32,
    width: f32,
) -> Vec<(f32, f32)> {
    let length = trajectory.length();
    let limits = border_limits(trajectory, borders, width);
    if limits.is_empty() {
        return Vec::new();
    }

    dash_ranges(length, dash, space)
        .into_iter()
        .filter_map(|(from, to)| limits.clamp(from, to))
        .filter(|(from, to)| !is_sliver((to - from) * length, dash, width))
        .collect()
}

/// Beide Bedingungen müssen zutreffen, damit ein Strich verworfen wird.
pub fn is_sliver(clamped_length: f32, dash: f32, width: f32) -> bool {
    clamped_length < DISCARD_LENGTH_RATIO * dash && clamped_length < DISCARD_WIDTH_RATIO * width
}

/// Gestrichelte Linie.
pub fn place_dashes(
    trajectory: &Trajectory,
    borders: &[Trajectory],
    dash: f32,
    space: f32,
    width: f32,
    color: MarkingColor,
) -> Vec<MarkingDash> {
    clamped_ranges(trajectory, borders, dash, space, width)
        .into_iter()
        .map(|(from, to)| dash_between(trajectory, from, to, width, color))
        .collect()
}

/// Durchgezogene Linie, in Sehnen zerlegt.
pub fn solid_parts(
    trajectory: &Trajectory,
    borders: &[Trajectory],
    width: f32,
    max_angle: f32,
    max_length: f32,
    color: MarkingColor,
) -> Vec<MarkingDash> {
    let limits = border_limits(trajectory, borders, width);
    if limits.is_empty() {
        return Vec::new();
    }
    let part = trajectory.cut(limits.start, limits.end);
    let steps = part.subdivide(max_angle, max_length);
    steps
        .windows(2)
        .map(|w| dash_between(&part, w[0], w[1], width, color))
        .filter(|dash| dash.length() > 0.0)
        .collect()
}

/// Sehne zwischen zwei Parametern als Strich.
pub fn dash_between(
    trajectory: &Trajectory,
    from: f32,
    to: f32,
    width: f32,
    color: MarkingColor,
) -> MarkingDash {
    MarkingDash::new(trajectory.position(from), trajectory.position(to), width, color)
}
