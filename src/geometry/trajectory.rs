//! Unveränderliche Kurventypen: Gerade, Kreisbogen und zusammengesetzte Kurve.
//!
//! Alle Trajektorien sind nach Bogenlänge parametrisiert (t ∈ [0, 1]).
//! Die Kreuzungsebene ist XZ, Y ist die Höhe und wird linear interpoliert.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

/// Unterhalb dieser Länge gilt ein Teilstück als entartet.
pub const MIN_PART_LENGTH: f32 = 1e-4;

/// Projektion auf die XZ-Ebene.
pub fn xz(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Rechte Normale einer Fahrtrichtung in der XZ-Ebene (+X = Ost, +Z = Süd).
pub fn right_normal(direction: Vec3) -> Vec3 {
    Vec3::new(-direction.z, 0.0, direction.x).normalize_or_zero()
}

/// Schnitt zweier Strahlen `p + u·d` und `q + v·e` in der XZ-Ebene.
///
/// Gibt `None` bei parallelen Richtungen zurück.
pub fn ray_intersection(p: Vec2, d: Vec2, q: Vec2, e: Vec2) -> Option<(f32, f32)> {
    let cross = d.perp_dot(e);
    if cross.abs() < 1e-6 {
        return None;
    }
    let w = q - p;
    Some((w.perp_dot(e) / cross, w.perp_dot(d) / cross))
}

/// Gerades Segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightTrajectory {
    pub start: Vec3,
    pub end: Vec3,
}

impl StraightTrajectory {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        xz(self.end - self.start).length()
    }

    pub fn position(&self, t: f32) -> Vec3 {
        self.start.lerp(self.end, t)
    }

    pub fn direction(&self) -> Vec3 {
        let delta = self.end - self.start;
        Vec3::new(delta.x, 0.0, delta.z).normalize_or_zero()
    }
}

/// Kreisbogen in der XZ-Ebene.
///
/// `sweep > 0` läuft mit steigendem Winkel (im Uhrzeigersinn bei Draufsicht mit +Z = Süd).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcTrajectory {
    pub center: Vec2,
    pub radius: f32,
    pub start_angle: f32,
    pub sweep: f32,
    pub start_y: f32,
    pub end_y: f32,
}

impl ArcTrajectory {
    /// Bogen, der `start` entlang `tangent` verlässt und in `end` endet.
    ///
    /// Gibt `None` zurück, wenn `end` (nahezu) auf der Tangente liegt.
    pub fn from_tangent(start: Vec3, tangent: Vec3, end: Vec3) -> Option<Self> {
        let s = xz(start);
        let e = xz(end);
        let t = xz(tangent).normalize_or_zero();
        let chord = e - s;
        if t == Vec2::ZERO || chord.length() < MIN_PART_LENGTH {
            return None;
        }

        let normal = Vec2::new(-t.y, t.x);
        let projection = chord.dot(normal);
        if projection.abs() < 1e-4 * chord.length() {
            return None;
        }

        let signed_radius = chord.length_squared() / (2.0 * projection);
        let center = s + normal * signed_radius;
        let radius = signed_radius.abs();

        let start_angle = (s - center).to_angle();
        let end_angle = (e - center).to_angle();
        let forward = Vec2::new(-start_angle.sin(), start_angle.cos());

        let sweep = if forward.dot(t) > 0.0 {
            let mut sweep = (end_angle - start_angle).rem_euclid(TAU);
            if sweep == 0.0 {
                sweep = TAU;
            }
            sweep
        } else {
            let mut sweep = -(start_angle - end_angle).rem_euclid(TAU);
            if sweep == 0.0 {
                sweep = -TAU;
            }
            sweep
        };

        Some(Self {
            center,
            radius,
            start_angle,
            sweep,
            start_y: start.y,
            end_y: end.y,
        })
    }

    pub fn length(&self) -> f32 {
        self.radius * self.sweep.abs()
    }

    fn angle(&self, t: f32) -> f32 {
        self.start_angle + self.sweep * t
    }

    pub fn position(&self, t: f32) -> Vec3 {
        let angle = self.angle(t);
        let y = self.start_y + (self.end_y - self.start_y) * t;
        Vec3::new(
            self.center.x + self.radius * angle.cos(),
            y,
            self.center.y + self.radius * angle.sin(),
        )
    }

    pub fn tangent(&self, t: f32) -> Vec3 {
        let angle = self.angle(t);
        let sign = self.sweep.signum();
        Vec3::new(-angle.sin() * sign, 0.0, angle.cos() * sign)
    }

    /// Parameter eines Winkels auf diesem Bogen, falls er (mit Toleranz) im Bogen liegt.
    pub fn t_of_angle(&self, angle: f32, epsilon: f32) -> Option<f32> {
        if self.sweep == 0.0 {
            return None;
        }
        let diff = if self.sweep > 0.0 {
            (angle - self.start_angle).rem_euclid(TAU)
        } else {
            -(self.start_angle - angle).rem_euclid(TAU)
        };
        let t = diff / self.sweep;
        if t <= 1.0 + epsilon {
            return Some(t.clamp(0.0, 1.0));
        }
        // Kurz vor dem Startwinkel (Umlauf um 2π)
        let wrapped = (diff - TAU * self.sweep.signum()) / self.sweep;
        if wrapped >= -epsilon {
            Some(wrapped.clamp(0.0, 1.0))
        } else {
            None
        }
    }
}

/// Aneinandergereihte Teilkurven; t ist über die Gesamtlänge verteilt.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedTrajectory {
    parts: Vec<Trajectory>,
    /// Kumulierte Längen, `cumulative[i]` = Beginn von Teil `i`, letzter Eintrag = Gesamtlänge
    cumulative: Vec<f32>,
}

impl CombinedTrajectory {
    /// Baut eine kombinierte Kurve; verschachtelte Kombinationen werden flachgezogen,
    /// entartete Teilstücke verworfen.
    pub fn new(parts: Vec<Trajectory>) -> Self {
        let mut flat = Vec::with_capacity(parts.len());
        for part in parts {
            match part {
                Trajectory::Combined(combined) => flat.extend(combined.parts),
                other => {
                    if other.length() >= MIN_PART_LENGTH {
                        flat.push(other);
                    }
                }
            }
        }

        let mut cumulative = Vec::with_capacity(flat.len() + 1);
        let mut total = 0.0;
        cumulative.push(0.0);
        for part in &flat {
            total += part.length();
            cumulative.push(total);
        }

        Self {
            parts: flat,
            cumulative,
        }
    }

    pub fn parts(&self) -> &[Trajectory] {
        &self.parts
    }

    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Globaler Parameterbereich `[t0, t1]` von Teil `index`.
    pub fn part_range(&self, index: usize) -> (f32, f32) {
        let total = self.length();
        if total <= 0.0 {
            return (0.0, 1.0);
        }
        (
            self.cumulative[index] / total,
            self.cumulative[index + 1] / total,
        )
    }

    /// Liefert (Teil-Index, lokaler Parameter) für einen globalen Parameter.
    fn locate(&self, t: f32) -> (usize, f32) {
        let total = self.length();
        let distance = t.clamp(0.0, 1.0) * total;
        for index in 0..self.parts.len() {
            let begin = self.cumulative[index];
            let end = self.cumulative[index + 1];
            if distance <= end || index + 1 == self.parts.len() {
                let local = if end > begin {
                    (distance - begin) / (end - begin)
                } else {
                    0.0
                };
                return (index, local.clamp(0.0, 1.0));
            }
        }
        (0, 0.0)
    }

    pub fn position(&self, t: f32) -> Vec3 {
        if self.parts.is_empty() {
            return Vec3::ZERO;
        }
        let (index, local) = self.locate(t);
        self.parts[index].position(local)
    }

    pub fn tangent(&self, t: f32) -> Vec3 {
        if self.parts.is_empty() {
            return Vec3::ZERO;
        }
        let (index, local) = self.locate(t);
        self.parts[index].tangent(local)
    }

    fn cut(&self, from: f32, to: f32) -> Trajectory {
        let mut pieces = Vec::new();
        for (index, part) in self.parts.iter().enumerate() {
            let (begin, end) = self.part_range(index);
            let lo = from.max(begin);
            let hi = to.min(end);
            if hi - lo <= 0.0 || end - begin <= 0.0 {
                continue;
            }
            let local_from = (lo - begin) / (end - begin);
            let local_to = (hi - begin) / (end - begin);
            pieces.push(part.cut(local_from, local_to));
        }
        match pieces.len() {
            0 => Trajectory::Straight(StraightTrajectory::new(
                self.position(from),
                self.position(to),
            )),
            1 => pieces.remove(0),
            _ => Trajectory::Combined(CombinedTrajectory::new(pieces)),
        }
    }
}

/// Parametrische Kurve mit t ∈ [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub enum Trajectory {
    Straight(StraightTrajectory),
    Arc(ArcTrajectory),
    Combined(CombinedTrajectory),
}

impl Trajectory {
    pub fn straight(start: Vec3, end: Vec3) -> Self {
        Trajectory::Straight(StraightTrajectory::new(start, end))
    }

    /// Kurve zwischen zwei Punkten, die jeweils in Richtung `*_dir` verlassen werden.
    ///
    /// Treffen sich beide Strahlen vor ihren Punkten, entsteht eine Verrundung
    /// Gerade–Bogen–Gerade, sonst eine Gerade.
    pub fn connect(start: Vec3, start_dir: Vec3, end: Vec3, end_dir: Vec3) -> Self {
        let s = xz(start);
        let e = xz(end);
        let sd = xz(start_dir).normalize_or_zero();
        let ed = xz(end_dir).normalize_or_zero();

        let Some((u, v)) = ray_intersection(s, sd, e, ed) else {
            return Self::straight(start, end);
        };
        if u <= MIN_PART_LENGTH || v <= MIN_PART_LENGTH {
            return Self::straight(start, end);
        }

        let fillet = u.min(v);
        let first = s + sd * (u - fillet);
        let second = e + ed * (v - fillet);
        let first = Vec3::new(first.x, start.y, first.y);
        let second = Vec3::new(second.x, end.y, second.y);

        let middle = match ArcTrajectory::from_tangent(first, start_dir, second) {
            Some(arc) => Trajectory::Arc(arc),
            None => Self::straight(first, second),
        };

        let combined = CombinedTrajectory::new(vec![
            Self::straight(start, first),
            middle,
            Self::straight(second, end),
        ]);
        match combined.parts.len() {
            0 => Self::straight(start, end),
            1 => combined.parts.into_iter().next().unwrap_or_else(|| Self::straight(start, end)),
            _ => Trajectory::Combined(combined),
        }
    }

    pub fn length(&self) -> f32 {
        match self {
            Trajectory::Straight(s) => s.length(),
            Trajectory::Arc(a) => a.length(),
            Trajectory::Combined(c) => c.length(),
        }
    }

    pub fn position(&self, t: f32) -> Vec3 {
        match self {
            Trajectory::Straight(s) => s.position(t),
            Trajectory::Arc(a) => a.position(t),
            Trajectory::Combined(c) => c.position(t),
        }
    }

    /// Normierte Fahrtrichtung bei `t` (Y = 0).
    pub fn tangent(&self, t: f32) -> Vec3 {
        match self {
            Trajectory::Straight(s) => s.direction(),
            Trajectory::Arc(a) => a.tangent(t),
            Trajectory::Combined(c) => c.tangent(t),
        }
    }

    pub fn start_position(&self) -> Vec3 {
        self.position(0.0)
    }

    pub fn end_position(&self) -> Vec3 {
        self.position(1.0)
    }

    /// Parameter nach zurückgelegter Distanz ab dem Start.
    pub fn t_at_distance(&self, distance: f32) -> f32 {
        let length = self.length();
        if length <= 0.0 {
            return 0.0;
        }
        (distance / length).clamp(0.0, 1.0)
    }

    /// Teilkurve zwischen `from` und `to`; bei `from > to` invertiert.
    pub fn cut(&self, from: f32, to: f32) -> Trajectory {
        if from > to {
            return self.cut(to, from).invert();
        }
        let from = from.clamp(0.0, 1.0);
        let to = to.clamp(0.0, 1.0);
        match self {
            Trajectory::Straight(s) => Self::straight(s.position(from), s.position(to)),
            Trajectory::Arc(a) => Trajectory::Arc(ArcTrajectory {
                center: a.center,
                radius: a.radius,
                start_angle: a.start_angle + a.sweep * from,
                sweep: a.sweep * (to - from),
                start_y: a.start_y + (a.end_y - a.start_y) * from,
                end_y: a.start_y + (a.end_y - a.start_y) * to,
            }),
            Trajectory::Combined(c) => c.cut(from, to),
        }
    }

    pub fn invert(&self) -> Trajectory {
        match self {
            Trajectory::Straight(s) => Self::straight(s.end, s.start),
            Trajectory::Arc(a) => Trajectory::Arc(ArcTrajectory {
                center: a.center,
                radius: a.radius,
                start_angle: a.start_angle + a.sweep,
                sweep: -a.sweep,
                start_y: a.end_y,
                end_y: a.start_y,
            }),
            Trajectory::Combined(c) => Trajectory::Combined(CombinedTrajectory::new(
                c.parts.iter().rev().map(Trajectory::invert).collect(),
            )),
        }
    }

    /// Parallelverschiebung; positive Distanz = rechts der Fahrtrichtung.
    pub fn shift(&self, distance: f32) -> Trajectory {
        match self {
            Trajectory::Straight(s) => {
                let offset = right_normal(s.direction()) * distance;
                Self::straight(s.start + offset, s.end + offset)
            }
            Trajectory::Arc(a) => {
                // Rechts liegt bei positivem Sweep der Mittelpunkt
                let radius = if a.sweep > 0.0 {
                    a.radius - distance
                } else {
                    a.radius + distance
                };
                if radius <= MIN_PART_LENGTH {
                    let start = a.position(0.0) + right_normal(a.tangent(0.0)) * distance;
                    let end = a.position(1.0) + right_normal(a.tangent(1.0)) * distance;
                    Self::straight(start, end)
                } else {
                    Trajectory::Arc(ArcTrajectory { radius, ..*a })
                }
            }
            Trajectory::Combined(c) => Trajectory::Combined(CombinedTrajectory::new(
                c.parts.iter().map(|p| p.shift(distance)).collect(),
            )),
        }
    }

    /// Teilt die Kurve in Stücke, deren Richtungsänderung `max_angle` (Radiant)
    /// und deren Länge `max_length` nicht überschreitet. Liefert Parametergrenzen.
    pub fn subdivide(&self, max_angle: f32, max_length: f32) -> Vec<f32> {
        let length = self.length();
        let by_length = if max_length > 0.0 {
            (length / max_length).ceil() as usize
        } else {
            1
        };
        let turning = self.total_turning();
        let by_angle = if max_angle > 0.0 {
            (turning / max_angle).ceil() as usize
        } else {
            1
        };
        let count = by_length.max(by_angle).max(1);
        (0..=count).map(|i| i as f32 / count as f32).collect()
    }

    /// Summe der absoluten Richtungsänderungen in Radiant.
    pub fn total_turning(&self) -> f32 {
        match self {
            Trajectory::Straight(_) => 0.0,
            Trajectory::Arc(a) => a.sweep.abs(),
            Trajectory::Combined(c) => c.parts.iter().map(Trajectory::total_turning).sum(),
        }
    }
}
