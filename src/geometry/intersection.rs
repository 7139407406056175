//! Schnittberechnung zwischen Trajektorien.

use super::trajectory::{xz, ArcTrajectory, StraightTrajectory, Trajectory};
use glam::{Vec2, Vec3};

/// Toleranz für Parameter außerhalb von [0, 1].
pub const T_EPSILON: f32 = 1e-4;

/// Versatz, wenn zwei Tangenten parallel sind (`tan == 0`): gilt als "nicht kürzen".
pub const PARALLEL_OFFSET_SENTINEL: f32 = 1000.0;

/// Ergebnis eines Schnitts zweier Kurven
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Parameter auf der ersten Kurve
    pub first_t: f32,
    /// Parameter auf der zweiten Kurve
    pub second_t: f32,
    /// Schnittpunkt (auf der ersten Kurve ausgewertet)
    pub position: Vec3,
    /// `false`, wenn kein Schnitt im gültigen Bereich existiert
    pub is_intersect: bool,
}

impl Intersection {
    pub const NOT_INTERSECT: Intersection = Intersection {
        first_t: -1.0,
        second_t: -1.0,
        position: Vec3::ZERO,
        is_intersect: false,
    };

    fn new(first_t: f32, second_t: f32, position: Vec3) -> Self {
        Self {
            first_t,
            second_t,
            position,
            is_intersect: true,
        }
    }

    /// Vertauscht erste und zweite Kurve.
    pub fn swapped(self) -> Self {
        Self {
            first_t: self.second_t,
            second_t: self.first_t,
            ..self
        }
    }

    /// Alle Schnitte, sortiert nach `first_t`.
    pub fn calculate(first: &Trajectory, second: &Trajectory) -> Vec<Intersection> {
        let mut result = match (first, second) {
            (Trajectory::Combined(combined), _) => {
                let mut all = Vec::new();
                for (index, part) in combined.parts().iter().enumerate() {
                    let (begin, end) = combined.part_range(index);
                    for hit in Self::calculate(part, second) {
                        all.push(Intersection {
                            first_t: begin + hit.first_t * (end - begin),
                            ..hit
                        });
                    }
                }
                all
            }
            (_, Trajectory::Combined(_)) => Self::calculate(second, first)
                .into_iter()
                .map(Intersection::swapped)
                .collect(),
            (Trajectory::Straight(a), Trajectory::Straight(b)) => {
                straight_straight(a, b).into_iter().collect()
            }
            (Trajectory::Straight(a), Trajectory::Arc(b)) => straight_arc(a, b),
            (Trajectory::Arc(a), Trajectory::Straight(b)) => straight_arc(b, a)
                .into_iter()
                .map(Intersection::swapped)
                .collect(),
            (Trajectory::Arc(a), Trajectory::Arc(b)) => arc_arc(a, b),
        };

        for hit in &mut result {
            hit.position = first.position(hit.first_t);
        }
        result.sort_by(|a, b| a.first_t.total_cmp(&b.first_t));
        // Schnitte an Teilstück-Grenzen doppelt gefunden
        result.dedup_by(|a, b| {
            (a.first_t - b.first_t).abs() < T_EPSILON && (a.second_t - b.second_t).abs() < T_EPSILON
        });
        result
    }

    /// Erster Schnitt oder [`Intersection::NOT_INTERSECT`].
    pub fn calculate_single(first: &Trajectory, second: &Trajectory) -> Intersection {
        Self::calculate(first, second)
            .into_iter()
            .next()
            .unwrap_or(Self::NOT_INTERSECT)
    }
}

fn in_range(t: f32) -> bool {
    (-T_EPSILON..=1.0 + T_EPSILON).contains(&t)
}

fn straight_straight(a: &StraightTrajectory, b: &StraightTrajectory) -> Option<Intersection> {
    let p = xz(a.start);
    let d = xz(a.end) - p;
    let q = xz(b.start);
    let e = xz(b.end) - q;
    if d.length() < 1e-6 || e.length() < 1e-6 {
        return None;
    }
    let (u, v) = super::trajectory::ray_intersection(p, d, q, e)?;
    if in_range(u) && in_range(v) {
        Some(Intersection::new(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0), Vec3::ZERO))
    } else {
        None
    }
}

fn straight_arc(line: &StraightTrajectory, arc: &ArcTrajectory) -> Vec<Intersection> {
    let start = xz(line.start);
    let d = xz(line.end) - start;
    let f = start - arc.center;

    let a = d.dot(d);
    if a < 1e-12 {
        return Vec::new();
    }
    let b = 2.0 * f.dot(d);
    let c = f.dot(f) - arc.radius * arc.radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Vec::new();
    }

    let root = discriminant.sqrt();
    let mut roots = vec![(-b - root) / (2.0 * a)];
    if root > 1e-6 {
        roots.push((-b + root) / (2.0 * a));
    }

    roots
        .into_iter()
        .filter(|u| in_range(*u))
        .filter_map(|u| {
            let point = start + d * u;
            let angle = (point - arc.center).to_angle();
            let arc_t = arc.t_of_angle(angle, T_EPSILON)?;
            Some(Intersection::new(u.clamp(0.0, 1.0), arc_t, Vec3::ZERO))
        })
        .collect()
}

fn arc_arc(first: &ArcTrajectory, second: &ArcTrajectory) -> Vec<Intersection> {
    let delta = second.center - first.center;
    let distance = delta.length();
    if distance < 1e-6 {
        return Vec::new();
    }
    if distance > first.radius + second.radius + 1e-5
        || distance < (first.radius - second.radius).abs() - 1e-5
    {
        return Vec::new();
    }

    let along = (first.radius * first.radius - second.radius * second.radius
        + distance * distance)
        / (2.0 * distance);
    let height = (first.radius * first.radius - along * along).max(0.0).sqrt();
    let axis = delta / distance;
    let base = first.center + axis * along;
    let perp = Vec2::new(-axis.y, axis.x);

    let mut candidates = vec![base + perp * height];
    if height > 1e-6 {
        candidates.push(base - perp * height);
    }

    candidates
        .into_iter()
        .filter_map(|point| {
            let t1 = first.t_of_angle((point - first.center).to_angle(), T_EPSILON)?;
            let t2 = second.t_of_angle((point - second.center).to_angle(), T_EPSILON)?;
            Some(Intersection::new(t1, t2, Vec3::ZERO))
        })
        .collect()
}

/// Versatz, um den eine Kante der halben Breite `half_width` an einer schräg
/// kreuzenden Grenze zurückgenommen werden muss.
///
/// Aus `tan` des Winkels zwischen beiden Richtungen abgeleitet; bei `tan == 0`
/// (parallel) wird [`PARALLEL_OFFSET_SENTINEL`] geliefert.
pub fn butt_offset(half_width: f32, direction: Vec3, border_direction: Vec3) -> f32 {
    let a = xz(direction);
    let b = xz(border_direction);
    let sin = a.perp_dot(b);
    let cos = a.dot(b);
    if sin == 0.0 || a == Vec2::ZERO || b == Vec2::ZERO {
        return PARALLEL_OFFSET_SENTINEL;
    }
    let tan = sin / cos;
    (half_width / tan).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::CombinedTrajectory;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_cross_plugs_back() {
        let a = Trajectory::straight(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 4.0));
        let b = Trajectory::straight(Vec3::new(2.0, 0.0, 6.0), Vec3::new(6.0, 0.0, -3.0));

        let hits = Intersection::calculate(&a, &b);
        assert_eq!(hits.len(), 1);
        let hit = hits[0];
        assert!(hit.is_intersect);
        let pa = a.position(hit.first_t);
        let pb = b.position(hit.second_t);
        assert_relative_eq!(pa.x, pb.x, epsilon = 1e-4);
        assert_relative_eq!(pa.z, pb.z, epsilon = 1e-4);
    }

    #[test]
    fn test_parallel_straights_do_not_intersect() {
        let a = Trajectory::straight(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        let b = Trajectory::straight(Vec3::new(0.0, 0.0, 1.0), Vec3::new(10.0, 0.0, 1.0));
        assert!(Intersection::calculate(&a, &b).is_empty());
        assert!(!Intersection::calculate_single(&a, &b).is_intersect);
    }

    #[test]
    fn test_segments_outside_range_do_not_intersect() {
        let a = Trajectory::straight(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0));
        let b = Trajectory::straight(Vec3::new(5.0, 0.0, -1.0), Vec3::new(5.0, 0.0, 1.0));
        assert!(Intersection::calculate(&a, &b).is_empty());
    }

    #[test]
    fn test_straight_through_arc() {
        let arc = ArcTrajectory::from_tangent(Vec3::ZERO, Vec3::X, Vec3::new(5.0, 0.0, 5.0))
            .expect("Bogen erwartet");
        let arc = Trajectory::Arc(arc);
        let line = Trajectory::straight(Vec3::new(0.0, 0.0, 5.0), Vec3::new(10.0, 0.0, -5.0));

        let hits = Intersection::calculate(&line, &arc);
        assert_eq!(hits.len(), 1);
        let on_line = line.position(hits[0].first_t);
        let on_arc = arc.position(hits[0].second_t);
        assert_relative_eq!(on_line.x, on_arc.x, epsilon = 1e-3);
        assert_relative_eq!(on_line.z, on_arc.z, epsilon = 1e-3);
    }

    #[test]
    fn test_arc_arc_two_hits_sorted() {
        let first = Trajectory::Arc(ArcTrajectory {
            center: Vec2::ZERO,
            radius: 5.0,
            start_angle: 0.0,
            sweep: std::f32::consts::TAU - 0.01,
            start_y: 0.0,
            end_y: 0.0,
        });
        let second = Trajectory::Arc(ArcTrajectory {
            center: Vec2::new(6.0, 0.0),
            radius: 5.0,
            start_angle: 0.0,
            sweep: std::f32::consts::TAU - 0.01,
            start_y: 0.0,
            end_y: 0.0,
        });
        let hits = Intersection::calculate(&first, &second);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].first_t <= hits[1].first_t);
    }

    #[test]
    fn test_combined_hits_ordered_by_first_t() {
        let zigzag = Trajectory::Combined(CombinedTrajectory::new(vec![
            Trajectory::straight(Vec3::new(0.0, 0.0, -2.0), Vec3::new(2.0, 0.0, 2.0)),
            Trajectory::straight(Vec3::new(2.0, 0.0, 2.0), Vec3::new(4.0, 0.0, -2.0)),
        ]));
        let axis = Trajectory::straight(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0));

        let hits = Intersection::calculate(&zigzag, &axis);
        assert_eq!(hits.len(), 2);
        assert!(hits[0].first_t < 0.5 && hits[1].first_t > 0.5);
        assert_relative_eq!(hits[0].position.x, 1.0, epsilon = 1e-4);
        assert_relative_eq!(hits[1].position.x, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn test_butt_offset_uses_sentinel_when_parallel() {
        assert_eq!(butt_offset(0.5, Vec3::X, Vec3::X), PARALLEL_OFFSET_SENTINEL);
        assert_eq!(butt_offset(0.5, Vec3::X, -Vec3::X), PARALLEL_OFFSET_SENTINEL);
        assert_relative_eq!(butt_offset(0.5, Vec3::X, Vec3::Z), 0.0);
        // 45° → tan = 1
        let diagonal = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert_relative_eq!(butt_offset(0.5, Vec3::X, diagonal), 0.5, epsilon = 1e-5);
    }
}
