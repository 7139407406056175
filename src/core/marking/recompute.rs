//! Neuberechnung in fester Reihenfolge: Punkte, Trajektorien, Linien-Primitive,
//! Überwege, Füllungen.

use super::{EntityRef, Marking, RecomputeStats};
use crate::core::line::{rule_seed, LineRule, LineType, PointPair, RuleEdge};
use crate::core::point::PointId;
use crate::geometry::{Intersection, StraightTrajectory, Trajectory, T_EPSILON};
use crate::style::{
    CalculateContext, CrosswalkGeometry, FillerContour, Lod, MarkingPrimitive, PrimitiveGroup, Style,
    StyleTarget,
};
use glam::Vec3;
use indexmap::IndexSet;

impl Marking {
    /// Berechnet alle als geändert markierten Entities und ihre Abhängigen.
    pub(crate) fn recompute(&mut self) -> RecomputeStats {
        let dirty = std::mem::take(&mut self.dirty);
        let mut stats = RecomputeStats::default();
        if dirty.is_empty() {
            self.last_stats = stats;
            return stats;
        }

        let mut entities = dirty.entities;
        for &point in &dirty.points {
            if self.update_point(point) {
                stats.points += 1;
            }
            if let Some(users) = self.point_users.get(&point) {
                entities.extend(users.iter().copied());
            }
        }
        self.close_over_line_users(&mut entities);

        let lines: Vec<u64> = entities
            .iter()
            .filter_map(|entity| match entity {
                EntityRef::Line(hash) if self.lines.contains_key(hash) => Some(*hash),
                _ => None,
            })
            .collect();
        for &hash in &lines {
            let trajectory = self.line_trajectory(hash);
            if let Some(line) = self.lines.get_mut(&hash) {
                line.trajectory = trajectory;
            }
        }
        for &hash in &lines {
            self.update_line_primitives(hash);
        }

        for entity in &entities {
            match *entity {
                EntityRef::Crosswalk(hash) if self.crosswalks.contains_key(&hash) => {
                    self.update_crosswalk(hash);
                    stats.crosswalks += 1;
                }
                EntityRef::Filler(id) if self.fillers.contains_key(&id) => {
                    self.update_filler(id);
                    stats.fillers += 1;
                }
                _ => {}
            }
        }

        stats.lines = lines.len();
        log::debug!(
            "{} {}: {} Punkte, {} Linien, {} Ueberwege, {} Fuellungen neu berechnet",
            self.kind,
            self.id,
            stats.points,
            stats.lines,
            stats.crosswalks,
            stats.fillers
        );
        self.last_stats = stats;
        stats
    }

    /// Nimmt transitiv alle Nutzer geänderter Linien auf.
    fn close_over_line_users(&self, entities: &mut IndexSet<EntityRef>) {
        let mut index = 0;
        while index < entities.len() {
            if let Some(EntityRef::Line(hash)) = entities.get_index(index).copied() {
                if let Some(users) = self.line_users.get(&hash) {
                    entities.extend(users.iter().copied());
                }
            }
            index += 1;
        }
    }

    /// Position aus Einfahrt und Versatz; `false`, wenn der Punkt nicht existiert.
    fn update_point(&mut self, id: PointId) -> bool {
        let geometry = self
            .entrances
            .get(&id.entrance)
            .and_then(|entrance| entrance.geometry.as_ref());
        let Some(point) = self.points.get_mut(&id) else {
            return false;
        };
        match geometry.and_then(|g| {
            g.point_position(id.point_type, id.index, point.offset)
                .map(|(position, source)| (position, source, g.normal))
        }) {
            Some((position, source, normal)) => {
                point.position = Some(position);
                point.source = Some(source);
                point.direction = normal;
            }
            None => {
                point.position = None;
                point.source = None;
                point.direction = Vec3::ZERO;
            }
        }
        true
    }

    fn line_trajectory(&self, hash: u64) -> Option<Trajectory> {
        let line = self.lines.get(&hash)?;
        let start = self.points.get(&line.pair.first)?;
        let end = self.points.get(&line.pair.second)?;
        let (from, to) = (start.position?, end.position?);
        let trajectory = match line.line_type {
            LineType::Regular | LineType::Lane => {
                Trajectory::connect(from, start.direction, to, end.direction)
            }
            LineType::Stop | LineType::Crosswalk => Trajectory::straight(from, to),
            LineType::Normal => self.normal_trajectory(from, start.direction, line.pair.first.entrance),
        };
        Some(trajectory)
    }

    /// Strahl entlang der Normalen, am nächsten fremden Einfahrts-Querschnitt gekürzt.
    fn normal_trajectory(&self, start: Vec3, direction: Vec3, own_entrance: u32) -> Trajectory {
        let ray = Trajectory::straight(start, start + direction * self.options.normal_line_length);
        let end = self
            .entrances
            .values()
            .filter(|entrance| entrance.id != own_entrance)
            .filter_map(|entrance| entrance.geometry.as_ref()?.contour())
            .map(|contour| Intersection::calculate_single(&ray, &contour))
            .filter(|hit| hit.is_intersect && hit.first_t > T_EPSILON)
            .map(|hit| hit.first_t)
            .fold(1.0f32, f32::min);
        ray.cut(0.0, end)
    }

    /// Querschnitte der Einfahrten an beiden Linienenden.
    fn end_contours(&self, pair: PointPair) -> Vec<Trajectory> {
        let mut ids = vec![pair.first.entrance];
        if pair.second.entrance != pair.first.entrance {
            ids.push(pair.second.entrance);
        }
        ids.into_iter()
            .filter_map(|id| self.entrances.get(&id)?.geometry.as_ref()?.contour())
            .collect()
    }

    fn resolve_edge(&self, trajectory: &Trajectory, edge: RuleEdge) -> Option<f32> {
        if let Some(t) = edge.fixed_t() {
            return Some(t);
        }
        let crossing = self.lines.get(&edge.crossing()?)?.trajectory.as_ref()?;
        let hit = Intersection::calculate_single(trajectory, crossing);
        hit.is_intersect.then_some(hit.first_t)
    }

    fn resolve_rule(&self, trajectory: &Trajectory, rule: &LineRule) -> Option<(f32, f32)> {
        let from = self.resolve_edge(trajectory, rule.from)?;
        let to = self.resolve_edge(trajectory, rule.to)?;
        (to - from > T_EPSILON).then_some((from, to))
    }

    fn update_line_primitives(&mut self, hash: u64) {
        let Some(line) = self.lines.get(&hash) else {
            return;
        };
        let mut primitives = PrimitiveGroup::default();
        let mut resolved = None;

        if let Some(trajectory) = &line.trajectory {
            let contours = self.end_contours(line.pair);
            let mut ranges = Vec::with_capacity(line.rules.len());
            for (index, rule) in line.rules.iter().enumerate() {
                let range = self.resolve_rule(trajectory, rule);
                ranges.push(range);
                let Some((from, to)) = range else {
                    continue;
                };
                let part = trajectory.cut(from, to);
                let mut borders = contours.clone();
                borders.extend(
                    rule.crossings()
                        .filter_map(|crossing| self.lines.get(&crossing)?.trajectory.clone()),
                );
                let ctx = CalculateContext::from_options(&self.options, rule_seed(hash, index));
                calculate_into(&mut primitives, &rule.style, &ctx, |style, lod, ctx| {
                    style.calculate(
                        StyleTarget::Line {
                            trajectory: &part,
                            borders: &borders,
                        },
                        lod,
                        ctx,
                    )
                });
            }
            resolved = Some(ranges);
        }

        if let Some(line) = self.lines.get_mut(&hash) {
            line.primitives = primitives;
            // Ohne Trajektorie bleibt die letzte Auflösung für das Einfrieren erhalten
            if let Some(resolved) = resolved {
                line.resolved = resolved;
            }
        }
    }

    fn crosswalk_geometry(&self, hash: u64) -> Option<CrosswalkGeometry> {
        let crosswalk = self.crosswalks.get(&hash)?;
        let line = self.lines.get(&crosswalk.line)?;
        let first = self.points.get(&line.pair.first)?;
        let second = self.points.get(&line.pair.second)?;
        let enter = StraightTrajectory::new(first.position?, second.position?);
        let width = crosswalk
            .style
            .total_width()
            .unwrap_or(self.options.crosswalk_width);
        let border = |side: Option<u64>| {
            side.and_then(|hash| self.lines.get(&hash))
                .and_then(|line| line.trajectory.as_ref())
        };
        Some(CrosswalkGeometry::resolve(
            enter,
            first.direction,
            width,
            border(crosswalk.right_border),
            border(crosswalk.left_border),
        ))
    }

    fn update_crosswalk(&mut self, hash: u64) {
        let geometry = self.crosswalk_geometry(hash);
        let Some(crosswalk) = self.crosswalks.get(&hash) else {
            return;
        };
        let mut primitives = PrimitiveGroup::default();
        if let Some(geometry) = &geometry {
            let ctx = CalculateContext::from_options(&self.options, crosswalk.seed());
            calculate_into(&mut primitives, &crosswalk.style, &ctx, |style, lod, ctx| {
                style.calculate(StyleTarget::Crosswalk(geometry), lod, ctx)
            });
        }
        if let Some(crosswalk) = self.crosswalks.get_mut(&hash) {
            crosswalk.geometry = geometry;
            crosswalk.primitives = primitives;
        }
    }

    /// Kontur aus den Teilen; geführte Teile folgen ihrer Linie in Teilrichtung.
    fn filler_contour(&self, id: u32) -> Option<FillerContour> {
        let filler = self.fillers.get(&id)?;
        let mut parts = Vec::with_capacity(filler.vertices.len());
        for (from, to, guide) in filler.parts() {
            let start = self.points.get(&from)?.position?;
            let end = self.points.get(&to)?.position?;
            let guided = guide
                .and_then(|hash| self.lines.get(&hash))
                .and_then(|line| {
                    let trajectory = line.trajectory.as_ref()?;
                    Some(if line.pair.first == from {
                        trajectory.clone()
                    } else {
                        trajectory.invert()
                    })
                });
            parts.push(guided.unwrap_or_else(|| Trajectory::straight(start, end)));
        }
        Some(FillerContour::new(parts))
    }

    fn update_filler(&mut self, id: u32) {
        let contour = self.filler_contour(id);
        let Some(filler) = self.fillers.get(&id) else {
            return;
        };
        let mut primitives = PrimitiveGroup::default();
        if let Some(contour) = &contour {
            let ctx = CalculateContext::from_options(&self.options, filler.seed());
            calculate_into(&mut primitives, &filler.style, &ctx, |style, lod, ctx| {
                style.calculate(StyleTarget::Filler(contour), lod, ctx)
            });
        }
        if let Some(filler) = self.fillers.get_mut(&id) {
            filler.contour = contour;
            filler.primitives = primitives;
        }
    }
}

/// Füllt beide Detailstufen mit den Primitiven eines Stils.
fn calculate_into<F>(group: &mut PrimitiveGroup, style: &Style, ctx: &CalculateContext, calculate: F)
where
    F: Fn(&Style, Lod, &CalculateContext) -> Vec<MarkingPrimitive>,
{
    for lod in Lod::ALL {
        group.extend(lod, calculate(style, lod, ctx));
    }
}
