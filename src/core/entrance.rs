//! Einfahrten: Querschnitt einer Straße am Knoten, Anker aller Punkte.

use super::point::{Location, PointType, Source};
use crate::geometry::{right_normal, Trajectory};
use glam::Vec3;

/// Spuren, deren Kanten näher als dieser Abstand liegen, gelten als aneinanderliegend.
const TOUCHING_GAP: f32 = 0.01;

/// Eine Spur im Querschnitt
#[derive(Debug, Clone, PartialEq)]
pub struct LaneGeometry {
    /// Spur-ID des Hosts
    pub id: u32,
    /// Lage der Spurmitte entlang des Querschnitts
    pub center: f32,
    pub width: f32,
}

/// Geometrie einer Einfahrt, vom Host geliefert
#[derive(Debug, Clone, PartialEq)]
pub struct EntranceGeometry {
    /// Mitte des Querschnitts
    pub position: Vec3,
    /// Richtung in den Knoten hinein
    pub normal: Vec3,
    pub lanes: Vec<LaneGeometry>,
}

impl EntranceGeometry {
    pub fn new(position: Vec3, normal: Vec3, lanes: Vec<LaneGeometry>) -> Self {
        let mut lanes = lanes;
        lanes.sort_by(|a, b| a.center.total_cmp(&b.center));
        Self {
            position,
            normal: Vec3::new(normal.x, 0.0, normal.z).normalize_or_zero(),
            lanes,
        }
    }

    /// Einfahrt mit `count` gleich breiten, aneinanderliegenden Spuren um die Mitte.
    pub fn uniform(position: Vec3, normal: Vec3, count: u32, lane_width: f32) -> Self {
        let total = lane_width * count as f32;
        let lanes = (0..count)
            .map(|i| LaneGeometry {
                id: i,
                center: -total * 0.5 + lane_width * (i as f32 + 0.5),
                width: lane_width,
            })
            .collect();
        Self::new(position, normal, lanes)
    }

    /// Querachse, entlang der Punkte und Versätze liegen.
    pub fn cross_direction(&self) -> Vec3 {
        right_normal(self.normal)
    }

    /// Kantenpunkte (Entrance/Normal/Crosswalk) als Lage entlang der Querachse.
    ///
    /// Aneinanderliegende Spuren teilen einen Punkt; ein Mittelstreifen
    /// erzeugt zwei Kantenpunkte.
    pub fn edge_points(&self) -> Vec<(f32, Source)> {
        let Some(first) = self.lanes.first() else {
            return Vec::new();
        };
        let mut points = vec![(
            first.center - first.width * 0.5,
            Source {
                left: None,
                right: Some(0),
                location: Location::Edge,
            },
        )];

        for (index, pair) in self.lanes.windows(2).enumerate() {
            let left = index as u8;
            let right = left + 1;
            let left_edge = pair[0].center + pair[0].width * 0.5;
            let right_edge = pair[1].center - pair[1].width * 0.5;
            if right_edge - left_edge <= TOUCHING_GAP {
                points.push((
                    (left_edge + right_edge) * 0.5,
                    Source {
                        left: Some(left),
                        right: Some(right),
                        location: Location::Between,
                    },
                ));
            } else {
                points.push((
                    left_edge,
                    Source {
                        left: Some(left),
                        right: None,
                        location: Location::Edge,
                    },
                ));
                points.push((
                    right_edge,
                    Source {
                        left: None,
                        right: Some(right),
                        location: Location::Edge,
                    },
                ));
            }
        }

        let last_index = (self.lanes.len() - 1) as u8;
        let last = &self.lanes[self.lanes.len() - 1];
        points.push((
            last.center + last.width * 0.5,
            Source {
                left: Some(last_index),
                right: None,
                location: Location::Edge,
            },
        ));
        points
    }

    fn lane_points(&self) -> Vec<(f32, Source)> {
        self.lanes
            .iter()
            .enumerate()
            .map(|(index, lane)| {
                (
                    lane.center,
                    Source {
                        left: Some(index as u8),
                        right: Some(index as u8),
                        location: Location::Centre,
                    },
                )
            })
            .collect()
    }

    fn anchors(&self, point_type: PointType) -> Vec<(f32, Source)> {
        match point_type {
            PointType::Lane => self.lane_points(),
            _ => self.edge_points(),
        }
    }

    pub fn point_count(&self, point_type: PointType) -> usize {
        match point_type {
            PointType::Lane => self.lanes.len(),
            _ => self.edge_points().len(),
        }
    }

    /// Position eines Punkts inklusive Versatz.
    pub fn point_position(&self, point_type: PointType, index: u8, offset: f32) -> Option<(Vec3, Source)> {
        let (along, source) = self.anchors(point_type).get(usize::from(index)).copied()?;
        Some((self.position + self.cross_direction() * (along + offset), source))
    }

    /// Querschnittslinie über alle Punkte, an beiden Seiten verlängert.
    pub fn contour(&self) -> Option<Trajectory> {
        let points = self.edge_points();
        let first = points.first()?.0;
        let last = points.last()?.0;
        let cross = self.cross_direction();
        Some(Trajectory::straight(
            self.position + cross * (first - 1.0),
            self.position + cross * (last + 1.0),
        ))
    }
}

/// Liefert Einfahrts-Geometrie für eine Host-ID.
pub trait EntranceProvider {
    fn entrance_geometry(&self, entrance: u32) -> Option<EntranceGeometry>;
}

impl EntranceProvider for std::collections::HashMap<u32, EntranceGeometry> {
    fn entrance_geometry(&self, entrance: u32) -> Option<EntranceGeometry> {
        self.get(&entrance).cloned()
    }
}

/// Einfahrt einer Markierung; Geometrie fehlt, bis der Host sie liefert.
#[derive(Debug, Clone, PartialEq)]
pub struct Entrance {
    pub id: u32,
    pub geometry: Option<EntranceGeometry>,
}
