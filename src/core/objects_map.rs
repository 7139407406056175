//! Übersetzung von Quell-IDs auf Ziel-IDs beim Einfügen (Kopieren, Vorlagen, Undo).

use super::marking::MarkingKind;
use super::point::PointId;
use std::collections::HashMap;

/// Tabellen Quelle → Ziel je Objektart plus Spiegel-Flag.
///
/// Jede leere Tabelle wirkt als Identität; eine gefüllte Tabelle ohne Eintrag
/// bedeutet "nicht auflösbar".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectsMap {
    segments: HashMap<u32, u32>,
    nodes: HashMap<u32, u32>,
    lanes: HashMap<u32, u32>,
    points: HashMap<u64, u64>,
    /// Vertauscht links/rechts (Grenzen von Überwegen)
    pub invert: bool,
}

fn lookup(table: &HashMap<u32, u32>, id: u32) -> Option<u32> {
    if table.is_empty() {
        Some(id)
    } else {
        table.get(&id).copied()
    }
}

impl ObjectsMap {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn inverted() -> Self {
        Self {
            invert: true,
            ..Self::default()
        }
    }

    pub fn is_identity(&self) -> bool {
        self.segments.is_empty()
            && self.nodes.is_empty()
            && self.lanes.is_empty()
            && self.points.is_empty()
            && !self.invert
    }

    pub fn add_segment(&mut self, source: u32, target: u32) {
        self.segments.insert(source, target);
    }

    pub fn add_node(&mut self, source: u32, target: u32) {
        self.nodes.insert(source, target);
    }

    pub fn add_lane(&mut self, source: u32, target: u32) {
        self.lanes.insert(source, target);
    }

    /// Expliziter Punkt-Eintrag; hat Vorrang vor der Einfahrts-Übersetzung.
    pub fn add_point(&mut self, source: PointId, target: PointId) {
        self.points.insert(source.raw(), target.raw());
    }

    pub fn segment(&self, id: u32) -> Option<u32> {
        lookup(&self.segments, id)
    }

    pub fn node(&self, id: u32) -> Option<u32> {
        lookup(&self.nodes, id)
    }

    pub fn lane(&self, id: u32) -> Option<u32> {
        lookup(&self.lanes, id)
    }

    /// ID der Markierung selbst.
    pub fn marking(&self, kind: MarkingKind, id: u32) -> Option<u32> {
        match kind {
            MarkingKind::Node => self.node(id),
            MarkingKind::Segment => self.segment(id),
        }
    }

    /// Einfahrten eines Knotens sind Segmente, die eines Segments Knoten.
    pub fn entrance(&self, kind: MarkingKind, id: u32) -> Option<u32> {
        match kind {
            MarkingKind::Node => self.segment(id),
            MarkingKind::Segment => self.node(id),
        }
    }

    pub fn point(&self, kind: MarkingKind, point: PointId) -> Option<PointId> {
        if let Some(&target) = self.points.get(&point.raw()) {
            return PointId::from_raw(target);
        }
        let entrance = self.entrance(kind, point.entrance)?;
        Some(PointId { entrance, ..point })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::point::PointType;

    #[test]
    fn test_empty_map_is_identity() {
        let map = ObjectsMap::identity();
        let point = PointId::new(5, PointType::Lane, 2);
        assert!(map.is_identity());
        assert_eq!(map.point(MarkingKind::Node, point), Some(point));
        assert_eq!(map.lane(77), Some(77));
    }

    #[test]
    fn test_node_marking_maps_entrances_through_segments() {
        let mut map = ObjectsMap::identity();
        map.add_segment(1, 10);
        map.add_segment(2, 20);
        let mapped = map.point(MarkingKind::Node, PointId::entrance(2, 3));
        assert_eq!(mapped, Some(PointId::entrance(20, 3)));
        assert_eq!(map.point(MarkingKind::Node, PointId::entrance(4, 0)), None);
        // Knoten-Tabelle leer, Segment-Markierungen bleiben unberührt
        assert_eq!(map.point(MarkingKind::Segment, PointId::entrance(4, 0)), Some(PointId::entrance(4, 0)));
    }

    #[test]
    fn test_point_entry_wins() {
        let mut map = ObjectsMap::identity();
        map.add_segment(1, 10);
        map.add_point(PointId::entrance(1, 0), PointId::entrance(30, 2));
        assert_eq!(
            map.point(MarkingKind::Node, PointId::entrance(1, 0)),
            Some(PointId::entrance(30, 2))
        );
        assert_eq!(
            map.point(MarkingKind::Node, PointId::entrance(1, 1)),
            Some(PointId::entrance(10, 1))
        );
    }
}
