//! Rückwärts-Indizes Punkt/Linie → Nutzer und die Abhängigkeits-Abfragen.

use super::{Dependences, EntityRef, Marking};
use crate::core::crosswalk::MarkingCrosswalk;
use crate::core::filler::MarkingFiller;
use crate::core::line::{MarkingLine, PointPair};
use crate::core::point::PointId;

impl Marking {
    /// Alle Entities, die strukturell an der Linie hängen.
    ///
    /// Enthält den eigenen Überweg einer Überweglinie, Überwege mit der Linie
    /// als Grenze, Füllungen entlang der Linie und Linien mit Schnitt-Rändern darauf.
    pub fn get_dependences(&self, line: u64) -> Dependences {
        self.line_users
            .get(&line)
            .map(|users| Dependences::from_refs(users))
            .unwrap_or_default()
    }

    /// Alle Entities, die den Punkt verwenden.
    pub fn get_point_dependences(&self, point: PointId) -> Dependences {
        self.point_users
            .get(&point)
            .map(|users| Dependences::from_refs(users))
            .unwrap_or_default()
    }

    fn add_point_user(&mut self, point: PointId, user: EntityRef) {
        self.point_users.entry(point).or_default().insert(user);
    }

    fn remove_point_user(&mut self, point: PointId, user: EntityRef) {
        if let Some(users) = self.point_users.get_mut(&point) {
            users.shift_remove(&user);
            if users.is_empty() {
                self.point_users.remove(&point);
            }
        }
    }

    fn add_line_user(&mut self, line: u64, user: EntityRef) {
        self.line_users.entry(line).or_default().insert(user);
    }

    fn remove_line_user(&mut self, line: u64, user: EntityRef) {
        if let Some(users) = self.line_users.get_mut(&line) {
            users.shift_remove(&user);
            if users.is_empty() {
                self.line_users.remove(&line);
            }
        }
    }

    pub(super) fn register_line(&mut self, line: &MarkingLine) {
        let user = EntityRef::Line(line.hash());
        for point in line.pair.points() {
            self.add_point_user(point, user);
        }
        for crossing in line.crossings() {
            self.add_line_user(crossing, user);
        }
    }

    pub(super) fn unregister_line(&mut self, line: &MarkingLine) {
        let user = EntityRef::Line(line.hash());
        for point in line.pair.points() {
            self.remove_point_user(point, user);
        }
        for crossing in line.crossings() {
            self.remove_line_user(crossing, user);
        }
    }

    pub(super) fn register_crosswalk(&mut self, crosswalk: &MarkingCrosswalk, pair: PointPair) {
        let user = EntityRef::Crosswalk(crosswalk.line);
        for point in pair.points() {
            self.add_point_user(point, user);
        }
        self.add_line_user(crosswalk.line, user);
        for border in crosswalk.borders() {
            self.add_line_user(border, user);
        }
    }

    pub(super) fn unregister_crosswalk(&mut self, crosswalk: &MarkingCrosswalk, pair: PointPair) {
        let user = EntityRef::Crosswalk(crosswalk.line);
        for point in pair.points() {
            self.remove_point_user(point, user);
        }
        self.remove_line_user(crosswalk.line, user);
        for border in crosswalk.borders() {
            self.remove_line_user(border, user);
        }
    }

    pub(super) fn register_filler(&mut self, filler: &MarkingFiller) {
        let user = EntityRef::Filler(filler.id);
        for &vertex in &filler.vertices {
            self.add_point_user(vertex, user);
        }
        for guide in filler.guide_lines() {
            self.add_line_user(guide, user);
        }
    }

    pub(super) fn unregister_filler(&mut self, filler: &MarkingFiller) {
        let user = EntityRef::Filler(filler.id);
        for &vertex in &filler.vertices {
            self.remove_point_user(vertex, user);
        }
        for guide in filler.guide_lines() {
            self.remove_line_user(guide, user);
        }
    }
}
