//! Markierung eines Knotens oder Segments: Entity-Graph aus Punkten, Linien,
//! Überwegen und Füllungen mit gerichteter Neuberechnung.

mod dependences;
mod recompute;
#[cfg(test)]
mod tests;

use super::crosswalk::{BorderSide, MarkingCrosswalk};
use super::entrance::{Entrance, EntranceGeometry, EntranceProvider};
use super::error::MarkingError;
use super::filler::MarkingFiller;
use super::line::{validate_rules, LineRule, LineType, MarkingLine, PointPair};
use super::point::{MarkingPoint, PointId, PointType};
use crate::shared::EngineOptions;
use crate::style::{Lod, MarkingPrimitive, Style, StyleGroup};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Besitzer einer Markierung im Straßennetz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkingKind {
    Node,
    Segment,
}

impl MarkingKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MarkingKind::Node => "Node",
            MarkingKind::Segment => "Segment",
        }
    }
}

impl fmt::Display for MarkingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkingKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Node" => Ok(MarkingKind::Node),
            "Segment" => Ok(MarkingKind::Segment),
            other => anyhow::bail!("Unbekannte Markierungsart '{}'", other),
        }
    }
}

/// Verweis auf ein Entity der Markierung
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Line(u64),
    Crosswalk(u64),
    Filler(u32),
}

/// Entities, die strukturell von einer Linie oder einem Punkt abhängen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependences {
    pub lines: Vec<u64>,
    pub crosswalks: Vec<u64>,
    pub fillers: Vec<u32>,
}

impl Dependences {
    fn from_refs<'a>(refs: impl IntoIterator<Item = &'a EntityRef>) -> Self {
        let mut result = Self::default();
        for entity in refs {
            match *entity {
                EntityRef::Line(hash) => result.lines.push(hash),
                EntityRef::Crosswalk(hash) => result.crosswalks.push(hash),
                EntityRef::Filler(id) => result.fillers.push(id),
            }
        }
        result
    }

    pub fn total(&self) -> usize {
        self.lines.len() + self.crosswalks.len() + self.fillers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Anzahl der Entities, die ein Neuberechnungs-Durchlauf angefasst hat
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecomputeStats {
    pub points: usize,
    pub lines: usize,
    pub crosswalks: usize,
    pub fillers: usize,
}

impl RecomputeStats {
    pub fn total(&self) -> usize {
        self.points + self.lines + self.crosswalks + self.fillers
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// Empfänger zwischengespeicherter Primitive (Mesh-Aufbau des Hosts).
pub trait PrimitiveSink {
    fn commit(&mut self, owner: EntityRef, lod: Lod, primitives: &[MarkingPrimitive]);
}

impl PrimitiveSink for Vec<MarkingPrimitive> {
    fn commit(&mut self, _owner: EntityRef, _lod: Lod, primitives: &[MarkingPrimitive]) {
        self.extend_from_slice(primitives);
    }
}

/// Ausstehende Neuberechnung
#[derive(Debug, Clone, Default)]
struct Dirty {
    points: IndexSet<PointId>,
    entities: IndexSet<EntityRef>,
}

impl Dirty {
    fn is_empty(&self) -> bool {
        self.points.is_empty() && self.entities.is_empty()
    }
}

/// Alle Markierungs-Entities eines Knotens oder Segments
#[derive(Debug, Clone)]
pub struct Marking {
    kind: MarkingKind,
    id: u32,
    options: EngineOptions,
    entrances: IndexMap<u32, Entrance>,
    points: IndexMap<PointId, MarkingPoint>,
    lines: IndexMap<u64, MarkingLine>,
    crosswalks: IndexMap<u64, MarkingCrosswalk>,
    fillers: IndexMap<u32, MarkingFiller>,
    next_filler_id: u32,
    /// Rückwärts-Index: Punkt → Linien, Überwege, Füllungen
    point_users: HashMap<PointId, IndexSet<EntityRef>>,
    /// Rückwärts-Index: Linie → eigener Überweg, Grenz-Nutzer, Führungs-Nutzer, Schnitt-Regeln
    line_users: HashMap<u64, IndexSet<EntityRef>>,
    dirty: Dirty,
    last_stats: RecomputeStats,
}

impl Marking {
    pub fn new(kind: MarkingKind, id: u32) -> Self {
        Self::with_options(kind, id, EngineOptions::default())
    }

    pub fn with_options(kind: MarkingKind, id: u32, options: EngineOptions) -> Self {
        Self {
            kind,
            id,
            options,
            entrances: IndexMap::new(),
            points: IndexMap::new(),
            lines: IndexMap::new(),
            crosswalks: IndexMap::new(),
            fillers: IndexMap::new(),
            next_filler_id: 1,
            point_users: HashMap::new(),
            line_users: HashMap::new(),
            dirty: Dirty::default(),
            last_stats: RecomputeStats::default(),
        }
    }

    pub fn kind(&self) -> MarkingKind {
        self.kind
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ── Abfragen ───────────────────────────────────────────────────

    pub fn entrance(&self, id: u32) -> Option<&Entrance> {
        self.entrances.get(&id)
    }

    pub fn entrances(&self) -> impl Iterator<Item = &Entrance> {
        self.entrances.values()
    }

    pub fn point(&self, id: PointId) -> Option<&MarkingPoint> {
        self.points.get(&id)
    }

    pub fn points(&self) -> impl Iterator<Item = &MarkingPoint> {
        self.points.values()
    }

    pub fn line(&self, hash: u64) -> Option<&MarkingLine> {
        self.lines.get(&hash)
    }

    /// Linie zwischen zwei Punkten (Reihenfolge egal).
    pub fn line_between(&self, a: PointId, b: PointId) -> Option<&MarkingLine> {
        self.lines.get(&PointPair::new(a, b).hash())
    }

    pub fn lines(&self) -> impl Iterator<Item = &MarkingLine> {
        self.lines.values()
    }

    pub fn crosswalk(&self, hash: u64) -> Option<&MarkingCrosswalk> {
        self.crosswalks.get(&hash)
    }

    pub fn crosswalks(&self) -> impl Iterator<Item = &MarkingCrosswalk> {
        self.crosswalks.values()
    }

    pub fn filler(&self, id: u32) -> Option<&MarkingFiller> {
        self.fillers.get(&id)
    }

    pub fn fillers(&self) -> impl Iterator<Item = &MarkingFiller> {
        self.fillers.values()
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn crosswalk_count(&self) -> usize {
        self.crosswalks.len()
    }

    pub fn filler_count(&self) -> usize {
        self.fillers.len()
    }

    /// Keine Linien, Überwege oder Füllungen.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.crosswalks.is_empty() && self.fillers.is_empty()
    }

    pub fn last_stats(&self) -> RecomputeStats {
        self.last_stats
    }

    // ── Einfahrten ─────────────────────────────────────────────────

    /// Setzt die Host-Geometrie einer Einfahrt und berechnet Abhängiges neu.
    pub fn update_entrance(&mut self, id: u32, geometry: EntranceGeometry) -> RecomputeStats {
        self.apply_entrance(id, Some(geometry));
        self.recompute()
    }

    /// Fragt alle bekannten Einfahrten beim Host ab; ein Durchlauf für alle Änderungen.
    pub fn refresh_entrances(&mut self, provider: &dyn EntranceProvider) -> RecomputeStats {
        let ids: Vec<u32> = self.entrances.keys().copied().collect();
        for id in ids {
            self.apply_entrance(id, provider.entrance_geometry(id));
        }
        self.recompute()
    }

    fn apply_entrance(&mut self, id: u32, geometry: Option<EntranceGeometry>) {
        let entrance = self.ensure_entrance(id);
        if entrance.geometry == geometry {
            return;
        }
        entrance.geometry = geometry;
        log::debug!("Einfahrt {} von {} {} geaendert", id, self.kind, self.id);

        let points: Vec<PointId> = self.points.keys().filter(|p| p.entrance == id).copied().collect();
        self.dirty.points.extend(points);
        // Normalen-Linien enden an fremden Einfahrten
        let normals: Vec<EntityRef> = self
            .lines
            .values()
            .filter(|line| line.line_type == LineType::Normal)
            .map(|line| EntityRef::Line(line.hash()))
            .collect();
        self.dirty.entities.extend(normals);
    }

    /// Platzhalter ohne Geometrie, falls die Einfahrt noch unbekannt ist.
    pub(crate) fn ensure_entrance(&mut self, id: u32) -> &mut Entrance {
        self.entrances.entry(id).or_insert_with(|| Entrance { id, geometry: None })
    }

    // ── Punkte ─────────────────────────────────────────────────────

    /// Versatz eines Punkts setzen; der Punkt entsteht bei Bedarf.
    pub fn set_point_offset(&mut self, point: PointId, offset: f32) -> Result<RecomputeStats, MarkingError> {
        self.check_point(point, point.point_type, true)?;
        self.write_point_offset(point, offset);
        Ok(self.recompute())
    }

    pub(crate) fn write_point_offset(&mut self, point: PointId, offset: f32) {
        let default = self.options.default_point_offset;
        let entry = self.points.entry(point).or_insert_with(|| MarkingPoint::new(point, default));
        if entry.offset != offset || entry.position.is_none() {
            entry.offset = offset;
            self.dirty.points.insert(point);
        }
    }

    /// Alle Versätze auf den Standardwert; ein zweiter Aufruf ändert nichts.
    pub fn reset_point_offsets(&mut self) -> RecomputeStats {
        let default = self.options.default_point_offset;
        for point in self.points.values_mut() {
            if point.offset != default {
                point.offset = default;
                self.dirty.points.insert(point.id);
            }
        }
        self.recompute()
    }

    fn ensure_point(&mut self, id: PointId) {
        if !self.points.contains_key(&id) {
            self.points
                .insert(id, MarkingPoint::new(id, self.options.default_point_offset));
            self.dirty.points.insert(id);
        }
    }

    /// Typ, Einfahrt und Index prüfen.
    ///
    /// Ohne `require_geometry` gilt eine Einfahrt ohne Geometrie als gültig (Laden).
    pub(crate) fn check_point(
        &self,
        point: PointId,
        expected: PointType,
        require_geometry: bool,
    ) -> Result<(), MarkingError> {
        if point.point_type != expected {
            return Err(MarkingError::InvalidPointType { point, expected });
        }
        let geometry = self
            .entrances
            .get(&point.entrance)
            .and_then(|entrance| entrance.geometry.as_ref());
        let Some(geometry) = geometry else {
            if require_geometry || !self.entrances.contains_key(&point.entrance) {
                return Err(MarkingError::EntranceNotFound(point.entrance));
            }
            return Ok(());
        };
        let count = geometry.point_count(point.point_type);
        if usize::from(point.index) >= count {
            return Err(MarkingError::PointOutOfRange { point, count });
        }
        Ok(())
    }

    pub(crate) fn check_pair(
        &self,
        pair: PointPair,
        line_type: LineType,
        require_geometry: bool,
    ) -> Result<(), MarkingError> {
        if pair.first == pair.second {
            return Err(MarkingError::DegenerateLine(pair.first));
        }
        let (first_type, second_type) = line_type.point_types();
        self.check_point(pair.first, first_type, require_geometry)?;
        self.check_point(pair.second, second_type, require_geometry)?;
        if line_type.requires_same_entrance() && !pair.is_same_entrance() {
            return Err(MarkingError::NotSameEntrance {
                first: pair.first,
                second: pair.second,
            });
        }
        Ok(())
    }

    pub(crate) fn check_style(style: &Style, group: StyleGroup) -> Result<(), MarkingError> {
        let kind = style.kind();
        if group.allows(kind) {
            Ok(())
        } else {
            Err(MarkingError::InvalidStyle { kind, group })
        }
    }

    // ── Linien ─────────────────────────────────────────────────────

    pub fn add_regular_line(&mut self, a: PointId, b: PointId, style: Style) -> Result<u64, MarkingError> {
        self.add_line(PointPair::new(a, b), LineType::Regular, style)
    }

    pub fn add_lane_line(&mut self, a: PointId, b: PointId, style: Style) -> Result<u64, MarkingError> {
        self.add_line(PointPair::new(a, b), LineType::Lane, style)
    }

    pub fn add_stop_line(&mut self, a: PointId, b: PointId, style: Style) -> Result<u64, MarkingError> {
        self.add_line(PointPair::new(a, b), LineType::Stop, style)
    }

    /// Linie vom Einfahrtspunkt entlang der Einfahrtsnormalen.
    pub fn add_normal_line(&mut self, point: PointId, style: Style) -> Result<u64, MarkingError> {
        let pair = PointPair::new(point, point.with_type(PointType::Normal));
        if point.point_type != PointType::Entrance {
            return Err(MarkingError::InvalidPointType {
                point,
                expected: PointType::Entrance,
            });
        }
        self.add_line(pair, LineType::Normal, style)
    }

    fn add_line(&mut self, pair: PointPair, line_type: LineType, style: Style) -> Result<u64, MarkingError> {
        self.check_pair(pair, line_type, true)?;
        let hash = self.insert_line(pair, line_type, vec![LineRule::whole(style)])?;
        self.recompute();
        Ok(hash)
    }

    /// Fügt eine Linie ohne Neuberechnung ein.
    ///
    /// Schnitt-Ränder werden nicht auf Existenz geprüft; das übernimmt der Aufrufer.
    pub(crate) fn insert_line(
        &mut self,
        pair: PointPair,
        line_type: LineType,
        rules: Vec<LineRule>,
    ) -> Result<u64, MarkingError> {
        let hash = pair.hash();
        if self.lines.contains_key(&hash) {
            return Err(MarkingError::LineExists(hash));
        }
        validate_rules(line_type, &rules)?;
        if rules.iter().flat_map(LineRule::crossings).any(|crossing| crossing == hash) {
            return Err(MarkingError::SelfCrossing(hash));
        }

        for point in pair.points() {
            self.ensure_point(point);
        }
        let line = MarkingLine::new(pair, line_type, rules);
        self.register_line(&line);
        self.lines.insert(hash, line);
        self.dirty.entities.insert(EntityRef::Line(hash));
        log::debug!("Linie {:?} {} angelegt ({:#018x})", line_type, pair, hash);
        Ok(hash)
    }

    /// Linien mit Schnitt-Rändern auf nicht vorhandenen Linien.
    pub(crate) fn lines_with_dangling_crossings(&self) -> Vec<u64> {
        self.lines
            .iter()
            .filter(|(_, line)| {
                line.crossings()
                    .iter()
                    .any(|crossing| !self.lines.contains_key(crossing))
            })
            .map(|(hash, _)| *hash)
            .collect()
    }

    /// Verwirft eine Linie beim Laden.
    ///
    /// Überweg-Grenzen auf `hash` fallen auf die Projektion zurück. Linien mit
    /// Schnitt-Rändern auf `hash` bleiben stehen; sie verwirft der Aufrufer.
    pub(crate) fn discard_line(&mut self, hash: u64) {
        let Some(line) = self.lines.shift_remove(&hash) else {
            return;
        };
        self.unregister_line(&line);
        self.dirty.entities.shift_remove(&EntityRef::Line(hash));
        for user in self.line_users.remove(&hash).unwrap_or_default() {
            let EntityRef::Crosswalk(other) = user else {
                continue;
            };
            if self.crosswalks.get_mut(&other).is_some_and(|c| c.drop_border(hash)) {
                log::warn!(
                    "Ueberweg {:#018x}: Grenze {:#018x} verworfen, Standardgrenze",
                    other,
                    hash
                );
                self.dirty.entities.insert(user);
            }
        }
    }

    fn check_crossings(&self, hash: u64, rules: &[LineRule]) -> Result<(), MarkingError> {
        for crossing in rules.iter().flat_map(LineRule::crossings) {
            if crossing == hash {
                return Err(MarkingError::SelfCrossing(hash));
            }
            if !self.lines.contains_key(&crossing) {
                return Err(MarkingError::LineNotFound(crossing));
            }
        }
        Ok(())
    }

    /// Ersetzt die Regeln einer Linie; eine leere Liste entfernt die Linie.
    pub fn set_line_rules(&mut self, hash: u64, rules: Vec<LineRule>) -> Result<(), MarkingError> {
        let line = self.lines.get(&hash).ok_or(MarkingError::LineNotFound(hash))?;
        let line_type = line.line_type;
        if line_type == LineType::Crosswalk {
            return if rules.is_empty() {
                Ok(())
            } else {
                Err(MarkingError::NoRules(hash))
            };
        }
        if rules.is_empty() {
            self.remove_line(hash)?;
            return Ok(());
        }
        validate_rules(line_type, &rules)?;
        self.check_crossings(hash, &rules)?;

        if let Some(line) = self.lines.get(&hash).cloned() {
            self.unregister_line(&line);
        }
        if let Some(line) = self.lines.get_mut(&hash) {
            line.rules = rules;
            line.resolved.clear();
        }
        if let Some(line) = self.lines.get(&hash).cloned() {
            self.register_line(&line);
        }
        self.dirty.entities.insert(EntityRef::Line(hash));
        self.recompute();
        Ok(())
    }

    pub fn add_rule(&mut self, hash: u64, rule: LineRule) -> Result<(), MarkingError> {
        let mut rules = self
            .lines
            .get(&hash)
            .map(|line| line.rules.clone())
            .ok_or(MarkingError::LineNotFound(hash))?;
        rules.push(rule);
        self.set_line_rules(hash, rules)
    }

    /// Entfernt eine Linie und repariert ihre Abhängigen.
    ///
    /// Grenzen fallen auf die Projektion zurück, Füllungsteile werden gerade,
    /// Schnitt-Ränder frieren an ihrer letzten Lage ein. Eine Überweglinie nimmt
    /// ihren Überweg mit. Liefert die reparierten Entities.
    pub fn remove_line(&mut self, hash: u64) -> Result<Dependences, MarkingError> {
        let line = self
            .lines
            .shift_remove(&hash)
            .ok_or(MarkingError::LineNotFound(hash))?;
        self.unregister_line(&line);
        if let Some(crosswalk) = self.crosswalks.shift_remove(&hash) {
            self.unregister_crosswalk(&crosswalk, line.pair);
        }

        let users = self.line_users.remove(&hash).unwrap_or_default();
        let mut repaired = Vec::new();
        for user in users {
            let changed = match user {
                EntityRef::Line(other) => self.lines.get_mut(&other).map(|l| {
                    l.freeze_crossing(hash);
                    true
                }),
                EntityRef::Crosswalk(other) => {
                    self.crosswalks.get_mut(&other).map(|c| c.drop_border(hash))
                }
                EntityRef::Filler(id) => self.fillers.get_mut(&id).map(|f| f.drop_guide(hash)),
            };
            if changed == Some(true) {
                self.dirty.entities.insert(user);
                repaired.push(user);
            }
        }
        log::debug!(
            "Linie {:#018x} entfernt, {} Abhaengige repariert",
            hash,
            repaired.len()
        );
        self.recompute();
        Ok(Dependences::from_refs(&repaired))
    }

    // ── Überwege ───────────────────────────────────────────────────

    /// Überweg zwischen zwei Überweg-Punkten derselben Einfahrt.
    pub fn add_crosswalk(
        &mut self,
        a: PointId,
        b: PointId,
        style: Style,
        right_border: Option<u64>,
        left_border: Option<u64>,
    ) -> Result<u64, MarkingError> {
        let pair = PointPair::new(a, b);
        self.check_pair(pair, LineType::Crosswalk, true)?;
        Self::check_style(&style, StyleGroup::Crosswalk)?;
        for border in [right_border, left_border].into_iter().flatten() {
            self.check_border(border)?;
        }
        let hash = self.insert_line(pair, LineType::Crosswalk, Vec::new())?;
        self.insert_crosswalk(hash, style, right_border, left_border);
        self.recompute();
        Ok(hash)
    }

    pub(crate) fn check_border(&self, border: u64) -> Result<(), MarkingError> {
        let line = self.lines.get(&border).ok_or(MarkingError::LineNotFound(border))?;
        if line.line_type != LineType::Regular {
            return Err(MarkingError::InvalidBorder(border));
        }
        Ok(())
    }

    /// Setzt den Überweg zur vorhandenen Überweglinie `hash` ein.
    pub(crate) fn insert_crosswalk(
        &mut self,
        hash: u64,
        style: Style,
        right_border: Option<u64>,
        left_border: Option<u64>,
    ) {
        let mut crosswalk = MarkingCrosswalk::new(hash, style);
        crosswalk.right_border = right_border;
        crosswalk.left_border = left_border;
        if let Some(pair) = self.lines.get(&hash).map(|line| line.pair) {
            self.register_crosswalk(&crosswalk, pair);
        }
        self.crosswalks.insert(hash, crosswalk);
        self.dirty.entities.insert(EntityRef::Crosswalk(hash));
    }

    /// Entfernt Überweg und Überweglinie gemeinsam.
    pub fn remove_crosswalk(&mut self, hash: u64) -> Result<(), MarkingError> {
        if !self.crosswalks.contains_key(&hash) {
            return Err(MarkingError::CrosswalkNotFound(hash));
        }
        self.remove_line(hash)?;
        Ok(())
    }

    pub fn set_crosswalk_style(&mut self, hash: u64, style: Style) -> Result<(), MarkingError> {
        Self::check_style(&style, StyleGroup::Crosswalk)?;
        let crosswalk = self
            .crosswalks
            .get_mut(&hash)
            .ok_or(MarkingError::CrosswalkNotFound(hash))?;
        crosswalk.style = style;
        self.dirty.entities.insert(EntityRef::Crosswalk(hash));
        self.recompute();
        Ok(())
    }

    pub fn set_crosswalk_border(
        &mut self,
        hash: u64,
        side: BorderSide,
        border: Option<u64>,
    ) -> Result<(), MarkingError> {
        if !self.crosswalks.contains_key(&hash) {
            return Err(MarkingError::CrosswalkNotFound(hash));
        }
        if let Some(border) = border {
            self.check_border(border)?;
        }
        let Some(pair) = self.lines.get(&hash).map(|line| line.pair) else {
            return Err(MarkingError::LineNotFound(hash));
        };
        if let Some(crosswalk) = self.crosswalks.get(&hash).cloned() {
            self.unregister_crosswalk(&crosswalk, pair);
        }
        if let Some(crosswalk) = self.crosswalks.get_mut(&hash) {
            crosswalk.set_border(side, border);
        }
        if let Some(crosswalk) = self.crosswalks.get(&hash).cloned() {
            self.register_crosswalk(&crosswalk, pair);
        }
        self.dirty.entities.insert(EntityRef::Crosswalk(hash));
        self.recompute();
        Ok(())
    }

    // ── Füllungen ──────────────────────────────────────────────────

    /// Füllung über `vertices`; `guides[i]` führt den Teil von Eckpunkt `i` zu `i + 1`.
    pub fn add_filler(
        &mut self,
        vertices: Vec<PointId>,
        guides: Vec<Option<u64>>,
        style: Style,
    ) -> Result<u32, MarkingError> {
        Self::check_style(&style, StyleGroup::Filler)?;
        for &vertex in &vertices {
            self.check_point(vertex, vertex.point_type, true)?;
        }
        let filler = MarkingFiller::new(self.next_filler_id, vertices, guides, style)?;
        self.check_guides(&filler)?;
        let id = self.insert_filler(filler);
        self.recompute();
        Ok(id)
    }

    /// Jede Führungslinie muss die beiden Eckpunkte ihres Teils verbinden.
    pub(crate) fn check_guides(&self, filler: &MarkingFiller) -> Result<(), MarkingError> {
        for (index, guide) in filler.guides.iter().enumerate() {
            let Some(guide) = *guide else {
                continue;
            };
            let line = self.lines.get(&guide).ok_or(MarkingError::LineNotFound(guide))?;
            if filler.part_pair(index) != Some(line.pair) {
                return Err(MarkingError::InvalidContour(format!(
                    "Linie {:#018x} verbindet nicht die Eckpunkte von Teil {}",
                    guide, index
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn insert_filler(&mut self, filler: MarkingFiller) -> u32 {
        let id = filler.id;
        for &vertex in &filler.vertices {
            self.ensure_point(vertex);
        }
        self.register_filler(&filler);
        self.fillers.insert(id, filler);
        self.next_filler_id = self.next_filler_id.max(id.saturating_add(1));
        self.dirty.entities.insert(EntityRef::Filler(id));
        id
    }

    pub(crate) fn next_filler_id(&self) -> u32 {
        self.next_filler_id
    }

    pub fn remove_filler(&mut self, id: u32) -> Result<(), MarkingError> {
        let filler = self
            .fillers
            .shift_remove(&id)
            .ok_or(MarkingError::FillerNotFound(id))?;
        self.unregister_filler(&filler);
        Ok(())
    }

    pub fn set_filler_style(&mut self, id: u32, style: Style) -> Result<(), MarkingError> {
        Self::check_style(&style, StyleGroup::Filler)?;
        let filler = self.fillers.get_mut(&id).ok_or(MarkingError::FillerNotFound(id))?;
        filler.style = style;
        self.dirty.entities.insert(EntityRef::Filler(id));
        self.recompute();
        Ok(())
    }

    // ── Gesamt ─────────────────────────────────────────────────────

    /// Entfernt alle Entities und Punkte; Einfahrten bleiben.
    pub fn clear(&mut self) {
        self.points.clear();
        self.lines.clear();
        self.crosswalks.clear();
        self.fillers.clear();
        self.point_users.clear();
        self.line_users.clear();
        self.dirty = Dirty::default();
        self.next_filler_id = 1;
        self.last_stats = RecomputeStats::default();
    }

    /// Übergibt die zwischengespeicherten Primitive einer Detailstufe; berechnet nichts.
    pub fn render(&self, lod: Lod, sink: &mut dyn PrimitiveSink) {
        for (hash, line) in &self.lines {
            let primitives = line.primitives.get(lod);
            if !primitives.is_empty() {
                sink.commit(EntityRef::Line(*hash), lod, primitives);
            }
        }
        for (hash, crosswalk) in &self.crosswalks {
            let primitives = crosswalk.primitives.get(lod);
            if !primitives.is_empty() {
                sink.commit(EntityRef::Crosswalk(*hash), lod, primitives);
            }
        }
        for (id, filler) in &self.fillers {
            let primitives = filler.primitives.get(lod);
            if !primitives.is_empty() {
                sink.commit(EntityRef::Filler(*id), lod, primitives);
            }
        }
    }
}
