//! Linien: Punktpaar, Linienart und Stil-Regeln über Teilbereichen.

use super::error::MarkingError;
use super::point::{PointId, PointType};
use crate::geometry::{Trajectory, T_EPSILON};
use crate::style::{PrimitiveGroup, Style, StyleGroup};
use std::fmt;
use std::str::FromStr;
use xxhash_rust::xxh3::{xxh3_64, xxh3_64_with_seed};

/// Geordnetes Punktpaar; Identität einer Linie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointPair {
    pub first: PointId,
    pub second: PointId,
}

impl PointPair {
    /// Ordnet nach gepackter Punkt-ID, damit `(a, b)` und `(b, a)` gleich sind.
    pub fn new(a: PointId, b: PointId) -> Self {
        if a.raw() <= b.raw() {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    /// 64-Bit-Hash über beide gepackten IDs (Little Endian).
    pub fn hash(&self) -> u64 {
        let mut bytes = [0u8; 16];
        bytes[..8].copy_from_slice(&self.first.raw().to_le_bytes());
        bytes[8..].copy_from_slice(&self.second.raw().to_le_bytes());
        xxh3_64(&bytes)
    }

    pub fn contains(&self, point: PointId) -> bool {
        self.first == point || self.second == point
    }

    pub fn is_same_entrance(&self) -> bool {
        self.first.entrance == self.second.entrance
    }

    pub fn points(&self) -> [PointId; 2] {
        [self.first, self.second]
    }
}

impl fmt::Display for PointPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.first, self.second)
    }
}

/// Art einer Linie (XML-Attribut `T`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineType {
    Regular,
    Stop,
    Normal,
    Lane,
    Crosswalk,
}

impl LineType {
    pub fn code(self) -> u8 {
        match self {
            LineType::Regular => 1,
            LineType::Stop => 2,
            LineType::Normal => 3,
            LineType::Lane => 4,
            LineType::Crosswalk => 5,
        }
    }

    pub fn from_code(code: u8) -> Option<LineType> {
        match code {
            1 => Some(LineType::Regular),
            2 => Some(LineType::Stop),
            3 => Some(LineType::Normal),
            4 => Some(LineType::Lane),
            5 => Some(LineType::Crosswalk),
            _ => None,
        }
    }

    /// Zulässige Stil-Gruppe der Regeln.
    pub fn style_group(self) -> StyleGroup {
        match self {
            LineType::Regular | LineType::Normal | LineType::Lane => StyleGroup::RegularLine,
            LineType::Stop => StyleGroup::StopLine,
            LineType::Crosswalk => StyleGroup::Crosswalk,
        }
    }

    /// Erwartete Punkttypen `(erster, zweiter)` des Paars.
    pub fn point_types(self) -> (PointType, PointType) {
        match self {
            LineType::Regular | LineType::Stop => (PointType::Entrance, PointType::Entrance),
            LineType::Normal => (PointType::Entrance, PointType::Normal),
            LineType::Lane => (PointType::Lane, PointType::Lane),
            LineType::Crosswalk => (PointType::Crosswalk, PointType::Crosswalk),
        }
    }

    /// Halte- und Überweglinien verbinden Punkte derselben Einfahrt.
    pub fn requires_same_entrance(self) -> bool {
        matches!(self, LineType::Stop | LineType::Normal | LineType::Crosswalk)
    }
}

/// Rand eines Regelbereichs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleEdge {
    Start,
    End,
    /// Fester Parameter auf der eigenen Trajektorie
    Position(f32),
    /// Schnitt mit der Linie dieses Hashs
    Crossing(u64),
}

impl RuleEdge {
    /// Parameter, sofern er nicht von einer anderen Linie abhängt.
    pub fn fixed_t(self) -> Option<f32> {
        match self {
            RuleEdge::Start => Some(0.0),
            RuleEdge::End => Some(1.0),
            RuleEdge::Position(t) => Some(t.clamp(0.0, 1.0)),
            RuleEdge::Crossing(_) => None,
        }
    }

    pub fn crossing(self) -> Option<u64> {
        match self {
            RuleEdge::Crossing(hash) => Some(hash),
            _ => None,
        }
    }
}

impl fmt::Display for RuleEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleEdge::Start => f.write_str("S"),
            RuleEdge::End => f.write_str("E"),
            RuleEdge::Position(t) => write!(f, "P:{}", t),
            RuleEdge::Crossing(hash) => write!(f, "X:{}", hash),
        }
    }
}

impl FromStr for RuleEdge {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "S" => Ok(RuleEdge::Start),
            "E" => Ok(RuleEdge::End),
            other => {
                if let Some(value) = other.strip_prefix("P:") {
                    Ok(RuleEdge::Position(value.parse()?))
                } else if let Some(value) = other.strip_prefix("X:") {
                    Ok(RuleEdge::Crossing(value.parse()?))
                } else {
                    anyhow::bail!("Ungueltiger Regelrand: '{}'", other)
                }
            }
        }
    }
}

/// Stil über dem Bereich `[from, to)` der Trajektorie
#[derive(Debug, Clone, PartialEq)]
pub struct LineRule {
    pub from: RuleEdge,
    pub to: RuleEdge,
    pub style: Style,
}

impl LineRule {
    /// Regel über die ganze Linie.
    pub fn whole(style: Style) -> Self {
        Self {
            from: RuleEdge::Start,
            to: RuleEdge::End,
            style,
        }
    }

    pub fn crossings(&self) -> impl Iterator<Item = u64> {
        [self.from.crossing(), self.to.crossing()].into_iter().flatten()
    }
}

/// Prüft Stil-Zulässigkeit und die festen Bereiche einer Regelliste.
///
/// Bereiche mit Schnitt-Rändern werden erst bei der Neuberechnung aufgelöst.
pub fn validate_rules(line_type: LineType, rules: &[LineRule]) -> Result<(), MarkingError> {
    let group = line_type.style_group();
    let mut fixed = Vec::new();
    for rule in rules {
        let kind = rule.style.kind();
        if !group.allows(kind) {
            return Err(MarkingError::InvalidStyle { kind, group });
        }
        if let (Some(from), Some(to)) = (rule.from.fixed_t(), rule.to.fixed_t()) {
            if from >= to {
                return Err(MarkingError::InvalidRuleRange { from, to });
            }
            fixed.push((from, to));
        }
    }
    fixed.sort_by(|a, b| a.0.total_cmp(&b.0));
    if fixed.windows(2).any(|w| w[1].0 < w[0].1 - T_EPSILON) {
        return Err(MarkingError::RuleOverlap);
    }
    Ok(())
}

/// Seed gestreuter Stile einer Regel.
pub fn rule_seed(line: u64, rule_index: usize) -> u64 {
    xxh3_64_with_seed(&line.to_le_bytes(), rule_index as u64)
}

/// Eine Linie im Graphen mit zwischengespeicherter Geometrie
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingLine {
    pub pair: PointPair,
    pub line_type: LineType,
    pub rules: Vec<LineRule>,
    /// Läuft von `pair.first` nach `pair.second`
    pub trajectory: Option<Trajectory>,
    /// Zuletzt aufgelöste Bereiche je Regel
    pub resolved: Vec<Option<(f32, f32)>>,
    pub primitives: PrimitiveGroup,
}

impl MarkingLine {
    pub fn new(pair: PointPair, line_type: LineType, rules: Vec<LineRule>) -> Self {
        Self {
            pair,
            line_type,
            rules,
            trajectory: None,
            resolved: Vec::new(),
            primitives: PrimitiveGroup::default(),
        }
    }

    pub fn hash(&self) -> u64 {
        self.pair.hash()
    }

    /// Alle Linien, an denen Regelränder verankert sind.
    pub fn crossings(&self) -> Vec<u64> {
        let mut result: Vec<u64> = self.rules.iter().flat_map(LineRule::crossings).collect();
        result.sort_unstable();
        result.dedup();
        result
    }

    /// Friert Ränder auf `crossing` an ihrer letzten Lage ein.
    ///
    /// Ohne bekannte Lage fällt der Rand auf Anfang bzw. Ende zurück.
    pub fn freeze_crossing(&mut self, crossing: u64) {
        for (index, rule) in self.rules.iter_mut().enumerate() {
            let last = self.resolved.get(index).copied().flatten();
            if rule.from == RuleEdge::Crossing(crossing) {
                rule.from = last.map_or(RuleEdge::Start, |(from, _)| RuleEdge::Position(from));
            }
            if rule.to == RuleEdge::Crossing(crossing) {
                rule.to = last.map_or(RuleEdge::End, |(_, to)| RuleEdge::Position(to));
            }
        }
    }
}
