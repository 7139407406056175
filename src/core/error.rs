//! Strukturfehler des Markierungs-Graphen.

use super::point::{PointId, PointType};
use crate::style::{StyleGroup, StyleKind};
use thiserror::Error;

/// Fehler einer Graph-Operation (`add_*`, `remove_*`, `set_*`).
///
/// Geometrische Sonderfälle (parallele Kurven, fehlende Schnitte) sind nie Fehler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarkingError {
    #[error("Linie {0:#018x} existiert bereits")]
    LineExists(u64),
    #[error("Linie {0:#018x} nicht gefunden")]
    LineNotFound(u64),
    #[error("Ueberweg {0:#018x} nicht gefunden")]
    CrosswalkNotFound(u64),
    #[error("Fuellung {0} nicht gefunden")]
    FillerNotFound(u32),
    #[error("Einfahrt {0} nicht gefunden")]
    EntranceNotFound(u32),
    #[error("Punkt {point} ausserhalb des Bereichs (Einfahrt hat {count} Punkte)")]
    PointOutOfRange { point: PointId, count: usize },
    #[error("Punkt {point} hat den falschen Typ, erwartet {expected:?}")]
    InvalidPointType { point: PointId, expected: PointType },
    #[error("Linie ohne Laenge: beide Enden sind {0}")]
    DegenerateLine(PointId),
    #[error("Punkte {first} und {second} liegen nicht an derselben Einfahrt")]
    NotSameEntrance { first: PointId, second: PointId },
    #[error("Stil {kind:?} ist fuer {group:?} nicht zulaessig")]
    InvalidStyle { kind: StyleKind, group: StyleGroup },
    #[error("Linie {0:#018x} ist keine regulaere Linie und kann keine Grenze sein")]
    InvalidBorder(u64),
    #[error("Kontur ungueltig: {0}")]
    InvalidContour(String),
    #[error("Regelbereich {from}..{to} ungueltig")]
    InvalidRuleRange { from: f32, to: f32 },
    #[error("Regelbereiche ueberlappen")]
    RuleOverlap,
    #[error("Regel von Linie {0:#018x} ist an der eigenen Linie verankert")]
    SelfCrossing(u64),
    #[error("Ueberweglinie {0:#018x} traegt keine Regeln, der Stil liegt am Ueberweg")]
    NoRules(u64),
}
