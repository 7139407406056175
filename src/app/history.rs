use crate::core::{Marking, ObjectsMap};
use crate::xml::{DecodeReport, XmlElement};
use anyhow::Result;

/// Snapshot einer Markierung als XML-Baum.
///
/// Gespeichert wird nur das Dokument; Trajektorien und Primitive entstehen beim
/// Wiederherstellen neu aus den aktuellen Einfahrten.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub config: XmlElement,
}

impl Snapshot {
    pub fn from_marking(marking: &Marking) -> Self {
        Self {
            config: marking.to_xml(),
        }
    }

    /// Stellt den Snapshot über die Identitäts-Zuordnung wieder her.
    pub fn apply_to(&self, marking: &mut Marking) -> Result<DecodeReport> {
        marking.from_xml(&self.config, &ObjectsMap::identity(), false)
    }
}

/// Einfacher Undo/Redo-Manager mit Snapshotting.
#[derive(Debug, Default)]
pub struct EditHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_depth: usize,
}

impl EditHistory {
    /// Erstellt einen neuen History-Manager mit maximaler Tiefe.
    pub fn new_with_capacity(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::with_capacity(max_depth),
            max_depth,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Legt den Zustand vor einer Änderung ab und verwirft den Redo-Stapel.
    pub fn record_snapshot(&mut self, snap: Snapshot) {
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(snap);
        self.redo_stack.clear();
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Holt den letzten Undo-Eintrag; `current` wandert auf den Redo-Stapel.
    pub fn pop_undo_with_current(&mut self, current: Snapshot) -> Option<Snapshot> {
        let prev = self.undo_stack.pop()?;
        if self.redo_stack.len() >= self.max_depth {
            self.redo_stack.remove(0);
        }
        self.redo_stack.push(current);
        Some(prev)
    }

    /// Holt den letzten Redo-Eintrag; `current` wandert auf den Undo-Stapel.
    pub fn pop_redo_with_current(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo_stack.pop()?;
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(current);
        Some(next)
    }

    /// Macht die letzte Änderung an `marking` rückgängig; `false` ohne Eintrag.
    pub fn undo(&mut self, marking: &mut Marking) -> Result<bool> {
        match self.pop_undo_with_current(Snapshot::from_marking(marking)) {
            Some(snap) => {
                snap.apply_to(marking)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Stellt die zuletzt rückgängig gemachte Änderung wieder her.
    pub fn redo(&mut self, marking: &mut Marking) -> Result<bool> {
        match self.pop_redo_with_current(Snapshot::from_marking(marking)) {
            Some(snap) => {
                snap.apply_to(marking)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
