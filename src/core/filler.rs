//! Füllungen: geschlossene Kontur über Punkten, Teile optional entlang von Linien.

use super::error::MarkingError;
use super::line::PointPair;
use super::point::PointId;
use crate::style::{FillerContour, PrimitiveGroup, Style};
use xxhash_rust::xxh3::xxh3_64;

/// Mindestzahl an Eckpunkten einer Kontur.
pub const MIN_VERTICES: usize = 3;

/// Füllung mit Kontur und Stil
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingFiller {
    pub id: u32,
    pub vertices: Vec<PointId>,
    /// Führungslinie je Teil `i` (von Eckpunkt `i` zu `i + 1`); `None` = gerade
    pub guides: Vec<Option<u64>>,
    pub style: Style,
    pub contour: Option<FillerContour>,
    pub primitives: PrimitiveGroup,
}

impl MarkingFiller {
    /// Prüft die Kontur-Struktur; Führungslinien werden vom Graphen geprüft.
    pub fn new(
        id: u32,
        vertices: Vec<PointId>,
        guides: Vec<Option<u64>>,
        style: Style,
    ) -> Result<Self, MarkingError> {
        if vertices.len() < MIN_VERTICES {
            return Err(MarkingError::InvalidContour(format!(
                "{} Eckpunkte, mindestens {} noetig",
                vertices.len(),
                MIN_VERTICES
            )));
        }
        let mut guides = guides;
        if guides.len() > vertices.len() {
            return Err(MarkingError::InvalidContour(format!(
                "{} Fuehrungslinien fuer {} Teile",
                guides.len(),
                vertices.len()
            )));
        }
        guides.resize(vertices.len(), None);
        Ok(Self {
            id,
            vertices,
            guides,
            style,
            contour: None,
            primitives: PrimitiveGroup::default(),
        })
    }

    /// Teile als `(von, nach, Führungslinie)`; der letzte schließt die Kontur.
    pub fn parts(&self) -> impl Iterator<Item = (PointId, PointId, Option<u64>)> + '_ {
        let count = self.vertices.len();
        (0..count).map(move |i| {
            (
                self.vertices[i],
                self.vertices[(i + 1) % count],
                self.guides.get(i).copied().flatten(),
            )
        })
    }

    /// Punktpaar, das eine Führungslinie für Teil `index` haben muss.
    pub fn part_pair(&self, index: usize) -> Option<PointPair> {
        let count = self.vertices.len();
        let from = *self.vertices.get(index)?;
        Some(PointPair::new(from, self.vertices[(index + 1) % count]))
    }

    /// Teile entlang `line` werden gerade; `true`, wenn sich etwas änderte.
    pub fn drop_guide(&mut self, line: u64) -> bool {
        let mut changed = false;
        for guide in self.guides.iter_mut().filter(|guide| **guide == Some(line)) {
            *guide = None;
            changed = true;
        }
        changed
    }

    pub fn guide_lines(&self) -> impl Iterator<Item = u64> + '_ {
        self.guides.iter().flatten().copied()
    }

    pub fn seed(&self) -> u64 {
        xxh3_64(&self.id.to_le_bytes())
    }
}
