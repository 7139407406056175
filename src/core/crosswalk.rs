//! Überweg-Entity: eigene Linie, Stil und optionale Grenzlinien.

use crate::style::{CrosswalkGeometry, PrimitiveGroup, Style};
use xxhash_rust::xxh3::xxh3_64;

/// Seite einer Überweg-Grenze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderSide {
    Right,
    Left,
}

impl BorderSide {
    /// Spiegelung bei invertierten Objekten.
    pub fn opposite(self) -> Self {
        match self {
            BorderSide::Right => BorderSide::Left,
            BorderSide::Left => BorderSide::Right,
        }
    }
}

/// Überweg, über den Hash seiner Linie identifiziert
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingCrosswalk {
    pub line: u64,
    pub style: Style,
    pub right_border: Option<u64>,
    pub left_border: Option<u64>,
    /// Nach der Neuberechnung immer mit gültigen Grenzen belegt
    pub geometry: Option<CrosswalkGeometry>,
    pub primitives: PrimitiveGroup,
}

impl MarkingCrosswalk {
    pub fn new(line: u64, style: Style) -> Self {
        Self {
            line,
            style,
            right_border: None,
            left_border: None,
            geometry: None,
            primitives: PrimitiveGroup::default(),
        }
    }

    pub fn border(&self, side: BorderSide) -> Option<u64> {
        match side {
            BorderSide::Right => self.right_border,
            BorderSide::Left => self.left_border,
        }
    }

    pub fn set_border(&mut self, side: BorderSide, line: Option<u64>) {
        match side {
            BorderSide::Right => self.right_border = line,
            BorderSide::Left => self.left_border = line,
        }
    }

    pub fn borders(&self) -> impl Iterator<Item = u64> {
        [self.right_border, self.left_border].into_iter().flatten()
    }

    /// Entfernt `line` als Grenze; `true`, wenn sie verwendet wurde.
    pub fn drop_border(&mut self, line: u64) -> bool {
        let mut changed = false;
        for side in [BorderSide::Right, BorderSide::Left] {
            if self.border(side) == Some(line) {
                self.set_border(side, None);
                changed = true;
            }
        }
        changed
    }

    pub fn seed(&self) -> u64 {
        xxh3_64(&self.line.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EngineOptions;
    use crate::style::StyleKind;

    #[test]
    fn test_drop_border_clears_both_sides() {
        let style = Style::default_for(StyleKind::ZebraCrosswalk, &EngineOptions::default());
        let mut crosswalk = MarkingCrosswalk::new(1, style);
        crosswalk.set_border(BorderSide::Right, Some(7));
        crosswalk.set_border(BorderSide::Left, Some(7));
        assert!(crosswalk.drop_border(7));
        assert_eq!(crosswalk.borders().count(), 0);
        assert!(!crosswalk.drop_border(7), "zweites Entfernen aendert nichts");
    }
}
