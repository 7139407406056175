//! XML Import/Export für Markierungen.
//!
//! Eine Markierung ist ein `<Marking>`-Element mit Punkten (`P`), Linien (`L`),
//! Überwegen (`C`) und Füllungen (`F`); Stile stehen als `<S>` in ihren Besitzern.

pub mod element;
pub mod parser;
pub mod writer;

pub use element::XmlElement;
pub use parser::{parse_marking_document, DecodeReport};
pub use writer::write_marking_document;

/// Aktuelle Schema-Version; ältere Dokumente werden mit Standardwerten gelesen.
pub const SCHEMA_VERSION: u32 = 2;

/// Name des Markierungs-Elements
pub const MARKING_ELEMENT: &str = "Marking";
