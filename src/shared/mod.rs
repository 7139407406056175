//! Geteilte Konfiguration für alle Schichten der Engine.

pub mod options;

pub use options::EngineOptions;
