//! Application-Layer: Undo/Redo über Markierungs-Snapshots.

pub mod history;

pub use history::{EditHistory, Snapshot};
