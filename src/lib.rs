//! Markup Engine Library.
//! Geometrie- und Stil-Engine für Fahrbahnmarkierungen an Kreuzungen und Segmenten.

pub mod app;
pub mod core;
pub mod geometry;
pub mod shared;
pub mod style;
pub mod xml;

pub use app::{EditHistory, Snapshot};
pub use core::{
    BorderSide, Dependences, EntityRef, EntranceGeometry, EntranceProvider, LaneGeometry,
    LineRule, LineType, LoadReport, Marking, MarkingError, MarkingKind, MarkingManager,
    ObjectsMap, PointId, PointPair, PointType, PrimitiveSink, RecomputeStats, RuleEdge,
    TemplateLibrary,
};
pub use geometry::{Intersection, StraightTrajectory, Trajectory};
pub use shared::EngineOptions;
pub use style::{Lod, MarkingPrimitive, Style, StyleKind};
pub use xml::{parse_marking_document, write_marking_document, DecodeReport, XmlElement};
