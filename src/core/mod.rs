//! Core-Domänentypen: Einfahrten, Punkte, Linien, Überwege, Füllungen und
//! die Markierung, die sie zusammenhält.

pub mod crosswalk;
pub mod entrance;
pub mod error;
pub mod filler;
pub mod line;
pub mod manager;
pub mod marking;
pub mod objects_map;
pub mod point;
pub mod template;

pub use crosswalk::{BorderSide, MarkingCrosswalk};
pub use entrance::{Entrance, EntranceGeometry, EntranceProvider, LaneGeometry};
pub use error::MarkingError;
pub use filler::MarkingFiller;
pub use line::{LineRule, LineType, MarkingLine, PointPair, RuleEdge};
pub use manager::{LoadReport, MarkingManager};
pub use marking::{
    Dependences, EntityRef, Marking, MarkingKind, PrimitiveSink, RecomputeStats,
};
pub use objects_map::ObjectsMap;
pub use point::{Location, MarkingPoint, PointId, PointType, Source};
pub use template::TemplateLibrary;
