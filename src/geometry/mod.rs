//! Trajektorien- und Schnitt-Kernel.
//!
//! Layer-neutral: wird von `style` und `core` genutzt, hängt selbst nur von `glam` ab.

pub mod intersection;
pub mod trajectory;

pub use intersection::{butt_offset, Intersection, PARALLEL_OFFSET_SENTINEL, T_EPSILON};
pub use trajectory::{
    ray_intersection, right_normal, xz, ArcTrajectory, CombinedTrajectory, StraightTrajectory,
    Trajectory,
};
