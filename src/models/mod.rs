// Data models for joints, topology, signals and segments

pub mod keypoint;
pub mod segment;
pub mod signal;
pub mod topology;

pub use keypoint::*;
pub use segment::*;
pub use signal::*;
pub use topology::*;
