// Motion segmentation library
//
// Turns per-frame pose-estimator joints into joint-angle series, folds them
// into one composite signal, smooths it with a sliding window and cuts the
// recording into motion segments.

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::{Config, ConfigError, SegmentationParameters, WindowStatistic};
pub use error::SegmentationError;
pub use models::{JointFrame, JointTopology, Segment};
pub use services::segmentation_pipeline::{SegmentationPipeline, SegmentationReport};
