use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while turning a recording into segments.
///
/// Only `Config` is fatal. `InsufficientData` and `MissingJoint` are
/// recovered by the pipeline (empty segmentation and NaN angles
/// respectively); they are surfaced as values so callers can log them.
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Insufficient data: {samples} samples, window needs {window}")]
    InsufficientData { samples: usize, window: usize },
    #[error("Joint {joint} missing or below confidence in frame {frame}")]
    MissingJoint { frame: usize, joint: u32 },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
