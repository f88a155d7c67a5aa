/// End-to-end segmentation of one recording
///
/// Stages run strictly in order, each on the full output of the previous one:
/// joint filtering and smoothing, angle extraction, feature aggregation,
/// window scaling, segment detection.

use chrono::{DateTime, Utc};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::error::SegmentationError;
use crate::models::{AngleSeries, Boundary, CompositeSignal, JointFrame, ScaledSignal, Segment};
use crate::services::angle_extractor::AngleExtractor;
use crate::services::feature_aggregator::FeatureAggregator;
use crate::services::joint_smoother::JointSmoother;
use crate::services::segment_detector::SegmentDetector;
use crate::services::window_scaler::WindowScaler;

/// Per-angle quality summary
#[derive(Debug, Clone, Serialize)]
pub struct AngleSummary {
    pub name: String,
    /// Frames where the angle could not be measured
    pub missing_frames: usize,
    /// Mean over measured frames, `None` when nothing was measured
    pub mean_degrees: Option<f64>,
}

/// Result of segmenting one recording
#[derive(Debug, Clone, Serialize)]
pub struct SegmentationReport {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub frame_count: usize,
    /// Angle channels that fed the composite signal
    pub channels: Vec<String>,
    pub angles: Vec<AngleSummary>,
    pub scaled_samples: usize,
    pub boundaries: Vec<Boundary>,
    pub segments: Vec<Segment>,
    /// Set when the recording was shorter than one window
    pub insufficient_data: bool,
}

/// Intermediate signals of one run, for inspection and plotting
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    pub frame_numbers: Vec<usize>,
    pub angles: AngleSeries,
    pub composite: CompositeSignal,
    pub scaled: Option<ScaledSignal>,
}

/// Immutable, shareable segmentation pipeline
#[derive(Debug, Clone)]
pub struct SegmentationPipeline {
    config: Arc<Config>,
}

impl SegmentationPipeline {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    pub fn from_config(config: Config) -> Self {
        Self::new(Arc::new(config))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Order frames, drop landmarks the topology never uses and apply smoothing
    ///
    /// Only the first frame recorded under each frame number is kept.
    pub fn prepare(&self, frames: impl IntoIterator<Item = JointFrame>) -> Vec<JointFrame> {
        let referenced = self.config.topology.referenced_joints();
        let mut frames: Vec<JointFrame> = frames
            .into_iter()
            .map(|mut frame| {
                frame.retain(|index| referenced.contains(&index));
                frame
            })
            .collect();
        frames.sort_by_key(|frame| frame.frame);

        let recorded = frames.len();
        frames.dedup_by_key(|frame| frame.frame);
        if frames.len() < recorded {
            tracing::warn!(
                "Dropped {} frames with a repeated frame number",
                recorded - frames.len()
            );
        }

        let mut smoother = JointSmoother::new(
            self.config.smoothing.clone(),
            self.config.segmentation_parameters.min_confidence,
        );
        if smoother.is_enabled() {
            frames = smoother.smooth_all(frames);
        }
        frames
    }

    /// Angle series for already prepared frames
    pub fn angles(&self, frames: &[JointFrame]) -> AngleSeries {
        AngleExtractor::new(&self.config.topology)
            .with_min_confidence(self.config.segmentation_parameters.min_confidence)
            .extract(frames)
    }

    /// Run every stage, keeping the intermediate signals
    pub fn trace(&self, frames: impl IntoIterator<Item = JointFrame>) -> (PipelineTrace, Vec<Boundary>, Vec<Segment>) {
        let params = &self.config.segmentation_parameters;
        let frames = self.prepare(frames);
        let frame_numbers: Vec<usize> = frames.iter().map(|frame| frame.frame).collect();

        let angles = self.angles(&frames);
        let composite = FeatureAggregator::new(params.channels.clone()).aggregate(&angles);

        let (scaled, boundaries, segments) = match WindowScaler::from_parameters(params).scale(&composite) {
            Ok(scaled) => {
                let detector = SegmentDetector::from_parameters(params);
                let boundaries = detector.boundaries(&scaled);
                let segments = detector.segments_for(&boundaries, &scaled);
                (Some(scaled), boundaries, segments)
            }
            Err(err @ SegmentationError::InsufficientData { .. }) => {
                tracing::warn!("Skipping segmentation: {}", err);
                (None, Vec::new(), Vec::new())
            }
            Err(err) => {
                tracing::error!("Window scaling failed: {}", err);
                (None, Vec::new(), Vec::new())
            }
        };

        let boundaries = boundaries
            .into_iter()
            .map(|boundary| Boundary {
                frame: frame_numbers[boundary.frame],
                ..boundary
            })
            .collect();
        let segments = segments
            .into_iter()
            .map(|segment| to_frame_numbers(segment, &frame_numbers))
            .collect();

        let trace = PipelineTrace {
            frame_numbers,
            angles,
            composite,
            scaled,
        };
        (trace, boundaries, segments)
    }

    /// Segment one recording
    pub fn run(&self, frames: impl IntoIterator<Item = JointFrame>) -> SegmentationReport {
        let (trace, boundaries, segments) = self.trace(frames);

        let angles = trace
            .angles
            .names()
            .iter()
            .zip(trace.angles.missing_counts())
            .map(|(name, missing_frames)| {
                let measured: Vec<f64> = trace
                    .angles
                    .channel(name)
                    .map(|channel| channel.iter().copied().filter(|v| !v.is_nan()).collect())
                    .unwrap_or_default();
                AngleSummary {
                    name: name.clone(),
                    missing_frames,
                    mean_degrees: (!measured.is_empty()).then(|| measured.iter().mean()),
                }
            })
            .collect();

        let report = SegmentationReport {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            frame_count: trace.frame_numbers.len(),
            channels: self.config.segmentation_parameters.channels.clone(),
            angles,
            scaled_samples: trace.scaled.as_ref().map_or(0, ScaledSignal::len),
            boundaries,
            insufficient_data: trace.scaled.is_none(),
            segments,
        };

        tracing::info!(
            "Segmented {} frames into {} segments",
            report.frame_count,
            report.segments.len()
        );
        report
    }
}

// Detector output indexes the prepared frame list; translate to recorded
// frame numbers, which may have gaps where the estimator found nobody.
fn to_frame_numbers(segment: Segment, frame_numbers: &[usize]) -> Segment {
    Segment {
        start_frame: frame_numbers[segment.start_frame],
        end_frame: frame_numbers[segment.end_frame - 1] + 1,
        ..segment
    }
}
