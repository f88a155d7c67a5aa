// Segmentation stages and the services built on them

pub mod angle_extractor;
pub mod batch_service;
pub mod feature_aggregator;
pub mod joint_smoother;
pub mod recording_loader;
pub mod repetition_counter;
pub mod segment_detector;
pub mod segmentation_pipeline;
pub mod window_scaler;

pub use angle_extractor::AngleExtractor;
pub use batch_service::{BatchOutcome, BatchSegmenter};
pub use feature_aggregator::FeatureAggregator;
pub use joint_smoother::JointSmoother;
pub use recording_loader::{list_recordings, load_recording, save_json};
pub use repetition_counter::{RepetitionCounter, RepetitionProgress, RepetitionState};
pub use segment_detector::SegmentDetector;
pub use segmentation_pipeline::{AngleSummary, PipelineTrace, SegmentationPipeline, SegmentationReport};
pub use window_scaler::WindowScaler;
