use motion_segmentation::config::{Config, WindowStatistic, DEFAULT_CONFIG};
use motion_segmentation::models::JointFrame;
use motion_segmentation::services::{BatchSegmenter, SegmentationPipeline};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

mod common;

use common::RecordingGenerator;

fn builtin_pipeline() -> SegmentationPipeline {
    SegmentationPipeline::from_config(Config::builtin().unwrap())
}

#[test]
fn test_squats_cut_at_every_edge() {
    let recording = RecordingGenerator::squats(4, 40);
    let report = builtin_pipeline().run(recording.frames);

    assert_eq!(report.frame_count, 160);
    assert_eq!(report.scaled_samples, 156);

    // Knees bend fastest a quarter period into each squat and straighten
    // fastest three quarters in
    let expected = [10, 30, 50, 70, 90, 110, 130, 150];
    assert_eq!(report.boundaries.len(), expected.len());
    for (boundary, frame) in report.boundaries.iter().zip(expected) {
        assert!(
            boundary.frame.abs_diff(frame) <= 2,
            "boundary at {} expected near {}",
            boundary.frame,
            frame
        );
    }

    assert_eq!(report.segments.len(), 9);
    assert_eq!(report.segments[0].start_frame, 0);
    assert_eq!(report.segments[8].end_frame, 160);
    let covered: usize = report.segments.iter().map(|segment| segment.len()).sum();
    assert_eq!(covered, 160);
}

#[test]
fn test_standing_still_is_one_segment() {
    let report = builtin_pipeline().run(RecordingGenerator::standing(50).frames);

    assert!(report.boundaries.is_empty());
    assert_eq!(report.segments.len(), 1);
    assert_eq!(report.segments[0].start_frame, 0);
    assert_eq!(report.segments[0].end_frame, 50);
}

#[test]
fn test_untracked_channels_do_not_stop_segmentation() {
    // Only the head is visible: every composite channel is missing
    let frames: Vec<JointFrame> = RecordingGenerator::standing(30)
        .frames
        .into_iter()
        .map(|mut frame| {
            frame.retain(|index| index == 11 || index == 12);
            frame
        })
        .collect();
    let report = builtin_pipeline().run(frames);

    assert!(!report.insufficient_data);
    assert_eq!(report.segments.len(), 1);
    assert!(report
        .angles
        .iter()
        .all(|angle| angle.missing_frames == 30 && angle.mean_degrees.is_none()));
}

#[test]
fn test_config_file_overrides() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.toml");
    let custom = DEFAULT_CONFIG
        .replace("sliding_window_scaler = 5", "sliding_window_scaler = 3")
        .replace("window_statistic = \"mean\"", "window_statistic = \"range\"");
    fs::write(&path, custom).unwrap();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.segmentation_parameters.sliding_window_scaler, 3);
    assert_eq!(config.segmentation_parameters.window_statistic, WindowStatistic::Range);

    let report = SegmentationPipeline::from_config(config).run(RecordingGenerator::squats(2, 40).frames);
    assert_eq!(report.scaled_samples, 78);
    assert!(report.segments.len() > 1);
}

#[tokio::test]
async fn test_batch_reports_follow_input_order() {
    let segmenter = BatchSegmenter::new(builtin_pipeline()).with_concurrency(3);
    let outcomes = segmenter
        .run_recordings(vec![
            ("squats".to_string(), RecordingGenerator::squats(3, 40)),
            ("standing".to_string(), RecordingGenerator::standing(40)),
            ("blip".to_string(), RecordingGenerator::standing(2)),
        ])
        .await;

    let segments: Vec<usize> = outcomes
        .iter()
        .map(|outcome| outcome.result.as_ref().unwrap().segments.len())
        .collect();
    assert_eq!(segments, vec![7, 1, 0]);
    assert!(outcomes[2].result.as_ref().unwrap().insufficient_data);
}
