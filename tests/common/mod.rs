#![allow(dead_code)]

// Shared fixtures for integration tests

use motion_segmentation::models::{Joint, JointFrame, Recording};
use std::f64::consts::TAU;

pub struct RecordingGenerator;

impl RecordingGenerator {
    /// Both legs tracked, knees bent to `knee_degrees`
    pub fn leg_frame(frame: usize, knee_degrees: f64) -> JointFrame {
        let radians = knee_degrees.to_radians();
        let shoulder = Joint::new(0.0, 2.0, 0.0, 0.95);
        let hip = Joint::new(0.0, 1.0, 0.0, 0.95);
        let knee = Joint::new(0.0, 0.0, 0.0, 0.95);
        let ankle = Joint::new(radians.sin(), radians.cos(), 0.0, 0.95);

        JointFrame::new(
            frame,
            [
                (11, shoulder),
                (12, shoulder),
                (23, hip),
                (24, hip),
                (25, knee),
                (26, knee),
                (27, ankle),
                (28, ankle),
            ],
        )
    }

    /// Squats swinging the knees between 175 and 85 degrees
    pub fn squats(repetitions: usize, period: usize) -> Recording {
        let frames = (0..repetitions * period)
            .map(|frame| {
                let phase = frame as f64 / period as f64 * TAU;
                Self::leg_frame(frame, 130.0 + 45.0 * phase.cos())
            })
            .collect();
        Recording {
            fps: Some(30.0),
            frames,
        }
    }

    /// Standing still, knees fully extended
    pub fn standing(frames: usize) -> Recording {
        Recording::new((0..frames).map(|frame| Self::leg_frame(frame, 170.0)).collect())
    }
}

/// Piecewise-constant signal alternating between `low` and `high` every `run` samples
pub fn alternating_levels(runs: usize, run: usize, low: f64, high: f64) -> Vec<f64> {
    (0..runs)
        .flat_map(|index| {
            let level = if index % 2 == 0 { low } else { high };
            std::iter::repeat(level).take(run)
        })
        .collect()
}
