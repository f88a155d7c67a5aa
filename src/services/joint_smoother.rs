/// Joint Smoothing Service
///
/// Optional temporal smoothing of joint coordinates before angles are
/// measured:
/// - Moving average over the last `window_size` frames
/// - Scalar Kalman filter per joint coordinate
///
/// Joints below the confidence threshold are passed through untouched and
/// never contribute to an estimate.

use std::collections::{BTreeMap, VecDeque};

use crate::config::{SmoothingConfig, SmoothingMethod};
use crate::models::JointFrame;

/// Kalman filter state for a single joint coordinate
#[derive(Debug, Clone)]
struct KalmanState {
    /// Current estimate
    x: f64,
    /// Estimation error covariance
    p: f64,
    /// Process noise
    q: f64,
    /// Measurement noise
    r: f64,
}

impl KalmanState {
    fn new(initial_value: f64, q: f64, r: f64) -> Self {
        Self {
            x: initial_value,
            p: 1.0,
            q,
            r,
        }
    }

    fn update(&mut self, measurement: f64) -> f64 {
        // Prediction step
        let p_pred = self.p + self.q;

        // Update step
        let k = p_pred / (p_pred + self.r); // Kalman gain
        self.x += k * (measurement - self.x);
        self.p = (1.0 - k) * p_pred;

        self.x
    }
}

/// Stateful smoother for one recording
pub struct JointSmoother {
    config: SmoothingConfig,
    /// Minimum confidence threshold for valid joints
    min_confidence: f64,
    /// History buffer for moving average
    history: VecDeque<JointFrame>,
    /// Kalman states keyed by (joint index, axis)
    kalman_states: BTreeMap<(u32, usize), KalmanState>,
}

impl JointSmoother {
    pub fn new(config: SmoothingConfig, min_confidence: f64) -> Self {
        Self {
            history: VecDeque::with_capacity(config.window_size),
            config,
            min_confidence,
            kalman_states: BTreeMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.method != SmoothingMethod::None
    }

    /// Smooth one frame, updating the internal state
    pub fn smooth(&mut self, mut frame: JointFrame) -> JointFrame {
        match self.config.method {
            SmoothingMethod::None => {}
            SmoothingMethod::MovingAverage => self.apply_moving_average(&mut frame),
            SmoothingMethod::Kalman => self.apply_kalman(&mut frame),
        }
        frame
    }

    /// Smooth a whole recording in order
    pub fn smooth_all(&mut self, frames: impl IntoIterator<Item = JointFrame>) -> Vec<JointFrame> {
        frames.into_iter().map(|frame| self.smooth(frame)).collect()
    }

    fn apply_moving_average(&mut self, frame: &mut JointFrame) {
        self.history.push_back(frame.clone());
        while self.history.len() > self.config.window_size {
            self.history.pop_front();
        }

        for (index, joint) in frame.joints.iter_mut() {
            if !joint.is_valid(self.min_confidence) {
                continue;
            }

            let mut sum = [0.0; 3];
            let mut count = 0;
            for past in &self.history {
                if let Some(past_joint) = past.get_valid(*index, self.min_confidence) {
                    sum[0] += past_joint.x;
                    sum[1] += past_joint.y;
                    sum[2] += past_joint.z;
                    count += 1;
                }
            }

            if count > 0 {
                let count = count as f64;
                joint.x = sum[0] / count;
                joint.y = sum[1] / count;
                joint.z = sum[2] / count;
            }
        }
    }

    fn apply_kalman(&mut self, frame: &mut JointFrame) {
        let (q, r) = (self.config.process_noise, self.config.measurement_noise);

        for (index, joint) in frame.joints.iter_mut() {
            if !joint.is_valid(self.min_confidence) {
                continue;
            }

            for (axis, coordinate) in [&mut joint.x, &mut joint.y, &mut joint.z]
                .into_iter()
                .enumerate()
            {
                // First valid observation seeds the filter
                let state = self
                    .kalman_states
                    .entry((*index, axis))
                    .or_insert_with(|| KalmanState::new(*coordinate, q, r));
                *coordinate = state.update(*coordinate);
            }
        }
    }

    /// Reset temporal smoothing state
    pub fn reset(&mut self) {
        self.history.clear();
        self.kalman_states.clear();
    }
}
