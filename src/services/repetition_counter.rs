/// Repetition counting against reference exercise phases
///
/// Progress through a repetition is the mean drop of the tracked angles
/// from their start reference, normalised by the travel of the first angle
/// (`start - finish`) and clipped to [0, 1]. A repetition is counted when
/// progress reaches 1 (down) and then returns to 0 (up).

use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::ExercisePhases;

/// Where the athlete is within the current repetition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepetitionState {
    #[default]
    Up,
    Down,
}

/// Progress of one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RepetitionProgress {
    pub frame: usize,
    pub progress: f64,
    pub state: RepetitionState,
    pub repetitions: usize,
}

pub struct RepetitionCounter {
    angle_names: Vec<String>,
    start: Vec<f64>,
    finish: Vec<f64>,
    repetitions: usize,
    progress: f64,
    state: RepetitionState,
}

impl RepetitionCounter {
    pub fn new(phases: &ExercisePhases) -> Self {
        let angle_names: Vec<String> = phases.start.keys().cloned().collect();
        let start = phases.start.values().copied().collect();
        let finish = angle_names
            .iter()
            .map(|name| phases.finish.get(name).copied().unwrap_or(f64::NAN))
            .collect();

        Self {
            angle_names,
            start,
            finish,
            repetitions: 0,
            progress: 0.0,
            state: RepetitionState::Up,
        }
    }

    /// Normalised progress for one frame of angles
    ///
    /// Missing angles are ignored; if none of the tracked angles is present
    /// the previous progress is kept.
    pub fn progress_for(&self, angles: &BTreeMap<String, f64>) -> f64 {
        let travel = match (self.start.first(), self.finish.first()) {
            (Some(start), Some(finish)) => start - finish,
            _ => return self.progress,
        };

        let drops: Vec<f64> = self
            .angle_names
            .iter()
            .zip(&self.start)
            .filter_map(|(name, start)| {
                angles
                    .get(name)
                    .filter(|value| !value.is_nan())
                    .map(|value| start - value)
            })
            .collect();

        if drops.is_empty() || travel == 0.0 || !travel.is_finite() {
            return self.progress;
        }

        let mean_drop = drops.iter().sum::<f64>() / drops.len() as f64;
        (mean_drop / travel).clamp(0.0, 1.0)
    }

    /// Feed one frame of angles and advance the state machine
    pub fn update(&mut self, frame: usize, angles: &BTreeMap<String, f64>) -> RepetitionProgress {
        let progress = self.progress_for(angles);
        self.progress = progress;

        if progress >= 1.0 && self.state == RepetitionState::Up {
            self.state = RepetitionState::Down;
        } else if progress <= 0.0 && self.state == RepetitionState::Down {
            self.repetitions += 1;
            self.state = RepetitionState::Up;
            tracing::debug!("Repetition {} completed at frame {}", self.repetitions, frame);
        }

        RepetitionProgress {
            frame,
            progress,
            state: self.state,
            repetitions: self.repetitions,
        }
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    pub fn state(&self) -> RepetitionState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }
}
