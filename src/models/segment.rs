use serde::{Deserialize, Serialize};

/// A contiguous motion phase, half-open over source frames: `[start_frame, end_frame)`
///
/// Consecutive segments share the boundary frame (`end_frame` of one is the
/// `start_frame` of the next), so they never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// 1-based position of the segment in the recording
    pub repetition: usize,
    pub start_frame: usize,
    pub end_frame: usize,
}

impl Segment {
    pub fn new(repetition: usize, start_frame: usize, end_frame: usize) -> Self {
        debug_assert!(start_frame < end_frame);
        Self {
            repetition,
            start_frame,
            end_frame,
        }
    }

    /// Number of frames covered
    pub fn len(&self) -> usize {
        self.end_frame - self.start_frame
    }

    pub fn is_empty(&self) -> bool {
        self.start_frame >= self.end_frame
    }

    pub fn contains(&self, frame: usize) -> bool {
        (self.start_frame..self.end_frame).contains(&frame)
    }

    /// Duration in seconds at the given capture rate
    pub fn duration_secs(&self, fps: f64) -> f64 {
        self.len() as f64 / fps
    }
}

/// A detected change point before it is turned into segments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Boundary {
    /// Source frame the boundary falls on
    pub frame: usize,
    /// Swing of the rate-of-change extremum that produced it
    pub prominence: f64,
}
