/// Time-series containers passed between pipeline stages

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// One angle measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleSample {
    pub frame: usize,
    pub name: String,
    /// Degrees in [0, 180], NaN when the angle could not be measured
    pub value: f64,
}

/// Joint angles over a recording, one column per named angle
///
/// Rows follow frame order; `names` follows the topology's angle order.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSeries {
    names: Vec<String>,
    frames: Vec<usize>,
    values: Array2<f64>,
}

impl AngleSeries {
    /// Build a series from per-frame angle rows
    ///
    /// Every row must hold one value per name, in `names` order.
    pub fn from_rows(names: Vec<String>, rows: Vec<(usize, Vec<f64>)>) -> Self {
        let width = names.len();
        let mut frames = Vec::with_capacity(rows.len());
        let mut flat = Vec::with_capacity(rows.len() * width);
        for (frame, mut row) in rows {
            row.resize(width, f64::NAN);
            frames.push(frame);
            flat.extend(row);
        }
        let values = Array2::from_shape_vec((frames.len(), width), flat)
            .unwrap_or_else(|_| Array2::from_elem((0, width), f64::NAN));

        Self {
            names,
            frames,
            values,
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Values of one named angle across all frames
    pub fn channel(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let column = self.names.iter().position(|candidate| candidate == name)?;
        Some(self.values.column(column))
    }

    /// Angles of one frame row, in `names` order
    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.len()).then(|| self.values.index_axis(Axis(0), index))
    }

    /// Flatten into `(frame, name, degrees)` samples
    pub fn samples(&self) -> impl Iterator<Item = AngleSample> + '_ {
        self.frames.iter().enumerate().flat_map(move |(row, frame)| {
            self.names.iter().enumerate().map(move |(column, name)| AngleSample {
                frame: *frame,
                name: name.clone(),
                value: self.values[[row, column]],
            })
        })
    }

    /// Count of NaN entries per angle, in `names` order
    pub fn missing_counts(&self) -> Vec<usize> {
        self.values
            .columns()
            .into_iter()
            .map(|column| column.iter().filter(|value| value.is_nan()).count())
            .collect()
    }
}

/// One scalar per frame after channel aggregation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositeSignal {
    pub samples: Vec<f64>,
}

impl CompositeSignal {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Sliding-window output with the mapping back to source frames
///
/// Sample `k` summarises source frames `[k * stride, k * stride + window)`
/// and is anchored at the window centre, `k * stride + (window - 1) / 2`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledSignal {
    pub samples: Vec<f64>,
    pub window: usize,
    pub stride: usize,
    /// Length of the signal the windows were taken from
    pub source_len: usize,
}

impl ScaledSignal {
    /// Wrap samples that map one-to-one onto source frames
    pub fn from_samples(samples: Vec<f64>) -> Self {
        let source_len = samples.len();
        Self {
            samples,
            window: 1,
            stride: 1,
            source_len,
        }
    }

    /// Source frame a scaled sample is anchored at
    pub fn frame_of(&self, index: usize) -> usize {
        index * self.stride + self.window.saturating_sub(1) / 2
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
