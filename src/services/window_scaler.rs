/// Sliding-window scaling of the composite signal
///
/// Windows that would run past the end of the signal are dropped, so the
/// output length only depends on the input length, the window and the stride.

use statrs::statistics::Statistics;

use crate::config::{SegmentationParameters, WindowStatistic};
use crate::error::SegmentationError;
use crate::models::{CompositeSignal, ScaledSignal};

/// Number of full windows that fit in `input_len` samples
pub fn output_len(input_len: usize, window: usize, stride: usize) -> usize {
    if window == 0 || stride == 0 || input_len < window {
        return 0;
    }
    (input_len - window) / stride + 1
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowScaler {
    window: usize,
    stride: usize,
    statistic: WindowStatistic,
}

impl WindowScaler {
    /// Window and stride are clamped to at least one sample
    pub fn new(window: usize, stride: usize, statistic: WindowStatistic) -> Self {
        Self {
            window: window.max(1),
            stride: stride.max(1),
            statistic,
        }
    }

    pub fn from_parameters(params: &SegmentationParameters) -> Self {
        Self::new(
            params.sliding_window_scaler,
            params.stride,
            params.window_statistic,
        )
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Slide the window over `signal`
    ///
    /// Fails with `InsufficientData` when the signal is shorter than one window.
    pub fn scale(&self, signal: &CompositeSignal) -> Result<ScaledSignal, SegmentationError> {
        if signal.len() < self.window {
            return Err(SegmentationError::InsufficientData {
                samples: signal.len(),
                window: self.window,
            });
        }

        let samples: Vec<f64> = signal
            .samples
            .windows(self.window)
            .step_by(self.stride)
            .map(|window| self.summarise(window))
            .collect();

        debug_assert_eq!(samples.len(), output_len(signal.len(), self.window, self.stride));

        Ok(ScaledSignal {
            samples,
            window: self.window,
            stride: self.stride,
            source_len: signal.len(),
        })
    }

    fn summarise(&self, window: &[f64]) -> f64 {
        match self.statistic {
            WindowStatistic::Mean => window.mean(),
            WindowStatistic::Range => Statistics::max(window) - Statistics::min(window),
            WindowStatistic::StdDev => window.population_std_dev(),
        }
    }
}
