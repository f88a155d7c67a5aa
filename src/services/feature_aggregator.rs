/// Feature Aggregation Service
///
/// Folds the selected angle channels into one composite value per frame.
/// The composite is the Euclidean distance, in degrees, between the current
/// posture and the posture of the first frame, measured over the selected
/// channels only.
///
/// Missing angles (NaN) are forward-filled; a gap at the start of a channel
/// takes the channel's first valid value. A channel without a single valid
/// sample is left out.

use ndarray::{Array1, ArrayView1};

use crate::models::{AngleSeries, CompositeSignal};

/// Aggregates a fixed, ordered set of angle channels
#[derive(Debug, Clone)]
pub struct FeatureAggregator {
    channels: Vec<String>,
}

impl FeatureAggregator {
    /// Create an aggregator over the given channels (`signal_features` names)
    pub fn new(channels: Vec<String>) -> Self {
        Self { channels }
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Combine the selected channels into one sample per frame
    pub fn aggregate(&self, series: &AngleSeries) -> CompositeSignal {
        let frames = series.len();
        let mut squared = Array1::<f64>::zeros(frames);
        let mut live_channels = 0;

        for name in &self.channels {
            let Some(channel) = series.channel(name) else {
                tracing::warn!("Channel {} not present in angle series, skipping", name);
                continue;
            };

            let Some(filled) = fill_gaps(channel) else {
                tracing::warn!("Channel {} has no valid samples, skipping", name);
                continue;
            };

            let baseline = filled[0];
            squared
                .iter_mut()
                .zip(filled.iter())
                .for_each(|(acc, value)| *acc += (value - baseline).powi(2));
            live_channels += 1;
        }

        if live_channels == 0 && frames > 0 {
            tracing::warn!("No usable channels, composite signal is flat");
        }

        CompositeSignal::new(squared.mapv(f64::sqrt).to_vec())
    }
}

/// Forward-fill NaN samples, back-filling any leading gap
///
/// Returns `None` when the channel has no valid sample at all.
pub fn fill_gaps(channel: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
    let first_valid = channel.iter().copied().find(|value| !value.is_nan())?;

    let mut last = first_valid;
    Some(channel.mapv(|value| {
        if !value.is_nan() {
            last = value;
        }
        last
    }))
}
