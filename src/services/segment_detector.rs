/// Segment Detection Service
///
/// Cuts a scaled signal into motion segments:
/// 1. Reference amplitude = peak-to-trough range of the scaled signal
/// 2. Extrema are searched on the rate of change `d[i] = s[i + 1] - s[i]`,
///    so boundaries land on rising and falling edges
/// 3. An extremum is kept when its prominence reaches
///    `threshold_height_scaler * reference`
/// 4. Boundaries closer than `tolerance * frames` are merged
/// 5. Boundaries become half-open segments covering the whole recording

use ndarray::ArrayView1;
use ndarray_stats::QuantileExt;

use crate::config::SegmentationParameters;
use crate::models::{Boundary, ScaledSignal, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Maximum,
    Minimum,
}

/// Local extremum of a sequence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extremum {
    /// First index of the plateau the extremum sits on
    pub index: usize,
    pub value: f64,
    pub kind: ExtremumKind,
    /// Smaller swing to the adjacent opposite extrema
    pub prominence: f64,
}

/// Relative difference below which neighbouring samples count as equal
pub const FLAT_TOLERANCE: f64 = 1e-9;

/// Peak-to-trough range of the samples, 0 when undefined
pub fn reference_amplitude(samples: &[f64]) -> f64 {
    let view = ArrayView1::from(samples);
    match (view.min(), view.max()) {
        (Ok(min), Ok(max)) => max - min,
        _ => 0.0,
    }
}

/// Find interior local maxima and minima with their prominence
///
/// Runs of equal values are collapsed and reported at their earliest index.
/// Values within a relative `FLAT_TOLERANCE` of a run's first value join
/// the run, so rounding noise on a ramp does not split it.
/// A run is a maximum (minimum) when both neighbouring runs are lower
/// (higher); runs touching either end of the sequence never qualify.
///
/// Prominence is the smaller swing to the adjacent opposite extrema. A side
/// without one is ignored; an isolated extremum is measured against the
/// first and last values of the sequence.
pub fn find_extrema(values: &[f64]) -> Vec<Extremum> {
    let scale = values.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
    let flat = scale * FLAT_TOLERANCE;

    let mut runs: Vec<(usize, f64)> = Vec::new();
    for (index, &value) in values.iter().enumerate() {
        if runs.last().map_or(true, |&(_, last)| (value - last).abs() > flat) {
            runs.push((index, value));
        }
    }

    let mut extrema: Vec<Extremum> = runs
        .windows(3)
        .filter_map(|triple| {
            let [(_, left), (index, value), (_, right)] = [triple[0], triple[1], triple[2]];
            let kind = if left < value && right < value {
                ExtremumKind::Maximum
            } else if left > value && right > value {
                ExtremumKind::Minimum
            } else {
                return None;
            };
            Some(Extremum {
                index,
                value,
                kind,
                prominence: 0.0,
            })
        })
        .collect();

    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return extrema;
    };
    let peaks: Vec<f64> = extrema.iter().map(|extremum| extremum.value).collect();
    for (position, extremum) in extrema.iter_mut().enumerate() {
        let left = position.checked_sub(1).map(|previous| peaks[previous]);
        let right = peaks.get(position + 1).copied();

        let bases: Vec<f64> = match (left, right) {
            (None, None) => vec![first, last],
            (left, right) => left.into_iter().chain(right).collect(),
        };
        extremum.prominence = bases
            .into_iter()
            .map(|base| (extremum.value - base).abs())
            .fold(f64::INFINITY, f64::min);
    }

    extrema
}

/// Collapse boundaries closer than `min_distance` frames
///
/// The boundary with the greater prominence survives; ties keep the earlier one.
pub fn merge_boundaries(mut boundaries: Vec<Boundary>, min_distance: f64) -> Vec<Boundary> {
    boundaries.sort_by_key(|boundary| boundary.frame);

    let mut merged: Vec<Boundary> = Vec::with_capacity(boundaries.len());
    for boundary in boundaries {
        match merged.last_mut() {
            Some(last) if ((boundary.frame - last.frame) as f64) < min_distance => {
                if boundary.prominence > last.prominence {
                    *last = boundary;
                }
            }
            _ => merged.push(boundary),
        }
    }
    merged
}

/// Turn sorted boundaries into segments over `[0, frames)`
fn segments_from(boundaries: &[Boundary], frames: usize) -> Vec<Segment> {
    let mut cuts = vec![0];
    cuts.extend(
        boundaries
            .iter()
            .map(|boundary| boundary.frame)
            .filter(|frame| *frame > 0 && *frame < frames),
    );
    cuts.push(frames);
    cuts.dedup();

    cuts.windows(2)
        .enumerate()
        .map(|(position, pair)| Segment::new(position + 1, pair[0], pair[1]))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentDetector {
    threshold_height_scaler: f64,
    tolerance: f64,
}

impl SegmentDetector {
    pub fn new(threshold_height_scaler: f64, tolerance: f64) -> Self {
        Self {
            threshold_height_scaler,
            tolerance,
        }
    }

    pub fn from_parameters(params: &SegmentationParameters) -> Self {
        Self::new(params.threshold_height_scaler, params.tolerance)
    }

    /// Boundary candidates before merging, in source frames
    ///
    /// Only rising edges (rate maxima above zero) and falling edges (rate
    /// minima below zero) qualify.
    pub fn candidates(&self, scaled: &ScaledSignal) -> Vec<Boundary> {
        if scaled.len() < 2 {
            return Vec::new();
        }

        let threshold = self.threshold_height_scaler * reference_amplitude(&scaled.samples);
        let rate: Vec<f64> = scaled
            .samples
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .collect();

        find_extrema(&rate)
            .into_iter()
            .filter(|extremum| match extremum.kind {
                ExtremumKind::Maximum => extremum.value > 0.0,
                ExtremumKind::Minimum => extremum.value < 0.0,
            })
            .filter(|extremum| extremum.prominence > 0.0 && extremum.prominence >= threshold)
            .map(|extremum| Boundary {
                // rate[i] describes the step into sample i + 1
                frame: scaled.frame_of(extremum.index + 1),
                prominence: extremum.prominence,
            })
            .collect()
    }

    /// Merged boundaries in source frames
    pub fn boundaries(&self, scaled: &ScaledSignal) -> Vec<Boundary> {
        let min_distance = self.tolerance * scaled.source_len as f64;
        merge_boundaries(self.candidates(scaled), min_distance)
    }

    /// Segment the scaled signal
    ///
    /// An empty signal gives no segments; fewer than two boundaries give a
    /// single segment over the whole recording.
    pub fn detect(&self, scaled: &ScaledSignal) -> Vec<Segment> {
        if scaled.is_empty() || scaled.source_len == 0 {
            return Vec::new();
        }
        self.segments_for(&self.boundaries(scaled), scaled)
    }

    /// Segments from boundaries already found for `scaled`
    pub fn segments_for(&self, boundaries: &[Boundary], scaled: &ScaledSignal) -> Vec<Segment> {
        if scaled.is_empty() || scaled.source_len == 0 {
            return Vec::new();
        }

        tracing::debug!(
            "Detected {} boundaries over {} scaled samples",
            boundaries.len(),
            scaled.len()
        );

        if boundaries.len() < 2 {
            return vec![Segment::new(1, 0, scaled.source_len)];
        }
        segments_from(boundaries, scaled.source_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn boundary(frame: usize, prominence: f64) -> Boundary {
        Boundary { frame, prominence }
    }

    #[test]
    fn test_reference_amplitude() {
        assert_eq!(reference_amplitude(&[0.0, 5.0, 2.0]), 5.0);
        assert_eq!(reference_amplitude(&[]), 0.0);
    }

    #[test]
    fn test_find_extrema_plateau_earliest_index() {
        let extrema = find_extrema(&[0.0, 2.0, 2.0, 2.0, 1.0]);
        let maximum = extrema
            .iter()
            .find(|extremum| extremum.kind == ExtremumKind::Maximum)
            .unwrap();
        assert_eq!(maximum.index, 1);
        // Isolated, so measured against the ends: min(2 - 0, 2 - 1)
        assert_eq!(maximum.prominence, 1.0);
    }

    #[test]
    fn test_find_extrema_rounding_noise_is_flat() {
        let rate = [0.0, 1.6, 1.6 + 2e-16, 1.6 - 2e-16, 1.6, 0.0, -1.6, 0.0];
        let extrema = find_extrema(&rate);
        assert_eq!(extrema.len(), 2);
        assert_eq!(extrema[0].index, 1);
        assert_eq!(extrema[0].kind, ExtremumKind::Maximum);
        assert!((extrema[0].prominence - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_find_extrema_flat_has_none() {
        assert!(find_extrema(&[3.0; 6]).is_empty());
        assert!(find_extrema(&[]).is_empty());
    }

    #[test]
    fn test_find_extrema_ignores_edges() {
        let extrema = find_extrema(&[5.0, 1.0, 3.0, 0.0]);
        let indices: Vec<usize> = extrema.iter().map(|extremum| extremum.index).collect();
        assert_eq!(indices, vec![1, 2]);
        assert_eq!(extrema[0].kind, ExtremumKind::Minimum);
        assert_eq!(extrema[1].prominence, 2.0);
    }

    #[test]
    fn test_step_signal_gives_three_segments() {
        let scaled = ScaledSignal::from_samples(vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 0.0, 0.0, 0.0]);
        let detector = SegmentDetector::new(1.5, 0.01);

        let frames: Vec<usize> = detector.candidates(&scaled).iter().map(|b| b.frame).collect();
        assert_eq!(frames, vec![3, 6]);

        assert_eq!(
            detector.detect(&scaled),
            vec![
                Segment::new(1, 0, 3),
                Segment::new(2, 3, 6),
                Segment::new(3, 6, 9),
            ]
        );
    }

    #[test]
    fn test_flat_signal_single_segment() {
        let scaled = ScaledSignal::from_samples(vec![2.0; 12]);
        let detector = SegmentDetector::new(0.5, 0.005);
        assert_eq!(detector.detect(&scaled), vec![Segment::new(1, 0, 12)]);
    }

    #[test]
    fn test_empty_signal_no_segments() {
        let scaled = ScaledSignal::from_samples(Vec::new());
        assert!(SegmentDetector::new(0.5, 0.005).detect(&scaled).is_empty());
    }

    #[test]
    fn test_single_boundary_single_segment() {
        let scaled = ScaledSignal::from_samples(vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0]);
        let detector = SegmentDetector::new(0.5, 0.0);
        assert_eq!(detector.boundaries(&scaled).len(), 1);
        assert_eq!(detector.detect(&scaled), vec![Segment::new(1, 0, 6)]);
    }

    #[test]
    fn test_threshold_filters_small_steps() {
        let scaled = ScaledSignal::from_samples(vec![0.0, 0.0, 10.0, 10.0, 9.0, 9.0, 0.0, 0.0]);
        let detector = SegmentDetector::new(0.5, 0.0);
        let frames: Vec<usize> = detector.candidates(&scaled).iter().map(|b| b.frame).collect();
        // The 10 -> 9 wobble never reaches half the range
        assert_eq!(frames, vec![2, 6]);
    }

    #[test]
    fn test_plateau_between_rises_is_not_a_boundary() {
        let scaled = ScaledSignal::from_samples(vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 10.0, 10.0, 10.0]);
        let detector = SegmentDetector::new(0.4, 0.0);
        let frames: Vec<usize> = detector.candidates(&scaled).iter().map(|b| b.frame).collect();
        assert_eq!(frames, vec![3, 6]);
    }

    #[test]
    fn test_merge_keeps_stronger_boundary() {
        let merged = merge_boundaries(
            vec![boundary(10, 1.0), boundary(12, 3.0), boundary(40, 2.0)],
            5.0,
        );
        assert_eq!(merged, vec![boundary(12, 3.0), boundary(40, 2.0)]);
    }

    #[test]
    fn test_merge_tie_keeps_earlier() {
        let merged = merge_boundaries(vec![boundary(12, 2.0), boundary(10, 2.0)], 5.0);
        assert_eq!(merged, vec![boundary(10, 2.0)]);
    }

    #[test]
    fn test_merge_distance_is_strict() {
        assert_eq!(merge_boundaries(vec![boundary(10, 1.0), boundary(15, 2.0)], 5.0).len(), 2);
        assert_eq!(merge_boundaries(vec![boundary(10, 1.0), boundary(14, 2.0)], 5.0).len(), 1);
    }

    #[test]
    fn test_boundaries_mapped_through_window() {
        let scaled = ScaledSignal {
            samples: vec![0.0, 0.0, 4.0, 4.0, 0.0, 0.0],
            window: 3,
            stride: 2,
            source_len: 13,
        };
        let detector = SegmentDetector::new(0.5, 0.0);
        let frames: Vec<usize> = detector.boundaries(&scaled).iter().map(|b| b.frame).collect();
        // Scaled indices 2 and 4 anchored at k * 2 + 1
        assert_eq!(frames, vec![5, 9]);
        assert_eq!(detector.detect(&scaled).last().unwrap().end_frame, 13);
    }

    #[test]
    fn test_segments_for_reuses_boundaries() {
        let scaled = ScaledSignal::from_samples(vec![0.0, 0.0, 0.0, 5.0, 5.0, 5.0, 0.0, 0.0, 0.0]);
        let detector = SegmentDetector::new(1.5, 0.01);

        let boundaries = detector.boundaries(&scaled);
        assert_eq!(detector.segments_for(&boundaries, &scaled), detector.detect(&scaled));
        assert_eq!(
            detector.segments_for(&boundaries[..1], &scaled),
            vec![Segment::new(1, 0, 9)]
        );
        assert!(detector
            .segments_for(&boundaries, &ScaledSignal::from_samples(Vec::new()))
            .is_empty());
    }
}
