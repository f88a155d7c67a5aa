/// Angle Extraction Service
///
/// Measures every named angle of the topology on every frame:
/// - Limb vectors run from the vertex joint to both endpoints
/// - The angle is `acos(dot / (|v1| |v2|))`, reported in degrees
/// - Missing or low-confidence joints yield NaN instead of an error

use std::borrow::Borrow;
use std::collections::BTreeMap;

use crate::error::SegmentationError;
use crate::models::{AngleSeries, AngleTriplet, Joint, JointFrame, JointTopology};

/// Default minimum joint confidence
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Calculate the angle at `vertex` formed by `point_a` and `point_c`
///
/// # Returns
/// Angle in degrees within [0, 180], or `None` when either limb vector has
/// zero length.
pub fn joint_angle(point_a: &Joint, vertex: &Joint, point_c: &Joint) -> Option<f64> {
    let ba = point_a.relative_to(vertex);
    let bc = point_c.relative_to(vertex);

    let dot_product: f64 = ba.iter().zip(bc.iter()).map(|(a, c)| a * c).sum();
    let mag_ba = ba.iter().map(|v| v * v).sum::<f64>().sqrt();
    let mag_bc = bc.iter().map(|v| v * v).sum::<f64>().sqrt();

    if mag_ba == 0.0 || mag_bc == 0.0 {
        return None;
    }

    let cos_angle = dot_product / (mag_ba * mag_bc);
    Some(cos_angle.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Per-frame joint angle extractor bound to a topology
pub struct AngleExtractor<'a> {
    topology: &'a JointTopology,
    /// Minimum confidence threshold for valid joints
    min_confidence: f64,
}

impl<'a> AngleExtractor<'a> {
    pub fn new(topology: &'a JointTopology) -> Self {
        Self {
            topology,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    /// Set minimum confidence threshold
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence.clamp(0.0, 1.0);
        self
    }

    /// Measure one triplet on one frame
    ///
    /// Fails with `MissingJoint` when a joint is absent or below confidence.
    /// Degenerate geometry (coincident joints) gives `Ok(NaN)`.
    pub fn try_angle(
        &self,
        frame: &JointFrame,
        triplet: &AngleTriplet,
    ) -> Result<f64, SegmentationError> {
        let lookup = |joint: u32| {
            frame
                .get_valid(joint, self.min_confidence)
                .ok_or(SegmentationError::MissingJoint {
                    frame: frame.frame,
                    joint,
                })
        };

        let [a, vertex, c] = *triplet;
        let (point_a, point_b, point_c) = (lookup(a)?, lookup(vertex)?, lookup(c)?);

        Ok(joint_angle(point_a, point_b, point_c).unwrap_or(f64::NAN))
    }

    /// All named angles for one frame, NaN where a joint is missing
    pub fn compute(&self, frame: &JointFrame) -> BTreeMap<String, f64> {
        self.topology
            .angle_names()
            .zip(self.compute_row(frame))
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// All named angles for one frame in topology order
    pub fn compute_row(&self, frame: &JointFrame) -> Vec<f64> {
        self.topology
            .angles()
            .iter()
            .map(|(name, triplet)| match self.try_angle(frame, triplet) {
                Ok(value) => value,
                Err(err) => {
                    tracing::trace!("Angle {} unavailable: {}", name, err);
                    f64::NAN
                }
            })
            .collect()
    }

    /// Angle series over a whole recording
    pub fn extract<I>(&self, frames: I) -> AngleSeries
    where
        I: IntoIterator,
        I::Item: Borrow<JointFrame>,
    {
        let names = self.topology.angle_names().map(str::to_string).collect();
        let rows = frames
            .into_iter()
            .map(|frame| {
                let frame = frame.borrow();
                (frame.frame, self.compute_row(frame))
            })
            .collect();

        AngleSeries::from_rows(names, rows)
    }
}
