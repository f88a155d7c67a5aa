/// Joint models for pose-estimator output
///
/// A `JointFrame` is one captured time step: every landmark the estimator
/// reported for that frame, keyed by landmark index.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single estimator landmark with its detection confidence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    /// X coordinate (world or normalized image space)
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate, 0 for 2D estimators
    #[serde(default)]
    pub z: f64,
    /// Detection confidence (0-1)
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl Joint {
    /// Create a 3D joint
    pub fn new(x: f64, y: f64, z: f64, confidence: f64) -> Self {
        Self {
            x,
            y,
            z,
            confidence,
        }
    }

    /// Create a 2D joint (z = 0)
    pub fn planar(x: f64, y: f64, confidence: f64) -> Self {
        Self::new(x, y, 0.0, confidence)
    }

    /// Check if the joint is usable at the given confidence threshold
    pub fn is_valid(&self, min_confidence: f64) -> bool {
        self.confidence >= min_confidence
            && self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
    }

    /// Vector from `origin` to this joint
    pub fn relative_to(&self, origin: &Joint) -> [f64; 3] {
        [self.x - origin.x, self.y - origin.y, self.z - origin.z]
    }

    /// Euclidean distance to another joint
    pub fn distance_to(&self, other: &Joint) -> f64 {
        let [dx, dy, dz] = self.relative_to(other);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Serialized joint entry (`{ "id": 11, "x": .., "y": .., "z": .., "confidence": .. }`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointRecord {
    pub id: u32,
    #[serde(flatten)]
    pub joint: Joint,
}

/// All joints reported for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "JointFrameRecord", into = "JointFrameRecord")]
pub struct JointFrame {
    /// Frame number in the recording
    pub frame: usize,
    /// Joints keyed by estimator landmark index
    pub joints: BTreeMap<u32, Joint>,
}

impl JointFrame {
    /// Create a frame from `(index, joint)` pairs
    pub fn new(frame: usize, joints: impl IntoIterator<Item = (u32, Joint)>) -> Self {
        Self {
            frame,
            joints: joints.into_iter().collect(),
        }
    }

    /// Get a joint by landmark index
    pub fn get(&self, index: u32) -> Option<&Joint> {
        self.joints.get(&index)
    }

    /// Get a joint only if it passes the confidence threshold
    pub fn get_valid(&self, index: u32, min_confidence: f64) -> Option<&Joint> {
        self.get(index).filter(|joint| joint.is_valid(min_confidence))
    }

    /// Keep only the landmarks accepted by `keep`
    pub fn retain(&mut self, mut keep: impl FnMut(u32) -> bool) {
        self.joints.retain(|index, _| keep(*index));
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct JointFrameRecord {
    frame: usize,
    joints: Vec<JointRecord>,
}

impl From<JointFrameRecord> for JointFrame {
    fn from(record: JointFrameRecord) -> Self {
        Self::new(
            record.frame,
            record.joints.into_iter().map(|entry| (entry.id, entry.joint)),
        )
    }
}

impl From<JointFrame> for JointFrameRecord {
    fn from(frame: JointFrame) -> Self {
        Self {
            frame: frame.frame,
            joints: frame
                .joints
                .into_iter()
                .map(|(id, joint)| JointRecord { id, joint })
                .collect(),
        }
    }
}

/// A full recording as produced by the pose estimator
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Recording {
    /// Optional capture frame rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    pub frames: Vec<JointFrame>,
}

impl Recording {
    pub fn new(frames: Vec<JointFrame>) -> Self {
        Self { fps: None, frames }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
