/// Skeletal topology: joint labels, bone connections and angle triplets
///
/// The topology is built once from configuration and shared read-only by
/// every stage of the pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ConfigError;

/// Highest landmark index emitted by the MediaPipe pose estimator
pub const MAX_LANDMARK_INDEX: u32 = 32;

/// MediaPipe pose landmark names (33 landmarks)
pub const MEDIAPIPE_LANDMARK_NAMES: [&str; 33] = [
    "nose",
    "left_eye_inner",
    "left_eye",
    "left_eye_outer",
    "right_eye_inner",
    "right_eye",
    "right_eye_outer",
    "left_ear",
    "right_ear",
    "mouth_left",
    "mouth_right",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_pinky",
    "right_pinky",
    "left_index",
    "right_index",
    "left_thumb",
    "right_thumb",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
    "left_heel",
    "right_heel",
    "left_foot_index",
    "right_foot_index",
];

/// A bone between two landmarks
pub type Connection = [u32; 2];

/// Angle triplet `[endpoint, vertex, endpoint]`
pub type AngleTriplet = [u32; 3];

/// Bone groups by body region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connections {
    #[serde(default)]
    pub head: Vec<Connection>,
    #[serde(default)]
    pub torso: Vec<Connection>,
}

impl Connections {
    /// All bones, head first
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.head.iter().chain(self.torso.iter())
    }
}

/// Validated, immutable skeletal topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JointTopology {
    joints: BTreeMap<u32, String>,
    connections: Connections,
    angles: BTreeMap<String, AngleTriplet>,
}

impl JointTopology {
    /// Build and validate a topology
    pub fn new(
        joints: BTreeMap<u32, String>,
        connections: Connections,
        angles: BTreeMap<String, AngleTriplet>,
    ) -> Result<Self, ConfigError> {
        let topology = Self {
            joints,
            connections,
            angles,
        };
        topology.validate()?;
        Ok(topology)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.angles.is_empty() {
            return Err(ConfigError::invalid("mediapipe.angles", "at least one angle is required"));
        }

        for (index, label) in &self.joints {
            if *index > MAX_LANDMARK_INDEX {
                return Err(ConfigError::invalid(
                    "mediapipe.joints",
                    format!("joint {} ({}) exceeds landmark index {}", index, label, MAX_LANDMARK_INDEX),
                ));
            }
        }

        for (region, bones) in [("head", &self.connections.head), ("torso", &self.connections.torso)] {
            for [a, b] in bones {
                let key = format!("mediapipe.connections.{}", region);
                self.check_index(&key, *a)?;
                self.check_index(&key, *b)?;
                if a == b {
                    return Err(ConfigError::invalid(key, format!("bone [{}, {}] connects a joint to itself", a, b)));
                }
            }
        }

        for (name, triplet) in &self.angles {
            let key = format!("mediapipe.angles.{}", name);
            for index in triplet {
                self.check_index(&key, *index)?;
            }
            let [a, vertex, c] = *triplet;
            if a == vertex || vertex == c || a == c {
                return Err(ConfigError::invalid(key, "angle joints must be distinct"));
            }
        }

        Ok(())
    }

    // Indices outside `joints` are fine as long as the estimator emits them.
    fn check_index(&self, key: &str, index: u32) -> Result<(), ConfigError> {
        if self.joints.contains_key(&index) || index <= MAX_LANDMARK_INDEX {
            Ok(())
        } else {
            Err(ConfigError::invalid(
                key,
                format!("joint index {} is not a known landmark", index),
            ))
        }
    }

    /// Configured joint labels
    pub fn joints(&self) -> &BTreeMap<u32, String> {
        &self.joints
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    /// Named angle triplets in lexicographic name order
    pub fn angles(&self) -> &BTreeMap<String, AngleTriplet> {
        &self.angles
    }

    pub fn angle(&self, name: &str) -> Option<&AngleTriplet> {
        self.angles.get(name)
    }

    pub fn angle_names(&self) -> impl Iterator<Item = &str> {
        self.angles.keys().map(String::as_str)
    }

    /// Semantic label for a landmark, falling back to the estimator's own name
    pub fn label(&self, index: u32) -> Option<&str> {
        self.joints
            .get(&index)
            .map(String::as_str)
            .or_else(|| MEDIAPIPE_LANDMARK_NAMES.get(index as usize).copied())
    }

    /// Every landmark the pipeline needs: labelled joints plus anything
    /// referenced by a bone or an angle
    pub fn referenced_joints(&self) -> BTreeSet<u32> {
        let mut indices: BTreeSet<u32> = self.joints.keys().copied().collect();
        indices.extend(self.connections.iter().flatten().copied());
        indices.extend(self.angles.values().flatten().copied());
        indices
    }
}
