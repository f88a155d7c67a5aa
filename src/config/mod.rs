use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{AngleTriplet, Connections, JointTopology};

/// Configuration shipped with the crate
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid `{key}`: {reason}")]
    Invalid { key: String, reason: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Summary statistic taken over each sliding window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatistic {
    /// Moving average
    #[default]
    Mean,
    /// Peak-to-trough range inside the window
    Range,
    /// Population standard deviation inside the window
    StdDev,
}

/// Parameters of the segmentation engine (`[segmentation_parameters]`)
///
/// The five numeric fields are required; there is no default for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationParameters {
    /// Number of angle channels combined per frame
    pub signal_features: usize,
    /// Sliding window length in frames
    pub sliding_window_scaler: usize,
    /// Window step in frames
    pub stride: usize,
    /// Boundary merge distance as a fraction of the recording length
    pub tolerance: f64,
    /// Multiplier on the reference amplitude for boundary acceptance
    pub threshold_height_scaler: f64,

    /// Angle names feeding the composite signal. Filled in during
    /// validation when left empty.
    #[serde(default)]
    pub channels: Vec<String>,

    #[serde(default)]
    pub window_statistic: WindowStatistic,

    /// Joints below this confidence count as missing
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_min_confidence() -> f64 {
    0.5
}

impl SegmentationParameters {
    fn validate(&mut self, topology: &JointTopology) -> Result<(), ConfigError> {
        const SECTION: &str = "segmentation_parameters";
        let key = |field: &str| format!("{}.{}", SECTION, field);

        if self.signal_features == 0 {
            return Err(ConfigError::invalid(key("signal_features"), "must be at least 1"));
        }
        if self.sliding_window_scaler == 0 {
            return Err(ConfigError::invalid(key("sliding_window_scaler"), "must be at least 1"));
        }
        if self.stride == 0 {
            return Err(ConfigError::invalid(key("stride"), "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(ConfigError::invalid(
                key("tolerance"),
                format!("{} is not a fraction in [0, 1]", self.tolerance),
            ));
        }
        if !self.threshold_height_scaler.is_finite() || self.threshold_height_scaler < 0.0 {
            return Err(ConfigError::invalid(
                key("threshold_height_scaler"),
                "must be a finite, non-negative number",
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(ConfigError::invalid(key("min_confidence"), "must be in [0, 1]"));
        }

        self.channels = self.select_channels(topology)?;
        Ok(())
    }

    // Explicit `channels` win; otherwise the first `signal_features` angle
    // names in lexicographic order.
    fn select_channels(&self, topology: &JointTopology) -> Result<Vec<String>, ConfigError> {
        if self.channels.is_empty() {
            let available = topology.angles().len();
            if self.signal_features > available {
                return Err(ConfigError::invalid(
                    "segmentation_parameters.signal_features",
                    format!("{} channels requested but only {} angles configured", self.signal_features, available),
                ));
            }
            return Ok(topology
                .angle_names()
                .take(self.signal_features)
                .map(str::to_string)
                .collect());
        }

        if self.channels.len() != self.signal_features {
            return Err(ConfigError::invalid(
                "segmentation_parameters.channels",
                format!(
                    "{} channels listed but signal_features is {}",
                    self.channels.len(),
                    self.signal_features
                ),
            ));
        }
        for (position, name) in self.channels.iter().enumerate() {
            if topology.angle(name).is_none() {
                return Err(ConfigError::invalid(
                    "segmentation_parameters.channels",
                    format!("unknown angle `{}`", name),
                ));
            }
            if self.channels[..position].contains(name) {
                return Err(ConfigError::invalid(
                    "segmentation_parameters.channels",
                    format!("angle `{}` listed twice", name),
                ));
            }
        }
        Ok(self.channels.clone())
    }
}

/// Temporal smoothing method applied to joint coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    #[default]
    None,
    MovingAverage,
    Kalman,
}

/// Temporal smoothing configuration (`[smoothing]`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothingConfig {
    #[serde(default)]
    pub method: SmoothingMethod,
    /// Window size for moving average
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Kalman process noise
    #[serde(default = "default_process_noise")]
    pub process_noise: f64,
    /// Kalman measurement noise
    #[serde(default = "default_measurement_noise")]
    pub measurement_noise: f64,
}

fn default_window_size() -> usize {
    5
}

fn default_process_noise() -> f64 {
    0.01
}

fn default_measurement_noise() -> f64 {
    0.1
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            method: SmoothingMethod::default(),
            window_size: default_window_size(),
            process_noise: default_process_noise(),
            measurement_noise: default_measurement_noise(),
        }
    }
}

impl SmoothingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::invalid("smoothing.window_size", "must be at least 1"));
        }
        let positive = |noise: f64| noise.is_finite() && noise > 0.0;
        if !positive(self.process_noise) || !positive(self.measurement_noise) {
            return Err(ConfigError::invalid("smoothing", "Kalman noise terms must be positive"));
        }
        Ok(())
    }
}

/// Reference angles at the start and finish of one repetition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExercisePhases {
    pub start: BTreeMap<String, f64>,
    pub finish: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExerciseDocument {
    phases: ExercisePhases,
}

#[derive(Debug, Clone, Deserialize)]
struct TopologyDocument {
    joints: BTreeMap<String, String>,
    #[serde(default)]
    connections: Connections,
    angles: BTreeMap<String, AngleTriplet>,
}

impl TopologyDocument {
    fn into_topology(self) -> Result<JointTopology, ConfigError> {
        let joints = self
            .joints
            .into_iter()
            .map(|(index, label)| {
                index
                    .trim()
                    .parse::<u32>()
                    .map(|index| (index, label))
                    .map_err(|_| {
                        ConfigError::invalid(
                            "mediapipe.joints",
                            format!("`{}` is not a landmark index", index),
                        )
                    })
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        JointTopology::new(joints, self.connections, self.angles)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConfigDocument {
    segmentation_parameters: SegmentationParameters,
    mediapipe: TopologyDocument,
    #[serde(default)]
    smoothing: SmoothingConfig,
    #[serde(default)]
    exercises: BTreeMap<String, ExerciseDocument>,
}

/// Validated, immutable pipeline configuration
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub segmentation_parameters: SegmentationParameters,
    #[serde(rename = "mediapipe")]
    pub topology: JointTopology,
    pub smoothing: SmoothingConfig,
    pub exercises: BTreeMap<String, ExercisePhases>,
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let document: ConfigDocument = toml::from_str(contents)?;

        let topology = document.mediapipe.into_topology()?;
        let mut segmentation_parameters = document.segmentation_parameters;
        segmentation_parameters.validate(&topology)?;
        document.smoothing.validate()?;

        let exercises = document
            .exercises
            .into_iter()
            .map(|(name, exercise)| {
                validate_phases(&name, &exercise.phases, &topology)?;
                Ok((name, exercise.phases))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        Ok(Self {
            segmentation_parameters,
            topology,
            smoothing: document.smoothing,
            exercises,
        })
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The configuration shipped with the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Reference phases for a named exercise
    pub fn exercise(&self, name: &str) -> Option<&ExercisePhases> {
        self.exercises.get(name)
    }
}

fn validate_phases(
    name: &str,
    phases: &ExercisePhases,
    topology: &JointTopology,
) -> Result<(), ConfigError> {
    let key = format!("exercises.{}.phases", name);

    if phases.start.is_empty() {
        return Err(ConfigError::invalid(key, "start angles are empty"));
    }
    if !phases.start.keys().eq(phases.finish.keys()) {
        return Err(ConfigError::invalid(key, "start and finish must list the same angles"));
    }
    if let Some(unknown) = phases.start.keys().find(|angle| topology.angle(angle).is_none()) {
        return Err(ConfigError::invalid(key, format!("unknown angle `{}`", unknown)));
    }

    // Progress is normalised by the first angle's travel.
    if let Some((first, start)) = phases.start.iter().next() {
        let finish = phases.finish.get(first).copied().unwrap_or(*start);
        if (start - finish).abs() < f64::EPSILON {
            return Err(ConfigError::invalid(
                key,
                format!("start and finish of `{}` must differ", first),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [segmentation_parameters]
        signal_features = 2
        sliding_window_scaler = 3
        stride = 1
        tolerance = 0.005
        threshold_height_scaler = 1.5

        [mediapipe.joints]
        11 = "left_shoulder"
        13 = "left_elbow"
        15 = "left_wrist"
        23 = "left_hip"
        25 = "left_knee"
        27 = "left_ankle"

        [mediapipe.connections]
        torso = [[11, 13], [13, 15]]

        [mediapipe.angles]
        left_knee = [23, 25, 27]
        left_elbow = [11, 13, 15]
        left_hip = [11, 23, 25]
    "#;

    #[test]
    fn test_builtin_config() {
        let config = Config::builtin().unwrap();
        let params = &config.segmentation_parameters;
        assert_eq!(params.tolerance, 0.005);
        assert_eq!(params.channels.len(), params.signal_features);
        assert_eq!(config.topology.label(25), Some("left_knee"));
        assert!(config.exercise("squat").is_some());
    }

    #[test]
    fn test_default_channel_selection_is_lexicographic() {
        let config = Config::from_toml_str(MINIMAL).unwrap();
        assert_eq!(
            config.segmentation_parameters.channels,
            vec!["left_elbow".to_string(), "left_hip".to_string()]
        );
        assert_eq!(config.segmentation_parameters.window_statistic, WindowStatistic::Mean);
        assert_eq!(config.segmentation_parameters.min_confidence, 0.5);
        assert_eq!(config.smoothing.method, SmoothingMethod::None);
    }

    #[test]
    fn test_missing_required_parameter_is_fatal() {
        let broken = MINIMAL.replace("stride = 1", "");
        let err = Config::from_toml_str(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("stride"));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let broken = MINIMAL.replace("tolerance = 0.005", "tolerance = 1.5");
        assert!(matches!(
            Config::from_toml_str(&broken),
            Err(ConfigError::Invalid { ref key, .. }) if key == "segmentation_parameters.tolerance"
        ));

        let broken = MINIMAL.replace("sliding_window_scaler = 3", "sliding_window_scaler = 0");
        assert!(Config::from_toml_str(&broken).is_err());

        let broken = MINIMAL.replace("signal_features = 2", "signal_features = 4");
        assert!(Config::from_toml_str(&broken).is_err());
    }

    #[test]
    fn test_rejects_non_finite_kalman_noise() {
        for noise in ["nan", "inf", "0.0"] {
            let config = format!(
                "{}\n[smoothing]\nmethod = \"kalman\"\nprocess_noise = {}\n",
                MINIMAL, noise
            );
            assert!(matches!(
                Config::from_toml_str(&config),
                Err(ConfigError::Invalid { ref key, .. }) if key == "smoothing"
            ));
        }

        let config = format!("{}\n[smoothing]\nmethod = \"kalman\"\nmeasurement_noise = nan\n", MINIMAL);
        assert!(Config::from_toml_str(&config).is_err());
    }

    #[test]
    fn test_explicit_channels_must_match_count() {
        let listed = MINIMAL.replace(
            "threshold_height_scaler = 1.5",
            "threshold_height_scaler = 1.5\nchannels = [\"left_knee\", \"left_hip\"]",
        );
        let config = Config::from_toml_str(&listed).unwrap();
        assert_eq!(config.segmentation_parameters.channels[0], "left_knee");

        let wrong = MINIMAL.replace(
            "threshold_height_scaler = 1.5",
            "threshold_height_scaler = 1.5\nchannels = [\"left_knee\"]",
        );
        assert!(Config::from_toml_str(&wrong).is_err());

        let unknown = MINIMAL.replace(
            "threshold_height_scaler = 1.5",
            "threshold_height_scaler = 1.5\nchannels = [\"left_knee\", \"neck\"]",
        );
        assert!(Config::from_toml_str(&unknown).is_err());
    }

    #[test]
    fn test_rejects_non_numeric_joint_key() {
        let broken = MINIMAL.replace("11 = \"left_shoulder\"", "shoulder = \"left_shoulder\"");
        assert!(matches!(
            Config::from_toml_str(&broken),
            Err(ConfigError::Invalid { ref key, .. }) if key == "mediapipe.joints"
        ));
    }

    #[test]
    fn test_exercise_phases_validated() {
        let with_exercise = format!(
            "{}\n[exercises.curl.phases]\nstart = {{ left_elbow = 160.0 }}\nfinish = {{ left_elbow = 40.0 }}\n",
            MINIMAL
        );
        let config = Config::from_toml_str(&with_exercise).unwrap();
        assert_eq!(config.exercise("curl").unwrap().finish["left_elbow"], 40.0);

        let mismatched = format!(
            "{}\n[exercises.curl.phases]\nstart = {{ left_elbow = 160.0 }}\nfinish = {{ left_knee = 40.0 }}\n",
            MINIMAL
        );
        assert!(Config::from_toml_str(&mismatched).is_err());
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
