use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("error while accessing configuration")]
    IoError(#[from] std::io::Error),
    #[error("error while parsing json")]
    JsonError(#[from] serde_json::Error),
    #[error("error while parsing yaml")]
    YamlError(#[from] serde_yaml::Error),
    #[error("unknown configuration format {0:?}")]
    UnknownFormat(String),
    #[error("{field} must be a finite, non negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },
}

type Result<T> = std::result::Result<T, ConfigError>;

/// Converts a configured number of seconds, rejecting negative, NaN and infinite values
pub fn seconds(field: &'static str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { field, value })
}

lazy_static! {
    static ref INCLUDED: SkillConfig = {
        let json = include_str!("../config/skills.json");
        SkillConfig::parse_json(json).expect("bundled skill config is valid")
    };
}

/// Hardware ids of the two camera mounts
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CameraConfig {
    pub wrist: String,
    pub base: String,
}

/// Whether a failed run still tries to send the arm home
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HomingPolicy {
    /// Home only at the start and at the end of a successful run.
    /// A failure leaves the arm wherever it stopped.
    #[default]
    SuccessOnly,
    /// Attempt to home on every exit path after the first homing request
    Always,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LookForwardSettings {
    pub objects: String,
    pub confidence: f64,
    pub use_fallback: bool,
    /// radians, roughly 40° up from looking down
    pub pitch_angle: f64,
    pub approach_dx: f64,
    pub approach_dz: f64,
    pub approach_duration_secs: f64,
    pub tilt_duration_secs: f64,
}

impl LookForwardSettings {
    pub fn approach_duration(&self) -> Result<Duration> {
        seconds("approach_duration_secs", self.approach_duration_secs)
    }

    pub fn tilt_duration(&self) -> Result<Duration> {
        seconds("tilt_duration_secs", self.tilt_duration_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WristTiltSettings {
    pub objects: String,
    pub confidence: f64,
    pub use_fallback: bool,
    /// zero indexed joint that gets rotated
    pub joint: usize,
    pub delta_degrees: f64,
    pub duration_secs: f64,
}

impl WristTiltSettings {
    pub fn duration(&self) -> Result<Duration> {
        seconds("duration_secs", self.duration_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SkillConfig {
    pub cameras: CameraConfig,
    #[serde(default)]
    pub homing: HomingPolicy,
    pub save_visualization: bool,
    pub look_forward: LookForwardSettings,
    pub wrist_tilt: WristTiltSettings,
}

impl SkillConfig {
    /// Lookout comes with an included config file.
    ///
    /// This file is packaged with the binary
    /// This method retrieves this included version
    pub fn included() -> SkillConfig {
        INCLUDED.clone()
    }

    pub fn parse_json(text: &str) -> Result<SkillConfig> {
        let config: SkillConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse_yaml(text: &str) -> Result<SkillConfig> {
        let config: SkillConfig = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every value that can't be caught by deserialization alone
    pub fn validate(&self) -> Result<()> {
        self.look_forward.approach_duration()?;
        self.look_forward.tilt_duration()?;
        self.wrist_tilt.duration()?;
        Ok(())
    }

    pub fn serialize_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn serialize_to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.serialize_to_json()?)?;
        Ok(())
    }

    pub fn save_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.serialize_to_yaml()?)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<SkillConfig> {
        let text = fs::read_to_string(path)?;
        SkillConfig::parse_json(&text)
    }

    pub fn load_yaml(path: impl AsRef<Path>) -> Result<SkillConfig> {
        let text = fs::read_to_string(path)?;
        SkillConfig::parse_yaml(&text)
    }

    /// Picks the parser from the file extension
    pub fn load(path: impl AsRef<Path>) -> Result<SkillConfig> {
        let path = path.as_ref();
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => SkillConfig::load_json(path),
            Some("yaml") | Some("yml") => SkillConfig::load_yaml(path),
            other => Err(ConfigError::UnknownFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }
}
