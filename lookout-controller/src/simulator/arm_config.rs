use super::kinematics::EndEffectorPose;
use crate::skill_config::{self, ConfigError};
use lazy_static::lazy_static;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

lazy_static! {
    static ref INCLUDED: ArmConfig = {
        let json = include_str!("../../config/arm.json");
        ArmConfig::parse_json(json).expect("bundled arm config is valid")
    };
}

/// Geometry of the simulated 4 joint arm.
///
/// Link vectors are given with every joint at zero,
/// where the upper arm points up and the forearm points forward.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ArmConfig {
    pub shoulder: Vector3<f32>,
    pub elbow: Vector3<f32>,
    pub wrist: Vector3<f32>,
    pub end_effector: Vector3<f32>,
    pub home: EndEffectorPose,
    pub home_duration_secs: f32,
    /// reach of the wrist measured from the shoulder
    pub workspace_radius: f32,
    pub base_radius: f32,
    pub base_half_height: f32,
}

impl ArmConfig {
    /// Arm geometry shipped with the crate
    pub fn included() -> ArmConfig {
        INCLUDED.clone()
    }

    pub fn parse_json(text: &str) -> Result<ArmConfig, ConfigError> {
        let config: ArmConfig = serde_json::from_str(text)?;
        config.home_duration()?;
        Ok(config)
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<ArmConfig, ConfigError> {
        let text = fs::read_to_string(path)?;
        ArmConfig::parse_json(&text)
    }

    pub fn home_duration(&self) -> Result<Duration, ConfigError> {
        skill_config::seconds("home_duration_secs", f64::from(self.home_duration_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn check_included() {
        let config = ArmConfig::included();
        assert_relative_eq!(config.home.end_effector_angle, 90.0);
        assert_eq!(config.home_duration().unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn negative_home_duration_is_rejected() {
        let mut config = ArmConfig::included();
        config.home_duration_secs = -2.0;
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(
            ArmConfig::parse_json(&json),
            Err(ConfigError::InvalidDuration {
                field: "home_duration_secs",
                ..
            })
        ));
    }

    #[test]
    fn serialize_to_json() {
        let config = ArmConfig::included();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(ArmConfig::parse_json(&json).unwrap(), config);
    }
}
