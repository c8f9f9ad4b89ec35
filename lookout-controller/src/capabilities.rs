//! Capability seams between the skills and the arm SDK.
//!
//! Skills never talk to hardware directly. They are handed one implementation
//! of each trait here, which lets the same orchestration run against the
//! real SDK, the [simulator](crate::simulator) or a test double.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{error::Error, time::Duration};

/// Error type returned by capability implementations.
///
/// Implementations are free to fail with whatever error they own,
/// skills only forward it.
pub type BoxError = Box<dyn Error + Send + Sync>;

pub type CapabilityResult<T> = std::result::Result<T, BoxError>;

/// Relative motion of the end effector in the arm frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartesianDelta {
    /// forward offset in meters
    pub dx: f64,
    /// vertical offset in meters
    pub dz: f64,
    /// pitch offset in radians
    pub dpitch: f64,
}

impl CartesianDelta {
    pub fn new(dx: f64, dz: f64, dpitch: f64) -> CartesianDelta {
        CartesianDelta { dx, dz, dpitch }
    }

    pub fn translation(dx: f64, dz: f64) -> CartesianDelta {
        CartesianDelta::new(dx, dz, 0.0)
    }

    pub fn pitch(dpitch: f64) -> CartesianDelta {
        CartesianDelta::new(0.0, 0.0, dpitch)
    }
}

/// Snapshot of the end effector position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct EePosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl EePosition {
    pub fn new(x: f64, y: f64, z: f64) -> EePosition {
        EePosition { x, y, z }
    }
}

impl From<[f64; 3]> for EePosition {
    fn from([x, y, z]: [f64; 3]) -> Self {
        EePosition::new(x, y, z)
    }
}

impl From<EePosition> for [f64; 3] {
    fn from(position: EePosition) -> Self {
        [position.x, position.y, position.z]
    }
}

/// Detection as reported by the detector, before any normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub class_name: String,
    pub confidence: f64,
    pub bbox: [f64; 4],
}

impl RawDetection {
    pub fn new(class_name: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> RawDetection {
        RawDetection {
            class_name: class_name.into(),
            confidence,
            bbox,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRequest {
    pub text_prompt: String,
    pub camera_id: String,
    pub confidence: f64,
    pub save_visualization: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub detections: Vec<RawDetection>,
}

#[async_trait]
pub trait ArmMotion: Send + Sync {
    /// Move to the home pose and wait for the motion to finish
    async fn go_home(&mut self) -> CapabilityResult<()>;
    /// Move relative to the current pose and wait for the motion to finish
    async fn move_delta(&mut self, delta: &CartesianDelta, duration: Duration)
        -> CapabilityResult<()>;
    /// Move to absolute joint angles in radians and wait for the motion to finish
    async fn move_joints(&mut self, joints: &[f64], duration: Duration) -> CapabilityResult<()>;
}

#[async_trait]
pub trait ArmSensing: Send + Sync {
    async fn get_ee_position(&mut self) -> CapabilityResult<EePosition>;
    /// Current joint angles in radians, base first
    async fn get_arm_joints(&mut self) -> CapabilityResult<Vec<f64>>;
}

#[async_trait]
pub trait Detector: Send + Sync {
    async fn segment_camera(&mut self, request: &SegmentRequest)
        -> CapabilityResult<SegmentationResult>;
}
