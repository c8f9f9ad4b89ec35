use crate::{
    capabilities::{CapabilityResult, Detector, RawDetection, SegmentRequest, SegmentationResult},
    skill_config::{CameraConfig, ConfigError},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs, path::Path};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera {0} is not connected")]
    NotConnected(String),
    #[error("camera {0} failed to deliver a frame")]
    Unavailable(String),
}

/// What a single camera sees
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraView {
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// Everything the simulated cameras see, keyed by camera id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Scene {
    pub cameras: HashMap<String, CameraView>,
}

impl Scene {
    /// Small office scene where both cameras work
    pub fn demo(cameras: &CameraConfig) -> Scene {
        let wrist = CameraView {
            unavailable: false,
            detections: vec![
                RawDetection::new("person", 0.8123, [212.0, 40.0, 388.0, 470.0]),
                RawDetection::new("chair", 0.4561, [20.0, 260.0, 180.0, 470.0]),
                RawDetection::new("cup", 0.1204, [430.0, 300.0, 470.0, 350.0]),
            ],
        };
        let base = CameraView {
            unavailable: false,
            detections: vec![RawDetection::new("table", 0.6677, [0.0, 200.0, 640.0, 480.0])],
        };
        Scene {
            cameras: [(cameras.wrist.clone(), wrist), (cameras.base.clone(), base)]
                .into_iter()
                .collect(),
        }
    }

    pub fn parse_json(text: &str) -> Result<Scene, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn parse_yaml(text: &str) -> Result<Scene, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Scene, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => Scene::parse_json(&text),
            Some("yaml") | Some("yml") => Scene::parse_yaml(&text),
            other => Err(ConfigError::UnknownFormat(
                other.unwrap_or_default().to_owned(),
            )),
        }
    }
}

/// Open vocabulary detector over a fixed [`Scene`].
///
/// Reports the detections whose class appears in the comma separated
/// prompt and whose confidence reaches the threshold.
pub struct SimulatedDetector {
    scene: Scene,
}

impl SimulatedDetector {
    pub fn new(scene: Scene) -> Self {
        Self { scene }
    }
}

fn prompt_classes(prompt: &str) -> Vec<String> {
    prompt
        .split(',')
        .map(|class| class.trim().to_lowercase())
        .filter(|class| !class.is_empty())
        .collect()
}

#[async_trait]
impl Detector for SimulatedDetector {
    async fn segment_camera(
        &mut self,
        request: &SegmentRequest,
    ) -> CapabilityResult<SegmentationResult> {
        let view = self
            .scene
            .cameras
            .get(&request.camera_id)
            .ok_or_else(|| CameraError::NotConnected(request.camera_id.clone()))?;
        if view.unavailable {
            return Err(CameraError::Unavailable(request.camera_id.clone()).into());
        }
        let classes = prompt_classes(&request.text_prompt);
        let detections = view
            .detections
            .iter()
            .filter(|detection| classes.contains(&detection.class_name.to_lowercase()))
            .filter(|detection| detection.confidence >= request.confidence)
            .cloned()
            .collect();
        if request.save_visualization {
            debug!("visualization for camera {} not rendered in simulation", request.camera_id);
        }
        Ok(SegmentationResult { detections })
    }
}
