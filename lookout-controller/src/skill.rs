use crate::{
    capabilities::{
        ArmMotion, ArmSensing, BoxError, CartesianDelta, Detector, EePosition, SegmentRequest,
        SegmentationResult,
    },
    detection::{self, Detection},
    skill_config::{ConfigError, HomingPolicy, SkillConfig},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillKind {
    /// Cartesian approach then pitch the end effector up
    LookForward,
    /// Rotate the wrist joint by a fixed delta
    WristTilt,
}

impl SkillKind {
    pub fn name(&self) -> &'static str {
        match self {
            SkillKind::LookForward => "look-forward",
            SkillKind::WristTilt => "wrist-tilt",
        }
    }
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JointDelta {
    /// zero indexed joint
    pub joint: usize,
    pub degrees: f64,
}

/// How the camera gets aimed, echoed back in the result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionParams {
    /// end effector pitch in radians
    PitchAngle(f64),
    JointDelta(JointDelta),
}

impl MotionParams {
    pub fn kind(&self) -> SkillKind {
        match self {
            MotionParams::PitchAngle(_) => SkillKind::LookForward,
            MotionParams::JointDelta(_) => SkillKind::WristTilt,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillRequest {
    /// comma separated class names, handed to the detector verbatim
    pub objects: String,
    pub motion: MotionParams,
    pub confidence: f64,
    pub use_fallback: bool,
}

impl SkillRequest {
    /// Request filled in with the configured defaults of a skill
    pub fn from_config(kind: SkillKind, config: &SkillConfig) -> SkillRequest {
        match kind {
            SkillKind::LookForward => {
                let settings = &config.look_forward;
                SkillRequest {
                    objects: settings.objects.clone(),
                    motion: MotionParams::PitchAngle(settings.pitch_angle),
                    confidence: settings.confidence,
                    use_fallback: settings.use_fallback,
                }
            }
            SkillKind::WristTilt => {
                let settings = &config.wrist_tilt;
                SkillRequest {
                    objects: settings.objects.clone(),
                    motion: MotionParams::JointDelta(JointDelta {
                        joint: settings.joint,
                        degrees: settings.delta_degrees,
                    }),
                    confidence: settings.confidence,
                    use_fallback: settings.use_fallback,
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillResult {
    detections: Vec<Detection>,
    count: usize,
    objects_searched: String,
    camera_used: String,
    ee_position: EePosition,
    #[serde(flatten)]
    motion: MotionParams,
}

impl SkillResult {
    pub fn new(
        detections: Vec<Detection>,
        objects_searched: String,
        camera_used: String,
        ee_position: EePosition,
        motion: MotionParams,
    ) -> SkillResult {
        SkillResult {
            count: detections.len(),
            detections,
            objects_searched,
            camera_used,
            ee_position,
            motion,
        }
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn objects_searched(&self) -> &str {
        &self.objects_searched
    }

    pub fn camera_used(&self) -> &str {
        &self.camera_used
    }

    pub fn ee_position(&self) -> EePosition {
        self.ee_position
    }

    pub fn motion(&self) -> MotionParams {
        self.motion
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillPhase {
    Idle,
    HomingStart,
    Posing,
    Sensing,
    DetectingPrimary,
    DetectingFallback,
    HomingEnd,
    Done,
    Failed,
}

impl fmt::Display for SkillPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillPhase::Idle => "idle",
            SkillPhase::HomingStart => "homing before positioning",
            SkillPhase::Posing => "positioning camera",
            SkillPhase::Sensing => "reading camera position",
            SkillPhase::DetectingPrimary => "detecting on primary camera",
            SkillPhase::DetectingFallback => "detecting on fallback camera",
            SkillPhase::HomingEnd => "returning home",
            SkillPhase::Done => "done",
            SkillPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("arm motion failed while {phase}")]
    Motion {
        phase: SkillPhase,
        #[source]
        source: BoxError,
    },
    #[error("failed reading arm state while {phase}")]
    Sensing {
        phase: SkillPhase,
        #[source]
        source: BoxError,
    },
    #[error("detection failed on camera {camera}")]
    Detection {
        phase: SkillPhase,
        camera: String,
        #[source]
        source: BoxError,
    },
    #[error("arm reports {available} joints, can't rotate joint {joint}")]
    MissingJoint { joint: usize, available: usize },
    #[error("invalid skill configuration")]
    Config(#[from] ConfigError),
}

impl SkillError {
    /// Phase the run was in when it failed
    pub fn phase(&self) -> SkillPhase {
        match self {
            SkillError::Motion { phase, .. }
            | SkillError::Sensing { phase, .. }
            | SkillError::Detection { phase, .. } => *phase,
            SkillError::MissingJoint { .. } => SkillPhase::Posing,
            SkillError::Config(_) => SkillPhase::Idle,
        }
    }
}

type Result<T> = std::result::Result<T, SkillError>;

fn motion_error(phase: SkillPhase) -> impl FnOnce(BoxError) -> SkillError {
    move |source| SkillError::Motion { phase, source }
}

fn sensing_error(phase: SkillPhase) -> impl FnOnce(BoxError) -> SkillError {
    move |source| SkillError::Sensing { phase, source }
}

/// Runs camera skills against injected arm, sensing and detection capabilities.
///
/// Every run is a strict sequence: home, aim the camera, read the camera
/// position, detect, home again. The only branch is the camera fallback,
/// which retries detection exactly once on the base camera.
pub struct SkillOrchestrator {
    motion: Box<dyn ArmMotion>,
    sensing: Box<dyn ArmSensing>,
    detector: Box<dyn Detector>,
    config: SkillConfig,
    phase: SkillPhase,
}

impl SkillOrchestrator {
    pub fn new(
        motion: Box<dyn ArmMotion>,
        sensing: Box<dyn ArmSensing>,
        detector: Box<dyn Detector>,
        config: SkillConfig,
    ) -> Self {
        Self {
            motion,
            sensing,
            detector,
            config,
            phase: SkillPhase::Idle,
        }
    }

    pub fn config(&self) -> &SkillConfig {
        &self.config
    }

    /// Phase reached by the latest run
    pub fn phase(&self) -> SkillPhase {
        self.phase
    }

    pub async fn run(&mut self, request: &SkillRequest) -> Result<SkillResult> {
        info!("=== {} skill ===", request.motion.kind());
        self.phase = SkillPhase::Idle;
        match self.execute(request).await {
            Ok(result) => {
                self.enter(SkillPhase::Done);
                info!("=== Done ===");
                Ok(result)
            }
            Err(err) => {
                error!("{} skill failed while {}: {}", request.motion.kind(), self.phase, err);
                self.enter(SkillPhase::Failed);
                // nothing moved yet, or the first homing request itself failed
                let arm_left_home =
                    !matches!(err.phase(), SkillPhase::Idle | SkillPhase::HomingStart);
                if self.config.homing == HomingPolicy::Always && arm_left_home {
                    self.recover_home().await;
                }
                Err(err)
            }
        }
    }

    async fn execute(&mut self, request: &SkillRequest) -> Result<SkillResult> {
        // a bad duration has to fail before the arm moves
        self.config.validate()?;

        self.enter(SkillPhase::HomingStart);
        info!("Going home...");
        self.motion
            .go_home()
            .await
            .map_err(motion_error(SkillPhase::HomingStart))?;

        self.enter(SkillPhase::Posing);
        self.aim_camera(&request.motion).await?;

        self.enter(SkillPhase::Sensing);
        let ee_position = self
            .sensing
            .get_ee_position()
            .await
            .map_err(sensing_error(SkillPhase::Sensing))?;
        info!(
            "Camera at: x={:.3}, y={:.3}, z={:.3}",
            ee_position.x, ee_position.y, ee_position.z
        );

        info!("Detecting: {}", request.objects);
        let (camera_used, segmentation) = self.detect(request).await?;
        for raw in &segmentation.detections {
            info!("  Found: {} ({:.0}%)", raw.class_name, raw.confidence * 100.0);
        }
        let detections = detection::normalize(&segmentation.detections);
        if detections.is_empty() {
            info!("  No objects detected");
        } else {
            info!("{} object(s) detected", detections.len());
        }

        self.enter(SkillPhase::HomingEnd);
        info!("Returning home...");
        self.motion
            .go_home()
            .await
            .map_err(motion_error(SkillPhase::HomingEnd))?;

        Ok(SkillResult::new(
            detections,
            request.objects.clone(),
            camera_used,
            ee_position,
            request.motion,
        ))
    }

    async fn aim_camera(&mut self, motion: &MotionParams) -> Result<()> {
        match motion {
            MotionParams::PitchAngle(pitch) => {
                let settings = &self.config.look_forward;
                info!("Positioning arm...");
                self.motion
                    .move_delta(
                        &CartesianDelta::translation(settings.approach_dx, settings.approach_dz),
                        settings.approach_duration()?,
                    )
                    .await
                    .map_err(motion_error(SkillPhase::Posing))?;
                info!("Tilting camera forward ({:.1} rad)...", pitch);
                self.motion
                    .move_delta(&CartesianDelta::pitch(*pitch), settings.tilt_duration()?)
                    .await
                    .map_err(motion_error(SkillPhase::Posing))?;
            }
            MotionParams::JointDelta(delta) => {
                let mut joints = self
                    .sensing
                    .get_arm_joints()
                    .await
                    .map_err(sensing_error(SkillPhase::Posing))?;
                let available = joints.len();
                let joint = joints
                    .get_mut(delta.joint)
                    .ok_or(SkillError::MissingJoint {
                        joint: delta.joint,
                        available,
                    })?;
                *joint += delta.degrees.to_radians();
                info!("Rotating joint {} by {:+.0}°...", delta.joint, delta.degrees);
                self.motion
                    .move_joints(&joints, self.config.wrist_tilt.duration()?)
                    .await
                    .map_err(motion_error(SkillPhase::Posing))?;
            }
        }
        Ok(())
    }

    async fn detect(&mut self, request: &SkillRequest) -> Result<(String, SegmentationResult)> {
        self.enter(SkillPhase::DetectingPrimary);
        let primary = self.config.cameras.wrist.clone();
        let segment_request = self.segment_request(request, &primary);
        let failure = match self.detector.segment_camera(&segment_request).await {
            Ok(result) => return Ok((primary, result)),
            Err(source) if request.use_fallback => source,
            Err(source) => {
                return Err(SkillError::Detection {
                    phase: SkillPhase::DetectingPrimary,
                    camera: primary,
                    source,
                })
            }
        };

        let secondary = self.config.cameras.base.clone();
        warn!(
            "Camera {} failed ({}), falling back to camera {}",
            primary, failure, secondary
        );
        self.enter(SkillPhase::DetectingFallback);
        let segment_request = self.segment_request(request, &secondary);
        match self.detector.segment_camera(&segment_request).await {
            Ok(result) => Ok((secondary, result)),
            Err(source) => Err(SkillError::Detection {
                phase: SkillPhase::DetectingFallback,
                camera: secondary,
                source,
            }),
        }
    }

    fn segment_request(&self, request: &SkillRequest, camera_id: &str) -> SegmentRequest {
        SegmentRequest {
            text_prompt: request.objects.clone(),
            camera_id: camera_id.to_owned(),
            confidence: request.confidence,
            save_visualization: self.config.save_visualization,
        }
    }

    /// Single homing attempt after a failure. Errors here are logged only,
    /// the caller still gets the error that ended the run.
    async fn recover_home(&mut self) {
        warn!("Attempting to return home after failure");
        if let Err(err) = self.motion.go_home().await {
            error!("Failed to return home after failure: {}", err);
        }
    }

    fn enter(&mut self, phase: SkillPhase) {
        debug!("skill phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
