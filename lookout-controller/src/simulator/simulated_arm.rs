use super::{
    arm_config::ArmConfig,
    kinematics::{ArmPositions, EndEffectorPose, IkError, JointPositions, KinematicSolver},
    workspace_guard::{GuardViolation, WorkspaceGuard},
};
use crate::{
    capabilities::{ArmMotion, ArmSensing, CapabilityResult, CartesianDelta, EePosition},
    skill_config::ConfigError,
};
use async_trait::async_trait;
use nalgebra as na;
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::Mutex, time::sleep};
use tracing::debug;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("inverse kinematics failed")]
    Ik(#[from] IkError),
    #[error("target pose rejected: {0}")]
    Collision(#[from] GuardViolation),
    #[error("invalid arm configuration")]
    Config(#[from] ConfigError),
    #[error("expected {expected} joint angles, got {got}")]
    JointCount { expected: usize, got: usize },
}

struct ArmState {
    solver: KinematicSolver,
    guard: WorkspaceGuard,
    home: JointPositions,
    home_duration: Duration,
    joints: JointPositions,
    time_scale: f32,
}

impl ArmState {
    fn positions(&self) -> ArmPositions {
        self.solver.calculate_fk(&self.joints)
    }

    fn check(&self, joints: &JointPositions) -> Result<(), SimulationError> {
        Ok(self.guard.check(&self.solver.calculate_fk(joints))?)
    }

    async fn travel(&mut self, target: JointPositions, duration: Duration) {
        sleep(duration.mul_f32(self.time_scale)).await;
        debug!("simulated arm reached {:?}", target);
        self.joints = target;
    }
}

/// Simulated arm standing in for the arm SDK.
///
/// Clones share the same arm, so one clone can be handed out as motion and
/// another as sensing. Motions take their requested duration scaled by
/// `time_scale`, zero makes them instant.
#[derive(Clone)]
pub struct SimulatedArm {
    state: Arc<Mutex<ArmState>>,
}

impl SimulatedArm {
    /// Arm starts out at its home pose
    pub fn new(config: ArmConfig, time_scale: f32) -> Result<Self, SimulationError> {
        let solver = KinematicSolver::new(config.clone());
        let home = solver.calculate_ik(&config.home)?;
        let state = ArmState {
            guard: WorkspaceGuard::new(&config),
            solver,
            home,
            home_duration: config.home_duration()?,
            joints: home,
            time_scale: time_scale.max(0.0),
        };
        Ok(Self {
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Teleport the arm, useful for starting a run away from home
    pub async fn set_joints(&self, joints: JointPositions) -> Result<(), SimulationError> {
        let mut state = self.state.lock().await;
        state.check(&joints)?;
        state.joints = joints;
        Ok(())
    }

    pub async fn joints(&self) -> JointPositions {
        self.state.lock().await.joints
    }

    pub async fn end_effector_pose(&self) -> EndEffectorPose {
        self.state.lock().await.positions().end_effector_pose()
    }
}

#[async_trait]
impl ArmMotion for SimulatedArm {
    async fn go_home(&mut self) -> CapabilityResult<()> {
        let mut state = self.state.lock().await;
        let (home, duration) = (state.home, state.home_duration);
        state.travel(home, duration).await;
        Ok(())
    }

    async fn move_delta(
        &mut self,
        delta: &CartesianDelta,
        duration: Duration,
    ) -> CapabilityResult<()> {
        let mut state = self.state.lock().await;
        let current = state.positions().end_effector_pose();
        // positive pitch tilts the camera up, the solver measures angle below horizontal
        let target = EndEffectorPose::new(
            current.position + na::Vector3::new(delta.dx as f32, 0.0, delta.dz as f32),
            current.end_effector_angle - (delta.dpitch as f32).to_degrees(),
        );
        let joints = state.solver.calculate_ik(&target).map_err(SimulationError::from)?;
        state.check(&joints)?;
        state.travel(joints, duration).await;
        Ok(())
    }

    async fn move_joints(&mut self, joints: &[f64], duration: Duration) -> CapabilityResult<()> {
        let target = JointPositions::from_radians(joints).ok_or(SimulationError::JointCount {
            expected: JointPositions::COUNT,
            got: joints.len(),
        })?;
        let mut state = self.state.lock().await;
        state.check(&target)?;
        state.travel(target, duration).await;
        Ok(())
    }
}

#[async_trait]
impl ArmSensing for SimulatedArm {
    async fn get_ee_position(&mut self) -> CapabilityResult<EePosition> {
        let position = self.state.lock().await.positions().end_effector;
        Ok(EePosition::new(
            f64::from(position.x),
            f64::from(position.y),
            f64::from(position.z),
        ))
    }

    async fn get_arm_joints(&mut self) -> CapabilityResult<Vec<f64>> {
        Ok(self.state.lock().await.joints.to_radians())
    }
}
