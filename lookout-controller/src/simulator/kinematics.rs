use super::arm_config::ArmConfig;
use nalgebra as na;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum IkError {
    #[error("pose {0:?} is out of reach")]
    Unreachable(EndEffectorPose),
}

/// Joint angles in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JointPositions {
    pub base: f32,
    pub shoulder: f32,
    pub elbow: f32,
    pub wrist: f32,
}

impl JointPositions {
    pub const COUNT: usize = 4;

    pub fn new(base: f32, shoulder: f32, elbow: f32, wrist: f32) -> JointPositions {
        JointPositions {
            base,
            shoulder,
            elbow,
            wrist,
        }
    }

    pub fn from_radians(radians: &[f64]) -> Option<JointPositions> {
        match radians {
            [base, shoulder, elbow, wrist] => Some(JointPositions::new(
                base.to_degrees() as f32,
                shoulder.to_degrees() as f32,
                elbow.to_degrees() as f32,
                wrist.to_degrees() as f32,
            )),
            _ => None,
        }
    }

    pub fn to_radians(&self) -> Vec<f64> {
        [self.base, self.shoulder, self.elbow, self.wrist]
            .iter()
            .map(|degrees| f64::from(*degrees).to_radians())
            .collect()
    }
}

/// Position of the end effector and its angle below horizontal in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EndEffectorPose {
    pub position: na::Vector3<f32>,
    pub end_effector_angle: f32,
}

impl EndEffectorPose {
    pub fn new(position: na::Vector3<f32>, end_effector_angle: f32) -> EndEffectorPose {
        EndEffectorPose {
            position,
            end_effector_angle,
        }
    }
}

/// Location of every joint for a given set of joint angles
#[derive(Debug, Clone, PartialEq)]
pub struct ArmPositions {
    pub shoulder: na::Vector3<f32>,
    pub elbow: na::Vector3<f32>,
    pub wrist: na::Vector3<f32>,
    pub end_effector: na::Vector3<f32>,
    pub end_effector_angle: f32,
}

impl ArmPositions {
    pub fn end_effector_pose(&self) -> EndEffectorPose {
        EndEffectorPose::new(self.end_effector, self.end_effector_angle)
    }
}

#[derive(Debug, Clone)]
pub struct KinematicSolver {
    config: ArmConfig,
}

impl KinematicSolver {
    pub fn new(config: ArmConfig) -> Self {
        Self { config }
    }

    /// Expects a pose relative to the arm base
    pub fn calculate_ik(&self, pose: &EndEffectorPose) -> Result<JointPositions, IkError> {
        let effector_angle = pose.end_effector_angle.to_radians();
        let base_angle = (-pose.position.y).atan2(pose.position.x);
        let horizontal_distance = (pose.position.x.powi(2) + pose.position.y.powi(2)).sqrt();
        let height = pose.position.z - self.config.shoulder.z;

        // solve for the wrist joint instead of the tip
        let end_effector_len = self.config.end_effector.magnitude();
        let wrist_horizontal = horizontal_distance - effector_angle.cos() * end_effector_len;
        let wrist_height = height + effector_angle.sin() * end_effector_len;

        let upper_arm = self.config.elbow.magnitude();
        let forearm = self.config.wrist.magnitude();
        let wrist_distance = (wrist_height.powi(2) + wrist_horizontal.powi(2)).sqrt();
        let wrist_elevation = wrist_height.atan2(wrist_horizontal);

        // law of cosines on the upper arm, forearm, wrist distance triangle
        let shoulder_inner = ((wrist_distance.powi(2) + upper_arm.powi(2) - forearm.powi(2))
            / (2.0 * wrist_distance * upper_arm))
            .acos();
        let elbow_inner = ((forearm.powi(2) + upper_arm.powi(2) - wrist_distance.powi(2))
            / (2.0 * forearm * upper_arm))
            .acos();
        // upper arm link is not always vertical
        let upper_arm_offset = (self.config.elbow.x / self.config.elbow.z).atan();

        let shoulder = 90_f32.to_radians() - (wrist_elevation + shoulder_inner + upper_arm_offset);
        let elbow = 90_f32.to_radians() - elbow_inner + upper_arm_offset;
        let wrist = effector_angle - elbow - shoulder;

        let joints = JointPositions::new(
            base_angle.to_degrees(),
            shoulder.to_degrees(),
            elbow.to_degrees(),
            wrist.to_degrees(),
        );
        if [joints.base, joints.shoulder, joints.elbow, joints.wrist]
            .iter()
            .any(|angle| !angle.is_finite())
        {
            return Err(IkError::Unreachable(*pose));
        }
        Ok(joints)
    }

    pub fn calculate_fk(&self, joints: &JointPositions) -> ArmPositions {
        let base_rotation =
            na::Rotation3::from_axis_angle(&na::Vector3::z_axis(), -joints.base.to_radians());
        let shoulder_rotation = base_rotation
            * na::Rotation3::from_axis_angle(&na::Vector3::y_axis(), joints.shoulder.to_radians());
        let elbow_rotation = shoulder_rotation
            * na::Rotation3::from_axis_angle(&na::Vector3::y_axis(), joints.elbow.to_radians());
        let wrist_rotation = elbow_rotation
            * na::Rotation3::from_axis_angle(&na::Vector3::y_axis(), joints.wrist.to_radians());

        let shoulder = self.config.shoulder;
        let elbow = shoulder + shoulder_rotation * self.config.elbow;
        let wrist = elbow + elbow_rotation * self.config.wrist;
        let end_effector = wrist + wrist_rotation * self.config.end_effector;
        ArmPositions {
            shoulder,
            elbow,
            wrist,
            end_effector,
            end_effector_angle: joints.shoulder + joints.elbow + joints.wrist,
        }
    }
}
