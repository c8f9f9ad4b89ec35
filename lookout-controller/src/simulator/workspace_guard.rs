use super::{arm_config::ArmConfig, kinematics::ArmPositions};
use nalgebra as na;
use parry3d::{query::PointQuery, shape};
use std::{f32, fmt};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Wrist,
    EndEffector,
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Link::Wrist => f.write_str("wrist"),
            Link::EndEffector => f.write_str("end effector"),
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GuardViolation {
    #[error("wrist would be {distance:.3}m from the shoulder, reach is {reach:.3}m")]
    OutOfReach { distance: f32, reach: f32 },
    #[error("{0} would enter the arm base")]
    BaseContact(Link),
}

/// Rejects arm poses the simulated arm could not physically take.
pub struct WorkspaceGuard {
    reach: shape::Ball,
    reach_pose: na::Isometry3<f32>,
    base: shape::Cylinder,
    base_pose: na::Isometry3<f32>,
}

impl WorkspaceGuard {
    pub fn new(config: &ArmConfig) -> Self {
        let shoulder = config.shoulder;
        Self {
            reach: shape::Ball::new(config.workspace_radius),
            reach_pose: na::Isometry3::translation(shoulder.x, shoulder.y, shoulder.z),
            base: shape::Cylinder::new(config.base_half_height, config.base_radius),
            // parry cylinders run along y, the base stands along z
            base_pose: na::Isometry3::rotation(na::Vector3::x() * f32::consts::FRAC_PI_2),
        }
    }

    pub fn check(&self, positions: &ArmPositions) -> Result<(), GuardViolation> {
        let wrist = na::Point3::from(positions.wrist);
        if !self.reach.contains_point(&self.reach_pose, &wrist) {
            return Err(GuardViolation::OutOfReach {
                distance: (positions.wrist - positions.shoulder).magnitude(),
                reach: self.reach.radius,
            });
        }
        let links = [
            (Link::Wrist, positions.wrist),
            (Link::EndEffector, positions.end_effector),
        ];
        match links
            .iter()
            .find(|(_, point)| self.base.contains_point(&self.base_pose, &(*point).into()))
        {
            Some((link, _)) => Err(GuardViolation::BaseContact(*link)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::kinematics::KinematicSolver;

    fn positions(wrist: na::Vector3<f32>, end_effector: na::Vector3<f32>) -> ArmPositions {
        let shoulder = ArmConfig::included().shoulder;
        ArmPositions {
            shoulder,
            elbow: shoulder,
            wrist,
            end_effector,
            end_effector_angle: 0.0,
        }
    }

    fn guard() -> WorkspaceGuard {
        WorkspaceGuard::new(&ArmConfig::included())
    }

    #[test]
    fn wrist_reach_is_measured_from_shoulder() {
        let shoulder = ArmConfig::included().shoulder;
        let far = na::Vector3::new(0.5, 0.0, 0.0);
        assert_eq!(
            guard().check(&positions(shoulder + na::Vector3::new(0.39, 0.0, 0.0), far)),
            Ok(())
        );
        match guard().check(&positions(shoulder + na::Vector3::new(0.41, 0.0, 0.0), far)) {
            Err(GuardViolation::OutOfReach { distance, reach }) => {
                approx::assert_relative_eq!(distance, 0.41, epsilon = 1e-5);
                approx::assert_relative_eq!(reach, 0.4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn base_contact_names_the_link() {
        let clear = na::Vector3::new(0.2, 0.0, 0.2);
        let in_base = na::Vector3::new(0.0, 0.0, 0.05);
        let beside_base = na::Vector3::new(0.0, 0.07, 0.0);
        assert_eq!(
            guard().check(&positions(in_base, clear)),
            Err(GuardViolation::BaseContact(Link::Wrist))
        );
        assert_eq!(
            guard().check(&positions(clear, in_base)),
            Err(GuardViolation::BaseContact(Link::EndEffector))
        );
        assert_eq!(guard().check(&positions(clear, beside_base)), Ok(()));
        assert_eq!(
            guard().check(&positions(clear, na::Vector3::new(0.0, 0.0, 0.11))),
            Ok(())
        );
    }

    #[test]
    fn home_pose_is_allowed() {
        let config = ArmConfig::included();
        let solver = KinematicSolver::new(config.clone());
        let joints = solver.calculate_ik(&config.home).unwrap();
        assert_eq!(guard().check(&solver.calculate_fk(&joints)), Ok(()));
    }
}
