//! Stand-in for the arm SDK so skills can run without hardware

mod arm_config;
mod kinematics;
mod simulated_arm;
mod simulated_detector;
mod workspace_guard;

pub use arm_config::ArmConfig;
pub use kinematics::{ArmPositions, EndEffectorPose, IkError, JointPositions, KinematicSolver};
pub use simulated_arm::{SimulatedArm, SimulationError};
pub use simulated_detector::{CameraError, CameraView, Scene, SimulatedDetector};
pub use workspace_guard::{GuardViolation, Link, WorkspaceGuard};
