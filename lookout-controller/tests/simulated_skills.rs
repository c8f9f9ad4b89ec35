use approx::assert_relative_eq;
use lookout_controller::{
    simulator::{ArmConfig, JointPositions, Scene, SimulatedArm, SimulatedDetector},
    skill::{JointDelta, MotionParams, SkillKind, SkillOrchestrator, SkillRequest, SkillResult},
    skill_config::SkillConfig,
};
use std::path::PathBuf;

const WRIST_CAMERA: &str = "309622300814";
const BASE_CAMERA: &str = "base-camera";

fn orchestrator(scene: Scene) -> (SimulatedArm, SkillOrchestrator) {
    let arm = SimulatedArm::new(ArmConfig::included(), 0.0).unwrap();
    let orchestrator = SkillOrchestrator::new(
        Box::new(arm.clone()),
        Box::new(arm.clone()),
        Box::new(SimulatedDetector::new(scene)),
        SkillConfig::included(),
    );
    (arm, orchestrator)
}

fn demo_scene() -> Scene {
    Scene::demo(&SkillConfig::included().cameras)
}

fn wrist_offline_scene() -> Scene {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../scenes/wrist_offline.yaml");
    Scene::load(path).unwrap()
}

fn request(kind: SkillKind) -> SkillRequest {
    SkillRequest::from_config(kind, &SkillConfig::included())
}

fn classes(result: &SkillResult) -> Vec<(&str, f64)> {
    result
        .detections()
        .iter()
        .map(|detection| (detection.class.as_str(), detection.confidence))
        .collect()
}

async fn assert_at_home(arm: &SimulatedArm) {
    let home = ArmConfig::included().home;
    let pose = arm.end_effector_pose().await;
    assert_relative_eq!(pose.position, home.position, epsilon = 1e-4);
    assert_relative_eq!(pose.end_effector_angle, home.end_effector_angle, epsilon = 1e-3);
}

#[tokio::test]
async fn look_forward_on_simulated_arm() {
    let (arm, mut orchestrator) = orchestrator(demo_scene());
    let result = orchestrator
        .run(&request(SkillKind::LookForward))
        .await
        .unwrap();

    // cup is below the 0.15 threshold
    assert_eq!(classes(&result), vec![("person", 0.81), ("chair", 0.46)]);
    assert_eq!(result.count(), 2);
    assert_eq!(result.camera_used(), WRIST_CAMERA);
    assert_eq!(result.motion(), MotionParams::PitchAngle(0.7));

    let camera = result.ee_position();
    assert_relative_eq!(camera.x, 0.3, epsilon = 1e-3);
    assert_relative_eq!(camera.y, 0.0, epsilon = 1e-3);
    assert_relative_eq!(camera.z, 0.1, epsilon = 1e-3);

    assert_at_home(&arm).await;
}

#[tokio::test]
async fn wrist_tilt_on_simulated_arm() {
    let (arm, mut orchestrator) = orchestrator(demo_scene());
    let result = orchestrator
        .run(&request(SkillKind::WristTilt))
        .await
        .unwrap();

    assert_eq!(classes(&result), vec![("person", 0.81), ("chair", 0.46)]);
    assert_eq!(result.camera_used(), WRIST_CAMERA);
    assert_eq!(
        result.motion(),
        MotionParams::JointDelta(JointDelta {
            joint: 3,
            degrees: 30.0
        })
    );
    assert_at_home(&arm).await;
}

#[tokio::test]
async fn wrist_tilt_falls_back_to_base_camera() {
    let (arm, mut orchestrator) = orchestrator(wrist_offline_scene());
    let result = orchestrator
        .run(&request(SkillKind::WristTilt))
        .await
        .unwrap();

    assert_eq!(result.camera_used(), BASE_CAMERA);
    assert_eq!(classes(&result), vec![("person", 0.77), ("backpack", 0.33)]);
    assert_eq!(result.count(), 2);
    assert_at_home(&arm).await;
}

#[tokio::test]
async fn look_forward_without_fallback_fails_on_offline_wrist() {
    let (_, mut orchestrator) = orchestrator(wrist_offline_scene());
    let err = orchestrator
        .run(&request(SkillKind::LookForward))
        .await
        .unwrap_err();
    assert!(err.to_string().contains(WRIST_CAMERA));
}

#[tokio::test]
async fn run_started_away_from_home_matches_run_from_home() {
    let (arm, mut orchestrator) = orchestrator(demo_scene());
    let request = request(SkillKind::LookForward);
    let from_home = orchestrator.run(&request).await.unwrap();

    let away = JointPositions::new(20.0, 0.0, 10.0, 60.0);
    arm.set_joints(away).await.unwrap();
    assert_eq!(arm.joints().await, away);
    let from_away = orchestrator.run(&request).await.unwrap();

    assert_eq!(from_away.detections(), from_home.detections());
    assert_eq!(from_away.count(), from_home.count());
    assert_eq!(from_away.objects_searched(), from_home.objects_searched());
    assert_eq!(from_away.camera_used(), from_home.camera_used());
    let (a, b) = (from_away.ee_position(), from_home.ee_position());
    assert_relative_eq!(a.x, b.x, epsilon = 1e-4);
    assert_relative_eq!(a.y, b.y, epsilon = 1e-4);
    assert_relative_eq!(a.z, b.z, epsilon = 1e-4);
}

#[tokio::test]
async fn set_joints_rejects_pose_inside_base() {
    let (arm, _) = orchestrator(demo_scene());
    let before = arm.joints().await;
    // elbow folded straight down puts the camera inside the base
    assert!(arm
        .set_joints(JointPositions::new(0.0, 0.0, 90.0, 0.0))
        .await
        .is_err());
    assert_eq!(arm.joints().await, before);
}
