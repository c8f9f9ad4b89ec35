use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lookout_cli::logging;
use lookout_controller::{
    simulator::{ArmConfig, Scene, SimulatedArm, SimulatedDetector},
    skill::{JointDelta, MotionParams, SkillKind, SkillOrchestrator, SkillRequest},
    skill_config::{HomingPolicy, SkillConfig},
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Skill configuration file, json or yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sets the level of verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log as json lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Extend the arm, pitch the wrist camera forward and detect objects
    LookForward {
        #[command(flatten)]
        run: RunArgs,

        /// End effector pitch in radians, ~0.7 is the safe maximum
        #[arg(long)]
        pitch: Option<f64>,
    },
    /// Rotate the wrist joint and detect objects, falling back to the base camera
    WristTilt {
        #[command(flatten)]
        run: RunArgs,

        /// Wrist rotation in degrees
        #[arg(long, allow_negative_numbers = true)]
        delta: Option<f64>,
    },
    /// Print the effective skill configuration as yaml
    PrintConfig,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Comma separated objects to detect
    #[arg(long)]
    objects: Option<String>,

    /// Minimum detector confidence
    #[arg(long)]
    confidence: Option<f64>,

    /// Retry on the base camera if the wrist camera fails
    #[arg(long, conflicts_with = "no_fallback")]
    fallback: bool,

    #[arg(long)]
    no_fallback: bool,

    /// Try to return home even when the run fails
    #[arg(long)]
    always_home: bool,

    /// Scene seen by the simulated cameras, json or yaml
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Geometry of the simulated arm, json
    #[arg(long)]
    arm_config: Option<PathBuf>,

    /// Multiplier on simulated motion time, 0 moves instantly
    #[arg(long, default_value_t = 1.0)]
    time_scale: f32,
}

impl RunArgs {
    fn apply(&self, config: &mut SkillConfig, request: &mut SkillRequest) {
        if let Some(objects) = &self.objects {
            request.objects = objects.clone();
        }
        if let Some(confidence) = self.confidence {
            request.confidence = confidence;
        }
        if self.fallback {
            request.use_fallback = true;
        }
        if self.no_fallback {
            request.use_fallback = false;
        }
        if self.always_home {
            config.homing = HomingPolicy::Always;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_tracing(cli.verbose, cli.json_logs);

    let config = match &cli.config {
        Some(path) => SkillConfig::load(path)
            .with_context(|| format!("Failed to load skill config {}", path.display()))?,
        None => SkillConfig::included(),
    };

    match cli.command {
        Command::PrintConfig => {
            print!("{}", config.serialize_to_yaml()?);
        }
        Command::LookForward { run, pitch } => {
            let mut request = SkillRequest::from_config(SkillKind::LookForward, &config);
            if let Some(pitch) = pitch {
                request.motion = MotionParams::PitchAngle(pitch);
            }
            run_skill(config, request, run).await?;
        }
        Command::WristTilt { run, delta } => {
            let mut request = SkillRequest::from_config(SkillKind::WristTilt, &config);
            if let Some(degrees) = delta {
                request.motion = MotionParams::JointDelta(JointDelta {
                    joint: config.wrist_tilt.joint,
                    degrees,
                });
            }
            run_skill(config, request, run).await?;
        }
    }
    Ok(())
}

async fn run_skill(mut config: SkillConfig, mut request: SkillRequest, args: RunArgs) -> Result<()> {
    args.apply(&mut config, &mut request);

    let arm_config = match &args.arm_config {
        Some(path) => ArmConfig::load_json(path)
            .with_context(|| format!("Failed to load arm config {}", path.display()))?,
        None => ArmConfig::included(),
    };
    let scene = match &args.scene {
        Some(path) => {
            Scene::load(path).with_context(|| format!("Failed to load scene {}", path.display()))?
        }
        None => Scene::demo(&config.cameras),
    };

    let arm = SimulatedArm::new(arm_config, args.time_scale)?;
    let detector = SimulatedDetector::new(scene);
    let mut orchestrator =
        SkillOrchestrator::new(Box::new(arm.clone()), Box::new(arm), Box::new(detector), config);

    let result = orchestrator.run(&request).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
