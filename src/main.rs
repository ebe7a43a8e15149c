//! Scenario Runner entry point
//!
//! Runs a scenario against the kinematic reference world with a simple ego
//! driver and prints the JSON report.
//!
//! Usage: `scenario-runner [settings.json] [parking|construction] [low|medium|high]`
//!
//! The optional rate overrides the sim rate from the settings file.

use std::process::ExitCode;

use glam::Vec3;

use scenario_runner::behavior::time_to_arrival;
use scenario_runner::scenario::{ConstructionSetupScenario, ParkingScenario};
use scenario_runner::sim::{KinematicWorld, Rotation, Transform, World};
use scenario_runner::{Result, Scenario, ScenarioDefinition, Settings, SimRate};

const EGO_KIND: &str = "vehicle.lincoln.mkz2017";
/// Cruise speed of the ego driver
const EGO_SPEED: f32 = 3.0;
/// Ego brakes and holds once any actor is this close in time
const EGO_HOLD_TTA: f32 = 2.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let mut args = std::env::args().skip(1);
    let mut settings = match args.next() {
        Some(path) => Settings::from_json(&std::fs::read_to_string(path)?)?,
        None => Settings::default(),
    };
    let definition: Box<dyn ScenarioDefinition> = match args.next().as_deref() {
        Some("construction") => Box::new(ConstructionSetupScenario::default()),
        _ => Box::new(ParkingScenario::default()),
    };
    if let Some(rate) = args.next() {
        settings.sim_rate = rate.parse::<SimRate>()?;
    }

    let mut world = KinematicWorld::new();
    let ego = world.spawn_actor(EGO_KIND, &Transform::new(Vec3::ZERO, Rotation::from_yaw(0.0)))?;
    world.set_simulate_physics(ego, true)?;
    world.set_target_velocity(ego, EGO_SPEED)?;

    let scenario = Scenario::setup(&mut world, ego, definition.as_ref(), &settings)?;
    let others = scenario.registry().other_actors();

    // Ego driver: cruise, then brake and hold once anything is about to be reached
    let mut holding = false;
    let report = scenario.run_with(&mut world, |world| {
        if holding {
            return;
        }
        let close = others
            .iter()
            .any(|&other| time_to_arrival(world, ego, other).is_some_and(|t| t < EGO_HOLD_TTA));
        if close {
            holding = true;
            log::info!("Ego braking");
            if let Err(e) = world.apply_brake(ego, 1.0) {
                log::warn!("Ego brake failed: {e}");
            }
        }
    });
    println!("{}", report.to_json()?);
    Ok(report.passed())
}
