//! Scenario lifecycle
//!
//! A scenario places its supporting actors relative to the ego actor, builds
//! a behavior tree and a list of criteria, then is ticked until the tree
//! finishes or the timeout runs out. Teardown is explicit: [`Scenario::finish`]
//! destroys every spawned actor, and a failed [`Scenario::setup`] destroys
//! whatever it already spawned before returning the error.
//!
//! Per tick the order is fixed: world step, behavior tree, criteria.

pub mod construction;
pub mod parking;

use serde::{Deserialize, Serialize};

pub use construction::{ConstructionConfig, ConstructionSetupScenario};
pub use parking::{ActorSpec, ParkingConfig, ParkingScenario};

use crate::behavior::{Node, Status};
use crate::criteria::{Criterion, CriterionVerdict};
use crate::error::{Result, ScenarioError};
use crate::settings::Settings;
use crate::sim::{ActorId, Transform, World};
use crate::ticks_for;

/// A concrete scenario: which actors to place, which tree to run, what to check
pub trait ScenarioDefinition {
    fn name(&self) -> &str;

    /// Timeout used when the settings do not override it (seconds)
    fn default_timeout(&self) -> f32;

    /// Spawn supporting actors through `registry`
    fn initialize_actors(&self, world: &mut dyn World, registry: &mut ActorRegistry)
    -> Result<()>;

    fn create_behavior(&self, registry: &ActorRegistry) -> Result<Node>;

    fn create_test_criteria(&self, registry: &ActorRegistry) -> Vec<Criterion>;
}

/// An actor spawned by the scenario
#[derive(Debug, Clone)]
pub struct SpawnedActor {
    pub id: ActorId,
    pub kind: String,
    /// Transform it was spawned at
    pub transform: Transform,
}

/// Actors owned by a scenario, plus the ego it observes but does not own
#[derive(Debug, Clone)]
pub struct ActorRegistry {
    ego: ActorId,
    reference: Transform,
    actors: Vec<SpawnedActor>,
}

impl ActorRegistry {
    pub fn new(ego: ActorId, reference: Transform) -> Self {
        Self {
            ego,
            reference,
            actors: Vec::new(),
        }
    }

    pub fn ego(&self) -> ActorId {
        self.ego
    }

    /// Ego transform captured at setup
    pub fn reference(&self) -> &Transform {
        &self.reference
    }

    pub fn actors(&self) -> &[SpawnedActor] {
        &self.actors
    }

    /// Ids of every owned actor; the ego is never among them
    pub fn other_actors(&self) -> Vec<ActorId> {
        self.actors.iter().map(|a| a.id).collect()
    }

    /// Spawn an actor and take ownership of it
    pub fn spawn(
        &mut self,
        world: &mut dyn World,
        kind: &str,
        transform: Transform,
        simulate_physics: bool,
    ) -> Result<ActorId> {
        let id = world.spawn_actor(kind, &transform)?;
        // Owned from here on, so a failing command below still gets cleaned up
        self.actors.push(SpawnedActor {
            id,
            kind: kind.to_string(),
            transform,
        });
        if simulate_physics {
            world.set_simulate_physics(id, true)?;
        }
        log::debug!("Spawned {kind} as {id} at {:?}", transform.location);
        Ok(id)
    }

    /// Destroy every owned actor, continuing past failures
    ///
    /// Actors already gone (e.g. destroyed by the behavior tree) are skipped.
    /// Returns one message per actor that could not be destroyed.
    pub fn destroy_all(&mut self, world: &mut dyn World) -> Vec<String> {
        let mut failures = Vec::new();
        for actor in self.actors.drain(..) {
            if !world.is_alive(actor.id) {
                continue;
            }
            if let Err(e) = world.destroy_actor(actor.id) {
                let failure = ScenarioError::TeardownFailed {
                    actor: actor.id,
                    reason: e.to_string(),
                };
                log::warn!("{failure}");
                failures.push(failure.to_string());
            }
        }
        failures
    }
}

/// Outcome of a scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub name: String,
    /// Root status when ticking stopped; non-terminal means incomplete
    pub tree_status: Status,
    pub timed_out: bool,
    /// Simulated seconds
    pub elapsed: f32,
    pub ticks: u64,
    pub criteria: Vec<CriterionVerdict>,
    pub teardown_failures: Vec<String>,
}

impl ScenarioReport {
    /// Tree succeeded in time and every criterion passed
    pub fn passed(&self) -> bool {
        self.tree_status == Status::Success
            && !self.timed_out
            && self.criteria.iter().all(|c| c.passed)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A running scenario instance
#[derive(Debug)]
pub struct Scenario {
    name: String,
    registry: ActorRegistry,
    root: Node,
    criteria: Vec<Criterion>,
    /// Hard ceiling (seconds)
    timeout: f32,
    /// The ceiling in whole ticks of `dt`
    timeout_ticks: u64,
    dt: f32,
    ticks: u64,
    timed_out: bool,
}

impl Scenario {
    /// Place actors and build the tree and criteria for `definition`
    ///
    /// `ego` is the pre-existing reference actor; its current transform is
    /// the reference for every placement.
    pub fn setup(
        world: &mut dyn World,
        ego: ActorId,
        definition: &dyn ScenarioDefinition,
        settings: &Settings,
    ) -> Result<Self> {
        let reference = world
            .actor_transform(ego)
            .ok_or(ScenarioError::ActorNotFound(ego))?;
        let mut registry = ActorRegistry::new(ego, reference);

        let built = definition
            .initialize_actors(world, &mut registry)
            .and_then(|()| definition.create_behavior(&registry));
        let root = match built {
            Ok(root) => root,
            Err(e) => {
                log::error!("{} setup failed: {e}", definition.name());
                registry.destroy_all(world);
                return Err(e);
            }
        };

        let criteria = if settings.criteria_enable {
            definition.create_test_criteria(&registry)
        } else {
            Vec::new()
        };

        let timeout = settings.effective_timeout(definition.default_timeout());
        let dt = settings.sim_rate.dt();
        log::info!(
            "{} ready: {} actors, {} criteria, timeout {timeout}s at {}",
            definition.name(),
            registry.actors().len(),
            criteria.len(),
            settings.sim_rate
        );

        Ok(Self {
            name: definition.name().to_string(),
            registry,
            root,
            criteria,
            timeout,
            timeout_ticks: ticks_for(timeout, dt),
            dt,
            ticks: 0,
            timed_out: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// Simulated seconds, derived from the tick count
    pub fn elapsed(&self) -> f32 {
        (self.ticks as f64 * f64::from(self.dt)) as f32
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn timed_out(&self) -> bool {
        self.timed_out
    }

    /// Root finished or the timeout was hit
    pub fn is_done(&self) -> bool {
        self.root.status().is_terminal() || self.timed_out
    }

    /// Tick the tree, then sample criteria, after the world has stepped
    pub fn tick(&mut self, world: &mut dyn World) -> Status {
        if self.is_done() {
            return self.root.status();
        }

        let status = self.root.tick(world, self.dt);
        for criterion in &mut self.criteria {
            criterion.update(world);
        }

        self.ticks += 1;
        if !status.is_terminal() && self.ticks >= self.timeout_ticks {
            log::warn!(
                "{} timed out after {:.1}s (limit {}s)",
                self.name,
                self.elapsed(),
                self.timeout
            );
            self.timed_out = true;
        }
        status
    }

    /// Drive the world and the scenario until done, then tear down
    pub fn run(self, world: &mut dyn World) -> ScenarioReport {
        self.run_with(world, |_| {})
    }

    /// Like [`Scenario::run`], calling `before_step` ahead of every world step
    ///
    /// This is where an external driver commands the ego.
    pub fn run_with<F>(mut self, world: &mut dyn World, mut before_step: F) -> ScenarioReport
    where
        F: FnMut(&mut dyn World),
    {
        while !self.is_done() {
            before_step(&mut *world);
            world.step(self.dt);
            self.tick(world);
        }
        self.finish(world)
    }

    /// Freeze criteria, destroy owned actors and build the report
    pub fn finish(mut self, world: &mut dyn World) -> ScenarioReport {
        for criterion in &mut self.criteria {
            criterion.terminate();
        }
        let teardown_failures = self.registry.destroy_all(world);
        let elapsed = self.elapsed();

        let report = ScenarioReport {
            name: self.name,
            tree_status: self.root.status(),
            timed_out: self.timed_out,
            elapsed,
            ticks: self.ticks,
            criteria: self.criteria.iter().map(Criterion::verdict).collect(),
            teardown_failures,
        };
        log::info!(
            "{} finished: {:?}{} in {:.1}s, passed={}",
            report.name,
            report.tree_status,
            if report.timed_out { " (timed out)" } else { "" },
            report.elapsed,
            report.passed()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{KinematicWorld, PlacementSpec, Rotation};
    use glam::Vec3;

    fn parked_ego() -> (KinematicWorld, ActorId) {
        let mut world = KinematicWorld::new();
        let transform = Transform::new(Vec3::ZERO, Rotation::from_yaw(0.0));
        let ego = world.spawn_actor("vehicle.lincoln.mkz2017", &transform).unwrap();
        world.set_simulate_physics(ego, true).unwrap();
        (world, ego)
    }

    fn walker_only() -> ParkingScenario {
        ParkingScenario::new(ParkingConfig {
            actors: vec![ActorSpec::new(
                "walker.*",
                PlacementSpec::new(10.0, 5.0, 0.0, 270.0),
            )],
            ..Default::default()
        })
    }

    #[test]
    fn test_large_timeout_still_fires() {
        let (mut world, ego) = parked_ego();
        let settings = Settings {
            timeout: Some(1.5e6),
            ..Default::default()
        };
        let mut scenario = Scenario::setup(&mut world, ego, &walker_only(), &settings).unwrap();
        assert_eq!(scenario.timeout_ticks, 30_000_000);

        // Skip ahead to just short of the ceiling, well past 2^20 seconds
        scenario.ticks = scenario.timeout_ticks - 2;
        scenario.tick(&mut world);
        assert!(!scenario.timed_out());
        scenario.tick(&mut world);
        assert!(scenario.timed_out());
        assert!(scenario.is_done());
        assert!((scenario.elapsed() - 1.5e6).abs() < 1.0);

        let report = scenario.finish(&mut world);
        assert!(report.timed_out);
        assert_eq!(report.ticks, 30_000_000);
    }

    #[test]
    fn test_timeout_lands_on_exact_tick() {
        let (mut world, ego) = parked_ego();
        let settings = Settings {
            timeout: Some(10.0),
            ..Default::default()
        };
        let scenario = Scenario::setup(&mut world, ego, &walker_only(), &settings).unwrap();
        let report = scenario.run(&mut world);
        assert!(report.timed_out);
        assert_eq!(report.ticks, 200);
    }

    #[test]
    fn test_run_with_calls_driver_before_each_step() {
        let (mut world, ego) = parked_ego();
        let settings = Settings {
            timeout: Some(2.0),
            ..Default::default()
        };
        let scenario = Scenario::setup(&mut world, ego, &walker_only(), &settings).unwrap();

        let mut calls = 0;
        let report = scenario.run_with(&mut world, |world| {
            calls += 1;
            // Commanded before the step, so the ego moves on the very first one
            world.set_target_velocity(ego, 1.0).unwrap();
        });
        assert_eq!(calls, report.ticks);
        assert_eq!(report.ticks, 40);
        let location = world.actor_transform(ego).unwrap().location;
        assert!((location.x - 2.0).abs() < 1e-3, "{location:?}");
    }
}
