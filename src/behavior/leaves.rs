//! Leaf behaviors
//!
//! Each leaf issues its commands through the [`World`] handle and reports a
//! status. A rejected command surfaces as an error, which the owning
//! [`Node`](super::Node) turns into `Failure`.

use glam::Vec3;

use super::Status;
use super::trigger::in_time_to_arrival;
use crate::consts::STOP_SPEED_TOLERANCE;
use crate::error::{Result, ScenarioError};
use crate::sim::{ActorId, Transform, World};
use crate::ticks_for;

/// Ticks counted since the first tick
///
/// The first tick marks the start, so a duration of `n * dt` completes on
/// tick `n + 1`.
#[derive(Debug, Clone, Default)]
pub struct Timer {
    started: bool,
    ticks: u64,
    dt: f32,
}

impl Timer {
    pub fn advance(&mut self, dt: f32) {
        if self.started {
            self.ticks += 1;
        } else {
            self.started = true;
        }
        self.dt = dt;
    }

    /// Seconds since the first tick
    pub fn elapsed(&self) -> f32 {
        (self.ticks as f64 * f64::from(self.dt)) as f32
    }

    pub fn reached(&self, duration: f32) -> bool {
        self.started && self.ticks >= ticks_for(duration, self.dt)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Waits until `actor` is within `threshold` seconds of reaching `other`
#[derive(Debug, Clone)]
pub struct TriggerGate {
    pub actor: ActorId,
    pub other: ActorId,
    pub threshold: f32,
}

impl TriggerGate {
    pub fn tick(&mut self, world: &dyn World) -> Status {
        if in_time_to_arrival(world, self.actor, self.other, self.threshold) {
            Status::Success
        } else {
            Status::Running
        }
    }
}

/// Holds a target speed on an actor; never completes on its own
#[derive(Debug, Clone)]
pub struct VelocityApply {
    pub actor: ActorId,
    pub speed: f32,
}

impl VelocityApply {
    pub fn tick(&mut self, world: &mut dyn World) -> Result<Status> {
        world.set_target_velocity(self.actor, self.speed)?;
        Ok(Status::Running)
    }
}

/// Succeeds once the actor has traveled `distance` since the first tick
#[derive(Debug, Clone)]
pub struct DistanceTrack {
    pub actor: ActorId,
    pub distance: f32,
    pub traveled: f32,
    last_location: Option<Vec3>,
}

impl DistanceTrack {
    pub fn new(actor: ActorId, distance: f32) -> Self {
        Self {
            actor,
            distance,
            traveled: 0.0,
            last_location: None,
        }
    }

    pub fn tick(&mut self, world: &dyn World) -> Result<Status> {
        let location = world
            .actor_transform(self.actor)
            .ok_or(ScenarioError::ActorNotFound(self.actor))?
            .location;
        if let Some(last) = self.last_location {
            self.traveled += location.distance(last);
        }
        self.last_location = Some(location);

        Ok(if self.traveled >= self.distance {
            Status::Success
        } else {
            Status::Running
        })
    }

    pub fn reset(&mut self) {
        self.traveled = 0.0;
        self.last_location = None;
    }
}

/// Brakes an actor until it stands still or `timeout` runs out
#[derive(Debug, Clone)]
pub struct Stop {
    pub actor: ActorId,
    pub max_brake: f32,
    pub timeout: f32,
    pub timer: Timer,
}

impl Stop {
    pub fn tick(&mut self, world: &mut dyn World, dt: f32) -> Result<Status> {
        world.apply_brake(self.actor, self.max_brake)?;
        let speed = world
            .actor_velocity(self.actor)
            .ok_or(ScenarioError::ActorNotFound(self.actor))?
            .length();
        self.timer.advance(dt);

        if speed <= STOP_SPEED_TOLERANCE {
            Ok(Status::Success)
        } else if self.timer.reached(self.timeout) {
            log::warn!(
                "Actor {} still at {speed:.2} after {:.1}s of braking",
                self.actor,
                self.timer.elapsed()
            );
            Ok(Status::Success)
        } else {
            Ok(Status::Running)
        }
    }
}

/// Succeeds after `duration` seconds
#[derive(Debug, Clone)]
pub struct Idle {
    pub duration: f32,
    pub timer: Timer,
}

impl Idle {
    pub fn tick(&mut self, dt: f32) -> Status {
        self.timer.advance(dt);
        if self.timer.reached(self.duration) {
            Status::Success
        } else {
            Status::Running
        }
    }
}

/// Teleports an actor and sets its physics flag, then succeeds
#[derive(Debug, Clone)]
pub struct TransformSetter {
    pub actor: ActorId,
    pub transform: Transform,
    pub physics: bool,
}

impl TransformSetter {
    pub fn tick(&mut self, world: &mut dyn World) -> Result<Status> {
        world.set_transform(self.actor, &self.transform)?;
        world.set_simulate_physics(self.actor, self.physics)?;
        Ok(Status::Success)
    }
}

/// Destroys an actor, then succeeds
#[derive(Debug, Clone)]
pub struct Destroy {
    pub actor: ActorId,
}

impl Destroy {
    pub fn tick(&mut self, world: &mut dyn World) -> Result<Status> {
        world.destroy_actor(self.actor)?;
        Ok(Status::Success)
    }
}
