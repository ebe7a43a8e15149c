//! World collaborator interface and a kinematic reference world
//!
//! The scenario engine never moves actors itself; it issues commands through
//! [`World`] and reads state back. [`KinematicWorld`] is a small deterministic
//! implementation used by the binary and the tests:
//! - Fixed timestep only
//! - Stable iteration order (by actor ID)
//! - Constant commanded speed along the actor's heading, linear braking

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::contact::{ContactEvent, bounding_radius, sphere_contact};
use super::geometry::Transform;
use crate::consts::MAX_BRAKE_DECEL;
use crate::error::{Result, ScenarioError};

/// Opaque handle to a simulator actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Commands and queries the scenario engine needs from a simulator
pub trait World {
    /// Advance the simulation by one fixed timestep
    fn step(&mut self, dt: f32);

    /// Spawn an actor of `kind` at `transform`
    fn spawn_actor(&mut self, kind: &str, transform: &Transform) -> Result<ActorId>;
    fn destroy_actor(&mut self, id: ActorId) -> Result<()>;
    fn is_alive(&self, id: ActorId) -> bool;

    fn set_simulate_physics(&mut self, id: ActorId, enabled: bool) -> Result<()>;
    /// Teleport an actor
    fn set_transform(&mut self, id: ActorId, transform: &Transform) -> Result<()>;
    /// Hold `speed` along the actor's heading until released or braked
    fn set_target_velocity(&mut self, id: ActorId, speed: f32) -> Result<()>;
    /// Stop holding a commanded speed; the actor keeps its current velocity
    fn release_velocity(&mut self, id: ActorId) -> Result<()>;
    /// Brake with intensity in [0, 1]; replaces any commanded speed
    fn apply_brake(&mut self, id: ActorId, brake: f32) -> Result<()>;

    fn actor_transform(&self, id: ActorId) -> Option<Transform>;
    fn actor_velocity(&self, id: ActorId) -> Option<Vec3>;
    /// Every contact recorded so far, oldest first
    fn contact_events(&self) -> &[ContactEvent];
}

/// Per-actor state in the kinematic world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    pub kind: String,
    pub transform: Transform,
    /// Signed speed along the heading
    pub speed: f32,
    /// Commanded speed, held every step
    pub target_speed: Option<f32>,
    /// Brake intensity (0-1)
    pub brake: f32,
    pub simulate_physics: bool,
    pub radius: f32,
}

impl ActorState {
    fn velocity(&self) -> Vec3 {
        self.transform.forward() * self.speed
    }
}

/// Deterministic point-mass world
#[derive(Debug, Clone, Default)]
pub struct KinematicWorld {
    /// Simulation time in seconds
    pub time: f32,
    /// Steps taken
    pub time_ticks: u64,
    actors: BTreeMap<ActorId, ActorState>,
    contacts: Vec<ContactEvent>,
    /// Pairs currently overlapping (lower id first)
    touching: BTreeSet<(ActorId, ActorId)>,
    /// Actors whose destroy command is refused
    pinned: BTreeSet<ActorId>,
    next_id: u32,
}

impl KinematicWorld {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Refuse future destroy commands for `id` (simulates a stuck actor)
    pub fn pin_actor(&mut self, id: ActorId) {
        self.pinned.insert(id);
    }

    fn actor_mut(&mut self, id: ActorId) -> Result<&mut ActorState> {
        self.actors.get_mut(&id).ok_or(ScenarioError::ActorNotFound(id))
    }

    fn detect_contacts(&mut self) {
        let actors: Vec<&ActorState> = self.actors.values().collect();
        for (i, a) in actors.iter().enumerate() {
            for b in &actors[i + 1..] {
                let pair = (a.id, b.id);
                let result =
                    sphere_contact(a.transform.location, a.radius, b.transform.location, b.radius);
                if !result.hit {
                    self.touching.remove(&pair);
                } else if self.touching.insert(pair) {
                    log::debug!("Contact {} <-> {} at t={:.2}", a.id, b.id, self.time);
                    self.contacts.push(ContactEvent {
                        time: self.time,
                        actor: a.id,
                        other: b.id,
                        point: result.point,
                    });
                }
            }
        }
    }
}

impl World for KinematicWorld {
    fn step(&mut self, dt: f32) {
        self.time_ticks += 1;
        self.time += dt;

        for actor in self.actors.values_mut() {
            if !actor.simulate_physics {
                continue;
            }
            if let Some(target) = actor.target_speed {
                actor.speed = target;
            } else if actor.brake > 0.0 && actor.speed != 0.0 {
                let decel = actor.brake * MAX_BRAKE_DECEL * dt;
                actor.speed = if actor.speed > 0.0 {
                    (actor.speed - decel).max(0.0)
                } else {
                    (actor.speed + decel).min(0.0)
                };
            }
            let velocity = actor.velocity();
            actor.transform.location += velocity * dt;
        }

        self.detect_contacts();
    }

    fn spawn_actor(&mut self, kind: &str, transform: &Transform) -> Result<ActorId> {
        if !transform.location.is_finite() || !transform.rotation.yaw.is_finite() {
            return Err(ScenarioError::SpawnFailed {
                kind: kind.to_string(),
                reason: format!("non-finite transform {transform:?}"),
            });
        }

        let id = ActorId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.actors.insert(
            id,
            ActorState {
                id,
                kind: kind.to_string(),
                transform: *transform,
                speed: 0.0,
                target_speed: None,
                brake: 0.0,
                simulate_physics: false,
                radius: bounding_radius(kind),
            },
        );
        Ok(id)
    }

    fn destroy_actor(&mut self, id: ActorId) -> Result<()> {
        if self.pinned.contains(&id) {
            return Err(ScenarioError::CommandRejected {
                actor: id,
                reason: "destroy refused".to_string(),
            });
        }
        self.actors
            .remove(&id)
            .ok_or(ScenarioError::ActorNotFound(id))?;
        self.touching.retain(|&(a, b)| a != id && b != id);
        Ok(())
    }

    fn is_alive(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    fn set_simulate_physics(&mut self, id: ActorId, enabled: bool) -> Result<()> {
        self.actor_mut(id)?.simulate_physics = enabled;
        Ok(())
    }

    fn set_transform(&mut self, id: ActorId, transform: &Transform) -> Result<()> {
        self.actor_mut(id)?.transform = *transform;
        Ok(())
    }

    fn set_target_velocity(&mut self, id: ActorId, speed: f32) -> Result<()> {
        if !speed.is_finite() {
            return Err(ScenarioError::CommandRejected {
                actor: id,
                reason: format!("non-finite speed {speed}"),
            });
        }
        let actor = self.actor_mut(id)?;
        actor.target_speed = Some(speed);
        actor.brake = 0.0;
        Ok(())
    }

    fn release_velocity(&mut self, id: ActorId) -> Result<()> {
        self.actor_mut(id)?.target_speed = None;
        Ok(())
    }

    fn apply_brake(&mut self, id: ActorId, brake: f32) -> Result<()> {
        if !brake.is_finite() {
            return Err(ScenarioError::CommandRejected {
                actor: id,
                reason: format!("non-finite brake {brake}"),
            });
        }
        let actor = self.actor_mut(id)?;
        actor.target_speed = None;
        actor.brake = brake.clamp(0.0, 1.0);
        Ok(())
    }

    fn actor_transform(&self, id: ActorId) -> Option<Transform> {
        self.actors.get(&id).map(|a| a.transform)
    }

    fn actor_velocity(&self, id: ActorId) -> Option<Vec3> {
        self.actors.get(&id).map(ActorState::velocity)
    }

    fn contact_events(&self) -> &[ContactEvent] {
        &self.contacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::Rotation;

    fn spawn_moving(world: &mut KinematicWorld, kind: &str, x: f32, yaw: f32) -> ActorId {
        let transform = Transform::new(Vec3::new(x, 0.0, 0.0), Rotation::from_yaw(yaw));
        let id = world.spawn_actor(kind, &transform).unwrap();
        world.set_simulate_physics(id, true).unwrap();
        id
    }

    #[test]
    fn test_target_velocity_moves_along_heading() {
        let mut world = KinematicWorld::new();
        let id = spawn_moving(&mut world, "walker.*", 0.0, 90.0);
        world.set_target_velocity(id, 4.0).unwrap();

        for _ in 0..20 {
            world.step(SIM_DT);
        }

        let location = world.actor_transform(id).unwrap().location;
        assert!((location - Vec3::new(0.0, 4.0, 0.0)).length() < 1e-3);
        assert!((world.actor_velocity(id).unwrap().length() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_brake_decelerates_to_zero() {
        let mut world = KinematicWorld::new();
        let id = spawn_moving(&mut world, "vehicle.test", 0.0, 0.0);
        world.set_target_velocity(id, 4.0).unwrap();
        world.step(SIM_DT);

        world.apply_brake(id, 1.0).unwrap();
        // 4 m/s at 8 m/s² stops within half a second
        for _ in 0..12 {
            world.step(SIM_DT);
        }
        assert_eq!(world.actor(id).unwrap().speed, 0.0);
    }

    #[test]
    fn test_released_velocity_coasts() {
        let mut world = KinematicWorld::new();
        let id = spawn_moving(&mut world, "vehicle.test", 0.0, 0.0);
        world.set_target_velocity(id, 2.0).unwrap();
        world.step(SIM_DT);
        world.release_velocity(id).unwrap();
        world.step(SIM_DT);
        assert_eq!(world.actor(id).unwrap().speed, 2.0);
    }

    #[test]
    fn test_physics_disabled_actor_stays_put() {
        let mut world = KinematicWorld::new();
        let transform = Transform::new(Vec3::ZERO, Rotation::default());
        let id = world.spawn_actor("vehicle.test", &transform).unwrap();
        world.set_target_velocity(id, 5.0).unwrap();
        world.step(SIM_DT);
        assert_eq!(world.actor_transform(id).unwrap().location, Vec3::ZERO);
    }

    #[test]
    fn test_contact_reported_once_per_overlap() {
        let mut world = KinematicWorld::new();
        let ego = spawn_moving(&mut world, "vehicle.test", 0.0, 0.0);
        let prop = spawn_moving(&mut world, "static.prop.container", 5.0, 0.0);
        world.set_target_velocity(ego, 10.0).unwrap();

        // Drive through the prop and out the other side
        for _ in 0..40 {
            world.step(SIM_DT);
        }

        let contacts = world.contact_events();
        assert_eq!(contacts.len(), 1);
        assert!(contacts[0].involves(ego));
        assert!(contacts[0].involves(prop));
    }

    #[test]
    fn test_commands_on_missing_actor_fail() {
        let mut world = KinematicWorld::new();
        let id = spawn_moving(&mut world, "walker.*", 0.0, 0.0);
        world.destroy_actor(id).unwrap();

        assert!(!world.is_alive(id));
        assert!(matches!(
            world.set_target_velocity(id, 1.0),
            Err(ScenarioError::ActorNotFound(_))
        ));
        assert!(world.destroy_actor(id).is_err());
    }

    #[test]
    fn test_pinned_actor_refuses_destroy() {
        let mut world = KinematicWorld::new();
        let id = spawn_moving(&mut world, "walker.*", 0.0, 0.0);
        world.pin_actor(id);
        assert!(world.destroy_actor(id).is_err());
        assert!(world.is_alive(id));
    }
}
