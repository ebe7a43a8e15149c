//! Test criteria
//!
//! Criteria observe the world every tick, after the behavior tree has issued
//! its commands, and accumulate a verdict. They never command actors and
//! never stop the behavior tree; their verdict is read once the run ends.

use serde::{Deserialize, Serialize};

use crate::behavior::Status;
use crate::sim::{ActorId, ContactEvent, World};

/// Final outcome of one criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionVerdict {
    pub name: String,
    /// `Running` if read before the criterion was terminated
    pub status: Status,
    pub passed: bool,
    /// Observed count (e.g. collisions)
    pub actual_value: u32,
    /// Count required to pass
    pub expected_value: u32,
}

/// Fails on any contact involving the watched actor
#[derive(Debug, Clone)]
pub struct CollisionTest {
    pub actor: ActorId,
    /// Contacts involving `actor`, in the order they happened
    pub collisions: Vec<ContactEvent>,
    /// Number of world contact events already inspected
    seen: usize,
}

impl CollisionTest {
    pub fn new(actor: ActorId) -> Self {
        Self {
            actor,
            collisions: Vec::new(),
            seen: 0,
        }
    }

    fn update(&mut self, world: &dyn World) {
        let events = world.contact_events();
        for event in events.iter().skip(self.seen) {
            if event.involves(self.actor) {
                let other = if event.actor == self.actor {
                    event.other
                } else {
                    event.actor
                };
                log::warn!(
                    "Collision: {} hit {} at t={:.2}",
                    self.actor,
                    other,
                    event.time
                );
                self.collisions.push(*event);
            }
        }
        self.seen = events.len();
    }
}

#[derive(Debug, Clone)]
pub enum CriterionKind {
    Collision(CollisionTest),
}

/// An independently sampled pass/fail check
#[derive(Debug, Clone)]
pub struct Criterion {
    name: String,
    terminated: bool,
    kind: CriterionKind,
}

impl Criterion {
    /// No contacts allowed for `actor`
    pub fn collision(actor: ActorId) -> Self {
        Self {
            name: "CollisionTest".to_string(),
            terminated: false,
            kind: CriterionKind::Collision(CollisionTest::new(actor)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &CriterionKind {
        &self.kind
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Sample the world; ignored once terminated
    pub fn update(&mut self, world: &dyn World) {
        if self.terminated {
            return;
        }
        match &mut self.kind {
            CriterionKind::Collision(test) => test.update(world),
        }
    }

    /// Freeze the verdict
    pub fn terminate(&mut self) {
        self.terminated = true;
    }

    /// Observed and required values
    fn values(&self) -> (u32, u32) {
        match &self.kind {
            CriterionKind::Collision(test) => (test.collisions.len() as u32, 0),
        }
    }

    /// Running until terminated, then pass/fail; a failure is final at once
    pub fn status(&self) -> Status {
        let (actual, expected) = self.values();
        match (self.terminated, actual == expected) {
            (false, true) => Status::Running,
            (_, false) => Status::Failure,
            (true, true) => Status::Success,
        }
    }

    pub fn verdict(&self) -> CriterionVerdict {
        let (actual_value, expected_value) = self.values();
        CriterionVerdict {
            name: self.name.clone(),
            status: self.status(),
            passed: actual_value == expected_value,
            actual_value,
            expected_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::{KinematicWorld, Rotation, Transform};
    use glam::Vec3;

    fn spawn_at(world: &mut KinematicWorld, kind: &str, x: f32) -> ActorId {
        let transform = Transform::new(Vec3::new(x, 0.0, 0.0), Rotation::from_yaw(0.0));
        let id = world.spawn_actor(kind, &transform).unwrap();
        world.set_simulate_physics(id, true).unwrap();
        id
    }

    #[test]
    fn test_no_contact_passes() {
        let mut world = KinematicWorld::new();
        let ego = spawn_at(&mut world, "vehicle.ego", 0.0);
        spawn_at(&mut world, "static.prop.container", 50.0);

        let mut criterion = Criterion::collision(ego);
        for _ in 0..10 {
            world.step(SIM_DT);
            criterion.update(&world);
        }
        assert_eq!(criterion.status(), Status::Running);

        criterion.terminate();
        assert_eq!(criterion.status(), Status::Success);
        let verdict = criterion.verdict();
        assert_eq!(verdict.status, Status::Success);
        assert!(verdict.passed);
        assert_eq!(verdict.actual_value, 0);
    }

    #[test]
    fn test_contact_with_ego_fails() {
        let mut world = KinematicWorld::new();
        let ego = spawn_at(&mut world, "vehicle.ego", 0.0);
        spawn_at(&mut world, "static.prop.container", 5.0);
        world.set_target_velocity(ego, 10.0).unwrap();

        let mut criterion = Criterion::collision(ego);
        for _ in 0..40 {
            world.step(SIM_DT);
            criterion.update(&world);
        }

        assert_eq!(criterion.status(), Status::Failure);
        assert_eq!(criterion.verdict().actual_value, 1);
    }

    #[test]
    fn test_contacts_between_others_ignored() {
        let mut world = KinematicWorld::new();
        let ego = spawn_at(&mut world, "vehicle.ego", -100.0);
        let cart = spawn_at(&mut world, "static.prop.shoppingcart", 0.0);
        spawn_at(&mut world, "static.prop.container", 5.0);
        world.set_target_velocity(cart, 10.0).unwrap();

        let mut criterion = Criterion::collision(ego);
        for _ in 0..20 {
            world.step(SIM_DT);
            criterion.update(&world);
        }
        assert_eq!(world.contact_events().len(), 1);
        assert!(criterion.verdict().passed);
    }

    #[test]
    fn test_terminated_criterion_is_frozen() {
        let mut world = KinematicWorld::new();
        let ego = spawn_at(&mut world, "vehicle.ego", 0.0);
        spawn_at(&mut world, "static.prop.container", 5.0);
        world.set_target_velocity(ego, 10.0).unwrap();

        let mut criterion = Criterion::collision(ego);
        criterion.terminate();
        for _ in 0..40 {
            world.step(SIM_DT);
            criterion.update(&world);
        }
        assert!(criterion.verdict().passed);
        assert_eq!(criterion.status(), Status::Success);
    }
}
