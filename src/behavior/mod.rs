//! Behavior tree for scripted actors
//!
//! A closed set of node kinds, ticked once per simulation step by a single
//! driver. Every node moves through
//! `Invalid -> Running -> {Success, Failure}` and never leaves a terminal
//! status; ticking a terminal node is a no-op.

pub mod composite;
pub mod leaves;
pub mod trigger;

use serde::{Deserialize, Serialize};

use crate::sim::{ActorId, Transform, World};
pub use composite::{ParallelFirst, Sequence};
pub use leaves::{
    Destroy, DistanceTrack, Idle, Stop, Timer, TransformSetter, TriggerGate, VelocityApply,
};
pub use trigger::{in_time_to_arrival, time_to_arrival};

/// Status of a node after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    /// Not ticked yet (or cancelled)
    #[default]
    Invalid,
    Running,
    Success,
    Failure,
}

impl Status {
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Success | Status::Failure)
    }
}

/// What a node does when ticked
#[derive(Debug)]
pub enum NodeKind {
    TriggerGate(TriggerGate),
    VelocityApply(VelocityApply),
    DistanceTrack(DistanceTrack),
    Stop(Stop),
    Idle(Idle),
    TransformSetter(TransformSetter),
    Destroy(Destroy),
    Sequence(Sequence),
    ParallelFirst(ParallelFirst),
}

/// A named behavior tree node
#[derive(Debug)]
pub struct Node {
    name: String,
    status: Status,
    /// Number of times this node did work
    ticks: u32,
    kind: NodeKind,
}

impl Node {
    fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            status: Status::Invalid,
            ticks: 0,
            kind,
        }
    }

    /// Succeeds once `actor` is within `threshold` seconds of reaching `other`
    pub fn trigger_gate(
        name: impl Into<String>,
        actor: ActorId,
        other: ActorId,
        threshold: f32,
    ) -> Self {
        Self::new(
            name,
            NodeKind::TriggerGate(TriggerGate {
                actor,
                other,
                threshold,
            }),
        )
    }

    /// Holds `speed` on `actor` until cancelled by its parent
    pub fn keep_velocity(name: impl Into<String>, actor: ActorId, speed: f32) -> Self {
        Self::new(name, NodeKind::VelocityApply(VelocityApply { actor, speed }))
    }

    /// Succeeds after `actor` has covered `distance`
    pub fn drive_distance(name: impl Into<String>, actor: ActorId, distance: f32) -> Self {
        Self::new(
            name,
            NodeKind::DistanceTrack(DistanceTrack::new(actor, distance)),
        )
    }

    /// Brakes `actor` with `max_brake` until stopped or `timeout` elapses
    pub fn stop_actor(
        name: impl Into<String>,
        actor: ActorId,
        max_brake: f32,
        timeout: f32,
    ) -> Self {
        Self::new(
            name,
            NodeKind::Stop(Stop {
                actor,
                max_brake,
                timeout,
                timer: Timer::default(),
            }),
        )
    }

    pub fn idle(name: impl Into<String>, duration: f32) -> Self {
        Self::new(
            name,
            NodeKind::Idle(Idle {
                duration,
                timer: Timer::default(),
            }),
        )
    }

    pub fn set_transform(
        name: impl Into<String>,
        actor: ActorId,
        transform: Transform,
        physics: bool,
    ) -> Self {
        Self::new(
            name,
            NodeKind::TransformSetter(TransformSetter {
                actor,
                transform,
                physics,
            }),
        )
    }

    pub fn destroy_actor(name: impl Into<String>, actor: ActorId) -> Self {
        Self::new(name, NodeKind::Destroy(Destroy { actor }))
    }

    pub fn sequence(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(
            name,
            NodeKind::Sequence(Sequence {
                children,
                current: 0,
            }),
        )
    }

    pub fn parallel_first(name: impl Into<String>, children: Vec<Node>) -> Self {
        Self::new(name, NodeKind::ParallelFirst(ParallelFirst { children }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Child nodes of a composite (empty for leaves)
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Sequence(s) => &s.children,
            NodeKind::ParallelFirst(p) => &p.children,
            _ => &[],
        }
    }

    /// Advance this node by one step
    pub fn tick(&mut self, world: &mut dyn World, dt: f32) -> Status {
        if self.status.is_terminal() {
            return self.status;
        }
        self.ticks += 1;

        let result = match &mut self.kind {
            NodeKind::TriggerGate(gate) => Ok(gate.tick(world)),
            NodeKind::VelocityApply(velocity) => velocity.tick(world),
            NodeKind::DistanceTrack(track) => track.tick(world),
            NodeKind::Stop(stop) => stop.tick(world, dt),
            NodeKind::Idle(idle) => Ok(idle.tick(dt)),
            NodeKind::TransformSetter(setter) => setter.tick(world),
            NodeKind::Destroy(destroy) => destroy.tick(world),
            NodeKind::Sequence(sequence) => Ok(sequence.tick(world, dt)),
            NodeKind::ParallelFirst(parallel) => Ok(parallel.tick(world, dt)),
        };

        let status = result.unwrap_or_else(|e| {
            log::warn!("{}: {e}", self.name);
            Status::Failure
        });
        if status != self.status {
            log::debug!("{}: {:?} -> {:?}", self.name, self.status, status);
        }
        self.status = status;
        status
    }

    /// Abort a running node, releasing any command it holds
    ///
    /// Terminal and never-ticked nodes are left alone.
    pub fn cancel(&mut self, world: &mut dyn World) {
        if self.status != Status::Running {
            return;
        }

        match &mut self.kind {
            NodeKind::VelocityApply(velocity) => {
                if let Err(e) = world.release_velocity(velocity.actor) {
                    log::warn!("{}: release failed: {e}", self.name);
                }
            }
            NodeKind::DistanceTrack(track) => track.reset(),
            NodeKind::Stop(stop) => stop.timer.reset(),
            NodeKind::Idle(idle) => idle.timer.reset(),
            NodeKind::Sequence(sequence) => sequence.cancel(world),
            NodeKind::ParallelFirst(parallel) => parallel.cancel(world),
            NodeKind::TriggerGate(_) | NodeKind::TransformSetter(_) | NodeKind::Destroy(_) => {}
        }

        log::debug!("{}: cancelled", self.name);
        self.status = Status::Invalid;
    }
}
