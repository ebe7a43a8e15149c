//! Composite controllers
//!
//! - [`Sequence`]: one child at a time, left to right
//! - [`ParallelFirst`]: every live child each tick, done when any one succeeds

use super::{Node, Status};
use crate::sim::World;

/// Runs children in order; fails as soon as one fails
#[derive(Debug)]
pub struct Sequence {
    pub children: Vec<Node>,
    /// Index of the child ticked next
    pub current: usize,
}

impl Sequence {
    pub fn tick(&mut self, world: &mut dyn World, dt: f32) -> Status {
        let Some(child) = self.children.get_mut(self.current) else {
            return Status::Success;
        };

        match child.tick(world, dt) {
            Status::Success => {
                self.current += 1;
                // The next child starts on the next tick
                if self.current >= self.children.len() {
                    Status::Success
                } else {
                    Status::Running
                }
            }
            Status::Failure => Status::Failure,
            Status::Running | Status::Invalid => Status::Running,
        }
    }

    pub fn cancel(&mut self, world: &mut dyn World) {
        for child in &mut self.children {
            child.cancel(world);
        }
        self.current = 0;
    }
}

/// Ticks all live children; succeeds with the first child that succeeds
///
/// Children still running at that point are cancelled: their held commands
/// are released rather than left to be superseded.
#[derive(Debug)]
pub struct ParallelFirst {
    pub children: Vec<Node>,
}

impl ParallelFirst {
    pub fn tick(&mut self, world: &mut dyn World, dt: f32) -> Status {
        if self.children.is_empty() {
            return Status::Success;
        }

        for i in 0..self.children.len() {
            if self.children[i].status().is_terminal() {
                continue;
            }
            match self.children[i].tick(world, dt) {
                status @ (Status::Success | Status::Failure) => {
                    self.cancel_except(world, i);
                    return status;
                }
                Status::Running | Status::Invalid => {}
            }
        }

        Status::Running
    }

    fn cancel_except(&mut self, world: &mut dyn World, finished: usize) {
        for (i, child) in self.children.iter_mut().enumerate() {
            if i != finished {
                child.cancel(world);
            }
        }
    }

    pub fn cancel(&mut self, world: &mut dyn World) {
        for child in &mut self.children {
            child.cancel(world);
        }
    }
}
