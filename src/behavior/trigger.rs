//! Time-to-arrival trigger condition
//!
//! Estimates how long two actors need to meet if both keep their current
//! velocities. Only the closing component of the relative velocity counts;
//! actors that are not closing never arrive.

use crate::consts::MIN_CLOSING_SPEED;
use crate::sim::{ActorId, World};

/// Seconds until `actor` reaches `other`, or `None` if they never close in
///
/// Missing actors and near-zero closing speeds both yield `None`.
pub fn time_to_arrival(world: &dyn World, actor: ActorId, other: ActorId) -> Option<f32> {
    let from = world.actor_transform(actor)?.location;
    let to = world.actor_transform(other)?.location;
    let relative_vel = world.actor_velocity(actor)? - world.actor_velocity(other)?;

    let offset = to - from;
    let closing_speed = relative_vel.dot(offset.normalize_or_zero());
    if !closing_speed.is_finite() || closing_speed <= MIN_CLOSING_SPEED {
        return None;
    }

    Some(offset.length() / closing_speed)
}

/// True once `actor` is within `threshold` seconds of reaching `other`
pub fn in_time_to_arrival(
    world: &dyn World,
    actor: ActorId,
    other: ActorId,
    threshold: f32,
) -> bool {
    time_to_arrival(world, actor, other).is_some_and(|t| t <= threshold)
}
