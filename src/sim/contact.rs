//! Contact detection between actors
//!
//! Actors are approximated by bounding spheres sized by actor kind. A contact
//! is reported once when two spheres start overlapping; the pair must
//! separate before it can be reported again.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::world::ActorId;
use crate::consts::{PROP_RADIUS, VEHICLE_RADIUS, WALKER_RADIUS};

/// Result of an overlap check between two spheres
#[derive(Debug, Clone)]
pub struct ContactResult {
    /// Whether the spheres overlap
    pub hit: bool,
    /// Midpoint between the two surfaces along the center line
    pub point: Vec3,
    /// Overlap depth
    pub penetration: f32,
}

impl ContactResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            point: Vec3::ZERO,
            penetration: 0.0,
        }
    }
}

/// A recorded contact between two actors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactEvent {
    /// Simulation time the contact started
    pub time: f32,
    /// Lower actor id of the pair
    pub actor: ActorId,
    /// Higher actor id of the pair
    pub other: ActorId,
    pub point: Vec3,
}

impl ContactEvent {
    /// Whether `id` is part of this contact
    pub fn involves(&self, id: ActorId) -> bool {
        self.actor == id || self.other == id
    }
}

/// Bounding radius for an actor kind (blueprint-style names)
pub fn bounding_radius(kind: &str) -> f32 {
    if kind.starts_with("vehicle.") {
        VEHICLE_RADIUS
    } else if kind.starts_with("walker.") {
        WALKER_RADIUS
    } else {
        PROP_RADIUS
    }
}

/// Check overlap between two bounding spheres
pub fn sphere_contact(a_pos: Vec3, a_radius: f32, b_pos: Vec3, b_radius: f32) -> ContactResult {
    let delta = b_pos - a_pos;
    let dist = delta.length();
    let reach = a_radius + b_radius;

    if dist >= reach {
        return ContactResult::miss();
    }

    // Coincident centers have no direction; report the contact at the center
    let dir = delta.normalize_or_zero();
    let point = a_pos + dir * (a_radius - (reach - dist) / 2.0);

    ContactResult {
        hit: true,
        point,
        penetration: reach - dist,
    }
}
