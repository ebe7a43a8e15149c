//! Deterministic world model
//!
//! Geometry and the reference world live here. Everything in this module is
//! pure or driven by an explicit fixed timestep:
//! - No wall-clock time
//! - Stable iteration order (by actor ID)
//! - No dependency on the behavior tree

pub mod contact;
pub mod geometry;
pub mod world;

pub use contact::{ContactEvent, ContactResult, bounding_radius, sphere_contact};
pub use geometry::{
    PlacementFields, PlacementSpec, PropPlacement, Rotation, Transform, construction_layout,
    place_actor,
};
pub use world::{ActorId, ActorState, KinematicWorld, World};
