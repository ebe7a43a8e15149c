//! Placement geometry for supporting actors
//!
//! Every placement is computed from a reference transform by walking along
//! forward vectors and turning in fixed increments:
//! - `k`: distance along the reference heading
//! - `j`: distance along the heading turned 90° (perpendicular offset)
//! - `z`: vertical lift applied last
//! - `yaw`: final heading, relative to the reference heading
//!
//! All functions here are pure so scenario setup is reproducible.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScenarioError};
use crate::{forward_vector, normalize_yaw};

/// Turn used to derive the perpendicular offset direction (degrees)
pub const PERPENDICULAR_YAW: f32 = 90.0;

/// Euler rotation in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f32,
    /// Heading, normalized to [-180, 180)
    pub yaw: f32,
    pub roll: f32,
}

impl Rotation {
    pub fn from_yaw(yaw: f32) -> Self {
        Self {
            pitch: 0.0,
            yaw: normalize_yaw(yaw),
            roll: 0.0,
        }
    }

    /// Rotate the heading, keeping yaw in range
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = normalize_yaw(self.yaw + delta_yaw);
    }
}

/// World-space pose of an actor
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Vec3, rotation: Rotation) -> Self {
        Self { location, rotation }
    }

    /// Unit vector along the current heading
    #[inline]
    pub fn forward(&self) -> Vec3 {
        forward_vector(&self.rotation)
    }

    /// Same pose moved `distance` along its heading
    pub fn advanced(&self, distance: f32) -> Self {
        Self {
            location: self.location + distance * self.forward(),
            rotation: self.rotation,
        }
    }
}

/// Declarative offset of a supporting actor from the reference transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacementSpec {
    pub k: f32,
    pub j: f32,
    pub z: f32,
    pub yaw: f32,
}

impl PlacementSpec {
    pub fn new(k: f32, j: f32, z: f32, yaw: f32) -> Self {
        Self { k, j, z, yaw }
    }
}

/// Placement as authored in config; every field must be present
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacementFields {
    #[serde(default)]
    pub k: Option<f32>,
    #[serde(default)]
    pub j: Option<f32>,
    #[serde(default)]
    pub z: Option<f32>,
    #[serde(default)]
    pub yaw: Option<f32>,
}

impl PlacementFields {
    /// Check completeness and finiteness for the actor `kind`
    pub fn validate(&self, kind: &str) -> Result<PlacementSpec> {
        let field = |name: &str, value: Option<f32>| -> Result<f32> {
            match value {
                Some(v) if v.is_finite() => Ok(v),
                Some(v) => Err(ScenarioError::InvalidPlacement {
                    kind: kind.to_string(),
                    reason: format!("field `{name}` is not finite ({v})"),
                }),
                None => Err(ScenarioError::InvalidPlacement {
                    kind: kind.to_string(),
                    reason: format!("missing field `{name}`"),
                }),
            }
        };

        Ok(PlacementSpec {
            k: field("k", self.k)?,
            j: field("j", self.j)?,
            z: field("z", self.z)?,
            yaw: field("yaw", self.yaw)?,
        })
    }
}

impl From<PlacementSpec> for PlacementFields {
    fn from(spec: PlacementSpec) -> Self {
        Self {
            k: Some(spec.k),
            j: Some(spec.j),
            z: Some(spec.z),
            yaw: Some(spec.yaw),
        }
    }
}

/// Absolute transform for an actor placed relative to `reference`
///
/// The intermediate perpendicular turn only steers the `j` offset; the
/// resulting heading is always `reference.yaw + spec.yaw`.
pub fn place_actor(reference: &Transform, spec: &PlacementSpec) -> Transform {
    let mut transform = *reference;
    transform.location += spec.k * transform.forward();
    transform.rotation.turn(PERPENDICULAR_YAW);
    transform.location += spec.j * transform.forward();
    transform.rotation.yaw = normalize_yaw(reference.rotation.yaw + spec.yaw);
    transform.location.z += spec.z;
    transform
}

/// Kinds of construction-zone props
pub const CONE_KIND: &str = "static.prop.constructioncone";
pub const WARNING_SIGN_KIND: &str = "static.prop.trafficwarning";
pub const DEBRIS_KIND: &str = "static.prop.dirtdebris02";

/// Cone spacing along a side
pub const CONE_SPACING: f32 = 1.0;
/// Lengths of the three cone sides, each turned 90° from the previous
pub const CONE_SIDE_LENGTHS: [f32; 3] = [4.0, 6.0, 3.0];
/// Lift applied to every cone
pub const CONE_Z_INCREMENT: f32 = 0.1;

/// A prop kind paired with where it goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropPlacement {
    pub kind: &'static str,
    pub transform: Transform,
}

/// Lay out a construction zone (warning sign, debris, cone box) at `start`
pub fn construction_layout(start: &Transform, lane_width: f32) -> Vec<PropPlacement> {
    // (kind, yaw, k, z) for the single props
    let singles: [(&'static str, f32, f32, f32); 2] = [
        (WARNING_SIGN_KIND, 180.0, 5.0, 0.0),
        (DEBRIS_KIND, 0.0, 2.0, 1.0),
    ];

    let mut props: Vec<PropPlacement> = singles
        .iter()
        .map(|&(kind, yaw, k, z)| {
            let mut transform = *start;
            transform.rotation.turn(yaw);
            transform.location += k * transform.forward();
            transform.location.z += z;
            transform.rotation.turn(PERPENDICULAR_YAW);
            PropPlacement { kind, transform }
        })
        .collect();

    // Cones start half a lane to the side, then turn around
    let mut side = *start;
    side.rotation.turn(PERPENDICULAR_YAW);
    side.location += (lane_width / 2.0) * side.forward();
    side.rotation.turn(180.0);

    for &length in &CONE_SIDE_LENGTHS {
        let forward = side.forward();
        let mut dist = 0.0;
        while dist < length {
            dist += CONE_SPACING;
            let mut location = side.location + forward * dist;
            location.z += CONE_Z_INCREMENT;
            props.push(PropPlacement {
                kind: CONE_KIND,
                transform: Transform::new(location, side.rotation),
            });
        }
        side.location += forward * length;
        side.rotation.turn(PERPENDICULAR_YAW);
    }

    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn origin_facing_x() -> Transform {
        Transform::new(Vec3::ZERO, Rotation::from_yaw(0.0))
    }

    fn assert_near(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-4, "{a:?} != {b:?}");
    }

    #[test]
    fn test_place_walker_offset() {
        let placed = place_actor(&origin_facing_x(), &PlacementSpec::new(10.0, 5.0, 0.0, 270.0));
        assert_near(placed.location, Vec3::new(10.0, 5.0, 0.0));
        assert_eq!(placed.rotation.yaw, -90.0);
    }

    #[test]
    fn test_place_respects_reference_heading() {
        // Facing +y: forward is +y, perpendicular is -x
        let reference = Transform::new(Vec3::new(1.0, 2.0, 3.0), Rotation::from_yaw(90.0));
        let placed = place_actor(&reference, &PlacementSpec::new(25.0, 0.0, 0.0, 90.0));
        assert_near(placed.location, Vec3::new(1.0, 27.0, 3.0));
        assert_eq!(placed.rotation.yaw, -180.0);

        let placed = place_actor(&reference, &PlacementSpec::new(2.0, 15.0, 2.0, 0.0));
        assert_near(placed.location, Vec3::new(-14.0, 4.0, 5.0));
        assert_eq!(placed.rotation.yaw, 90.0);
    }

    #[test]
    fn test_missing_field_is_invalid_placement() {
        let fields = PlacementFields {
            k: Some(10.0),
            j: None,
            z: Some(0.0),
            yaw: Some(270.0),
        };
        let err = fields.validate("walker.*").unwrap_err();
        assert!(matches!(err, ScenarioError::InvalidPlacement { .. }));
        assert!(err.to_string().contains("`j`"));
    }

    #[test]
    fn test_non_finite_field_is_invalid_placement() {
        let fields = PlacementFields::from(PlacementSpec::new(f32::NAN, 0.0, 0.0, 0.0));
        assert!(fields.validate("static.prop.container").is_err());
    }

    #[test]
    fn test_construction_layout() {
        let props = construction_layout(&origin_facing_x(), 3.5);
        assert_eq!(props.len(), 2 + 4 + 6 + 3);

        // Warning sign: turned around, 5 back along -x, then turned 90°
        assert_eq!(props[0].kind, WARNING_SIGN_KIND);
        assert_near(props[0].transform.location, Vec3::new(-5.0, 0.0, 0.0));
        assert_eq!(props[0].transform.rotation.yaw, -90.0);

        assert_eq!(props[1].kind, DEBRIS_KIND);
        assert_near(props[1].transform.location, Vec3::new(2.0, 0.0, 1.0));

        // First cone: half a lane to the side, one step along the side heading (-y)
        let first_cone = props[2].transform;
        assert_near(first_cone.location, Vec3::new(0.0, 0.75, 0.1));
        assert_eq!(first_cone.rotation.yaw, -90.0);

        assert!(props[2..].iter().all(|p| p.kind == CONE_KIND));
        assert!(
            props
                .iter()
                .all(|p| (-180.0..180.0).contains(&p.transform.rotation.yaw))
        );
    }

    proptest! {
        #[test]
        fn prop_zero_offset_only_changes_yaw(
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
            z in -100.0f32..100.0,
            ref_yaw in -180.0f32..180.0,
            yaw in -720.0f32..720.0,
        ) {
            let reference = Transform::new(Vec3::new(x, y, z), Rotation::from_yaw(ref_yaw));
            let placed = place_actor(&reference, &PlacementSpec::new(0.0, 0.0, 0.0, yaw));
            prop_assert_eq!(placed.location, reference.location);
            prop_assert_eq!(placed.rotation.pitch, reference.rotation.pitch);
            prop_assert_eq!(placed.rotation.roll, reference.rotation.roll);
            prop_assert_eq!(placed.rotation.yaw, normalize_yaw(reference.rotation.yaw + yaw));
        }

        #[test]
        fn prop_placement_is_deterministic(
            x in -1000.0f32..1000.0,
            y in -1000.0f32..1000.0,
            ref_yaw in -180.0f32..180.0,
            k in -50.0f32..50.0,
            j in -50.0f32..50.0,
            dz in -5.0f32..5.0,
            yaw in -360.0f32..360.0,
        ) {
            let reference = Transform::new(Vec3::new(x, y, 0.0), Rotation::from_yaw(ref_yaw));
            let spec = PlacementSpec::new(k, j, dz, yaw);
            let a = place_actor(&reference, &spec);
            let b = place_actor(&reference, &spec);
            prop_assert_eq!(a.location.to_array().map(f32::to_bits), b.location.to_array().map(f32::to_bits));
            prop_assert_eq!(a.rotation.yaw.to_bits(), b.rotation.yaw.to_bits());
            prop_assert!((-180.0..180.0).contains(&a.rotation.yaw));
        }
    }
}
