//! Parking lot scenario
//!
//! The ego drives through a parking lot with a pedestrian and static
//! obstacles. Once the ego is close enough in time, the pedestrian crosses
//! in front of it, stops, and the scenario idles before ending.

use serde::{Deserialize, Serialize};

use super::{ActorRegistry, ScenarioDefinition};
use crate::behavior::Node;
use crate::criteria::Criterion;
use crate::error::{Result, ScenarioError};
use crate::sim::{PlacementFields, PlacementSpec, World, place_actor};

/// A supporting actor: blueprint kind plus its offset from the ego
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSpec {
    pub kind: String,
    #[serde(flatten)]
    pub placement: PlacementFields,
}

impl ActorSpec {
    pub fn new(kind: &str, placement: PlacementSpec) -> Self {
        Self {
            kind: kind.to_string(),
            placement: placement.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// Supporting actors; the first one is the scripted pedestrian
    pub actors: Vec<ActorSpec>,
    /// Crossing speed of the pedestrian
    pub other_actor_target_velocity: f32,
    /// Brake intensity used to stop the pedestrian
    pub other_actor_max_brake: f32,
    /// Give up braking after this long
    pub other_actor_stop_timeout: f32,
    /// Distance the pedestrian crosses before stopping
    pub dist_actor_travel: f32,
    /// Time-to-arrival that starts the crossing
    pub time_to_reach: f32,
    /// Grace period after the pedestrian stops
    pub ego_stand: f32,
    pub timeout: f32,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            actors: vec![
                ActorSpec::new("walker.*", PlacementSpec::new(10.0, 5.0, 0.0, 270.0)),
                ActorSpec::new("static.prop.container", PlacementSpec::new(25.0, 0.0, 0.0, 90.0)),
                ActorSpec::new(
                    "static.prop.shoppingcart",
                    PlacementSpec::new(2.0, 15.0, 2.0, 0.0),
                ),
            ],
            other_actor_target_velocity: 4.0,
            other_actor_max_brake: 1.0,
            other_actor_stop_timeout: 10.0,
            dist_actor_travel: 10.0,
            time_to_reach: 5.0,
            ego_stand: 60.0,
            timeout: 200.0,
        }
    }
}

impl ParkingConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParkingScenario {
    pub config: ParkingConfig,
}

impl ParkingScenario {
    pub fn new(config: ParkingConfig) -> Self {
        Self { config }
    }
}

impl ScenarioDefinition for ParkingScenario {
    fn name(&self) -> &str {
        "ParkingScenario"
    }

    fn default_timeout(&self) -> f32 {
        self.config.timeout
    }

    fn initialize_actors(
        &self,
        world: &mut dyn World,
        registry: &mut ActorRegistry,
    ) -> Result<()> {
        for spec in &self.config.actors {
            let placement = spec.placement.validate(&spec.kind)?;
            let transform = place_actor(registry.reference(), &placement);
            registry.spawn(world, &spec.kind, transform, true)?;
        }
        Ok(())
    }

    fn create_behavior(&self, registry: &ActorRegistry) -> Result<Node> {
        let config = &self.config;
        let ego = registry.ego();
        let walker = registry
            .actors()
            .first()
            .ok_or_else(|| ScenarioError::NoActors {
                scenario: self.name().to_string(),
            })?
            .id;

        // The pedestrian waits, crosses a fixed distance, stops, then the ego idles
        let keep_velocity = Node::parallel_first(
            "keep velocity other",
            vec![
                Node::keep_velocity("walker velocity", walker, config.other_actor_target_velocity),
                Node::drive_distance("walker drive distance", walker, config.dist_actor_travel),
            ],
        );

        Ok(Node::sequence(
            "scenario sequence",
            vec![
                Node::trigger_gate("start condition", ego, walker, config.time_to_reach),
                keep_velocity,
                Node::stop_actor(
                    "walker stop",
                    walker,
                    config.other_actor_max_brake,
                    config.other_actor_stop_timeout,
                ),
                Node::idle("ego stand", config.ego_stand),
            ],
        ))
    }

    fn create_test_criteria(&self, registry: &ActorRegistry) -> Vec<Criterion> {
        vec![Criterion::collision(registry.ego())]
    }
}
