//! Construction zone scenario
//!
//! The ego drives toward a stationary construction setup (traffic warning,
//! debris and a box of cones) placed ahead of it. The props stand for a
//! while, are removed by the tree, and the run ends once the ego has driven
//! its distance.

use serde::{Deserialize, Serialize};

use super::{ActorRegistry, ScenarioDefinition};
use crate::behavior::Node;
use crate::criteria::Criterion;
use crate::error::Result;
use crate::sim::{World, construction_layout};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstructionConfig {
    /// Distance from the reference to the setup
    pub start_distance: f32,
    pub lane_width: f32,
    /// How long the props stay before removal
    pub actor_stand: f32,
    /// Ego distance that ends the scenario
    pub ego_distance_driven: f32,
    pub timeout: f32,
}

impl Default for ConstructionConfig {
    fn default() -> Self {
        Self {
            start_distance: 40.0,
            lane_width: 3.5,
            actor_stand: 15.0,
            ego_distance_driven: 40.0,
            timeout: 60.0,
        }
    }
}

impl ConstructionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConstructionSetupScenario {
    pub config: ConstructionConfig,
}

impl ConstructionSetupScenario {
    pub fn new(config: ConstructionConfig) -> Self {
        Self { config }
    }
}

impl ScenarioDefinition for ConstructionSetupScenario {
    fn name(&self) -> &str {
        "ConstructionSetupCrossing"
    }

    fn default_timeout(&self) -> f32 {
        self.config.timeout
    }

    fn initialize_actors(
        &self,
        world: &mut dyn World,
        registry: &mut ActorRegistry,
    ) -> Result<()> {
        let start = registry.reference().advanced(self.config.start_distance);
        for prop in construction_layout(&start, self.config.lane_width) {
            registry.spawn(world, prop.kind, prop.transform, true)?;
        }
        Ok(())
    }

    fn create_behavior(&self, registry: &ActorRegistry) -> Result<Node> {
        let actors = registry.actors();
        let mut steps: Vec<Node> = actors
            .iter()
            .map(|a| Node::set_transform(format!("{} transform", a.kind), a.id, a.transform, true))
            .collect();
        steps.push(Node::idle("actor stand", self.config.actor_stand));
        steps.extend(
            actors
                .iter()
                .map(|a| Node::destroy_actor(format!("{} destroy", a.kind), a.id)),
        );
        steps.push(Node::drive_distance(
            "end condition",
            registry.ego(),
            self.config.ego_distance_driven,
        ));

        Ok(Node::parallel_first(
            "construction root",
            vec![Node::sequence("scenario sequence", steps)],
        ))
    }

    fn create_test_criteria(&self, registry: &ActorRegistry) -> Vec<Criterion> {
        vec![Criterion::collision(registry.ego())]
    }
}
