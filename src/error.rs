//! Error types shared by the world collaborator and the scenario lifecycle

use crate::sim::ActorId;

pub type Result<T> = std::result::Result<T, ScenarioError>;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Invalid placement for {kind}: {reason}")]
    InvalidPlacement { kind: String, reason: String },

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Unknown sim rate: {0} (expected low, medium or high)")]
    UnknownSimRate(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{scenario} needs at least one supporting actor")]
    NoActors { scenario: String },

    #[error("Actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("Spawn failed for {kind}: {reason}")]
    SpawnFailed { kind: String, reason: String },

    #[error("Command rejected by actor {actor}: {reason}")]
    CommandRejected { actor: ActorId, reason: String },

    #[error("Teardown failed for actor {actor}: {reason}")]
    TeardownFailed { actor: ActorId, reason: String },
}
