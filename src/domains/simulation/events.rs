use crate::common::ScenarioError;
use serde::Deserialize;

use super::types::Vector;

/// Label used when the simulator reports a collision with no second agent.
pub const STATIC_OBSTACLE: &str = "static obstacle";

/// Raw event as delivered by the simulator during a run.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SimulatorEvent {
    Collision {
        agent: String,
        #[serde(default)]
        other: Option<String>,
        #[serde(default)]
        contact: Option<Vector>,
    },
    #[serde(other)]
    Unhandled,
}

/// Collision as handed to registered callbacks, with agents already resolved to labels.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionEvent {
    pub agent: String,
    pub other: Option<String>,
    pub contact: Option<Vector>,
}

impl CollisionEvent {
    /// The fatal error that aborts a run on this collision.
    pub fn abort(&self) -> ScenarioError {
        ScenarioError::Collision {
            agent: self.agent.clone(),
            other: self.other.clone().unwrap_or_else(|| STATIC_OBSTACLE.to_string()),
        }
    }
}
