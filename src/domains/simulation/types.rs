use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Position plus Euler rotation (degrees), in simulator world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector,
    pub rotation: Vector,
}

impl Transform {
    /// Ground-plane transform at (x, z) with no rotation.
    pub fn planar(x: f64, z: f64) -> Self {
        Self {
            position: Vector::new(x, 0.0, z),
            rotation: Vector::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub position: Vector,
    pub rotation: Vector,
    #[serde(default)]
    pub destinations: Vec<Transform>,
}

impl SpawnPoint {
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.rotation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    Ego,
    Npc,
    Pedestrian,
}

impl AgentType {
    /// Numeric role tag used by the simulator API.
    pub fn wire_value(self) -> u8 {
        match self {
            AgentType::Ego => 1,
            AgentType::Npc => 2,
            AgentType::Pedestrian => 3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub transform: Transform,
    #[serde(default)]
    pub velocity: Vector,
    #[serde(default)]
    pub angular_velocity: Vector,
}

impl AgentState {
    pub fn at(transform: Transform) -> Self {
        Self {
            transform,
            ..Self::default()
        }
    }
}

/// An agent created through a simulator session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AgentHandle {
    pub uid: String,
    pub name: String,
    pub agent_type: AgentType,
}

impl fmt::Display for AgentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.uid)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    pub northing: f64,
    pub easting: f64,
    #[serde(default)]
    pub altitude: f64,
    /// Heading in degrees.
    #[serde(default)]
    pub orientation: f64,
}

/// Calendar timestamp understood by the simulator's time-of-day control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimDateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

/// Routing goal in map (UTM) coordinates as the autonomy dashboard expects it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingRequest {
    pub start_easting: f64,
    pub start_northing: f64,
    /// Radians.
    pub start_heading: f64,
    pub end_easting: f64,
    pub end_northing: f64,
}

impl RoutingRequest {
    pub fn between(start: &GpsFix, end: &GpsFix) -> Self {
        Self {
            start_easting: start.easting,
            start_northing: start.northing,
            start_heading: start.orientation.to_radians(),
            end_easting: end.easting,
            end_northing: end.northing,
        }
    }
}
