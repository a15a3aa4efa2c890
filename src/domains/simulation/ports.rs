use crate::common::ScenarioResult;
use async_trait::async_trait;

use super::events::CollisionEvent;
use super::types::{AgentHandle, AgentState, AgentType, GpsFix, RoutingRequest, SimDateTime, SpawnPoint, Transform};

/// Callback run inline while the simulator drives a run. Returning an error aborts the run.
pub type CollisionHandler = Box<dyn FnMut(&CollisionEvent) -> ScenarioResult<()> + Send>;

/// Port for the simulation server session.
#[async_trait]
pub trait SimulatorPort: Send {
    /// Load a scene; `seed` of `None` leaves the simulator's randomisation unseeded.
    async fn load_scene(&mut self, scene: &str, seed: Option<i64>) -> ScenarioResult<()>;
    async fn current_scene(&mut self) -> ScenarioResult<Option<String>>;
    async fn reset(&mut self) -> ScenarioResult<()>;
    /// Set time of day; `fixed` freezes the day/night cycle.
    async fn set_date_time(&mut self, at: SimDateTime, fixed: bool) -> ScenarioResult<()>;
    async fn spawn_points(&mut self) -> ScenarioResult<Vec<SpawnPoint>>;
    async fn add_agent(&mut self, name: &str, agent_type: AgentType, state: &AgentState) -> ScenarioResult<AgentHandle>;
    async fn agent_state(&mut self, agent: &AgentHandle) -> ScenarioResult<AgentState>;
    async fn connect_bridge(&mut self, agent: &AgentHandle, host: &str, port: u16) -> ScenarioResult<()>;
    async fn on_collision(&mut self, agent: &AgentHandle, handler: CollisionHandler) -> ScenarioResult<()>;
    async fn map_to_gps(&mut self, transform: &Transform) -> ScenarioResult<GpsFix>;
    async fn add_random_agents(&mut self, agent_type: AgentType) -> ScenarioResult<()>;
    /// Blocks until `time_limit_secs` of simulated time elapse or a callback aborts.
    async fn run(&mut self, time_limit_secs: f64) -> ScenarioResult<()>;
    async fn close(&mut self) -> ScenarioResult<()>;
}

/// Port for the autonomy dashboard.
#[async_trait]
pub trait DashboardPort: Send {
    async fn set_hd_map(&mut self, hd_map: &str) -> ScenarioResult<()>;
    async fn set_vehicle(&mut self, vehicle: &str) -> ScenarioResult<()>;
    /// Stop every module currently reported as running.
    async fn disable_autonomy(&mut self) -> ScenarioResult<()>;
    /// Start `modules` in order, then send the routing goal.
    async fn setup_autonomy(&mut self, modules: &[&str], routing: &RoutingRequest) -> ScenarioResult<()>;
    async fn close(&mut self) -> ScenarioResult<()>;
}

/// Opens the two sessions a scenario needs.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn open_simulator(&self, host: &str, port: u16) -> ScenarioResult<Box<dyn SimulatorPort>>;
    async fn open_dashboard(&self, host: &str, port: u16) -> ScenarioResult<Box<dyn DashboardPort>>;
}
