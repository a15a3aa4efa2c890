use crate::common::{ScenarioError, ScenarioResult};
use crate::domains::logger::DynLogger;
use crate::domains::simulation::{
    AgentHandle, AgentState, AgentType, CollisionEvent, CollisionHandler, GpsFix, SimDateTime, SimulatorEvent,
    SimulatorPort, SpawnPoint, Transform,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;

use super::json_socket::JsonSocket;

/// Unwrap a simulator reply: `{"error": msg}` fails, otherwise the `result` member (null when absent).
pub fn parse_reply(command: &str, reply: Value) -> ScenarioResult<Value> {
    match reply {
        Value::Object(mut map) => {
            if let Some(err) = map.remove("error") {
                let message = match err {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                return Err(ScenarioError::Remote {
                    command: command.to_string(),
                    message,
                });
            }
            Ok(map.remove("result").unwrap_or(Value::Null))
        }
        other => Err(ScenarioError::Protocol(format!(
            "unexpected reply to {}: {}",
            command, other
        ))),
    }
}

/// Client session for the simulator's JSON-over-WebSocket command API.
pub struct SimulatorClient {
    socket: JsonSocket,
    agents: HashMap<String, AgentHandle>,
    collision_handlers: HashMap<String, Vec<CollisionHandler>>,
    logger: DynLogger,
}

impl SimulatorClient {
    pub async fn connect(host: &str, port: u16, logger: DynLogger) -> ScenarioResult<Self> {
        let endpoint = format!("ws://{}:{}", host, port);
        let socket = JsonSocket::connect(&endpoint).await?;
        logger.info(&format!("Connected to simulator at {}", endpoint));
        Ok(Self {
            socket,
            agents: HashMap::new(),
            collision_handlers: HashMap::new(),
            logger,
        })
    }

    async fn command(&mut self, name: &str, arguments: Value) -> ScenarioResult<Value> {
        self.socket
            .send_json(&json!({ "command": name, "arguments": arguments }))
            .await?;
        let reply = self.socket.recv_json().await?;
        parse_reply(name, reply)
    }

    async fn command_as<T: DeserializeOwned>(&mut self, name: &str, arguments: Value) -> ScenarioResult<T> {
        let result = self.command(name, arguments).await?;
        Ok(serde_json::from_value(result)?)
    }

    fn label(&self, uid: &str) -> String {
        self.agents
            .get(uid)
            .map(|agent| agent.to_string())
            .unwrap_or_else(|| uid.to_string())
    }

    fn dispatch(&mut self, events: &[Value]) -> ScenarioResult<()> {
        for raw in events {
            match serde_json::from_value::<SimulatorEvent>(raw.clone()) {
                Ok(SimulatorEvent::Collision { agent, other, contact }) => {
                    let event = CollisionEvent {
                        agent: self.label(&agent),
                        other: other.as_deref().map(|uid| self.label(uid)),
                        contact,
                    };
                    if let Some(handlers) = self.collision_handlers.get_mut(&agent) {
                        for handler in handlers.iter_mut() {
                            handler(&event)?;
                        }
                    }
                }
                Ok(SimulatorEvent::Unhandled) => {
                    self.logger.warn(&format!("Ignoring simulator event {}", raw));
                }
                Err(e) => {
                    self.logger.warn(&format!("Malformed simulator event {}: {}", raw, e));
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SimulatorPort for SimulatorClient {
    async fn load_scene(&mut self, scene: &str, seed: Option<i64>) -> ScenarioResult<()> {
        self.command("simulator/load_scene", json!({ "scene": scene, "seed": seed }))
            .await?;
        Ok(())
    }

    async fn current_scene(&mut self) -> ScenarioResult<Option<String>> {
        self.command_as("simulator/current_scene", json!({})).await
    }

    async fn reset(&mut self) -> ScenarioResult<()> {
        self.command("simulator/reset", json!({})).await?;
        Ok(())
    }

    async fn set_date_time(&mut self, at: SimDateTime, fixed: bool) -> ScenarioResult<()> {
        let mut arguments = serde_json::to_value(at)?;
        arguments["fixed"] = Value::Bool(fixed);
        self.command("environment/datetime/set", arguments).await?;
        Ok(())
    }

    async fn spawn_points(&mut self) -> ScenarioResult<Vec<SpawnPoint>> {
        self.command_as("map/spawn/get", json!({})).await
    }

    async fn add_agent(&mut self, name: &str, agent_type: AgentType, state: &AgentState) -> ScenarioResult<AgentHandle> {
        let uid: String = self
            .command_as(
                "simulator/add_agent",
                json!({
                    "name": name,
                    "type": agent_type.wire_value(),
                    "state": state,
                    "color": Value::Null,
                }),
            )
            .await?;
        let agent = AgentHandle {
            uid: uid.clone(),
            name: name.to_string(),
            agent_type,
        };
        self.agents.insert(uid, agent.clone());
        Ok(agent)
    }

    async fn agent_state(&mut self, agent: &AgentHandle) -> ScenarioResult<AgentState> {
        self.command_as("agent/state/get", json!({ "uid": agent.uid })).await
    }

    async fn connect_bridge(&mut self, agent: &AgentHandle, host: &str, port: u16) -> ScenarioResult<()> {
        self.command(
            "vehicle/bridge/connect",
            json!({ "uid": agent.uid, "address": host, "port": port }),
        )
        .await?;
        Ok(())
    }

    async fn on_collision(&mut self, agent: &AgentHandle, handler: CollisionHandler) -> ScenarioResult<()> {
        self.command("agent/on_collision", json!({ "uid": agent.uid })).await?;
        self.collision_handlers
            .entry(agent.uid.clone())
            .or_default()
            .push(handler);
        Ok(())
    }

    async fn map_to_gps(&mut self, transform: &Transform) -> ScenarioResult<GpsFix> {
        self.command_as("map/to_gps", json!({ "transform": transform })).await
    }

    async fn add_random_agents(&mut self, agent_type: AgentType) -> ScenarioResult<()> {
        self.command(
            "simulator/add_random_agents",
            json!({ "type": agent_type.wire_value() }),
        )
        .await?;
        Ok(())
    }

    async fn run(&mut self, time_limit_secs: f64) -> ScenarioResult<()> {
        let mut reply = self
            .command(
                "simulator/run",
                json!({ "time_limit": time_limit_secs, "time_scale": Value::Null }),
            )
            .await?;
        // The simulator pauses after each batch of events; a reply without events ends the run.
        while let Some(events) = reply.get("events").and_then(Value::as_array) {
            self.dispatch(events)?;
            reply = self.command("simulator/continue", json!({})).await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> ScenarioResult<()> {
        self.logger.info(&format!("Closing simulator session {}", self.socket.endpoint()));
        self.socket.close().await
    }
}
