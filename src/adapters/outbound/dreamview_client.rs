use crate::common::{ScenarioError, ScenarioResult};
use crate::domains::logger::DynLogger;
use crate::domains::simulation::{DashboardPort, RoutingRequest};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::json_socket::JsonSocket;

// Dreamview streams SimWorld updates on the same socket; give up if no status shows up among them.
const MAX_SKIPPED_FRAMES: usize = 256;

/// Dashboard HMI state as reported in an `HMIStatus` frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmiStatus {
    #[serde(default)]
    pub current_map: String,
    #[serde(default)]
    pub current_vehicle: String,
    #[serde(default)]
    pub modules: BTreeMap<String, bool>,
}

impl HmiStatus {
    pub fn enabled_modules(&self) -> Vec<String> {
        self.modules
            .iter()
            .filter(|(_, on)| **on)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Dreamview's display form of a map or vehicle name: `snake_case` words capitalised and space-joined.
/// Names without underscores pass through unchanged.
pub fn display_name(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn routing_message(routing: &RoutingRequest) -> Value {
    json!({
        "type": "SendRoutingRequest",
        "start": {
            "x": routing.start_easting,
            "y": routing.start_northing,
            "z": 0,
            "heading": routing.start_heading,
        },
        "end": {
            "x": routing.end_easting,
            "y": routing.end_northing,
            "z": 0,
        },
        "waypoint": "[]",
    })
}

#[derive(Debug, Clone, Copy)]
pub struct StatusPolling {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for StatusPolling {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            interval: Duration::from_secs(1),
        }
    }
}

/// Connection to the Dreamview HMI websocket.
pub struct DreamviewClient {
    socket: JsonSocket,
    polling: StatusPolling,
    logger: DynLogger,
}

impl DreamviewClient {
    pub async fn connect(host: &str, port: u16, logger: DynLogger) -> ScenarioResult<Self> {
        let endpoint = format!("ws://{}:{}/websocket", host, port);
        let socket = JsonSocket::connect(&endpoint).await?;
        logger.info(&format!("Connected to dashboard at {}", endpoint));
        Ok(Self {
            socket,
            polling: StatusPolling::default(),
            logger,
        })
    }

    pub fn with_polling(mut self, polling: StatusPolling) -> Self {
        self.polling = polling;
        self
    }

    pub async fn status(&mut self) -> ScenarioResult<HmiStatus> {
        self.socket.send_json(&json!({ "type": "HMIStatus" })).await?;
        for _ in 0..MAX_SKIPPED_FRAMES {
            let mut frame = self.socket.recv_json().await?;
            if frame.get("type").and_then(Value::as_str) == Some("HMIStatus") {
                let data = frame.get_mut("data").map(Value::take).unwrap_or(Value::Null);
                return Ok(serde_json::from_value(data)?);
            }
        }
        Err(ScenarioError::Protocol(format!(
            "no HMIStatus among {} frames from {}",
            MAX_SKIPPED_FRAMES,
            self.socket.endpoint()
        )))
    }

    async fn action(&mut self, action: &str, value: &str) -> ScenarioResult<()> {
        self.socket
            .send_json(&json!({ "type": "HMIAction", "action": action, "value": value }))
            .await
    }

    async fn wait_for<F>(&mut self, expected: &str, done: F) -> ScenarioResult<()>
    where
        F: Fn(&HmiStatus) -> bool + Send,
    {
        let deadline = Instant::now() + self.polling.timeout;
        loop {
            let status = self.status().await?;
            if done(&status) {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ScenarioError::DashboardTimeout {
                    expected: expected.to_string(),
                    waited_secs: self.polling.timeout.as_secs(),
                });
            }
            sleep(self.polling.interval).await;
        }
    }
}

#[async_trait]
impl DashboardPort for DreamviewClient {
    async fn set_hd_map(&mut self, hd_map: &str) -> ScenarioResult<()> {
        let target = display_name(hd_map);
        self.logger.info(&format!("Setting HD map {}", target));
        self.action("CHANGE_MAP", &target).await?;
        let expected = format!("HD map {}", target);
        self.wait_for(&expected, |s| s.current_map == target).await
    }

    async fn set_vehicle(&mut self, vehicle: &str) -> ScenarioResult<()> {
        let target = display_name(vehicle);
        self.logger.info(&format!("Setting vehicle {}", target));
        self.action("CHANGE_VEHICLE", &target).await?;
        let expected = format!("vehicle {}", target);
        self.wait_for(&expected, |s| s.current_vehicle == target).await
    }

    async fn disable_autonomy(&mut self) -> ScenarioResult<()> {
        let status = self.status().await?;
        for module in status.enabled_modules() {
            self.logger.info(&format!("Stopping module {}", module));
            self.action("STOP_MODULE", &module).await?;
        }
        Ok(())
    }

    async fn setup_autonomy(&mut self, modules: &[&str], routing: &RoutingRequest) -> ScenarioResult<()> {
        for module in modules {
            self.logger.info(&format!("Starting module {}", module));
            self.action("START_MODULE", module).await?;
        }
        let wanted: Vec<String> = modules.iter().map(|m| m.to_string()).collect();
        let expected = format!("modules {} running", wanted.join(", "));
        self.wait_for(&expected, |s| {
            wanted.iter().all(|m| s.modules.get(m).copied().unwrap_or(false))
        })
        .await?;

        self.logger.info(&format!(
            "Routing to easting {:.2}, northing {:.2}",
            routing.end_easting, routing.end_northing
        ));
        self.socket.send_json(&routing_message(routing)).await
    }

    async fn close(&mut self) -> ScenarioResult<()> {
        self.logger.info(&format!("Closing dashboard session {}", self.socket.endpoint()));
        self.socket.close().await
    }
}
