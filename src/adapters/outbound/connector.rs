use crate::common::ScenarioResult;
use crate::domains::logger::{tagged, DynLogger};
use crate::domains::simulation::{ConnectionFactory, DashboardPort, SimulatorPort};
use async_trait::async_trait;

use super::dreamview_client::{DreamviewClient, StatusPolling};
use super::simulator_client::SimulatorClient;

/// Opens real websocket sessions to the simulator and the Dreamview dashboard.
pub struct WebSocketConnector {
    logger: DynLogger,
    polling: StatusPolling,
}

impl WebSocketConnector {
    pub fn new(logger: DynLogger) -> Self {
        Self {
            logger,
            polling: StatusPolling::default(),
        }
    }

    pub fn with_polling(mut self, polling: StatusPolling) -> Self {
        self.polling = polling;
        self
    }
}

#[async_trait]
impl ConnectionFactory for WebSocketConnector {
    async fn open_simulator(&self, host: &str, port: u16) -> ScenarioResult<Box<dyn SimulatorPort>> {
        let client = SimulatorClient::connect(host, port, tagged(&self.logger, "simulator")).await?;
        Ok(Box::new(client))
    }

    async fn open_dashboard(&self, host: &str, port: u16) -> ScenarioResult<Box<dyn DashboardPort>> {
        let client = DreamviewClient::connect(host, port, tagged(&self.logger, "dashboard"))
            .await?
            .with_polling(self.polling);
        Ok(Box::new(client))
    }
}
