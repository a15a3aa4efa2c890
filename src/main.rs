use std::sync::Arc;

use svl_scenario::adapters::outbound::{flush_file_logger, init_scenario_logger, WebSocketConnector};
use svl_scenario::application::ScenarioRunner;
use svl_scenario::ScenarioConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ScenarioConfig::from_env()?;

    // fast_log owns the `log` facade, so tracing is installed without a log bridge.
    let logger = init_scenario_logger(config.log_file.as_deref());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(
        simulator = %format!("{}:{}", config.simulator_host, config.simulator_port),
        bridge = %format!("{}:{}", config.bridge_host, config.bridge_port),
        seed = config.random_seed,
        "Starting random-traffic scenario"
    );

    let connector = Arc::new(WebSocketConnector::new(logger.clone()));
    let runner = ScenarioRunner::new(config, connector, logger.clone());
    let outcome = runner.run().await;
    if let Ok(report) = &outcome {
        logger.info(&format!(
            "Scenario finished: ego {} spawned at point {}, routed to destination {}",
            report.ego, report.spawn_index, report.destination_index
        ));
    }

    flush_file_logger();
    outcome?;
    Ok(())
}
