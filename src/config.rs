use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prefix shared by every scenario variable, e.g. `LGSVL__MAP`.
pub const ENV_PREFIX: &str = "LGSVL";
pub const ENV_PREFIX_SEPARATOR: &str = "__";

/// Ego profile used when `LGSVL__VEHICLE_0` is unset (Lincoln2017MKZ, Apollo 5.0 modular testing).
pub const DEFAULT_VEHICLE: &str = "5c7fb3b0-1fd4-4943-8347-f73a05749718";

/// Scenario parameters, read once from the environment and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub simulator_host: String,
    pub simulator_port: u16,
    #[serde(rename = "autopilot_0_host")]
    pub bridge_host: String,
    #[serde(rename = "autopilot_0_port")]
    pub bridge_port: u16,
    pub map: String,
    #[serde(rename = "vehicle_0")]
    pub vehicle: String,
    #[serde(rename = "autopilot_hd_map")]
    pub hd_map: String,
    #[serde(rename = "autopilot_0_vehicle_config")]
    pub vehicle_config: String,
    pub random_seed: i64,
    /// Re-pass the seed when falling back to a plain scene reload.
    pub reseed_on_fallback: bool,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl ScenarioConfig {
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Same as [`ScenarioConfig::from_env`] but reads from `vars` instead of the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        Self::load(Some(vars))
    }

    fn load(vars: Option<HashMap<String, String>>) -> Result<Self> {
        let env = Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_PREFIX_SEPARATOR)
            .try_parsing(true)
            .source(vars);

        let settings = Config::builder()
            .set_default("simulator_host", "127.0.0.1")?
            .set_default("simulator_port", 8181)?
            .set_default("autopilot_0_host", "127.0.0.1")?
            .set_default("autopilot_0_port", 9090)?
            .set_default("map", "san_francisco")?
            .set_default("vehicle_0", DEFAULT_VEHICLE)?
            .set_default("autopilot_hd_map", "SanFrancisco")?
            .set_default("autopilot_0_vehicle_config", "Lincoln2017MKZ")?
            .set_default("random_seed", 51472)?
            .set_default("reseed_on_fallback", false)?
            .add_source(env)
            .build()
            .context("reading LGSVL__* environment")?;

        settings
            .try_deserialize()
            .context("invalid LGSVL__* environment")
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            simulator_host: "127.0.0.1".to_string(),
            simulator_port: 8181,
            bridge_host: "127.0.0.1".to_string(),
            bridge_port: 9090,
            map: "san_francisco".to_string(),
            vehicle: DEFAULT_VEHICLE.to_string(),
            hd_map: "SanFrancisco".to_string(),
            vehicle_config: "Lincoln2017MKZ".to_string(),
            random_seed: 51472,
            reseed_on_fallback: false,
            log_file: None,
        }
    }
}
