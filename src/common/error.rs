use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("Remote command {command} failed: {message}")]
    Remote { command: String, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Cannot select from an empty list of {what}")]
    EmptySelection { what: String },

    #[error("{agent} collided with {other}")]
    Collision { agent: String, other: String },

    #[error("Dashboard did not report {expected} within {waited_secs}s")]
    DashboardTimeout { expected: String, waited_secs: u64 },
}

pub type ScenarioResult<T> = Result<T, ScenarioError>;
