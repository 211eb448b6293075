//! Error types for MargaNav

use marga_map::{GridError, PlanError};
use thiserror::Error;

/// MargaNav error type
#[derive(Error, Debug)]
pub enum NavError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed command: {0}")]
    Parse(String),

    #[error("Unknown command type '{0}'")]
    UnknownCommand(String),

    #[error("World is not configured; send 'configure' first")]
    NotConfigured,

    #[error("Mission aborted: {0}")]
    MissionAborted(String),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl NavError {
    /// Stable snake_case identifier carried in `error.data.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            NavError::Io(_) => "io_error",
            NavError::Config(_) => "config_error",
            NavError::Parse(_) => "parse_error",
            NavError::UnknownCommand(_) => "unknown_command",
            NavError::NotConfigured => "not_configured",
            NavError::MissionAborted(_) => "mission_aborted",
            NavError::Grid(GridError::InvalidConfig(_)) => "config_error",
            NavError::Grid(GridError::OutOfBounds { .. }) => "out_of_bounds",
            NavError::Grid(GridError::InvalidRadius(_)) => "parse_error",
            NavError::Plan(PlanError::InvalidEndpoint { .. }) => "invalid_endpoint",
            NavError::Plan(PlanError::OutOfBounds { .. }) => "out_of_bounds",
            NavError::Plan(PlanError::SearchLimit { .. }) => "search_limit",
            NavError::Plan(PlanError::Cancelled { .. }) => "cancelled",
        }
    }
}

impl From<serde_json::Error> for NavError {
    fn from(e: serde_json::Error) -> Self {
        NavError::Parse(e.to_string())
    }
}

impl From<toml::de::Error> for NavError {
    fn from(e: toml::de::Error) -> Self {
        NavError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NavError>;
