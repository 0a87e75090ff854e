use crate::plan::PlanError;
use pam_spine::{ConfigError, LimitsError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("missing value for {flag}")]
    MissingValue { flag: String },
    #[error("invalid value for {flag}: {value}")]
    InvalidArgument { flag: String, value: String },
    #[error("unknown argument {0}")]
    UnknownArgument(String),
    #[error("failed to read plan {}: {source}", path.display())]
    PlanIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse plan: {0}")]
    PlanParse(#[from] serde_json::Error),
    #[error("invalid plan: {0}")]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Limits(#[from] LimitsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("observation recorder: {0}")]
    Recorder(#[source] std::io::Error),
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("control thread panicked")]
    ControlThread,
    #[error("control loop stopped by watchdog")]
    Watchdog,
    #[error("control loop stopped on a driver fault")]
    DriverFault,
}
