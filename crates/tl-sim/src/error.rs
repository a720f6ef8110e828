//! Error types for the simulated control system.

use thiserror::Error;

/// Errors encountered while configuring or running the control system.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid configuration: {what}")]
    InvalidConfig { what: String },

    #[error(transparent)]
    Core(#[from] tl_core::CoreError),

    #[error(transparent)]
    Control(#[from] tl_controls::ControlError),

    #[error("Failed to spawn task {task}: {source}")]
    Spawn {
        task: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Task {task} panicked")]
    TaskPanicked { task: String },

    #[error("Lock poisoned: {what}")]
    Poisoned { what: &'static str },

    #[error("Sample channel disconnected")]
    ChannelClosed,

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type SimResult<T> = Result<T, SimError>;
