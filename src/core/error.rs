use thiserror::Error;

use crate::core::types::{CameraId, GuardId};

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Guard not found: {0:?}")]
    GuardNotFound(GuardId),

    #[error("Camera not found: {0:?}")]
    CameraNotFound(CameraId),

    #[error("Invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Scenario parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, WatchError>;
