//! Error types for settings, history storage and trace replay

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("settings serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("invalid setting {key}: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    #[error("event loop error: {0}")]
    EventLoop(#[from] calloop::Error),

    #[error("invalid trace line {line}: {reason}")]
    InvalidTrace { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
