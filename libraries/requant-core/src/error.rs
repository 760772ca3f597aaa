//! Core error types for Requant

use thiserror::Error;

/// Result type alias using `RequantError`
pub type Result<T> = std::result::Result<T, RequantError>;

/// Core error type for Requant
///
/// Invalid dither or noise-shaping selectors are not errors: they fall back
/// to no dither / no shaping. Only buffer-shape violations and configuration
/// failures surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequantError {
    /// A block asked for more samples than the working buffer holds
    #[error("Block of {requested} samples exceeds working buffer of {capacity}")]
    BlockTooLarge { requested: usize, capacity: usize },

    /// Interleaved processing with no channels
    #[error("Invalid channel count: {0}")]
    InvalidChannelCount(usize),

    /// Interleaved buffer length is not a whole number of frames
    #[error("Buffer of {len} samples is not a multiple of {channels} channels")]
    MisalignedBuffer { len: usize, channels: usize },

    /// Configuration loading error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Settings that loaded but make no sense for the engine
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

impl RequantError {
    /// Create an invalid setting error
    pub fn invalid_setting(msg: impl Into<String>) -> Self {
        Self::InvalidSetting(msg.into())
    }
}

impl From<config::ConfigError> for RequantError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
