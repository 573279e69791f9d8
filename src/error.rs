//! Error types and result utilities for bridge configuration.

use thiserror::Error;

/// Convenience type alias for results that may contain a [`BridgeError`].
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Errors raised while building the bridge, before any audio flows.
///
/// The hot path (ring writes and reads, burst ingestion, frame pulls) is
/// total and never produces one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// A configuration value is out of range or inconsistent with another.
    ///
    /// Typically a zero frame size or a buffer capacity smaller than one frame.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An argument passed to a constructor or helper is invalid.
    #[error("Invalid parameter error: {0}")]
    InvalidParameter(String),
}

impl BridgeError {
    /// Create an invalid-configuration error for the named field.
    pub fn invalid_config(field: &str, reason: impl AsRef<str>) -> Self {
        Self::InvalidConfig(format!("{field}: {}", reason.as_ref()))
    }

    /// Create an invalid-parameter error for the named argument.
    pub fn invalid_parameter(name: &str, reason: impl AsRef<str>) -> Self {
        Self::InvalidParameter(format!("{name}: {}", reason.as_ref()))
    }
}
