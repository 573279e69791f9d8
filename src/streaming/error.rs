//! Error types for the transport and host boundaries.
//!
//! Ring overflow and underrun are steady-state conditions and never appear
//! here; only setup and boundary I/O can fail.

use crate::error::BridgeError;
use std::net::SocketAddr;

/// Streaming-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The configuration handed to a component was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] BridgeError),

    /// Network I/O failed after the socket was set up
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),

    /// The transport could not bind its socket
    #[error("Failed to bind {address}: {source}")]
    Bind {
        /// Address the bind was attempted on.
        address: SocketAddr,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The streaming host side refused or lost a frame
    #[error("Host link error: {0}")]
    HostLink(String),

    /// Protocol-specific errors
    #[error("Protocol error: {protocol} - {details}")]
    Protocol {
        /// Protocol or layer that raised the error.
        protocol: &'static str,
        /// Human-readable description.
        details: String,
    },

    /// An operation was attempted in a state that does not allow it
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl StreamError {
    /// Create a bind error for `address`.
    pub const fn bind(address: SocketAddr, source: std::io::Error) -> Self {
        Self::Bind { address, source }
    }

    /// Create a host link error
    pub fn host_link(details: impl Into<String>) -> Self {
        Self::HostLink(details.into())
    }

    /// Create a protocol error
    pub fn protocol(protocol: &'static str, details: impl Into<String>) -> Self {
        Self::Protocol {
            protocol,
            details: details.into(),
        }
    }

    /// Check if the bridge can keep running after this error
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::HostLink(_) | Self::Protocol { .. }
        )
    }

    /// Check if this is a fatal error that should stop the bridge
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }
}

/// Result type for streaming operations
pub type StreamResult<T> = Result<T, StreamError>;
