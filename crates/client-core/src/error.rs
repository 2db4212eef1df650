//! Error types for the coordination layer
//!
//! The coordinator runs detached from any synchronous caller, so most
//! errors are not returned - they are surfaced through the notification
//! sink and the event stream. The taxonomy here distinguishes the one
//! fatal case (connect failure, which terminates the coordinator) from the
//! recoverable ones that leave it running.

use thiserror::Error;

use peerbus_bus_core::BusError;

/// Result type for coordinator operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors produced by the coordination layer
#[derive(Debug, Error)]
pub enum ClientError {
    /// Bus connection could not be established; the coordinator is
    /// terminated and will not retry
    #[error("Connect failed: {reason}")]
    ConnectFailure { reason: String },

    /// A local object could not be registered; nothing was added
    #[error("Failed to create '{location}': {reason}")]
    RegistrationFailure { location: String, reason: String },

    /// A remote call failed or the peer vanished; no state changed
    #[error("Invoke '{method}' failed: {reason}")]
    InvokeFailure { method: String, reason: String },

    /// Operation attempted in the wrong coordinator state
    #[error("Invalid state: expected {expected}, actual {actual}")]
    InvalidState { expected: String, actual: String },

    /// Underlying bus error
    #[error("Bus error: {0}")]
    Bus(#[from] BusError),

    /// Internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ClientError {
    /// Create a connect failure error
    pub fn connect_failure(reason: impl Into<String>) -> Self {
        Self::ConnectFailure {
            reason: reason.into(),
        }
    }

    /// Create a registration failure error
    pub fn registration_failure(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegistrationFailure {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create an invoke failure error
    pub fn invoke_failure(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvokeFailure {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error terminates the coordinator.
    ///
    /// Only connect failures are fatal; everything else is surfaced and
    /// the coordinator keeps running.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectFailure { .. })
    }
}
