//! Error types for bus service operations

use thiserror::Error;

use crate::types::RemoteObjectHandle;

/// Errors that can occur at the bus service boundary
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// Connecting to the bus failed
    #[error("Failed to connect to bus: {reason}")]
    ConnectFailed { reason: String },

    /// Operation attempted without a live bus connection
    #[error("Not connected to bus")]
    NotConnected,

    /// A local object is already registered at the requested path
    #[error("Object path already in use: {path}")]
    PathInUse { path: String },

    /// Registering a local object failed
    #[error("Failed to register object at '{path}': {reason}")]
    RegistrationFailed { path: String, reason: String },

    /// The remote object is gone or unreachable
    #[error("Remote object unreachable: {handle}")]
    ObjectUnreachable { handle: RemoteObjectHandle },

    /// A remote method call failed
    #[error("Invoke '{method}' failed: {reason}")]
    InvokeFailed { method: String, reason: String },

    /// Subscribing to property changes or signals failed
    #[error("Subscription failed: {reason}")]
    SubscribeFailed { reason: String },

    /// Transport-level failure
    #[error("Bus transport error: {message}")]
    Transport { message: String },
}

impl BusError {
    /// Create a connect failure error
    pub fn connect_failed(reason: impl Into<String>) -> Self {
        Self::ConnectFailed {
            reason: reason.into(),
        }
    }

    /// Create a registration failure error
    pub fn registration_failed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RegistrationFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invoke failure error
    pub fn invoke_failed(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvokeFailed {
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Create a subscription failure error
    pub fn subscribe_failed(reason: impl Into<String>) -> Self {
        Self::SubscribeFailed {
            reason: reason.into(),
        }
    }

    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}
