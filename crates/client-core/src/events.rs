//! Event delivery for the coordination layer
//!
//! The coordinator reports everything an application needs to render its
//! peer list through two complementary channels:
//!
//! - **[`BusEventHandler`]** - a notification sink trait the application
//!   implements. Pure forwarding; the coordinator calls it from its worker
//!   task after each state mutation.
//! - **[`CoordinatorEvent`]** - a broadcast stream carrying the same
//!   notifications plus state transitions and errors, for consumers that
//!   prefer a channel over a trait object.
//!
//! # Examples
//!
//! ```rust
//! use peerbus_client_core::events::BusEventHandler;
//! use peerbus_client_core::PeerRecord;
//! use peerbus_bus_core::RemoteObjectHandle;
//! use async_trait::async_trait;
//!
//! struct PeerListAdapter;
//!
//! #[async_trait]
//! impl BusEventHandler for PeerListAdapter {
//!     async fn on_peer_added(&self, peer: PeerRecord) {
//!         println!("new peer: {}", peer.display_label);
//!     }
//!
//!     async fn on_peer_updated(&self, peer: PeerRecord) {
//!         println!("peer changed: {}", peer.display_label);
//!     }
//!
//!     async fn on_peer_removed(&self, handle: RemoteObjectHandle) {
//!         println!("peer gone: {handle}");
//!     }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use peerbus_bus_core::RemoteObjectHandle;

use crate::client::types::{CoordinatorState, PeerRecord};

/// Notification sink consumed by the coordinator.
///
/// Implementations receive peer lifecycle notifications carrying registry
/// snapshots, free-text status/error messages, and free-text signal
/// traces. They should forward to the UI without logic of their own.
#[async_trait]
pub trait BusEventHandler: Send + Sync {
    /// A newly discovered peer was added to the registry.
    async fn on_peer_added(&self, peer: PeerRecord);

    /// A watched property changed on a registered peer.
    async fn on_peer_updated(&self, peer: PeerRecord);

    /// A peer was removed from the registry.
    async fn on_peer_removed(&self, handle: RemoteObjectHandle);

    /// Free-text status or error message.
    async fn on_status_message(&self, _message: String) {}

    /// Free-text trace of a received bus signal.
    async fn on_signal_trace(&self, _message: String) {}
}

/// Events published on the coordinator's broadcast channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CoordinatorEvent {
    /// A peer was added to the registry
    PeerAdded {
        peer: PeerRecord,
        timestamp: DateTime<Utc>,
    },

    /// A registered peer's cached state changed
    PeerUpdated {
        peer: PeerRecord,
        timestamp: DateTime<Utc>,
    },

    /// A peer was removed from the registry
    PeerRemoved {
        handle: RemoteObjectHandle,
        timestamp: DateTime<Utc>,
    },

    /// The coordinator transitioned between lifecycle states
    StateChanged {
        old_state: CoordinatorState,
        new_state: CoordinatorState,
        timestamp: DateTime<Utc>,
    },

    /// Free-text status message
    StatusMessage {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Free-text signal trace
    SignalTrace {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// An error was surfaced
    Error {
        error: String,
        recoverable: bool,
        timestamp: DateTime<Utc>,
    },
}
