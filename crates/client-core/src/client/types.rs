//! Type definitions for the coordination layer
//!
//! Data structures shared across the coordinator: cached peer views,
//! locally hosted object records, the lifecycle state machine, and
//! coordinator statistics.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use peerbus_bus_core::{PropertyMap, RegistrationId, RemoteObjectHandle};

/// Locally cached view of a discovered peer.
///
/// Created when a discovered object's session is joined, mutated on
/// property-change signals, removed on loss. Snapshots of this record are
/// what the notification sink receives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Identity and address of the remote object
    pub handle: RemoteObjectHandle,
    /// Label for UI listing, derived from the configured label property
    /// and the handle address
    pub display_label: String,
    /// Last known values of the watched properties
    pub cached_state: PropertyMap,
    /// When the peer was added to the registry
    pub joined_at: DateTime<Utc>,
}

/// A locally hosted bus object.
///
/// Owned exclusively by the coordinator worker; created by `CreateLocal`,
/// destroyed by `DeleteLocal` or disconnect.
#[derive(Debug, Clone)]
pub struct LocalObjectRecord {
    /// Location string the object was created from, as given
    pub location: String,
    /// Sanitized object path the object is registered under
    pub path: String,
    /// Bus registration handle, needed to unregister
    pub registration: RegistrationId,
    /// When the object was registered
    pub created_at: DateTime<Utc>,
}

/// Coordinator lifecycle state.
///
/// `Idle -> Connecting -> Active -> Disconnecting -> Terminated`, with a
/// direct `Connecting -> Terminated` edge on connect failure (fail-fast,
/// no retry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoordinatorState {
    /// Created, not yet connected
    Idle,
    /// Connect command in progress
    Connecting,
    /// Connected; processing commands and discovery events
    Active,
    /// Disconnect command in progress
    Disconnecting,
    /// Stopped, either cleanly or after a connect failure
    Terminated,
}

impl fmt::Display for CoordinatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "Idle",
            Self::Connecting => "Connecting",
            Self::Active => "Active",
            Self::Disconnecting => "Disconnecting",
            Self::Terminated => "Terminated",
        };
        write!(f, "{name}")
    }
}

/// Statistics about the coordinator's current state and activity
#[derive(Debug, Clone)]
pub struct CoordinatorStats {
    /// Current lifecycle state
    pub state: CoordinatorState,
    /// Number of peers currently in the registry
    pub peer_count: usize,
    /// Number of currently hosted local objects
    pub local_count: usize,
    /// Total peers joined since the coordinator started
    pub total_joined: usize,
    /// Total peers lost since the coordinator started
    pub total_lost: usize,
    /// Commands processed by the worker, including injected bus events
    pub commands_processed: u64,
}
