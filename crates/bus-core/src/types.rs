//! Shared data types for the bus service boundary
//!
//! These are the types exchanged between a coordination layer and a bus
//! substrate: object identities, variant-typed property payloads,
//! announcement metadata, and the callback signatures through which the bus
//! delivers asynchronous events.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Variant-typed property or argument payload exchanged with the bus.
///
/// Bus substrates marshal arbitrarily typed values; on this side of the
/// boundary they are represented as JSON values.
pub type PropertyValue = serde_json::Value;

/// Property name to value mapping for a single object interface.
pub type PropertyMap = HashMap<String, PropertyValue>;

/// Identity and address of a discovered remote object.
///
/// Immutable once created; two handles are equal when both the bus name and
/// the object path match. The `Display` rendering concatenates both parts
/// and is what peer display labels embed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoteObjectHandle {
    /// Unique bus name of the hosting peer (e.g. ":1.42")
    pub bus_name: String,
    /// Object path on that peer (e.g. "/FrontDoor")
    pub object_path: String,
}

impl RemoteObjectHandle {
    /// Create a handle from a bus name and object path.
    pub fn new(bus_name: impl Into<String>, object_path: impl Into<String>) -> Self {
        Self {
            bus_name: bus_name.into(),
            object_path: object_path.into(),
        }
    }
}

impl fmt::Display for RemoteObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.bus_name, self.object_path)
    }
}

/// Metadata broadcast with every announcement.
///
/// Announcements advertise locally hosted objects; the metadata identifies
/// the announcing application and device and may carry arbitrary extra
/// attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnounceMetadata {
    /// Human-readable application name
    pub app_name: String,
    /// Human-readable device name
    pub device_name: String,
    /// Additional announced attributes
    pub attributes: PropertyMap,
}

impl AnnounceMetadata {
    /// Create metadata with an application and device name.
    pub fn new(app_name: impl Into<String>, device_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            device_name: device_name.into(),
            attributes: PropertyMap::new(),
        }
    }
}

/// Data-only definition of a locally hosted bus object.
///
/// Method dispatch and marshaling for hosted objects are the bus
/// substrate's concern; the definition only names the implemented interface
/// and the initial property values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalObjectDefinition {
    /// Interface the object implements
    pub interface: String,
    /// Initial property values
    pub properties: PropertyMap,
}

/// Handle returned when a local object is registered on the bus.
///
/// Required to unregister the object later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationId(pub Uuid);

impl RegistrationId {
    /// Generate a fresh registration id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked when a remote object is discovered or lost.
///
/// Delivered on a bus-owned task; must enqueue, not mutate.
pub type DiscoveryCallback = Arc<dyn Fn(RemoteObjectHandle) + Send + Sync>;

/// Callback invoked when a watched property changes on a remote object.
pub type PropertyChangedCallback =
    Arc<dyn Fn(RemoteObjectHandle, String, PropertyValue) + Send + Sync>;

/// Callback invoked when a subscribed signal is emitted.
///
/// Arguments are the emitting sender's bus name, the signal member name,
/// and the signal arguments.
pub type SignalCallback = Arc<dyn Fn(String, String, Vec<PropertyValue>) + Send + Sync>;

/// Predicate deciding whether a session joiner is accepted on a port.
pub type AcceptPredicate = Arc<dyn Fn(u16, &str) -> bool + Send + Sync>;
