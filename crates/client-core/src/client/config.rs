//! Configuration for the coordination layer

use peerbus_bus_core::{AnnounceMetadata, PropertyMap};

/// Default contact port for session acceptance and announcements.
pub const DEFAULT_CONTACT_PORT: u16 = 2134;

/// Default capacity of the coordinator event broadcast channel.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// What to watch for on the bus.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Interface whose implementers are discovered
    pub interface: String,
    /// Properties subscribed to and cached per peer
    pub properties: Vec<String>,
    /// Property whose value becomes the peer display label; the handle
    /// address is used when absent
    pub label_property: Option<String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interface: "org.peerbus.Object".to_string(),
            properties: Vec::new(),
            label_property: None,
        }
    }
}

/// How locally created objects are defined.
#[derive(Debug, Clone)]
pub struct LocalObjectConfig {
    /// Interface hosted objects implement
    pub interface: String,
    /// Initial property values for every hosted object
    pub initial_properties: PropertyMap,
    /// Property that carries the object's location string, if any
    pub location_property: Option<String>,
}

impl Default for LocalObjectConfig {
    fn default() -> Self {
        Self {
            interface: "org.peerbus.Object".to_string(),
            initial_properties: PropertyMap::new(),
            location_property: None,
        }
    }
}

/// A signal subscription whose deliveries are traced to the sink.
#[derive(Debug, Clone)]
pub struct SignalSpec {
    pub interface: String,
    pub member: String,
}

/// Configuration for a [`Coordinator`](crate::Coordinator).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Bus identity to connect under
    pub identity: String,
    /// Port announced and accepted for incoming sessions
    pub contact_port: u16,
    /// Discovery and property-watch configuration
    pub watch: WatchConfig,
    /// Definition template for locally hosted objects
    pub local: LocalObjectConfig,
    /// Signals traced to the notification sink
    pub trace_signals: Vec<SignalSpec>,
    /// Metadata broadcast with announcements
    pub announce: AnnounceMetadata,
    /// Capacity of the event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            identity: "org.peerbus.client".to_string(),
            contact_port: DEFAULT_CONTACT_PORT,
            watch: WatchConfig::default(),
            local: LocalObjectConfig::default(),
            trace_signals: Vec::new(),
            announce: AnnounceMetadata::default(),
            event_channel_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.identity.is_empty() {
            return Err("identity must not be empty".to_string());
        }
        if self.contact_port == 0 {
            return Err("contact port must be non-zero".to_string());
        }
        if self.watch.interface.is_empty() {
            return Err("watch interface must not be empty".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err("event channel capacity must be non-zero".to_string());
        }
        Ok(())
    }
}
