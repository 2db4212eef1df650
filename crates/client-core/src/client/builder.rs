//! Builder for the session coordinator
//!
//! Collects configuration and the optional notification sink, then wires
//! the command channel, registry, and event stream together and spawns the
//! worker task.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use peerbus_bus_core::mock::MockBus;
//! use peerbus_client_core::CoordinatorBuilder;
//!
//! # async fn example() {
//! let bus = Arc::new(MockBus::new());
//! let coordinator = CoordinatorBuilder::new()
//!     .with_identity("org.example.doors")
//!     .with_watch_interface("com.example.Door")
//!     .with_watch_properties(["IsOpen"])
//!     .with_label_property("Location")
//!     .with_local_interface("com.example.Door")
//!     .with_location_property("Location")
//!     .with_trace_signal("com.example.Door", "PersonPassedThrough")
//!     .build(bus);
//! coordinator.connect().unwrap();
//! # }
//! ```

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, RwLock};

use peerbus_bus_core::{AnnounceMetadata, BusService, PropertyMap};

use crate::client::config::{CoordinatorConfig, SignalSpec};
use crate::client::types::CoordinatorState;
use crate::client::worker::CoordinatorWorker;
use crate::client::Coordinator;
use crate::events::BusEventHandler;
use crate::registry::PeerRegistry;

/// Builder for [`Coordinator`].
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    handler: Option<Arc<dyn BusEventHandler>>,
}

impl CoordinatorBuilder {
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            handler: None,
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Bus identity to connect under.
    pub fn with_identity(mut self, identity: impl Into<String>) -> Self {
        self.config.identity = identity.into();
        self
    }

    /// Contact port announced and accepted for incoming sessions.
    pub fn with_contact_port(mut self, port: u16) -> Self {
        self.config.contact_port = port;
        self
    }

    /// Interface whose implementers are discovered.
    pub fn with_watch_interface(mut self, interface: impl Into<String>) -> Self {
        self.config.watch.interface = interface.into();
        self
    }

    /// Properties subscribed to and cached per peer.
    pub fn with_watch_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.watch.properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Property whose value becomes the peer display label.
    pub fn with_label_property(mut self, property: impl Into<String>) -> Self {
        self.config.watch.label_property = Some(property.into());
        self
    }

    /// Interface hosted local objects implement.
    pub fn with_local_interface(mut self, interface: impl Into<String>) -> Self {
        self.config.local.interface = interface.into();
        self
    }

    /// Initial property values for every hosted local object.
    pub fn with_local_properties(mut self, properties: PropertyMap) -> Self {
        self.config.local.initial_properties = properties;
        self
    }

    /// Property that carries a hosted object's location string.
    pub fn with_location_property(mut self, property: impl Into<String>) -> Self {
        self.config.local.location_property = Some(property.into());
        self
    }

    /// Trace deliveries of a signal to the notification sink.
    pub fn with_trace_signal(
        mut self,
        interface: impl Into<String>,
        member: impl Into<String>,
    ) -> Self {
        self.config.trace_signals.push(SignalSpec {
            interface: interface.into(),
            member: member.into(),
        });
        self
    }

    /// Metadata broadcast with announcements.
    pub fn with_announce(mut self, announce: AnnounceMetadata) -> Self {
        self.config.announce = announce;
        self
    }

    /// Capacity of the event broadcast channel.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity;
        self
    }

    /// Notification sink receiving peer and status notifications.
    pub fn with_event_handler(mut self, handler: Arc<dyn BusEventHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Wire everything together and spawn the worker task.
    pub fn build(self, bus: Arc<dyn BusService>) -> Coordinator {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, _) = broadcast::channel(self.config.event_channel_capacity.max(1));
        let registry = PeerRegistry::new();
        let locals = Arc::new(RwLock::new(Vec::new()));
        let state = Arc::new(RwLock::new(CoordinatorState::Idle));
        let commands_processed = Arc::new(AtomicU64::new(0));

        let worker = CoordinatorWorker {
            bus,
            config: self.config,
            registry: registry.clone(),
            locals: Arc::clone(&locals),
            state: Arc::clone(&state),
            handler: self.handler,
            event_tx: event_tx.clone(),
            cmd_tx: cmd_tx.clone(),
            commands_processed: Arc::clone(&commands_processed),
        };
        let handle = tokio::spawn(worker.run(cmd_rx));

        Coordinator::new(
            cmd_tx,
            registry,
            locals,
            state,
            event_tx,
            commands_processed,
            handle,
        )
    }
}

impl Default for CoordinatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
