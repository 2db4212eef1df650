//! # peerbus-client-core
//!
//! Session coordination layer for peer-to-peer IoT messaging buses.
//!
//! This crate sits between an application (typically a UI) and a bus
//! substrate implementing
//! [`BusService`](peerbus_bus_core::BusService). It owns three things:
//!
//! - **A serial command queue** - every UI action and every bus-originated
//!   event (discovery, object loss, property change, signal) becomes a
//!   [`Command`] processed strictly in arrival order by one worker task.
//!   Bus callbacks only enqueue; nothing mutates shared state from a
//!   callback thread.
//! - **A peer registry** - the locally cached view of every discovered
//!   remote object, enumerated in discovery order for deterministic UI
//!   listing.
//! - **A notification path** - an application-implemented
//!   [`BusEventHandler`] sink plus a broadcast [`CoordinatorEvent`]
//!   stream, both fed from the worker after each state mutation.
//!
//! # Lifecycle
//!
//! `Idle -> Connecting -> Active -> Disconnecting -> Terminated`. The
//! connect sequence binds a session accept policy for the configured
//! contact port, announces the local application, registers signal traces,
//! and starts discovery. A connect failure is terminal - it is surfaced to
//! the sink and the coordinator will not retry. Disconnect unregisters all
//! hosted objects, disconnects from the bus, and stops the queue;
//! commands enqueued afterwards are never observed by the bus.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use peerbus_bus_core::mock::MockBus;
//! use peerbus_client_core::{CoordinatorBuilder, RemoteAction};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bus = Arc::new(MockBus::new());
//!
//!     let coordinator = CoordinatorBuilder::new()
//!         .with_identity("org.example.doors")
//!         .with_watch_interface("com.example.Door")
//!         .with_watch_properties(["IsOpen"])
//!         .with_label_property("Location")
//!         .build(bus);
//!
//!     coordinator.connect()?;
//!     coordinator.create_local("Front Door")?;
//!
//!     for peer in coordinator.peers().await {
//!         coordinator.invoke(
//!             peer.handle.clone(),
//!             RemoteAction::toggle("IsOpen", "Close", "Open"),
//!         )?;
//!     }
//!
//!     coordinator.disconnect()?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod events;
pub mod registry;

pub use client::{
    sanitize_location, Coordinator, CoordinatorBuilder, CoordinatorConfig, CoordinatorState,
    CoordinatorStats, LocalObjectConfig, LocalObjectRecord, PeerRecord, RemoteAction, SignalSpec,
    WatchConfig, DEFAULT_CONTACT_PORT, DEFAULT_EVENT_CAPACITY,
};
pub use error::{ClientError, ClientResult};
pub use events::{BusEventHandler, CoordinatorEvent};
pub use registry::PeerRegistry;

// Re-export the bus boundary types applications interact with.
pub use peerbus_bus_core::{
    AnnounceMetadata, BusError, BusService, PropertyMap, PropertyValue, RegistrationId,
    RemoteObjectHandle,
};
