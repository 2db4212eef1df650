//! # peerbus-bus-core
//!
//! The bus service boundary for peerbus. This crate defines everything a
//! coordination layer needs to talk to a peer-to-peer messaging bus without
//! depending on any particular transport:
//!
//! - **Shared types** - remote object handles, variant-typed property
//!   payloads, announcement metadata, local object definitions
//! - **The [`BusService`] trait** - the capability set a bus substrate must
//!   provide (connect, announce, discover, subscribe, invoke, host)
//! - **[`BusError`]** - the error taxonomy for bus operations
//! - **[`mock::MockBus`]** - an in-memory bus implementation for tests and
//!   demos
//!
//! The actual transport, session negotiation, discovery protocol, and
//! method-call marshaling live behind implementations of [`BusService`];
//! this crate deliberately knows nothing about them.
//!
//! # Callback threading
//!
//! Bus implementations deliver discovery, property-change, and signal
//! callbacks on their own tasks or threads. Callbacks must therefore be
//! cheap and non-blocking; consumers are expected to enqueue the event onto
//! their own ordering domain rather than act on it in place.

mod error;
mod service;
mod types;

pub mod mock;

pub use error::BusError;
pub use service::BusService;
pub use types::{
    AcceptPredicate, AnnounceMetadata, DiscoveryCallback, LocalObjectDefinition,
    PropertyChangedCallback, PropertyMap, PropertyValue, RegistrationId, RemoteObjectHandle,
    SignalCallback,
};
