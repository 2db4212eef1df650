//! The bus service capability trait

use async_trait::async_trait;

use crate::error::BusError;
use crate::types::{
    AcceptPredicate, AnnounceMetadata, DiscoveryCallback, LocalObjectDefinition,
    PropertyChangedCallback, PropertyMap, PropertyValue, RegistrationId, RemoteObjectHandle,
    SignalCallback,
};

/// Capability set a bus substrate must provide.
///
/// A `BusService` owns the network transport, session negotiation,
/// discovery/announcement protocol, and method-call marshaling. Consumers
/// drive it through this trait and receive asynchronous events through the
/// callbacks they hand to [`discover`](BusService::discover),
/// [`subscribe_properties`](BusService::subscribe_properties), and
/// [`subscribe_signal`](BusService::subscribe_signal).
///
/// Callbacks are invoked on bus-owned tasks and must not block; the
/// expected pattern is to enqueue the event onto the consumer's own
/// ordering domain.
#[async_trait]
pub trait BusService: Send + Sync {
    /// Connect to the bus under the given identity.
    async fn connect(&self, identity: &str) -> Result<(), BusError>;

    /// Bind the session accept policy for a contact port.
    ///
    /// The predicate is consulted for every incoming session joiner with
    /// the joined port and the joiner's bus name.
    async fn bind_accept_policy(
        &self,
        port: u16,
        predicate: AcceptPredicate,
    ) -> Result<(), BusError>;

    /// Broadcast an announcement advertising locally hosted objects.
    async fn announce(&self, port: u16, metadata: &AnnounceMetadata) -> Result<(), BusError>;

    /// Start discovery for objects implementing any of the given interfaces.
    ///
    /// `on_discovered` fires for each matching object that appears,
    /// `on_lost` for each that disappears. Discovery stays active until
    /// [`cancel_discovery`](BusService::cancel_discovery) or
    /// [`disconnect`](BusService::disconnect).
    async fn discover(
        &self,
        interfaces: &[String],
        on_discovered: DiscoveryCallback,
        on_lost: DiscoveryCallback,
    ) -> Result<(), BusError>;

    /// Stop delivering discovery events.
    async fn cancel_discovery(&self) -> Result<(), BusError>;

    /// Fetch the current property values of a remote object's interface.
    async fn fetch_properties(
        &self,
        handle: &RemoteObjectHandle,
        interface: &str,
    ) -> Result<PropertyMap, BusError>;

    /// Subscribe to change notifications for the named properties of a
    /// remote object.
    async fn subscribe_properties(
        &self,
        handle: &RemoteObjectHandle,
        interface: &str,
        properties: &[String],
        on_changed: PropertyChangedCallback,
    ) -> Result<(), BusError>;

    /// Subscribe to a signal emitted by any object implementing the
    /// interface.
    async fn subscribe_signal(
        &self,
        interface: &str,
        member: &str,
        on_signal: SignalCallback,
    ) -> Result<(), BusError>;

    /// Call a method on a remote object.
    async fn invoke(
        &self,
        handle: &RemoteObjectHandle,
        method: &str,
        args: Vec<PropertyValue>,
    ) -> Result<PropertyValue, BusError>;

    /// Host a local object at the given path.
    async fn register_local_object(
        &self,
        path: &str,
        definition: LocalObjectDefinition,
    ) -> Result<RegistrationId, BusError>;

    /// Remove a previously registered local object from the bus.
    async fn unregister_local_object(&self, registration: RegistrationId)
        -> Result<(), BusError>;

    /// Disconnect from the bus and release all resources.
    async fn disconnect(&self) -> Result<(), BusError>;
}
