//! The coordinator worker - a single serial command loop
//!
//! All commands and all bus-originated events are funneled into one
//! ordered, single-consumer queue. This is the core correctness mechanism:
//! the worker is the only mutator of the peer registry and the local
//! object list, so UI threads and bus callback threads never race over
//! them. Bus callbacks capture a clone of the command sender and enqueue;
//! they never touch state directly.
//!
//! Blocking bus calls happen here, serialized; enqueuing never blocks the
//! caller.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock};

use peerbus_bus_core::{
    AcceptPredicate, BusError, BusService, DiscoveryCallback, LocalObjectDefinition,
    PropertyChangedCallback, PropertyValue, RemoteObjectHandle, SignalCallback,
};

use crate::client::commands::{sanitize_location, Command, RemoteAction};
use crate::client::config::CoordinatorConfig;
use crate::client::types::{CoordinatorState, LocalObjectRecord};
use crate::error::ClientError;
use crate::events::{BusEventHandler, CoordinatorEvent};
use crate::registry::PeerRegistry;

pub(crate) struct CoordinatorWorker {
    pub(crate) bus: Arc<dyn BusService>,
    pub(crate) config: CoordinatorConfig,
    pub(crate) registry: PeerRegistry,
    pub(crate) locals: Arc<RwLock<Vec<LocalObjectRecord>>>,
    pub(crate) state: Arc<RwLock<CoordinatorState>>,
    pub(crate) handler: Option<Arc<dyn BusEventHandler>>,
    pub(crate) event_tx: broadcast::Sender<CoordinatorEvent>,
    /// Sender handed to bus callbacks so they can inject events into the
    /// same ordering domain as UI commands.
    pub(crate) cmd_tx: mpsc::UnboundedSender<Command>,
    pub(crate) commands_processed: Arc<AtomicU64>,
}

impl CoordinatorWorker {
    /// Process commands until the queue closes or a `Disconnect` runs.
    pub(crate) async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!("coordinator worker started");
        while let Some(command) = rx.recv().await {
            self.commands_processed.fetch_add(1, Ordering::Relaxed);
            let state = *self.state.read().await;
            if state == CoordinatorState::Terminated {
                // Deferred tasks still run and Disconnect still stops the
                // worker; everything that would touch the bus is dropped.
                match command {
                    Command::RunTask(task) => task(),
                    Command::Disconnect => break,
                    other => {
                        tracing::trace!(command = ?other, "coordinator terminated, dropping command");
                    }
                }
                continue;
            }
            tracing::debug!(?command, %state, "processing command");
            match command {
                Command::Connect => self.handle_connect().await,
                Command::RunTask(task) => task(),
                Command::Disconnect => {
                    self.handle_disconnect().await;
                    break;
                }
                other if state != CoordinatorState::Active => match &other {
                    Command::Invoke { .. }
                    | Command::CreateLocal { .. }
                    | Command::DeleteLocal { .. } => {
                        self.status(format!("Command ignored: coordinator is {state}"))
                            .await;
                    }
                    _ => tracing::trace!(command = ?other, "bus event outside active state, dropped"),
                },
                Command::JoinSession(handle) => self.handle_join(handle).await,
                Command::ObjectLost(handle) => self.handle_object_lost(handle).await,
                Command::PropertyChanged {
                    handle,
                    name,
                    value,
                } => self.handle_property_changed(handle, name, value).await,
                Command::SignalReceived {
                    sender,
                    member,
                    args,
                } => self.handle_signal(sender, member, args).await,
                Command::Invoke { handle, action } => self.handle_invoke(handle, action).await,
                Command::CreateLocal { location } => self.handle_create_local(location).await,
                Command::DeleteLocal { locations } => self.handle_delete_local(locations).await,
            }
        }
        tracing::debug!("coordinator worker stopped");
    }

    // ===== Lifecycle =====

    async fn handle_connect(&self) {
        let current = *self.state.read().await;
        if current != CoordinatorState::Idle {
            self.status(format!("Connect ignored: coordinator is {current}"))
                .await;
            return;
        }
        self.set_state(CoordinatorState::Connecting).await;
        match self.connect_bus().await {
            Ok(()) => {
                self.set_state(CoordinatorState::Active).await;
                self.status(format!("Connected to bus as '{}'", self.config.identity))
                    .await;
            }
            Err(e) => {
                // Fail-fast: no retry, the coordinator stays terminated.
                let err = ClientError::connect_failure(e.to_string());
                tracing::error!(error = %err, "connect failed, terminating");
                self.report_error(&err).await;
                self.set_state(CoordinatorState::Terminated).await;
            }
        }
    }

    /// The startup sequence: connect, bind the accept policy for the
    /// contact port, announce, register signal traces, start discovery.
    async fn connect_bus(&self) -> Result<(), BusError> {
        let config = &self.config;
        self.bus.connect(&config.identity).await?;

        let port = config.contact_port;
        let accept: AcceptPredicate = Arc::new(move |session_port, _joiner| session_port == port);
        self.bus.bind_accept_policy(port, accept).await?;

        self.bus.announce(port, &config.announce).await?;

        for spec in &config.trace_signals {
            let tx = self.cmd_tx.clone();
            let on_signal: SignalCallback = Arc::new(move |sender, member, args| {
                let _ = tx.send(Command::SignalReceived {
                    sender,
                    member,
                    args,
                });
            });
            self.bus
                .subscribe_signal(&spec.interface, &spec.member, on_signal)
                .await?;
        }

        let discovered_tx = self.cmd_tx.clone();
        let on_discovered: DiscoveryCallback = Arc::new(move |handle| {
            let _ = discovered_tx.send(Command::JoinSession(handle));
        });
        let lost_tx = self.cmd_tx.clone();
        let on_lost: DiscoveryCallback = Arc::new(move |handle| {
            let _ = lost_tx.send(Command::ObjectLost(handle));
        });
        self.bus
            .discover(
                std::slice::from_ref(&config.watch.interface),
                on_discovered,
                on_lost,
            )
            .await?;
        Ok(())
    }

    async fn handle_disconnect(&self) {
        let current = *self.state.read().await;
        if current == CoordinatorState::Active {
            self.set_state(CoordinatorState::Disconnecting).await;
            if let Err(e) = self.bus.cancel_discovery().await {
                tracing::warn!(error = %e, "cancel discovery failed");
            }
            for record in self.locals.write().await.drain(..) {
                if let Err(e) = self.bus.unregister_local_object(record.registration).await {
                    tracing::warn!(path = %record.path, error = %e, "unregister during disconnect failed");
                }
            }
            if let Err(e) = self.bus.disconnect().await {
                tracing::warn!(error = %e, "bus disconnect failed");
            }
        }
        self.set_state(CoordinatorState::Terminated).await;
        self.status("Disconnected from bus").await;
    }

    // ===== Peer lifecycle =====

    async fn handle_join(&self, handle: RemoteObjectHandle) {
        let interface = &self.config.watch.interface;
        let snapshot = match self.bus.fetch_properties(&handle, interface).await {
            Ok(properties) => properties,
            Err(e) => {
                let err = ClientError::invoke_failure("fetch_properties", e.to_string());
                tracing::warn!(%handle, error = %e, "failed to join discovered peer");
                self.report_error(&err).await;
                return;
            }
        };

        let display_label = match self
            .config
            .watch
            .label_property
            .as_deref()
            .and_then(|name| snapshot.get(name))
            .and_then(PropertyValue::as_str)
        {
            Some(label) => format!("{label} ({handle})"),
            None => handle.to_string(),
        };

        // Subscribe before inserting: a handle in the registry always has
        // a live property subscription.
        let tx = self.cmd_tx.clone();
        let on_changed: PropertyChangedCallback = Arc::new(move |handle, name, value| {
            let _ = tx.send(Command::PropertyChanged {
                handle,
                name,
                value,
            });
        });
        if let Err(e) = self
            .bus
            .subscribe_properties(&handle, interface, &self.config.watch.properties, on_changed)
            .await
        {
            let err = ClientError::invoke_failure("subscribe_properties", e.to_string());
            tracing::warn!(%handle, error = %e, "property subscription failed, peer not added");
            self.report_error(&err).await;
            return;
        }

        let record = self.registry.upsert(handle, display_label, snapshot).await;
        tracing::info!(peer = %record.display_label, "peer added");
        if let Some(handler) = &self.handler {
            handler.on_peer_added(record.clone()).await;
        }
        self.emit(CoordinatorEvent::PeerAdded {
            peer: record,
            timestamp: Utc::now(),
        });
    }

    async fn handle_object_lost(&self, handle: RemoteObjectHandle) {
        let Some(record) = self.registry.remove(&handle).await else {
            tracing::trace!(%handle, "lost object not in registry, ignoring");
            return;
        };
        tracing::info!(peer = %record.display_label, "peer removed");
        if let Some(handler) = &self.handler {
            handler.on_peer_removed(handle.clone()).await;
        }
        self.emit(CoordinatorEvent::PeerRemoved {
            handle,
            timestamp: Utc::now(),
        });
    }

    async fn handle_property_changed(
        &self,
        handle: RemoteObjectHandle,
        name: String,
        value: PropertyValue,
    ) {
        let Some(record) = self.registry.update_property(&handle, &name, value).await else {
            // Stale signal for a just-removed peer; dropped without notice.
            tracing::trace!(%handle, %name, "stale property signal dropped");
            return;
        };
        if let Some(handler) = &self.handler {
            handler.on_peer_updated(record.clone()).await;
        }
        self.emit(CoordinatorEvent::PeerUpdated {
            peer: record,
            timestamp: Utc::now(),
        });
    }

    async fn handle_signal(&self, sender: String, member: String, args: Vec<PropertyValue>) {
        let text = match args.first().and_then(PropertyValue::as_str) {
            Some(arg) => format!("{member}('{arg}') from {sender}"),
            None => format!("{member} from {sender}"),
        };
        tracing::debug!(signal = %text, "signal received");
        if let Some(handler) = &self.handler {
            handler.on_signal_trace(text.clone()).await;
        }
        self.emit(CoordinatorEvent::SignalTrace {
            message: text,
            timestamp: Utc::now(),
        });
    }

    // ===== Remote actions =====

    async fn handle_invoke(&self, handle: RemoteObjectHandle, action: RemoteAction) {
        let Some(record) = self.registry.lookup(&handle).await else {
            // The peer vanished between the UI action and processing; not
            // an error.
            tracing::trace!(%handle, "invoke target not in registry, ignoring");
            return;
        };
        let method = match &action {
            RemoteAction::Trigger { method } => method.clone(),
            RemoteAction::Toggle {
                property,
                when_true,
                when_false,
            } => {
                let current = record
                    .cached_state
                    .get(property)
                    .and_then(PropertyValue::as_bool)
                    .unwrap_or(false);
                if current {
                    when_true.clone()
                } else {
                    when_false.clone()
                }
            }
        };
        match self.bus.invoke(&handle, &method, Vec::new()).await {
            Ok(_) => tracing::debug!(%handle, %method, "invoke completed"),
            Err(e) => {
                let err = ClientError::invoke_failure(&method, e.to_string());
                tracing::warn!(%handle, error = %e, "invoke failed");
                self.report_error(&err).await;
            }
        }
    }

    // ===== Local objects =====

    async fn handle_create_local(&self, location: String) {
        let Some(path) = sanitize_location(&location) else {
            let err = ClientError::registration_failure(&location, "no valid path characters");
            tracing::warn!(%location, "create rejected: nothing left after sanitization");
            self.report_error(&err).await;
            return;
        };
        if self.locals.read().await.iter().any(|r| r.path == path) {
            let err = ClientError::registration_failure(
                &location,
                format!("path '{path}' already in use"),
            );
            self.report_error(&err).await;
            return;
        }

        let mut properties = self.config.local.initial_properties.clone();
        if let Some(name) = &self.config.local.location_property {
            properties.insert(name.clone(), PropertyValue::String(location.clone()));
        }
        let definition = LocalObjectDefinition {
            interface: self.config.local.interface.clone(),
            properties,
        };

        let registration = match self.bus.register_local_object(&path, definition).await {
            Ok(id) => id,
            Err(e) => {
                let err = ClientError::registration_failure(&location, e.to_string());
                tracing::warn!(%path, error = %e, "local object registration failed");
                self.report_error(&err).await;
                return;
            }
        };
        self.locals.write().await.push(LocalObjectRecord {
            location,
            path: path.clone(),
            registration,
            created_at: Utc::now(),
        });
        tracing::info!(%path, "local object created");

        // Re-announce so peers learn about the new object. The record
        // stays even if the announcement fails; there is no rollback.
        if let Err(e) = self
            .bus
            .announce(self.config.contact_port, &self.config.announce)
            .await
        {
            self.status(format!("Announce failed after creating '{path}': {e}"))
                .await;
        }
    }

    async fn handle_delete_local(&self, locations: Vec<String>) {
        let requested: HashSet<String> = locations.into_iter().collect();
        let mut removed = Vec::new();
        {
            let mut locals = self.locals.write().await;
            let mut kept = Vec::with_capacity(locals.len());
            for record in locals.drain(..) {
                if requested.contains(&record.location) {
                    removed.push(record);
                } else {
                    kept.push(record);
                }
            }
            *locals = kept;
        }
        if removed.is_empty() {
            tracing::debug!("delete matched no local objects");
            return;
        }

        for record in &removed {
            if let Err(e) = self.bus.unregister_local_object(record.registration).await {
                tracing::warn!(path = %record.path, error = %e, "unregister failed");
                self.status(format!("Failed to remove '{}': {e}", record.path))
                    .await;
            }
        }
        tracing::info!(count = removed.len(), "local objects deleted");

        // One announcement for the whole batch.
        if let Err(e) = self
            .bus
            .announce(self.config.contact_port, &self.config.announce)
            .await
        {
            self.status(format!("Announce failed after deleting local objects: {e}"))
                .await;
        }
    }

    // ===== Notification plumbing =====

    async fn set_state(&self, new_state: CoordinatorState) {
        let old_state = {
            let mut guard = self.state.write().await;
            let old = *guard;
            if old == new_state {
                return;
            }
            *guard = new_state;
            old
        };
        tracing::info!(%old_state, %new_state, "coordinator state changed");
        self.emit(CoordinatorEvent::StateChanged {
            old_state,
            new_state,
            timestamp: Utc::now(),
        });
    }

    async fn status(&self, message: impl Into<String>) {
        let message = message.into();
        if let Some(handler) = &self.handler {
            handler.on_status_message(message.clone()).await;
        }
        self.emit(CoordinatorEvent::StatusMessage {
            message,
            timestamp: Utc::now(),
        });
    }

    /// Surface an error through the sink's message channel and the event
    /// stream. Errors are never raised to the enqueuing caller.
    async fn report_error(&self, error: &ClientError) {
        if let Some(handler) = &self.handler {
            handler.on_status_message(error.to_string()).await;
        }
        self.emit(CoordinatorEvent::Error {
            error: error.to_string(),
            recoverable: !error.is_fatal(),
            timestamp: Utc::now(),
        });
    }

    fn emit(&self, event: CoordinatorEvent) {
        // A send error only means no subscriber is listening right now.
        let _ = self.event_tx.send(event);
    }
}
