//! The coordinator handle and its submodules
//!
//! [`Coordinator`] is the application-facing surface: every method either
//! enqueues a command onto the worker's serial queue (returning
//! immediately) or reads a snapshot of coordinator state. Construction
//! goes through [`CoordinatorBuilder`].

pub mod builder;
pub mod commands;
pub mod config;
pub mod types;

pub(crate) mod worker;


use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use peerbus_bus_core::RemoteObjectHandle;

use crate::error::{ClientError, ClientResult};
use crate::events::CoordinatorEvent;
use crate::registry::PeerRegistry;

pub use builder::CoordinatorBuilder;
pub use commands::{sanitize_location, Command, RemoteAction};
pub use config::{
    CoordinatorConfig, LocalObjectConfig, SignalSpec, WatchConfig, DEFAULT_CONTACT_PORT,
    DEFAULT_EVENT_CAPACITY,
};
pub use types::{CoordinatorState, CoordinatorStats, LocalObjectRecord, PeerRecord};

/// Handle to a running session coordinator.
///
/// Cheap to clone via `Arc`; all mutating operations are asynchronous
/// commands processed strictly in enqueue order by a single worker task.
/// Accessors read internally synchronized snapshots and never block the
/// worker.
pub struct Coordinator {
    cmd_tx: mpsc::UnboundedSender<Command>,
    registry: PeerRegistry,
    locals: Arc<RwLock<Vec<LocalObjectRecord>>>,
    state: Arc<RwLock<CoordinatorState>>,
    event_tx: broadcast::Sender<CoordinatorEvent>,
    commands_processed: Arc<AtomicU64>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    pub(crate) fn new(
        cmd_tx: mpsc::UnboundedSender<Command>,
        registry: PeerRegistry,
        locals: Arc<RwLock<Vec<LocalObjectRecord>>>,
        state: Arc<RwLock<CoordinatorState>>,
        event_tx: broadcast::Sender<CoordinatorEvent>,
        commands_processed: Arc<AtomicU64>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            cmd_tx,
            registry,
            locals,
            state,
            event_tx,
            commands_processed,
            worker: Mutex::new(Some(worker)),
        }
    }

    fn send(&self, command: Command) -> ClientResult<()> {
        self.cmd_tx
            .send(command)
            .map_err(|_| ClientError::invalid_state("running worker", "terminated"))
    }

    // ===== Commands =====

    /// Connect to the bus and start discovery.
    ///
    /// Valid once, from the initial state. A connect failure is terminal;
    /// it is surfaced through the sink and the coordinator will not retry.
    pub fn connect(&self) -> ClientResult<()> {
        self.send(Command::Connect)
    }

    /// Perform a remote action on a peer.
    ///
    /// If the peer has vanished by the time the command is processed, the
    /// action is silently ignored.
    pub fn invoke(&self, handle: RemoteObjectHandle, action: RemoteAction) -> ClientResult<()> {
        self.send(Command::Invoke { handle, action })
    }

    /// Create and host a local object for the given location string.
    ///
    /// The location is sanitized into an object path; registration
    /// failures are surfaced through the sink.
    pub fn create_local(&self, location: impl Into<String>) -> ClientResult<()> {
        self.send(Command::CreateLocal {
            location: location.into(),
        })
    }

    /// Delete the local objects whose locations are in the given set.
    pub fn delete_local<I, S>(&self, locations: I) -> ClientResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.send(Command::DeleteLocal {
            locations: locations.into_iter().map(Into::into).collect(),
        })
    }

    /// Run a deferred unit of work on the coordinator's ordering domain.
    ///
    /// The closure executes after every previously enqueued command, which
    /// also makes it usable as a queue barrier.
    pub fn run_task(&self, task: impl FnOnce() + Send + 'static) -> ClientResult<()> {
        self.send(Command::RunTask(Box::new(task)))
    }

    /// Disconnect from the bus and stop the worker.
    ///
    /// Commands enqueued after this one are never observed by the bus.
    pub fn disconnect(&self) -> ClientResult<()> {
        self.send(Command::Disconnect)
    }

    // ===== Accessors =====

    /// Snapshot of all registered peers, in discovery order.
    pub async fn peers(&self) -> Vec<PeerRecord> {
        self.registry.snapshot().await
    }

    /// Snapshot of a single peer.
    pub async fn peer(&self, handle: &RemoteObjectHandle) -> Option<PeerRecord> {
        self.registry.lookup(handle).await
    }

    /// Locations of the currently hosted local objects.
    pub async fn local_locations(&self) -> Vec<String> {
        self.locals
            .read()
            .await
            .iter()
            .map(|record| record.location.clone())
            .collect()
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> CoordinatorState {
        *self.state.read().await
    }

    /// Statistics about the coordinator's activity.
    pub async fn stats(&self) -> CoordinatorStats {
        let (total_joined, total_lost) = self.registry.counters().await;
        CoordinatorStats {
            state: *self.state.read().await,
            peer_count: self.registry.len().await,
            local_count: self.locals.read().await.len(),
            total_joined,
            total_lost,
            commands_processed: self.commands_processed.load(Ordering::Relaxed),
        }
    }

    /// Subscribe to the coordinator event stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.event_tx.subscribe()
    }

    /// Wait for the worker task to finish.
    ///
    /// Returns immediately if it already finished or was awaited before.
    pub async fn join(&self) {
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
