//! End-to-end coordinator lifecycle against the in-memory bus
//!
//! Drives the full door-demo flow: connect, discover peers, watch
//! property changes, invoke remote actions, host and delete local
//! objects, disconnect.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use peerbus_bus_core::mock::{BusCall, MockBus};
use peerbus_client_core::{
    BusEventHandler, Coordinator, CoordinatorBuilder, CoordinatorEvent, CoordinatorState,
    PeerRecord, PropertyMap, RemoteAction, RemoteObjectHandle,
};

const DOOR_IFACE: &str = "com.example.Door";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[derive(Default)]
struct Transcript {
    added: Mutex<Vec<String>>,
    updated: Mutex<Vec<String>>,
    removed: Mutex<Vec<RemoteObjectHandle>>,
    messages: Mutex<Vec<String>>,
    signals: Mutex<Vec<String>>,
}

#[async_trait]
impl BusEventHandler for Transcript {
    async fn on_peer_added(&self, peer: PeerRecord) {
        self.added.lock().unwrap().push(peer.display_label);
    }

    async fn on_peer_updated(&self, peer: PeerRecord) {
        self.updated.lock().unwrap().push(peer.display_label);
    }

    async fn on_peer_removed(&self, handle: RemoteObjectHandle) {
        self.removed.lock().unwrap().push(handle);
    }

    async fn on_status_message(&self, message: String) {
        self.messages.lock().unwrap().push(message);
    }

    async fn on_signal_trace(&self, message: String) {
        self.signals.lock().unwrap().push(message);
    }
}

fn door(n: u32, path: &str) -> RemoteObjectHandle {
    RemoteObjectHandle::new(format!(":1.{n}"), path)
}

fn door_properties(location: &str, is_open: bool) -> PropertyMap {
    let mut properties = PropertyMap::new();
    properties.insert("Location".into(), json!(location));
    properties.insert("IsOpen".into(), json!(is_open));
    properties
}

fn door_builder() -> CoordinatorBuilder {
    CoordinatorBuilder::new()
        .with_identity("org.example.doors")
        .with_watch_interface(DOOR_IFACE)
        .with_watch_properties(["IsOpen"])
        .with_label_property("Location")
        .with_local_interface(DOOR_IFACE)
        .with_location_property("Location")
        .with_trace_signal(DOOR_IFACE, "PersonPassedThrough")
}

async fn flush(coordinator: &Coordinator) {
    let (tx, rx) = tokio::sync::oneshot::channel();
    coordinator
        .run_task(move || {
            let _ = tx.send(());
        })
        .unwrap();
    rx.await.unwrap();
}

#[tokio::test]
async fn full_door_demo_flow() {
    init_tracing();
    let bus = Arc::new(MockBus::new());
    let transcript = Arc::new(Transcript::default());
    let coordinator = door_builder()
        .with_event_handler(transcript.clone())
        .build(bus.clone());

    coordinator.connect().unwrap();
    flush(&coordinator).await;
    assert_eq!(coordinator.state().await, CoordinatorState::Active);

    // Two doors appear on the network.
    let garage = door(11, "/GarageDoor");
    let porch = door(12, "/PorchDoor");
    bus.set_remote_properties(garage.clone(), DOOR_IFACE, door_properties("Garage", false));
    bus.set_remote_properties(porch.clone(), DOOR_IFACE, door_properties("Porch", true));
    bus.discover_object(garage.clone());
    bus.discover_object(porch.clone());
    flush(&coordinator).await;

    let labels: Vec<String> = coordinator
        .peers()
        .await
        .into_iter()
        .map(|p| p.display_label)
        .collect();
    assert_eq!(
        labels,
        vec!["Garage (:1.11/GarageDoor)", "Porch (:1.12/PorchDoor)"]
    );

    // Someone opens the garage door remotely.
    bus.change_property(&garage, "IsOpen", json!(true));
    flush(&coordinator).await;
    assert_eq!(
        coordinator.peer(&garage).await.unwrap().cached_state["IsOpen"],
        json!(true)
    );

    // Knock on the porch door and toggle the garage door shut.
    coordinator
        .invoke(porch.clone(), RemoteAction::trigger("KnockAndRun"))
        .unwrap();
    coordinator
        .invoke(garage.clone(), RemoteAction::toggle("IsOpen", "Close", "Open"))
        .unwrap();
    flush(&coordinator).await;

    let invoked: Vec<(RemoteObjectHandle, String)> = bus
        .calls()
        .iter()
        .filter_map(|c| match c {
            BusCall::Invoke { handle, method, .. } => Some((handle.clone(), method.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        invoked,
        vec![
            (porch.clone(), "KnockAndRun".to_string()),
            (garage.clone(), "Close".to_string()),
        ]
    );

    // A visitor passes through a hosted door.
    bus.raise_signal(":1.12", DOOR_IFACE, "PersonPassedThrough", vec![json!("alice")]);
    flush(&coordinator).await;
    assert_eq!(
        transcript.signals.lock().unwrap().as_slice(),
        &["PersonPassedThrough('alice') from :1.12"]
    );

    // Host two local doors, then delete one.
    coordinator.create_local("Front Door").unwrap();
    coordinator.create_local("Cellar").unwrap();
    flush(&coordinator).await;
    assert_eq!(
        coordinator.local_locations().await,
        vec!["Front Door", "Cellar"]
    );

    coordinator.delete_local(["Cellar"]).unwrap();
    flush(&coordinator).await;
    assert_eq!(coordinator.local_locations().await, vec!["Front Door"]);

    // The porch door goes away.
    bus.lose_object(porch.clone());
    flush(&coordinator).await;
    assert_eq!(
        transcript.removed.lock().unwrap().as_slice(),
        &[porch.clone()]
    );

    let stats = coordinator.stats().await;
    assert_eq!(stats.peer_count, 1);
    assert_eq!(stats.local_count, 1);
    assert_eq!(stats.total_joined, 2);
    assert_eq!(stats.total_lost, 1);

    coordinator.disconnect().unwrap();
    coordinator.join().await;
    assert_eq!(coordinator.state().await, CoordinatorState::Terminated);
    assert!(!bus.is_connected());
    assert!(bus.registered_paths().is_empty());
}

#[tokio::test]
async fn registry_size_tracks_joins_and_losses() {
    init_tracing();
    let bus = Arc::new(MockBus::new());
    let coordinator = door_builder().build(bus.clone());
    coordinator.connect().unwrap();
    flush(&coordinator).await;

    let handles: Vec<RemoteObjectHandle> =
        (0..5).map(|n| door(n, "/Door")).collect();
    for handle in &handles {
        bus.discover_object(handle.clone());
    }
    // Lose two present peers and three that were never joined.
    bus.lose_object(handles[0].clone());
    bus.lose_object(handles[3].clone());
    for n in 20..23 {
        bus.lose_object(door(n, "/Door"));
    }
    flush(&coordinator).await;

    assert_eq!(coordinator.peers().await.len(), 3);
    let stats = coordinator.stats().await;
    assert_eq!(stats.total_joined, 5);
    assert_eq!(stats.total_lost, 2);
}

#[tokio::test]
async fn event_stream_reports_lifecycle_transitions() {
    init_tracing();
    let bus = Arc::new(MockBus::new());
    let coordinator = door_builder().build(bus.clone());
    let mut events = coordinator.subscribe_events();

    coordinator.connect().unwrap();
    flush(&coordinator).await;

    let mut transitions = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoordinatorEvent::StateChanged {
            old_state,
            new_state,
            ..
        } = event
        {
            transitions.push((old_state, new_state));
        }
    }
    assert_eq!(
        transitions,
        vec![
            (CoordinatorState::Idle, CoordinatorState::Connecting),
            (CoordinatorState::Connecting, CoordinatorState::Active),
        ]
    );
}
