//! In-memory bus service for tests and demos
//!
//! [`MockBus`] implements [`BusService`] without any transport. It records
//! every call in arrival order, stores the callbacks handed to it, and lets
//! a test fire discovery, loss, property-change, and signal events through
//! those callbacks from any task - which is exactly how a real bus delivers
//! them. Individual operations can be scripted to fail.
//!
//! # Examples
//!
//! ```rust
//! use peerbus_bus_core::mock::{BusCall, MockBus};
//! use peerbus_bus_core::BusService;
//!
//! # async fn example() {
//! let bus = MockBus::new();
//! bus.connect("org.example.app").await.unwrap();
//! assert_eq!(
//!     bus.calls(),
//!     vec![BusCall::Connect { identity: "org.example.app".into() }],
//! );
//! # }
//! ```

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::BusError;
use crate::service::BusService;
use crate::types::{
    AcceptPredicate, AnnounceMetadata, DiscoveryCallback, LocalObjectDefinition,
    PropertyChangedCallback, PropertyMap, PropertyValue, RegistrationId, RemoteObjectHandle,
    SignalCallback,
};

/// One recorded bus operation, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum BusCall {
    Connect {
        identity: String,
    },
    BindAcceptPolicy {
        port: u16,
    },
    Announce {
        port: u16,
    },
    Discover {
        interfaces: Vec<String>,
    },
    CancelDiscovery,
    FetchProperties {
        handle: RemoteObjectHandle,
        interface: String,
    },
    SubscribeProperties {
        handle: RemoteObjectHandle,
        interface: String,
        properties: Vec<String>,
    },
    SubscribeSignal {
        interface: String,
        member: String,
    },
    Invoke {
        handle: RemoteObjectHandle,
        method: String,
        args: Vec<PropertyValue>,
    },
    RegisterLocalObject {
        path: String,
        interface: String,
    },
    UnregisterLocalObject {
        path: String,
    },
    Disconnect,
}

#[derive(Default)]
struct Callbacks {
    on_discovered: Option<DiscoveryCallback>,
    on_lost: Option<DiscoveryCallback>,
    accept: Option<AcceptPredicate>,
    property_subs: Vec<(RemoteObjectHandle, PropertyChangedCallback)>,
    signal_subs: Vec<(String, String, SignalCallback)>,
}

#[derive(Default)]
struct Failures {
    connect: bool,
    announce: bool,
    register: HashSet<String>,
    invoke: HashSet<String>,
    fetch: HashSet<RemoteObjectHandle>,
}

/// Scripted in-memory [`BusService`] implementation.
///
/// Thread-safe; event injection may run from any task concurrently with
/// trait calls. Callbacks are cloned out of the internal lock before they
/// are invoked, so an injected event never holds the mock's state lock
/// while consumer code runs.
pub struct MockBus {
    calls: Mutex<Vec<BusCall>>,
    callbacks: Mutex<Callbacks>,
    failures: Mutex<Failures>,
    connected: Mutex<bool>,
    discovering: Mutex<bool>,
    registrations: DashMap<RegistrationId, String>,
    remote_properties: DashMap<(RemoteObjectHandle, String), PropertyMap>,
}

impl MockBus {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Callbacks::default()),
            failures: Mutex::new(Failures::default()),
            connected: Mutex::new(false),
            discovering: Mutex::new(false),
            registrations: DashMap::new(),
            remote_properties: DashMap::new(),
        }
    }

    fn record(&self, call: BusCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn ensure_connected(&self) -> Result<(), BusError> {
        if *self.connected.lock().unwrap() {
            Ok(())
        } else {
            Err(BusError::NotConnected)
        }
    }

    // ===== Scripting =====

    /// Make the next `connect` call fail.
    pub fn set_fail_connect(&self, fail: bool) {
        self.failures.lock().unwrap().connect = fail;
    }

    /// Make `announce` calls fail.
    pub fn set_fail_announce(&self, fail: bool) {
        self.failures.lock().unwrap().announce = fail;
    }

    /// Make registration of the given path fail.
    pub fn fail_register_path(&self, path: impl Into<String>) {
        self.failures.lock().unwrap().register.insert(path.into());
    }

    /// Make invocations of the given method fail.
    pub fn fail_invoke_method(&self, method: impl Into<String>) {
        self.failures.lock().unwrap().invoke.insert(method.into());
    }

    /// Make property fetches for the given handle fail.
    pub fn fail_fetch(&self, handle: RemoteObjectHandle) {
        self.failures.lock().unwrap().fetch.insert(handle);
    }

    /// Seed the property snapshot served for a remote object's interface.
    pub fn set_remote_properties(
        &self,
        handle: RemoteObjectHandle,
        interface: impl Into<String>,
        properties: PropertyMap,
    ) {
        self.remote_properties
            .insert((handle, interface.into()), properties);
    }

    // ===== Event injection =====

    /// Deliver a discovery event, as the bus would on its own thread.
    pub fn discover_object(&self, handle: RemoteObjectHandle) {
        let cb = self.callbacks.lock().unwrap().on_discovered.clone();
        if let Some(cb) = cb {
            tracing::debug!(%handle, "mock bus: object discovered");
            cb(handle);
        }
    }

    /// Deliver an object-lost event.
    pub fn lose_object(&self, handle: RemoteObjectHandle) {
        let cb = self.callbacks.lock().unwrap().on_lost.clone();
        if let Some(cb) = cb {
            tracing::debug!(%handle, "mock bus: object lost");
            cb(handle);
        }
    }

    /// Deliver a property-change notification to the matching subscriptions.
    pub fn change_property(
        &self,
        handle: &RemoteObjectHandle,
        name: impl Into<String>,
        value: PropertyValue,
    ) {
        let name = name.into();
        let subs: Vec<PropertyChangedCallback> = self
            .callbacks
            .lock()
            .unwrap()
            .property_subs
            .iter()
            .filter(|(h, _)| h == handle)
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in subs {
            cb(handle.clone(), name.clone(), value.clone());
        }
    }

    /// Deliver a signal to subscriptions matching the interface and member.
    pub fn raise_signal(
        &self,
        sender: impl Into<String>,
        interface: &str,
        member: &str,
        args: Vec<PropertyValue>,
    ) {
        let sender = sender.into();
        let subs: Vec<SignalCallback> = self
            .callbacks
            .lock()
            .unwrap()
            .signal_subs
            .iter()
            .filter(|(i, m, _)| i.as_str() == interface && m.as_str() == member)
            .map(|(_, _, cb)| cb.clone())
            .collect();
        for cb in subs {
            cb(sender.clone(), member.to_string(), args.clone());
        }
    }

    // ===== Inspection =====

    /// Snapshot of every recorded call, in arrival order.
    pub fn calls(&self) -> Vec<BusCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of recorded announcements.
    pub fn announce_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| matches!(c, BusCall::Announce { .. }))
            .count()
    }

    /// Run the bound accept predicate, if any.
    pub fn accepts(&self, port: u16, joiner: &str) -> Option<bool> {
        let pred = self.callbacks.lock().unwrap().accept.clone();
        pred.map(|p| p(port, joiner))
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.lock().unwrap()
    }

    pub fn is_discovering(&self) -> bool {
        *self.discovering.lock().unwrap()
    }

    /// Paths of currently registered local objects.
    pub fn registered_paths(&self) -> Vec<String> {
        self.registrations.iter().map(|e| e.value().clone()).collect()
    }
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BusService for MockBus {
    async fn connect(&self, identity: &str) -> Result<(), BusError> {
        self.record(BusCall::Connect {
            identity: identity.to_string(),
        });
        if self.failures.lock().unwrap().connect {
            return Err(BusError::connect_failed("scripted connect failure"));
        }
        *self.connected.lock().unwrap() = true;
        Ok(())
    }

    async fn bind_accept_policy(
        &self,
        port: u16,
        predicate: AcceptPredicate,
    ) -> Result<(), BusError> {
        self.ensure_connected()?;
        self.record(BusCall::BindAcceptPolicy { port });
        self.callbacks.lock().unwrap().accept = Some(predicate);
        Ok(())
    }

    async fn announce(&self, port: u16, _metadata: &AnnounceMetadata) -> Result<(), BusError> {
        self.ensure_connected()?;
        self.record(BusCall::Announce { port });
        if self.failures.lock().unwrap().announce {
            return Err(BusError::transport("scripted announce failure"));
        }
        Ok(())
    }

    async fn discover(
        &self,
        interfaces: &[String],
        on_discovered: DiscoveryCallback,
        on_lost: DiscoveryCallback,
    ) -> Result<(), BusError> {
        self.ensure_connected()?;
        self.record(BusCall::Discover {
            interfaces: interfaces.to_vec(),
        });
        let mut callbacks = self.callbacks.lock().unwrap();
        callbacks.on_discovered = Some(on_discovered);
        callbacks.on_lost = Some(on_lost);
        *self.discovering.lock().unwrap() = true;
        Ok(())
    }

    async fn cancel_discovery(&self) -> Result<(), BusError> {
        self.record(BusCall::CancelDiscovery);
        let mut callbacks = self.callbacks.lock().unwrap();
        callbacks.on_discovered = None;
        callbacks.on_lost = None;
        *self.discovering.lock().unwrap() = false;
        Ok(())
    }

    async fn fetch_properties(
        &self,
        handle: &RemoteObjectHandle,
        interface: &str,
    ) -> Result<PropertyMap, BusError> {
        self.ensure_connected()?;
        self.record(BusCall::FetchProperties {
            handle: handle.clone(),
            interface: interface.to_string(),
        });
        if self.failures.lock().unwrap().fetch.contains(handle) {
            return Err(BusError::ObjectUnreachable {
                handle: handle.clone(),
            });
        }
        Ok(self
            .remote_properties
            .get(&(handle.clone(), interface.to_string()))
            .map(|e| e.value().clone())
            .unwrap_or_default())
    }

    async fn subscribe_properties(
        &self,
        handle: &RemoteObjectHandle,
        interface: &str,
        properties: &[String],
        on_changed: PropertyChangedCallback,
    ) -> Result<(), BusError> {
        self.ensure_connected()?;
        self.record(BusCall::SubscribeProperties {
            handle: handle.clone(),
            interface: interface.to_string(),
            properties: properties.to_vec(),
        });
        self.callbacks
            .lock()
            .unwrap()
            .property_subs
            .push((handle.clone(), on_changed));
        Ok(())
    }

    async fn subscribe_signal(
        &self,
        interface: &str,
        member: &str,
        on_signal: SignalCallback,
    ) -> Result<(), BusError> {
        self.ensure_connected()?;
        self.record(BusCall::SubscribeSignal {
            interface: interface.to_string(),
            member: member.to_string(),
        });
        self.callbacks.lock().unwrap().signal_subs.push((
            interface.to_string(),
            member.to_string(),
            on_signal,
        ));
        Ok(())
    }

    async fn invoke(
        &self,
        handle: &RemoteObjectHandle,
        method: &str,
        args: Vec<PropertyValue>,
    ) -> Result<PropertyValue, BusError> {
        self.ensure_connected()?;
        self.record(BusCall::Invoke {
            handle: handle.clone(),
            method: method.to_string(),
            args,
        });
        if self.failures.lock().unwrap().invoke.contains(method) {
            return Err(BusError::invoke_failed(method, "scripted invoke failure"));
        }
        Ok(PropertyValue::Null)
    }

    async fn register_local_object(
        &self,
        path: &str,
        definition: LocalObjectDefinition,
    ) -> Result<RegistrationId, BusError> {
        self.ensure_connected()?;
        self.record(BusCall::RegisterLocalObject {
            path: path.to_string(),
            interface: definition.interface.clone(),
        });
        if self.failures.lock().unwrap().register.contains(path) {
            return Err(BusError::registration_failed(
                path,
                "scripted registration failure",
            ));
        }
        if self.registrations.iter().any(|e| e.value().as_str() == path) {
            return Err(BusError::PathInUse {
                path: path.to_string(),
            });
        }
        let id = RegistrationId::new();
        self.registrations.insert(id, path.to_string());
        Ok(id)
    }

    async fn unregister_local_object(
        &self,
        registration: RegistrationId,
    ) -> Result<(), BusError> {
        let path = self
            .registrations
            .remove(&registration)
            .map(|(_, path)| path)
            .unwrap_or_else(|| registration.to_string());
        self.record(BusCall::UnregisterLocalObject { path });
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), BusError> {
        self.record(BusCall::Disconnect);
        *self.connected.lock().unwrap() = false;
        *self.discovering.lock().unwrap() = false;
        self.callbacks.lock().unwrap().property_subs.clear();
        Ok(())
    }
}
