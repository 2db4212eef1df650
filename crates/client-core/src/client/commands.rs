//! Coordinator commands
//!
//! Everything the coordinator does - UI actions and bus-originated events
//! alike - is expressed as a [`Command`] and processed strictly in arrival
//! order by the worker. Bus callbacks enqueue `JoinSession`, `ObjectLost`,
//! `PropertyChanged`, and `SignalReceived`; applications enqueue the rest
//! through the [`Coordinator`](crate::Coordinator) handle.

use std::fmt;

use peerbus_bus_core::{PropertyValue, RemoteObjectHandle};

/// Deferred unit of work executed on the coordinator worker.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A queued coordinator command.
pub enum Command {
    /// Connect to the bus and start discovery
    Connect,
    /// A discovered object's session should be joined (bus-originated)
    JoinSession(RemoteObjectHandle),
    /// A discovered object disappeared (bus-originated)
    ObjectLost(RemoteObjectHandle),
    /// A watched property changed on a peer (bus-originated)
    PropertyChanged {
        handle: RemoteObjectHandle,
        name: String,
        value: PropertyValue,
    },
    /// A traced signal was received (bus-originated)
    SignalReceived {
        sender: String,
        member: String,
        args: Vec<PropertyValue>,
    },
    /// Perform a remote action on a peer
    Invoke {
        handle: RemoteObjectHandle,
        action: RemoteAction,
    },
    /// Create and host a local object for the given location
    CreateLocal { location: String },
    /// Delete the local objects whose locations are in the set
    DeleteLocal { locations: Vec<String> },
    /// Run a deferred task on the worker's ordering domain
    RunTask(Task),
    /// Tear down and stop processing
    Disconnect,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "Connect"),
            Self::JoinSession(handle) => write!(f, "JoinSession({handle})"),
            Self::ObjectLost(handle) => write!(f, "ObjectLost({handle})"),
            Self::PropertyChanged { handle, name, .. } => {
                write!(f, "PropertyChanged({handle}, {name})")
            }
            Self::SignalReceived { sender, member, .. } => {
                write!(f, "SignalReceived({sender}, {member})")
            }
            Self::Invoke { handle, action } => write!(f, "Invoke({handle}, {action:?})"),
            Self::CreateLocal { location } => write!(f, "CreateLocal({location})"),
            Self::DeleteLocal { locations } => write!(f, "DeleteLocal({locations:?})"),
            Self::RunTask(_) => write!(f, "RunTask(..)"),
            Self::Disconnect => write!(f, "Disconnect"),
        }
    }
}

/// A remote action performed on a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    /// Call a method with no arguments
    Trigger { method: String },
    /// Call one of two methods depending on the cached boolean value of a
    /// property; an unset or non-boolean value counts as false
    Toggle {
        property: String,
        when_true: String,
        when_false: String,
    },
}

impl RemoteAction {
    /// Create a trigger action.
    pub fn trigger(method: impl Into<String>) -> Self {
        Self::Trigger {
            method: method.into(),
        }
    }

    /// Create a toggle action.
    pub fn toggle(
        property: impl Into<String>,
        when_true: impl Into<String>,
        when_false: impl Into<String>,
    ) -> Self {
        Self::Toggle {
            property: property.into(),
            when_true: when_true.into(),
            when_false: when_false.into(),
        }
    }
}

/// Sanitize a location string into a bus object path.
///
/// Keeps only ASCII alphanumerics and underscores and prepends the path
/// separator. Returns `None` when nothing valid remains.
pub fn sanitize_location(location: &str) -> Option<String> {
    let cleaned: String = location
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("/{cleaned}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_spaces() {
        assert_eq!(sanitize_location("My Door").as_deref(), Some("/MyDoor"));
    }

    #[test]
    fn sanitize_strips_separators() {
        assert_eq!(sanitize_location("My/Door").as_deref(), Some("/MyDoor"));
    }

    #[test]
    fn sanitize_keeps_leading_separator_semantics() {
        assert_eq!(sanitize_location("/Garage").as_deref(), Some("/Garage"));
    }

    #[test]
    fn sanitize_keeps_underscores() {
        assert_eq!(
            sanitize_location("back_door 2").as_deref(),
            Some("/back_door2")
        );
    }

    #[test]
    fn sanitize_rejects_empty_result() {
        assert_eq!(sanitize_location("  /// "), None);
        assert_eq!(sanitize_location(""), None);
    }
}
