//! Change notifications
//!
//! Every create or update the core performs is announced to a
//! [`ChangeObserver`] (change logging, webhooks). Batch writes announce each
//! affected object only after the batch call has returned. The service
//! collects an operation's events in an [`EventBuffer`] and hands them to the
//! observer only once the operation's transaction has committed.

use chrono::{DateTime, Utc};
use dcim_models::ComponentKind;
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// The kind of object a change event is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectKind {
    Device,
    DeviceType,
    Module,
    VirtualChassis,
    Component(ComponentKind),
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Device => write!(f, "device"),
            ObjectKind::DeviceType => write!(f, "device type"),
            ObjectKind::Module => write!(f, "module"),
            ObjectKind::VirtualChassis => write!(f, "virtual chassis"),
            ObjectKind::Component(kind) => write!(f, "{}", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ChangeAction {
    Created,
    /// `fields` lists the attributes written; empty means a full save
    Updated { fields: Vec<String> },
    Deleted,
}

/// One change to one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub object: ObjectKind,
    pub object_id: u64,
    #[serde(flatten)]
    pub action: ChangeAction,
    /// Device the object belongs to, for components and modules
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    fn new(object: ObjectKind, object_id: u64, action: ChangeAction) -> Self {
        Self {
            object,
            object_id,
            action,
            device_id: None,
            timestamp: Utc::now(),
        }
    }

    pub fn created(object: ObjectKind, object_id: u64) -> Self {
        Self::new(object, object_id, ChangeAction::Created)
    }

    pub fn updated(object: ObjectKind, object_id: u64, fields: &[&str]) -> Self {
        let fields = fields.iter().map(|f| (*f).to_string()).collect();
        Self::new(object, object_id, ChangeAction::Updated { fields })
    }

    pub fn deleted(object: ObjectKind, object_id: u64) -> Self {
        Self::new(object, object_id, ChangeAction::Deleted)
    }

    #[must_use]
    pub fn on_device(mut self, device_id: u64) -> Self {
        self.device_id = Some(device_id);
        self
    }
}

/// Receives change events
pub trait ChangeObserver: Send + Sync {
    fn notify(&self, event: &ChangeEvent);
}

/// Logs every change event at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ChangeObserver for TracingObserver {
    fn notify(&self, event: &ChangeEvent) {
        match &event.action {
            ChangeAction::Created => debug!("Created {} {}", event.object, event.object_id),
            ChangeAction::Updated { fields } if fields.is_empty() => {
                debug!("Updated {} {}", event.object, event.object_id)
            }
            ChangeAction::Updated { fields } => debug!(
                "Updated {} {} ({})",
                event.object,
                event.object_id,
                fields.join(", ")
            ),
            ChangeAction::Deleted => debug!("Deleted {} {}", event.object, event.object_id),
        }
    }
}

/// Holds change events until they can be delivered
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Mutex<Vec<ChangeEvent>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver the held events in the order they were recorded
    pub fn flush(self, observer: &dyn ChangeObserver) {
        let events = self.events.into_inner().unwrap_or_else(PoisonError::into_inner);
        for event in &events {
            observer.notify(event);
        }
    }
}

impl ChangeObserver for EventBuffer {
    fn notify(&self, event: &ChangeEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(any(test, feature = "test-util"))]
pub use recording::RecordingObserver;

#[cfg(any(test, feature = "test-util"))]
mod recording {
    use super::{ChangeAction, ChangeEvent, ChangeObserver, ObjectKind};
    use dcim_store::MemoryStore;
    use std::sync::{Arc, Mutex};

    /// Records events for assertions
    ///
    /// When built with [`RecordingObserver::watching`], it also checks at
    /// notification time that each created component is already stored.
    #[derive(Debug, Clone, Default)]
    pub struct RecordingObserver {
        events: Arc<Mutex<Vec<ChangeEvent>>>,
        unsaved: Arc<Mutex<Vec<u64>>>,
        store: Option<MemoryStore>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn watching(store: MemoryStore) -> Self {
            Self {
                store: Some(store),
                ..Self::default()
            }
        }

        pub fn events(&self) -> Vec<ChangeEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        /// Ids announced as created components before the store held them
        pub fn unsaved_at_notify(&self) -> Vec<u64> {
            self.unsaved.lock().map(|u| u.clone()).unwrap_or_default()
        }

        pub fn created(&self, object: ObjectKind) -> Vec<u64> {
            self.events()
                .into_iter()
                .filter(|e| e.object == object && e.action == ChangeAction::Created)
                .map(|e| e.object_id)
                .collect()
        }

        pub fn updated(&self, object: ObjectKind) -> Vec<u64> {
            self.events()
                .into_iter()
                .filter(|e| e.object == object && matches!(e.action, ChangeAction::Updated { .. }))
                .map(|e| e.object_id)
                .collect()
        }

        pub fn clear(&self) {
            if let Ok(mut events) = self.events.lock() {
                events.clear();
            }
        }
    }

    impl ChangeObserver for RecordingObserver {
        fn notify(&self, event: &ChangeEvent) {
            if let (Some(store), ObjectKind::Component(_)) = (&self.store, event.object)
                && !store.component_exists(event.object_id)
                && let Ok(mut unsaved) = self.unsaved.lock()
            {
                unsaved.push(event.object_id);
            }
            if let Ok(mut events) = self.events.lock() {
                events.push(event.clone());
            }
        }
    }
}
