//! DCIM service
//!
//! Entry points that validate, persist and announce changes. Every
//! operation runs inside its own store transaction: validation errors,
//! template errors and store rejections all roll back everything the
//! operation wrote. Change events are held until the commit succeeds, so a
//! rolled-back operation announces nothing.
//!
//! Operations are grouped by the record they start from:
//! - `device`: create, update and delete devices
//! - `device_type`: height and depth changes against racked instances
//! - `module`: module installation with component population
//! - `virtual_chassis`: chassis lifecycle and the delete guard
//! - `component`: component edits and device bay installation

pub mod component;
pub mod device;
pub mod device_type;
pub mod module;
pub mod virtual_chassis;

#[cfg(test)]
mod device_test;
#[cfg(test)]
mod module_test;

use crate::config::Settings;
use crate::error::DcimError;
use crate::instantiate::Instantiator;
use crate::notify::{ChangeEvent, ChangeObserver, EventBuffer};
use dcim_store::{DcimStore, DcimTransaction};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// One open transaction and the events it will announce on commit
pub(crate) struct Operation {
    tx: Box<dyn DcimTransaction>,
    events: EventBuffer,
    bulk_create: bool,
}

impl Operation {
    pub(crate) fn store(&self) -> &dyn DcimStore {
        self.tx.as_store()
    }

    /// Observer that buffers until commit
    pub(crate) fn observer(&self) -> &dyn ChangeObserver {
        &self.events
    }

    pub(crate) fn notify(&self, event: ChangeEvent) {
        self.events.notify(&event);
    }

    pub(crate) fn instantiator(&self) -> Instantiator<'_> {
        Instantiator::new(self.store(), &self.events, self.bulk_create)
    }
}

/// Validating front end to a [`DcimStore`]
#[derive(Clone)]
pub struct DcimService {
    pub(crate) store: Arc<dyn DcimStore>,
    pub(crate) observer: Arc<dyn ChangeObserver>,
    pub(crate) settings: Settings,
}

impl fmt::Debug for DcimService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DcimService").field("settings", &self.settings).finish_non_exhaustive()
    }
}

impl DcimService {
    pub fn new(store: Arc<dyn DcimStore>, observer: Arc<dyn ChangeObserver>, settings: Settings) -> Self {
        Self {
            store,
            observer,
            settings,
        }
    }

    pub fn store(&self) -> &dyn DcimStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) async fn begin(&self) -> Result<Operation, DcimError> {
        Ok(Operation {
            tx: self.store.begin().await?,
            events: EventBuffer::new(),
            bulk_create: self.settings.bulk_create,
        })
    }

    /// Commit and announce on success, roll back and discard events on failure
    pub(crate) async fn finish<T>(&self, op: Operation, result: Result<T, DcimError>) -> Result<T, DcimError> {
        let Operation { tx, events, .. } = op;
        match result {
            Ok(value) => {
                tx.commit().await?;
                events.flush(self.observer.as_ref());
                Ok(value)
            }
            Err(err) => {
                warn!("Rolling back: {}", err);
                if let Err(rollback_err) = tx.rollback().await {
                    error!("Rollback failed: {}", rollback_err);
                }
                debug!("Discarded {} change events", events.len());
                Err(err)
            }
        }
    }
}
