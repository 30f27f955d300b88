//! Observer registration.

use std::sync::{Arc, Weak};

use super::types::{AuthorizationStatus, Location};

/// Receives events relayed by the tracking facade.
///
/// Callbacks run on the facade's actor task, one at a time and in the order
/// the provider produced the events. Implementations should return quickly.
pub trait TrackingObserver: Send + Sync {
    /// Called with each batch of locations, in arrival order.
    fn on_locations_updated(&self, locations: &[Location]);

    /// Called once per provider authorization callback with the unmodified status.
    fn on_authorization_changed(&self, status: AuthorizationStatus);
}

/// Non-owning slot for the single registered observer.
#[derive(Default)]
pub(crate) struct ObserverSlot {
    observer: Option<Weak<dyn TrackingObserver>>,
}

impl ObserverSlot {
    /// Registers an observer, replacing any previous one.
    pub(crate) fn set(&mut self, observer: Weak<dyn TrackingObserver>) {
        self.observer = Some(observer);
    }

    pub(crate) fn clear(&mut self) {
        self.observer = None;
    }

    /// Returns the observer if it is still alive.
    ///
    /// A dropped observer is removed from the slot.
    pub(crate) fn current(&mut self) -> Option<Arc<dyn TrackingObserver>> {
        let observer = self.observer.as_ref()?.upgrade();
        if observer.is_none() {
            log::debug!("Registered observer was dropped, clearing slot");
            self.observer = None;
        }
        observer
    }
}
