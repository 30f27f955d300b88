//! Host-facing event types and the queue-backed observer.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use locus_core::location::{AuthorizationStatus, Location, TrackingObserver};

/// A location fix in a shape the host can pass across the bridge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Altitude in meters
    pub altitude: f64,
    /// Horizontal accuracy in meters, negative if invalid
    pub accuracy: f64,
    /// Fix time as milliseconds since the Unix epoch
    pub timestamp_ms: i64,
}

impl LocationFix {
    /// Converts the fix into a core `Location`.
    ///
    /// Returns `None` if the coordinates are out of range or the timestamp
    /// cannot be represented.
    #[must_use]
    pub fn to_location(self) -> Option<Location> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(self.timestamp_ms)?;
        let location = Location::new(
            self.latitude,
            self.longitude,
            self.altitude,
            self.accuracy,
            timestamp,
        );
        location.has_valid_coordinates().then_some(location)
    }
}

impl From<&Location> for LocationFix {
    fn from(location: &Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
            altitude: location.altitude,
            accuracy: location.accuracy,
            timestamp_ms: location.timestamp.timestamp_millis(),
        }
    }
}

/// An observer callback, queued for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    /// A batch of locations, oldest first.
    Locations(Vec<LocationFix>),
    /// A new authorization status as its raw platform code.
    Authorization {
        /// Raw platform code
        status: i32,
    },
}

/// Observer that queues callbacks until the host drains them.
#[derive(Debug, Default)]
pub(crate) struct EventQueue {
    events: Mutex<Vec<TrackingEvent>>,
}

impl EventQueue {
    pub(crate) fn take(&self) -> Vec<TrackingEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *events)
    }

    fn push(&self, event: TrackingEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl TrackingObserver for EventQueue {
    fn on_locations_updated(&self, locations: &[Location]) {
        self.push(TrackingEvent::Locations(
            locations.iter().map(LocationFix::from).collect(),
        ));
    }

    fn on_authorization_changed(&self, status: AuthorizationStatus) {
        self.push(TrackingEvent::Authorization {
            status: status.to_raw(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix(latitude: f64, longitude: f64) -> LocationFix {
        LocationFix {
            latitude,
            longitude,
            altitude: 12.0,
            accuracy: 4.0,
            timestamp_ms: 1_700_000_000_000,
        }
    }

    #[test]
    fn valid_fix_converts_to_location() {
        let location = fix(37.7749, -122.4194).to_location().unwrap();

        assert_eq!(location.latitude, 37.7749);
        assert_eq!(location.longitude, -122.4194);
        assert_eq!(location.timestamp.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn invalid_coordinates_are_rejected() {
        assert!(fix(f64::NAN, 0.0).to_location().is_none());
        assert!(fix(0.0, 200.0).to_location().is_none());
    }

    #[test]
    fn location_converts_back_to_same_fix() {
        let original = fix(51.5074, -0.1278);
        let location = original.to_location().unwrap();
        assert_eq!(LocationFix::from(&location), original);
    }

    #[test]
    fn queue_drains_events_in_order() {
        let queue = EventQueue::default();
        let location = fix(1.0, 2.0).to_location().unwrap();

        queue.on_authorization_changed(AuthorizationStatus::AuthorizedAlways);
        queue.on_locations_updated(&[location]);

        assert_eq!(
            queue.take(),
            vec![
                TrackingEvent::Authorization { status: 3 },
                TrackingEvent::Locations(vec![fix(1.0, 2.0)]),
            ]
        );
        assert!(queue.take().is_empty());
    }

    #[test]
    fn unknown_status_keeps_raw_code() {
        let queue = EventQueue::default();
        queue.on_authorization_changed(AuthorizationStatus::Unknown(99));

        assert_eq!(queue.take(), vec![TrackingEvent::Authorization { status: 99 }]);
    }
}
