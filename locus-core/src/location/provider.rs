//! Platform location provider seam.
//!
//! The facade drives a [`LocationProvider`] and receives its callbacks
//! through [`ProviderEvents`], a non-owning sender into the facade's
//! single-consumer queue. Real providers wrap the platform's location
//! manager; tests use [`FakeProvider`](super::testing::FakeProvider).

use tokio::sync::mpsc::WeakUnboundedSender;

use super::config::TrackingConfig;
use super::error::ProviderError;
use super::facade::Request;
use super::types::{AuthorizationStatus, Location};

/// A platform location-determination service.
///
/// The facade owns the provider exclusively. Methods other than
/// [`location_services_enabled`](Self::location_services_enabled) are only
/// called from the facade's actor task; the availability check runs on a
/// blocking worker because some platforms answer it synchronously and slowly.
pub trait LocationProvider: Send + Sync + 'static {
    /// Returns whether location services are enabled at the OS level.
    fn location_services_enabled(&self) -> bool;

    /// Returns the current authorization status.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Asks the platform for the broadest grant. May show a prompt.
    fn request_always_authorization(&self);

    /// Starts continuous high-accuracy updates.
    fn start_updating_location(&self);

    /// Stops continuous updates.
    fn stop_updating_location(&self);

    /// Starts low-power, coarse-grained monitoring.
    fn start_monitoring_significant_location_changes(&self);

    /// Stops significant-change monitoring.
    fn stop_monitoring_significant_location_changes(&self);

    /// Requests a single fix, delivered through the update callback.
    fn request_location(&self);

    /// Applies tracking settings.
    fn configure(&self, config: &TrackingConfig);

    /// Installs the callback channel. Called once, before any other call
    /// except [`authorization_status`](Self::authorization_status).
    fn set_delegate(&self, delegate: ProviderEvents);
}

/// Callbacks a provider delivers to the facade.
pub trait ProviderDelegate {
    /// The authorization status changed.
    fn authorization_changed(&self, status: AuthorizationStatus);

    /// A batch of new locations arrived, oldest first.
    fn locations_updated(&self, locations: Vec<Location>);

    /// The provider failed.
    fn failed(&self, error: ProviderError);
}

/// Provider-side event sink.
///
/// Delivering never blocks. Once the facade has shut down, events are
/// discarded.
#[derive(Clone)]
pub struct ProviderEvents {
    tx: WeakUnboundedSender<Request>,
}

/// Event delivered by the provider.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ProviderEvent {
    AuthorizationChanged(AuthorizationStatus),
    LocationsUpdated(Vec<Location>),
    Failed(ProviderError),
}

impl ProviderEvents {
    pub(crate) const fn new(tx: WeakUnboundedSender<Request>) -> Self {
        Self { tx }
    }

    fn deliver(&self, event: ProviderEvent) {
        let Some(tx) = self.tx.upgrade() else {
            log::debug!("Tracking facade is gone, discarding provider event");
            return;
        };
        if tx.send(Request::Provider(event)).is_err() {
            log::debug!("Tracking facade is gone, discarding provider event");
        }
    }
}

impl ProviderDelegate for ProviderEvents {
    fn authorization_changed(&self, status: AuthorizationStatus) {
        self.deliver(ProviderEvent::AuthorizationChanged(status));
    }

    fn locations_updated(&self, locations: Vec<Location>) {
        self.deliver(ProviderEvent::LocationsUpdated(locations));
    }

    fn failed(&self, error: ProviderError) {
        self.deliver(ProviderEvent::Failed(error));
    }
}

impl std::fmt::Debug for ProviderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEvents").finish_non_exhaustive()
    }
}
