//! Test doubles for the provider and observer seams.
//!
//! Only compiled for tests or with the `test-utils` feature.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::config::TrackingConfig;
use super::error::ProviderError;
use super::observer::TrackingObserver;
use super::provider::{LocationProvider, ProviderDelegate, ProviderEvents};
use super::types::{AuthorizationStatus, Location};

/// A call the facade made on the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderCall {
    /// `configure`
    Configure,
    /// `location_services_enabled`
    LocationServicesEnabled,
    /// `request_always_authorization`
    RequestAlwaysAuthorization,
    /// `start_updating_location`
    StartUpdatingLocation,
    /// `stop_updating_location`
    StopUpdatingLocation,
    /// `start_monitoring_significant_location_changes`
    StartMonitoringSignificantChanges,
    /// `stop_monitoring_significant_location_changes`
    StopMonitoringSignificantChanges,
    /// `request_location`
    RequestLocation,
}

struct FakeState {
    services_enabled: bool,
    check_delay: Option<Duration>,
    status: AuthorizationStatus,
    calls: Vec<ProviderCall>,
    config: Option<TrackingConfig>,
    delegate: Option<ProviderEvents>,
}

/// In-memory provider that records calls and emits events on demand.
///
/// Clones share state, so a test can keep one clone while the facade owns
/// another.
#[derive(Clone)]
pub struct FakeProvider {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeProvider {
    /// Creates a provider with services enabled and status `NotDetermined`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                services_enabled: true,
                check_delay: None,
                status: AuthorizationStatus::NotDetermined,
                calls: Vec::new(),
                config: None,
                delegate: None,
            })),
        }
    }

    /// Sets the initial authorization status.
    #[must_use]
    pub fn with_status(self, status: AuthorizationStatus) -> Self {
        self.state().status = status;
        self
    }

    /// Makes every `location_services_enabled` call block for `delay`.
    #[must_use]
    pub fn with_service_check_delay(self, delay: Duration) -> Self {
        self.state().check_delay = Some(delay);
        self
    }

    /// Turns location services on or off.
    pub fn set_services_enabled(&self, enabled: bool) {
        self.state().services_enabled = enabled;
    }

    /// Returns every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state().calls.clone()
    }

    /// Returns how often `call` was made.
    #[must_use]
    pub fn count(&self, call: ProviderCall) -> usize {
        self.state().calls.iter().filter(|c| **c == call).count()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Returns the configuration the facade applied, if any.
    #[must_use]
    pub fn config(&self) -> Option<TrackingConfig> {
        self.state().config.clone()
    }

    /// Returns true once the facade has installed its delegate.
    #[must_use]
    pub fn has_delegate(&self) -> bool {
        self.state().delegate.is_some()
    }

    /// Changes the status and reports it through the delegate.
    pub fn emit_authorization(&self, status: AuthorizationStatus) {
        self.state().status = status;
        if let Some(delegate) = self.delegate() {
            delegate.authorization_changed(status);
        }
    }

    /// Delivers a batch of locations through the delegate.
    pub fn emit_locations(&self, locations: Vec<Location>) {
        if let Some(delegate) = self.delegate() {
            delegate.locations_updated(locations);
        }
    }

    /// Reports a failure through the delegate.
    pub fn emit_failure(&self, error: ProviderError) {
        if let Some(delegate) = self.delegate() {
            delegate.failed(error);
        }
    }

    fn delegate(&self) -> Option<ProviderEvents> {
        self.state().delegate.clone()
    }

    fn record(&self, call: ProviderCall) {
        self.state().calls.push(call);
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LocationProvider for FakeProvider {
    fn location_services_enabled(&self) -> bool {
        let delay = {
            let mut state = self.state();
            state.calls.push(ProviderCall::LocationServicesEnabled);
            state.check_delay
        };
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        self.state().services_enabled
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        self.state().status
    }

    fn request_always_authorization(&self) {
        self.record(ProviderCall::RequestAlwaysAuthorization);
    }

    fn start_updating_location(&self) {
        self.record(ProviderCall::StartUpdatingLocation);
    }

    fn stop_updating_location(&self) {
        self.record(ProviderCall::StopUpdatingLocation);
    }

    fn start_monitoring_significant_location_changes(&self) {
        self.record(ProviderCall::StartMonitoringSignificantChanges);
    }

    fn stop_monitoring_significant_location_changes(&self) {
        self.record(ProviderCall::StopMonitoringSignificantChanges);
    }

    fn request_location(&self) {
        self.record(ProviderCall::RequestLocation);
    }

    fn configure(&self, config: &TrackingConfig) {
        let mut state = self.state();
        state.calls.push(ProviderCall::Configure);
        state.config = Some(config.clone());
    }

    fn set_delegate(&self, delegate: ProviderEvents) {
        self.state().delegate = Some(delegate);
    }
}

/// Event seen by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    /// A location batch
    Locations(Vec<Location>),
    /// An authorization change
    Authorization(AuthorizationStatus),
}

/// Observer that records every callback.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    /// Creates an observer with no recorded events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every recorded event, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.lock().clone()
    }

    /// Returns the location batches, oldest first.
    #[must_use]
    pub fn location_batches(&self) -> Vec<Vec<Location>> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Locations(batch) => Some(batch.clone()),
                ObservedEvent::Authorization(_) => None,
            })
            .collect()
    }

    /// Returns the authorization changes, oldest first.
    #[must_use]
    pub fn authorization_changes(&self) -> Vec<AuthorizationStatus> {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                ObservedEvent::Authorization(status) => Some(*status),
                ObservedEvent::Locations(_) => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ObservedEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TrackingObserver for RecordingObserver {
    fn on_locations_updated(&self, locations: &[Location]) {
        self.lock().push(ObservedEvent::Locations(locations.to_vec()));
    }

    fn on_authorization_changed(&self, status: AuthorizationStatus) {
        self.lock().push(ObservedEvent::Authorization(status));
    }
}

/// Builds a deterministic location; equal seeds give equal locations.
#[must_use]
pub fn sample_location(seed: u32) -> Location {
    let offset = f64::from(seed);
    Location::new(
        37.0 + offset / 1000.0,
        -122.0 - offset / 1000.0,
        10.0 + offset,
        5.0,
        DateTime::<Utc>::from_timestamp(1_700_000_000 + i64::from(seed), 0).unwrap_or_default(),
    )
}

/// Polls `condition` until it holds, for up to one second.
///
/// Returns whether the condition was met.
pub async fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
