//! Provider implementation driven by the host platform.
//!
//! The facade's provider calls are queued as [`ProviderCommand`]s for the
//! host to apply to the native location manager. The host reports the
//! native manager's answers back through the setters and `report_*` calls.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use locus_core::location::{
    AuthorizationStatus, Location, LocationProvider, ProviderDelegate, ProviderError,
    ProviderEvents, TrackingConfig,
};

/// A call the host must apply to the native location manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    /// Apply the JSON-encoded `TrackingConfig`.
    Configure {
        /// Settings as JSON
        config_json: String,
    },
    /// Ask for the broadest location grant.
    RequestAlwaysAuthorization,
    /// Start continuous updates.
    StartUpdatingLocation,
    /// Stop continuous updates.
    StopUpdatingLocation,
    /// Start significant-change monitoring.
    StartMonitoringSignificantChanges,
    /// Stop significant-change monitoring.
    StopMonitoringSignificantChanges,
    /// Request a single fix.
    RequestLocation,
}

struct Shared {
    services_enabled: AtomicBool,
    status: AtomicI32,
    commands: Mutex<Vec<ProviderCommand>>,
    delegate: Mutex<Option<ProviderEvents>>,
}

/// Provider backed by command and event queues shared with the host.
#[derive(Clone)]
pub(crate) struct PlatformProvider {
    shared: Arc<Shared>,
}

impl PlatformProvider {
    pub(crate) fn new(services_enabled: bool, status: AuthorizationStatus) -> Self {
        Self {
            shared: Arc::new(Shared {
                services_enabled: AtomicBool::new(services_enabled),
                status: AtomicI32::new(status.to_raw()),
                commands: Mutex::new(Vec::new()),
                delegate: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn set_services_enabled(&self, enabled: bool) {
        self.shared.services_enabled.store(enabled, Ordering::SeqCst);
    }

    pub(crate) fn take_commands(&self) -> Vec<ProviderCommand> {
        std::mem::take(&mut *lock(&self.shared.commands))
    }

    pub(crate) fn report_authorization(&self, status: AuthorizationStatus) {
        self.shared.status.store(status.to_raw(), Ordering::SeqCst);
        if let Some(delegate) = self.delegate() {
            delegate.authorization_changed(status);
        }
    }

    pub(crate) fn report_locations(&self, locations: Vec<Location>) {
        if let Some(delegate) = self.delegate() {
            delegate.locations_updated(locations);
        }
    }

    pub(crate) fn report_failure(&self, error: ProviderError) {
        if let Some(delegate) = self.delegate() {
            delegate.failed(error);
        }
    }

    fn delegate(&self) -> Option<ProviderEvents> {
        let delegate = lock(&self.shared.delegate).clone();
        if delegate.is_none() {
            log::warn!("Host reported a location event before the tracker was ready");
        }
        delegate
    }

    fn push(&self, command: ProviderCommand) {
        lock(&self.shared.commands).push(command);
    }
}

impl LocationProvider for PlatformProvider {
    fn location_services_enabled(&self) -> bool {
        self.shared.services_enabled.load(Ordering::SeqCst)
    }

    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::from_raw(self.shared.status.load(Ordering::SeqCst))
    }

    fn request_always_authorization(&self) {
        self.push(ProviderCommand::RequestAlwaysAuthorization);
    }

    fn start_updating_location(&self) {
        self.push(ProviderCommand::StartUpdatingLocation);
    }

    fn stop_updating_location(&self) {
        self.push(ProviderCommand::StopUpdatingLocation);
    }

    fn start_monitoring_significant_location_changes(&self) {
        self.push(ProviderCommand::StartMonitoringSignificantChanges);
    }

    fn stop_monitoring_significant_location_changes(&self) {
        self.push(ProviderCommand::StopMonitoringSignificantChanges);
    }

    fn request_location(&self) {
        self.push(ProviderCommand::RequestLocation);
    }

    fn configure(&self, config: &TrackingConfig) {
        match config.to_json() {
            Ok(config_json) => self.push(ProviderCommand::Configure { config_json }),
            Err(e) => log::error!("Failed to encode tracking configuration: {e}"),
        }
    }

    fn set_delegate(&self, delegate: ProviderEvents) {
        *lock(&self.shared.delegate) = Some(delegate);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_drained_in_order() {
        let provider = PlatformProvider::new(true, AuthorizationStatus::NotDetermined);
        provider.start_updating_location();
        provider.start_monitoring_significant_location_changes();

        assert_eq!(
            provider.take_commands(),
            vec![
                ProviderCommand::StartUpdatingLocation,
                ProviderCommand::StartMonitoringSignificantChanges,
            ]
        );
        assert!(provider.take_commands().is_empty());
    }

    #[test]
    fn configure_queues_json_config() {
        let provider = PlatformProvider::new(true, AuthorizationStatus::NotDetermined);
        provider.configure(&TrackingConfig::default());

        let commands = provider.take_commands();
        let Some(ProviderCommand::Configure { config_json }) = commands.first() else {
            panic!("expected a configure command, got {commands:?}");
        };
        assert_eq!(
            TrackingConfig::from_json(config_json).unwrap(),
            TrackingConfig::default()
        );
    }

    #[test]
    fn reported_status_is_visible_to_facade() {
        let provider = PlatformProvider::new(true, AuthorizationStatus::NotDetermined);
        provider.report_authorization(AuthorizationStatus::AuthorizedWhenInUse);

        assert_eq!(
            provider.authorization_status(),
            AuthorizationStatus::AuthorizedWhenInUse
        );
    }

    #[test]
    fn services_flag_can_be_toggled() {
        let provider = PlatformProvider::new(true, AuthorizationStatus::NotDetermined);
        assert!(provider.location_services_enabled());

        provider.set_services_enabled(false);
        assert!(!provider.location_services_enabled());
    }

    #[test]
    fn events_before_delegate_are_dropped() {
        let provider = PlatformProvider::new(true, AuthorizationStatus::NotDetermined);

        // Must not panic
        provider.report_locations(Vec::new());
        provider.report_failure(ProviderError::from_code(0, "no fix"));
    }
}
