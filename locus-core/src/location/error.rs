//! Error types for location tracking.
//!
//! None of these cross the facade's control operations. They are logged
//! where they occur, and only construction of the facade returns them.

use thiserror::Error;

/// Errors that can occur while tracking.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Location services are turned off at the OS level.
    #[error("Location services are disabled")]
    ServiceDisabled,

    /// The provider reported a failure.
    #[error("Location provider failed: {0}")]
    Provider(#[from] ProviderError),

    /// The facade was created outside a tokio runtime.
    #[error("No async runtime available to run the tracking actor")]
    NoRuntime,

    /// Invalid tracking configuration.
    #[error("Invalid tracking configuration: {0}")]
    Config(String),

    /// The tracking actor has shut down.
    #[error("Tracking facade is closed")]
    Closed,
}

/// Result type for tracking operations.
pub type TrackingResult<T> = Result<T, TrackingError>;

/// Category of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// No fix could be obtained right now. Usually transient.
    LocationUnknown,
    /// The platform refused access to location data.
    Denied,
    /// A network-assisted lookup failed.
    Network,
    /// Any other platform error code.
    Other(i32),
}

impl ProviderErrorKind {
    /// Maps a raw platform error code to a kind.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        match code {
            0 => Self::LocationUnknown,
            1 => Self::Denied,
            2 => Self::Network,
            other => Self::Other(other),
        }
    }

    /// Returns true if the platform is expected to recover without help.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::LocationUnknown)
    }
}

/// A failure reported by the location provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
    /// Failure category.
    pub kind: ProviderErrorKind,
    /// Human-readable description from the platform.
    pub message: String,
}

impl ProviderError {
    /// Creates a new provider error.
    #[must_use]
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a provider error from a raw platform code.
    #[must_use]
    pub fn from_code(code: i32, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::from_code(code), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_disabled_error_display() {
        let error = TrackingError::ServiceDisabled;
        assert_eq!(error.to_string(), "Location services are disabled");
    }

    #[test]
    fn provider_error_display() {
        let error = TrackingError::from(ProviderError::new(
            ProviderErrorKind::Network,
            "lookup timed out",
        ));
        assert_eq!(
            error.to_string(),
            "Location provider failed: Network: lookup timed out"
        );
    }

    #[test]
    fn no_runtime_error_display() {
        let error = TrackingError::NoRuntime;
        assert_eq!(
            error.to_string(),
            "No async runtime available to run the tracking actor"
        );
    }

    #[test]
    fn config_error_display() {
        let error = TrackingError::Config("bad filter".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid tracking configuration: bad filter"
        );
    }

    #[test]
    fn closed_error_display() {
        assert_eq!(TrackingError::Closed.to_string(), "Tracking facade is closed");
    }

    #[test]
    fn provider_error_kind_from_code() {
        assert_eq!(
            ProviderErrorKind::from_code(0),
            ProviderErrorKind::LocationUnknown
        );
        assert_eq!(ProviderErrorKind::from_code(1), ProviderErrorKind::Denied);
        assert_eq!(ProviderErrorKind::from_code(2), ProviderErrorKind::Network);
        assert_eq!(
            ProviderErrorKind::from_code(11),
            ProviderErrorKind::Other(11)
        );
    }

    #[test]
    fn only_location_unknown_is_transient() {
        assert!(ProviderErrorKind::LocationUnknown.is_transient());
        assert!(!ProviderErrorKind::Denied.is_transient());
        assert!(!ProviderErrorKind::Network.is_transient());
        assert!(!ProviderErrorKind::Other(3).is_transient());
    }

    #[test]
    fn provider_error_from_code_keeps_message() {
        let error = ProviderError::from_code(1, "denied by user");
        assert_eq!(error.kind, ProviderErrorKind::Denied);
        assert_eq!(error.message, "denied by user");
    }

    #[test]
    fn error_debug_format() {
        let debug_str = format!("{:?}", TrackingError::Closed);
        assert!(debug_str.contains("Closed"));
    }
}
