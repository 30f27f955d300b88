//! Location data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single location fix supplied by the platform provider.
///
/// Values are produced by the provider and never modified afterwards; the
/// facade only buffers and forwards them.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use locus_core::location::Location;
///
/// let fix = Location::new(37.7749, -122.4194, 16.0, 5.0, Utc::now());
/// assert!(fix.has_valid_coordinates());
/// assert!(fix.has_valid_accuracy());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Latitude in degrees (WGS 84)
    pub latitude: f64,

    /// Longitude in degrees (WGS 84)
    pub longitude: f64,

    /// Altitude above sea level in meters
    pub altitude: f64,

    /// Horizontal accuracy radius in meters. Negative means the fix is invalid.
    pub accuracy: f64,

    /// When the provider determined this fix (UTC)
    pub timestamp: DateTime<Utc>,
}

impl Location {
    /// Creates a new `Location`.
    #[must_use]
    pub const fn new(
        latitude: f64,
        longitude: f64,
        altitude: f64,
        accuracy: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            accuracy,
            timestamp,
        }
    }

    /// Returns true if latitude and longitude are finite and within range.
    ///
    /// Latitude must be -90.0 to 90.0, longitude -180.0 to 180.0.
    #[must_use]
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Returns true if the provider reported a usable horizontal accuracy.
    #[must_use]
    pub fn has_valid_accuracy(&self) -> bool {
        self.accuracy.is_finite() && self.accuracy >= 0.0
    }
}

/// Location access granted to the application by the platform.
///
/// Raw platform codes map in declaration order: `0` is `NotDetermined`
/// through `4` for `AuthorizedWhenInUse`. Any other code is kept as
/// `Unknown` so that statuses added by future platform releases are
/// represented instead of rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    #[default]
    NotDetermined,
    /// Access is blocked by a policy the user cannot change
    Restricted,
    /// The user refused access
    Denied,
    /// Access granted at all times, including in the background
    AuthorizedAlways,
    /// Access granted only while the application is in use
    AuthorizedWhenInUse,
    /// A status this library does not recognize, with its raw platform code
    Unknown(i32),
}

impl AuthorizationStatus {
    /// Maps a raw platform code to a status.
    ///
    /// # Examples
    ///
    /// ```
    /// use locus_core::location::AuthorizationStatus;
    ///
    /// assert_eq!(AuthorizationStatus::from_raw(3), AuthorizationStatus::AuthorizedAlways);
    /// assert_eq!(AuthorizationStatus::from_raw(42), AuthorizationStatus::Unknown(42));
    /// ```
    #[must_use]
    pub const fn from_raw(code: i32) -> Self {
        match code {
            0 => Self::NotDetermined,
            1 => Self::Restricted,
            2 => Self::Denied,
            3 => Self::AuthorizedAlways,
            4 => Self::AuthorizedWhenInUse,
            other => Self::Unknown(other),
        }
    }

    /// Returns the raw platform code for this status.
    #[must_use]
    pub const fn to_raw(self) -> i32 {
        match self {
            Self::NotDetermined => 0,
            Self::Restricted => 1,
            Self::Denied => 2,
            Self::AuthorizedAlways => 3,
            Self::AuthorizedWhenInUse => 4,
            Self::Unknown(code) => code,
        }
    }

    /// Returns true if the status allows location access.
    ///
    /// Fails closed: anything other than the two authorized variants,
    /// including unknown statuses, is treated as no access.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::AuthorizedAlways | Self::AuthorizedWhenInUse)
    }

    /// Returns true if the user or a policy has refused access.
    #[must_use]
    pub const fn is_refused(self) -> bool {
        matches!(self, Self::Denied | Self::Restricted)
    }
}

/// Session-level tracking state.
///
/// ```text
/// Idle --start--> Tracking --pause--> Paused --resume--> Tracking
/// Tracking | Paused --stop--> Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TrackingState {
    /// No session is running
    #[default]
    Idle,
    /// Continuous updates and significant-change monitoring are active
    Tracking,
    /// Continuous updates are stopped, significant-change monitoring is not
    Paused,
}
