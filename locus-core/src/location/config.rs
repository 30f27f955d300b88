//! Provider configuration for a tracking session.

use serde::{Deserialize, Serialize};

use super::error::{TrackingError, TrackingResult};

/// Accuracy the provider should aim for.
///
/// Higher accuracy costs more power. The provider maps these onto its own
/// accuracy constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DesiredAccuracy {
    /// Highest accuracy plus additional sensor data, for navigation use
    BestForNavigation,
    /// Best accuracy the device can provide
    #[default]
    Best,
    /// Within ten meters
    NearestTenMeters,
    /// Within one hundred meters
    HundredMeters,
    /// Within one kilometer
    Kilometer,
    /// Within three kilometers
    ThreeKilometers,
}

/// Settings applied to the provider when the facade is created.
///
/// # Example
///
/// ```
/// use locus_core::location::{DesiredAccuracy, TrackingConfig};
///
/// let config = TrackingConfig::from_json(r#"{"desired_accuracy":"HundredMeters"}"#).unwrap();
/// assert_eq!(config.desired_accuracy, DesiredAccuracy::HundredMeters);
/// assert!(config.allows_background_updates);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Accuracy the provider should aim for
    pub desired_accuracy: DesiredAccuracy,

    /// Minimum horizontal movement in meters before an update is delivered.
    /// `None` delivers every movement.
    pub distance_filter_meters: Option<f64>,

    /// Whether updates continue while the application is in the background
    pub allows_background_updates: bool,

    /// Whether the platform may pause updates on its own when the device is
    /// stationary. Off by default so that pausing stays under caller control.
    pub pauses_updates_automatically: bool,

    /// Whether the platform shows its background location indicator
    pub shows_background_indicator: bool,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            desired_accuracy: DesiredAccuracy::default(),
            distance_filter_meters: None,
            allows_background_updates: true,
            pauses_updates_automatically: false,
            shows_background_indicator: true,
        }
    }
}

impl TrackingConfig {
    /// Checks the configuration for values the provider cannot apply.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Config`] if the distance filter is negative
    /// or not finite.
    pub fn validate(&self) -> TrackingResult<()> {
        if let Some(meters) = self.distance_filter_meters {
            if !meters.is_finite() || meters < 0.0 {
                return Err(TrackingError::Config(format!(
                    "distance filter must be a non-negative number of meters, got {meters}"
                )));
            }
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns [`TrackingError::Config`] if the JSON is malformed or the
    /// resulting configuration fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> TrackingResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| TrackingError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Converts this configuration to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
