//! Core types for the location-provider crate.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, MalformedEvent};

/// Identifies one of the position sources the tracker can subscribe to.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ProviderIdentity {
    /// Coarse, low-latency fixes from cell towers and WiFi access points
    NetworkBased,
    /// Precise, high-latency fixes from satellite signals
    SatelliteBased,
}

impl ProviderIdentity {
    /// Every known provider, in a fixed order.
    pub const ALL: [ProviderIdentity; 2] =
        [ProviderIdentity::NetworkBased, ProviderIdentity::SatelliteBased];

    /// Short lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderIdentity::NetworkBased => "network",
            ProviderIdentity::SatelliteBased => "satellite",
        }
    }
}

impl std::fmt::Display for ProviderIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status reported by a provider alongside a status-change event.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ProviderStatus {
    /// The provider can deliver fixes again
    Available,
    /// The provider could not fetch a fix but expects to recover shortly
    TemporarilyUnavailable,
    /// The provider lost signal or connectivity
    OutOfService,
    /// A status code the host platform sent that is not one of the above
    Unknown(i32),
}

impl ProviderStatus {
    pub const OUT_OF_SERVICE_CODE: i32 = 0;
    pub const TEMPORARILY_UNAVAILABLE_CODE: i32 = 1;
    pub const AVAILABLE_CODE: i32 = 2;

    /// Map a host platform status code onto a status.
    ///
    /// Unrecognized codes are kept as [`ProviderStatus::Unknown`] rather than
    /// being rejected.
    pub fn from_code(code: i32) -> Self {
        match code {
            Self::OUT_OF_SERVICE_CODE => ProviderStatus::OutOfService,
            Self::TEMPORARILY_UNAVAILABLE_CODE => ProviderStatus::TemporarilyUnavailable,
            Self::AVAILABLE_CODE => ProviderStatus::Available,
            other => ProviderStatus::Unknown(other),
        }
    }

    /// Human readable description, as written to the diagnostic log.
    pub fn description(&self) -> String {
        match self {
            ProviderStatus::Available => "Provider Available".to_string(),
            ProviderStatus::TemporarilyUnavailable => {
                "Provider Temporarily Unavailable".to_string()
            }
            ProviderStatus::OutOfService => "Provider Out of Service".to_string(),
            ProviderStatus::Unknown(code) => format!("Provider status unknown ({})", code),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ProviderStatus::Unknown(_))
    }
}

/// A position fix exactly as a provider emitted it, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub bearing: Option<f64>,
    /// Time the provider took the fix, if it reports one
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            bearing: None,
            timestamp: None,
        }
    }

    pub fn with_altitude(mut self, meters: f64) -> Self {
        self.altitude = Some(meters);
        self
    }

    pub fn with_bearing(mut self, degrees: f64) -> Self {
        self.bearing = Some(degrees);
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Validated, immutable position fix handed to callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Degrees, in [-90, 90]
    pub latitude: f64,
    /// Degrees, in [-180, 180]
    pub longitude: f64,
    /// Meters above the reference ellipsoid
    pub altitude: Option<f64>,
    /// Degrees east of true north, in [0, 360)
    pub bearing: Option<f64>,
    pub source: ProviderIdentity,
    pub timestamp: DateTime<Utc>,
}

impl PositionSample {
    /// Validate a raw fix and turn it into a sample.
    ///
    /// The provider's own timestamp wins over `received_at` when present.
    ///
    /// # Errors
    ///
    /// Returns a [`MalformedEvent`] describing the first field that is out of
    /// range or not a finite number.
    pub fn from_raw(
        source: ProviderIdentity,
        raw: RawPosition,
        received_at: DateTime<Utc>,
    ) -> Result<Self, MalformedEvent> {
        if !raw.latitude.is_finite() || !raw.longitude.is_finite() {
            return Err(MalformedEvent::NonFiniteCoordinate {
                latitude: raw.latitude,
                longitude: raw.longitude,
            });
        }
        if !(-90.0..=90.0).contains(&raw.latitude) {
            return Err(MalformedEvent::LatitudeOutOfRange(raw.latitude));
        }
        if !(-180.0..=180.0).contains(&raw.longitude) {
            return Err(MalformedEvent::LongitudeOutOfRange(raw.longitude));
        }
        if let Some(altitude) = raw.altitude {
            if !altitude.is_finite() {
                return Err(MalformedEvent::NonFiniteAltitude(altitude));
            }
        }
        if let Some(bearing) = raw.bearing {
            if !bearing.is_finite() || !(0.0..360.0).contains(&bearing) {
                return Err(MalformedEvent::BearingOutOfRange(bearing));
            }
        }

        Ok(Self {
            latitude: raw.latitude,
            longitude: raw.longitude,
            altitude: raw.altitude,
            bearing: raw.bearing,
            source,
            timestamp: raw.timestamp.unwrap_or(received_at),
        })
    }

    pub fn has_altitude(&self) -> bool {
        self.altitude.is_some()
    }

    pub fn has_bearing(&self) -> bool {
        self.bearing.is_some()
    }

    /// `"<latitude> <longitude>"`, the text a display sink renders.
    pub fn display_text(&self) -> String {
        format!(
            "{} {}",
            format_coordinate(self.latitude),
            format_coordinate(self.longitude)
        )
    }
}

/// Whole degrees keep a trailing `.0` so `40` renders as `40.0`.
fn format_coordinate(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Per-provider subscription parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriptionConfig {
    /// Minimum time between two position events
    pub min_interval: Duration,
    /// Minimum movement in meters before a new position event is emitted
    pub min_displacement_m: f64,
}

impl SubscriptionConfig {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(6000);
    pub const DEFAULT_DISPLACEMENT_M: f64 = 5.0;

    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails when the displacement is negative or not a finite number.
    pub fn new(min_interval: Duration, min_displacement_m: f64) -> Result<Self, ConfigError> {
        let config = Self {
            min_interval,
            min_displacement_m,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.min_displacement_m.is_finite() {
            return Err(ConfigError::NonFiniteDisplacement(self.min_displacement_m));
        }
        if self.min_displacement_m < 0.0 {
            return Err(ConfigError::NegativeDisplacement(self.min_displacement_m));
        }
        Ok(())
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            min_interval: Self::DEFAULT_INTERVAL,
            min_displacement_m: Self::DEFAULT_DISPLACEMENT_M,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn received_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[rstest]
    #[case(0, ProviderStatus::OutOfService)]
    #[case(1, ProviderStatus::TemporarilyUnavailable)]
    #[case(2, ProviderStatus::Available)]
    #[case(3, ProviderStatus::Unknown(3))]
    #[case(-1, ProviderStatus::Unknown(-1))]
    fn test_status_from_code(#[case] code: i32, #[case] expected: ProviderStatus) {
        assert_eq!(ProviderStatus::from_code(code), expected);
    }

    #[test]
    fn test_status_description() {
        assert_eq!(ProviderStatus::Available.description(), "Provider Available");
        assert_eq!(
            ProviderStatus::TemporarilyUnavailable.description(),
            "Provider Temporarily Unavailable"
        );
        assert_eq!(
            ProviderStatus::OutOfService.description(),
            "Provider Out of Service"
        );
        assert!(ProviderStatus::Unknown(7).description().contains('7'));
        assert!(!ProviderStatus::Unknown(7).is_known());
    }

    #[test]
    fn test_identity_display() {
        assert_eq!(ProviderIdentity::NetworkBased.to_string(), "network");
        assert_eq!(ProviderIdentity::SatelliteBased.to_string(), "satellite");
        assert!(ProviderIdentity::NetworkBased < ProviderIdentity::SatelliteBased);
    }

    #[test]
    fn test_sample_from_raw_uses_receipt_time_by_default() {
        let sample = PositionSample::from_raw(
            ProviderIdentity::NetworkBased,
            RawPosition::new(40.0, -73.0),
            received_at(),
        )
        .unwrap();

        assert_eq!(sample.timestamp, received_at());
        assert_eq!(sample.source, ProviderIdentity::NetworkBased);
        assert!(!sample.has_altitude());
        assert!(!sample.has_bearing());
    }

    #[test]
    fn test_sample_from_raw_prefers_provider_timestamp() {
        let fix_time = DateTime::from_timestamp(1_600_000_000, 0).unwrap();
        let sample = PositionSample::from_raw(
            ProviderIdentity::SatelliteBased,
            RawPosition::new(51.5, -0.12)
                .with_altitude(35.0)
                .with_bearing(270.0)
                .with_timestamp(fix_time),
            received_at(),
        )
        .unwrap();

        assert_eq!(sample.timestamp, fix_time);
        assert_eq!(sample.altitude, Some(35.0));
        assert_eq!(sample.bearing, Some(270.0));
    }

    #[rstest]
    #[case(RawPosition::new(f64::NAN, 0.0))]
    #[case(RawPosition::new(0.0, f64::INFINITY))]
    #[case(RawPosition::new(90.5, 0.0))]
    #[case(RawPosition::new(0.0, -180.5))]
    #[case(RawPosition::new(0.0, 0.0).with_altitude(f64::NAN))]
    #[case(RawPosition::new(0.0, 0.0).with_bearing(360.0))]
    #[case(RawPosition::new(0.0, 0.0).with_bearing(-1.0))]
    fn test_sample_from_raw_rejects_malformed(#[case] raw: RawPosition) {
        let result = PositionSample::from_raw(ProviderIdentity::NetworkBased, raw, received_at());
        assert!(result.is_err());
    }

    #[rstest]
    #[case(40.0, -73.0, "40.0 -73.0")]
    #[case(40.7128, -74.006, "40.7128 -74.006")]
    #[case(0.00001, 0.0, "0.00001 0.0")]
    fn test_display_text(#[case] lat: f64, #[case] lon: f64, #[case] expected: &str) {
        let sample = PositionSample::from_raw(
            ProviderIdentity::NetworkBased,
            RawPosition::new(lat, lon),
            received_at(),
        )
        .unwrap();
        assert_eq!(sample.display_text(), expected);
    }

    #[test]
    fn test_sample_serializes() {
        let sample = PositionSample::from_raw(
            ProviderIdentity::SatelliteBased,
            RawPosition::new(1.5, 2.5),
            received_at(),
        )
        .unwrap();
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains("SatelliteBased"));
        let back: PositionSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn test_subscription_config_defaults() {
        let config = SubscriptionConfig::default();
        assert_eq!(config.min_interval, Duration::from_millis(6000));
        assert_eq!(config.min_displacement_m, 5.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subscription_config_rejects_bad_displacement() {
        assert!(matches!(
            SubscriptionConfig::new(Duration::ZERO, -1.0),
            Err(ConfigError::NegativeDisplacement(_))
        ));
        assert!(matches!(
            SubscriptionConfig::new(Duration::ZERO, f64::NAN),
            Err(ConfigError::NonFiniteDisplacement(_))
        ));
        assert!(SubscriptionConfig::new(Duration::ZERO, 0.0).is_ok());
    }
}
