//! Error types for the location-provider crate.

use crate::types::ProviderIdentity;

/// Errors a provider reports when asked to subscribe.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// The underlying source cannot be reached at all (e.g. permission denied).
    ///
    /// The tracker does not retry this; the provider stays inactive until the
    /// next start.
    #[error("Provider {identity} unavailable: {reason}")]
    Unavailable {
        identity: ProviderIdentity,
        reason: String,
    },
}

impl ProviderError {
    pub fn unavailable(identity: ProviderIdentity, reason: impl Into<String>) -> Self {
        ProviderError::Unavailable {
            identity,
            reason: reason.into(),
        }
    }

    pub fn identity(&self) -> ProviderIdentity {
        match self {
            ProviderError::Unavailable { identity, .. } => *identity,
        }
    }
}

/// Invalid subscription parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Minimum displacement must not be negative, got {0}")]
    NegativeDisplacement(f64),

    #[error("Minimum displacement must be a finite number, got {0}")]
    NonFiniteDisplacement(f64),
}

/// A provider event whose payload could not be turned into a valid sample.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MalformedEvent {
    #[error("Non-finite coordinate: lat={latitude}, lon={longitude}")]
    NonFiniteCoordinate { latitude: f64, longitude: f64 },

    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    #[error("Non-finite altitude: {0}")]
    NonFiniteAltitude(f64),

    #[error("Bearing out of range: {0}")]
    BearingOutOfRange(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let error =
            ProviderError::unavailable(ProviderIdentity::SatelliteBased, "permission denied");
        assert_eq!(
            error.to_string(),
            "Provider satellite unavailable: permission denied"
        );
        assert_eq!(error.identity(), ProviderIdentity::SatelliteBased);
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::NegativeDisplacement(-2.5);
        assert_eq!(
            error.to_string(),
            "Minimum displacement must not be negative, got -2.5"
        );
    }

    #[test]
    fn test_malformed_event_display() {
        let error = MalformedEvent::LatitudeOutOfRange(91.0);
        assert_eq!(error.to_string(), "Latitude out of range: 91");

        let error = MalformedEvent::BearingOutOfRange(400.0);
        assert_eq!(error.to_string(), "Bearing out of range: 400");
    }
}
