//! Configuration for the location tracker
//!
//! The tracker is built with one [`SubscriptionConfig`] per provider. The
//! values are fixed once the tracker is built.

use location_provider::{ConfigError, ProviderIdentity, SubscriptionConfig};

/// Subscription parameters for every known provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Network-based provider. Default: 6000 ms, 5.0 m
    pub network: SubscriptionConfig,

    /// Satellite-based provider. Default: 6000 ms, 5.0 m
    pub satellite: SubscriptionConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            network: SubscriptionConfig::default(),
            satellite: SubscriptionConfig::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config used for the given provider
    pub fn for_provider(&self, identity: ProviderIdentity) -> SubscriptionConfig {
        match identity {
            ProviderIdentity::NetworkBased => self.network,
            ProviderIdentity::SatelliteBased => self.satellite,
        }
    }

    pub fn with_network(mut self, config: SubscriptionConfig) -> Self {
        self.network = config;
        self
    }

    pub fn with_satellite(mut self, config: SubscriptionConfig) -> Self {
        self.satellite = config;
        self
    }

    /// Validate every per-provider config
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.satellite.validate()?;
        Ok(())
    }
}
