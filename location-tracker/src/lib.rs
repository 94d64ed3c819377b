//! # Location Tracker
//!
//! A sync-first facade that keeps position providers subscribed while the
//! host is in the foreground and routes their notifications to consumer
//! callbacks.
//!
//! ## Overview
//!
//! Two independent sources feed the tracker: a coarse, low-latency
//! network-based provider and a precise, high-latency satellite-based one.
//! Each emits position fixes, status changes and enable/disable
//! notifications on its own schedule. The tracker:
//!
//! - subscribes and releases providers on foreground/background transitions,
//!   tolerating repeated or out-of-order signals
//! - keeps going when one provider fails to subscribe
//! - classifies every event and dispatches it to the matching callback
//! - guarantees nothing is dispatched for a provider after `stop()` returns
//!
//! It does no filtering or fusion of fixes; it only manages subscription
//! state and event routing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use location_tracker::prelude::*;
//!
//! let network = Arc::new(PushProvider::new(ProviderIdentity::NetworkBased));
//! let satellite = Arc::new(PushProvider::new(ProviderIdentity::SatelliteBased));
//!
//! let tracker = LocationTracker::builder()
//!     .with_provider(network.clone())
//!     .with_provider(satellite.clone())
//!     .with_callbacks(
//!         LocationCallbacks::new()
//!             .on_provider_status_changed(|provider, status| {
//!                 println!("{}: {}", provider, status.description())
//!             }),
//!     )
//!     .with_display(Arc::new(|text: &str| println!("{}", text)))
//!     .build()?;
//!
//! tracker.on_foreground();
//!
//! // The host forwards platform callbacks into the providers
//! network.push_position(RawPosition::new(40.0, -73.0));
//!
//! tracker.on_background();
//! ```
//!
//! ## Architecture
//!
//! 1. **ProviderHandle** (`location-provider`): one position source, emits
//!    raw envelopes tagged with a subscription generation
//! 2. **SubscriptionManager**: owns the set of active providers behind one
//!    reentrant lock; `start`/`stop` are idempotent and may be called from
//!    callbacks
//! 3. **EventRouter**: classifies envelopes and invokes callbacks, dropping
//!    envelopes whose generation is no longer live
//! 4. **Dispatch worker**: background thread draining the envelope channel

pub mod builder;
pub mod callbacks;
pub mod config;
pub mod error;
pub mod iter;
pub mod logging;
pub mod manager;
pub mod router;
pub mod tracker;
pub mod worker;

pub use builder::TrackerBuilder;
pub use callbacks::{DisplaySink, LocationCallbacks};
pub use config::TrackerConfig;
pub use error::{Result, TrackerError};
pub use iter::EventIterator;
pub use manager::{
    ActiveSubscriptionSet, SharedSubscriptionSet, StartReport, SubscriptionManager,
    SubscriptionState,
};
pub use router::{DispatchOutcome, EventRouter, RoutedEvent, LOG_TARGET};
pub use tracker::LocationTracker;

// Re-export commonly used types from the provider crate
pub use location_provider::{
    EventSink, MalformedEvent, PositionSample, ProviderError, ProviderHandle, ProviderIdentity,
    ProviderStatus, PushProvider, RawPosition, SubscriptionConfig,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DisplaySink, LocationCallbacks, LocationTracker, PositionSample, ProviderError,
        ProviderHandle, ProviderIdentity, ProviderStatus, PushProvider, RawPosition,
        RoutedEvent, StartReport, SubscriptionConfig, TrackerBuilder, TrackerConfig,
        TrackerError,
    };
}
