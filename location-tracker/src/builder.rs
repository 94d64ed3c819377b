//! Builder for creating and configuring a LocationTracker.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use location_provider::{ProviderIdentity, PushProvider};
//! use location_tracker::{LocationCallbacks, TrackerBuilder};
//!
//! let network = Arc::new(PushProvider::new(ProviderIdentity::NetworkBased));
//! let satellite = Arc::new(PushProvider::new(ProviderIdentity::SatelliteBased));
//!
//! let tracker = TrackerBuilder::new()
//!     .with_provider(network.clone())
//!     .with_provider(satellite.clone())
//!     .with_callbacks(LocationCallbacks::new().on_position_changed(|s| println!("{:?}", s)))
//!     .build()?;
//! ```

use std::sync::{mpsc as std_mpsc, Arc};

use location_provider::{ProviderHandle, SubscriptionConfig};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::callbacks::{DisplaySink, LocationCallbacks};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::manager::SubscriptionManager;
use crate::router::EventRouter;
use crate::tracker::LocationTracker;
use crate::worker::spawn_dispatch_worker;

/// Events buffered for [`LocationTracker::iter`] before new ones are dropped
pub const DEFAULT_EVENT_STREAM_CAPACITY: usize = 1024;

/// Builder for a [`LocationTracker`]
///
/// # Validation
///
/// `build()` fails when:
/// - no provider was added
/// - two providers share an identity
/// - a subscription config is invalid
pub struct TrackerBuilder {
    config: TrackerConfig,
    providers: Vec<(Arc<dyn ProviderHandle>, Option<SubscriptionConfig>)>,
    callbacks: LocationCallbacks,
    display: Option<Arc<dyn DisplaySink>>,
    event_stream: Option<usize>,
}

impl TrackerBuilder {
    /// New builder using [`TrackerConfig::default`]
    pub fn new() -> Self {
        Self {
            config: TrackerConfig::default(),
            providers: Vec::new(),
            callbacks: LocationCallbacks::new(),
            display: None,
            event_stream: None,
        }
    }

    pub fn with_config(mut self, config: TrackerConfig) -> Self {
        self.config = config;
        self
    }

    /// Add a provider; its config is taken from the [`TrackerConfig`] entry
    /// for the provider's identity.
    pub fn with_provider(mut self, handle: Arc<dyn ProviderHandle>) -> Self {
        self.providers.push((handle, None));
        self
    }

    /// Add a provider with an explicit config, overriding [`TrackerConfig`].
    pub fn with_provider_config(
        mut self,
        handle: Arc<dyn ProviderHandle>,
        config: SubscriptionConfig,
    ) -> Self {
        self.providers.push((handle, Some(config)));
        self
    }

    pub fn with_callbacks(mut self, callbacks: LocationCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Sink that receives the formatted position text
    pub fn with_display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    /// Also publish every delivered event to [`LocationTracker::iter`],
    /// buffering up to [`DEFAULT_EVENT_STREAM_CAPACITY`] undrained events.
    pub fn with_event_stream(self) -> Self {
        self.with_event_stream_capacity(DEFAULT_EVENT_STREAM_CAPACITY)
    }

    /// Like [`with_event_stream`](Self::with_event_stream) with an explicit
    /// buffer size. Once the buffer is full further events are dropped from
    /// the stream (callbacks still run) and counted in
    /// [`LocationTracker::dropped_stream_events`].
    pub fn with_event_stream_capacity(mut self, capacity: usize) -> Self {
        self.event_stream = Some(capacity.max(1));
        self
    }

    /// Build the tracker and start its dispatch worker.
    ///
    /// Providers are registered but not subscribed; call
    /// [`LocationTracker::on_foreground`] to start them.
    pub fn build(self) -> Result<LocationTracker> {
        self.config.validate()?;

        if self.providers.is_empty() {
            return Err(TrackerError::NoProviders);
        }

        let (envelope_tx, envelope_rx) = mpsc::unbounded_channel();
        let manager = SubscriptionManager::new(envelope_tx);

        for (handle, config) in self.providers {
            let config = config.unwrap_or_else(|| self.config.for_provider(handle.identity()));
            manager.register(handle, config)?;
        }

        let mut callbacks = self.callbacks;
        if let Some(display) = self.display {
            callbacks.set_display(display);
        }

        let (stream_tx, stream_rx) = match self.event_stream {
            Some(capacity) => {
                let (tx, rx) = std_mpsc::sync_channel(capacity);
                (Some(tx), Some(Arc::new(Mutex::new(rx))))
            }
            None => (None, None),
        };

        let router = EventRouter::new(manager.shared_set(), callbacks, stream_tx);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let worker = spawn_dispatch_worker(router.clone(), envelope_rx, shutdown_rx)?;

        tracing::debug!(
            "Location tracker built with {} provider(s)",
            manager.provider_count()
        );

        Ok(LocationTracker::new(
            manager,
            router,
            stream_rx,
            shutdown_tx,
            worker,
        ))
    }
}

impl Default for TrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
