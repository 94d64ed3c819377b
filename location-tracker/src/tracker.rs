//! Sync-first location tracker
//!
//! Ties the [`SubscriptionManager`], the [`EventRouter`] and the dispatch
//! worker together behind a blocking API driven by two lifecycle signals.

use std::collections::BTreeMap;
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};

use location_provider::{PositionSample, ProviderIdentity};
use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::builder::TrackerBuilder;
use crate::error::{Result, TrackerError};
use crate::iter::EventIterator;
use crate::manager::{StartReport, SubscriptionManager, SubscriptionState};
use crate::router::{EventRouter, RoutedEvent};

/// Subscribes to position providers while the host is in the foreground
///
/// Foreground/background transitions map 1:1 onto [`start`](Self::start) and
/// [`stop`](Self::stop); both tolerate repeats in any order. Events are
/// dispatched on a background worker thread.
///
/// # Example
///
/// ```rust,ignore
/// let tracker = LocationTracker::builder()
///     .with_provider(network.clone())
///     .with_provider(satellite.clone())
///     .with_display(Arc::new(|text: &str| label.set_text(text)))
///     .build()?;
///
/// let report = tracker.on_foreground();
/// for failure in &report.failures {
///     eprintln!("{}", failure);
/// }
///
/// tracker.on_background();
/// ```
pub struct LocationTracker {
    manager: SubscriptionManager,
    router: EventRouter,
    events: Option<Arc<Mutex<mpsc::Receiver<RoutedEvent>>>>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LocationTracker {
    pub fn builder() -> TrackerBuilder {
        TrackerBuilder::new()
    }

    pub(crate) fn new(
        manager: SubscriptionManager,
        router: EventRouter,
        events: Option<Arc<Mutex<mpsc::Receiver<RoutedEvent>>>>,
        shutdown_tx: oneshot::Sender<()>,
        worker: JoinHandle<()>,
    ) -> Self {
        Self {
            manager,
            router,
            events,
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Host moved to the foreground: subscribe every provider
    pub fn on_foreground(&self) -> StartReport {
        tracing::debug!("Foreground transition");
        self.start()
    }

    /// Host moved to the background: release every provider
    pub fn on_background(&self) -> usize {
        tracing::debug!("Background transition");
        self.stop()
    }

    /// See [`SubscriptionManager::start`]
    pub fn start(&self) -> StartReport {
        let report = self.manager.start();
        if !report.is_complete() {
            tracing::warn!(
                "Started with {} failed provider(s): {:?}",
                report.failures.len(),
                report.failed_providers()
            );
        }
        report
    }

    /// See [`SubscriptionManager::stop`]
    pub fn stop(&self) -> usize {
        self.manager.stop()
    }

    pub fn state(&self, identity: ProviderIdentity) -> Option<SubscriptionState> {
        self.manager.state(identity)
    }

    pub fn snapshot(&self) -> BTreeMap<ProviderIdentity, SubscriptionState> {
        self.manager.snapshot()
    }

    pub fn is_subscribed(&self, identity: ProviderIdentity) -> bool {
        self.manager
            .state(identity)
            .map_or(false, |state| state.is_subscribed())
    }

    pub fn subscribed(&self) -> Vec<ProviderIdentity> {
        self.manager.subscribed()
    }

    /// Most recent fix delivered by `identity`
    pub fn last_known_position(&self, identity: ProviderIdentity) -> Option<PositionSample> {
        self.router.last_known(identity)
    }

    /// Most recent fix from any provider
    pub fn current_position(&self) -> Option<PositionSample> {
        self.router.latest()
    }

    /// Blocking iterator over delivered events
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::EventStreamDisabled` unless the tracker was
    /// built with `with_event_stream()`.
    pub fn iter(&self) -> Result<EventIterator> {
        self.events
            .as_ref()
            .map(|rx| EventIterator::new(Arc::clone(rx)))
            .ok_or(TrackerError::EventStreamDisabled)
    }

    /// Events dropped from the event stream because it was not drained
    pub fn dropped_stream_events(&self) -> u64 {
        self.router.stream_dropped()
    }

    /// Stop every provider and shut the dispatch worker down.
    ///
    /// Called automatically on drop. When called from a callback the worker
    /// is signalled but not joined; it exits after the current event.
    pub fn shutdown(&self) {
        self.manager.stop();

        if let Some(tx) = self.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }

        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        if worker.thread().id() == thread::current().id() {
            tracing::debug!("Shutdown requested from the dispatch worker, not joining");
            return;
        }
        if worker.join().is_err() {
            tracing::error!("Dispatch worker panicked");
        }
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        tracing::debug!(
            "LocationTracker dropping, {} active provider(s)",
            self.manager.subscribed().len()
        );
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::LocationCallbacks;
    use location_provider::{ProviderHandle, PushProvider, RawPosition};
    use std::time::{Duration, Instant};

    fn tracker() -> (LocationTracker, Arc<PushProvider>, Arc<PushProvider>) {
        let network = Arc::new(PushProvider::new(ProviderIdentity::NetworkBased));
        let satellite = Arc::new(PushProvider::new(ProviderIdentity::SatelliteBased));
        let tracker = LocationTracker::builder()
            .with_provider(network.clone())
            .with_provider(satellite.clone())
            .build()
            .unwrap();
        (tracker, network, satellite)
    }

    #[test]
    fn test_lifecycle_signals() {
        let (tracker, network, satellite) = tracker();
        assert!(tracker.subscribed().is_empty());

        let report = tracker.on_foreground();
        assert!(report.is_complete());
        assert!(tracker.is_subscribed(ProviderIdentity::NetworkBased));
        assert!(tracker.is_subscribed(ProviderIdentity::SatelliteBased));

        assert_eq!(tracker.on_background(), 2);
        assert!(!network.is_subscribed());
        assert!(!satellite.is_subscribed());
        assert_eq!(
            tracker.state(ProviderIdentity::NetworkBased),
            Some(SubscriptionState::Unsubscribed)
        );
    }

    #[test]
    fn test_iter_requires_event_stream() {
        let (tracker, _network, _satellite) = tracker();
        assert!(matches!(tracker.iter(), Err(TrackerError::EventStreamDisabled)));
    }

    #[test]
    fn test_shutdown_releases_providers() {
        let (tracker, network, _satellite) = tracker();
        tracker.on_foreground();

        tracker.shutdown();
        assert!(!network.is_subscribed());

        // Second shutdown (and the one in Drop) is a no-op
        tracker.shutdown();
    }

    #[test]
    fn test_unknown_identity_state() {
        let network = Arc::new(PushProvider::new(ProviderIdentity::NetworkBased));
        let tracker = LocationTracker::builder()
            .with_provider(network)
            .build()
            .unwrap();

        assert_eq!(tracker.state(ProviderIdentity::SatelliteBased), None);
        assert!(!tracker.is_subscribed(ProviderIdentity::SatelliteBased));
        assert_eq!(tracker.snapshot().len(), 1);
    }

    fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn test_callback_can_background_the_tracker() {
        let network = Arc::new(PushProvider::new(ProviderIdentity::NetworkBased));
        let slot: Arc<Mutex<Option<Arc<LocationTracker>>>> = Arc::new(Mutex::new(None));
        let disabled_seen = Arc::new(Mutex::new(false));

        let callback_slot = Arc::clone(&slot);
        let seen = Arc::clone(&disabled_seen);
        let tracker = Arc::new(
            LocationTracker::builder()
                .with_provider(network.clone())
                .with_callbacks(LocationCallbacks::new().on_provider_availability_changed(
                    move |_, enabled| {
                        if !enabled {
                            let tracker = callback_slot.lock().clone();
                            if let Some(tracker) = tracker {
                                tracker.on_background();
                            }
                            *seen.lock() = true;
                        }
                    },
                ))
                .build()
                .unwrap(),
        );
        *slot.lock() = Some(Arc::clone(&tracker));

        tracker.on_foreground();
        assert!(network.push_availability(false));
        assert!(wait_until(|| *disabled_seen.lock()));
        assert!(!network.is_subscribed());
        assert!(tracker.subscribed().is_empty());

        // The host can still drive the lifecycle from another thread
        let host = Arc::clone(&tracker);
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let report = host.on_foreground();
            let _ = done_tx.send(report.is_complete());
        });
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(3)), Ok(true));
        assert!(network.is_subscribed());

        // Events keep flowing after the re-entrant stop
        assert!(network.push_position(RawPosition::new(3.0, 4.0)));
        assert!(wait_until(|| tracker.current_position().is_some()));

        slot.lock().take();
    }

    #[test]
    fn test_shutdown_from_callback_does_not_hang() {
        let network = Arc::new(PushProvider::new(ProviderIdentity::NetworkBased));
        let slot: Arc<Mutex<Option<Arc<LocationTracker>>>> = Arc::new(Mutex::new(None));
        let shut_down = Arc::new(Mutex::new(false));

        let callback_slot = Arc::clone(&slot);
        let flag = Arc::clone(&shut_down);
        let tracker = Arc::new(
            LocationTracker::builder()
                .with_provider(network.clone())
                .with_callbacks(LocationCallbacks::new().on_provider_status_changed(
                    move |_, _| {
                        if let Some(tracker) = callback_slot.lock().take() {
                            tracker.shutdown();
                        }
                        *flag.lock() = true;
                    },
                ))
                .build()
                .unwrap(),
        );
        *slot.lock() = Some(Arc::clone(&tracker));

        tracker.on_foreground();
        assert!(network.push_status(2));
        assert!(wait_until(|| *shut_down.lock()));
        assert!(!network.is_subscribed());

        // Worker was detached, the shutdown in Drop returns immediately
        tracker.shutdown();
    }
}
