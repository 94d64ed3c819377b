//! Event classification and dispatch
//!
//! The [`EventRouter`] turns raw provider envelopes into [`RoutedEvent`]s and
//! hands them to the registered callbacks. Classification is a pure function
//! of the event kind; dispatch additionally checks that the envelope belongs
//! to a live subscription, before each callback and before publishing it to
//! the event stream.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, TrySendError};
use std::sync::Arc;

use location_provider::{
    MalformedEvent, PositionSample, ProviderEnvelope, ProviderIdentity, ProviderStatus,
    RawProviderEvent,
};
use parking_lot::RwLock;

use crate::callbacks::LocationCallbacks;
use crate::manager::SharedSubscriptionSet;

/// Log target for the per-event diagnostic side channel
pub const LOG_TARGET: &str = "LOCATION";

/// A classified provider event
#[derive(Debug, Clone, PartialEq)]
pub enum RoutedEvent {
    /// A validated position fix
    PositionChanged(PositionSample),

    /// A provider reported a status change
    StatusChanged {
        identity: ProviderIdentity,
        status: ProviderStatus,
    },

    /// A provider was enabled or disabled
    AvailabilityChanged {
        identity: ProviderIdentity,
        enabled: bool,
    },

    /// A provider event that could not be interpreted
    Diagnostic {
        identity: ProviderIdentity,
        error: MalformedEvent,
    },
}

impl RoutedEvent {
    /// The provider this event originated from
    pub fn identity(&self) -> ProviderIdentity {
        match self {
            RoutedEvent::PositionChanged(sample) => sample.source,
            RoutedEvent::StatusChanged { identity, .. }
            | RoutedEvent::AvailabilityChanged { identity, .. }
            | RoutedEvent::Diagnostic { identity, .. } => *identity,
        }
    }
}

/// What happened to a dispatched envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Callbacks were invoked
    Delivered,
    /// The envelope came from a stopped or replaced subscription
    DiscardedInactive,
}

/// Routes provider envelopes to callbacks
#[derive(Clone)]
pub struct EventRouter {
    active: SharedSubscriptionSet,
    callbacks: Arc<LocationCallbacks>,
    /// Most recent sample per source
    last_known: Arc<RwLock<BTreeMap<ProviderIdentity, PositionSample>>>,
    /// Optional bounded copy of every delivered event for `EventIterator`
    stream: Option<mpsc::SyncSender<RoutedEvent>>,
    /// Events dropped because the stream was full
    stream_dropped: Arc<AtomicU64>,
}

impl EventRouter {
    pub fn new(
        active: SharedSubscriptionSet,
        callbacks: LocationCallbacks,
        stream: Option<mpsc::SyncSender<RoutedEvent>>,
    ) -> Self {
        Self {
            active,
            callbacks: Arc::new(callbacks),
            last_known: Arc::new(RwLock::new(BTreeMap::new())),
            stream,
            stream_dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Classify a raw envelope. Never fails: payloads that do not validate
    /// become [`RoutedEvent::Diagnostic`].
    pub fn classify(envelope: ProviderEnvelope) -> RoutedEvent {
        let identity = envelope.identity;
        match envelope.event {
            RawProviderEvent::Position(raw) => {
                match PositionSample::from_raw(identity, raw, envelope.received_at) {
                    Ok(sample) => RoutedEvent::PositionChanged(sample),
                    Err(error) => RoutedEvent::Diagnostic { identity, error },
                }
            }
            RawProviderEvent::Status { code } => RoutedEvent::StatusChanged {
                identity,
                status: ProviderStatus::from_code(code),
            },
            RawProviderEvent::Availability { enabled } => {
                RoutedEvent::AvailabilityChanged { identity, enabled }
            }
        }
    }

    /// Dispatch one envelope.
    ///
    /// Holds the subscription set lock for the whole call, so a `stop()` on
    /// another thread either waits for this dispatch to finish or wins and
    /// causes the envelope to be discarded. A callback that calls `stop()`
    /// re-enters the lock on this thread; the remaining callbacks and the
    /// stream then see the subscription as gone and are skipped.
    pub fn dispatch(&self, envelope: ProviderEnvelope) -> DispatchOutcome {
        let active = self.active.lock();
        let (identity, generation) = (envelope.identity, envelope.generation);
        let is_live = || active.borrow().is_current(identity, generation);

        if !is_live() {
            tracing::trace!(
                target: LOG_TARGET,
                "Discarding event from inactive {} subscription (generation {})",
                envelope.identity,
                envelope.generation
            );
            return DispatchOutcome::DiscardedInactive;
        }

        let event = Self::classify(envelope);
        log_event(&event);

        if let RoutedEvent::PositionChanged(sample) = &event {
            self.last_known.write().insert(sample.source, *sample);
        }

        self.callbacks.deliver(&event, &is_live);

        if is_live() {
            self.publish(event);
        }

        drop(active);
        DispatchOutcome::Delivered
    }

    fn publish(&self, event: RoutedEvent) {
        let Some(stream) = &self.stream else {
            return;
        };
        match stream.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                let dropped = self.stream_dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 {
                    tracing::warn!("Event stream full, dropping events until it is drained");
                }
                tracing::debug!(
                    "Dropped event from {} ({} dropped so far)",
                    event.identity(),
                    dropped
                );
            }
            // Nobody reading the stream is fine
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Events the stream dropped because no consumer kept up
    pub fn stream_dropped(&self) -> u64 {
        self.stream_dropped.load(Ordering::Relaxed)
    }

    /// Most recent sample from `identity`
    pub fn last_known(&self, identity: ProviderIdentity) -> Option<PositionSample> {
        self.last_known.read().get(&identity).copied()
    }

    /// Most recent sample from any source. On equal timestamps the
    /// satellite-based fix wins.
    pub fn latest(&self) -> Option<PositionSample> {
        self.last_known
            .read()
            .values()
            .max_by_key(|sample| sample.timestamp)
            .copied()
    }
}

fn log_event(event: &RoutedEvent) {
    match event {
        RoutedEvent::PositionChanged(sample) => {
            tracing::trace!(
                target: LOG_TARGET,
                "Altitude {:?} Supported: {}",
                sample.altitude,
                sample.has_altitude()
            );
            tracing::trace!(
                target: LOG_TARGET,
                "Bearing {:?} Supported: {}",
                sample.bearing,
                sample.has_bearing()
            );
            tracing::trace!(
                target: LOG_TARGET,
                "onLocationChanged: lat={}, lon={} ({})",
                sample.latitude,
                sample.longitude,
                sample.source
            );
        }
        RoutedEvent::StatusChanged { identity, status } => {
            tracing::trace!(
                target: LOG_TARGET,
                "onStatusChanged: {} status: {:?}",
                identity,
                status
            );
            if status.is_known() {
                tracing::trace!(target: LOG_TARGET, "{}", status.description());
            } else {
                tracing::warn!(
                    target: LOG_TARGET,
                    "{} reported {}",
                    identity,
                    status.description()
                );
            }
        }
        RoutedEvent::AvailabilityChanged { identity, enabled } => {
            let hook = if *enabled {
                "onProviderEnabled"
            } else {
                "onProviderDisabled"
            };
            tracing::trace!(target: LOG_TARGET, "{}: {}", hook, identity);
        }
        RoutedEvent::Diagnostic { identity, error } => {
            tracing::warn!(
                target: LOG_TARGET,
                "Malformed event from {}: {}",
                identity,
                error
            );
        }
    }
}
