//! Pull-based access to routed events
//!
//! An alternative to callbacks: build the tracker with `with_event_stream()`
//! and read [`RoutedEvent`]s from any thread, optionally narrowed to a single
//! provider or to position fixes only.

use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use location_provider::{PositionSample, ProviderIdentity};
use parking_lot::Mutex;

use crate::router::RoutedEvent;

/// Reader over the tracker's event stream
///
/// All readers obtained from one tracker share a single queue, so each event
/// is handed to exactly one of them. A reader narrowed with
/// [`for_provider`](Self::for_provider) consumes and discards events from
/// other providers.
pub struct EventIterator {
    rx: Arc<Mutex<mpsc::Receiver<RoutedEvent>>>,
    provider: Option<ProviderIdentity>,
}

impl EventIterator {
    pub(crate) fn new(rx: Arc<Mutex<mpsc::Receiver<RoutedEvent>>>) -> Self {
        Self { rx, provider: None }
    }

    /// Only yield events that came from `identity`
    pub fn for_provider(self, identity: ProviderIdentity) -> Self {
        Self {
            provider: Some(identity),
            ..self
        }
    }

    /// Block until a matching event arrives
    ///
    /// Returns `None` once the tracker has shut down.
    pub fn recv(&self) -> Option<RoutedEvent> {
        let rx = self.rx.lock();
        rx.iter().find(|event| self.accepts(event))
    }

    /// Wait at most `timeout` in total for a matching event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<RoutedEvent> {
        self.recv_matching(timeout, Some)
    }

    /// Wait at most `timeout` for the next position fix, skipping status,
    /// availability and diagnostic events
    pub fn recv_position(&self, timeout: Duration) -> Option<PositionSample> {
        self.recv_matching(timeout, |event| match event {
            RoutedEvent::PositionChanged(sample) => Some(sample),
            _ => None,
        })
    }

    /// Matching events queued right now, without blocking
    pub fn drain(&self) -> Vec<RoutedEvent> {
        let rx = self.rx.lock();
        rx.try_iter().filter(|event| self.accepts(event)).collect()
    }

    /// Up to `count` matching events, in dispatch order, giving up once
    /// `timeout` has elapsed overall
    pub fn collect_within(&self, count: usize, timeout: Duration) -> Vec<RoutedEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::with_capacity(count);
        while events.len() < count {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.recv_timeout(remaining) {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    fn accepts(&self, event: &RoutedEvent) -> bool {
        self.provider.map_or(true, |identity| event.identity() == identity)
    }

    fn recv_matching<T>(
        &self,
        timeout: Duration,
        pick: impl Fn(RoutedEvent) -> Option<T>,
    ) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let rx = self.rx.lock();
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let event = rx.recv_timeout(remaining).ok()?;
            if self.accepts(&event) {
                if let Some(picked) = pick(event) {
                    return Some(picked);
                }
            }
        }
    }
}

impl Iterator for EventIterator {
    type Item = RoutedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}
