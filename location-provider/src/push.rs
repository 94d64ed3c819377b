//! Push-driven provider for host integration layers.
//!
//! A host that already receives platform location callbacks (a mobile shell,
//! a D-Bus listener, a GPS daemon client) owns a [`PushProvider`] per source
//! and forwards each callback into it. The provider only delivers while the
//! tracker holds it subscribed.

use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::error::ProviderError;
use crate::event::EventSink;
use crate::handle::ProviderHandle;
use crate::types::{ProviderIdentity, RawPosition, SubscriptionConfig};

#[derive(Default)]
struct PushState {
    sink: Option<EventSink>,
    config: Option<SubscriptionConfig>,
    denied: Option<String>,
}

/// A [`ProviderHandle`] whose events are pushed in by the host.
pub struct PushProvider {
    identity: ProviderIdentity,
    state: Mutex<PushState>,
    subscribe_count: AtomicU32,
}

impl PushProvider {
    pub fn new(identity: ProviderIdentity) -> Self {
        Self {
            identity,
            state: Mutex::new(PushState::default()),
            subscribe_count: AtomicU32::new(0),
        }
    }

    /// Make subsequent subscribe calls fail, e.g. after the user revoked
    /// location permission. A live subscription is not affected.
    pub fn deny(&self, reason: impl Into<String>) {
        self.state.lock().denied = Some(reason.into());
    }

    /// Allow subscribing again after [`PushProvider::deny`].
    pub fn allow(&self) {
        self.state.lock().denied = None;
    }

    /// Config of the live subscription, if any.
    pub fn current_config(&self) -> Option<SubscriptionConfig> {
        self.state.lock().config
    }

    /// Number of successful subscribe calls so far.
    pub fn subscribe_count(&self) -> u32 {
        self.subscribe_count.load(Ordering::Relaxed)
    }

    pub fn push_position(&self, position: RawPosition) -> bool {
        self.with_sink(|sink| sink.position(position))
    }

    pub fn push_status(&self, code: i32) -> bool {
        self.with_sink(|sink| sink.status(code))
    }

    pub fn push_availability(&self, enabled: bool) -> bool {
        self.with_sink(|sink| sink.availability(enabled))
    }

    fn with_sink(&self, send: impl FnOnce(&EventSink) -> bool) -> bool {
        let state = self.state.lock();
        match state.sink.as_ref() {
            Some(sink) => send(sink),
            None => {
                tracing::trace!("{} provider not subscribed, dropping pushed event", self.identity);
                false
            }
        }
    }
}

impl ProviderHandle for PushProvider {
    fn identity(&self) -> ProviderIdentity {
        self.identity
    }

    fn subscribe(&self, config: &SubscriptionConfig, sink: EventSink) -> Result<(), ProviderError> {
        let mut state = self.state.lock();

        if let Some(reason) = state.denied.as_ref() {
            return Err(ProviderError::unavailable(self.identity, reason.clone()));
        }

        if state.sink.is_some() {
            tracing::debug!(
                "{} provider already subscribed, replacing config and sink",
                self.identity
            );
        }

        state.sink = Some(sink);
        state.config = Some(*config);
        self.subscribe_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn unsubscribe(&self) {
        let mut state = self.state.lock();
        state.sink = None;
        state.config = None;
    }

    fn is_subscribed(&self) -> bool {
        self.state.lock().sink.is_some()
    }
}
