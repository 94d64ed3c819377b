//! Mock provider implementation for testing.
//!
//! `MockProvider` implements `ProviderHandle` without any platform backing.
//! It supports failure injection, counts lifecycle calls, and keeps every
//! sink it was ever handed so tests can play a misbehaving provider that
//! keeps emitting after it was unsubscribed.

#![allow(dead_code)]

use location_provider::{
    EventSink, ProviderError, ProviderHandle, ProviderIdentity, RawPosition, SubscriptionConfig,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

pub struct MockProvider {
    identity: ProviderIdentity,
    should_fail: AtomicBool,
    subscribe_count: AtomicU32,
    unsubscribe_count: AtomicU32,
    resubscribe_count: AtomicU32,
    live: Mutex<Option<EventSink>>,
    config: Mutex<Option<SubscriptionConfig>>,
    history: Mutex<Vec<EventSink>>,
}

impl MockProvider {
    pub fn new(identity: ProviderIdentity) -> Arc<Self> {
        Arc::new(Self {
            identity,
            should_fail: AtomicBool::new(false),
            subscribe_count: AtomicU32::new(0),
            unsubscribe_count: AtomicU32::new(0),
            resubscribe_count: AtomicU32::new(0),
            live: Mutex::new(None),
            config: Mutex::new(None),
            history: Mutex::new(Vec::new()),
        })
    }

    /// Make subscribe fail with `ProviderError::Unavailable`.
    pub fn set_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    pub fn subscribe_count(&self) -> u32 {
        self.subscribe_count.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_count(&self) -> u32 {
        self.unsubscribe_count.load(Ordering::SeqCst)
    }

    /// Subscribe calls that arrived while a subscription was already live.
    pub fn resubscribe_count(&self) -> u32 {
        self.resubscribe_count.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> Option<SubscriptionConfig> {
        *self.config.lock()
    }

    /// Sink handed out by the `index`-th successful subscribe.
    pub fn sink(&self, index: usize) -> Option<EventSink> {
        self.history.lock().get(index).cloned()
    }

    pub fn live_sink(&self) -> Option<EventSink> {
        self.live.lock().clone()
    }

    pub fn emit_position(&self, latitude: f64, longitude: f64) -> bool {
        self.live_sink()
            .map_or(false, |sink| sink.position(RawPosition::new(latitude, longitude)))
    }

    pub fn emit_raw_position(&self, position: RawPosition) -> bool {
        self.live_sink().map_or(false, |sink| sink.position(position))
    }

    pub fn emit_status(&self, code: i32) -> bool {
        self.live_sink().map_or(false, |sink| sink.status(code))
    }

    pub fn emit_availability(&self, enabled: bool) -> bool {
        self.live_sink().map_or(false, |sink| sink.availability(enabled))
    }
}

impl ProviderHandle for MockProvider {
    fn identity(&self) -> ProviderIdentity {
        self.identity
    }

    fn subscribe(&self, config: &SubscriptionConfig, sink: EventSink) -> Result<(), ProviderError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(ProviderError::unavailable(
                self.identity,
                "Mock failure: permission denied",
            ));
        }

        let mut live = self.live.lock();
        if live.is_some() {
            self.resubscribe_count.fetch_add(1, Ordering::SeqCst);
        }
        self.history.lock().push(sink.clone());
        *live = Some(sink);
        *self.config.lock() = Some(*config);
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn unsubscribe(&self) {
        self.unsubscribe_count.fetch_add(1, Ordering::SeqCst);
        *self.live.lock() = None;
        *self.config.lock() = None;
    }

    fn is_subscribed(&self) -> bool {
        self.live.lock().is_some()
    }
}
