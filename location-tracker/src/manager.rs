//! Subscription lifecycle management
//!
//! The [`SubscriptionManager`] is the single source of truth for which
//! providers are active. It owns the [`ActiveSubscriptionSet`] behind one
//! lock that the event router also takes, so a `start`, a `stop` and an
//! in-flight dispatch from different threads never interleave. The lock is
//! reentrant: a callback running on the dispatch thread may call `start` or
//! `stop` without deadlocking.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::sync::Arc;

use location_provider::{
    EventSink, ProviderEnvelope, ProviderError, ProviderHandle, ProviderIdentity,
    SubscriptionConfig,
};
use parking_lot::ReentrantMutex;
use tokio::sync::mpsc;

use crate::error::{Result, TrackerError};

/// Where a single provider stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Handle released, no events flowing
    Unsubscribed,
    /// Handle live; only events tagged with `generation` are dispatched
    Subscribed { generation: u64 },
    /// The last subscribe attempt failed; retried on the next start
    Failed { reason: String },
}

impl SubscriptionState {
    pub fn is_subscribed(&self) -> bool {
        matches!(self, SubscriptionState::Subscribed { .. })
    }
}

struct ProviderEntry {
    handle: Arc<dyn ProviderHandle>,
    config: SubscriptionConfig,
    state: SubscriptionState,
}

/// Per-provider subscription state plus the handle it refers to
#[derive(Default)]
pub struct ActiveSubscriptionSet {
    entries: BTreeMap<ProviderIdentity, ProviderEntry>,
    /// Last generation handed out; 0 is never current
    last_generation: u64,
}

impl ActiveSubscriptionSet {
    pub fn state(&self, identity: ProviderIdentity) -> Option<&SubscriptionState> {
        self.entries.get(&identity).map(|entry| &entry.state)
    }

    /// Whether events from `identity` tagged with `generation` belong to the
    /// live subscription
    pub fn is_current(&self, identity: ProviderIdentity, generation: u64) -> bool {
        matches!(
            self.state(identity),
            Some(SubscriptionState::Subscribed { generation: live }) if *live == generation
        )
    }

    /// Providers currently subscribed, in identity order
    pub fn subscribed(&self) -> Vec<ProviderIdentity> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.state.is_subscribed())
            .map(|(identity, _)| *identity)
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<ProviderIdentity, SubscriptionState> {
        self.entries
            .iter()
            .map(|(identity, entry)| (*identity, entry.state.clone()))
            .collect()
    }

    pub fn identities(&self) -> Vec<ProviderIdentity> {
        self.entries.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The subscription set as shared between the manager and the router
///
/// Never hold a `RefCell` borrow across a callback or a provider call.
pub type SharedSubscriptionSet = Arc<ReentrantMutex<RefCell<ActiveSubscriptionSet>>>;

/// Outcome of [`SubscriptionManager::start`]
#[derive(Debug, Default)]
pub struct StartReport {
    /// Providers subscribed by this call
    pub subscribed: Vec<ProviderIdentity>,
    /// Providers that were already subscribed and left untouched
    pub already_active: Vec<ProviderIdentity>,
    /// Providers whose subscribe failed; the others are unaffected
    pub failures: Vec<ProviderError>,
}

impl StartReport {
    /// No provider failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Some providers failed while at least one is active
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
            && (!self.subscribed.is_empty() || !self.already_active.is_empty())
    }

    pub fn failed_providers(&self) -> Vec<ProviderIdentity> {
        self.failures.iter().map(ProviderError::identity).collect()
    }

    /// Every provider that is active after the call
    pub fn active(&self) -> Vec<ProviderIdentity> {
        let mut active: Vec<_> = self
            .subscribed
            .iter()
            .chain(self.already_active.iter())
            .copied()
            .collect();
        active.sort();
        active
    }
}

/// Starts and stops providers in step with foreground/background transitions
pub struct SubscriptionManager {
    set: SharedSubscriptionSet,
    event_tx: mpsc::UnboundedSender<ProviderEnvelope>,
}

impl SubscriptionManager {
    /// Create a manager whose providers emit into `event_tx`
    pub fn new(event_tx: mpsc::UnboundedSender<ProviderEnvelope>) -> Self {
        Self {
            set: Arc::new(ReentrantMutex::new(RefCell::new(ActiveSubscriptionSet::default()))),
            event_tx,
        }
    }

    /// Add a provider with its config. Providers start out unsubscribed.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::DuplicateProvider` if a provider with the same
    /// identity is already registered, or `TrackerError::Config` if `config`
    /// is invalid.
    pub fn register(
        &self,
        handle: Arc<dyn ProviderHandle>,
        config: SubscriptionConfig,
    ) -> Result<()> {
        config.validate()?;

        let identity = handle.identity();
        let guard = self.set.lock();
        let mut set = guard.borrow_mut();
        if set.entries.contains_key(&identity) {
            return Err(TrackerError::DuplicateProvider(identity));
        }

        tracing::debug!(
            "Registered {} provider (interval {:?}, displacement {} m)",
            identity,
            config.min_interval,
            config.min_displacement_m
        );

        set.entries.insert(
            identity,
            ProviderEntry {
                handle,
                config,
                state: SubscriptionState::Unsubscribed,
            },
        );
        Ok(())
    }

    /// Subscribe every registered provider that is not already live.
    ///
    /// Safe to call repeatedly: live providers are left alone so no second
    /// delivery stream is ever opened. A provider that fails is recorded as
    /// [`SubscriptionState::Failed`] and reported; it never blocks the
    /// others.
    pub fn start(&self) -> StartReport {
        let guard = self.set.lock();
        let mut set = guard.borrow_mut();
        let set = &mut *set;
        let mut report = StartReport::default();

        for (identity, entry) in set.entries.iter_mut() {
            if entry.state.is_subscribed() {
                if entry.handle.is_subscribed() {
                    tracing::debug!("{} provider already subscribed, skipping", identity);
                    report.already_active.push(*identity);
                    continue;
                }
                tracing::warn!(
                    "{} provider dropped its subscription behind our back, resubscribing",
                    identity
                );
            }

            set.last_generation += 1;
            let generation = set.last_generation;
            let sink = EventSink::new(*identity, generation, self.event_tx.clone());

            match entry.handle.subscribe(&entry.config, sink) {
                Ok(()) => {
                    tracing::debug!("Subscribed {} provider (generation {})", identity, generation);
                    entry.state = SubscriptionState::Subscribed { generation };
                    report.subscribed.push(*identity);
                }
                Err(error) => {
                    tracing::warn!("Failed to subscribe {} provider: {}", identity, error);
                    entry.state = SubscriptionState::Failed {
                        reason: error.to_string(),
                    };
                    report.failures.push(error);
                }
            }
        }

        report
    }

    /// Unsubscribe every provider. Idempotent.
    ///
    /// Once this returns no further event is dispatched for the stopped
    /// subscriptions, even if a provider had already queued one.
    ///
    /// Returns the number of providers that were live and got released.
    pub fn stop(&self) -> usize {
        let guard = self.set.lock();
        let mut set = guard.borrow_mut();
        let mut released = 0;

        for (identity, entry) in set.entries.iter_mut() {
            if entry.state.is_subscribed() {
                entry.handle.unsubscribe();
                released += 1;
                tracing::debug!("Unsubscribed {} provider", identity);
            }
            entry.state = SubscriptionState::Unsubscribed;
        }

        released
    }

    pub fn state(&self, identity: ProviderIdentity) -> Option<SubscriptionState> {
        self.set.lock().borrow().state(identity).cloned()
    }

    pub fn snapshot(&self) -> BTreeMap<ProviderIdentity, SubscriptionState> {
        self.set.lock().borrow().snapshot()
    }

    pub fn subscribed(&self) -> Vec<ProviderIdentity> {
        self.set.lock().borrow().subscribed()
    }

    pub fn provider_count(&self) -> usize {
        self.set.lock().borrow().len()
    }

    /// The set shared with the event router
    pub(crate) fn shared_set(&self) -> SharedSubscriptionSet {
        Arc::clone(&self.set)
    }
}
