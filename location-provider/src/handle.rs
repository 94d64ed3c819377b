//! The `ProviderHandle` trait implemented by every position source.

use crate::error::ProviderError;
use crate::event::EventSink;
use crate::types::{ProviderIdentity, SubscriptionConfig};

/// Capability representing one position source.
///
/// Implementations wrap whatever the host platform offers (a system location
/// service, a serial GPS receiver, a replay file) and forward its callbacks
/// through the [`EventSink`] handed to them on subscribe.
///
/// # Contract
///
/// - `subscribe` returns immediately; fixes arrive later through the sink.
/// - Subscribing while already subscribed replaces the config and the sink.
///   The previous sink must be dropped so there is never more than one live
///   delivery stream per provider.
/// - `unsubscribe` stops delivery and releases held resources. Calling it
///   while not subscribed does nothing.
///
/// # Thread Safety
///
/// Methods take `&self`; implementations use interior mutability so the
/// tracker can share handles across its lifecycle and dispatch threads.
pub trait ProviderHandle: Send + Sync {
    /// Which source this handle represents.
    fn identity(&self) -> ProviderIdentity;

    /// Begin delivering events through `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] if the source cannot be reached
    /// at all, for example because the user denied location permission.
    fn subscribe(&self, config: &SubscriptionConfig, sink: EventSink) -> Result<(), ProviderError>;

    /// Stop delivering events. Idempotent.
    fn unsubscribe(&self);

    /// Whether a subscription is currently live.
    fn is_subscribed(&self) -> bool;
}
