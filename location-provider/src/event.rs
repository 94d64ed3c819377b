//! Raw provider events and the sink providers emit them through.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use crate::types::{ProviderIdentity, RawPosition};

/// One unclassified event as a provider produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum RawProviderEvent {
    /// A new fix
    Position(RawPosition),
    /// The provider's status changed; `code` is the host platform value
    Status { code: i32 },
    /// The user enabled or disabled the provider
    Availability { enabled: bool },
}

/// A raw event tagged with where and when it came from.
///
/// `generation` identifies the subscription the event was emitted under, so
/// events queued by a subscription that has since been cancelled can be told
/// apart from live ones.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderEnvelope {
    pub identity: ProviderIdentity,
    pub generation: u64,
    pub received_at: DateTime<Utc>,
    pub event: RawProviderEvent,
}

/// Handle a subscribed provider uses to deliver events to the tracker.
///
/// All clones of a sink feed the same channel, so events emitted through one
/// sink are received in the order they were emitted.
#[derive(Debug, Clone)]
pub struct EventSink {
    identity: ProviderIdentity,
    generation: u64,
    sender: mpsc::UnboundedSender<ProviderEnvelope>,
}

impl EventSink {
    pub fn new(
        identity: ProviderIdentity,
        generation: u64,
        sender: mpsc::UnboundedSender<ProviderEnvelope>,
    ) -> Self {
        Self {
            identity,
            generation,
            sender,
        }
    }

    pub fn identity(&self) -> ProviderIdentity {
        self.identity
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Send an event to the tracker.
    ///
    /// Returns `false` once the tracker has shut down and nothing is
    /// listening any more.
    pub fn emit(&self, event: RawProviderEvent) -> bool {
        let envelope = ProviderEnvelope {
            identity: self.identity,
            generation: self.generation,
            received_at: Utc::now(),
            event,
        };
        self.sender.send(envelope).is_ok()
    }

    pub fn position(&self, position: RawPosition) -> bool {
        self.emit(RawProviderEvent::Position(position))
    }

    pub fn status(&self, code: i32) -> bool {
        self.emit(RawProviderEvent::Status { code })
    }

    pub fn availability(&self, enabled: bool) -> bool {
        self.emit(RawProviderEvent::Availability { enabled })
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}
