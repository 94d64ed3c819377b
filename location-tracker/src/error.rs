use location_provider::{ConfigError, ProviderIdentity};
use thiserror::Error;

/// Errors that can occur while building or driving a location tracker
#[derive(Error, Debug)]
pub enum TrackerError {
    /// A provider with the same identity was already registered
    #[error("Provider {0} is already registered")]
    DuplicateProvider(ProviderIdentity),

    /// The tracker was built without any provider
    #[error("At least one provider must be registered")]
    NoProviders,

    /// Invalid subscription configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The dispatch worker thread could not be started
    #[error("Failed to spawn dispatch worker: {0}")]
    WorkerSpawn(String),

    /// `iter()` was called on a tracker built without an event stream
    #[error("Event stream not enabled; build the tracker with `with_event_stream()`")]
    EventStreamDisabled,
}

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;
