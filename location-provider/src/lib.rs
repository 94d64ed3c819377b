//! # location-provider
//!
//! Position source abstraction for the `location-tracker` crate.
//!
//! A position source (network-based or satellite-based) is modelled as a
//! [`ProviderHandle`]: something that can be subscribed with a
//! [`SubscriptionConfig`] and then emits raw events through the [`EventSink`]
//! it was handed. The crate knows nothing about how events are routed or
//! displayed; it only defines the leaf capability and the value types that
//! flow out of it.

mod error;
mod event;
mod handle;
mod push;
mod types;

pub use error::*;
pub use event::*;
pub use handle::*;
pub use push::*;
pub use types::*;
