//! Callback contracts the tracker dispatches into
//!
//! Consumers do not implement a listener trait. They hand the tracker a set
//! of closures, one per event kind, plus an optional [`DisplaySink`] that
//! only ever receives the formatted current position.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use location_provider::{MalformedEvent, PositionSample, ProviderIdentity, ProviderStatus};

use crate::router::RoutedEvent;

type PositionCallback = Box<dyn Fn(&PositionSample) + Send + Sync>;
type StatusCallback = Box<dyn Fn(ProviderIdentity, ProviderStatus) + Send + Sync>;
type AvailabilityCallback = Box<dyn Fn(ProviderIdentity, bool) + Send + Sync>;
type DiagnosticCallback = Box<dyn Fn(ProviderIdentity, &MalformedEvent) + Send + Sync>;

/// Renders the current position, e.g. a label in a UI.
///
/// The text is `"<latitude> <longitude>"`; nothing is assumed about how it
/// is shown.
pub trait DisplaySink: Send + Sync {
    fn show_position(&self, text: &str);
}

impl<F> DisplaySink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn show_position(&self, text: &str) {
        self(text)
    }
}

/// Closures invoked for each dispatched event
///
/// Callbacks run on the dispatch worker thread while the subscription set is
/// locked. They may call the tracker's `start`/`stop`; once a callback stops
/// the tracker, no further callback sees the event being dispatched.
///
/// # Example
///
/// ```rust
/// use location_tracker::LocationCallbacks;
///
/// let callbacks = LocationCallbacks::new()
///     .on_position_changed(|sample| println!("{}", sample.display_text()))
///     .on_provider_status_changed(|provider, status| {
///         println!("{}: {}", provider, status.description())
///     });
/// ```
#[derive(Default)]
pub struct LocationCallbacks {
    position: Option<PositionCallback>,
    status: Option<StatusCallback>,
    availability: Option<AvailabilityCallback>,
    diagnostic: Option<DiagnosticCallback>,
    display: Option<Arc<dyn DisplaySink>>,
}

impl LocationCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once per accepted position fix
    pub fn on_position_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&PositionSample) + Send + Sync + 'static,
    {
        self.position = Some(Box::new(callback));
        self
    }

    pub fn on_provider_status_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProviderIdentity, ProviderStatus) + Send + Sync + 'static,
    {
        self.status = Some(Box::new(callback));
        self
    }

    pub fn on_provider_availability_changed<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProviderIdentity, bool) + Send + Sync + 'static,
    {
        self.availability = Some(Box::new(callback));
        self
    }

    /// Called for provider events whose payload failed validation
    pub fn on_diagnostic<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProviderIdentity, &MalformedEvent) + Send + Sync + 'static,
    {
        self.diagnostic = Some(Box::new(callback));
        self
    }

    pub fn with_display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    pub(crate) fn set_display(&mut self, display: Arc<dyn DisplaySink>) {
        self.display = Some(display);
    }

    /// Invoke the callbacks matching `event` while `is_live` holds.
    ///
    /// A panicking callback is logged and swallowed so one bad consumer
    /// cannot take down the dispatch worker.
    pub(crate) fn deliver(&self, event: &RoutedEvent, is_live: &dyn Fn() -> bool) {
        match event {
            RoutedEvent::PositionChanged(sample) => {
                if let Some(callback) = &self.position {
                    guarded("on_position_changed", is_live, || callback(sample));
                }
                if let Some(display) = &self.display {
                    let text = sample.display_text();
                    guarded("display sink", is_live, || display.show_position(&text));
                }
            }
            RoutedEvent::StatusChanged { identity, status } => {
                if let Some(callback) = &self.status {
                    guarded("on_provider_status_changed", is_live, || {
                        callback(*identity, *status)
                    });
                }
            }
            RoutedEvent::AvailabilityChanged { identity, enabled } => {
                if let Some(callback) = &self.availability {
                    guarded("on_provider_availability_changed", is_live, || {
                        callback(*identity, *enabled)
                    });
                }
            }
            RoutedEvent::Diagnostic { identity, error } => {
                if let Some(callback) = &self.diagnostic {
                    guarded("on_diagnostic", is_live, || callback(*identity, error));
                }
            }
        }
    }
}

fn guarded(name: &str, is_live: &dyn Fn() -> bool, f: impl FnOnce()) {
    if !is_live() {
        tracing::trace!("Subscription stopped mid-dispatch, skipping {}", name);
        return;
    }
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!("Callback {} panicked; event dropped for this consumer", name);
    }
}
