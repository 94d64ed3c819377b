//! Background worker thread for event dispatch
//!
//! Spawns a thread with its own tokio runtime that drains the provider
//! envelope channel and feeds each envelope to the [`EventRouter`], while the
//! parent [`LocationTracker`](crate::LocationTracker) keeps a sync API.

use std::thread::{self, JoinHandle};

use location_provider::ProviderEnvelope;
use tokio::sync::{mpsc, oneshot};

use crate::error::{Result, TrackerError};
use crate::router::{DispatchOutcome, EventRouter};

/// Spawns the dispatch worker thread
///
/// The worker runs until `shutdown_rx` fires, its sender is dropped, or every
/// envelope sender is gone.
pub fn spawn_dispatch_worker(
    router: EventRouter,
    envelope_rx: mpsc::UnboundedReceiver<ProviderEnvelope>,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("location-dispatch".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to create tokio runtime for dispatch worker: {}", e);
                    return;
                }
            };

            rt.block_on(run_dispatch_loop(router, envelope_rx, shutdown_rx));
        })
        .map_err(|e| TrackerError::WorkerSpawn(e.to_string()))
}

/// Main dispatch loop running inside the tokio runtime
async fn run_dispatch_loop(
    router: EventRouter,
    mut envelope_rx: mpsc::UnboundedReceiver<ProviderEnvelope>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    tracing::debug!("Dispatch worker started");
    let mut delivered: u64 = 0;
    let mut discarded: u64 = 0;

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown_rx => {
                tracing::debug!("Dispatch worker received shutdown");
                break;
            }

            envelope = envelope_rx.recv() => {
                match envelope {
                    Some(envelope) => match router.dispatch(envelope) {
                        DispatchOutcome::Delivered => delivered += 1,
                        DispatchOutcome::DiscardedInactive => discarded += 1,
                    },
                    None => {
                        tracing::debug!("All event senders dropped, stopping dispatch worker");
                        break;
                    }
                }
            }
        }
    }

    tracing::debug!(
        "Dispatch worker shut down ({} delivered, {} discarded)",
        delivered,
        discarded
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::LocationCallbacks;
    use crate::manager::SubscriptionManager;
    use chrono::Utc;
    use location_provider::{ProviderIdentity, RawProviderEvent};

    #[test]
    fn test_worker_stops_on_shutdown() {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = SubscriptionManager::new(tx.clone());
        let router = EventRouter::new(manager.shared_set(), LocationCallbacks::new(), None);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = spawn_dispatch_worker(router, rx, shutdown_rx).unwrap();

        // Unknown provider, discarded
        tx.send(ProviderEnvelope {
            identity: ProviderIdentity::NetworkBased,
            generation: 1,
            received_at: Utc::now(),
            event: RawProviderEvent::Status { code: 2 },
        })
        .unwrap();

        shutdown_tx.send(()).unwrap();
        handle.join().unwrap();
    }

    #[test]
    fn test_worker_stops_when_senders_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        let manager = SubscriptionManager::new(tx);
        let router = EventRouter::new(manager.shared_set(), LocationCallbacks::new(), None);
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = spawn_dispatch_worker(router, rx, shutdown_rx).unwrap();
        drop(manager);
        handle.join().unwrap();
    }
}
