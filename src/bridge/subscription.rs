//! Subscription lifecycle: pending registration, cancellation, settling.
//!
//! Registration is an async round trip, so a subscription can be
//! unsubscribed while its registration is still in flight. The token
//! resolves that race on the bridge side of the transport: delivery runs
//! through a status gate, and a registration that completes after
//! cancellation unregisters itself immediately. Unsubscribing never waits
//! and is idempotent.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use super::transport::{EventHandler, EventTransport, ListenerId, TransportError};

/// Where a subscription is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    /// Registration round trip still in flight.
    Pending,
    /// Registered and receiving events.
    Active,
    /// Unsubscribed. Terminal.
    Cancelled,
    /// Registration failed; the handler was never active. Terminal.
    Failed,
}

struct SubscriptionState {
    topic: String,
    id: ListenerId,
    status: Mutex<SubscriptionStatus>,
    settled_tx: watch::Sender<bool>,
}

impl SubscriptionState {
    fn status(&self) -> SubscriptionStatus {
        *self.status.lock().unwrap()
    }

    /// Applies the registration result. Called exactly once, by the
    /// driver task.
    fn resolve(&self, result: Result<(), TransportError>, transport: &dyn EventTransport) {
        enum Next {
            Keep,
            Orphaned,
            Failed(TransportError),
        }

        let next = {
            let mut status = self.status.lock().unwrap();
            match (*status, result) {
                (SubscriptionStatus::Pending, Ok(())) => {
                    *status = SubscriptionStatus::Active;
                    Next::Keep
                }
                (SubscriptionStatus::Pending, Err(error)) => {
                    *status = SubscriptionStatus::Failed;
                    Next::Failed(error)
                }
                // Cancelled while the ack was in flight: the transport
                // now holds a listener nobody wants, take it back out.
                (SubscriptionStatus::Cancelled, Ok(())) => Next::Orphaned,
                (SubscriptionStatus::Cancelled, Err(_)) => Next::Keep,
                (other, _) => {
                    log::error!(
                        "subscription {} on '{}' resolved twice (status {:?})",
                        self.id,
                        self.topic,
                        other
                    );
                    Next::Keep
                }
            }
        };

        match next {
            Next::Keep => {}
            Next::Orphaned => transport.unregister(&self.topic, self.id),
            Next::Failed(error) => {
                log::warn!("subscription to '{}' failed: {}", self.topic, error);
            }
        }

        self.settled_tx.send_replace(true);
    }
}

/// Handle to one listener registration.
///
/// Dropping the token unsubscribes, so a token parked in a disposer or a
/// struct field cannot leak a live listener.
pub struct SubscriptionToken {
    state: Arc<SubscriptionState>,
    transport: Arc<dyn EventTransport>,
    settled_rx: watch::Receiver<bool>,
}

impl SubscriptionToken {
    /// Starts the registration round trip on a background task and
    /// returns immediately.
    pub(crate) fn spawn(
        transport: Arc<dyn EventTransport>,
        topic: String,
        id: ListenerId,
        handler: EventHandler,
    ) -> Self {
        let (settled_tx, settled_rx) = watch::channel(false);
        let state = Arc::new(SubscriptionState {
            topic,
            id,
            status: Mutex::new(SubscriptionStatus::Pending),
            settled_tx,
        });

        // Delivery gate: the transport keeps calling the handler it was
        // given until unregistration lands, but a cancelled subscription
        // must deliver nothing from the instant unsubscribe returns.
        let gate = Arc::clone(&state);
        let gated: EventHandler = Arc::new(move |payload| {
            let open = matches!(
                gate.status(),
                SubscriptionStatus::Pending | SubscriptionStatus::Active
            );
            if open {
                handler(payload)
            } else {
                Box::pin(async {})
            }
        });

        let driver_state = Arc::clone(&state);
        let driver_transport = Arc::clone(&transport);
        tokio::spawn(async move {
            let result = driver_transport
                .register(&driver_state.topic, driver_state.id, gated)
                .await;
            driver_state.resolve(result, driver_transport.as_ref());
        });

        Self {
            state,
            transport,
            settled_rx,
        }
    }

    pub fn topic(&self) -> &str {
        &self.state.topic
    }

    pub fn id(&self) -> ListenerId {
        self.state.id
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.state.status()
    }

    /// Stop receiving events. Effective immediately, never blocks, safe
    /// to call any number of times and at any point of the registration
    /// round trip.
    pub fn unsubscribe(&self) {
        let was_active = {
            let mut status = self.state.status.lock().unwrap();
            match *status {
                SubscriptionStatus::Pending => {
                    // The driver task will unregister when the ack lands.
                    *status = SubscriptionStatus::Cancelled;
                    false
                }
                SubscriptionStatus::Active => {
                    *status = SubscriptionStatus::Cancelled;
                    true
                }
                SubscriptionStatus::Cancelled | SubscriptionStatus::Failed => false,
            }
        };

        if was_active {
            log::debug!(
                "unsubscribing listener {} from '{}'",
                self.state.id,
                self.state.topic
            );
            self.transport.unregister(&self.state.topic, self.state.id);
        }
    }

    /// Resolves once the registration round trip has finished, whatever
    /// the outcome, and returns the status at that point.
    pub async fn settled(&self) -> SubscriptionStatus {
        let mut rx = self.settled_rx.clone();
        let _ = rx.wait_for(|settled| *settled).await;
        self.state.status()
    }

    /// A clonable view of this subscription that survives the token
    /// moving into a disposer.
    pub fn watch(&self) -> SubscriptionWatch {
        SubscriptionWatch {
            state: Arc::clone(&self.state),
            settled_rx: self.settled_rx.clone(),
        }
    }
}

impl Drop for SubscriptionToken {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Read-only view of a subscription's lifecycle.
#[derive(Clone)]
pub struct SubscriptionWatch {
    state: Arc<SubscriptionState>,
    settled_rx: watch::Receiver<bool>,
}

impl SubscriptionWatch {
    pub fn status(&self) -> SubscriptionStatus {
        self.state.status()
    }

    pub async fn settled(&self) -> SubscriptionStatus {
        let mut rx = self.settled_rx.clone();
        let _ = rx.wait_for(|settled| *settled).await;
        self.state.status()
    }
}
