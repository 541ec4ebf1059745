//! Cross-window event bridge.
//!
//! A typed publish/subscribe channel between process contexts that live
//! in different OS windows. One side subscribes to named topics with an
//! async handler, the other publishes JSON payloads fire-and-forget; the
//! [`EventTransport`] implementation decides how the two sides are
//! actually linked. [`LocalTransport`] links windows of the same process.
//!
//! Subscribing starts an asynchronous registration round trip. The
//! returned [`SubscriptionToken`] can cancel at any point of that round
//! trip without leaking a live listener; see the module docs of
//! [`subscription`] for how the race is resolved.

use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod local;
pub mod subscription;
pub mod transport;

pub use local::LocalTransport;
pub use subscription::{SubscriptionStatus, SubscriptionToken, SubscriptionWatch};
pub use transport::{EventHandler, EventTransport, ListenerId, TransportError};

/// Topics with a fixed meaning across the application's windows.
pub mod topics {
    /// Navigation requests from other windows. Payload: `{"path": "/…"}`.
    pub const NAVIGATE: &str = "navigate";
    /// Free-form debug messages from the control window. Payload: string.
    pub const DEBUG: &str = "debug";
    /// Text captured by the copy intercept. Payload: string.
    pub const CLIPBOARD_COPY: &str = "clipboard:copy";
}

/// Listener ids are allocated process-wide, not per-bridge: several
/// bridges (one per window) can wrap the same transport, and unregister
/// goes by `(topic, id)`, so colliding ids would let one window's
/// unsubscribe tear down another window's listener.
static NEXT_LISTENER: AtomicU64 = AtomicU64::new(1);

/// Pub/sub facade over a transport. Cheap to share behind an `Arc`.
pub struct EventBridge {
    transport: Arc<dyn EventTransport>,
}

impl EventBridge {
    pub fn new(transport: Arc<dyn EventTransport>) -> Self {
        Self { transport }
    }

    /// Subscribe with a raw JSON handler. Registration happens in the
    /// background; use the token to cancel or to await settling.
    /// Must be called from within a Tokio runtime.
    pub fn subscribe<F, Fut>(&self, topic: &str, handler: F) -> SubscriptionToken
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.subscribe_raw(topic, Arc::new(move |payload| handler(payload).boxed()))
    }

    /// Subscribe with a typed handler. Payloads that do not deserialize
    /// to `T` are dropped with a log record, the way a missed event is
    /// preferable to a crashed listener loop.
    pub fn subscribe_json<T, F, Fut>(&self, topic: &str, handler: F) -> SubscriptionToken
    where
        T: DeserializeOwned,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let topic_name = topic.to_string();
        self.subscribe_raw(
            topic,
            Arc::new(move |payload| match serde_json::from_value::<T>(payload) {
                Ok(typed) => handler(typed).boxed(),
                Err(error) => {
                    log::debug!("dropping malformed '{}' payload: {}", topic_name, error);
                    futures::future::ready(()).boxed()
                }
            }),
        )
    }

    pub fn subscribe_raw(&self, topic: &str, handler: EventHandler) -> SubscriptionToken {
        let id = ListenerId(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed));
        log::debug!("subscribing listener {} to '{}'", id, topic);
        SubscriptionToken::spawn(Arc::clone(&self.transport), topic.to_string(), id, handler)
    }

    /// Publish an event. Fire-and-forget: no delivery report, no error,
    /// a topic without listeners swallows the event.
    pub fn publish(&self, topic: &str, payload: Value) {
        self.transport.publish(topic, payload);
    }
}
