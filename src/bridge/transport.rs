//! The seam between the event bridge and whatever actually links windows.

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback invoked once per event delivered on a subscribed topic.
/// Delivery awaits the returned future before moving on.
pub type EventHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identifies one listener registration on a transport. Ids are assigned
/// by the bridge before the registration round trip starts, so a listener
/// can be unregistered even while its registration is still in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a registration could not be completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The other end is gone (window destroyed, channel closed).
    Closed,
    /// The transport refused the registration.
    Rejected(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Rejected(reason) => write!(f, "registration rejected: {}", reason),
        }
    }
}

impl std::error::Error for TransportError {}

/// Moves events between process contexts (windows).
///
/// Registration is a round trip: the returned future resolves once the
/// transport acknowledges the listener, and events published before that
/// may or may not reach it. Unregister and publish are fire-and-forget;
/// unknown listener ids and topics without listeners are silently ignored.
#[async_trait]
pub trait EventTransport: Send + Sync {
    async fn register(
        &self,
        topic: &str,
        id: ListenerId,
        handler: EventHandler,
    ) -> Result<(), TransportError>;

    fn unregister(&self, topic: &str, id: ListenerId);

    fn publish(&self, topic: &str, payload: Value);
}
