//! In-process transport linking the windows of a single process.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};

use super::transport::{EventHandler, EventTransport, ListenerId, TransportError};

enum Op {
    Register {
        topic: String,
        id: ListenerId,
        handler: EventHandler,
        ack: oneshot::Sender<Result<(), TransportError>>,
    },
    Unregister {
        topic: String,
        id: ListenerId,
    },
    Publish {
        topic: String,
        payload: Value,
    },
    Flush {
        ack: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Transport backed by a single dispatcher task.
///
/// All operations go through one FIFO queue, which gives two useful
/// guarantees: events on a topic are delivered to a listener in publish
/// order, and an unregister enqueued before a publish wins against it.
/// Handlers are awaited inside the dispatcher, so [`flush`] is a full
/// happens-after barrier for everything published before it.
///
/// Cloning yields another handle to the same dispatcher.
///
/// [`flush`]: LocalTransport::flush
#[derive(Clone)]
pub struct LocalTransport {
    ops: mpsc::UnboundedSender<Op>,
}

impl LocalTransport {
    /// Spawns the dispatcher task. Must be called from within a Tokio
    /// runtime.
    pub fn new() -> Self {
        let (ops, rx) = mpsc::unbounded_channel();
        tokio::spawn(dispatch(rx));
        Self { ops }
    }

    /// Resolves once every operation enqueued before this call has been
    /// processed, including the handler futures of published events.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.ops.send(Op::Flush { ack }).is_ok() {
            let _ = done.await;
        }
    }

    /// Stop the dispatcher. Registrations still in flight and everything
    /// sent afterwards fail with [`TransportError::Closed`].
    pub fn shutdown(&self) {
        let _ = self.ops.send(Op::Shutdown);
    }
}

impl Default for LocalTransport {
    fn default() -> Self {
        Self::new()
    }
}

async fn dispatch(mut rx: mpsc::UnboundedReceiver<Op>) {
    let mut listeners: HashMap<String, Vec<(ListenerId, EventHandler)>> = HashMap::new();

    while let Some(op) = rx.recv().await {
        match op {
            Op::Register { topic, id, handler, ack } => {
                log::debug!("local transport: listener {} registered on '{}'", id, topic);
                listeners.entry(topic).or_default().push((id, handler));
                let _ = ack.send(Ok(()));
            }
            Op::Unregister { topic, id } => {
                if let Some(entries) = listeners.get_mut(&topic) {
                    entries.retain(|(listener, _)| *listener != id);
                    if entries.is_empty() {
                        listeners.remove(&topic);
                    }
                    log::debug!("local transport: listener {} removed from '{}'", id, topic);
                }
            }
            Op::Publish { topic, payload } => {
                match listeners.get(&topic) {
                    Some(entries) => {
                        for (_, handler) in entries {
                            handler(payload.clone()).await;
                        }
                    }
                    None => {
                        log::trace!("local transport: no listeners on '{}'", topic);
                    }
                }
            }
            Op::Flush { ack } => {
                let _ = ack.send(());
            }
            Op::Shutdown => {
                log::debug!("local transport: shutting down");
                break;
            }
        }
    }
    // Dropping the receiver closes the channel, so pending register acks
    // resolve as Closed on the caller side.
}

#[async_trait]
impl EventTransport for LocalTransport {
    async fn register(
        &self,
        topic: &str,
        id: ListenerId,
        handler: EventHandler,
    ) -> Result<(), TransportError> {
        let (ack, registered) = oneshot::channel();
        self.ops
            .send(Op::Register {
                topic: topic.to_string(),
                id,
                handler,
                ack,
            })
            .map_err(|_| TransportError::Closed)?;
        registered.await.map_err(|_| TransportError::Closed)?
    }

    fn unregister(&self, topic: &str, id: ListenerId) {
        let _ = self.ops.send(Op::Unregister {
            topic: topic.to_string(),
            id,
        });
    }

    fn publish(&self, topic: &str, payload: Value) {
        let _ = self.ops.send(Op::Publish {
            topic: topic.to_string(),
            payload,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn counting_handler() -> (Arc<AtomicUsize>, EventHandler) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = count.clone();
        let handler: EventHandler = Arc::new(move |_| {
            let clone = clone.clone();
            Box::pin(async move {
                clone.fetch_add(1, Ordering::SeqCst);
            })
        });
        (count, handler)
    }

    #[tokio::test]
    async fn test_register_then_publish_delivers() {
        let transport = LocalTransport::new();
        let (count, handler) = counting_handler();

        transport
            .register("greetings", ListenerId(1), handler)
            .await
            .unwrap();
        transport.publish("greetings", json!({"hello": true}));
        transport.flush().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_publish_without_listeners_is_noop() {
        let transport = LocalTransport::new();
        let (count, handler) = counting_handler();
        transport
            .register("watched", ListenerId(1), handler)
            .await
            .unwrap();

        transport.publish("unwatched", json!(1));
        transport.publish("unwatched", json!(2));
        transport.flush().await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unregister_stops_delivery() {
        let transport = LocalTransport::new();
        let (count, handler) = counting_handler();
        transport
            .register("topic", ListenerId(7), handler)
            .await
            .unwrap();

        transport.publish("topic", json!(1));
        transport.unregister("topic", ListenerId(7));
        transport.publish("topic", json!(2));
        transport.flush().await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unregister_unknown_id_is_ignored() {
        let transport = LocalTransport::new();
        transport.unregister("topic", ListenerId(42));
        transport.flush().await;
    }

    #[tokio::test]
    async fn test_delivery_preserves_publish_order() {
        let transport = LocalTransport::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handler: EventHandler = Arc::new(move |value| {
            let sink = sink.clone();
            Box::pin(async move {
                sink.lock().unwrap().push(value);
            })
        });
        transport.register("ordered", ListenerId(1), handler).await.unwrap();

        for i in 0..50 {
            transport.publish("ordered", json!(i));
        }
        transport.flush().await;

        let seen = seen.lock().unwrap();
        let expected: Vec<Value> = (0..50).map(|i| json!(i)).collect();
        assert_eq!(*seen, expected);
    }

    #[tokio::test]
    async fn test_fan_out_reaches_every_listener() {
        let transport = LocalTransport::new();
        let (a, handler_a) = counting_handler();
        let (b, handler_b) = counting_handler();
        transport.register("topic", ListenerId(1), handler_a).await.unwrap();
        transport.register("topic", ListenerId(2), handler_b).await.unwrap();

        transport.publish("topic", json!("x"));
        transport.flush().await;

        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_register_after_shutdown_fails_closed() {
        let transport = LocalTransport::new();
        transport.shutdown();

        // The shutdown op is ahead of the register in the queue, so the
        // register ack is dropped unresolved and the round trip fails.
        let (count, handler) = counting_handler();
        let result = transport.register("topic", ListenerId(1), handler).await;
        assert_eq!(result.unwrap_err(), TransportError::Closed);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_flush_after_shutdown_does_not_hang() {
        let transport = LocalTransport::new();
        transport.shutdown();
        transport.flush().await;
        transport.flush().await;
    }
}
