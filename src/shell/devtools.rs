//! Devtools visibility poll.
//!
//! The host exposes "is the devtools window open" as a plain flag with no
//! change notification, so the shell samples it on a fixed interval while
//! mounted and republishes changes on a watch channel. Debug builds only;
//! release builds keep the channel (always `false`) but never spawn the
//! poll.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::watch;

use crate::scope::Disposer;

/// Start polling `flag` every `interval`. Returns the receiver carrying
/// the observed value and the disposer that stops the poll.
pub fn spawn_poll(flag: Arc<AtomicBool>, interval: Duration) -> (watch::Receiver<bool>, Disposer) {
    // Interval timers panic on a zero period.
    let interval = interval.max(Duration::from_millis(1));
    let initial = flag.load(Ordering::Relaxed);
    let (tx, rx) = watch::channel(initial);

    if !cfg!(debug_assertions) {
        // Keep the sender alive until teardown so the receiver stays
        // usable, but never sample the flag.
        return (rx, Disposer::new("devtools-poll", move || drop(tx)));
    }

    log::debug!("devtools poll started ({}ms interval)", interval.as_millis());
    let poll = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let visible = flag.load(Ordering::Relaxed);
            let changed = tx.send_if_modified(|current| {
                if *current != visible {
                    *current = visible;
                    true
                } else {
                    false
                }
            });
            if changed {
                log::debug!("devtools visibility changed: {}", visible);
            }
        }
    });

    let disposer = Disposer::new("devtools-poll", move || poll.abort());
    (rx, disposer)
}
