//! Ring buffer for debug messages coming from the control window.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One debug message, stamped when it arrived here.
#[derive(Debug, Clone)]
pub struct DebugRecord {
    pub received_at: DateTime<Local>,
    pub message: String,
}

/// Keeps the last N debug messages. Older records are evicted as new
/// ones arrive; every message is also written to the log.
pub struct DebugConsole {
    records: Mutex<VecDeque<DebugRecord>>,
    capacity: usize,
}

impl DebugConsole {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        let message = message.into();
        log::debug!("[control debug] {}", message);

        let mut records = self.records.lock().unwrap();
        while records.len() >= self.capacity {
            records.pop_front();
        }
        records.push_back(DebugRecord {
            received_at: Local::now(),
            message,
        });
    }

    /// Snapshot of the retained records, oldest first.
    pub fn records(&self) -> Vec<DebugRecord> {
        self.records.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().unwrap().is_empty()
    }
}
