//! External clipboard integration, reduced to the single call the shell
//! needs: replacing the system clipboard contents with intercepted text.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ClipboardService: Send + Sync {
    async fn write_text(&self, text: String) -> Result<()>;
}

/// Clipboard that only records to the log. Stands in where no OS
/// clipboard is wired up, e.g. headless runs.
pub struct LogClipboard;

#[async_trait]
impl ClipboardService for LogClipboard {
    async fn write_text(&self, text: String) -> Result<()> {
        log::info!("clipboard <- {:?}", text);
        Ok(())
    }
}
