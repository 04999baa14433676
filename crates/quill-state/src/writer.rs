//! Background cache writer
//!
//! A single spawned task applies durable cache writes in submission order.
//! Callers never wait on storage; failures are logged and dropped.

use crate::cache::DurableCache;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
enum Command {
    Store(Value),
    Flush(oneshot::Sender<()>),
}

/// Handle to the background writer task
///
/// The task stops once every handle is dropped and the queue is drained.
#[derive(Debug, Clone)]
pub struct CacheWriter {
    slot: Arc<str>,
    sender: mpsc::UnboundedSender<Command>,
}

impl CacheWriter {
    /// Spawn the writer task on the current tokio runtime
    #[must_use]
    pub fn spawn(cache: Arc<dyn DurableCache>, slot: impl Into<Arc<str>>) -> Self {
        let slot: Arc<str> = slot.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Command>();

        let task_slot = Arc::clone(&slot);
        tokio::spawn(async move {
            let mut written = 0_u64;
            while let Some(command) = receiver.recv().await {
                match command {
                    Command::Store(value) => match cache.store(&task_slot, value).await {
                        Ok(()) => written += 1,
                        Err(e) => {
                            tracing::warn!(slot = %task_slot, error = %e, "durable cache write failed");
                        }
                    },
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!(slot = %task_slot, written, "cache writer stopped");
        });

        Self { slot, sender }
    }

    /// Slot this writer targets
    #[inline]
    #[must_use]
    pub fn slot(&self) -> &str {
        &self.slot
    }

    /// Queue a write (fire-and-forget)
    pub fn persist(&self, value: Value) {
        if self.sender.send(Command::Store(value)).is_err() {
            tracing::warn!(slot = %self.slot, "cache writer gone, dropping write");
        }
    }

    /// Wait until every previously queued write has been applied
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
