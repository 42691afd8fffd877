//! BatchIndexer: buffers nodes and hands them to a [`NodeIndexer`] in batches.
//!
//! A batch is flushed when the buffer reaches `batch_size`, when
//! `flush_interval_ms` has passed since the previous flush, or on
//! [`BatchIndexer::shutdown`]. Draining happens under the buffer lock, so
//! every accepted node is flushed at most once.
//!
//! The first node that fails stops its flush. The error reaches the caller
//! and the nodes after it go back to the front of the buffer. A failure
//! inside a timed flush is held until the next `add`, `flush`, or
//! `shutdown`, which returns it.

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::Duration;

use recall_core::config::IndexerConfig;
use recall_core::errors::{IndexingError, RecallError, RecallResult};
use recall_core::models::IndexableNode;
use recall_observability::tracing_setup::events;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{IndexOutcome, NodeIndexer};

/// Why a batch was flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushTrigger {
    Size,
    Interval,
    Manual,
    Shutdown,
}

/// A flush in which every node was indexed or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushReport {
    pub trigger: FlushTrigger,
    pub size: usize,
    pub indexed: usize,
    pub skipped: usize,
}

impl FlushReport {
    fn empty(trigger: FlushTrigger) -> Self {
        Self {
            trigger,
            size: 0,
            indexed: 0,
            skipped: 0,
        }
    }
}

/// Running totals. `flushes` counts non-empty flushes that completed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub flushes: u64,
    pub indexed: u64,
    pub skipped: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Buffer {
    items: Vec<IndexableNode>,
    shut_down: bool,
}

struct Shared {
    indexer: Arc<dyn NodeIndexer>,
    batch_size: usize,
    flush_interval: Duration,
    buffer: Mutex<Buffer>,
    last_flush: StdMutex<Instant>,
    stats: StdMutex<BatchStats>,
    /// First failure of a timed flush, not yet seen by a caller.
    timer_failure: StdMutex<Option<IndexingError>>,
    shutdown: Notify,
}

pub struct BatchIndexer {
    shared: Arc<Shared>,
    timer: StdMutex<Option<JoinHandle<()>>>,
}

impl BatchIndexer {
    /// Start a batch indexer and its flush timer. Must be called inside a tokio runtime.
    pub fn new(indexer: Arc<dyn NodeIndexer>, config: &IndexerConfig) -> Self {
        let shared = Arc::new(Shared {
            indexer,
            batch_size: config.batch_size.max(1),
            flush_interval: Duration::from_millis(config.flush_interval_ms.max(1)),
            buffer: Mutex::new(Buffer::default()),
            last_flush: StdMutex::new(Instant::now()),
            stats: StdMutex::new(BatchStats::default()),
            timer_failure: StdMutex::new(None),
            shutdown: Notify::new(),
        });
        let timer = tokio::spawn(timer_loop(Arc::clone(&shared)));
        Self {
            shared,
            timer: StdMutex::new(Some(timer)),
        }
    }

    /// Queue a node. Returns the report when this call filled the batch.
    ///
    /// Fails without queueing when the indexer is shut down or a timed flush
    /// failed since the last call.
    pub async fn add(&self, node: IndexableNode) -> RecallResult<Option<FlushReport>> {
        self.shared.raise_timer_failure()?;
        let batch = {
            let mut buffer = self.shared.buffer.lock().await;
            if buffer.shut_down {
                return Err(IndexingError::ShutDown { node_id: node.id }.into());
            }
            buffer.items.push(node);
            if buffer.items.len() >= self.shared.batch_size {
                Some(std::mem::take(&mut buffer.items))
            } else {
                None
            }
        };

        match batch {
            Some(items) => self
                .shared
                .flush_items(items, FlushTrigger::Size)
                .await
                .map(Some),
            None => Ok(None),
        }
    }

    /// Flush whatever is buffered now. Also drains nodes put back by a
    /// failed shutdown flush.
    pub async fn flush(&self) -> RecallResult<FlushReport> {
        self.shared.raise_timer_failure()?;
        let items = std::mem::take(&mut self.shared.buffer.lock().await.items);
        self.shared.flush_items(items, FlushTrigger::Manual).await
    }

    /// Stop the timer and flush the remainder. Later calls return an empty
    /// report and later `add` calls fail with [`IndexingError::ShutDown`].
    pub async fn shutdown(&self) -> RecallResult<FlushReport> {
        let remaining = {
            let mut buffer = self.shared.buffer.lock().await;
            if buffer.shut_down {
                return Ok(FlushReport::empty(FlushTrigger::Shutdown));
            }
            buffer.shut_down = true;
            std::mem::take(&mut buffer.items)
        };

        self.shared.shutdown.notify_one();
        let timer = lock(&self.timer).take();
        if let Some(timer) = timer {
            if let Err(e) = timer.await {
                warn!(error = %e, "batch timer task ended abnormally");
            }
        }

        info!(remaining = remaining.len(), "batch indexer shutting down");
        let earlier = lock(&self.shared.timer_failure).take();
        let flushed = self.shared.flush_items(remaining, FlushTrigger::Shutdown).await;
        match (earlier, flushed) {
            (None, flushed) => flushed,
            (Some(earlier), Ok(_)) => Err(earlier.into()),
            (Some(earlier), Err(later)) => {
                // Report the older failure now and keep the newer one for `flush`.
                if let RecallError::IndexingError(later) = later {
                    *lock(&self.shared.timer_failure) = Some(later);
                }
                Err(earlier.into())
            }
        }
    }

    pub async fn pending(&self) -> usize {
        self.shared.buffer.lock().await.items.len()
    }

    pub async fn is_shut_down(&self) -> bool {
        self.shared.buffer.lock().await.shut_down
    }

    pub fn stats(&self) -> BatchStats {
        *lock(&self.shared.stats)
    }
}

impl Drop for BatchIndexer {
    fn drop(&mut self) {
        if let Some(timer) = lock(&self.timer).take() {
            timer.abort();
        }
    }
}

impl Shared {
    async fn flush_items(
        &self,
        items: Vec<IndexableNode>,
        trigger: FlushTrigger,
    ) -> RecallResult<FlushReport> {
        *lock(&self.last_flush) = Instant::now();
        let mut report = FlushReport::empty(trigger);
        if items.is_empty() {
            return Ok(report);
        }
        report.size = items.len();

        let mut items = items.into_iter();
        while let Some(node) = items.next() {
            match self.indexer.index_node(&node).await {
                Ok(IndexOutcome::Indexed) => {
                    report.indexed += 1;
                    lock(&self.stats).indexed += 1;
                }
                Ok(IndexOutcome::SkippedEmpty) => {
                    report.skipped += 1;
                    lock(&self.stats).skipped += 1;
                }
                Err(e) => {
                    lock(&self.stats).failed += 1;
                    let rest: Vec<IndexableNode> = items.by_ref().collect();
                    let requeued = rest.len();
                    if requeued > 0 {
                        let mut buffer = self.buffer.lock().await;
                        buffer.items.splice(0..0, rest);
                    }
                    let reason = e.to_string();
                    events::batch_failed(&node.id, &reason, requeued);
                    return Err(node_failure(node.id, e).into());
                }
            }
        }

        lock(&self.stats).flushes += 1;
        debug!(?trigger, "flush complete");
        events::batch_flushed(report.size, report.indexed, report.skipped);
        Ok(report)
    }

    /// Return and clear a held timer failure.
    fn raise_timer_failure(&self) -> RecallResult<()> {
        match lock(&self.timer_failure).take() {
            Some(failure) => Err(failure.into()),
            None => Ok(()),
        }
    }

    fn next_deadline(&self) -> Instant {
        *lock(&self.last_flush) + self.flush_interval
    }
}

fn node_failure(node_id: String, error: RecallError) -> IndexingError {
    match error {
        RecallError::IndexingError(failure @ IndexingError::NodeFailed { .. }) => failure,
        other => IndexingError::NodeFailed {
            node_id,
            reason: other.to_string(),
        },
    }
}

/// Wakes at `last_flush + interval`. A size or manual flush in the meantime
/// pushes the deadline out instead of firing early. While a failure is held
/// the timer leaves the buffer alone.
async fn timer_loop(shared: Arc<Shared>) {
    info!(interval_ms = shared.flush_interval.as_millis() as u64, "batch timer started");
    loop {
        let deadline = shared.next_deadline();
        tokio::select! {
            _ = shared.shutdown.notified() => {
                info!("batch timer received shutdown signal");
                break;
            }
            _ = tokio::time::sleep_until(deadline) => {
                if shared.next_deadline() > Instant::now() {
                    continue;
                }
                if lock(&shared.timer_failure).is_some() {
                    *lock(&shared.last_flush) = Instant::now();
                    continue;
                }
                let items = {
                    let mut buffer = shared.buffer.lock().await;
                    if buffer.shut_down {
                        break;
                    }
                    std::mem::take(&mut buffer.items)
                };
                if let Err(RecallError::IndexingError(failure)) =
                    shared.flush_items(items, FlushTrigger::Interval).await
                {
                    warn!(error = %failure, "timed flush failed");
                    lock(&shared.timer_failure).get_or_insert(failure);
                }
            }
        }
    }
}

fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
