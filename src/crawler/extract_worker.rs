//! Extraction worker: drains the work queue into the sink
//!
//! Every dequeued document yields exactly one record. When the extractor finds
//! nothing the configured sentinel is written instead. A sink failure cancels
//! the whole run.

use crate::config::TerminationMode;
use crate::crawler::{ConsumerGuard, Pop, WorkQueue};
use crate::extract::{ExtractedRecord, Extractor};
use crate::output::{Counter, RunStatistics, Sink, SinkError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shared collaborators of every extraction worker
pub struct ExtractContext {
    pub queue: Arc<WorkQueue>,
    pub extractor: Arc<dyn Extractor>,
    pub sink: Arc<dyn Sink>,
    pub stats: Arc<RunStatistics>,
    pub cancel: CancellationToken,
    pub idle_timeout: Duration,
    pub termination: TerminationMode,

    /// Field value written when extraction fails
    pub sentinel: String,
}

/// Consumes the queue until it is closed (or idle, depending on `termination`)
///
/// Returns the number of records written. `_consumer` keeps the queue's
/// receiving side alive for as long as this worker runs.
pub async fn extract_worker(
    id: usize,
    ctx: Arc<ExtractContext>,
    _consumer: ConsumerGuard,
) -> Result<usize, SinkError> {
    tracing::debug!("Extraction worker {} starting", id);
    let mut written = 0;

    loop {
        let popped = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => {
                tracing::info!("Extraction worker {} stopping: run aborted", id);
                break;
            }
            popped = ctx.queue.pop(ctx.idle_timeout) => popped,
        };

        let claimed = match popped {
            Pop::Item(claimed) => claimed,
            Pop::Closed => {
                tracing::debug!("Extraction worker {}: queue closed and empty", id);
                break;
            }
            Pop::Empty => match ctx.termination {
                TerminationMode::IdleTimeout => {
                    tracing::info!(
                        "Extraction worker {}: idle for {:?}, exiting",
                        id,
                        ctx.idle_timeout
                    );
                    break;
                }
                TerminationMode::ClosedAndEmpty => {
                    tracing::trace!("Extraction worker {}: idle, waiting for more work", id);
                    continue;
                }
            },
        };

        // Parsing and the file write are blocking work
        let item = claimed.item();
        let url = item.url.clone();
        let document = item.document.clone();
        let extractor = ctx.extractor.clone();
        let sink = ctx.sink.clone();
        let sentinel = ctx.sentinel.clone();
        let handled = tokio::task::spawn_blocking(move || {
            let extracted = extractor.extract(&document);
            let field = match &extracted {
                Ok(field) => field.clone(),
                Err(_) => sentinel,
            };
            let record = ExtractedRecord::new(url, field);
            let appended = sink.append(&record);
            (extracted.err(), record, appended)
        })
        .await;

        let (extract_error, record, appended) = match handled {
            Ok(outcome) => outcome,
            Err(e) => match e.try_into_panic() {
                Ok(panic) => std::panic::resume_unwind(panic),
                Err(e) => {
                    tracing::warn!("Extraction worker {}: blocking task lost: {}", id, e);
                    ctx.stats.incr(Counter::Dropped);
                    break;
                }
            },
        };

        if let Some(e) = extract_error {
            tracing::debug!("Extraction worker {}: {} for {}", id, e, record.url);
            ctx.stats.incr(Counter::ExtractionFailed);
        }
        ctx.stats.incr(Counter::Extracted);

        if let Err(e) = appended {
            tracing::error!(
                "Extraction worker {}: failed to write record for {}: {}",
                id,
                record.url,
                e
            );
            ctx.stats.incr(Counter::Dropped);
            claimed.ack();
            ctx.cancel.cancel();
            return Err(e);
        }

        ctx.stats.incr(Counter::RecordWritten);
        claimed.ack();
        written += 1;
    }

    tracing::debug!("Extraction worker {} finished, {} records written", id, written);
    Ok(written)
}
