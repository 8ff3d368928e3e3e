//! Hand-off queue between fetch workers and extraction workers
//!
//! The queue is FIFO and tracks every pushed item until it is acknowledged,
//! not merely until it is dequeued. [`WorkQueue::await_drain`] therefore only
//! resolves once every document has actually been processed.
//!
//! Consumers register with [`WorkQueue::consumer`]. When the last registered
//! consumer goes away the receiving side is dropped, so producers fail fast
//! instead of waiting on a bounded channel nobody reads.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender, UnboundedReceiver, UnboundedSender};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use url::Url;

/// A fetched document waiting for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: Url,
    pub domain: String,
    pub document: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    #[error("work queue is closed")]
    Closed,

    #[error("no extraction workers left to consume the queue")]
    Disconnected,
}

/// Outcome of [`WorkQueue::pop`]
#[derive(Debug)]
pub enum Pop {
    /// An item was dequeued; it stays outstanding until acknowledged
    Item(Claimed),

    /// Nothing arrived before the timeout
    Empty,

    /// The queue is closed and nothing is left in it
    Closed,
}

enum TxInner {
    Bounded(Sender<WorkItem>),
    Unbounded(UnboundedSender<WorkItem>),
}

impl Clone for TxInner {
    fn clone(&self) -> Self {
        match self {
            TxInner::Bounded(s) => TxInner::Bounded(s.clone()),
            TxInner::Unbounded(s) => TxInner::Unbounded(s.clone()),
        }
    }
}

impl TxInner {
    async fn send(&self, item: WorkItem) -> Result<(), WorkItem> {
        match self {
            TxInner::Bounded(s) => s.send(item).await.map_err(|e| e.0),
            TxInner::Unbounded(s) => s.send(item).map_err(|e| e.0),
        }
    }
}

enum RxInner {
    Bounded(Receiver<WorkItem>),
    Unbounded(UnboundedReceiver<WorkItem>),
}

impl RxInner {
    async fn recv(&mut self) -> Option<WorkItem> {
        match self {
            RxInner::Bounded(r) => r.recv().await,
            RxInner::Unbounded(r) => r.recv().await,
        }
    }
}

/// Count of pushed-but-unacknowledged items
#[derive(Debug, Default)]
struct Outstanding {
    count: AtomicUsize,
    drained: Notify,
}

impl Outstanding {
    fn acquire(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.drained.notify_waiters();
        }
    }

    fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// A dequeued item that still counts as outstanding
///
/// Acknowledge with [`Claimed::ack`] once the item has been fully handled.
/// Dropping a `Claimed` acknowledges it as well, so a panicking consumer
/// cannot wedge [`WorkQueue::await_drain`].
#[derive(Debug)]
pub struct Claimed {
    item: WorkItem,
    outstanding: Arc<Outstanding>,
}

impl Claimed {
    pub fn item(&self) -> &WorkItem {
        &self.item
    }

    /// Marks the item as processed
    pub fn ack(self) {
        drop(self);
    }
}

impl Drop for Claimed {
    fn drop(&mut self) {
        self.outstanding.release();
    }
}

/// Keeps the receiving side of a [`WorkQueue`] alive
///
/// Returned by [`WorkQueue::consumer`]; dropping the last one disconnects the
/// queue.
#[derive(Debug)]
pub struct ConsumerGuard {
    queue: Arc<WorkQueue>,
}

impl Drop for ConsumerGuard {
    fn drop(&mut self) {
        if self.queue.consumers.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.queue.disconnect();
        }
    }
}

/// Multi-producer, multi-consumer FIFO with two-phase consumption
pub struct WorkQueue {
    tx: Mutex<Option<TxInner>>,
    rx: AsyncMutex<Option<RxInner>>,
    outstanding: Arc<Outstanding>,
    consumers: AtomicUsize,
    disconnected: AtomicBool,
    gone: Notify,
}

impl std::fmt::Debug for WorkQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkQueue")
            .field("outstanding", &self.outstanding())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl WorkQueue {
    /// Creates a queue; `capacity == 0` means unbounded
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = if capacity == 0 {
            let (s, r) = mpsc::unbounded_channel();
            (TxInner::Unbounded(s), RxInner::Unbounded(r))
        } else {
            let (s, r) = mpsc::channel(capacity);
            (TxInner::Bounded(s), RxInner::Bounded(r))
        };

        Self {
            tx: Mutex::new(Some(tx)),
            rx: AsyncMutex::new(Some(rx)),
            outstanding: Arc::new(Outstanding::default()),
            consumers: AtomicUsize::new(0),
            disconnected: AtomicBool::new(false),
            gone: Notify::new(),
        }
    }

    /// Registers a consumer
    pub fn consumer(self: &Arc<Self>) -> ConsumerGuard {
        self.consumers.fetch_add(1, Ordering::SeqCst);
        ConsumerGuard {
            queue: Arc::clone(self),
        }
    }

    /// Enqueues an item
    ///
    /// Waits for room when the queue is bounded and full. The item counts as
    /// outstanding from the moment this is called.
    pub async fn push(&self, item: WorkItem) -> Result<(), QueueError> {
        let tx = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(QueueError::Closed)?;

        self.outstanding.acquire();
        match tx.send(item).await {
            Ok(()) => Ok(()),
            Err(_) => {
                self.outstanding.release();
                Err(QueueError::Disconnected)
            }
        }
    }

    /// Dequeues the next item, waiting at most `timeout`
    pub async fn pop(&self, timeout: Duration) -> Pop {
        let recv = async {
            let mut rx = self.rx.lock().await;
            if self.is_disconnected() {
                rx.take();
            }
            match rx.as_mut() {
                Some(rx) => rx.recv().await,
                None => None,
            }
        };

        match tokio::time::timeout(timeout, recv).await {
            Ok(Some(item)) => Pop::Item(Claimed {
                item,
                outstanding: Arc::clone(&self.outstanding),
            }),
            Ok(None) => Pop::Closed,
            Err(_) => Pop::Empty,
        }
    }

    /// Resolves once every pushed item has been popped and acknowledged
    pub async fn await_drain(&self) {
        loop {
            let notified = self.outstanding.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.outstanding.get() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Resolves once the last registered consumer has gone away
    pub async fn await_disconnect(&self) {
        loop {
            let notified = self.gone.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_disconnected() {
                return;
            }
            notified.await;
        }
    }

    /// Signals that no more items will be pushed
    ///
    /// Items already queued can still be popped; once they are gone `pop`
    /// returns [`Pop::Closed`].
    pub fn close(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_closed(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// Whether the last consumer has gone away
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Items pushed but not yet acknowledged
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    fn disconnect(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        // Producers blocked on a full channel need the receiver gone to wake
        // up. A pop in flight holds the lock; it drops the receiver itself
        // on its next call.
        match self.rx.try_lock() {
            Ok(mut rx) => {
                rx.take();
            }
            Err(_) => {
                tracing::debug!("Work queue receiver busy during disconnect");
            }
        }
        self.gone.notify_waiters();
    }
}
