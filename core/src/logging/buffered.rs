use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};

use super::{LogRecord, LogSink};
use crate::errors::SinkError;

/// Fire-and-forget front for a slower sink.
///
/// Records go into a bounded queue drained by one worker thread. A full queue
/// drops the record and counts it instead of blocking the statement that
/// produced it. Dropping the sink stops intake and waits for the worker to
/// drain what is already queued.
pub struct BufferedSink {
    tx: Option<mpsc::Sender<LogRecord>>,
    dropped: Arc<AtomicU64>,
    pending: Arc<Pending>,
    worker: Option<JoinHandle<()>>,
}

/// Records accepted but not yet handed to the inner sink.
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    idle: Condvar,
}

impl Pending {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn add(&self) {
        *self.lock() += 1;
    }

    fn done(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.idle.notify_all();
        }
    }
}

impl BufferedSink {
    pub fn new(inner: Arc<dyn LogSink>, capacity: usize) -> Result<Self, SinkError> {
        let (tx, mut rx) = mpsc::channel::<LogRecord>(capacity.max(1));
        let pending = Arc::new(Pending::default());
        let worker_pending = pending.clone();
        let worker = thread::Builder::new()
            .name("sqlhook-log".into())
            .spawn(move || {
                while let Some(record) = rx.blocking_recv() {
                    // A misbehaving sink must not take the worker down with it.
                    let _ = panic::catch_unwind(AssertUnwindSafe(|| inner.log(record)));
                    worker_pending.done();
                }
            })?;
        Ok(Self {
            tx: Some(tx),
            dropped: Arc::new(AtomicU64::new(0)),
            pending,
            worker: Some(worker),
        })
    }

    /// Records queued or being written right now.
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    /// Wait until every accepted record has reached the inner sink, keeping
    /// the sink open. Returns `false` if `timeout` ran out first.
    pub fn flush(&self, timeout: Duration) -> bool {
        let count = self.pending.lock();
        let (_count, waited) = self
            .pending
            .idle
            .wait_timeout_while(count, timeout, |count| *count > 0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        !waited.timed_out()
    }

    /// Records discarded because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting records and wait until queued ones are written.
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl LogSink for BufferedSink {
    fn log(&self, record: LogRecord) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Closed)?;
        // Counted before the send so the worker can never finish it first.
        self.pending.add();
        let result = tx.try_send(record);
        if result.is_err() {
            self.pending.done();
        }
        match result {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Saturated)
            }
            Err(TrySendError::Closed(_)) => Err(SinkError::Closed),
        }
    }
}

impl Drop for BufferedSink {
    fn drop(&mut self) {
        self.shutdown();
    }
}
