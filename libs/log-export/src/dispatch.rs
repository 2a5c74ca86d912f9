use tokio::sync::mpsc;

use crate::record::EventRecord;

/// Default number of records buffered between fetchers and the writer.
pub const DEFAULT_CAPACITY: usize = 10;

/// Bounded fan-in queue: many fetchers push, one writer drains.
///
/// The queue closes once every [`RecordSink`] clone is dropped. `capacity`
/// must be non-zero.
pub fn channel(capacity: usize) -> (RecordSink, RecordSource) {
    let (tx, rx) = mpsc::channel(capacity);
    (RecordSink { tx }, RecordSource { rx })
}

/// Producer half. Cheap to clone, one clone per fetcher.
#[derive(Clone, Debug)]
pub struct RecordSink {
    tx: mpsc::Sender<EventRecord>,
}

impl RecordSink {
    /// Waits for free capacity, then enqueues the record.
    ///
    /// Fails only when the consumer is gone; the record is handed back.
    pub async fn push(&self, record: EventRecord) -> Result<(), EventRecord> {
        self.tx.send(record).await.map_err(|e| e.0)
    }
}

/// Consumer half, owned by the writer.
#[derive(Debug)]
pub struct RecordSource {
    rx: mpsc::Receiver<EventRecord>,
}

impl RecordSource {
    /// `None` once the queue is closed and drained.
    pub async fn next(&mut self) -> Option<EventRecord> {
        self.rx.recv().await
    }

    /// Blocking variant for use on a blocking thread. Panics if called from
    /// within an async context.
    pub fn blocking_next(&mut self) -> Option<EventRecord> {
        self.rx.blocking_recv()
    }
}
