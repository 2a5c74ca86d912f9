use crate::dispatch::RecordSink;
use crate::error::FetchError;
use crate::query::{LogQuery, PageRequest};
use crate::record::{EventRecord, day_from_millis};

/// Upper bound on pages per stream. Guards against a service that never
/// repeats its continuation token.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

/// Time window and identity of one stream to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub log_group: String,
    pub log_stream: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub pages: usize,
    pub records: usize,
    /// Events dropped because their timestamp has no calendar date.
    pub skipped: usize,
}

/// Pages through one stream and pushes every event into the shared sink.
pub struct Fetcher<'a> {
    client: &'a dyn LogQuery,
    query: StreamQuery,
    sink: RecordSink,
    max_pages: usize,
    stats: FetchStats,
}

impl<'a> Fetcher<'a> {
    pub fn new(client: &'a dyn LogQuery, query: StreamQuery, sink: RecordSink) -> Self {
        Self {
            client,
            query,
            sink,
            max_pages: DEFAULT_MAX_PAGES,
            stats: FetchStats::default(),
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Counters so far. Still meaningful after [`run`](Self::run) failed.
    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Fetch until the continuation token stops changing.
    ///
    /// The sink stays open for as long as the fetcher is alive; drop it once
    /// this returns.
    pub async fn run(&mut self) -> Result<FetchStats, FetchError> {
        let stream = self.query.log_stream.clone();
        let mut request = PageRequest {
            log_group: self.query.log_group.clone(),
            log_stream: self.query.log_stream.clone(),
            start_ms: self.query.start_ms,
            end_ms: self.query.end_ms,
            token: None,
        };

        loop {
            if self.stats.pages >= self.max_pages {
                return Err(FetchError::PageLimit {
                    stream,
                    pages: self.stats.pages,
                });
            }

            let page = self
                .client
                .get_page(&request)
                .await
                .map_err(|source| FetchError::Query { stream: stream.clone(), source })?;
            self.stats.pages += 1;

            tracing::debug!(
                stream = %stream,
                page = self.stats.pages,
                events = page.events.len(),
                "fetched page"
            );

            for event in page.events {
                let Some(day) = day_from_millis(event.timestamp_ms) else {
                    tracing::warn!(stream = %stream, timestamp_ms = event.timestamp_ms, "timestamp out of range, skipping");
                    self.stats.skipped += 1;
                    continue;
                };
                let record = EventRecord::new(stream.as_str(), day, event.message);
                if self.sink.push(record).await.is_err() {
                    return Err(FetchError::SinkClosed { stream });
                }
                self.stats.records += 1;
            }

            // Same token twice in a row: history exhausted.
            let exhausted = match (&request.token, &page.next_token) {
                (Some(prev), Some(next)) => prev == next,
                (_, None) => true,
                _ => false,
            };
            if exhausted {
                return Ok(self.stats);
            }
            request.token = page.next_token;
        }
    }
}
