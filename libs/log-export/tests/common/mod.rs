//! Shared fakes for pipeline tests.

use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log_export::{LogPage, LogQuery, PageRequest, QueryError, QueryFuture, RawEvent};

/// 2024-02-01T00:00:00Z in unix millis.
pub const FEB_1: i64 = 1_706_745_600_000;
pub const DAY_MS: i64 = 86_400_000;

/// Per-stream scripted remote log service.
///
/// Each stream answers with its pages in order, keyed by the token it was
/// asked for. A stream listed in `failing` returns an error on every call.
#[derive(Default)]
pub struct FakeLogService {
    streams: HashMap<String, Vec<LogPage>>,
    failing: Vec<String>,
    calls: AtomicUsize,
}

impl FakeLogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `messages` into pages of `page_size`, all dated `base_ms + i`.
    /// Tokens are `"{stream}-{n}"`; the final page repeats the previous token.
    pub fn with_stream(mut self, stream: &str, base_ms: i64, messages: &[&str], page_size: usize) -> Self {
        let mut pages: Vec<LogPage> = messages
            .chunks(page_size.max(1))
            .enumerate()
            .map(|(n, chunk)| LogPage {
                events: chunk
                    .iter()
                    .enumerate()
                    .map(|(i, m)| RawEvent::new(base_ms + (n * page_size + i) as i64, *m))
                    .collect(),
                next_token: Some(format!("{stream}-{n}")),
            })
            .collect();
        let last = pages.last().and_then(|p| p.next_token.clone()).unwrap_or_else(|| format!("{stream}-end"));
        pages.push(LogPage { events: vec![], next_token: Some(last) });
        self.streams.insert(stream.to_owned(), pages);
        self
    }

    pub fn with_pages(mut self, stream: &str, pages: Vec<LogPage>) -> Self {
        self.streams.insert(stream.to_owned(), pages);
        self
    }

    pub fn with_failing(mut self, stream: &str) -> Self {
        self.failing.push(stream.to_owned());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn page_index(&self, stream: &str, token: Option<&str>) -> usize {
        match token {
            None => 0,
            Some(t) => {
                let pages = &self.streams[stream];
                pages
                    .iter()
                    .position(|p| p.next_token.as_deref() == Some(t))
                    .map(|i| (i + 1).min(pages.len() - 1))
                    .unwrap_or(pages.len() - 1)
            }
        }
    }
}

impl LogQuery for FakeLogService {
    fn get_page<'a>(&'a self, request: &'a PageRequest) -> QueryFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.contains(&request.log_stream) {
                return Err(QueryError::Service(format!("ResourceNotFoundException: {}", request.log_stream)));
            }
            let pages = self
                .streams
                .get(&request.log_stream)
                .ok_or_else(|| QueryError::Other(format!("unknown stream {}", request.log_stream)))?;
            let idx = self.page_index(&request.log_stream, request.token.as_deref());
            Ok(pages[idx].clone())
        })
    }
}

/// `io::Write` into a shared buffer, for console-mode assertions.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
