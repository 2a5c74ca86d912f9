use std::future::Future;
use std::pin::Pin;

use crate::error::QueryError;

/// One event as returned by the remote log service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub timestamp_ms: i64,
    pub message: String,
}

impl RawEvent {
    pub fn new(timestamp_ms: i64, message: impl Into<String>) -> Self {
        Self { timestamp_ms, message: message.into() }
    }
}

/// One page of a paginated query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPage {
    pub events: Vec<RawEvent>,
    /// Continuation token for the next request. The service keeps returning
    /// the same token once the history is exhausted.
    pub next_token: Option<String>,
}

/// Parameters of a single page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub log_group: String,
    pub log_stream: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub token: Option<String>,
}

pub type QueryFuture<'a> = Pin<Box<dyn Future<Output = Result<LogPage, QueryError>> + Send + 'a>>;

/// Paginated remote log query.
///
/// Implementations are shared between all fetcher tasks, so they must be
/// `Send + Sync`.
pub trait LogQuery: Send + Sync {
    fn get_page<'a>(&'a self, request: &'a PageRequest) -> QueryFuture<'a>;
}
