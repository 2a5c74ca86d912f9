use std::path::PathBuf;

/// Invalid export settings. Always reported before any fetch or write starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("log group name is required")]
    MissingLogGroup,

    #[error("log stream name is required")]
    MissingLogStream,

    #[error("empty log stream name at position {0} in stream list")]
    EmptyLogStream(usize),

    #[error("invalid {field} date '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("start date {start} is after end date {end}")]
    StartAfterEnd { start: String, end: String },

    #[error("invalid mode: {0} (expected 'stdout' or 'file')")]
    InvalidMode(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Failure reported by a [`LogQuery`](crate::LogQuery) implementation.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("service error: {0}")]
    Service(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("query failed for stream {stream}: {source}")]
    Query { stream: String, source: QueryError },

    #[error("stream {stream} reached the page limit ({pages} pages)")]
    PageLimit { stream: String, pages: usize },

    #[error("record channel closed while fetching stream {stream}")]
    SinkClosed { stream: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("open {}: {source}", path.display())]
    Open { path: PathBuf, source: std::io::Error },

    #[error("write {target}: {source}")]
    Write { target: String, source: std::io::Error },

    #[error("flush {target}: {source}")]
    Flush { target: String, source: std::io::Error },

    #[error("close {target}: {source}")]
    Close { target: String, source: std::io::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("writer task failed: {0}")]
    WriterTask(#[from] tokio::task::JoinError),
}
