pub mod config;
pub mod error;
pub mod query;
mod coordinator;
mod dispatch;
mod fetcher;
mod record;
mod writer;

pub use config::{ExportConfig, ExportSettings, OutputMode};
pub use coordinator::{ExportSummary, StreamReport, export, run, run_with_writer};
pub use dispatch::{DEFAULT_CAPACITY, RecordSink, RecordSource, channel};
pub use error::{ConfigError, ExportError, FetchError, QueryError, WriteError};
pub use fetcher::{DEFAULT_MAX_PAGES, FetchStats, Fetcher, StreamQuery};
pub use query::{LogPage, LogQuery, PageRequest, QueryFuture, RawEvent};
pub use record::{EventRecord, day_from_millis};
pub use writer::{DEFAULT_MAX_OPEN_FILES, ConsoleWriter, FileWriter, RecordWriter, WriteSummary, drain, for_mode, spawn_writer};
