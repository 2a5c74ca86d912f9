use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{ExportConfig, ExportSettings};
use crate::dispatch::channel;
use crate::error::{ExportError, FetchError};
use crate::fetcher::{FetchStats, Fetcher};
use crate::query::LogQuery;
use crate::writer::{self, RecordWriter, WriteSummary, spawn_writer};

/// Outcome of one fetcher.
#[derive(Debug)]
pub struct StreamReport {
    pub stream: String,
    pub stats: FetchStats,
    /// Set when the fetcher stopped early. Records pushed before the failure
    /// were still written.
    pub error: Option<String>,
}

#[derive(Debug)]
pub struct ExportSummary {
    pub streams: Vec<StreamReport>,
    pub written: WriteSummary,
}

impl ExportSummary {
    pub fn fetched(&self) -> usize {
        self.streams.iter().map(|s| s.stats.records).sum()
    }

    pub fn failed_streams(&self) -> usize {
        self.streams.iter().filter(|s| s.error.is_some()).count()
    }
}

/// Validate `settings`, then run the export. Nothing is spawned and no file
/// is touched when validation fails.
pub async fn export(settings: &ExportSettings, client: Arc<dyn LogQuery>) -> Result<ExportSummary, ExportError> {
    let config = ExportConfig::parse(settings)?;
    run(&config, client).await
}

/// Run the export with the writer selected by `config.mode`.
pub async fn run(config: &ExportConfig, client: Arc<dyn LogQuery>) -> Result<ExportSummary, ExportError> {
    let writer = writer::for_mode(config.mode, &config.output_dir);
    run_with_writer(config, client, writer).await
}

/// Run the export into a caller supplied writer; `config.mode` is ignored.
///
/// Starts the writer, one fetcher per stream, waits for every fetcher, closes
/// the channel and waits for the writer to drain.
pub async fn run_with_writer(
    config: &ExportConfig,
    client: Arc<dyn LogQuery>,
    writer: Box<dyn RecordWriter>,
) -> Result<ExportSummary, ExportError> {
    tracing::info!(
        log_group = %config.log_group,
        streams = config.streams.len(),
        start = %config.start,
        end = %config.end,
        mode = %config.mode,
        "export starting"
    );

    let (sink, source) = channel(config.channel_capacity);
    let writer_task = spawn_writer(source, writer);

    let mut fetchers: Vec<(String, JoinHandle<(FetchStats, Result<FetchStats, FetchError>)>)> = Vec::new();
    for stream in &config.streams {
        let query = config.stream_query(stream);
        let sink = sink.clone();
        let client = client.clone();
        let max_pages = config.max_pages;
        fetchers.push((
            stream.clone(),
            tokio::spawn(async move {
                let mut fetcher = Fetcher::new(client.as_ref(), query, sink).with_max_pages(max_pages);
                let result = fetcher.run().await;
                (fetcher.stats(), result)
            }),
        ));
    }

    let mut streams = Vec::with_capacity(fetchers.len());
    for (stream, handle) in fetchers {
        let report = match handle.await {
            Ok((stats, Ok(_))) => {
                tracing::info!(stream = %stream, pages = stats.pages, records = stats.records, "stream done");
                StreamReport { stream, stats, error: None }
            }
            Ok((stats, Err(e))) => {
                tracing::error!(stream = %stream, records = stats.records, error = %e, "stream aborted");
                StreamReport { stream, stats, error: Some(e.to_string()) }
            }
            Err(e) => {
                tracing::error!(stream = %stream, error = %e, "fetcher task failed");
                StreamReport { stream, stats: FetchStats::default(), error: Some(e.to_string()) }
            }
        };
        streams.push(report);
    }

    // Every fetcher has returned; dropping the last sender closes the channel.
    drop(sink);
    let written = writer_task.await?;

    let summary = ExportSummary { streams, written };
    tracing::info!(
        fetched = summary.fetched(),
        written = summary.written.written,
        write_failures = summary.written.failed,
        files_opened = summary.written.files_opened,
        failed_streams = summary.failed_streams(),
        "export finished"
    );
    Ok(summary)
}
