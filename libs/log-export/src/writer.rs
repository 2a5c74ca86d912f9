use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;

use crate::config::OutputMode;
use crate::dispatch::RecordSource;
use crate::error::WriteError;
use crate::record::EventRecord;

/// Destination for drained records. Owned by the single writer task.
pub trait RecordWriter: Send {
    fn write_record(&mut self, record: &EventRecord) -> Result<(), WriteError>;

    /// Flush and release everything. Called exactly once, after the last record.
    fn close(&mut self) -> Result<(), WriteError>;

    fn files_opened(&self) -> usize {
        0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    /// Records dropped because of an output error.
    pub failed: usize,
    /// Output files opened, counting reopens after eviction. Zero for console.
    pub files_opened: usize,
}

// ═══════════════════════════════════════════════════════════════
//  Console
// ═══════════════════════════════════════════════════════════════

/// Writes each message as one line to the wrapped writer (stdout by default).
pub struct ConsoleWriter<W: Write + Send> {
    out: BufWriter<W>,
}

impl ConsoleWriter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> ConsoleWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out: BufWriter::new(out) }
    }

    /// Flushes buffered output and returns the inner writer.
    pub fn into_inner(self) -> Result<W, WriteError> {
        self.out.into_inner().map_err(|e| WriteError::Flush {
            target: "console".into(),
            source: e.into_error(),
        })
    }
}

impl<W: Write + Send> RecordWriter for ConsoleWriter<W> {
    fn write_record(&mut self, record: &EventRecord) -> Result<(), WriteError> {
        writeln!(self.out, "{}", record.message).map_err(|source| WriteError::Write {
            target: "console".into(),
            source,
        })
    }

    fn close(&mut self) -> Result<(), WriteError> {
        self.out.flush().map_err(|source| WriteError::Close {
            target: "console".into(),
            source,
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Daily files
// ═══════════════════════════════════════════════════════════════

/// Open handles kept by a [`FileWriter`] unless configured otherwise.
pub const DEFAULT_MAX_OPEN_FILES: usize = 64;

struct OpenFile {
    out: BufWriter<File>,
    last_used: u64,
}

/// Appends each message to `{dir}/{stream}_{YYYY-MM-DD}.log`.
///
/// Handles are opened on first use and cached. Once `max_open` handles are
/// cached the least recently used one is closed; a later record for that file
/// reopens it in append mode. Every record is flushed, so eviction never
/// loses or reorders lines.
pub struct FileWriter {
    dir: PathBuf,
    handles: HashMap<String, OpenFile>,
    max_open: usize,
    clock: u64,
    opened: usize,
}

impl FileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            handles: HashMap::new(),
            max_open: DEFAULT_MAX_OPEN_FILES,
            clock: 0,
            opened: 0,
        }
    }

    /// Cap on cached handles. Values below 1 are treated as 1.
    pub fn with_max_open(mut self, max_open: usize) -> Self {
        self.max_open = max_open.max(1);
        self
    }

    /// Number of handles currently cached.
    pub fn open_files(&self) -> usize {
        self.handles.len()
    }

    fn evict_lru(&mut self) -> Result<(), WriteError> {
        let Some(key) = self
            .handles
            .iter()
            .min_by_key(|(_, f)| f.last_used)
            .map(|(k, _)| k.clone())
        else {
            return Ok(());
        };
        let Some(mut file) = self.handles.remove(&key) else {
            return Ok(());
        };
        tracing::debug!(file = %key, "closing least recently used output file");
        file.out.flush().map_err(|source| WriteError::Close { target: key, source })
    }

    fn handle(&mut self, key: &str) -> Result<&mut BufWriter<File>, WriteError> {
        self.clock += 1;
        let now = self.clock;

        if !self.handles.contains_key(key) {
            if self.handles.len() >= self.max_open {
                if let Err(e) = self.evict_lru() {
                    tracing::error!(error = %e, "closing evicted output file failed");
                }
            }
            let path = self.dir.join(key);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|source| WriteError::Open { path: path.clone(), source })?;
            tracing::debug!(path = %path.display(), "opened output file");
            self.opened += 1;
            self.handles.insert(
                key.to_owned(),
                OpenFile { out: BufWriter::new(file), last_used: now },
            );
        }

        match self.handles.get_mut(key) {
            Some(file) => {
                file.last_used = now;
                Ok(&mut file.out)
            }
            None => Err(WriteError::Open {
                path: self.dir.join(key),
                source: std::io::Error::other("handle missing from cache"),
            }),
        }
    }
}

impl RecordWriter for FileWriter {
    fn write_record(&mut self, record: &EventRecord) -> Result<(), WriteError> {
        let key = record.file_key();
        let out = self.handle(&key)?;
        writeln!(out, "{}", record.message).map_err(|source| WriteError::Write {
            target: key.clone(),
            source,
        })?;
        out.flush().map_err(|source| WriteError::Flush { target: key, source })
    }

    fn close(&mut self) -> Result<(), WriteError> {
        let mut first_err = None;
        for (key, mut file) in self.handles.drain() {
            if let Err(source) = file.out.flush() {
                tracing::error!(file = %key, error = %source, "flush on close failed");
                first_err.get_or_insert(WriteError::Close { target: key, source });
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn files_opened(&self) -> usize {
        self.opened
    }
}

// ═══════════════════════════════════════════════════════════════
//  Drain loop
// ═══════════════════════════════════════════════════════════════

/// Blocking drain: write every record until the channel is closed and empty,
/// then close the writer.
///
/// Output errors skip the offending record; the loop keeps going.
pub fn drain(mut source: RecordSource, writer: &mut dyn RecordWriter) -> WriteSummary {
    let mut summary = WriteSummary::default();

    while let Some(record) = source.blocking_next() {
        match writer.write_record(&record) {
            Ok(()) => summary.written += 1,
            Err(e) => {
                tracing::error!(stream = %record.stream_name, error = %e, "write failed, skipping record");
                summary.failed += 1;
            }
        }
    }

    summary.files_opened = writer.files_opened();
    if let Err(e) = writer.close() {
        tracing::error!(error = %e, "closing output failed");
    }
    tracing::debug!(
        written = summary.written,
        failed = summary.failed,
        files_opened = summary.files_opened,
        "writer drained"
    );
    summary
}

/// Writer for the configured output mode.
pub fn for_mode(mode: OutputMode, output_dir: &Path) -> Box<dyn RecordWriter> {
    match mode {
        OutputMode::Console => Box::new(ConsoleWriter::stdout()),
        OutputMode::File => Box::new(FileWriter::new(output_dir)),
    }
}

/// Drain `source` into `writer` on a blocking thread.
pub fn spawn_writer(source: RecordSource, mut writer: Box<dyn RecordWriter>) -> JoinHandle<WriteSummary> {
    tokio::task::spawn_blocking(move || drain(source, writer.as_mut()))
}
