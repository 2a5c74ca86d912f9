use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::dispatch::DEFAULT_CAPACITY;
use crate::error::ConfigError;
use crate::fetcher::{DEFAULT_MAX_PAGES, StreamQuery};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Where the writer puts records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// One message per line on stdout.
    #[default]
    Console,
    /// `{stream}_{YYYY-MM-DD}.log` files in the output directory.
    File,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(Self::Console),
            "file" => Ok(Self::File),
            other => Err(ConfigError::InvalidMode(other.to_owned())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Console => f.write_str("stdout"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Unvalidated settings as they come from flags or a config file.
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub log_group: String,
    /// Comma separated, taken verbatim.
    pub log_streams: String,
    pub start: String,
    pub end: String,
    pub mode: String,
    pub output_dir: PathBuf,
    pub channel_capacity: usize,
    pub max_pages: usize,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            log_group: String::new(),
            log_streams: String::new(),
            start: "2024-02-01".into(),
            end: "2024-02-02".into(),
            mode: "stdout".into(),
            output_dir: PathBuf::from("."),
            channel_capacity: DEFAULT_CAPACITY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Validated, immutable export configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportConfig {
    pub log_group: String,
    pub streams: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub mode: OutputMode,
    pub output_dir: PathBuf,
    pub channel_capacity: usize,
    pub max_pages: usize,
}

impl ExportConfig {
    pub fn parse(settings: &ExportSettings) -> Result<Self, ConfigError> {
        let start = parse_date("start", &settings.start)?;
        let end = parse_date("end", &settings.end)?;
        if start > end {
            return Err(ConfigError::StartAfterEnd {
                start: settings.start.clone(),
                end: settings.end.clone(),
            });
        }

        if settings.log_group.is_empty() {
            return Err(ConfigError::MissingLogGroup);
        }
        let streams = split_streams(&settings.log_streams)?;
        let mode = settings.mode.parse()?;

        if settings.channel_capacity == 0 {
            return Err(ConfigError::Zero("channel capacity"));
        }
        if settings.max_pages == 0 {
            return Err(ConfigError::Zero("max pages"));
        }

        Ok(Self {
            log_group: settings.log_group.clone(),
            streams,
            start,
            end,
            mode,
            output_dir: settings.output_dir.clone(),
            channel_capacity: settings.channel_capacity,
            max_pages: settings.max_pages,
        })
    }

    /// Window start: midnight UTC of the start date, in unix millis.
    pub fn start_ms(&self) -> i64 {
        midnight_ms(self.start)
    }

    /// Window end: midnight UTC of the end date, in unix millis.
    pub fn end_ms(&self) -> i64 {
        midnight_ms(self.end)
    }

    pub fn stream_query(&self, stream: &str) -> StreamQuery {
        StreamQuery {
            log_group: self.log_group.clone(),
            log_stream: stream.to_owned(),
            start_ms: self.start_ms(),
            end_ms: self.end_ms(),
        }
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ConfigError::InvalidDate {
        field,
        value: value.to_owned(),
    })
}

fn midnight_ms(day: NaiveDate) -> i64 {
    day.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Split on `,` without trimming or de-duplication. Empty names are rejected.
fn split_streams(list: &str) -> Result<Vec<String>, ConfigError> {
    if list.is_empty() {
        return Err(ConfigError::MissingLogStream);
    }
    list.split(',')
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                Err(ConfigError::EmptyLogStream(i))
            } else {
                Ok(name.to_owned())
            }
        })
        .collect()
}
