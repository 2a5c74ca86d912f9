use chrono::{DateTime, NaiveDate};

/// Unit of transport between fetchers and the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub stream_name: String,
    /// UTC calendar day of the source event.
    pub timestamp: NaiveDate,
    pub message: String,
}

impl EventRecord {
    pub fn new(stream_name: impl Into<String>, timestamp: NaiveDate, message: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            timestamp,
            message: message.into(),
        }
    }

    /// Output file name: `{stream}_{YYYY-MM-DD}.log`.
    ///
    /// The stream name is used verbatim. A name containing `/` (Lambda streams
    /// look like `2024/02/01/[$LATEST]…`) points into subdirectories that are
    /// not created, so opening that file fails.
    pub fn file_key(&self) -> String {
        format!("{}_{}.log", self.stream_name, self.timestamp.format("%Y-%m-%d"))
    }
}

/// Truncate a unix millisecond timestamp to its UTC calendar day.
///
/// Returns `None` when the timestamp is outside the range chrono can represent.
pub fn day_from_millis(ms: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}
