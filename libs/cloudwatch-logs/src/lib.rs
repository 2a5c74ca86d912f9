//! CloudWatch Logs backend for [`log_export::LogQuery`].
//!
//! Uses `GetLogEvents` and follows `nextBackwardToken`. The service keeps
//! returning the same backward token once the oldest page has been served,
//! which is what the fetcher's termination rule relies on.

use aws_config::BehaviorVersion;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::config::Region;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, SdkError};
use aws_sdk_cloudwatchlogs::operation::get_log_events::GetLogEventsOutput;

use log_export::{LogPage, LogQuery, PageRequest, QueryError, QueryFuture, RawEvent};

pub const DEFAULT_REGION: &str = "ap-northeast-1";

#[derive(Clone, Debug)]
pub struct CloudWatchLogs {
    client: Client,
}

impl CloudWatchLogs {
    /// Build a client from the default credential chain.
    ///
    /// `profile` selects a named profile from the shared config files.
    pub async fn connect(region: &str, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.to_owned()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;
        tracing::debug!(region, profile = profile.unwrap_or("default"), "cloudwatch client ready");
        Self::from_client(Client::new(&sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl LogQuery for CloudWatchLogs {
    fn get_page<'a>(&'a self, request: &'a PageRequest) -> QueryFuture<'a> {
        Box::pin(async move {
            let output = self
                .client
                .get_log_events()
                .log_group_name(&request.log_group)
                .log_stream_name(&request.log_stream)
                .start_time(request.start_ms)
                .end_time(request.end_ms)
                .set_next_token(request.token.clone())
                .send()
                .await
                .map_err(classify)?;
            Ok(to_page(output))
        })
    }
}

/// Events without a timestamp fall back to their ingestion time.
fn to_page(output: GetLogEventsOutput) -> LogPage {
    let events = output
        .events()
        .iter()
        .map(|e| {
            RawEvent::new(
                e.timestamp().or(e.ingestion_time()).unwrap_or_default(),
                e.message().unwrap_or_default(),
            )
        })
        .collect();
    LogPage {
        events,
        next_token: output.next_backward_token().map(str::to_owned),
    }
}

fn classify<E, R>(err: SdkError<E, R>) -> QueryError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(&err).to_string();
    match err {
        SdkError::ServiceError(_) => QueryError::Service(detail),
        SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
            QueryError::Transport(detail)
        }
        _ => QueryError::Other(detail),
    }
}
