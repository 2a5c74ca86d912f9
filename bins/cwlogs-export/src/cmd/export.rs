use std::sync::Arc;

use cloudwatch_logs::CloudWatchLogs;
use log_export::ExportConfig;

use super::config::Effective;
use super::error::CliError;

pub async fn run(eff: &Effective) -> Result<(), CliError> {
    // Validate everything before touching AWS or the filesystem.
    let config = ExportConfig::parse(&eff.settings)?;

    let client = CloudWatchLogs::connect(&eff.region, eff.profile.as_deref()).await;
    tracing::info!(region = %eff.region, profile = eff.profile.as_deref().unwrap_or("default"), "client configured");

    let summary = log_export::run(&config, Arc::new(client)).await?;

    for report in summary.streams.iter().filter(|s| s.error.is_some()) {
        tracing::warn!(
            stream = %report.stream,
            records = report.stats.records,
            "output for this stream is incomplete"
        );
    }
    Ok(())
}
