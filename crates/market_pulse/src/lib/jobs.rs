//! Background runs triggered by the scheduler and by the slash command.
//!
//! Each job runs the pipeline in its own task so that a panic is reported to
//! Slack the same way as an error, then delivers exactly one message.

use std::{future::Future, sync::Arc};

use anyhow::anyhow;
use chrono_tz::Tz;

use crate::{
    domain::AnalysisBatch,
    report::{
        format_report, manual_failure_message, report_date, scheduled_failure_message,
        NO_VIDEOS_MESSAGE,
    },
    slack::{Destination, Notifier},
    MarketAnalyzer,
};

pub const DEFAULT_CHANNEL_HANDLE: &str = "@markets";
pub const DEFAULT_MAX_VIDEOS: usize = 2;

/// What the jobs analyze and how the report is dated.
#[derive(Debug, Clone)]
pub struct JobSettings {
    pub channel_handle: String,
    pub max_videos: usize,
    pub report_tz: Tz,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            channel_handle: DEFAULT_CHANNEL_HANDLE.into(),
            max_videos: DEFAULT_MAX_VIDEOS,
            report_tz: chrono_tz::Asia::Singapore,
        }
    }
}

async fn run_isolated<F>(pipeline: F) -> anyhow::Result<AnalysisBatch>
where
    F: Future<Output = anyhow::Result<AnalysisBatch>> + Send + 'static,
{
    match tokio::spawn(pipeline).await {
        Ok(result) => result,
        Err(e) => Err(anyhow!("Pipeline task failed: {e}")),
    }
}

/// Scheduled run: posts the report, the no-videos notice or a failure
/// message to `channel_id`. Returns the pipeline error, if any, after the
/// failure message went out.
#[tracing::instrument(skip(analyzer, notifier))]
pub async fn scheduled_market_news<A, N>(
    analyzer: Arc<A>,
    notifier: &N,
    job: &JobSettings,
    channel_id: &str,
) -> anyhow::Result<()>
where
    A: MarketAnalyzer + Send + Sync + 'static,
    N: Notifier + Sync,
{
    let destination = Destination::Channel(channel_id.to_string());
    let channel_handle = job.channel_handle.clone();
    let max_videos = job.max_videos;

    let outcome = run_isolated(async move {
        analyzer
            .run_scheduled(&channel_handle, max_videos)
            .await
    })
    .await;

    match outcome {
        Ok(batch) if batch.is_empty() => {
            tracing::warn!("No videos found, sending fallback message");
            notifier.deliver(&destination, NO_VIDEOS_MESSAGE).await;
            Ok(())
        }
        Ok(batch) => {
            let message = format_report(&batch, report_date(job.report_tz));
            notifier.deliver(&destination, &message).await;
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = ?e, "Scheduled market news failed");
            let message = scheduled_failure_message(&format!("{e:#}"));
            notifier.deliver(&destination, &message).await;
            Err(e)
        }
    }
}

/// Slash-command run: analyzes `urls` when given, otherwise discovers the
/// latest uploads, and answers through the command's `response_url`.
#[tracing::instrument(skip(analyzer, notifier, response_url))]
pub async fn manual_market_news<A, N>(
    analyzer: Arc<A>,
    notifier: &N,
    job: &JobSettings,
    response_url: &str,
    urls: Vec<String>,
) -> anyhow::Result<()>
where
    A: MarketAnalyzer + Send + Sync + 'static,
    N: Notifier + Sync,
{
    let destination = Destination::ResponseUrl(response_url.to_string());
    let channel_handle = job.channel_handle.clone();
    let max_videos = job.max_videos;

    let outcome = run_isolated(async move {
        if urls.is_empty() {
            analyzer.run_scheduled(&channel_handle, max_videos).await
        } else {
            analyzer.run_manual(&urls).await
        }
    })
    .await;

    match outcome {
        Ok(batch) => {
            let message = format_report(&batch, report_date(job.report_tz));
            notifier.deliver(&destination, &message).await;
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = ?e, "Error in manual market news task");
            let message = manual_failure_message(&format!("{e:#}"));
            notifier.deliver(&destination, &message).await;
            Err(e)
        }
    }
}
