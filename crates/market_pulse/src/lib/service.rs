//! Wiring of the live pipeline, shared by both binaries.

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use chrono_tz::Tz;
use market_settings::{metadata, EnvOnly, GcpSecretManager, Settings};

use crate::{
    jobs::{JobSettings, DEFAULT_CHANNEL_HANDLE, DEFAULT_MAX_VIDEOS},
    llm::{
        gemini::{GeminiAuth, GeminiClient},
        prompt::DEFAULT_TRANSCRIPT_CHAR_LIMIT,
    },
    yt::{
        audio_handler::{Fallback, PlayerStreamAudioHandler, YtDlpAudioHandler},
        data_api::YouTubeDataClient,
        scraper::WatchPageScraper,
    },
    MarketNewsProcessor, MarketNewsProcessorBuilder,
};

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub type LiveAudioHandler = Fallback<YtDlpAudioHandler, PlayerStreamAudioHandler>;

pub type LiveProcessor = MarketNewsProcessor<
    YouTubeDataClient,
    YouTubeDataClient,
    WatchPageScraper,
    LiveAudioHandler,
    GeminiClient,
>;

/// Options of the pipeline common to the server and the cron runner.
#[derive(Debug, Clone, clap::Args)]
pub struct PipelineOptions {
    /// Google Cloud project holding the secrets and the Vertex AI model
    #[arg(long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project_id: Option<String>,

    /// Working directory for downloaded audio
    #[arg(long, env = "MARKET_PULSE_WORKDIR", default_value = "/tmp/market-pulse")]
    pub workdir: PathBuf,

    /// YouTube channel handle to discover videos from
    #[arg(long, env = "CHANNEL_HANDLE", default_value = DEFAULT_CHANNEL_HANDLE)]
    pub channel_handle: String,

    /// Maximum videos summarized per run
    #[arg(long, env = "MAX_VIDEOS", default_value_t = DEFAULT_MAX_VIDEOS)]
    pub max_videos: usize,

    /// Characters of transcript sent to the model
    #[arg(long, env = "TRANSCRIPT_CHAR_LIMIT", default_value_t = DEFAULT_TRANSCRIPT_CHAR_LIMIT)]
    pub transcript_char_limit: usize,

    /// Netscape cookies file for YouTube requests
    #[arg(long, env = "YTDLP_COOKIES_PATH")]
    pub cookies_path: Option<PathBuf>,

    /// IANA timezone used to date reports
    #[arg(long, env = "REPORT_TIMEZONE", default_value = "Asia/Singapore")]
    pub report_timezone: String,

    /// Use the public Gemini API with this key instead of Vertex AI
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,
}

impl PipelineOptions {
    pub fn job_settings(&self) -> anyhow::Result<JobSettings> {
        let report_tz = self
            .report_timezone
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("Unknown timezone {:?}", self.report_timezone))?;

        Ok(JobSettings {
            channel_handle: self.channel_handle.clone(),
            max_videos: self.max_videos,
            report_tz,
        })
    }
}

pub fn http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Resolves settings from Secret Manager when a project is known, otherwise
/// from the environment alone.
pub async fn resolve_settings(client: &reqwest::Client, project_id: Option<String>) -> Settings {
    let project_id = match project_id.filter(|p| !p.is_empty()) {
        Some(project_id) => Some(project_id),
        None => metadata::project_id(client).await,
    };

    match project_id {
        Some(project_id) => {
            tracing::info!(%project_id, "Resolving settings from Secret Manager");
            let store = GcpSecretManager::new(client.clone(), project_id.clone());
            Settings::resolve(&store, Some(project_id)).await
        }
        None => {
            tracing::warn!("No Google Cloud project found, reading settings from environment only");
            Settings::resolve(&EnvOnly, None).await
        }
    }
}

pub fn build_processor(
    client: &reqwest::Client,
    settings: &Settings,
    options: &PipelineOptions,
) -> anyhow::Result<LiveProcessor> {
    let auth = match (&options.gemini_api_key, &settings.project_id) {
        (Some(key), _) if !key.is_empty() => GeminiAuth::ApiKey(key.clone()),
        (_, Some(project_id)) => GeminiAuth::Vertex {
            project_id: project_id.clone(),
            location: settings.vertex_location.clone(),
        },
        _ => anyhow::bail!("Vertex AI needs GOOGLE_CLOUD_PROJECT; set it or GEMINI_API_KEY"),
    };
    let summarizer = GeminiClient::new(client.clone(), auth, &settings.vertex_model);

    let youtube = YouTubeDataClient::new(client.clone(), &settings.youtube_api_key);

    let scraper = match &options.cookies_path {
        Some(path) => WatchPageScraper::new(client.clone()).with_cookies_file(path)?,
        None => WatchPageScraper::new(client.clone()),
    };
    let audio_handler = Fallback::new(
        YtDlpAudioHandler::new(options.cookies_path.clone()),
        PlayerStreamAudioHandler::new(scraper.clone()),
    );

    tracing::info!(
        model = summarizer.model(),
        workdir = %options.workdir.display(),
        "Pipeline configured"
    );

    let processor = MarketNewsProcessorBuilder::new(&options.workdir)
        .channel_scraper(youtube.clone())
        .metadata_source(youtube)
        .transcript_source(scraper)
        .audio_handler(audio_handler)
        .summarizer(summarizer)
        .transcript_char_limit(options.transcript_char_limit)
        .build();

    Ok(processor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        pipeline: PipelineOptions,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["market-pulse"]).unwrap();
        let job = cli.pipeline.job_settings().unwrap();

        assert_eq!(job.channel_handle, "@markets");
        assert_eq!(job.max_videos, 2);
        assert_eq!(job.report_tz, chrono_tz::Asia::Singapore);
        assert_eq!(cli.pipeline.transcript_char_limit, 30_000);
    }

    #[test]
    fn test_unknown_timezone_rejected() {
        let cli = Cli::try_parse_from(["market-pulse", "--report-timezone", "Mars/Olympus"]).unwrap();
        assert!(cli.pipeline.job_settings().is_err());
    }

    #[test]
    fn test_processor_needs_project_or_api_key() {
        let cli = Cli::try_parse_from(["market-pulse"]).unwrap();
        let client = reqwest::Client::new();
        let settings = Settings::default();

        let mut options = cli.pipeline;
        options.gemini_api_key = None;
        assert!(build_processor(&client, &settings, &options).is_err());

        options.gemini_api_key = Some("test-key".into());
        assert!(build_processor(&client, &settings, &options).is_ok());
    }
}
