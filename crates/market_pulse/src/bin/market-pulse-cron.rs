use std::{str::FromStr, sync::Arc};

use apalis::{layers::sentry::SentryLayer, prelude::*};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand};
use cron::Schedule;
use market_pulse::{
    jobs::{scheduled_market_news, JobSettings},
    service::{build_processor, http_client, resolve_settings, LiveProcessor, PipelineOptions},
    slack::SlackClient,
    tracing::init_tracing_subscriber,
};

#[derive(Parser)]
#[command(name = "market-pulse-cron", about = "Scheduled market news summaries")]
struct Cli {
    #[command(flatten)]
    pipeline: PipelineOptions,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once and exit
    Run,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression (seconds first, UTC)
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 11 * * *")]
        schedule: String,
    },
}

#[derive(Clone)]
struct Config {
    processor: Arc<LiveProcessor>,
    slack: SlackClient,
    job: JobSettings,
    channel_id: String,
}

async fn run_pipeline(config: &Config) -> anyhow::Result<()> {
    if config.channel_id.is_empty() {
        anyhow::bail!("SLACK_CHANNEL_ID not configured");
    }

    scheduled_market_news(
        Arc::clone(&config.processor),
        &config.slack,
        &config.job,
        &config.channel_id,
    )
    .await
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(
        channel_handle = %config.job.channel_handle,
        max_videos = config.job.max_videos,
        "Running scheduled pipeline..."
    );
    run_pipeline(&config).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let client = http_client()?;
    let settings = resolve_settings(&client, cli.pipeline.project_id.clone()).await;

    let config = Config {
        processor: Arc::new(build_processor(&client, &settings, &cli.pipeline)?),
        slack: SlackClient::new(client.clone(), &settings.slack_bot_token),
        job: cli.pipeline.job_settings()?,
        channel_id: settings.slack_channel_id.clone(),
    };

    match cli.command {
        Command::Run => {
            tracing::info!(max_videos = config.job.max_videos, "Running pipeline once...");
            run_pipeline(&config).await?;
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("market-pulse-cron")
                .backend(CronStream::new(schedule))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}
