use anyhow::Context;
use clap::Parser;

use market_pulse::{
    server::{router, AppState},
    service::{build_processor, http_client, resolve_settings, PipelineOptions},
    slack::SlackClient,
    tracing::init_tracing_subscriber,
};

#[derive(Parser)]
#[command(name = "market-pulse", about = "Market news webhook server")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    #[command(flatten)]
    pipeline: PipelineOptions,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let environment = if std::env::var("K_SERVICE").is_ok() {
        "production"
    } else {
        "development"
    };
    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some(environment.into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let client = http_client()?;
    let settings = resolve_settings(&client, cli.pipeline.project_id.clone()).await;
    let job = cli.pipeline.job_settings()?;
    let processor = build_processor(&client, &settings, &cli.pipeline)?;
    let slack = SlackClient::new(client.clone(), &settings.slack_bot_token);

    let state = AppState::new(processor, slack, settings, job);
    let tracker = state.tracker.clone();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((cli.host.as_str(), cli.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", cli.host, cli.port))?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracker.close();
    tracing::info!(in_flight = tracker.len(), "Waiting for background runs to finish");
    tracker.wait().await;

    Ok(())
}
