use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::{
    jobs,
    parser::extract_video_urls,
    server::{
        auth::{
            verify_cron_secret, verify_slack_signature, CRON_SECRET_HEADER,
            SLACK_SIGNATURE_HEADER, SLACK_TIMESTAMP_HEADER,
        },
        AppState,
    },
    slack::Notifier,
    MarketAnalyzer,
};

pub const MARKET_NEWS_COMMAND: &str = "/marketnews";
pub const SLASH_COMMAND_ACK: &str =
    "🗞️ Discovering & summarizing latest Bloomberg market videos... ⏳";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    NotConfigured(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotConfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Form fields of a slash command request.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SlashCommand {
    pub command: Option<String>,
    pub text: String,
    pub response_url: Option<String>,
    pub user_name: Option<String>,
}

impl SlashCommand {
    pub fn parse(body: &[u8]) -> Self {
        let mut cmd = SlashCommand::default();
        for (key, value) in url::form_urlencoded::parse(body) {
            match key.as_ref() {
                "command" => cmd.command = Some(value.into_owned()),
                "text" => cmd.text = value.into_owned(),
                "response_url" => cmd.response_url = Some(value.into_owned()),
                "user_name" => cmd.user_name = Some(value.into_owned()),
                _ => {}
            }
        }
        cmd
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

pub async fn health<A, N>(State(state): State<AppState<A, N>>) -> Json<Value>
where
    A: MarketAnalyzer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    Json(json!({
        "status": "ok",
        "environment": state.settings.environment.as_str(),
    }))
}

/// Scheduler trigger. Queues a scheduled run and returns right away.
#[tracing::instrument(skip_all)]
pub async fn cron_market_news<A, N>(
    State(state): State<AppState<A, N>>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Value>), ApiError>
where
    A: MarketAnalyzer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    verify_cron_secret(
        header(&headers, CRON_SECRET_HEADER),
        &state.settings.cron_secret,
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected cron request");
        ApiError::Unauthorized("Invalid cron secret")
    })?;

    if state.settings.slack_channel_id.is_empty() {
        tracing::error!("SLACK_CHANNEL_ID not configured");
        return Err(ApiError::NotConfigured("SLACK_CHANNEL_ID not configured"));
    }

    let AppState {
        analyzer,
        notifier,
        settings,
        job,
        tracker,
    } = state;

    tracker.spawn(async move {
        // failures are already reported to the channel
        let _ = jobs::scheduled_market_news(
            analyzer,
            notifier.as_ref(),
            &job,
            &settings.slack_channel_id,
        )
        .await;
    });
    tracing::info!("Market news task queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "accepted",
            "message": "Market news task queued",
        })),
    ))
}

/// Slash command endpoint.
#[tracing::instrument(skip_all)]
pub async fn slack_events<A, N>(
    State(state): State<AppState<A, N>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError>
where
    A: MarketAnalyzer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    verify_slack_signature(
        header(&headers, SLACK_TIMESTAMP_HEADER),
        header(&headers, SLACK_SIGNATURE_HEADER),
        &body,
        &state.settings.slack_signing_secret,
        chrono::Utc::now().timestamp(),
    )
    .map_err(|e| {
        tracing::warn!(error = %e, "Rejected Slack request");
        ApiError::Unauthorized("Invalid signature")
    })?;

    let command = SlashCommand::parse(&body);
    if command.command.as_deref() != Some(MARKET_NEWS_COMMAND) {
        tracing::info!(command = ?command.command, "Ignoring command");
        return Ok(Json(json!({ "status": "ignored" })));
    }

    let Some(response_url) = command.response_url.filter(|url| !url.is_empty()) else {
        return Err(ApiError::BadRequest("Missing response_url"));
    };
    let urls = extract_video_urls(&command.text);
    tracing::info!(
        user = ?command.user_name,
        explicit_urls = urls.len(),
        "Received /marketnews"
    );

    let AppState {
        analyzer,
        notifier,
        job,
        tracker,
        ..
    } = state;

    tracker.spawn(async move {
        // failures are already reported through the response_url
        let _ =
            jobs::manual_market_news(analyzer, notifier.as_ref(), &job, &response_url, urls)
                .await;
    });

    Ok(Json(json!({
        "response_type": "ephemeral",
        "text": SLASH_COMMAND_ACK,
    })))
}
