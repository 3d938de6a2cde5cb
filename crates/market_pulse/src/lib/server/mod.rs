pub mod auth;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use market_settings::Settings;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::{jobs::JobSettings, slack::Notifier, MarketAnalyzer};

/// Shared state of the webhook server.
pub struct AppState<A, N> {
    pub analyzer: Arc<A>,
    pub notifier: Arc<N>,
    pub settings: Arc<Settings>,
    pub job: Arc<JobSettings>,
    /// Background pipeline runs; drained on shutdown.
    pub tracker: TaskTracker,
}

impl<A, N> AppState<A, N> {
    pub fn new(analyzer: A, notifier: N, settings: Settings, job: JobSettings) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            notifier: Arc::new(notifier),
            settings: Arc::new(settings),
            job: Arc::new(job),
            tracker: TaskTracker::new(),
        }
    }
}

impl<A, N> Clone for AppState<A, N> {
    fn clone(&self) -> Self {
        Self {
            analyzer: Arc::clone(&self.analyzer),
            notifier: Arc::clone(&self.notifier),
            settings: Arc::clone(&self.settings),
            job: Arc::clone(&self.job),
            tracker: self.tracker.clone(),
        }
    }
}

pub fn router<A, N>(state: AppState<A, N>) -> Router
where
    A: MarketAnalyzer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(handlers::health::<A, N>))
        .route("/cron/market-news", post(handlers::cron_market_news::<A, N>))
        .route("/slack/events", post(handlers::slack_events::<A, N>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
