use crate::secrets::SecretStore;

/// Secrets looked up at startup, by their Secret Manager / env var name.
pub const SECRET_NAMES: [&str; 5] = [
    "SLACK_BOT_TOKEN",
    "SLACK_SIGNING_SECRET",
    "YOUTUBE_API_KEY",
    "SLACK_CHANNEL_ID",
    "CRON_SECRET",
];

const DEFAULT_VERTEX_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_VERTEX_LOCATION: &str = "asia-southeast1";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    #[default]
    Development,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
        }
    }
}

/// Runtime configuration, resolved once and then shared read-only.
///
/// Missing secrets resolve to empty strings; the components that need them
/// decide whether that is fatal (`slack_channel_id`), degrading
/// (`youtube_api_key`) or permissive (`cron_secret`).
#[derive(Clone, Default)]
pub struct Settings {
    pub project_id: Option<String>,
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
    pub youtube_api_key: String,
    pub slack_channel_id: String,
    pub cron_secret: String,
    pub vertex_model: String,
    pub vertex_location: String,
    pub environment: Environment,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() {
                "<unset>"
            } else {
                "<redacted>"
            }
        }

        f.debug_struct("Settings")
            .field("project_id", &self.project_id)
            .field("slack_bot_token", &redact(&self.slack_bot_token))
            .field("slack_signing_secret", &redact(&self.slack_signing_secret))
            .field("youtube_api_key", &redact(&self.youtube_api_key))
            .field("slack_channel_id", &self.slack_channel_id)
            .field("cron_secret", &redact(&self.cron_secret))
            .field("vertex_model", &self.vertex_model)
            .field("vertex_location", &self.vertex_location)
            .field("environment", &self.environment)
            .finish()
    }
}

impl Settings {
    /// Resolves settings against the secret store and the process environment.
    pub async fn resolve<S: SecretStore + Sync>(store: &S, project_id: Option<String>) -> Self {
        Self::resolve_with(store, project_id, |name| std::env::var(name).ok()).await
    }

    /// Resolves settings with an explicit environment lookup.
    ///
    /// Each secret is taken from `store` first, then from `env`, then left
    /// empty.
    pub async fn resolve_with<S, E>(store: &S, project_id: Option<String>, env: E) -> Self
    where
        S: SecretStore + Sync,
        E: Fn(&str) -> Option<String>,
    {
        let [slack_bot_token, slack_signing_secret, youtube_api_key, slack_channel_id, cron_secret] =
            SECRET_NAMES;

        let settings = Settings {
            slack_bot_token: resolve_secret(store, &env, slack_bot_token).await,
            slack_signing_secret: resolve_secret(store, &env, slack_signing_secret).await,
            youtube_api_key: resolve_secret(store, &env, youtube_api_key).await,
            slack_channel_id: resolve_secret(store, &env, slack_channel_id).await,
            cron_secret: resolve_secret(store, &env, cron_secret).await,
            vertex_model: env("VERTEX_MODEL")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_VERTEX_MODEL.to_string()),
            vertex_location: env("VERTEX_LOCATION")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_VERTEX_LOCATION.to_string()),
            environment: if env("K_SERVICE").is_some() {
                Environment::Production
            } else {
                Environment::Development
            },
            project_id,
        };

        if settings.cron_secret.is_empty() {
            tracing::warn!(
                "CRON_SECRET is not configured: /cron/market-news will accept unauthenticated requests. \
                 Never deploy like this outside local development."
            );
        }

        tracing::info!(settings = ?settings, "Settings resolved");
        settings
    }
}

async fn resolve_secret<S, E>(store: &S, env: &E, name: &str) -> String
where
    S: SecretStore + Sync,
    E: Fn(&str) -> Option<String>,
{
    match store.access_secret(name).await {
        Ok(Some(value)) if !value.is_empty() => return value,
        Ok(_) => tracing::debug!(secret = name, "Secret not found in store"),
        Err(e) => tracing::warn!(
            error = %e,
            secret = name,
            "Secret not found in secret store or access denied; falling back to environment"
        ),
    }

    env(name).unwrap_or_default()
}
