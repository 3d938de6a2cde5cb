//! Helpers for the GCE / Cloud Run metadata server.
//!
//! The metadata server hands out OAuth access tokens for the attached
//! service account and knows the project id. Both Secret Manager and
//! Vertex AI authenticate with these tokens.

use anyhow::Context;
use serde::Deserialize;

const METADATA_BASE_URL: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Overrides the metadata server token, for running outside Google Cloud
/// (`gcloud auth print-access-token`).
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Returns a bearer token for Google APIs.
#[tracing::instrument(skip_all)]
pub async fn access_token(client: &reqwest::Client) -> anyhow::Result<String> {
    if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let body = client
        .get(format!(
            "{METADATA_BASE_URL}/instance/service-accounts/default/token"
        ))
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .context("Failed to reach metadata server")?
        .error_for_status()
        .context("Metadata server refused token request")?
        .text()
        .await?;

    parse_token_response(&body)
}

/// Returns the project id of the running instance, if the metadata server
/// is reachable.
#[tracing::instrument(skip_all)]
pub async fn project_id(client: &reqwest::Client) -> Option<String> {
    let resp = client
        .get(format!("{METADATA_BASE_URL}/project/project-id"))
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .inspect_err(|e| tracing::debug!(error = %e, "Metadata server not reachable"))
        .ok()?;

    if !resp.status().is_success() {
        return None;
    }

    resp.text()
        .await
        .ok()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

fn parse_token_response(body: &str) -> anyhow::Result<String> {
    let token = serde_json::from_str::<TokenResponse>(body)
        .context("Failed to parse metadata token response")?
        .access_token;
    Ok(token)
}
