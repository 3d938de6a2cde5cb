use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;

use crate::{
    metadata,
    secrets::{SecretError, SecretStore},
};

/// Google Cloud Secret Manager, accessed over its REST API with a token from
/// the metadata server.
#[derive(Debug, Clone)]
pub struct GcpSecretManager {
    client: reqwest::Client,
    project_id: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AccessSecretVersionResponse {
    payload: SecretPayload,
}

#[derive(Debug, Deserialize)]
struct SecretPayload {
    data: String,
}

impl GcpSecretManager {
    pub fn new(client: reqwest::Client, project_id: impl Into<String>) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            base_url: "https://secretmanager.googleapis.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn secret_version_url(&self, name: &str) -> String {
        format!(
            "{}/projects/{}/secrets/{}/versions/latest:access",
            self.base_url, self.project_id, name
        )
    }
}

impl SecretStore for GcpSecretManager {
    #[tracing::instrument(skip(self), fields(project_id = %self.project_id))]
    async fn access_secret(&self, name: &str) -> Result<Option<String>, SecretError> {
        let token = metadata::access_token(&self.client)
            .await
            .map_err(|e| SecretError::Auth(format!("{e:#}")))?;

        let resp = self
            .client
            .get(self.secret_version_url(name))
            .bearer_auth(token)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SecretError::Api { status, message });
        }

        let body = resp.text().await?;
        decode_secret_payload(&body).map(Some)
    }
}

fn decode_secret_payload(body: &str) -> Result<String, SecretError> {
    let response = serde_json::from_str::<AccessSecretVersionResponse>(body)
        .map_err(|e| SecretError::Payload(e.to_string()))?;

    let bytes = STANDARD
        .decode(response.payload.data.trim())
        .map_err(|e| SecretError::Payload(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| SecretError::Payload(e.to_string()))
}
