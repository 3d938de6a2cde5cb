use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{Summarizer, SummaryResponse};

const GENERATE_TIMEOUT: Duration = Duration::from_secs(300);
const TEMPERATURE: f32 = 0.2;

/// How requests reach Gemini.
#[derive(Debug, Clone)]
pub enum GeminiAuth {
    /// Vertex AI, authenticated with the service account's access token.
    Vertex {
        project_id: String,
        location: String,
    },
    /// The public Generative Language API with an API key.
    ApiKey(String),
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Auth error: {0}")]
    Auth(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Empty response from model")]
    EmptyResponse,
}

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    auth: GeminiAuth,
    model: String,
    base_url: Option<String>,
}

impl GeminiClient {
    pub fn new(client: Client, auth: GeminiAuth, model: impl Into<String>) -> Self {
        Self {
            client,
            auth,
            model: model.into(),
            base_url: None,
        }
    }

    /// Overrides the host part of the endpoint; the path stays the same.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        match &self.auth {
            GeminiAuth::Vertex {
                project_id,
                location,
            } => {
                let base = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| format!("https://{location}-aiplatform.googleapis.com"));
                format!(
                    "{base}/v1/projects/{project_id}/locations/{location}/publishers/google/models/{}:generateContent",
                    self.model
                )
            }
            GeminiAuth::ApiKey(_) => {
                let base = self
                    .base_url
                    .as_deref()
                    .unwrap_or("https://generativelanguage.googleapis.com");
                format!("{base}/v1beta/models/{}:generateContent", self.model)
            }
        }
    }

    #[tracing::instrument(skip_all, fields(model = %self.model, parts = parts.len()))]
    async fn generate_content(&self, parts: Vec<Part>) -> Result<SummaryResponse, GeminiError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let request = self
            .client
            .post(self.endpoint())
            .timeout(GENERATE_TIMEOUT)
            .json(&body);

        let request = match &self.auth {
            GeminiAuth::Vertex { .. } => {
                let token = market_settings::metadata::access_token(&self.client)
                    .await
                    .map_err(|e| GeminiError::Auth(format!("{e:#}")))?;
                request.bearer_auth(token)
            }
            GeminiAuth::ApiKey(key) => request.header("x-goog-api-key", key),
        };

        let resp = request
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, message });
        }

        let response = resp.json::<GenerateContentResponse>().await?;
        let summary = response.text().ok_or(GeminiError::EmptyResponse)?;

        Ok(SummaryResponse { summary })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(Blob),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Joins the text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let text = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();

        (!text.trim().is_empty()).then_some(text)
    }
}

impl Summarizer for GeminiClient {
    type Error = GeminiError;

    async fn summarize_text(&self, prompt: &str) -> Result<SummaryResponse, Self::Error> {
        self.generate_content(vec![Part::Text(prompt.to_string())])
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize transcript"))
    }

    async fn summarize_audio(
        &self,
        prompt: &str,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<SummaryResponse, Self::Error> {
        let parts = vec![
            Part::Text(prompt.to_string()),
            Part::InlineData(Blob {
                mime_type: mime_type.to_string(),
                data: STANDARD.encode(audio),
            }),
        ];

        self.generate_content(parts)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize audio"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_endpoint() {
        let client = GeminiClient::new(
            Client::new(),
            GeminiAuth::Vertex {
                project_id: "my-proj".into(),
                location: "asia-southeast1".into(),
            },
            "gemini-2.5-flash",
        );

        assert_eq!(
            client.endpoint(),
            "https://asia-southeast1-aiplatform.googleapis.com/v1/projects/my-proj/locations/\
             asia-southeast1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_api_key_endpoint_with_base_url() {
        let client = GeminiClient::new(
            Client::new(),
            GeminiAuth::ApiKey("k".into()),
            "gemini-2.5-flash",
        )
        .with_base_url("http://localhost:9000");

        assert_eq!(
            client.endpoint(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text("summarize".into()),
                    Part::InlineData(Blob {
                        mime_type: "audio/mp4".into(),
                        data: STANDARD.encode(b"abc"),
                    }),
                ],
            }],
            generation_config: GenerationConfig { temperature: 0.2 },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["contents"][0]["parts"][0]["text"], "summarize");
        assert_eq!(
            json["contents"][0]["parts"][1]["inlineData"]["mimeType"],
            "audio/mp4"
        );
        assert_eq!(json["contents"][0]["parts"][1]["inlineData"]["data"], "YWJj");
        assert!(json["generationConfig"]["temperature"].is_number());
    }

    #[test]
    fn test_response_text_joins_parts() {
        let body = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "**Equities** "}, {"text": "rose."}]}},
                {"content": {"parts": [{"text": "ignored"}]}}
            ],
            "usageMetadata": {"promptTokenCount": 10}
        }"#;
        let response = serde_json::from_str::<GenerateContentResponse>(body).unwrap();
        assert_eq!(response.text().as_deref(), Some("**Equities** rose."));
    }

    #[test]
    fn test_response_without_candidates_is_empty() {
        let response =
            serde_json::from_str::<GenerateContentResponse>(r#"{"promptFeedback": {}}"#).unwrap();
        assert!(response.text().is_none());
    }
}
