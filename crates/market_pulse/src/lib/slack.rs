use std::{future::Future, time::Duration};

use serde::Deserialize;
use serde_json::json;

const SLACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A channel id, posted through `chat.postMessage`.
    Channel(String),
    /// The deferred `response_url` of a slash command.
    ResponseUrl(String),
}

/// Posts chat messages. Delivery is best effort: failures are logged by the
/// implementation and never surfaced to callers.
pub trait Notifier {
    fn deliver(&self, destination: &Destination, text: &str) -> impl Future<Output = ()> + Send;
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SlackClient {
    client: reqwest::Client,
    bot_token: String,
    base_url: String,
}

impl SlackClient {
    pub fn new(client: reqwest::Client, bot_token: impl Into<String>) -> Self {
        Self {
            client,
            bot_token: bot_token.into(),
            base_url: "https://slack.com/api".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    #[tracing::instrument(skip(self, text))]
    async fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(format!("{}/chat.postMessage", self.base_url))
            .bearer_auth(&self.bot_token)
            .timeout(SLACK_TIMEOUT)
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await?
            .json::<PostMessageResponse>()
            .await?;

        if !resp.ok {
            anyhow::bail!("Slack API error: {}", resp.error.unwrap_or_default());
        }

        tracing::info!(%channel, "Posted message to Slack");
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    async fn post_response(&self, response_url: &str, text: &str) -> anyhow::Result<()> {
        self.client
            .post(response_url)
            .timeout(SLACK_TIMEOUT)
            .json(&json!({
                "text": text,
                "replace_original": "false",
                "response_type": "in_channel",
            }))
            .send()
            .await?
            .error_for_status()?;

        tracing::info!("Posted slash command response");
        Ok(())
    }
}

impl Notifier for SlackClient {
    async fn deliver(&self, destination: &Destination, text: &str) {
        let result = match destination {
            Destination::Channel(channel) => self.post_message(channel, text).await,
            Destination::ResponseUrl(url) => self.post_response(url, text).await,
        };

        if let Err(e) = result {
            tracing::error!(error = ?e, ?destination, "Failed to deliver Slack message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_message_response_error() {
        let resp = serde_json::from_str::<PostMessageResponse>(
            r#"{"ok": false, "error": "channel_not_found"}"#,
        )
        .unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.error.as_deref(), Some("channel_not_found"));
    }

    #[tokio::test]
    async fn test_deliver_swallows_transport_errors() {
        let slack = SlackClient::new(reqwest::Client::new(), "xoxb-test")
            .with_base_url("http://127.0.0.1:9/api");

        // unreachable host; must return without panicking
        slack
            .deliver(&Destination::Channel("C123".into()), "hello")
            .await;
        slack
            .deliver(
                &Destination::ResponseUrl("http://127.0.0.1:9/hook".into()),
                "hello",
            )
            .await;
    }
}
