use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::{
    domain::{Video, VideoMetadata},
    types::{ApiErrorBody, ChannelItem, ListResponse, SearchItem, VideoItem},
    yt::{ChannelScraper, MetadataSource},
};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// YouTube Data API v3 client (API-key authenticated).
#[derive(Debug, Clone)]
pub struct YouTubeDataClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeDataClient {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://www.googleapis.com/youtube/v3".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    // header, not query: request urls end up in error messages
    fn request(&self, resource: &str, query: &[(&str, &str)]) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}/{}", self.base_url, resource))
            .header(API_KEY_HEADER, &self.api_key)
            .query(query)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> anyhow::Result<T> {
        let resp = self
            .request(resource, query)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .with_context(|| format!("Failed to call YouTube {resource}.list API"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);

            if status == 403 || message.to_lowercase().contains("blocked") {
                tracing::error!(
                    status,
                    %message,
                    "YouTube API key blocked or restricted. Check the key's API restrictions in \
                     the GCP console (APIs & Services -> Credentials) and make sure \
                     'YouTube Data API v3' is enabled and allowed."
                );
            }

            anyhow::bail!("YouTube API error: {message} ({status})");
        }

        resp.json::<T>()
            .await
            .with_context(|| format!("Failed to parse YouTube {resource}.list response"))
    }
}

impl ChannelScraper for YouTubeDataClient {
    #[tracing::instrument(skip(self))]
    async fn latest_videos(
        &self,
        channel_handle: &str,
        max_results: usize,
    ) -> anyhow::Result<Vec<Video>> {
        if self.api_key.is_empty() {
            tracing::error!("YOUTUBE_API_KEY not configured; cannot discover videos");
            return Ok(Vec::new());
        }

        let handle = channel_handle.trim_start_matches('@');
        let channels = self
            .get::<ListResponse<ChannelItem>>(
                "channels",
                &[("part", "id,snippet"), ("forHandle", handle)],
            )
            .await?;

        let Some(channel) = channels.items.into_iter().next() else {
            tracing::error!(%channel_handle, "Could not resolve YouTube handle");
            return Ok(Vec::new());
        };
        tracing::info!(
            %channel_handle,
            channel_id = %channel.id,
            channel_name = %channel.snippet.title,
            "Resolved channel handle"
        );

        let max_results = max_results.to_string();
        let search = self
            .get::<ListResponse<SearchItem>>(
                "search",
                &[
                    ("part", "id,snippet"),
                    ("channelId", channel.id.as_str()),
                    ("order", "date"),
                    ("type", "video"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let videos = search
            .items
            .into_iter()
            .filter_map(|item| {
                let video_id = item.id.video_id?;
                Some(Video::new(
                    video_id,
                    item.snippet.title,
                    item.snippet.published_at,
                ))
            })
            .collect::<Vec<_>>();

        tracing::info!(count = videos.len(), channel_name = %channel.snippet.title, "Found latest videos");
        for video in &videos {
            tracing::info!(title = %video.title, published_at = %video.published_at, "Discovered video");
        }

        Ok(videos)
    }
}

impl MetadataSource for YouTubeDataClient {
    #[tracing::instrument(skip(self))]
    async fn video_metadata(&self, video_id: &str) -> anyhow::Result<Option<VideoMetadata>> {
        if self.api_key.is_empty() {
            tracing::warn!("YOUTUBE_API_KEY not configured, skipping metadata fetch");
            return Ok(None);
        }

        let videos = self
            .get::<ListResponse<VideoItem>>("videos", &[("part", "snippet"), ("id", video_id)])
            .await?;

        Ok(videos.items.into_iter().next().map(|item| VideoMetadata {
            title: item.snippet.title,
            description: item.snippet.description,
        }))
    }
}
