use std::path::Path;

use anyhow::Context;

use crate::{
    domain::{Transcript, YOUTUBE_WATCH_URL},
    parser::{
        cookie_header_from_netscape, parse_timed_text, select_caption_track, YtHtmlDocument,
        ENGLISH_LANGUAGE_CODES,
    },
    types::PlayerResponse,
    yt::TranscriptSource,
};

/// Reads the public watch page of a video. Source of caption tracks and of
/// directly downloadable audio streams.
#[derive(Debug, Clone)]
pub struct WatchPageScraper {
    client: reqwest::Client,
    watch_url: String,
    cookie_header: Option<String>,
}

impl WatchPageScraper {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            watch_url: YOUTUBE_WATCH_URL.into(),
            cookie_header: None,
        }
    }

    pub fn with_watch_url(mut self, url: impl Into<String>) -> Self {
        self.watch_url = url.into();
        self
    }

    /// Sends the youtube.com cookies of a Netscape cookies file with every
    /// watch page request. Cloud IP ranges are often blocked without them.
    pub fn with_cookies_file(mut self, path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cookies file {}", path.display()))?;
        self.cookie_header = cookie_header_from_netscape(&contents);
        if self.cookie_header.is_none() {
            tracing::warn!(path = %path.display(), "Cookies file holds no youtube.com cookies");
        } else {
            tracing::info!(path = %path.display(), "Loaded YouTube cookies");
        }
        Ok(self)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Loads the watch page html document
    #[tracing::instrument(skip(self))]
    async fn fetch_watch_page(&self, video_id: &str) -> anyhow::Result<YtHtmlDocument> {
        let mut request = self
            .client
            .get(&self.watch_url)
            .query(&[("v", video_id)])
            .header("Accept-Language", "en-US,en;q=0.9");

        if let Some(cookies) = &self.cookie_header {
            request = request.header(reqwest::header::COOKIE, cookies);
        }

        let doc = request
            .send()
            .await?
            .error_for_status()
            .context("Watch page request failed")?
            .text()
            .await?;

        Ok(doc.into())
    }

    /// Parses the `ytInitialPlayerResponse` of the video's watch page
    pub async fn player_response(&self, video_id: &str) -> anyhow::Result<PlayerResponse> {
        let doc = self.fetch_watch_page(video_id).await?;
        let player = doc.to_json::<PlayerResponse>()?;
        Ok(player)
    }
}

impl TranscriptSource for WatchPageScraper {
    #[tracing::instrument(skip(self))]
    async fn transcript(&self, video_id: &str) -> anyhow::Result<Transcript> {
        let player = self.player_response(video_id).await?;

        let tracks = player
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .map(|r| r.caption_tracks)
            .unwrap_or_default();

        let Some(track) = select_caption_track(&tracks, &ENGLISH_LANGUAGE_CODES) else {
            tracing::warn!(%video_id, "No transcripts available");
            return Ok(Transcript::default());
        };
        tracing::info!(
            %video_id,
            language_code = %track.language_code,
            generated = track.is_generated(),
            "Selected caption track"
        );

        let xml = self
            .client
            .get(&track.base_url)
            .send()
            .await?
            .error_for_status()
            .context("Caption track request failed")?
            .text()
            .await?;

        let text = parse_timed_text(&xml);
        tracing::info!(%video_id, chars = text.chars().count(), "Transcript fetched");

        Ok(Transcript::new(text, track.language_code.clone()))
    }
}
