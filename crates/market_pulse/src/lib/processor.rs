use std::{
    fmt::{self, Display},
    fs::remove_dir_all,
    future::Future,
    path::{Path, PathBuf},
};

use anyhow::Context;
use tempfile::TempDir;

use crate::{
    domain::{AnalysisBatch, SummaryResult, VideoMetadata},
    llm::prompt::{audio_prompt, text_prompt},
    parser::video_id_from_url,
    yt::{AudioHandler, ChannelScraper, MetadataSource, TranscriptSource},
    Summarizer,
};

pub mod builder;

pub const DEFAULT_TITLE: &str = "Market Update";
pub const AUDIO_EXTRACTION_FAILED: &str =
    "Error: All audio extraction methods failed (yt-dlp and direct stream).";

/// Runs the market news pipeline over a batch of videos.
pub trait MarketAnalyzer {
    /// Analyzes the given watch URLs in order, one result per URL.
    fn run_manual(
        &self,
        urls: &[String],
    ) -> impl Future<Output = anyhow::Result<AnalysisBatch>> + Send;

    /// Discovers the latest `max_videos` uploads of `channel_handle` and
    /// analyzes them. Nothing discovered yields an empty batch.
    fn run_scheduled(
        &self,
        channel_handle: &str,
        max_videos: usize,
    ) -> impl Future<Output = anyhow::Result<AnalysisBatch>> + Send;
}

/// Why a video has no real summary. Rendered into the result text.
#[derive(Debug)]
enum SummaryFailure {
    AudioUnavailable,
    Text(String),
    Audio(String),
}

impl Display for SummaryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryFailure::AudioUnavailable => f.write_str(AUDIO_EXTRACTION_FAILED),
            SummaryFailure::Text(e) => write!(f, "Error during summarization: {e}"),
            SummaryFailure::Audio(e) => {
                write!(f, "Error: Audio extracted but summarization failed: {e}")
            }
        }
    }
}

// Metadata, transcript and audio acquisition followed by summarization
#[derive(Debug)]
pub struct MarketNewsProcessor<P, M, T, A, S>
where
    P: ChannelScraper + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    workdir: PathBuf,
    transcript_char_limit: usize,
    channel_scraper: P,
    metadata_source: M,
    transcript_source: T,
    audio_handler: A,
    summarizer: S,
}

impl<P, M, T, A, S> MarketNewsProcessor<P, M, T, A, S>
where
    P: ChannelScraper + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    fn audio_dir(&self) -> PathBuf {
        self.workdir.join("audio")
    }

    /// Acquires content for one video and summarizes it. Never fails: every
    /// problem ends up in the returned summary text.
    #[tracing::instrument(skip(self))]
    pub async fn analyze_video(&self, url: &str) -> SummaryResult {
        let video_id = video_id_from_url(url);

        let metadata = self
            .metadata_source
            .video_metadata(&video_id)
            .await
            .inspect_err(|e| tracing::warn!(error = ?e, %video_id, "Failed to fetch metadata"))
            .ok()
            .flatten();

        let transcript = self
            .transcript_source
            .transcript(&video_id)
            .await
            .inspect_err(|e| tracing::warn!(error = ?e, %video_id, "Failed to fetch transcript"))
            .unwrap_or_default();

        let has_description = metadata.as_ref().is_some_and(VideoMetadata::has_description);

        let summary = if !transcript.is_empty() || has_description {
            tracing::info!(%video_id, has_transcript = !transcript.is_empty(), "Summarizing text");
            let prompt = text_prompt(metadata.as_ref(), &transcript, self.transcript_char_limit);
            self.summarizer
                .summarize_text(&prompt)
                .await
                .map(|r| r.summary)
                .map_err(|e| SummaryFailure::Text(e.to_string()))
        } else {
            tracing::info!(%video_id, "No transcript or description, falling back to audio");
            self.summarize_via_audio(&video_id, metadata.as_ref()).await
        };

        let summary = summary.unwrap_or_else(|failure| {
            tracing::error!(%video_id, error = %failure, "Video not summarized");
            failure.to_string()
        });

        let title = metadata
            .map(|m| m.title)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        SummaryResult {
            url: url.to_string(),
            video_id,
            title,
            summary,
        }
    }

    #[tracing::instrument(skip(self, metadata))]
    async fn summarize_via_audio(
        &self,
        video_id: &str,
        metadata: Option<&VideoMetadata>,
    ) -> Result<String, SummaryFailure> {
        let scratch_dir = self
            .scratch_dir(video_id)
            .await
            .inspect_err(|e| tracing::warn!(error = ?e, "Audio scratch directory unavailable"))
            .map_err(|_| SummaryFailure::AudioUnavailable)?;

        // a failed download takes its partial files with the scratch dir
        let artifact = self
            .audio_handler
            .download(video_id, scratch_dir.path())
            .await
            .inspect_err(|e| tracing::warn!(error = ?e, "Audio extraction failed"))
            .map_err(|_| SummaryFailure::AudioUnavailable)?
            .in_scratch_dir(scratch_dir);

        // artifact is dropped, and its files removed, on every return below
        let audio = artifact
            .read()
            .await
            .map_err(|e| SummaryFailure::Audio(e.to_string()))?;

        let prompt = audio_prompt(metadata);
        let response = self
            .summarizer
            .summarize_audio(&prompt, &audio, artifact.mime_type())
            .await
            .map_err(|e| SummaryFailure::Audio(e.to_string()))?;

        Ok(response.summary)
    }

    /// A fresh directory under the audio dir, owned by one acquisition.
    async fn scratch_dir(&self, video_id: &str) -> anyhow::Result<TempDir> {
        let dir = self.audio_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create audio directory {}", dir.display()))?;

        tempfile::Builder::new()
            .prefix(&format!("{video_id}-"))
            .tempdir_in(&dir)
            .with_context(|| format!("Failed to create scratch directory in {}", dir.display()))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl<P, M, T, A, S> MarketAnalyzer for MarketNewsProcessor<P, M, T, A, S>
where
    P: ChannelScraper + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    #[tracing::instrument(skip(self))]
    async fn run_manual(&self, urls: &[String]) -> anyhow::Result<AnalysisBatch> {
        let mut batch = Vec::with_capacity(urls.len());
        for url in urls {
            batch.push(self.analyze_video(url).await);
        }

        tracing::info!(count = batch.len(), "Analysis batch complete");
        Ok(batch)
    }

    #[tracing::instrument(skip(self))]
    async fn run_scheduled(
        &self,
        channel_handle: &str,
        max_videos: usize,
    ) -> anyhow::Result<AnalysisBatch> {
        let videos = self
            .channel_scraper
            .latest_videos(channel_handle, max_videos)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Video discovery failed"))
            .unwrap_or_default();

        if videos.is_empty() {
            tracing::warn!(%channel_handle, "No videos discovered, nothing to summarize");
            return Ok(Vec::new());
        }

        let urls = videos.into_iter().map(|v| v.url).collect::<Vec<_>>();
        self.run_manual(&urls).await
    }
}

impl<P, M, T, A, S> Drop for MarketNewsProcessor<P, M, T, A, S>
where
    P: ChannelScraper + Send + Sync + 'static,
    M: MetadataSource + Send + Sync + 'static,
    T: TranscriptSource + Send + Sync + 'static,
    A: AudioHandler + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let audio_path = self.audio_dir();

        if audio_path.exists() {
            if let Err(e) = remove_dir_all(&audio_path) {
                tracing::warn!(error = ?e, path = ?audio_path, "Failed to clean up audio directory");
            } else {
                tracing::info!(path = ?audio_path, "Cleaned up audio directory");
            }
        }
    }
}
