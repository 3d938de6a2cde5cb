pub mod audio_handler;
pub mod data_api;
pub mod scraper;

use std::{future::Future, path::Path};

use crate::domain::{AudioArtifact, Transcript, Video, VideoMetadata};

/// Lists a channel's most recent uploads.
pub trait ChannelScraper {
    /// Returns at most `max_results` videos, newest first. An unresolvable
    /// handle yields an empty list rather than an error.
    fn latest_videos(
        &self,
        channel_handle: &str,
        max_results: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<Video>>> + Send;
}

pub trait MetadataSource {
    fn video_metadata(
        &self,
        video_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<VideoMetadata>>> + Send;
}

pub trait TranscriptSource {
    fn transcript(&self, video_id: &str) -> impl Future<Output = anyhow::Result<Transcript>> + Send;
}

pub trait AudioHandler {
    const BASE_URL: &str;

    /// Downloads the audio track of `video_id` into `audio_dl_path`.
    fn download(
        &self,
        video_id: &str,
        audio_dl_path: &Path,
    ) -> impl Future<Output = anyhow::Result<AudioArtifact>> + Send;
}
