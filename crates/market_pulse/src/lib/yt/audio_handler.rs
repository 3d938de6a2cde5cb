use std::{
    cmp::Reverse,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::Context;
use itertools::Itertools;
use tokio::process::Command;

use crate::{
    domain::{watch_url, AudioArtifact},
    types::AdaptiveFormat,
    yt::{scraper::WatchPageScraper, AudioHandler},
};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Primary extraction: the `yt-dlp` executable, best audio re-muxed to m4a.
#[derive(Debug, Clone)]
pub struct YtDlpAudioHandler {
    executable: PathBuf,
    cookies_path: Option<PathBuf>,
    timeout: Duration,
}

impl Default for YtDlpAudioHandler {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("yt-dlp"),
            cookies_path: None,
            timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

impl YtDlpAudioHandler {
    pub fn new(cookies_path: Option<PathBuf>) -> Self {
        Self {
            cookies_path,
            ..Default::default()
        }
    }

    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, video_url: &str, output_template: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(video_url)
            .args(["-f", "bestaudio/best"])
            .args(["--extract-audio", "--audio-format", "m4a"])
            .args(["--no-playlist", "--quiet", "--no-warnings"])
            .args(["--user-agent", USER_AGENT])
            .args(["--add-header", "Accept-Language:en-US,en;q=0.9"])
            .arg("-o")
            .arg(output_template)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(cookies) = &self.cookies_path {
            cmd.arg("--cookies").arg(cookies);
        }

        cmd
    }
}

impl AudioHandler for YtDlpAudioHandler {
    const BASE_URL: &'static str = "https://www.youtube.com/watch";

    #[tracing::instrument(skip(self))]
    async fn download(&self, video_id: &str, audio_dl_path: &Path) -> anyhow::Result<AudioArtifact> {
        let video_url = format!("{}?v={}", Self::BASE_URL, video_id);
        let audio_output_template = audio_dl_path.join(format!("{video_id}.%(ext)s"));
        let audio_m4a_path = audio_dl_path.join(format!("{video_id}.m4a"));

        let output = tokio::time::timeout(
            self.timeout,
            self.command(&video_url, &audio_output_template).output(),
        )
        .await
        .context("yt-dlp timed out")?
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to spawn yt-dlp"))
        .context("Failed to spawn yt-dlp")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp exited with {}: {}", output.status, stderr.trim());
        }

        if !audio_m4a_path.exists() {
            anyhow::bail!(
                "yt-dlp did not produce expected file: {}",
                audio_m4a_path.display()
            );
        }

        Ok(AudioArtifact::new(audio_m4a_path, "audio/mp4"))
    }
}

/// Secondary extraction: downloads an audio-only adaptive stream straight
/// from the URLs listed in the watch page's player response.
///
/// Only streams with a plain `url` qualify; signature-ciphered ones are
/// skipped.
#[derive(Debug, Clone)]
pub struct PlayerStreamAudioHandler {
    scraper: WatchPageScraper,
    timeout: Duration,
}

impl PlayerStreamAudioHandler {
    pub fn new(scraper: WatchPageScraper) -> Self {
        Self {
            scraper,
            timeout: DOWNLOAD_TIMEOUT,
        }
    }
}

impl AudioHandler for PlayerStreamAudioHandler {
    const BASE_URL: &'static str = "https://www.youtube.com/watch";

    #[tracing::instrument(skip(self))]
    async fn download(&self, video_id: &str, audio_dl_path: &Path) -> anyhow::Result<AudioArtifact> {
        let player = self.scraper.player_response(video_id).await?;

        let formats = player
            .streaming_data
            .map(|s| s.adaptive_formats)
            .unwrap_or_default();
        let format = preferred_audio_format(formats)
            .context("No directly downloadable audio stream in player response")?;

        let mime_type = format.container_mime().to_string();
        let extension = if mime_type == "audio/mp4" { "m4a" } else { "webm" };
        let stream_url = format.url.unwrap_or_default();
        tracing::info!(itag = format.itag, %mime_type, "Downloading audio stream");

        let bytes = self
            .scraper
            .client()
            .get(&stream_url)
            .header("User-Agent", USER_AGENT)
            .header("Referer", watch_url(video_id))
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()
            .context("Audio stream request failed")?
            .bytes()
            .await?;

        let path = audio_dl_path.join(format!("{video_id}.{extension}"));
        // owned from here on, so a failed write still cleans up
        let artifact = AudioArtifact::new(&path, mime_type);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(artifact)
    }
}

/// Picks the audio-only stream to download: mp4 first, then the highest
/// bitrate. Ciphered streams have no `url` and are never picked.
pub fn preferred_audio_format(formats: Vec<AdaptiveFormat>) -> Option<AdaptiveFormat> {
    formats
        .into_iter()
        .filter(|f| f.is_audio() && f.url.is_some())
        .sorted_by_key(|f| (f.container_mime() != "audio/mp4", Reverse(f.bitrate)))
        .next()
}

/// Tries `primary`, then `secondary`. Each is a distinct strategy; neither
/// is retried.
#[derive(Debug, Clone)]
pub struct Fallback<P, S> {
    pub primary: P,
    pub secondary: S,
}

impl<P, S> Fallback<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self { primary, secondary }
    }
}

impl<P, S> AudioHandler for Fallback<P, S>
where
    P: AudioHandler + Send + Sync,
    S: AudioHandler + Send + Sync,
{
    const BASE_URL: &'static str = P::BASE_URL;

    async fn download(&self, video_id: &str, audio_dl_path: &Path) -> anyhow::Result<AudioArtifact> {
        match self.primary.download(video_id, audio_dl_path).await {
            Ok(artifact) => Ok(artifact),
            Err(primary_err) => {
                tracing::warn!(error = ?primary_err, %video_id, "Primary audio extraction failed");
                self.secondary
                    .download(video_id, audio_dl_path)
                    .await
                    .inspect_err(
                        |e| tracing::warn!(error = ?e, %video_id, "Secondary audio extraction failed"),
                    )
                    .with_context(|| format!("primary extraction failed first: {primary_err:#}"))
            }
        }
    }
}
