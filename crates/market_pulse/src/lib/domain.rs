use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::TempDir;

pub const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch";

/// A discovered upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl Video {
    pub fn new(
        video_id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        let video_id = video_id.into();
        Video {
            url: watch_url(&video_id),
            video_id,
            title: title.into(),
            published_at,
        }
    }
}

pub fn watch_url(video_id: &str) -> String {
    format!("{YOUTUBE_WATCH_URL}?v={video_id}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
}

impl VideoMetadata {
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// Caption text of a single track, segments joined by single spaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language_code: Option<String>,
}

impl Transcript {
    pub fn new(text: impl Into<String>, language_code: impl Into<String>) -> Self {
        Transcript {
            text: text.into(),
            language_code: Some(language_code.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A downloaded audio track on disk.
///
/// The file is removed when the artifact is dropped, along with the scratch
/// directory it was downloaded into, if one was attached.
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    mime_type: String,
    scratch_dir: Option<TempDir>,
}

impl AudioArtifact {
    pub fn new(path: impl Into<PathBuf>, mime_type: impl Into<String>) -> Self {
        AudioArtifact {
            path: path.into(),
            mime_type: mime_type.into(),
            scratch_dir: None,
        }
    }

    /// Ties `dir` to the artifact's lifetime; partial downloads left in it go
    /// away with the artifact.
    pub fn in_scratch_dir(mut self, dir: TempDir) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub async fn read(&self) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(&self.path).await
    }
}

// scratch_dir is dropped, and removed, after this runs
impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }

        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(error = ?e, path = ?self.path, "Failed to clean up audio artifact");
        } else {
            tracing::debug!(path = ?self.path, "Cleaned up audio artifact");
        }
    }
}

/// Outcome for one video. `summary` carries an error description when
/// acquisition or summarization failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryResult {
    pub url: String,
    pub video_id: String,
    pub title: String,
    pub summary: String,
}

pub type AnalysisBatch = Vec<SummaryResult>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_new_builds_watch_url() {
        let video = Video::new("abc123", "Markets Wrap", Utc::now());
        assert_eq!(video.url, "https://www.youtube.com/watch?v=abc123");
    }

    #[test]
    fn test_only_empty_text_counts_as_missing() {
        let mut metadata = VideoMetadata {
            title: "t".into(),
            description: String::new(),
        };
        assert!(!metadata.has_description());

        metadata.description = "  \n ".into();
        assert!(metadata.has_description());

        assert!(Transcript::default().is_empty());
        assert!(!Transcript::new(" ", "en").is_empty());
    }

    #[tokio::test]
    async fn test_audio_artifact_removed_on_drop() {
        let dir = std::env::temp_dir().join("market-pulse-artifact-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("drop-me.m4a");
        std::fs::write(&path, b"fake audio").unwrap();

        let artifact = AudioArtifact::new(&path, "audio/mp4");
        assert_eq!(artifact.read().await.unwrap(), b"fake audio");
        assert_eq!(artifact.mime_type(), "audio/mp4");

        drop(artifact);
        assert!(!path.exists(), "artifact file should be deleted on drop");
    }

    #[test]
    fn test_audio_artifact_removes_scratch_dir() {
        let scratch = tempfile::tempdir().unwrap();
        let scratch_path = scratch.path().to_path_buf();
        let path = scratch_path.join("x1.m4a");
        std::fs::write(&path, b"fake audio").unwrap();
        std::fs::write(scratch_path.join("x1.webm.part"), b"partial").unwrap();

        let artifact = AudioArtifact::new(&path, "audio/mp4").in_scratch_dir(scratch);
        drop(artifact);

        assert!(!scratch_path.exists(), "scratch dir and leftovers should be removed");
    }

    #[test]
    fn test_audio_artifact_drop_tolerates_missing_file() {
        let artifact = AudioArtifact::new("/nonexistent/market-pulse/missing.m4a", "audio/mp4");
        drop(artifact);
    }
}
