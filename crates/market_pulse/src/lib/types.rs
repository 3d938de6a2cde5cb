//! Wire types for the YouTube Data API v3 and the watch page's
//! `ytInitialPlayerResponse`.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelItem {
    pub id: String,
    pub snippet: ChannelSnippet,
}

#[derive(Debug, Deserialize)]
pub struct ChannelSnippet {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
    pub snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchItemId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSnippet {
    pub title: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct VideoItem {
    pub snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResponse {
    pub captions: Option<Captions>,
    pub streaming_data: Option<StreamingData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Captions {
    pub player_captions_tracklist_renderer: Option<CaptionTracklist>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTracklist {
    #[serde(default)]
    pub caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    /// `Some("asr")` for auto-generated tracks.
    pub kind: Option<String>,
}

impl CaptionTrack {
    pub fn is_generated(&self) -> bool {
        self.kind.as_deref() == Some("asr")
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamingData {
    #[serde(default)]
    pub adaptive_formats: Vec<AdaptiveFormat>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveFormat {
    pub itag: u32,
    /// Absent when the stream is signature-ciphered.
    pub url: Option<String>,
    pub mime_type: String,
    #[serde(default)]
    pub bitrate: u64,
}

impl AdaptiveFormat {
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    /// MIME type without codec parameters, e.g. `audio/mp4`.
    pub fn container_mime(&self) -> &str {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or(&self.mime_type)
            .trim()
    }
}
