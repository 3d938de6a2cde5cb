//! # Yt Parser
//!
//! This module extracts the pieces of a YouTube watch page the pipeline
//! relies on: the `ytInitialPlayerResponse` blob (caption tracks and audio
//! streams), timed-text caption documents, and video ids from the various
//! URL shapes users paste into Slack.

use std::{ops::Deref, sync::LazyLock};

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::{error::Error, types::CaptionTrack};

static YT_PLAYER_RESPONSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)var\s+ytInitialPlayerResponse\s*=\s*(\{.*?\});\s*(?:var\s|</script>)")
        .unwrap()
});

static TIMED_TEXT_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<(?:text|p)\b[^>]*>(.*?)</(?:text|p)>").unwrap());

static INNER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static NUMERIC_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").unwrap());

static VIDEO_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(?:www\.|m\.)?(?:youtube\.com/watch\?[^\s<>|]+|youtu\.be/[^\s<>|?]+)")
        .unwrap()
});

/// Language codes treated as English when choosing a caption track, in
/// order of preference.
pub const ENGLISH_LANGUAGE_CODES: [&str; 3] = ["en", "en-US", "en-GB"];

pub struct YtHtmlDocument(String);

impl Deref for YtHtmlDocument {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl YtHtmlDocument {
    pub fn new(doc: String) -> Self {
        YtHtmlDocument(doc)
    }

    /// Deserializes the `ytInitialPlayerResponse` assignment of a watch page.
    pub fn to_json<T>(&self) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let raw = YT_PLAYER_RESPONSE_RE
            .captures(self)
            .and_then(|cap| cap.get(1))
            .ok_or(Error::ParseError(
                "Failed to find ytInitialPlayerResponse in the page's script tags",
            ))?;

        Ok(serde_json::from_str(raw.as_str())?)
    }
}

impl From<String> for YtHtmlDocument {
    fn from(value: String) -> Self {
        YtHtmlDocument(value)
    }
}

/// Picks the caption track to use.
///
/// Manually authored tracks in `languages` come first, then auto-generated
/// tracks in `languages`, then whichever track the provider lists first.
/// Within each tier `languages` order decides.
pub fn select_caption_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[&str],
) -> Option<&'a CaptionTrack> {
    let find = |generated: bool| {
        languages.iter().find_map(|lang| {
            tracks
                .iter()
                .find(|t| t.is_generated() == generated && t.language_code == *lang)
        })
    };

    find(false).or_else(|| find(true)).or_else(|| tracks.first())
}

/// Flattens a timed-text document into a single line of text, segments in
/// document order separated by single spaces.
pub fn parse_timed_text(xml: &str) -> String {
    TIMED_TEXT_SEGMENT_RE
        .captures_iter(xml)
        .filter_map(|cap| cap.get(1))
        .map(|m| INNER_TAG_RE.replace_all(m.as_str(), ""))
        .map(|segment| decode_entities(&segment))
        .map(|segment| segment.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decodes XML entities. Timed text is frequently double-escaped
/// (`&amp;#39;`), so `&amp;` is unescaped first.
pub fn decode_entities(text: &str) -> String {
    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'");

    NUMERIC_ENTITY_RE
        .replace_all(&text, |cap: &regex::Captures<'_>| {
            let code = &cap[1];
            let parsed = match code.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse::<u32>().ok(),
            };
            parsed
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| cap[0].to_string())
        })
        .into_owned()
}

/// Extracts the video id from a watch URL (`?v=`), a short `youtu.be/` URL,
/// or returns the input unchanged when it is neither.
pub fn video_id_from_url(url: &str) -> String {
    if let Some((_, rest)) = url.split_once("v=") {
        return rest.split('&').next().unwrap_or(rest).to_string();
    }
    if let Some((_, rest)) = url.split_once("youtu.be/") {
        return rest.split('?').next().unwrap_or(rest).to_string();
    }
    url.to_string()
}

/// Finds YouTube video URLs in free text such as slash command arguments.
/// Slack's `<url|label>` link markup is tolerated.
pub fn extract_video_urls(text: &str) -> Vec<String> {
    VIDEO_URL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Builds a `Cookie` header value from a Netscape-format cookies file,
/// keeping only cookies scoped to youtube.com.
pub fn cookie_header_from_netscape(contents: &str) -> Option<String> {
    let pairs = contents
        .lines()
        .map(|line| line.strip_prefix("#HttpOnly_").unwrap_or(line))
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let fields = line.split('\t').collect::<Vec<_>>();
            match fields.as_slice() {
                [domain, _, _, _, _, name, value] if domain.ends_with("youtube.com") => {
                    Some(format!("{}={}", name, value.trim_end()))
                }
                _ => None,
            }
        })
        .collect::<Vec<_>>();

    (!pairs.is_empty()).then(|| pairs.join("; "))
}
