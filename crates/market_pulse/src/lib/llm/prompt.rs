use std::fmt::Write;

use crate::domain::{Transcript, VideoMetadata};

const MARKET_QUICK_TAKE: &str = include_str!("./prompts/market_quick_take.txt");

const ANALYST_ROLE: &str =
    "You are a senior financial market analyst producing a structured daily market briefing.";

pub const DEFAULT_TRANSCRIPT_CHAR_LIMIT: usize = 30_000;
pub const DESCRIPTION_CHAR_LIMIT: usize = 1_000;

/// Returns the first `limit` characters of `s`, never splitting a code point.
pub fn truncate_chars(s: &str, limit: usize) -> &str {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn metadata_block(metadata: Option<&VideoMetadata>) -> String {
    let Some(metadata) = metadata else {
        return String::new();
    };

    let title = if metadata.title.is_empty() {
        "N/A"
    } else {
        metadata.title.as_str()
    };
    let description = if metadata.has_description() {
        truncate_chars(&metadata.description, DESCRIPTION_CHAR_LIMIT)
    } else {
        "N/A"
    };

    format!("Title: {title}\nDescription: {description}\n")
}

/// Prompt for the text path: metadata plus the transcript, cut to
/// `transcript_char_limit` characters.
pub fn text_prompt(
    metadata: Option<&VideoMetadata>,
    transcript: &Transcript,
    transcript_char_limit: usize,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{ANALYST_ROLE}");
    let _ = writeln!(prompt, "Below is information from a market news video.\n");
    let _ = writeln!(prompt, "{}", metadata_block(metadata));
    let _ = writeln!(prompt, "Transcript (if available):");
    let _ = writeln!(
        prompt,
        "{}\n",
        truncate_chars(&transcript.text, transcript_char_limit)
    );
    prompt.push_str(&MARKET_QUICK_TAKE.replace("{source}", "transcript"));
    prompt
}

/// Prompt for the audio path. The audio itself travels as a separate part.
pub fn audio_prompt(metadata: Option<&VideoMetadata>) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "{ANALYST_ROLE}");
    let _ = writeln!(prompt, "I have provided the audio of a market news video.\n");
    if metadata.is_some() {
        let _ = writeln!(
            prompt,
            "Context from Video Metadata:\n{}",
            metadata_block(metadata)
        );
    }
    prompt.push_str(&MARKET_QUICK_TAKE.replace("{source}", "audio"));
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_code_points() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("📈📉📈", 1), "📈");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_text_prompt_truncates_long_transcript() {
        let long = "a".repeat(35_000);
        let transcript = Transcript::new(long, "en");

        let prompt = text_prompt(None, &transcript, DEFAULT_TRANSCRIPT_CHAR_LIMIT);

        assert!(prompt.contains(&"a".repeat(30_000)));
        assert!(!prompt.contains(&"a".repeat(30_001)));
    }

    #[test]
    fn test_text_prompt_keeps_short_transcript_verbatim() {
        let transcript = Transcript::new("Stocks rose on Fed optimism.", "en");
        let prompt = text_prompt(None, &transcript, DEFAULT_TRANSCRIPT_CHAR_LIMIT);

        assert!(prompt.contains("Transcript (if available):\nStocks rose on Fed optimism.\n"));
        assert!(prompt.contains("Extract as much detail as possible from the transcript."));
    }

    #[test]
    fn test_description_is_cut_to_limit() {
        let metadata = VideoMetadata {
            title: "Markets Wrap".into(),
            description: "d".repeat(1_500),
        };
        let prompt = text_prompt(Some(&metadata), &Transcript::default(), 10);

        assert!(prompt.contains("Title: Markets Wrap\n"));
        assert!(prompt.contains(&format!("Description: {}\n", "d".repeat(1_000))));
        assert!(!prompt.contains(&"d".repeat(1_001)));
    }

    #[test]
    fn test_audio_prompt_mentions_audio_and_context() {
        let metadata = VideoMetadata {
            title: "Bloomberg Surveillance".into(),
            description: String::new(),
        };
        let prompt = audio_prompt(Some(&metadata));

        assert!(prompt.contains("I have provided the audio"));
        assert!(prompt.contains("Context from Video Metadata:\nTitle: Bloomberg Surveillance\n"));
        assert!(prompt.contains("Description: N/A"));
        assert!(prompt.contains("from the audio."));
        assert!(!prompt.contains("Transcript (if available)"));
    }

    #[test]
    fn test_audio_prompt_without_metadata() {
        let prompt = audio_prompt(None);
        assert!(!prompt.contains("Context from Video Metadata"));
        assert!(prompt.contains("**Earnings**"));
    }
}
