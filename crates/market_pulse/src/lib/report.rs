use std::fmt::Write;

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::domain::SummaryResult;

pub const NO_MARKET_NEWS: &str = "❌ No market news found or processed.";
pub const NO_VIDEOS_MESSAGE: &str = "📭 No new Bloomberg Market videos found today.";
pub const SIGNATURE: &str = "_🤖 Automated GCP Market Summary Agent v2.0_";
const SEPARATOR: &str = "───────────────────────────";

/// Today's date in the report timezone.
pub fn report_date(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Renders a batch as one Slack mrkdwn message.
pub fn format_report(batch: &[SummaryResult], date: NaiveDate) -> String {
    if batch.is_empty() {
        return NO_MARKET_NEWS.to_string();
    }

    let mut msg = format!("*📅 Market Quick Take — {}*\n\n", date.format("%Y-%m-%d"));

    for (i, result) in batch.iter().enumerate() {
        let _ = writeln!(msg, "*📹 Source {}: \"{}\"*", i + 1, result.title);
        if !result.url.is_empty() {
            let _ = write!(msg, "🔗 {}\n\n", result.url);
        }
        let _ = write!(msg, "{}\n\n", result.summary.trim());
        let _ = write!(msg, "{SEPARATOR}\n\n");
    }

    msg.push_str(SIGNATURE);
    msg
}

pub fn scheduled_failure_message(reason: &str) -> String {
    format!("❌ *Market Summary Failed*\nReason: `{reason}`")
}

pub fn manual_failure_message(reason: &str) -> String {
    format!("❌ Failed to process market news: `{reason}`")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, title: &str, summary: &str) -> SummaryResult {
        SummaryResult {
            url: format!("https://www.youtube.com/watch?v={id}"),
            video_id: id.into(),
            title: title.into(),
            summary: summary.into(),
        }
    }

    #[test]
    fn test_empty_batch() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        assert_eq!(format_report(&[], date), NO_MARKET_NEWS);
    }

    #[test]
    fn test_two_results() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let batch = vec![
            result("a1", "Stocks Rally", "  Equities up.\n"),
            result("b2", "Market Update", "Error during summarization: boom"),
        ];

        let expected = "*📅 Market Quick Take — 2026-10-16*\n\n\
             *📹 Source 1: \"Stocks Rally\"*\n\
             🔗 https://www.youtube.com/watch?v=a1\n\n\
             Equities up.\n\n\
             ───────────────────────────\n\n\
             *📹 Source 2: \"Market Update\"*\n\
             🔗 https://www.youtube.com/watch?v=b2\n\n\
             Error during summarization: boom\n\n\
             ───────────────────────────\n\n\
             _🤖 Automated GCP Market Summary Agent v2.0_";

        assert_eq!(format_report(&batch, date), expected);
    }

    #[test]
    fn test_failure_messages() {
        assert_eq!(
            scheduled_failure_message("boom"),
            "❌ *Market Summary Failed*\nReason: `boom`"
        );
        assert_eq!(
            manual_failure_message("boom"),
            "❌ Failed to process market news: `boom`"
        );
    }
}
