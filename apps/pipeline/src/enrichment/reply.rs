//! Best-effort grammar for the model's `Summary: / Score: / Follow-Ups:` reply.

use thiserror::Error;
use tracing::warn;

use crate::llm_client::prompts::{FOLLOW_UPS_MARKER, SCORE_MARKER, SUMMARY_MARKER};

const MIN_SCORE: u32 = 1;
const MAX_SCORE: u32 = 10;
const FOLLOW_UP_BULLET: char = '•';

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReplyParseError {
    #[error("reply has no '{0}' section")]
    MissingMarker(&'static str),

    #[error("score '{0}' contains no digits")]
    NoScoreDigits(String),
}

/// The three values written back to the applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub summary: String,
    pub score: u8,
    pub follow_ups: String,
}

impl Default for Enrichment {
    fn default() -> Self {
        Self {
            summary: String::new(),
            score: MIN_SCORE as u8,
            follow_ups: String::new(),
        }
    }
}

/// Strips surrounding whitespace and `*` / `-` decoration.
fn clean(s: &str) -> &str {
    s.trim().trim_matches('*').trim_matches('-').trim()
}

/// Text following the last occurrence of `marker`.
fn after_last<'a>(text: &'a str, marker: &'static str) -> Result<&'a str, ReplyParseError> {
    text.rfind(marker)
        .map(|at| &text[at + marker.len()..])
        .ok_or(ReplyParseError::MissingMarker(marker))
}

/// `section` up to the first `marker`, or all of it.
fn up_to<'a>(section: &'a str, marker: &str) -> &'a str {
    section.find(marker).map_or(section, |at| &section[..at])
}

/// Reduces score text to its digits and clamps to 1..=10. A `-` right before
/// the first digit reads as a negative score.
pub fn parse_score(raw: &str) -> Result<u8, ReplyParseError> {
    let first_digit = raw
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| ReplyParseError::NoScoreDigits(clean(raw).to_string()))?;
    if raw[..first_digit].ends_with('-') {
        return Ok(MIN_SCORE as u8);
    }

    let value = raw
        .chars()
        .filter_map(|c| c.to_digit(10))
        .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(d));
    Ok(value.clamp(MIN_SCORE, MAX_SCORE) as u8)
}

fn format_follow_ups(raw: &str) -> String {
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| format!("{FOLLOW_UP_BULLET}{}", clean(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Each section starts after the last occurrence of its marker, so a reply
/// that echoes the prompt's answer template before answering still parses.
pub fn parse_reply(text: &str) -> Result<Enrichment, ReplyParseError> {
    let summary = up_to(after_last(text, SUMMARY_MARKER)?, SCORE_MARKER);
    let score = up_to(after_last(text, SCORE_MARKER)?, FOLLOW_UPS_MARKER);
    let follow_ups = after_last(text, FOLLOW_UPS_MARKER)?;

    Ok(Enrichment {
        summary: clean(summary).to_string(),
        score: parse_score(score)?,
        follow_ups: format_follow_ups(follow_ups),
    })
}

/// Parses `text`, falling back to the empty summary / score 1 triple.
pub fn parse_or_default(text: &str) -> Enrichment {
    parse_reply(text).unwrap_or_else(|e| {
        warn!("Failed to parse LLM output: {e}");
        Enrichment::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "Summary: **Seasoned backend engineer with ten years at scale.**
Score: 8
Follow-Ups:
- Can you confirm your notice period?
* Which cloud providers have you used?

- Are you open to contract work?
";

    #[test]
    fn test_well_formed_reply() {
        let enrichment = parse_reply(WELL_FORMED).unwrap();
        assert_eq!(
            enrichment.summary,
            "Seasoned backend engineer with ten years at scale."
        );
        assert_eq!(enrichment.score, 8);
        assert_eq!(
            enrichment.follow_ups,
            "•Can you confirm your notice period?\n•Which cloud providers have you used?\n•Are you open to contract work?"
        );
    }

    #[test]
    fn test_score_clamped_high() {
        let reply = "Summary: ok\nScore: 15\nFollow-Ups: none";
        assert_eq!(parse_or_default(reply).score, 10);
    }

    #[test]
    fn test_negative_score_clamps_to_one() {
        let reply = "Summary: ok\nScore: -3\nFollow-Ups: none";
        let enrichment = parse_reply(reply).unwrap();
        assert_eq!(enrichment.score, 1);
        assert_eq!(enrichment.summary, "ok");
    }

    #[test]
    fn test_non_numeric_score_degrades_to_default() {
        let reply = "Summary: ok\nScore: abc\nFollow-Ups: none";
        assert_eq!(
            parse_reply(reply),
            Err(ReplyParseError::NoScoreDigits("abc".to_string()))
        );
        assert_eq!(parse_or_default(reply), Enrichment::default());
    }

    #[test]
    fn test_score_digits_are_concatenated() {
        assert_eq!(parse_score(" 7/10 "), Ok(10));
        assert_eq!(parse_score("**6**"), Ok(6));
        assert_eq!(parse_score("0"), Ok(1));
        assert_eq!(parse_score("99999999999999999999"), Ok(10));
    }

    #[test]
    fn test_hyphen_away_from_digits_is_not_negative() {
        assert_eq!(parse_score("- 9"), Ok(9));
    }

    #[test]
    fn test_missing_marker_degrades_to_default() {
        assert_eq!(
            parse_reply("Summary: fine\nFollow-Ups: none"),
            Err(ReplyParseError::MissingMarker(SCORE_MARKER))
        );
        let sentinel = parse_or_default("Error: connection refused");
        assert_eq!(sentinel, Enrichment::default());
        assert_eq!(sentinel.score, 1);
    }

    #[test]
    fn test_echoed_template_is_ignored() {
        let reply = "Sure. You asked for:
Summary: <text>
Score: <integer>
Follow-Ups: <bullet list>

Summary: Strong backend engineer.
Score: 8
Follow-Ups:
- Preferred start date?";
        let enrichment = parse_reply(reply).unwrap();
        assert_eq!(enrichment.summary, "Strong backend engineer.");
        assert_eq!(enrichment.score, 8);
        assert_eq!(enrichment.follow_ups, "•Preferred start date?");
    }

    #[test]
    fn test_summary_runs_to_end_without_later_score() {
        let reply = "Score: 6\nFollow-Ups: none\nSummary: Written last.";
        let enrichment = parse_reply(reply).unwrap();
        assert_eq!(enrichment.summary, "Written last.");
        assert_eq!(enrichment.score, 6);
    }

    #[test]
    fn test_preamble_before_sections() {
        let reply = "Preamble\nSummary: strong\nScore: 4\nFollow-Ups:\n1. Visa status?";
        let enrichment = parse_reply(reply).unwrap();
        assert_eq!(enrichment.summary, "strong");
        assert_eq!(enrichment.score, 4);
        assert_eq!(enrichment.follow_ups, "•1. Visa status?");
    }

    #[test]
    fn test_empty_follow_ups() {
        let enrichment = parse_reply("Summary: s\nScore: 5\nFollow-Ups:   \n\n").unwrap();
        assert_eq!(enrichment.follow_ups, "");
    }
}
