// Prompt template for applicant enrichment.

/// Section labels the model is asked to emit, in reply order.
pub const SUMMARY_MARKER: &str = "Summary:";
pub const SCORE_MARKER: &str = "Score:";
pub const FOLLOW_UPS_MARKER: &str = "Follow-Ups:";

/// Enrichment prompt. Replace `{profile_json}` before sending.
pub const ENRICHMENT_PROMPT_TEMPLATE: &str = "
You are a recruiting analyst. Given this JSON applicant profile, do three things:
1. Provide a concise 75-word summary.
2. Rate overall candidate quality from 1-10 (higher is better).
3. Suggest up to three follow-up questions to clarify any data gaps.

Return exactly:
Summary: <text>
Score: <integer>
Follow-Ups: <bullet list>

Applicant Profile:
{profile_json}
";

pub fn enrichment_prompt(profile_json: &str) -> String {
    ENRICHMENT_PROMPT_TEMPLATE.replace("{profile_json}", profile_json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_profile_and_markers() {
        let prompt = enrichment_prompt(r#"{"personal": {"name": "Ada"}}"#);
        assert!(prompt.contains(r#"{"personal": {"name": "Ada"}}"#));
        assert!(!prompt.contains("{profile_json}"));
        for marker in [SUMMARY_MARKER, SCORE_MARKER, FOLLOW_UPS_MARKER] {
            assert!(prompt.contains(marker));
        }
    }
}
