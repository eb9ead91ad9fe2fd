//! Enrichment: asks the chat model to summarise, score and question each
//! shortlisted lead, then writes the parsed result onto the linked applicant.

pub mod reply;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{LlmConfig, TableNames};
use crate::llm_client::prompts::enrichment_prompt;
use crate::llm_client::ChatModel;
use crate::models::fields::{self, applicant, shortlist};
use crate::models::Fields;
use crate::report::StageReport;
use crate::store::{snapshot, RecordStore};

pub use reply::{parse_or_default, parse_reply, Enrichment, ReplyParseError};

/// Sends the enrichment prompt for one document, retrying with exponential
/// backoff. Once attempts are exhausted the reply is `"Error: <cause>"`, which
/// the reply parser then degrades to the default triple.
pub async fn analyze_profile(model: &dyn ChatModel, llm: &LlmConfig, profile_json: &str) -> String {
    let prompt = enrichment_prompt(profile_json);
    let attempts = llm.retry.max_attempts.max(1);

    let mut attempt = 0;
    loop {
        match model.chat(&llm.model, &prompt).await {
            Ok(reply) => return reply,
            Err(e) if attempt + 1 < attempts => {
                let delay = llm.retry.delay_after(attempt);
                debug!(attempt = attempt + 1, ?delay, "LLM call failed: {e}; retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("LLM call failed after {attempts} attempts: {e}");
                return format!("Error: {e}");
            }
        }
    }
}

fn enrichment_fields(enrichment: Enrichment) -> Fields {
    let mut columns = Fields::new();
    columns.insert(
        applicant::LLM_SUMMARY.to_string(),
        Value::String(enrichment.summary),
    );
    columns.insert(applicant::LLM_SCORE.to_string(), json!(enrichment.score));
    columns.insert(
        applicant::LLM_FOLLOW_UPS.to_string(),
        Value::String(enrichment.follow_ups),
    );
    columns
}

/// Runs enrichment over every shortlisted lead.
pub async fn run_enrichment(
    store: &dyn RecordStore,
    model: &dyn ChatModel,
    tables: &TableNames,
    llm: &LlmConfig,
) -> StageReport {
    let mut report = StageReport::default();

    let leads = snapshot(store, &tables.shortlist).await;
    for lead in &leads {
        report.seen += 1;

        let document = lead.non_empty_text(shortlist::COMPRESSED_JSON);
        let applicant_id = lead.first_link(fields::APPLICANT_LINK);
        let (Some(document), Some(applicant_id)) = (document, applicant_id) else {
            report.skipped += 1;
            continue;
        };

        let reply = analyze_profile(model, llm, document).await;
        let enrichment = parse_or_default(&reply);
        let score = enrichment.score;

        match store
            .update(&tables.applicants, applicant_id, enrichment_fields(enrichment))
            .await
        {
            Ok(()) => {
                info!("Enriched applicant {applicant_id} (score {score})");
                report.written += 1;
            }
            Err(e) => {
                warn!("Failed to update {applicant_id} in {}: {e}", tables.applicants);
                report.failed += 1;
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryPolicy;
    use crate::llm_client::LlmError;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    /// Replays canned results in order; fails once the script runs out.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(&self, _model: &str, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    fn llm_config() -> LlmConfig {
        LlmConfig {
            host: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            retry: RetryPolicy::default(),
        }
    }

    fn unavailable() -> LlmError {
        LlmError::Api {
            status: 503,
            message: "model loading".to_string(),
        }
    }

    fn columns(value: Value) -> Fields {
        value.as_object().cloned().unwrap_or_default()
    }

    const REPLY: &str = "Summary: Solid engineer.\nScore: 7\nFollow-Ups:\n- Start date?";

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_back_off_then_return_sentinel() {
        let model = ScriptedModel::new(vec![Err(unavailable()), Err(unavailable()), Err(unavailable())]);
        let started = Instant::now();

        let reply = analyze_profile(&model, &llm_config(), "{}").await;

        assert_eq!(model.calls(), 3);
        assert!(reply.starts_with("Error: "), "reply was {reply}");
        assert!(reply.contains("model loading"));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6) && elapsed < Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_one_failure() {
        let model = ScriptedModel::new(vec![Err(unavailable()), Ok(REPLY.to_string())]);
        let started = Instant::now();

        let reply = analyze_profile(&model, &llm_config(), r#"{"experience": []}"#).await;

        assert_eq!(reply, REPLY);
        assert_eq!(model.calls(), 2);
        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(model.prompts.lock().unwrap()[0].contains(r#"{"experience": []}"#));
    }

    #[tokio::test]
    async fn test_lead_enrichment_written_to_applicant() {
        let store = InMemoryStore::new();
        store.insert("Applicants", "recA", Fields::new());
        store.insert(
            "Shortlisted Leads",
            "recL",
            columns(json!({"Applicant": ["recA"], "Compressed JSON": "{}"})),
        );
        let model = ScriptedModel::new(vec![Ok(REPLY.to_string())]);

        let report = run_enrichment(&store, &model, &TableNames::default(), &llm_config()).await;
        assert_eq!(report.written, 1);

        let applicant_record = store.get("Applicants", "recA").unwrap();
        assert_eq!(applicant_record.text("LLM Summary"), Some("Solid engineer."));
        assert_eq!(applicant_record.number("LLM Score"), Some(7.0));
        assert_eq!(applicant_record.text("LLM Follow-Ups"), Some("•Start date?"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_model_outage_writes_default_triple() {
        let store = InMemoryStore::new();
        store.insert("Applicants", "recA", Fields::new());
        store.insert(
            "Shortlisted Leads",
            "recL",
            columns(json!({"Applicant": ["recA"], "Compressed JSON": "{}"})),
        );
        let model = ScriptedModel::new(vec![]);

        run_enrichment(&store, &model, &TableNames::default(), &llm_config()).await;

        let applicant_record = store.get("Applicants", "recA").unwrap();
        assert_eq!(applicant_record.text("LLM Summary"), Some(""));
        assert_eq!(applicant_record.number("LLM Score"), Some(1.0));
        assert_eq!(applicant_record.text("LLM Follow-Ups"), Some(""));
    }

    #[tokio::test]
    async fn test_leads_without_document_or_link_are_skipped() {
        let store = InMemoryStore::new();
        store.insert("Shortlisted Leads", "recL1", columns(json!({"Compressed JSON": "{}"})));
        store.insert(
            "Shortlisted Leads",
            "recL2",
            columns(json!({"Applicant": ["recA"], "Compressed JSON": ""})),
        );
        let model = ScriptedModel::new(vec![]);

        let report = run_enrichment(&store, &model, &TableNames::default(), &llm_config()).await;
        assert_eq!(report.seen, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_applicant_counts_as_failure() {
        let store = InMemoryStore::new();
        store.insert(
            "Shortlisted Leads",
            "recL",
            columns(json!({"Applicant": ["recGone"], "Compressed JSON": "{}"})),
        );
        let model = ScriptedModel::new(vec![Ok(REPLY.to_string())]);

        let report = run_enrichment(&store, &model, &TableNames::default(), &llm_config()).await;
        assert_eq!(report.failed, 1);
        assert_eq!(report.written, 0);
    }
}
