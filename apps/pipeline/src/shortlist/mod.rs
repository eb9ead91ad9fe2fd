//! Shortlist writer: scores every applicant's compressed profile and records
//! the accepted ones as shortlisted leads.
//!
//! Duplicate suppression is look-before-write against the shortlist snapshot
//! taken at the start of the run. Leads created during the run are not in that
//! snapshot, and nothing stops two concurrent runs from both creating a lead.

pub mod eligibility;

use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::TableNames;
use crate::models::fields::{self, applicant, shortlist};
use crate::models::{CompressedProfile, Fields, Record};
use crate::report::StageReport;
use crate::store::{snapshot, RecordStore};

pub use eligibility::{evaluate, EligibilityRules, Evaluation};

/// Applicant ids that already have a shortlisted lead.
pub fn shortlisted_applicants(leads: &[Record]) -> HashSet<&str> {
    leads
        .iter()
        .filter_map(|lead| lead.first_link(fields::APPLICANT_LINK))
        .collect()
}

fn lead_fields(applicant_id: &str, compressed_json: &str, reason: String) -> Fields {
    let mut columns = Fields::new();
    columns.insert(fields::APPLICANT_LINK.to_string(), json!([applicant_id]));
    columns.insert(
        shortlist::COMPRESSED_JSON.to_string(),
        Value::String(compressed_json.to_string()),
    );
    columns.insert(shortlist::SCORE_REASON.to_string(), Value::String(reason));
    columns
}

/// Runs the shortlist stage, measuring tenure against `now`.
pub async fn run_shortlist(
    store: &dyn RecordStore,
    tables: &TableNames,
    rules: &EligibilityRules,
    now: NaiveDateTime,
) -> StageReport {
    let mut report = StageReport::default();

    let applicants = snapshot(store, &tables.applicants).await;
    let leads = snapshot(store, &tables.shortlist).await;
    let already_shortlisted = shortlisted_applicants(&leads);

    for record in &applicants {
        report.seen += 1;

        let Some(compressed_json) = record.non_empty_text(applicant::COMPRESSED_JSON) else {
            report.skipped += 1;
            continue;
        };
        if already_shortlisted.contains(record.id.as_str()) {
            debug!("Applicant {} already shortlisted", record.id);
            report.skipped += 1;
            continue;
        }

        let profile = match CompressedProfile::parse(compressed_json) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Invalid JSON for {}: {e}", record.id);
                report.failed += 1;
                continue;
            }
        };

        let evaluation = evaluate(&profile, rules, now);
        if !evaluation.accepted {
            debug!("Applicant {} not eligible: {}", record.id, evaluation.reason());
            report.skipped += 1;
            continue;
        }

        let columns = lead_fields(&record.id, compressed_json, evaluation.reason());
        match store.create(&tables.shortlist, columns).await {
            Ok(_) => {
                info!("Shortlisted applicant {}", record.id);
                report.written += 1;
            }
            Err(e) => {
                warn!("Failed to shortlist {}: {e}", record.id);
                report.failed += 1;
            }
        }
    }

    report
}
