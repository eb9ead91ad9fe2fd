//! Decompression: treats a stored `CompressedProfile` as the source of truth
//! and reconciles the applicant's child rows to match it.
//!
//! Personal details and salary preferences are upserted (matched by their
//! back-link to the applicant). A section that is missing or holds no values
//! leaves its table untouched. Work experience has no stable identity inside
//! the document, so every existing row is deleted and one row per array entry
//! is recreated, in array order.

use tracing::{debug, info, warn};

use crate::config::{DecompressSource, TableNames};
use crate::errors::StoreError;
use crate::models::fields::{self, applicant, shortlist};
use crate::models::{CompressedProfile, Fields, Record};
use crate::report::StageReport;
use crate::store::{snapshot, RecordStore};

/// A profile document and the applicant whose children it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub applicant_id: String,
    pub json: String,
}

/// Child-table rows as they were at the start of the run.
pub struct ExistingChildren {
    pub personal: Vec<Record>,
    pub experience: Vec<Record>,
    pub salary: Vec<Record>,
}

/// Collects documents from applicants (their own JSON) or from shortlisted
/// leads (the copied JSON, attributed to the linked applicant).
pub fn source_documents(source: DecompressSource, records: &[Record]) -> Vec<SourceDocument> {
    records
        .iter()
        .filter_map(|record| {
            let (applicant_id, json) = match source {
                DecompressSource::Applicants => (
                    record.id.as_str(),
                    record.non_empty_text(applicant::COMPRESSED_JSON)?,
                ),
                DecompressSource::Shortlist => (
                    record.first_link(fields::APPLICANT_LINK)?,
                    record.non_empty_text(shortlist::COMPRESSED_JSON)?,
                ),
            };
            Some(SourceDocument {
                applicant_id: applicant_id.to_string(),
                json: json.to_string(),
            })
        })
        .collect()
}

/// Updates the row linking back to `applicant_id`, or creates one.
async fn upsert(
    store: &dyn RecordStore,
    table: &str,
    existing: &[Record],
    applicant_id: &str,
    columns: Fields,
) -> Result<(), StoreError> {
    match existing
        .iter()
        .find(|r| r.links_back_to(fields::APPLICANT_LINK, applicant_id))
    {
        Some(row) => store.update(table, &row.id, columns).await,
        None => store.create(table, columns).await.map(|_| ()),
    }
}

/// Reconciles one applicant's children with `profile`. Every write is
/// attempted even if an earlier one failed; returns the number of failed calls.
pub async fn reconcile_applicant(
    store: &dyn RecordStore,
    tables: &TableNames,
    existing: &ExistingChildren,
    applicant_id: &str,
    profile: &CompressedProfile,
) -> usize {
    let mut failures = 0;

    if let Some(personal) = profile.personal.as_ref().filter(|p| !p.is_empty()) {
        let result = upsert(
            store,
            &tables.personal,
            &existing.personal,
            applicant_id,
            personal.to_fields(applicant_id),
        )
        .await;
        if let Err(e) = result {
            warn!("Failed to write {} for {applicant_id}: {e}", tables.personal);
            failures += 1;
        }
    }

    if let Some(salary) = profile.salary.as_ref().filter(|s| !s.is_empty()) {
        let result = upsert(
            store,
            &tables.salary,
            &existing.salary,
            applicant_id,
            salary.to_fields(applicant_id),
        )
        .await;
        if let Err(e) = result {
            warn!("Failed to write {} for {applicant_id}: {e}", tables.salary);
            failures += 1;
        }
    }

    let stale = existing
        .experience
        .iter()
        .filter(|r| r.links_back_to(fields::APPLICANT_LINK, applicant_id));
    for row in stale {
        if let Err(e) = store.delete(&tables.experience, &row.id).await {
            warn!("Failed to delete {} from {}: {e}", row.id, tables.experience);
            failures += 1;
        }
    }

    for entry in &profile.experience {
        if let Err(e) = store
            .create(&tables.experience, entry.to_fields(applicant_id))
            .await
        {
            warn!("Failed to create in {} for {applicant_id}: {e}", tables.experience);
            failures += 1;
        }
    }

    failures
}

/// Runs decompression over every document found in `source`.
pub async fn run_decompression(
    store: &dyn RecordStore,
    tables: &TableNames,
    source: DecompressSource,
) -> StageReport {
    let mut report = StageReport::default();

    let source_table = match source {
        DecompressSource::Applicants => &tables.applicants,
        DecompressSource::Shortlist => &tables.shortlist,
    };
    let records = snapshot(store, source_table).await;
    let documents = source_documents(source, &records);
    report.skipped += records.len() - documents.len();
    report.seen += records.len() - documents.len();
    if documents.is_empty() {
        info!("No profile documents in {source_table}; nothing to decompress");
        return report;
    }

    let existing = ExistingChildren {
        personal: snapshot(store, &tables.personal).await,
        salary: snapshot(store, &tables.salary).await,
        experience: snapshot(store, &tables.experience).await,
    };

    for document in &documents {
        report.seen += 1;

        let profile = match CompressedProfile::parse(&document.json) {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Invalid JSON for {}: {e}", document.applicant_id);
                report.failed += 1;
                continue;
            }
        };

        let failures =
            reconcile_applicant(store, tables, &existing, &document.applicant_id, &profile).await;
        if failures == 0 {
            debug!(
                applicant = %document.applicant_id,
                experience = profile.experience.len(),
                "decompressed profile"
            );
            report.written += 1;
        } else {
            report.failed += 1;
        }
    }

    report
}
