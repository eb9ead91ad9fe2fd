//! Compression: joins an applicant's linked child rows into one
//! `CompressedProfile` and writes it to the applicant's `Compressed JSON`.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::TableNames;
use crate::models::fields::applicant;
use crate::models::{
    CompressedProfile, ExperienceEntry, Fields, PersonalSection, Record, SalarySection,
};
use crate::report::StageReport;
use crate::store::{snapshot, RecordStore};

/// Why an applicant produced no document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Incomplete {
    #[error("missing personal details link")]
    NoPersonalLink,
    #[error("missing work experience links")]
    NoExperienceLinks,
    #[error("missing salary preferences link")]
    NoSalaryLink,
    #[error("personal details {0} not found")]
    DanglingPersonal(String),
    #[error("salary preferences {0} not found")]
    DanglingSalary(String),
    #[error("none of the linked work experience rows were found")]
    DanglingExperience,
}

/// Child-table snapshots keyed by record id, taken once per run.
pub struct ChildIndex<'a> {
    pub personal: HashMap<&'a str, &'a Record>,
    pub experience: HashMap<&'a str, &'a Record>,
    pub salary: HashMap<&'a str, &'a Record>,
}

impl<'a> ChildIndex<'a> {
    pub fn new(personal: &'a [Record], experience: &'a [Record], salary: &'a [Record]) -> Self {
        Self {
            personal: by_id(personal),
            experience: by_id(experience),
            salary: by_id(salary),
        }
    }
}

fn by_id(records: &[Record]) -> HashMap<&str, &Record> {
    records.iter().map(|r| (r.id.as_str(), r)).collect()
}

/// Builds the document for one applicant, or explains why it can't.
///
/// All three link sets must be non-empty and the personal and salary links
/// must resolve. Experience rows appear in the applicant's link order;
/// unresolvable experience links are dropped.
pub fn build_profile(
    applicant_record: &Record,
    index: &ChildIndex<'_>,
) -> Result<CompressedProfile, Incomplete> {
    let personal_id = applicant_record
        .first_link(applicant::PERSONAL_DETAILS)
        .ok_or(Incomplete::NoPersonalLink)?;
    let experience_ids = applicant_record.links(applicant::WORK_EXPERIENCE);
    if experience_ids.is_empty() {
        return Err(Incomplete::NoExperienceLinks);
    }
    let salary_id = applicant_record
        .first_link(applicant::SALARY_PREFERENCES)
        .ok_or(Incomplete::NoSalaryLink)?;

    let personal = index
        .personal
        .get(personal_id)
        .ok_or_else(|| Incomplete::DanglingPersonal(personal_id.to_string()))?;
    let salary = index
        .salary
        .get(salary_id)
        .ok_or_else(|| Incomplete::DanglingSalary(salary_id.to_string()))?;
    let experience: Vec<ExperienceEntry> = experience_ids
        .iter()
        .filter_map(|id| index.experience.get(id))
        .map(|r| ExperienceEntry::from_record(r))
        .collect();
    if experience.is_empty() {
        return Err(Incomplete::DanglingExperience);
    }

    Ok(CompressedProfile {
        personal: Some(PersonalSection::from_record(personal)),
        experience,
        salary: Some(SalarySection::from_record(salary)),
    })
}

/// Runs compression over every applicant in the base.
pub async fn run_compression(store: &dyn RecordStore, tables: &TableNames) -> StageReport {
    let mut report = StageReport::default();

    let applicants = snapshot(store, &tables.applicants).await;
    if applicants.is_empty() {
        info!("No applicants found; nothing to compress");
        return report;
    }

    let personal = snapshot(store, &tables.personal).await;
    let experience = snapshot(store, &tables.experience).await;
    let salary = snapshot(store, &tables.salary).await;
    let index = ChildIndex::new(&personal, &experience, &salary);

    for record in &applicants {
        report.seen += 1;

        let profile = match build_profile(record, &index) {
            Ok(profile) => profile,
            Err(reason) => {
                debug!("Skipping applicant {}: {reason}", record.id);
                report.skipped += 1;
                continue;
            }
        };

        let json = match profile.to_pretty_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize profile for {}: {e}", record.id);
                report.failed += 1;
                continue;
            }
        };

        let mut fields = Fields::new();
        fields.insert(applicant::COMPRESSED_JSON.to_string(), Value::String(json));

        match store.update(&tables.applicants, &record.id, fields).await {
            Ok(()) => {
                info!("Compressed profile for applicant {}", record.id);
                report.written += 1;
            }
            Err(e) => {
                warn!("Failed to update {} in {}: {e}", record.id, tables.applicants);
                report.failed += 1;
            }
        }
    }

    report
}
