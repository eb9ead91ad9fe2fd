//! The compressed applicant profile: one JSON document aggregating an
//! applicant's personal details, work history and salary preferences.
//!
//! Every leaf is optional and serializes as `null` when the source column is
//! empty. Values are copied verbatim between the document and the child
//! tables; nothing here normalizes or validates content.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::errors::ProfileError;
use crate::models::fields::{self, experience, personal, salary};
use crate::models::record::{Fields, Record};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompressedProfile {
    #[serde(default)]
    pub personal: Option<PersonalSection>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub salary: Option<SalarySection>,
}

/// Leaves are raw column values: a number stays the number the store
/// returned and a string stays a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalSection {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub location: Option<Value>,
    #[serde(default)]
    pub linkedin: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub company: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub start: Option<Value>,
    /// `None` means the position is current.
    #[serde(default)]
    pub end: Option<Value>,
    /// Free text or a multi-select list.
    #[serde(default)]
    pub technologies: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalarySection {
    #[serde(default)]
    pub preferred_rate: Option<Value>,
    #[serde(default)]
    pub minimum_rate: Option<Value>,
    #[serde(default)]
    pub currency: Option<Value>,
    /// Hours per week.
    #[serde(default)]
    pub availability: Option<Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<ExperienceEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<ExperienceEntry>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl CompressedProfile {
    /// Parses a stored `Compressed JSON` value.
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        if raw.trim().is_empty() {
            return Err(ProfileError::Empty);
        }
        Ok(serde_json::from_str(raw)?)
    }

    /// Serializes with two-space indentation, the form written to the store.
    pub fn to_pretty_json(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl PersonalSection {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.value(personal::FULL_NAME).cloned(),
            email: record.value(personal::EMAIL).cloned(),
            location: record.value(personal::LOCATION).cloned(),
            linkedin: record.value(personal::LINKEDIN).cloned(),
        }
    }

    /// True when no leaf holds a value.
    pub fn is_empty(&self) -> bool {
        [&self.name, &self.email, &self.location, &self.linkedin]
            .iter()
            .all(|leaf| leaf.is_none())
    }

    pub fn to_fields(&self, applicant_id: &str) -> Fields {
        with_back_link(
            [
                (personal::FULL_NAME, json!(self.name)),
                (personal::EMAIL, json!(self.email)),
                (personal::LOCATION, json!(self.location)),
                (personal::LINKEDIN, json!(self.linkedin)),
            ],
            applicant_id,
        )
    }
}

impl ExperienceEntry {
    pub fn from_record(record: &Record) -> Self {
        Self {
            company: record.value(experience::COMPANY).cloned(),
            title: record.value(experience::TITLE).cloned(),
            start: record.value(experience::START).cloned(),
            end: record.value(experience::END).cloned(),
            technologies: record.value(experience::TECHNOLOGIES).cloned(),
        }
    }

    pub fn to_fields(&self, applicant_id: &str) -> Fields {
        with_back_link(
            [
                (experience::COMPANY, json!(self.company)),
                (experience::TITLE, json!(self.title)),
                (experience::START, json!(self.start)),
                (experience::END, json!(self.end)),
                (experience::TECHNOLOGIES, json!(self.technologies)),
            ],
            applicant_id,
        )
    }
}

impl SalarySection {
    pub fn from_record(record: &Record) -> Self {
        Self {
            preferred_rate: record.value(salary::PREFERRED_RATE).cloned(),
            minimum_rate: record.value(salary::MINIMUM_RATE).cloned(),
            currency: record.value(salary::CURRENCY).cloned(),
            availability: record.value(salary::AVAILABILITY).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.preferred_rate,
            &self.minimum_rate,
            &self.currency,
            &self.availability,
        ]
        .iter()
        .all(|leaf| leaf.is_none())
    }

    pub fn to_fields(&self, applicant_id: &str) -> Fields {
        with_back_link(
            [
                (salary::PREFERRED_RATE, json!(self.preferred_rate)),
                (salary::MINIMUM_RATE, json!(self.minimum_rate)),
                (salary::CURRENCY, json!(self.currency)),
                (salary::AVAILABILITY, json!(self.availability)),
            ],
            applicant_id,
        )
    }
}

/// Column set for a child row, tagged with the link back to its applicant.
fn with_back_link<const N: usize>(columns: [(&str, Value); N], applicant_id: &str) -> Fields {
    let mut map: Fields = columns
        .into_iter()
        .map(|(column, value)| (column.to_string(), value))
        .collect();
    map.insert(fields::APPLICANT_LINK.to_string(), json!([applicant_id]));
    map
}
