//! Eligibility scoring: deterministic shortlist rules over a compressed profile.
//!
//! Three tests, all of which must pass:
//! 1. Experience: total tenure ≥ `min_years_experience`, or any role at a
//!    tier-1 company.
//! 2. Compensation: preferred rate ≤ `max_hourly_rate` and availability ≥
//!    `min_weekly_hours`, both present.
//! 3. Location: trimmed location is on the allow-list (exact match).
//!
//! `now` is passed in so "current" roles are measured against a fixed instant.

use chrono::NaiveDateTime;
use serde_json::Value;

use crate::dates::parse_optional;
use crate::models::{CompressedProfile, ExperienceEntry};

const DAYS_PER_YEAR: f64 = 365.0;

// ────────────────────────────────────────────────────────────────────────────
// Rule set
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct EligibilityRules {
    pub tier_one_companies: Vec<String>,
    pub allowed_locations: Vec<String>,
    pub min_years_experience: f64,
    pub max_hourly_rate: f64,
    pub min_weekly_hours: f64,
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            tier_one_companies: ["Google", "Meta", "OpenAI", "Microsoft", "Amazon"]
                .into_iter()
                .map(String::from)
                .collect(),
            allowed_locations: [
                "United States",
                "United Kingdom",
                "Canada",
                "India",
                "Germany",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            min_years_experience: 4.0,
            max_hourly_rate: 100.0,
            min_weekly_hours: 20.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub accepted: bool,
    pub total_years: f64,
    pub tier_one: bool,
    pub experience_ok: bool,
    pub compensation_ok: bool,
    pub location_ok: bool,
    /// Justification lines. For accepted profiles these form the stored
    /// score reason; for rejected ones they name each failed test.
    pub reasons: Vec<String>,
}

impl Evaluation {
    pub fn reason(&self) -> String {
        self.reasons.join("; ")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring
// ────────────────────────────────────────────────────────────────────────────

/// String leaf, or `None` for absent and non-string values.
fn leaf_text(leaf: &Option<Value>) -> Option<&str> {
    leaf.as_ref().and_then(Value::as_str)
}

/// Numeric leaf as stored. Strings never compare as numbers.
fn leaf_number(leaf: &Option<Value>) -> Option<(f64, &Value)> {
    let value = leaf.as_ref()?;
    value.as_f64().map(|n| (n, value))
}

/// Total tenure in years. An unparsable start contributes nothing; a missing
/// or unparsable end counts as still employed at `now`.
pub fn total_experience_years(experience: &[ExperienceEntry], now: NaiveDateTime) -> f64 {
    let total_days: i64 = experience
        .iter()
        .filter_map(|entry| {
            let start = parse_optional(leaf_text(&entry.start))?;
            let end = parse_optional(leaf_text(&entry.end)).unwrap_or(now);
            Some((end - start).num_days())
        })
        .sum();
    total_days as f64 / DAYS_PER_YEAR
}

fn worked_at_tier_one(experience: &[ExperienceEntry], rules: &EligibilityRules) -> bool {
    experience.iter().any(|entry| {
        let company = leaf_text(&entry.company).unwrap_or("").trim();
        rules.tier_one_companies.iter().any(|t| t == company)
    })
}

pub fn evaluate(
    profile: &CompressedProfile,
    rules: &EligibilityRules,
    now: NaiveDateTime,
) -> Evaluation {
    let total_years = total_experience_years(&profile.experience, now);
    let tier_one = worked_at_tier_one(&profile.experience, rules);
    let enough_years = total_years >= rules.min_years_experience;
    let experience_ok = enough_years || tier_one;

    let salary = profile.salary.clone().unwrap_or_default();
    let rate_and_hours =
        leaf_number(&salary.preferred_rate).zip(leaf_number(&salary.availability));
    let compensation_ok = rate_and_hours.is_some_and(|((rate, _), (hours, _))| {
        rate <= rules.max_hourly_rate && hours >= rules.min_weekly_hours
    });

    let location = profile
        .personal
        .as_ref()
        .and_then(|p| leaf_text(&p.location))
        .unwrap_or("")
        .trim()
        .to_string();
    let location_ok = rules.allowed_locations.iter().any(|l| *l == location);

    let accepted = experience_ok && compensation_ok && location_ok;
    let mut reasons = Vec::new();

    match (accepted, rate_and_hours) {
        (true, Some(((_, rate), (_, hours)))) => {
            if tier_one {
                reasons.push("Worked at Tier-1 company".to_string());
            }
            if enough_years {
                reasons.push(format!("{total_years:.1} years experience"));
            }
            reasons.push(format!(
                "Rate: ${rate}/hr, Availability: {hours} hrs/week"
            ));
            reasons.push(format!("Location: {location}"));
        }
        _ => {
            if !experience_ok {
                reasons.push(format!(
                    "Experience: {total_years:.1} years, no Tier-1 company"
                ));
            }
            if !compensation_ok {
                reasons.push(match rate_and_hours {
                    Some(((_, rate), (_, hours))) => format!(
                        "Compensation: ${rate}/hr at {hours} hrs/week outside limits"
                    ),
                    None => "Compensation: rate or availability missing or not numeric"
                        .to_string(),
                });
            }
            if !location_ok {
                reasons.push(format!("Location: '{location}' not allowed"));
            }
        }
    }

    Evaluation {
        accepted,
        total_years,
        tier_one,
        experience_ok,
        compensation_ok,
        location_ok,
        reasons,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
