use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::warn;

const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_LLM_MODEL: &str = "llama3";
const DEFAULT_LLM_MAX_RETRIES: u32 = 3;
const DEFAULT_LLM_RETRY_DELAY_SECS: u64 = 2;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Pipeline configuration loaded from environment variables.
/// Built once per process and passed by reference into every stage.
#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub tables: TableNames,
    pub llm: LlmConfig,
    pub decompress_source: DecompressSource,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_url: String,
    pub base_id: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub host: String,
    pub model: String,
    pub retry: RetryPolicy,
}

/// Attempt budget and backoff base for model calls.
/// Attempt `n` (0-based) that fails sleeps `base_delay * 2^n` before the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_LLM_MAX_RETRIES,
            base_delay: Duration::from_secs(DEFAULT_LLM_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Table names in the remote base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNames {
    pub applicants: String,
    pub personal: String,
    pub experience: String,
    pub salary: String,
    pub shortlist: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            applicants: "Applicants".to_string(),
            personal: "Personal Details".to_string(),
            experience: "Work Experience".to_string(),
            salary: "Salary Preferences".to_string(),
            shortlist: "Shortlisted Leads".to_string(),
        }
    }
}

/// Which table decompression reads its documents from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecompressSource {
    #[default]
    Applicants,
    Shortlist,
}

impl DecompressSource {
    fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "applicants" | "applicant" => Ok(Self::Applicants),
            "shortlist" | "shortlisted" | "shortlisted_leads" => Ok(Self::Shortlist),
            other => bail!("DECOMPRESS_SOURCE must be 'applicants' or 'shortlist', got '{other}'"),
        }
    }
}

impl Config {
    /// Reads the process environment. Loading `.env` is the caller's job, so
    /// it happens once, before logging starts.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let decompress_source = match lookup("DECOMPRESS_SOURCE") {
            Some(value) => DecompressSource::parse(&value)?,
            None => DecompressSource::default(),
        };

        Ok(Config {
            store: StoreConfig {
                api_url: env_or(&lookup, "AIRTABLE_API_URL", DEFAULT_AIRTABLE_API_URL),
                base_id: credential_env(&lookup, "AIRTABLE_BASE_ID"),
                api_key: credential_env(&lookup, "AIRTABLE_API_KEY"),
            },
            tables: TableNames::default(),
            llm: LlmConfig {
                host: env_or(&lookup, "OLLAMA_HOST", DEFAULT_OLLAMA_HOST),
                model: env_or(&lookup, "LLM_MODEL", DEFAULT_LLM_MODEL),
                retry: RetryPolicy {
                    max_attempts: parse_env(&lookup, "LLM_MAX_RETRIES", DEFAULT_LLM_MAX_RETRIES)?,
                    base_delay: Duration::from_secs(parse_env(
                        &lookup,
                        "LLM_RETRY_DELAY_SECS",
                        DEFAULT_LLM_RETRY_DELAY_SECS,
                    )?),
                },
            },
            decompress_source,
        })
    }
}

/// Log level used when `RUST_LOG` holds no usable filter directive.
pub fn log_level() -> String {
    std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string())
}

fn env_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Store credentials are not validated at startup. A missing value only
/// makes every store call fail, which the stages already log and skip.
fn credential_env(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> String {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value,
        _ => {
            warn!("Environment variable '{key}' is not set; store calls will fail");
            String::new()
        }
    }
}

fn parse_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
