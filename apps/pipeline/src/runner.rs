//! Process entry shared by the four stage binaries.

use std::fmt;

use anyhow::Result;
use chrono::Local;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::compression::{run_compression, run_decompression};
use crate::config::{self, Config};
use crate::enrichment::run_enrichment;
use crate::llm_client::OllamaClient;
use crate::report::StageReport;
use crate::shortlist::{run_shortlist, EligibilityRules};
use crate::store::AirtableClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compress,
    Decompress,
    Shortlist,
    Enrich,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Compress => "compress",
            Stage::Decompress => "decompress",
            Stage::Shortlist => "shortlist",
            Stage::Enrich => "enrich",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), config::log_level()))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn execute(stage: Stage, config: &Config) -> Result<StageReport> {
    let store = AirtableClient::new(&config.store)?;

    let report = match stage {
        Stage::Compress => run_compression(&store, &config.tables).await,
        Stage::Decompress => {
            run_decompression(&store, &config.tables, config.decompress_source).await
        }
        Stage::Shortlist => {
            let now = Local::now().naive_local();
            run_shortlist(&store, &config.tables, &EligibilityRules::default(), now).await
        }
        Stage::Enrich => {
            let model = OllamaClient::new(&config.llm)?;
            info!("LLM client initialized (model: {})", config.llm.model);
            run_enrichment(&store, &model, &config.tables, &config.llm).await
        }
    };

    Ok(report)
}

/// Runs one stage to completion. Every failure is logged; none is surfaced
/// as an exit status.
pub async fn run(stage: Stage) {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting {stage} v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e:#}");
            return;
        }
    };

    match execute(stage, &config).await {
        Ok(report) => report.log(stage.name()),
        Err(e) => error!("{stage} could not start: {e:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_names_match_binaries() {
        let names: Vec<_> = [Stage::Compress, Stage::Decompress, Stage::Shortlist, Stage::Enrich]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, vec!["compress", "decompress", "shortlist", "enrich"]);
    }
}
