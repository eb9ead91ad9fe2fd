use tracing::info;

/// Per-run tally for one pipeline stage.
///
/// `seen` counts records the stage looked at; each of those ends up in exactly
/// one of `written`, `skipped` or `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub seen: usize,
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StageReport {
    pub fn log(&self, stage: &str) {
        info!(
            stage,
            seen = self.seen,
            written = self.written,
            skipped = self.skipped,
            failed = self.failed,
            "stage finished"
        );
    }
}
