//! Batch summary over row outcomes.

use crate::service::row_handler::RowOutcome;

/// One skipped row and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    pub row_id: String,
    pub reason: String,
}

/// Running tally of a batch migration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
    pub ignored: usize,
    pub elements: usize,
    pub skipped: Vec<SkippedRow>,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one row outcome under `row_id`.
    pub fn record(&mut self, row_id: impl Into<String>, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Migrated { elements_migrated } => {
                self.migrated += 1;
                self.elements += elements_migrated;
            }
            RowOutcome::Ignored => self.ignored += 1,
            RowOutcome::Skip { reason } => self.skipped.push(SkippedRow {
                row_id: row_id.into(),
                reason: reason.clone(),
            }),
        }
    }

    pub fn total(&self) -> usize {
        self.migrated + self.ignored + self.skipped.len()
    }

    pub fn has_skips(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Single-line `key=value` summary, same shape as log events.
    pub fn summary_line(&self) -> String {
        format!(
            "rows={} migrated={} ignored={} skipped={} elements={}",
            self.total(),
            self.migrated,
            self.ignored,
            self.skipped.len(),
            self.elements
        )
    }
}
