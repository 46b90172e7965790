use std::fmt;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

use crate::error::SchemaDriftError;
use crate::schema::ColumnSpec;

/// Terminal state of a single column spec. Every spec starts out pending;
/// a dry run leaves it there, a real run moves it to one of the others.
#[derive(AsRefStr, EnumString, Display, Debug, PartialEq, Eq, Copy, Clone, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ColumnStatus {
    Pending,
    Added,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnOutcome {
    pub spec: ColumnSpec,
    pub status: ColumnStatus,
    pub detail: Option<String>,
}

impl ColumnOutcome {
    pub fn pending(spec: &ColumnSpec) -> Self {
        Self::new(spec, ColumnStatus::Pending, None)
    }

    pub fn added(spec: &ColumnSpec) -> Self {
        Self::new(spec, ColumnStatus::Added, None)
    }

    pub fn skipped(spec: &ColumnSpec, detail: impl Into<String>) -> Self {
        Self::new(spec, ColumnStatus::Skipped, Some(detail.into()))
    }

    pub fn failed(spec: &ColumnSpec, detail: impl Into<String>) -> Self {
        Self::new(spec, ColumnStatus::Failed, Some(detail.into()))
    }

    fn new(spec: &ColumnSpec, status: ColumnStatus, detail: Option<String>) -> Self {
        ColumnOutcome {
            spec: spec.clone(),
            status,
            detail,
        }
    }
}

impl fmt::Display for ColumnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = &self.spec.name;
        let table = &self.spec.table;
        match (self.status, &self.detail) {
            (ColumnStatus::Pending, _) => {
                write!(f, "  Would add {} to {}: {}", name, table, self.spec.add_column_sql())
            }
            (ColumnStatus::Added, _) => write!(f, "  Added {} to {}", name, table),
            (ColumnStatus::Skipped, Some(detail)) => write!(f, "  Skipped {}: {}", name, detail),
            (ColumnStatus::Skipped, None) => write!(f, "  Skipped {}", name),
            (ColumnStatus::Failed, Some(detail)) => write!(f, "  Failed {}: {}", name, detail),
            (ColumnStatus::Failed, None) => write!(f, "  Failed {}", name),
        }
    }
}

/// Ordered outcomes of one applier run, one entry per input spec.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    outcomes: Vec<ColumnOutcome>,
    rolled_back: bool,
}

impl MigrationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: ColumnOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[ColumnOutcome] {
        &self.outcomes
    }

    pub fn count(&self, status: ColumnStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    /// Marks the run as undone. Outcomes keep the status the statement had
    /// inside the transaction.
    pub fn mark_rolled_back(&mut self) {
        self.rolled_back = true;
    }

    pub fn rolled_back(&self) -> bool {
        self.rolled_back
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.status == ColumnStatus::Failed)
    }

    pub fn statuses(&self) -> Vec<ColumnStatus> {
        self.outcomes.iter().map(|o| o.status).collect()
    }

    pub fn summary(&self) -> String {
        let pending = self.count(ColumnStatus::Pending);
        let mut summary = format!(
            "{} added, {} skipped, {} failed",
            self.count(ColumnStatus::Added),
            self.count(ColumnStatus::Skipped),
            self.count(ColumnStatus::Failed)
        );
        if pending > 0 {
            summary.push_str(&format!(", {} pending", pending));
        }
        if self.rolled_back {
            summary.push_str(" (rolled back)");
        }
        summary
    }

    pub fn to_json(&self) -> Result<String, SchemaDriftError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SchemaDriftError::Error(format!("Failed to serialize migration report: {}", e))
        })
    }
}
