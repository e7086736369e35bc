//! Emergency Recovery Reporter: on return from Hibernating, writes a
//! report of the hibernation's steps and outcome to
//! `{REPORT_PATH}/recovery_report.json`, stable key order
//! (`spec.md` §4.11, §8 scenario 6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::FailoverError;
use crate::latency_heatmap::write_report;

pub const REPORT_FILE_NAME: &str = "recovery_report.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryReport {
    pub hibernated_at: DateTime<Utc>,
    pub recovered_at: DateTime<Utc>,
    pub trigger: String,
    /// Ordered narrative of what happened; never empty (`spec.md` §8
    /// scenario 6, "Recovery Reporter produces a report with non-empty
    /// recovery_steps").
    pub recovery_steps: Vec<String>,
    /// Additional stable-key-order detail, e.g. per-tenant mode at the
    /// time of hibernation.
    pub context: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct EmergencyRecoveryReporter {
    report_dir: PathBuf,
}

impl EmergencyRecoveryReporter {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self { report_dir: report_dir.into() }
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Writes `report` to disk. Returns `FailoverError::ReportWrite`
    /// (never silently) on I/O failure, since a missing recovery report
    /// after a hibernation is itself an incident.
    pub async fn file(&self, report: &RecoveryReport) -> Result<(), FailoverError> {
        write_report(&self.report_dir, REPORT_FILE_NAME, report).await
    }
}

/// Builds the narrative for a hibernate-then-resume cycle. `trigger`
/// names the kill-switch or condition that caused hibernation.
pub fn build_report(
    hibernated_at: DateTime<Utc>,
    recovered_at: DateTime<Utc>,
    trigger: &str,
    context: BTreeMap<String, String>,
) -> RecoveryReport {
    let recovery_steps = vec![
        format!("hibernation triggered by {trigger}"),
        "no new router publications accepted while hibernating".to_string(),
        "admin issued resume command".to_string(),
        "system state transitioned hibernating -> recovered".to_string(),
    ];
    RecoveryReport { hibernated_at, recovered_at, trigger: trigger.to_string(), recovery_steps, context }
}
