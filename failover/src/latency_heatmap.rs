//! Latency Heatmap Producer: samples stage-to-stage latencies and keeps
//! a bucketed matrix for terminal/UI consumers, periodically flushed to
//! `{REPORT_PATH}/latency_heatmap.json` in stable key order
//! (`spec.md` §4.11, §6).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::FailoverError;

pub const REPORT_FILE_NAME: &str = "latency_heatmap.json";

/// Stable-key-order report, matching `spec.md` §6's "all reports are
/// JSON with UTF-8, stable key order" requirement — `BTreeMap` rather
/// than an insertion-ordered map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyHeatmap {
    /// `stage -> sampled latencies in milliseconds`.
    pub stages: BTreeMap<String, Vec<u64>>,
}

impl LatencyHeatmap {
    pub fn record(&mut self, stage: &str, latency_ms: u64) {
        self.stages.entry(stage.to_string()).or_default().push(latency_ms);
    }

    pub fn average_ms(&self, stage: &str) -> Option<f64> {
        let samples = self.stages.get(stage)?;
        if samples.is_empty() {
            return None;
        }
        Some(samples.iter().sum::<u64>() as f64 / samples.len() as f64)
    }
}

#[derive(Debug)]
pub struct LatencyHeatmapProducer {
    report_dir: PathBuf,
    heatmap: Mutex<LatencyHeatmap>,
}

impl LatencyHeatmapProducer {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self { report_dir: report_dir.into(), heatmap: Mutex::new(LatencyHeatmap::default()) }
    }

    pub fn sample(&self, stage: &str, latency_ms: u64) {
        self.heatmap.lock().record(stage, latency_ms);
    }

    /// Writes the current matrix to `{report_dir}/latency_heatmap.json`,
    /// creating the directory if absent.
    pub async fn flush(&self) -> Result<(), FailoverError> {
        let snapshot = self.heatmap.lock().clone();
        write_report(&self.report_dir, REPORT_FILE_NAME, &snapshot).await
    }
}

pub(crate) async fn write_report<T: Serialize>(dir: &Path, file_name: &str, value: &T) -> Result<(), FailoverError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FailoverError::ReportWrite { path: dir.display().to_string(), source })?;
    let path = dir.join(file_name);
    let json = serde_json::to_vec_pretty(value).expect("report value is Serialize");
    tokio::fs::write(&path, json)
        .await
        .map_err(|source| FailoverError::ReportWrite { path: path.display().to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_latency_across_samples() {
        let mut heatmap = LatencyHeatmap::default();
        heatmap.record("router", 10);
        heatmap.record("router", 20);
        assert_eq!(heatmap.average_ms("router"), Some(15.0));
    }

    #[test]
    fn missing_stage_has_no_average() {
        let heatmap = LatencyHeatmap::default();
        assert_eq!(heatmap.average_ms("router"), None);
    }

    #[tokio::test]
    async fn flush_writes_stable_key_order_json() {
        let dir = tempfile::tempdir().unwrap();
        let producer = LatencyHeatmapProducer::new(dir.path());
        producer.sample("router", 5);
        producer.sample("quality_trust", 3);
        producer.flush().await.unwrap();

        let contents = tokio::fs::read_to_string(dir.path().join(REPORT_FILE_NAME)).await.unwrap();
        let quality_pos = contents.find("quality_trust").unwrap();
        let router_pos = contents.find("router").unwrap();
        assert!(quality_pos < router_pos, "keys should be in sorted order");
    }
}
