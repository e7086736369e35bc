//! Metrics registry injected into every Module Runtime instance.
//!
//! `spec.md` §9 flags "per-module global singletons for metric counters"
//! and "re-defining metric objects inside exception handlers" as source
//! bugs to fix, not behaviors to preserve: counters and histograms are
//! declared once, at registration, against an instance the runtime owns
//! and hands out handles for — never a `static`, never re-declared from an
//! error path.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A handle to a single named counter, declared once via
/// [`MetricsRegistry::declare_counter`].
#[derive(Debug, Clone)]
pub struct CounterHandle {
    registry: Arc<MetricsRegistry>,
    name: String,
}

impl CounterHandle {
    pub fn incr(&self) {
        self.add(1);
    }

    pub fn add(&self, n: i64) {
        let mut counters = self.registry.counters.lock();
        *counters.entry(self.name.clone()).or_insert(0) += n;
    }

    pub fn value(&self) -> i64 {
        *self.registry.counters.lock().get(&self.name).unwrap_or(&0)
    }
}

/// A handle to a single named latency histogram, declared once via
/// [`MetricsRegistry::declare_histogram`]. Backed by a simple running
/// count/sum rather than real buckets — sufficient for the reporting shape
/// this core needs without pulling in a full metrics crate.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    registry: Arc<MetricsRegistry>,
    name: String,
}

impl HistogramHandle {
    pub fn observe(&self, value_ms: f64) {
        let mut histograms = self.registry.histograms.lock();
        histograms.entry(self.name.clone()).or_default().push(value_ms);
    }

    pub fn summary(&self) -> HistogramSummary {
        let histograms = self.registry.histograms.lock();
        let samples = histograms.get(&self.name).cloned().unwrap_or_default();
        HistogramSummary::from_samples(&samples)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HistogramSummary {
    pub count: usize,
    pub sum_ms: f64,
    pub mean_ms: f64,
    pub max_ms: f64,
}

impl HistogramSummary {
    fn from_samples(samples: &[f64]) -> Self {
        let count = samples.len();
        let sum_ms: f64 = samples.iter().sum();
        let max_ms = samples.iter().cloned().fold(0.0, f64::max);
        let mean_ms = if count > 0 { sum_ms / count as f64 } else { 0.0 };
        Self {
            count,
            sum_ms,
            mean_ms,
            max_ms,
        }
    }
}

/// A single metrics registry, owned by the system builder and shared (via
/// `Arc`) with every Module Runtime instance. Counters/histograms are
/// declared once at module registration and addressed thereafter through
/// the returned handle, never by name lookup in the hot path.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: Mutex<BTreeMap<String, i64>>,
    histograms: Mutex<BTreeMap<String, Vec<f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn declare_counter(self: &Arc<Self>, name: impl Into<String>) -> CounterHandle {
        let name = name.into();
        self.counters.lock().entry(name.clone()).or_insert(0);
        CounterHandle {
            registry: Arc::clone(self),
            name,
        }
    }

    pub fn declare_histogram(self: &Arc<Self>, name: impl Into<String>) -> HistogramHandle {
        let name = name.into();
        self.histograms.lock().entry(name.clone()).or_default();
        HistogramHandle {
            registry: Arc::clone(self),
            name,
        }
    }

    /// Snapshot of every counter's current value, for reporting.
    pub fn snapshot_counters(&self) -> BTreeMap<String, i64> {
        self.counters.lock().clone()
    }
}
