//! Dependency Resolver: scans registered modules for declared-key and
//! declared-channel overlap and reports violations, per `spec.md` §4.4.

use crate::types::ModuleRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use titan_bus::{Bus, BusError, Payload};
use titan_namespace::Key;

/// One detected overlap between two modules' declared prefixes or
/// channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub module_a: String,
    pub module_b: String,
    pub overlapping_prefix: String,
    pub kind: ViolationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    KeyPrefix,
    Channel,
}

/// Prefixes that belong to a tenant's critical path; a violation that
/// overlaps one of these halts the offending module instead of merely
/// being reported (`spec.md` §4.4).
#[derive(Debug, Clone, Default)]
pub struct CriticalPath {
    prefixes: Vec<String>,
}

impl CriticalPath {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    fn intersects(&self, prefix: &str) -> bool {
        self.prefixes
            .iter()
            .any(|critical| critical.starts_with(prefix) || prefix.starts_with(critical.as_str()))
    }
}

fn prefixes_overlap(a: &str, b: &str) -> bool {
    a.starts_with(b) || b.starts_with(a)
}

/// Compares every pair of registered modules' declared keys and channels
/// and returns the overlaps found. Pure function: callers decide what to
/// do with the result (publish, halt, log).
pub fn find_violations(records: &[ModuleRecord]) -> Vec<Violation> {
    let mut violations = Vec::new();
    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            let a = &records[i];
            let b = &records[j];

            for key_a in &a.declared_keys {
                for key_b in &b.declared_keys {
                    if prefixes_overlap(key_a, key_b) {
                        violations.push(Violation {
                            module_a: a.name.to_string(),
                            module_b: b.name.to_string(),
                            overlapping_prefix: key_a.clone(),
                            kind: ViolationKind::KeyPrefix,
                        });
                    }
                }
            }

            for chan_a in &a.declared_channels {
                for chan_b in &b.declared_channels {
                    if chan_a == chan_b {
                        violations.push(Violation {
                            module_a: a.name.to_string(),
                            module_b: b.name.to_string(),
                            overlapping_prefix: chan_a.clone(),
                            kind: ViolationKind::Channel,
                        });
                    }
                }
            }
        }
    }
    violations
}

/// A violation whose prefix intersected a tenant's critical path; the
/// resolver recommends halting `module` rather than merely reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HaltRecommendation {
    pub module: String,
    pub violation: Violation,
}

/// Publishes detected violations to [`Key::registry_violations`] and
/// returns any that intersect `critical_path` for the caller to act on
/// (typically by halting the module via the Module Runtime).
#[derive(Debug)]
pub struct DependencyResolver {
    bus: Arc<dyn Bus>,
}

impl DependencyResolver {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    pub async fn resolve(
        &self,
        records: &[ModuleRecord],
        critical_path: &CriticalPath,
    ) -> Result<Vec<HaltRecommendation>, BusError> {
        let violations = find_violations(records);
        if violations.is_empty() {
            return Ok(Vec::new());
        }

        let payload = Payload::from(serde_json::to_vec(&violations).expect("violations are Serialize"));
        self.bus
            .set(Key::registry_violations(), payload, 60_000)
            .await?;

        let halts = violations
            .into_iter()
            .filter(|v| critical_path.intersects(&v.overlapping_prefix))
            .flat_map(|v| {
                vec![
                    HaltRecommendation { module: v.module_a.clone(), violation: v.clone() },
                    HaltRecommendation { module: v.module_b.clone(), violation: v },
                ]
            })
            .collect();

        Ok(halts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModuleType;
    use chrono::Utc;
    use titan_bus::InMemoryBus;

    fn record(name: &str, keys: &[&str], channels: &[&str]) -> ModuleRecord {
        ModuleRecord::new(
            name,
            "1.0.0",
            "test-suite",
            ModuleType::Filter,
            keys.iter().map(|s| s.to_string()).collect(),
            channels.iter().map(|s| s.to_string()).collect(),
            Utc::now(),
        )
    }

    #[test]
    fn disjoint_modules_produce_no_violations() {
        let records = vec![
            record("a", &["titan:acme:signal:"], &["titan:core:a"]),
            record("b", &["titan:acme:capital:"], &["titan:core:b"]),
        ];
        assert!(find_violations(&records).is_empty());
    }

    #[test]
    fn overlapping_key_prefixes_are_detected() {
        let records = vec![
            record("a", &["titan:acme:signal:"], &[]),
            record("b", &["titan:acme:signal:raw:"], &[]),
        ];
        let violations = find_violations(&records);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::KeyPrefix);
    }

    #[test]
    fn shared_channel_is_detected() {
        let records = vec![
            record("a", &[], &["titan:core:signal"]),
            record("b", &[], &["titan:core:signal"]),
        ];
        let violations = find_violations(&records);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::Channel);
    }

    #[tokio::test]
    async fn violation_on_critical_path_is_recommended_for_halt() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let resolver = DependencyResolver::new(bus);
        let critical = CriticalPath::new(["titan:acme:capital:"]);
        let records = vec![
            record("allocator", &["titan:acme:capital:"], &[]),
            record("rogue", &["titan:acme:capital:book"], &[]),
        ];
        let halts = resolver.resolve(&records, &critical).await.unwrap();
        assert_eq!(halts.len(), 2);
    }

    #[tokio::test]
    async fn violation_outside_critical_path_is_reported_but_not_halted() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let resolver = DependencyResolver::new(bus);
        let critical = CriticalPath::new(["titan:acme:capital:"]);
        let records = vec![
            record("a", &["titan:acme:signal:"], &[]),
            record("b", &["titan:acme:signal:raw:"], &[]),
        ];
        let halts = resolver.resolve(&records, &critical).await.unwrap();
        assert!(halts.is_empty());
    }
}
