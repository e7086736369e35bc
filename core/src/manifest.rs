//! Build-time module manifest for a concrete deployment: the explicit,
//! compiled-in table of modules this system runs, replacing the
//! source's runtime filesystem scan (`spec.md` §9 DESIGN NOTES,
//! `SPEC_FULL.md` §2 item 11).

use titan_namespace::{Channel, Key, TenantId};
use titan_registry::{ManifestEntry, ModuleManifest, ModuleType};
use titan_signal::pipeline::{
    alignment_frontloader, collision_detector, conflict_escalation, context_window_filter, integrity,
    morphic_adapter, noise_reducer, overlap_resolver, quality_trust, router,
};

const VERSION: &str = "0.1.0";
const CREATOR: &str = "titan-core";

fn pipeline_entry(name: &str, module_type: ModuleType, upstream: Option<&str>) -> ManifestEntry {
    let mut channels = vec![Channel::pipeline_stage(name)];
    if let Some(upstream) = upstream {
        channels.push(Channel::pipeline_stage(upstream));
    }
    ManifestEntry::new(name, VERSION, CREATOR, module_type, Vec::<String>::new(), channels)
}

/// The ten signal-pipeline stages, each subscribing to the previous
/// stage's channel and publishing to its own (`spec.md` §4.7).
fn pipeline_entries() -> Vec<ManifestEntry> {
    let stages: [(&str, ModuleType); 10] = [
        (integrity::STAGE_NAME, ModuleType::Filter),
        (noise_reducer::STAGE_NAME, ModuleType::Filter),
        (alignment_frontloader::STAGE_NAME, ModuleType::Filter),
        (quality_trust::STAGE_NAME, ModuleType::Filter),
        (collision_detector::STAGE_NAME, ModuleType::Filter),
        (overlap_resolver::STAGE_NAME, ModuleType::Filter),
        (conflict_escalation::STAGE_NAME, ModuleType::Filter),
        (morphic_adapter::STAGE_NAME, ModuleType::Filter),
        (context_window_filter::STAGE_NAME, ModuleType::Filter),
        (router::STAGE_NAME, ModuleType::Router),
    ];

    let mut entries = Vec::with_capacity(stages.len());
    let mut upstream = None;
    for (name, module_type) in stages {
        entries.push(pipeline_entry(name, module_type, upstream));
        upstream = Some(name);
    }
    entries
}

/// Capital, execution, and failover modules for `tenant`, with declared
/// key prefixes drawn from the same [`Key`] builders the modules
/// themselves write through.
fn capital_execution_failover_entries(tenant: &TenantId) -> Vec<ManifestEntry> {
    vec![
        ManifestEntry::new(
            "capital_allocator",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            vec![Key::capital_book(tenant), Key::capital_profit_pool(tenant)],
            Vec::<String>::new(),
        ),
        ManifestEntry::new(
            "tenant_rate_limiter",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            vec![Key::rate_limit(tenant)],
            Vec::<String>::new(),
        ),
        ManifestEntry::new(
            "jurisdiction_kyc_filter",
            VERSION,
            CREATOR,
            ModuleType::Filter,
            vec![Key::kyc_tier("*")],
            Vec::<String>::new(),
        ),
        ManifestEntry::new(
            "execution_controller",
            VERSION,
            CREATOR,
            ModuleType::Executor,
            Vec::<String>::new(),
            vec![Channel::pipeline_stage("execution"), Channel::pipeline_stage("trade"), Channel::pipeline_stage("failure")],
        ),
        ManifestEntry::new(
            "region_failover_manager",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            vec![Key::failover_active().to_string()],
            Vec::<String>::new(),
        ),
        ManifestEntry::new(
            "chaos_monitor",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            Vec::<String>::new(),
            vec![Channel::alert().to_string()],
        ),
        ManifestEntry::new(
            "system_state_machine",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            vec![Key::system_state().to_string()],
            vec![Channel::system_state().to_string()],
        ),
    ]
}

/// The shared infrastructure workers every deployment runs alongside the
/// pipeline and domain modules: the module catalog itself, its restart
/// supervisor, the morphic mode governor, and the bus heartbeat. Each gets
/// its own declared prefix so [`titan_namespace::GuardedBus`] can scope a
/// guarded handle to it, same as every other module.
fn infra_entries(tenant: &TenantId) -> Vec<ManifestEntry> {
    vec![
        ManifestEntry::new(
            "registry",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            vec!["titan:registry:".to_string()],
            Vec::<String>::new(),
        ),
        ManifestEntry::new(
            "restart_queue",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            Vec::<String>::new(),
            vec![Channel::alert().to_string()],
        ),
        ManifestEntry::new(
            "morphic_governor",
            VERSION,
            CREATOR,
            ModuleType::Config,
            vec![Key::mode(tenant)],
            vec![Channel::mode(tenant)],
        ),
        ManifestEntry::new(
            "redis_heartbeat",
            VERSION,
            CREATOR,
            ModuleType::Monitor,
            vec![Key::health("bus", "heartbeat")],
            Vec::<String>::new(),
        ),
    ]
}

/// Assembles the manifest for `tenant`: every pipeline stage, the
/// capital/execution/failover modules, and the shared infrastructure
/// workers.
pub fn default_manifest(tenant: &TenantId) -> ModuleManifest {
    let mut entries = pipeline_entries();
    entries.extend(capital_execution_failover_entries(tenant));
    entries.extend(infra_entries(tenant));
    ModuleManifest::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_manifest_includes_every_pipeline_stage_and_domain_module() {
        let tenant = TenantId::new("acme");
        let manifest = default_manifest(&tenant);
        assert_eq!(manifest.entries.len(), 21);
        assert!(manifest.entries.iter().any(|e| e.name == router::STAGE_NAME));
        assert!(manifest.entries.iter().any(|e| e.name == "capital_allocator"));
        assert!(manifest.entries.iter().any(|e| e.name == "execution_controller"));
        assert!(manifest.entries.iter().any(|e| e.name == "system_state_machine"));
        assert!(manifest.entries.iter().any(|e| e.name == "registry"));
        assert!(manifest.entries.iter().any(|e| e.name == "morphic_governor"));
        assert!(manifest.entries.iter().any(|e| e.name == "redis_heartbeat"));
    }

    #[test]
    fn pipeline_stages_chain_to_their_upstream_channel() {
        let entries = pipeline_entries();
        let noise_reducer_entry = entries.iter().find(|e| e.name == noise_reducer::STAGE_NAME).unwrap();
        assert!(noise_reducer_entry.declared_channels.contains(&Channel::pipeline_stage(integrity::STAGE_NAME)));
    }
}
