//! Assembles every SECC crate into one running system: the bus, registry,
//! mode governor, capital allocator, execution controller, and failover
//! machinery share a single [`titan_bus::Bus`] handle and register their
//! manifest entries together at startup (`SPEC_FULL.md` §2, §9 DESIGN
//! NOTES "explicit compiled-in module table").

use std::path::PathBuf;
use std::sync::Arc;

use titan_bus::{Bus, InMemoryBus};
use titan_capital::CapitalAllocator;
use titan_config::TitanConfig;
use titan_execution::ExecutionController;
use titan_failover::{ChaosMonitor, EmergencyRecoveryReporter, LatencyHeatmapProducer, RedisHeartbeat, RegionFailoverManager, SystemStateMachine};
use titan_mode::{ModeCache, MorphicGovernor, PolicyTable};
use titan_namespace::{GuardedBus, PrefixGuard, TenantId};
use titan_registry::{ManifestEntry, ModuleManifest, ModuleRecord, Registry, RegistryLifecycleSink, RestartQueue};
use titan_runtime::{LifecycleSink, ModeReader, RuntimeContext};

use crate::manifest::default_manifest;
use crate::TitanError;

/// Returns a bus handle scoped to `module`'s declared prefixes (keys and
/// channels together), per `spec.md` §4.2's "Bus write path as a last-mile
/// guard". Every worker `System::build` constructs is handed one of these
/// instead of the raw bus, so a bug that makes a worker write outside its
/// own declared prefixes is rejected with [`titan_bus::BusError::PrefixViolation`]
/// rather than silently landing in another module's keyspace.
fn guarded(bus: &Arc<dyn Bus>, manifest: &ModuleManifest, module: &str) -> Arc<dyn Bus> {
    let entry = manifest
        .entries
        .iter()
        .find(|e| e.name == module)
        .unwrap_or_else(|| panic!("{module} has no manifest entry to derive its declared prefixes from"));
    let declared = entry.declared_keys.iter().cloned().chain(entry.declared_channels.iter().cloned());
    Arc::new(GuardedBus::new(bus.clone(), module, PrefixGuard::new(declared)))
}

/// Deployment-specific configuration layered on top of [`TitanConfig`]:
/// where persisted reports land and any policy-cap overrides for this
/// tenant's morphic modes.
#[derive(Debug, Clone)]
pub struct SystemConfig {
    pub config: TitanConfig,
    pub report_dir: PathBuf,
    pub policy_overrides: PolicyTable,
}

impl SystemConfig {
    pub fn new(config: TitanConfig, report_dir: impl Into<PathBuf>) -> Self {
        Self { config, report_dir: report_dir.into(), policy_overrides: PolicyTable::new() }
    }

    pub fn with_policy_overrides(mut self, policy_overrides: PolicyTable) -> Self {
        self.policy_overrides = policy_overrides;
        self
    }
}

/// The assembled system: one instance of every stateful worker this
/// deployment runs, all sharing `bus`. `titan-cli` borrows from this to
/// start the modules it was asked to run.
#[derive(Debug)]
pub struct System {
    pub tenant: TenantId,
    pub bus: Arc<dyn Bus>,
    pub registry: Arc<Registry>,
    pub restart_queue: Arc<RestartQueue>,
    pub mode_cache: Arc<ModeCache>,
    pub governor: Arc<MorphicGovernor>,
    pub capital_allocator: Arc<CapitalAllocator>,
    pub execution_controller: Arc<ExecutionController>,
    pub region_failover: Arc<RegionFailoverManager>,
    pub heartbeat: Arc<RedisHeartbeat>,
    pub chaos_monitor: Arc<ChaosMonitor>,
    pub state_machine: Arc<SystemStateMachine>,
    pub latency_heatmap: Arc<LatencyHeatmapProducer>,
    pub recovery_reporter: Arc<EmergencyRecoveryReporter>,
}

impl System {
    /// Builds every shared worker on a fresh in-process bus and registers
    /// this deployment's manifest. Production deployments swap in a
    /// Redis-backed `Bus` here; the assembly is otherwise identical.
    pub async fn build(system_config: &SystemConfig) -> Result<Self, TitanError> {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let tenant = TenantId::new(system_config.config.tenant.clone());
        let manifest = default_manifest(&tenant);

        let registry = Arc::new(Registry::new(guarded(&bus, &manifest, "registry")));
        let restart_queue = Arc::new(RestartQueue::new(guarded(&bus, &manifest, "restart_queue")));
        let mode_cache = ModeCache::new();
        let governor = Arc::new(MorphicGovernor::new(
            guarded(&bus, &manifest, "morphic_governor"),
            system_config.policy_overrides.clone(),
            mode_cache.clone(),
        ));
        let capital_allocator = CapitalAllocator::new(guarded(&bus, &manifest, "capital_allocator"));
        let execution_controller = Arc::new(ExecutionController::new(guarded(&bus, &manifest, "execution_controller")));
        let region_failover = Arc::new(RegionFailoverManager::new(guarded(&bus, &manifest, "region_failover_manager")));
        let heartbeat = Arc::new(RedisHeartbeat::new(guarded(&bus, &manifest, "redis_heartbeat")));
        let chaos_monitor = Arc::new(ChaosMonitor::new(guarded(&bus, &manifest, "chaos_monitor")));
        let state_machine = Arc::new(SystemStateMachine::new(guarded(&bus, &manifest, "system_state_machine")));
        let latency_heatmap = Arc::new(LatencyHeatmapProducer::new(system_config.report_dir.clone()));
        let recovery_reporter = Arc::new(EmergencyRecoveryReporter::new(system_config.report_dir.clone()));

        let system = Self {
            tenant: tenant.clone(),
            bus,
            registry,
            restart_queue,
            mode_cache,
            governor,
            capital_allocator,
            execution_controller,
            region_failover,
            heartbeat,
            chaos_monitor,
            state_machine,
            latency_heatmap,
            recovery_reporter,
        };

        system.register_manifest(manifest).await?;
        Ok(system)
    }

    /// A [`RuntimeContext`] pre-wired with this system's bus and mode
    /// cache, ready for a [`titan_runtime::ModuleHost`] to drive one more
    /// worker loop on top of.
    pub fn runtime_context(&self) -> RuntimeContext {
        RuntimeContext::new(self.bus.clone()).with_mode_reader(self.mode_cache.clone() as Arc<dyn ModeReader>)
    }

    /// The [`LifecycleSink`] every [`titan_runtime::ModuleHost`] in this
    /// deployment should report through, so a module's start/stop/failure
    /// is reflected in this system's own [`Registry`] and [`RestartQueue`]
    /// rather than vanishing into [`titan_runtime::NoopLifecycleSink`].
    pub fn lifecycle_sink(&self) -> Arc<dyn LifecycleSink> {
        Arc::new(RegistryLifecycleSink::new(self.registry.clone(), self.restart_queue.clone()))
    }

    async fn register_manifest(&self, manifest: ModuleManifest) -> Result<(), TitanError> {
        for entry in manifest.entries {
            let ManifestEntry { name, version, creator, module_type, declared_keys, declared_channels } = entry;
            let record = ModuleRecord::new(name, version, creator, module_type, declared_keys, declared_channels, chrono::Utc::now());
            self.registry.register(record).await?;
        }
        Ok(())
    }
}
