//! The ten-stage signal pipeline (`spec.md` §4.7). Each stage is a pure
//! function or small stateful struct; `titan-core` wires one
//! `titan_runtime::ModuleRuntime` instance per stage, subscribing to its
//! upstream channel and publishing to the next, per `spec.md` §4.7
//! "strictly ordered ... each a Module Runtime instance".

pub mod alignment_frontloader;
pub mod collision_detector;
pub mod conflict_escalation;
pub mod context_window_filter;
pub mod integrity;
pub mod morphic_adapter;
pub mod noise_reducer;
pub mod overlap_resolver;
pub mod quality_trust;
pub mod router;

/// Ordered stage names, matching `spec.md` §4.7's numbering. Used to
/// compose `titan:signal:pipeline:{stage}` channel names consistently
/// across the workspace.
pub const STAGE_ORDER: [&str; 10] = [
    integrity::STAGE_NAME,
    noise_reducer::STAGE_NAME,
    alignment_frontloader::STAGE_NAME,
    quality_trust::STAGE_NAME,
    collision_detector::STAGE_NAME,
    overlap_resolver::STAGE_NAME,
    conflict_escalation::STAGE_NAME,
    morphic_adapter::STAGE_NAME,
    context_window_filter::STAGE_NAME,
    router::STAGE_NAME,
];
