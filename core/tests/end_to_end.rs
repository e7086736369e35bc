//! End-to-end scenarios wiring the signal pipeline, capital, mode, and
//! failover crates together on a shared bus (`spec.md` §8 "End-to-end
//! scenarios (seed the suite)").

use futures::StreamExt;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use smol_str::SmolStr;
use std::sync::Arc;

use titan_bus::{Bus, InMemoryBus};
use titan_capital::drawdown_redirector::{redirect_if_breached, TradeOutcome};
use titan_capital::{CapitalAllocator, PanicSessionHibernator, StrategyScore};
use titan_config::MorphicMode;
use titan_failover::region_failover::{should_fail_over, HealthSnapshot};
use titan_failover::RegionFailoverManager;
use titan_mode::{MorphicGovernor, PolicyTable};
use titan_namespace::{Channel, Key, TenantId};
use titan_signal::pipeline::{collision_detector, conflict_escalation, integrity, morphic_adapter, noise_reducer, router};
use titan_signal::{Side, Signal, SignalFlags, SignalId};

fn sample_signal(confidence: Decimal, side: Side, mode: MorphicMode) -> Signal {
    Signal::new(
        SignalId::new_random(),
        1,
        SmolStr::new("BTCUSDT"),
        side,
        dec!(0.1),
        None,
        None,
        confidence,
        SmolStr::new("MomentumStrategy"),
        60_000,
        TenantId::new("acme"),
        SmolStr::new("client-1"),
        mode,
        SignalFlags::default(),
        Vec::new(),
        None,
    )
}

/// Scenario 1: happy path reaches the router with no drops.
#[tokio::test]
async fn happy_path_reaches_router() {
    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
    let mut sub = bus.subscribe(&Channel::pipeline_stage(router::EXECUTION_STAGE)).await.unwrap();

    let signal = sample_signal(dec!(0.9), Side::Buy, MorphicMode::Default);
    let signal = integrity::check(signal).unwrap();
    let noise_reducer = noise_reducer::NoiseReducer::new(1_000);
    let signal = noise_reducer.check(signal).unwrap();

    let policy = PolicyTable::new();
    let signal = morphic_adapter::adapt(signal, &policy).unwrap();

    router::route(&bus, signal).await.unwrap();
    let payload = sub.next().await.expect("router publishes on the happy path");
    let decoded: Signal = serde_json::from_slice(&payload).unwrap();
    assert_eq!(decoded.provenance.len(), 3);
}

/// Scenario 2: under `alpha_push` (min_confidence=0.7), a 0.65-confidence
/// signal is dropped by the Morphic Adapter rather than passed through.
#[tokio::test]
async fn confidence_floor_drops_under_alpha_push() {
    let signal = sample_signal(dec!(0.65), Side::Buy, MorphicMode::AlphaPush);
    let policy = PolicyTable::new();
    let outcome = morphic_adapter::adapt(signal, &policy);
    assert!(outcome.is_err(), "confidence below alpha_push's floor must be dropped, not passed");
}

/// Scenario 3: a buy (confidence 0.8) and sell (confidence 0.9) for the
/// same symbol within the collision window — only the higher-confidence
/// sell survives, and the pair is held for escalation.
#[tokio::test]
async fn collision_keeps_the_higher_confidence_side() {
    let buy = sample_signal(dec!(0.8), Side::Buy, MorphicMode::Default);
    let sell = sample_signal(dec!(0.9), Side::Sell, MorphicMode::Default);

    let result = collision_detector::resolve(vec![buy, sell]);
    assert!(result.survivors.is_empty(), "an opposing-side pair is held for escalation, not passed through");
    let (escalated_buy, escalated_sell) = result.escalate.expect("opposing sides both surviving must be escalated");

    // Stage 7 resolves the pair by trust score; the higher-confidence
    // sell wins, matching `spec.md` §8 scenario 3's "only the sell
    // survives".
    let outcome = conflict_escalation::resolve(escalated_buy, dec!(0.8), escalated_sell, dec!(0.9));
    match outcome {
        conflict_escalation::EscalationOutcome::Resolved(signal) => assert_eq!(signal.side, Side::Sell),
        conflict_escalation::EscalationOutcome::BothBlocked(..) => panic!("distinct trust scores must resolve, not block"),
    }
}

/// Scenario 4: three consecutive losses for `MomentumStrategy` redirect
/// 70% of its allocation to the neutral/hedge set, bumping the book
/// version by one.
#[tokio::test]
async fn drawdown_redirect_moves_capital_after_three_losses() {
    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
    let allocator = CapitalAllocator::new(bus);
    let tenant = TenantId::new("acme");
    allocator.reallocate(&tenant, &[StrategyScore::new("MomentumStrategy", dec!(1), dec!(1))]).await.unwrap();

    let outcomes = vec![TradeOutcome::Loss; 3];
    let book = redirect_if_breached(&allocator, &tenant, "MomentumStrategy", &outcomes, &["NeutralStrategy", "HedgeStrategy"])
        .await
        .unwrap()
        .expect("three consecutive losses must trigger a redirect");

    assert_eq!(book.version, 2);
    assert!(book.allocations["NeutralStrategy"] > Decimal::ZERO);
    assert!(book.allocations["HedgeStrategy"] > Decimal::ZERO);
}

/// Scenario 5: primary down, secondary healthy — the Region Failover
/// Manager flips the flag, and is idempotent across re-evaluation.
#[tokio::test]
async fn failover_flips_the_flag_when_primary_is_down() {
    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
    let manager = RegionFailoverManager::new(bus);
    let snapshot = HealthSnapshot { primary_bus_healthy: false, external_api_healthy: true, secondary_bus_healthy: true };
    assert!(should_fail_over(snapshot));

    assert!(manager.evaluate(snapshot).await.unwrap());
    assert!(manager.is_active().await.unwrap());
    // re-evaluating the same snapshot is harmless, matching the "no
    // signal IDs lost across the cut-over" idempotence requirement.
    assert!(manager.evaluate(snapshot).await.unwrap());
}

/// Scenario 6: volatility=0.12 and drawdown=-0.6 trip the Panic Session
/// Hibernator, broadcasting `{action: hibernate}`; the Recovery Reporter
/// then produces a report with a non-empty narrative.
#[tokio::test]
async fn kill_switch_hibernates_and_produces_a_recovery_report() {
    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
    let mut sub = bus.subscribe(Channel::system_state()).await.unwrap();

    let hibernator = PanicSessionHibernator::new(bus.clone());
    assert!(hibernator.evaluate(dec!(0.12), dec!(-0.6)).await.unwrap());

    let payload = sub.next().await.expect("hibernate broadcast published");
    let decoded: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    assert_eq!(decoded["action"], "hibernate");

    let now = chrono::Utc::now();
    let report = titan_failover::recovery_reporter::build_report(now, now, "panic_session_hibernator", Default::default());
    assert!(!report.recovery_steps.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let reporter = titan_failover::EmergencyRecoveryReporter::new(dir.path());
    reporter.file(&report).await.unwrap();
    let written = tokio::fs::read_to_string(dir.path().join("recovery_report.json")).await.unwrap();
    assert!(written.contains("panic_session_hibernator"));
}

/// Exercises the Morphic Governor end-to-end: a mode change request is
/// reflected in the cache the Signal Pipeline's adapter would read from.
#[tokio::test]
async fn governor_mode_change_is_visible_to_readers() {
    use titan_mode::RequesterScope;

    let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
    let governor = Arc::new(MorphicGovernor::new(bus.clone(), PolicyTable::new(), titan_mode::ModeCache::new()));
    let tenant = TenantId::new("acme");

    governor
        .request_mode_change(&tenant, MorphicMode::AlphaPush, &RequesterScope::unrestricted(), "test")
        .await
        .unwrap();
    assert_eq!(governor.mode_cache().get("acme"), MorphicMode::AlphaPush);

    let raw = bus.get(&Key::mode(&tenant)).await.unwrap();
    assert!(raw.is_some(), "mode change must persist to the bus for other processes to observe");
}
