//! Stage 10 — Router: publishes the surviving signal to the Execution
//! channel (`spec.md` §4.7).

use crate::error::SignalError;
use crate::model::{ProvenanceEntry, Signal, Verdict};
use chrono::Utc;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::Channel;

pub const STAGE_NAME: &str = "router";

/// The pipeline stage name used to compose the Execution channel via
/// [`Channel::pipeline_stage`] — the generic `titan:signal:pipeline:{stage}`
/// family, with `execution` as the terminal stage every signal that
/// reaches the router is handed off to.
pub const EXECUTION_STAGE: &str = "execution";

pub async fn route(bus: &Arc<dyn Bus>, signal: Signal) -> Result<Signal, SignalError> {
    let routed = signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now()));
    let payload = Payload::from(serde_json::to_vec(&routed).expect("Signal is Serialize"));
    bus.publish(&Channel::pipeline_stage(EXECUTION_STAGE), payload).await?;
    Ok(routed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Side, SignalFlags, SignalId};
    use futures::StreamExt;
    use rust_decimal_macros::dec;
    use smol_str::SmolStr;
    use titan_bus::InMemoryBus;
    use titan_config::MorphicMode;
    use titan_namespace::TenantId;

    #[tokio::test]
    async fn route_publishes_to_execution_stage_channel() {
        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let mut sub = bus.subscribe(&Channel::pipeline_stage(EXECUTION_STAGE)).await.unwrap();

        let signal = Signal::new(
            SignalId::new_random(),
            1,
            SmolStr::new("BTC-USD"),
            Side::Buy,
            dec!(1),
            None,
            None,
            dec!(0.8),
            SmolStr::new("s"),
            1_000,
            TenantId::new("acme"),
            SmolStr::new("c"),
            MorphicMode::Default,
            SignalFlags::default(),
            Vec::new(),
            None,
        );

        route(&bus, signal.clone()).await.unwrap();
        let payload = sub.next().await.expect("router publishes");
        let decoded: Signal = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded.id, signal.id);
    }
}
