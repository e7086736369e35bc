//! Execution Controller: the external boundary the Router hands signals
//! to. The actual exchange-facing executor is out of scope (`spec.md` §1
//! Non-goal (a)); this crate owns the boundary's shape — the channel a
//! signal lands on and the two events an external executor publishes
//! back, feeding the Retry Throttle, Slippage Detector, and Phantom Fill
//! Detector (`spec.md` §4.9).

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::sync::Arc;
use titan_bus::{Bus, Payload, Subscription};
use titan_namespace::Channel;
use titan_signal::{Side, SignalId};

use crate::error::ExecutionError;

/// Feedback channel names, composed via the same generic
/// `titan:signal:pipeline:{stage}` family the Router uses for the
/// execution hand-off, since the normative channel table (`spec.md` §6)
/// names no dedicated trade/failure channels.
pub const TRADE_STAGE: &str = "trade";
pub const FAILURE_STAGE: &str = "failure";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub signal_id: SignalId,
    pub symbol: SmolStr,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub fee: Decimal,
    pub ts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEvent {
    pub signal_id: SignalId,
    pub reason: String,
}

#[derive(Debug)]
pub struct ExecutionController {
    bus: Arc<dyn Bus>,
}

impl ExecutionController {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Subscribes to the channel the Router publishes routed signals on.
    pub async fn subscribe_routed(&self) -> Result<Subscription, ExecutionError> {
        Ok(self.bus.subscribe(&Channel::pipeline_stage("execution")).await?)
    }

    /// Publishes a successful fill. Called by the external executor (out
    /// of scope); exposed here so tests and demos can simulate one.
    pub async fn publish_trade(&self, event: &TradeEvent) -> Result<(), ExecutionError> {
        let payload = Payload::from(serde_json::to_vec(event).expect("TradeEvent is Serialize"));
        self.bus.publish(&Channel::pipeline_stage(TRADE_STAGE), payload).await?;
        Ok(())
    }

    /// Publishes a placement failure for the Retry Throttle to pick up.
    pub async fn publish_failure(&self, event: &FailureEvent) -> Result<(), ExecutionError> {
        let payload = Payload::from(serde_json::to_vec(event).expect("FailureEvent is Serialize"));
        self.bus.publish(&Channel::pipeline_stage(FAILURE_STAGE), payload).await?;
        Ok(())
    }

    pub async fn subscribe_trades(&self) -> Result<Subscription, ExecutionError> {
        Ok(self.bus.subscribe(&Channel::pipeline_stage(TRADE_STAGE)).await?)
    }

    pub async fn subscribe_failures(&self) -> Result<Subscription, ExecutionError> {
        Ok(self.bus.subscribe(&Channel::pipeline_stage(FAILURE_STAGE)).await?)
    }
}

impl TradeEvent {
    pub fn now(signal_id: SignalId, symbol: SmolStr, side: Side, price: Decimal, quantity: Decimal, fee: Decimal) -> Self {
        Self { signal_id, symbol, side, price, quantity, fee, ts: Utc::now().timestamp_millis() }
    }
}
