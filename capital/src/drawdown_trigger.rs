//! Forced Drawdown Trigger: monitors equity against its initial value and
//! broadcasts a liquidate-all directive on breach, gated by
//! `LIQUIDATION_PROTECTION_ENABLED` (`spec.md` §4.8).

use crate::error::CapitalError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::{Channel, TenantId};

pub const MAX_DRAWDOWN: Decimal = dec!(0.5);
pub const LIQUIDATION_PROTECTION_ENABLED: bool = true;

#[derive(Debug, Serialize)]
struct LiquidateAllBroadcast<'a> {
    action: &'a str,
    tenant: &'a str,
    drawdown: Decimal,
}

/// Equity drop ratio relative to `initial_equity`; positive means a loss.
pub fn drawdown_ratio(initial_equity: Decimal, current_equity: Decimal) -> Decimal {
    if initial_equity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (initial_equity - current_equity) / initial_equity
}

#[derive(Debug)]
pub struct ForcedDrawdownTrigger {
    bus: Arc<dyn Bus>,
    liquidation_protection_enabled: bool,
}

impl ForcedDrawdownTrigger {
    pub fn new(bus: Arc<dyn Bus>, liquidation_protection_enabled: bool) -> Self {
        Self { bus, liquidation_protection_enabled }
    }

    /// Evaluates `current_equity` against `initial_equity`; if the
    /// drawdown breaches `MAX_DRAWDOWN` and liquidation protection is
    /// enabled, broadcasts a liquidate-all directive and returns `true`.
    pub async fn evaluate(
        &self,
        tenant: &TenantId,
        initial_equity: Decimal,
        current_equity: Decimal,
    ) -> Result<bool, CapitalError> {
        let drawdown = drawdown_ratio(initial_equity, current_equity);
        if drawdown < MAX_DRAWDOWN {
            return Ok(false);
        }
        if !self.liquidation_protection_enabled {
            return Ok(false);
        }

        let broadcast = LiquidateAllBroadcast { action: "liquidate_all", tenant: tenant.0.as_str(), drawdown };
        let payload = Payload::from(serde_json::to_vec(&broadcast).expect("LiquidateAllBroadcast is Serialize"));
        self.bus.publish(Channel::system_state(), payload).await?;
        Ok(true)
    }
}
