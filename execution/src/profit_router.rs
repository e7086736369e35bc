//! Net Realized Profit Router: splits a closed session's realized PnL
//! into the reserve buffer, commander pool, and overnight base, and
//! publishes the split so the Capital Book can fold it in (`spec.md`
//! §4.9, §3's `reserve_buffer`/`commander_pool`/`overnight_base` fields).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use titan_bus::{Bus, Payload};
use titan_namespace::{Channel, TenantId};

use crate::error::ExecutionError;

pub const RESERVE_BUFFER_SHARE: Decimal = dec!(0.5);
pub const COMMANDER_POOL_SHARE: Decimal = dec!(0.3);
pub const OVERNIGHT_BASE_SHARE: Decimal = dec!(0.2);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfitSplit {
    pub reserve_buffer: Decimal,
    pub commander_pool: Decimal,
    pub overnight_base: Decimal,
}

/// Splits `realized_pnl` three ways. Negative PnL (a losing session)
/// passes through unsplit in `reserve_buffer` so callers can see the
/// loss rather than silently dropping it.
pub fn split(realized_pnl: Decimal) -> ProfitSplit {
    if realized_pnl <= Decimal::ZERO {
        return ProfitSplit { reserve_buffer: realized_pnl, commander_pool: Decimal::ZERO, overnight_base: Decimal::ZERO };
    }
    ProfitSplit {
        reserve_buffer: realized_pnl * RESERVE_BUFFER_SHARE,
        commander_pool: realized_pnl * COMMANDER_POOL_SHARE,
        overnight_base: realized_pnl * OVERNIGHT_BASE_SHARE,
    }
}

#[derive(Debug)]
pub struct ProfitRouter {
    bus: Arc<dyn Bus>,
}

impl ProfitRouter {
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self { bus }
    }

    /// Computes and publishes the split for a tenant's closed-session
    /// realized PnL, one message per bucket on `Channel::profit`.
    pub async fn route(&self, tenant: &TenantId, realized_pnl: Decimal) -> Result<ProfitSplit, ExecutionError> {
        let split = split(realized_pnl);

        for (bucket, amount) in [
            ("reserve_buffer", split.reserve_buffer),
            ("commander_pool", split.commander_pool),
            ("overnight_base", split.overnight_base),
        ] {
            let message = serde_json::json!({ "tenant": tenant.to_string(), "bucket": bucket, "amount": amount });
            let payload = Payload::from(serde_json::to_vec(&message).expect("profit message is Serialize"));
            self.bus.publish(&Channel::profit(bucket), payload).await?;
        }

        Ok(split)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_pnl_splits_fifty_thirty_twenty() {
        let split = split(dec!(100));
        assert_eq!(split.reserve_buffer, dec!(50.0));
        assert_eq!(split.commander_pool, dec!(30.0));
        assert_eq!(split.overnight_base, dec!(20.0));
    }

    #[test]
    fn negative_pnl_passes_through_unsplit() {
        let split = split(dec!(-40));
        assert_eq!(split.reserve_buffer, dec!(-40));
        assert_eq!(split.commander_pool, Decimal::ZERO);
        assert_eq!(split.overnight_base, Decimal::ZERO);
    }

    #[tokio::test]
    async fn route_publishes_all_three_buckets() {
        use futures::StreamExt;
        use titan_bus::InMemoryBus;

        let bus: Arc<dyn Bus> = Arc::new(InMemoryBus::new());
        let mut reserve_sub = bus.subscribe(&Channel::profit("reserve_buffer")).await.unwrap();

        let router = ProfitRouter::new(bus);
        let tenant = TenantId::new("acme");
        router.route(&tenant, dec!(100)).await.unwrap();

        let payload = reserve_sub.next().await.expect("reserve bucket published");
        let decoded: serde_json::Value = serde_json::from_slice(&payload).unwrap();
        assert_eq!(decoded["amount"], serde_json::json!(50.0));
    }
}
