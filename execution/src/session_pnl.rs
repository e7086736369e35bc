//! Session PnL Tracker: accumulates realized PnL per `(tenant, symbol,
//! session_date)` from executed trades, feeding the Net Realized Profit
//! Router (`spec.md` §4.9).

use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use titan_signal::Side;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct SessionKey {
    tenant: String,
    symbol: String,
    session_date: NaiveDate,
}

/// Cash-flow contribution of a single fill: a sell realizes proceeds,
/// a buy consumes them; fees always reduce PnL.
fn contribution(side: Side, price: Decimal, quantity: Decimal, fee: Decimal) -> Decimal {
    let notional = price * quantity;
    match side {
        Side::Buy => -notional - fee,
        Side::Sell => notional - fee,
    }
}

#[derive(Debug, Default)]
pub struct SessionPnlTracker {
    sessions: Mutex<HashMap<SessionKey, Decimal>>,
}

impl SessionPnlTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds a fill into the running session total and returns the new
    /// total for that `(tenant, symbol, session_date)`.
    pub fn record_fill(
        &self,
        tenant: &str,
        symbol: &str,
        session_date: NaiveDate,
        side: Side,
        price: Decimal,
        quantity: Decimal,
        fee: Decimal,
    ) -> Decimal {
        let key = SessionKey { tenant: tenant.to_string(), symbol: symbol.to_string(), session_date };
        let mut sessions = self.sessions.lock();
        let total = sessions.entry(key).or_insert(Decimal::ZERO);
        *total += contribution(side, price, quantity, fee);
        *total
    }

    pub fn session_pnl(&self, tenant: &str, symbol: &str, session_date: NaiveDate) -> Decimal {
        let key = SessionKey { tenant: tenant.to_string(), symbol: symbol.to_string(), session_date };
        self.sessions.lock().get(&key).copied().unwrap_or(Decimal::ZERO)
    }

    /// Closes out and returns a session's accumulated PnL, removing it
    /// from the tracker so the Profit Router sees each session once.
    pub fn close_session(&self, tenant: &str, symbol: &str, session_date: NaiveDate) -> Decimal {
        let key = SessionKey { tenant: tenant.to_string(), symbol: symbol.to_string(), session_date };
        self.sessions.lock().remove(&key).unwrap_or(Decimal::ZERO)
    }
}
