//! Stage 9 — Context window filter (optional): drops signals outside
//! trading hours for the tenant (`spec.md` §4.7).

use crate::model::{ProvenanceEntry, Signal, Verdict};
use chrono::{NaiveTime, Timelike, Utc};

pub const STAGE_NAME: &str = "context_window_filter";

/// A tenant's trading window, expressed as minutes since midnight UTC.
/// Wraps past midnight when `close_minute < open_minute` (e.g. a
/// window spanning `22:00`-`04:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    pub open_minute: u32,
    pub close_minute: u32,
}

impl TradingWindow {
    pub fn always_open() -> Self {
        Self { open_minute: 0, close_minute: 24 * 60 }
    }

    fn contains(&self, minute_of_day: u32) -> bool {
        if self.open_minute <= self.close_minute {
            minute_of_day >= self.open_minute && minute_of_day < self.close_minute
        } else {
            minute_of_day >= self.open_minute || minute_of_day < self.close_minute
        }
    }
}

fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// This stage is optional per `spec.md` §4.7; a tenant with no declared
/// window (`TradingWindow::always_open`) never drops on this stage.
pub fn check(signal: Signal, window: TradingWindow) -> Result<Signal, Signal> {
    let now = Utc::now().time();
    if window.contains(minute_of_day(now)) {
        Ok(signal.with_provenance(ProvenanceEntry::new(STAGE_NAME, Verdict::Passed, Utc::now())))
    } else {
        Err(signal.with_provenance(ProvenanceEntry::new(
            STAGE_NAME,
            Verdict::Dropped { reason: "outside tenant trading hours".to_string() },
            Utc::now(),
        )))
    }
}
