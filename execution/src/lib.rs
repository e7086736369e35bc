#![forbid(unsafe_code)]
#![warn(unused, missing_debug_implementations, rust_2018_idioms)]

//! Execution controller boundary and the post-trade layer: retry
//! throttling, slippage and phantom-fill detection, session PnL
//! tracking, profit routing, and position restoration (`spec.md` §4.9).

pub mod controller;
pub mod error;
pub mod phantom_fill_detector;
pub mod position_restorer;
pub mod profit_router;
pub mod retry_throttle;
pub mod session_pnl;
pub mod slippage_detector;

pub use controller::{ExecutionController, FailureEvent, TradeEvent};
pub use error::ExecutionError;
pub use phantom_fill_detector::PhantomFillDetector;
pub use position_restorer::{BusJournalReader, JournalReader, Position};
pub use profit_router::ProfitRouter;
pub use retry_throttle::{RetryDecision, RetryThrottle};
pub use session_pnl::SessionPnlTracker;
pub use slippage_detector::SlippageReport;
