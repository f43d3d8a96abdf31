//! Data models for bars, signals, orders, accounts and session state.

mod account;
mod bar;
mod order;
mod session;
mod signal;

pub use account::AccountHandle;
pub use bar::{Bar, Timeframe};
pub use order::{AuditContext, ExecutionRecord, OrderAck, OrderIntent};
pub use session::SessionState;
pub use signal::{Decision, Direction, Signal, Vote};
