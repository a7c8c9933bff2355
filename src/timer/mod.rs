//! Interview countdown
//!
//! The countdown is a plain value (`CountdownState`) mutated only through
//! `apply` (discrete commands) and `tick` (periodic reconciliation). All
//! timing derives from an absolute end timestamp, so dropped ticks and tab
//! suspension never accumulate drift.

pub mod clock;
pub mod state;
pub mod update;

pub use clock::{Clock, ManualClock, SystemClock};
pub use state::{Command, CountdownState, Mode, Status, TimerEvent, format_time};
pub use update::{apply, tick};
