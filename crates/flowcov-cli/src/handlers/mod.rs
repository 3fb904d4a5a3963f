//! Command handlers - extracted from main.rs for testability
//!
//! Each handler module contains:
//! - The execution logic for a CLI command
//! - Pure helper functions
//! - Tests

pub mod check;
pub mod replay;
pub mod summary;

pub use check::{execute_check, measured_coverage};
pub use replay::{execute_replay, replay_trace, MethodTrace, Trace, TraceEvent};
pub use summary::{execute_summary, render_text, ReportSummary};
