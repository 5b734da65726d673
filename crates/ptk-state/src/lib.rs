//! # ptk-state — Pipeline State Machines
//!
//! Named states and explicit transition tables for the verification
//! pipeline, kept free of any scoring logic so orchestration rules can be
//! tested on their own.
//!
//! - [`SubmissionStatus`]: `pending → running → {eligible | rejected}`.
//! - [`Stage`]: the fixed stage order `oracle → market → fraud → consensus`.
//! - [`LogEntry`]: a user-facing progress log line.

pub mod progress;
pub mod stage;
pub mod status;

pub use progress::{LogEntry, LogLevel};
pub use stage::Stage;
pub use status::{SubmissionStatus, TransitionError, TransitionRecord};
