//! # API Route Modules
//!
//! - `submissions`: intake, verification trigger, progress and stage results.
//! - `registry`: tokenizable assets and token claims.

pub mod registry;
pub mod submissions;
