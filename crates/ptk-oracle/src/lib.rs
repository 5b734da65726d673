//! # ptk-oracle — Oracle Adapter Boundary
//!
//! The oracle is the external collaborator that corroborates a submission:
//! satellite imagery for existence, land registries for ownership, utility
//! and footfall feeds for activity. This crate does not acquire any of those
//! signals itself. It defines the typed report the rest of the pipeline
//! consumes and the [`OracleAdapter`] trait that production and test
//! backends implement.
//!
//! ## Adapters
//!
//! | Adapter | Use |
//! |---|---|
//! | [`StubOracle`] | Deterministic fixed-confidence evidence for development and tests |
//! | [`HttpOracle`] | JSON over HTTP to an oracle network (`POST {base}/verify`) |

pub mod adapter;
pub mod error;
pub mod evidence;
pub mod http;
pub mod stub;

pub use adapter::OracleAdapter;
pub use error::OracleError;
pub use evidence::{CategoryResult, Evidence, EvidenceCategory, OracleReport, OracleSignals};
pub use http::{HttpOracle, OracleConfig};
pub use stub::StubOracle;
