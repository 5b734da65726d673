//! # ptk-core — Foundational Types for the Tokenization Pipeline
//!
//! Every other crate in the workspace depends on `ptk-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `SubmissionId`, `AssetId`,
//!    `ClaimId` and `Did` cannot be confused with one another or with a
//!    bare `Uuid`/`String`.
//!
//! 2. **Explicit submission structure.** [`AssetSubmission`] names every
//!    field the verification engines read. Engines never look values up by
//!    string key.
//!
//! 3. **Field-level validation.** [`AssetSubmission::validate`] collects
//!    every violated invariant into one [`ValidationError`] so that callers
//!    can fix all fields in a single round trip.
//!
//! 4. **Canonical fingerprints.** Registry fingerprints are SHA-256 over
//!    [`CanonicalBytes`] (RFC 8785 JSON), so the same document always yields
//!    the same digest.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ptk-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod submission;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, ContentDigest};
pub use error::{CanonicalizationError, FieldViolation, ValidationError};
pub use identity::{AssetId, ClaimId, Did, SubmissionId};
pub use submission::{
    AssetCategory, AssetSubmission, CashFlowRecord, Condition, Coordinates, Financials, Location,
    Shareholding, Specifications, SpvDetails,
};
