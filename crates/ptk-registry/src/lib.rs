//! # ptk-registry — Tokenizable Asset Registry
//!
//! Admits submissions that passed consensus as registry entries with a
//! fixed token supply, and allocates that supply to claimants.
//!
//! The supply derivation lives in [`pricing`]; it is configuration, not a
//! constant, because the conversion from a submission's amounts to a token
//! count is a business decision.

pub mod entry;
pub mod error;
pub mod pricing;
pub mod registry;

pub use entry::{Claim, RegistryEntry};
pub use error::RegistryError;
pub use pricing::{SupplyBasis, TokenPricing};
pub use registry::{Admission, Registry};
