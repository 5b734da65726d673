//! # Registry Entries and Claims
//!
//! A [`RegistryEntry`] is the tokenizable record of an asset that passed
//! verification. Its supply ledger obeys
//!
//! ```text
//! availableTokens + claimedTokens == totalTokens
//! claimedTokens == Σ claims.tokensAcquired
//! ```
//!
//! and [`RegistryEntry::allocate`] is the only way to move tokens from
//! available to claimed. The registry calls it while holding the entry's
//! lock.

use chrono::{DateTime, Utc};
use ptk_core::{AssetCategory, AssetId, ClaimId, ContentDigest, Location, SubmissionId};
use ptk_engines::YieldBand;
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub claim_id: ClaimId,
    pub claimant_id: String,
    pub tokens_acquired: u64,
    /// Share of total supply, percent.
    pub percentage_exposure: f64,
    /// The claimant's share of monthly net operating income.
    pub expected_monthly_cash_flow: f64,
    /// Tokens left on the entry right after this allocation.
    pub available_after: u64,
    pub claimed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryEntry {
    pub asset_id: AssetId,
    pub submission_id: SubmissionId,
    /// SHA-256 over the canonical submission and consensus documents.
    pub fingerprint: ContentDigest,
    pub asset_name: String,
    pub category: AssetCategory,
    pub location: Location,
    pub total_tokens: u64,
    pub available_tokens: u64,
    pub claimed_tokens: u64,
    pub token_price: f64,
    /// Mean of the market NAV range, when the market stage succeeded.
    pub expected_nav: Option<f64>,
    pub yield_band: Option<YieldBand>,
    pub fraud_likelihood: Option<f64>,
    pub confidence: f64,
    pub monthly_noi: f64,
    pub claims: Vec<Claim>,
    pub eligible_at: DateTime<Utc>,
}

impl RegistryEntry {
    /// Whether the supply ledger is internally consistent.
    pub fn is_balanced(&self) -> bool {
        let from_claims: u64 = self.claims.iter().map(|c| c.tokens_acquired).sum();
        self.available_tokens + self.claimed_tokens == self.total_tokens
            && from_claims == self.claimed_tokens
    }

    pub(crate) fn allocate(
        &mut self,
        claimant_id: &str,
        tokens: u64,
    ) -> Result<Claim, RegistryError> {
        if tokens > self.available_tokens {
            return Err(RegistryError::InsufficientSupply {
                requested: tokens,
                available: self.available_tokens,
            });
        }

        let share = tokens as f64 / self.total_tokens as f64;
        self.available_tokens -= tokens;
        self.claimed_tokens += tokens;
        let claim = Claim {
            claim_id: ClaimId::new(),
            claimant_id: claimant_id.to_string(),
            tokens_acquired: tokens,
            percentage_exposure: share * 100.0,
            expected_monthly_cash_flow: self.monthly_noi * share,
            available_after: self.available_tokens,
            claimed_at: Utc::now(),
        };
        self.claims.push(claim.clone());
        Ok(claim)
    }
}
