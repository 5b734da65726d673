//! # Registry & Claim Manager
//!
//! Entries are held individually behind their own mutex inside a
//! map guarded by a read-write lock. A claim takes the map's read lock only
//! long enough to clone the entry handle, then serializes on the entry's
//! mutex. Claims against different entries never contend; claims against
//! the same entry can never jointly oversell it.
//!
//! All locks are `parking_lot` and are never held across `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use ptk_core::{sha256_digest, AssetId, AssetSubmission, CanonicalBytes, SubmissionId};
use ptk_engines::{ConsensusResult, FraudReport, MarketReport};
use serde_json::json;

use crate::entry::{Claim, RegistryEntry};
use crate::error::RegistryError;
use crate::pricing::TokenPricing;

/// Everything the registry needs to admit one verified submission.
#[derive(Debug, Clone, Copy)]
pub struct Admission<'a> {
    pub submission_id: SubmissionId,
    pub submission: &'a AssetSubmission,
    pub consensus: &'a ConsensusResult,
    pub market: Option<&'a MarketReport>,
    pub fraud: Option<&'a FraudReport>,
}

type EntryHandle = Arc<Mutex<RegistryEntry>>;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    pricing: TokenPricing,
    entries: Arc<RwLock<HashMap<AssetId, EntryHandle>>>,
    by_submission: Arc<RwLock<HashMap<SubmissionId, AssetId>>>,
}

impl Registry {
    pub fn new(pricing: TokenPricing) -> Self {
        Self {
            pricing,
            ..Default::default()
        }
    }

    pub fn pricing(&self) -> &TokenPricing {
        &self.pricing
    }

    /// Create the registry entry for an eligible submission.
    ///
    /// A submission is admitted at most once.
    pub fn admit(&self, admission: Admission<'_>) -> Result<RegistryEntry, RegistryError> {
        let Admission {
            submission_id,
            submission,
            consensus,
            market,
            fraud,
        } = admission;

        if !consensus.eligible {
            return Err(RegistryError::NotEligible { submission_id });
        }

        // Held across the insert so two admissions of one submission race
        // on this lock rather than both succeeding.
        let mut index = self.by_submission.write();
        if let Some(asset_id) = index.get(&submission_id) {
            return Err(RegistryError::AlreadyRegistered {
                submission_id,
                asset_id: *asset_id,
            });
        }

        let canonical = CanonicalBytes::new(&json!({
            "submissionId": submission_id,
            "submission": submission,
            "consensus": consensus,
        }))?;

        let total_tokens = self.pricing.total_tokens(submission);
        let entry = RegistryEntry {
            asset_id: AssetId::new(),
            submission_id,
            fingerprint: sha256_digest(&canonical),
            asset_name: submission.asset_name.clone(),
            category: submission.category,
            location: submission.location.clone(),
            total_tokens,
            available_tokens: total_tokens,
            claimed_tokens: 0,
            token_price: self.pricing.token_price,
            expected_nav: market.map(|m| m.nav_range.mean),
            yield_band: market.map(|m| m.yield_band),
            fraud_likelihood: fraud.map(|f| f.fraud_likelihood),
            confidence: consensus.confidence,
            monthly_noi: monthly_noi(submission, market),
            claims: Vec::new(),
            eligible_at: Utc::now(),
        };

        self.entries
            .write()
            .insert(entry.asset_id, Arc::new(Mutex::new(entry.clone())));
        index.insert(submission_id, entry.asset_id);

        tracing::info!(
            asset_id = %entry.asset_id,
            %submission_id,
            total_tokens,
            fingerprint = %entry.fingerprint,
            "asset admitted to registry"
        );
        Ok(entry)
    }

    /// Allocate `tokens` from an entry's available supply to `claimant_id`.
    pub fn claim(
        &self,
        asset_id: &AssetId,
        claimant_id: &str,
        tokens: u64,
    ) -> Result<Claim, RegistryError> {
        let claimant_id = claimant_id.trim();
        if claimant_id.is_empty() {
            return Err(RegistryError::InvalidClaim {
                reason: "claimantId must not be empty".to_string(),
            });
        }
        if tokens == 0 {
            return Err(RegistryError::InvalidClaim {
                reason: "tokensToAcquire must be at least 1".to_string(),
            });
        }

        let handle = self
            .entries
            .read()
            .get(asset_id)
            .cloned()
            .ok_or(RegistryError::InvalidAsset {
                asset_id: *asset_id,
            })?;

        let mut entry = handle.lock();
        let claim = entry.allocate(claimant_id, tokens)?;
        tracing::info!(
            %asset_id,
            claimant_id,
            tokens,
            available = entry.available_tokens,
            "tokens claimed"
        );
        Ok(claim)
    }

    /// Snapshot of one entry.
    pub fn get(&self, asset_id: &AssetId) -> Option<RegistryEntry> {
        let handle = self.entries.read().get(asset_id).cloned()?;
        let snapshot = handle.lock().clone();
        Some(snapshot)
    }

    pub fn find_by_submission(&self, submission_id: &SubmissionId) -> Option<RegistryEntry> {
        let asset_id = *self.by_submission.read().get(submission_id)?;
        self.get(&asset_id)
    }

    /// Snapshots of all entries, oldest admission first.
    pub fn list(&self) -> Vec<RegistryEntry> {
        let handles: Vec<EntryHandle> = self.entries.read().values().cloned().collect();
        let mut entries: Vec<RegistryEntry> = handles.iter().map(|h| h.lock().clone()).collect();
        entries.sort_by(|a, b| {
            a.eligible_at
                .cmp(&b.eligible_at)
                .then(a.asset_id.cmp(&b.asset_id))
        });
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Monthly NOI from the market stage, or from the claimed yield on the
/// claimed value when the market stage produced nothing.
fn monthly_noi(submission: &AssetSubmission, market: Option<&MarketReport>) -> f64 {
    match market {
        Some(m) if m.noi.is_finite() => m.noi / 12.0,
        _ => submission.financials.expected_yield / 100.0 * submission.claimed_value / 12.0,
    }
}
