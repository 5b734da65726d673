//! # Token Supply
//!
//! ```text
//! totalTokens = max(1, floor(basis / tokenPrice))
//! ```
//!
//! where `basis` is the submission's target raise or its claimed value,
//! as configured. The same submission and pricing always yield the same
//! supply.

use ptk_core::AssetSubmission;
use serde::{Deserialize, Serialize};

/// Which submission amount the token supply is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyBasis {
    #[default]
    TargetRaise,
    ClaimedValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenPricing {
    /// Price of one token, in the submission's currency.
    pub token_price: f64,
    pub supply_basis: SupplyBasis,
}

impl Default for TokenPricing {
    fn default() -> Self {
        Self {
            token_price: 1_000.0,
            supply_basis: SupplyBasis::TargetRaise,
        }
    }
}

impl TokenPricing {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.token_price.is_finite() && self.token_price > 0.0) {
            return Err(format!(
                "tokenization.token_price must be positive, got {}",
                self.token_price
            ));
        }
        Ok(())
    }

    pub fn basis_amount(&self, submission: &AssetSubmission) -> f64 {
        match self.supply_basis {
            SupplyBasis::TargetRaise => submission.target_raise,
            SupplyBasis::ClaimedValue => submission.claimed_value,
        }
    }

    pub fn total_tokens(&self, submission: &AssetSubmission) -> u64 {
        let tokens = (self.basis_amount(submission) / self.token_price).floor();
        if tokens.is_finite() && tokens >= 1.0 {
            // `as` saturates at u64::MAX.
            tokens as u64
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptk_core::submission::fixtures::office_tower;

    #[test]
    fn supply_from_target_raise() {
        assert_eq!(TokenPricing::default().total_tokens(&office_tower()), 50_000);
    }

    #[test]
    fn supply_from_claimed_value() {
        let pricing = TokenPricing {
            supply_basis: SupplyBasis::ClaimedValue,
            ..Default::default()
        };
        assert_eq!(pricing.total_tokens(&office_tower()), 75_000);
    }

    #[test]
    fn supply_is_floored_and_at_least_one() {
        let mut sub = office_tower();
        sub.target_raise = 1_999.0;
        assert_eq!(TokenPricing::default().total_tokens(&sub), 1);
        sub.target_raise = 500.0;
        assert_eq!(TokenPricing::default().total_tokens(&sub), 1);
        sub.target_raise = 2_500.0;
        assert_eq!(TokenPricing::default().total_tokens(&sub), 2);
    }

    #[test]
    fn zero_price_is_invalid() {
        let pricing = TokenPricing {
            token_price: 0.0,
            ..Default::default()
        };
        assert!(pricing.validate().is_err());
        assert!(TokenPricing::default().validate().is_ok());
    }

    #[test]
    fn basis_wire_format() {
        let json = serde_json::to_value(SupplyBasis::ClaimedValue).unwrap();
        assert_eq!(json, "claimed_value");
    }
}
