//! # Asset Submission Model
//!
//! The claim a submitter presents for verification: who is submitting,
//! what the asset is, where it is, the SPV that holds it, its financials,
//! and how much of it the submitter intends to tokenize.
//!
//! The wire format is camelCase JSON. Every engine downstream reads these
//! typed fields directly; there is no string-keyed payload anywhere in the
//! pipeline.
//!
//! ## Validation Boundaries
//!
//! | Field | Accepted |
//! |---|---|
//! | `location.coordinates.lat` | `[-90, 90]` |
//! | `location.coordinates.lng` | `[-180, 180]` |
//! | `specifications.size` | `> 0` |
//! | `financials.expectedYield` | `[0, 100]` |
//! | `financials.occupancyRate` | `[0, 100]` |
//! | `claimedValue` | `> 0` |
//! | `targetRaise` | `> 0` |
//!
//! Bounds are inclusive where shown as closed intervals. NaN and infinities
//! fail every check.

use serde::{Deserialize, Serialize};

use crate::error::{FieldViolation, ValidationError};
use crate::identity::Did;

/// Asset class of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetCategory {
    RealEstate,
    PrivateCredit,
    Commodity,
    IpRights,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealEstate => "real-estate",
            Self::PrivateCredit => "private-credit",
            Self::Commodity => "commodity",
            Self::IpRights => "ip-rights",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Physical condition reported by the submitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub coordinates: Coordinates,
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub country: String,
    #[serde(default)]
    pub postal_code: String,
}

/// Physical specifications. `size` is in square feet for real estate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    pub size: f64,
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(default)]
    pub age: u32,
    pub condition: Condition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shareholding {
    pub holder: String,
    pub percentage: f64,
}

/// Special-purpose vehicle that legally holds the asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpvDetails {
    pub spv_name: String,
    pub spv_registration_number: String,
    pub jurisdiction: String,
    #[serde(default)]
    pub incorporation_date: String,
    #[serde(default)]
    pub registered_address: String,
    #[serde(default)]
    pub directors: Vec<String>,
    #[serde(default)]
    pub shareholder_structure: Vec<Shareholding>,
}

/// One month of reported operating cash flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRecord {
    pub month: String,
    pub income: f64,
    pub expenses: f64,
}

impl CashFlowRecord {
    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    /// Monthly rent currently collected.
    #[serde(default)]
    pub current_rent: f64,
    /// Expected annual yield, percent.
    pub expected_yield: f64,
    #[serde(default)]
    pub annual_expenses: f64,
    /// Percent of lettable area occupied.
    pub occupancy_rate: f64,
    #[serde(default)]
    pub tenant_count: u32,
    #[serde(default)]
    pub lease_terms_months: u32,
    #[serde(default)]
    pub historical_cash_flow: Vec<CashFlowRecord>,
}

/// A submitted claim about a real-world asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSubmission {
    pub submitter_id: String,
    pub wallet_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    /// Opaque signature over the payload. Checked by the intake layer,
    /// never interpreted here.
    #[serde(default)]
    pub signature: String,
    pub category: AssetCategory,
    pub asset_name: String,
    pub location: Location,
    pub specifications: Specifications,
    pub spv: SpvDetails,
    #[serde(default)]
    pub registry_ids: Vec<String>,
    #[serde(default)]
    pub document_urls: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub video_urls: Vec<String>,
    pub financials: Financials,
    pub claimed_value: f64,
    #[serde(default)]
    pub tokenization_intent: String,
    pub target_raise: f64,
}

impl AssetSubmission {
    /// Check every field invariant, collecting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut v = Violations::default();

        v.non_empty("submitterId", &self.submitter_id);
        v.non_empty("walletAddress", &self.wallet_address);
        v.non_empty("assetName", &self.asset_name);
        if let Some(did) = &self.did {
            if let Err(err) = Did::new(did.as_str()) {
                v.extend(err);
            }
        }

        let loc = &self.location;
        v.non_empty("location.city", &loc.city);
        v.non_empty("location.country", &loc.country);
        v.within("location.coordinates.lat", loc.coordinates.lat, -90.0, 90.0);
        v.within("location.coordinates.lng", loc.coordinates.lng, -180.0, 180.0);

        v.positive("specifications.size", self.specifications.size);

        let spv = &self.spv;
        v.non_empty("spv.spvName", &spv.spv_name);
        v.non_empty("spv.jurisdiction", &spv.jurisdiction);
        let mut total_share = 0.0;
        for (i, s) in spv.shareholder_structure.iter().enumerate() {
            v.within(
                &format!("spv.shareholderStructure[{i}].percentage"),
                s.percentage,
                0.0,
                100.0,
            );
            total_share += s.percentage;
        }
        if total_share > 100.0 + 1e-6 {
            v.push(
                "spv.shareholderStructure",
                format!("percentages sum to {total_share}, more than 100"),
            );
        }

        let fin = &self.financials;
        v.within("financials.expectedYield", fin.expected_yield, 0.0, 100.0);
        v.within("financials.occupancyRate", fin.occupancy_rate, 0.0, 100.0);
        v.non_negative("financials.currentRent", fin.current_rent);
        v.non_negative("financials.annualExpenses", fin.annual_expenses);
        for (i, rec) in fin.historical_cash_flow.iter().enumerate() {
            v.non_negative(&format!("financials.historicalCashFlow[{i}].income"), rec.income);
            v.non_negative(
                &format!("financials.historicalCashFlow[{i}].expenses"),
                rec.expenses,
            );
        }

        v.positive("claimedValue", self.claimed_value);
        v.positive("targetRaise", self.target_raise);

        v.finish()
    }
}

#[derive(Default)]
struct Violations(Vec<FieldViolation>);

impl Violations {
    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldViolation::new(field, message));
    }

    fn extend(&mut self, err: ValidationError) {
        self.0.extend(err.violations);
    }

    fn non_empty(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
        }
    }

    fn within(&mut self, field: &str, value: f64, lo: f64, hi: f64) {
        if !(lo..=hi).contains(&value) {
            self.push(field, format!("must be within [{lo}, {hi}], got {value}"));
        }
    }

    fn positive(&mut self, field: &str, value: f64) {
        if !(value.is_finite() && value > 0.0) {
            self.push(field, format!("must be greater than 0, got {value}"));
        }
    }

    fn non_negative(&mut self, field: &str, value: f64) {
        if !(value.is_finite() && value >= 0.0) {
            self.push(field, format!("must not be negative, got {value}"));
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { violations: self.0 })
        }
    }
}

/// Ready-made submissions for tests across the workspace.
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures {
    use super::*;

    /// A Bengaluru office tower: 8.5% yield, 85% occupancy, 75M claimed,
    /// 50M target raise.
    pub fn office_tower() -> AssetSubmission {
        AssetSubmission {
            submitter_id: "submitter-001".to_string(),
            wallet_address: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".to_string(),
            did: Some("did:ethr:0x742d35cc6634c0532925a3b844bc454e4438f44e".to_string()),
            signature: "0xsig".to_string(),
            category: AssetCategory::RealEstate,
            asset_name: "Prestige Tech Park Tower B".to_string(),
            location: Location {
                address: "Outer Ring Road, Marathahalli".to_string(),
                coordinates: Coordinates {
                    lat: 12.9569,
                    lng: 77.7011,
                },
                city: "Bengaluru".to_string(),
                state: "Karnataka".to_string(),
                country: "India".to_string(),
                postal_code: "560103".to_string(),
            },
            specifications: Specifications {
                size: 25_000.0,
                property_type: "commercial office".to_string(),
                age: 5,
                condition: Condition::Good,
                floors: Some(12),
                units: Some(48),
            },
            spv: SpvDetails {
                spv_name: "Prestige Tower B SPV Pvt Ltd".to_string(),
                spv_registration_number: "U70100KA2019PTC123456".to_string(),
                jurisdiction: "India".to_string(),
                incorporation_date: "2019-03-15".to_string(),
                registered_address: "Bengaluru, Karnataka".to_string(),
                directors: vec!["A. Rao".to_string(), "S. Iyer".to_string()],
                shareholder_structure: vec![
                    Shareholding {
                        holder: "Prestige Estates".to_string(),
                        percentage: 60.0,
                    },
                    Shareholding {
                        holder: "Founders Trust".to_string(),
                        percentage: 40.0,
                    },
                ],
            },
            registry_ids: vec!["KA-BLR-2019-123456".to_string()],
            document_urls: vec!["https://docs.example.com/title-deed.pdf".to_string()],
            image_urls: Vec::new(),
            video_urls: Vec::new(),
            financials: Financials {
                current_rent: 450_000.0,
                expected_yield: 8.5,
                annual_expenses: 1_200_000.0,
                occupancy_rate: 85.0,
                tenant_count: 42,
                lease_terms_months: 36,
                historical_cash_flow: Vec::new(),
            },
            claimed_value: 75_000_000.0,
            tokenization_intent: "Fractional ownership for retail investors".to_string(),
            target_raise: 50_000_000.0,
        }
    }
}
