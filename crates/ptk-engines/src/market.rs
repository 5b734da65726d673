//! # Market Intelligence Engine
//!
//! Values an asset from comparable prices and derives the yield band its
//! operating income supports.
//!
//! ```text
//! navRange   = size × (mean ± 1·stddev)          of comparable price/unit
//! downsideNav = navRange.mean × stressFactor      (default 0.8)
//! NOI        = mean monthly net cash flow × 12    if history has any flow
//!            = expectedYield / 100 × navRange.mean otherwise
//! yieldBand  = NOI / navRange.{max,min} × 100
//! ```
//!
//! `size` is the oracle's footprint estimate when one is available and the
//! claimed size otherwise. The report also carries `valuationGap`: how far
//! the claimed value lies outside `navRange`, as a fraction of its mean
//! (0 when inside). Consensus scores valuation agreement from it.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ptk_core::AssetSubmission;
use ptk_oracle::OracleSignals;
use serde::{Deserialize, Serialize};

use crate::comparables::{default_base_prices, ComparableProvider, SeededComparables};
use crate::error::EngineError;

/// Market engine settings. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Multiplier applied to mean NAV for the downside case.
    pub stress_factor: f64,
    pub comparable_sample_size: usize,
    /// Fixes the comparable sample. `None` draws fresh entropy per call.
    pub comparable_seed: Option<u64>,
    /// Relative standard deviation of simulated comparables.
    pub volatility: f64,
    pub default_price_per_unit: f64,
    /// City (case-insensitive) → base price per unit area.
    pub base_prices: BTreeMap<String, f64>,
    /// Samples needed to call market depth sufficient.
    pub min_market_depth: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            stress_factor: 0.8,
            comparable_sample_size: 10,
            comparable_seed: None,
            volatility: 0.1,
            default_price_per_unit: 5_000.0,
            base_prices: default_base_prices(),
            min_market_depth: 8,
        }
    }
}

impl MarketConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.stress_factor > 0.0 && self.stress_factor <= 1.0) {
            return Err(format!(
                "market.stress_factor must be within (0, 1], got {}",
                self.stress_factor
            ));
        }
        if self.comparable_sample_size == 0 {
            return Err("market.comparable_sample_size must be at least 1".to_string());
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(format!(
                "market.volatility must be non-negative, got {}",
                self.volatility
            ));
        }
        if !(self.default_price_per_unit.is_finite() && self.default_price_per_unit > 0.0) {
            return Err("market.default_price_per_unit must be positive".to_string());
        }
        if let Some((city, p)) = self.base_prices.iter().find(|(_, p)| !(**p > 0.0)) {
            return Err(format!("market.base_prices[{city}] must be positive, got {p}"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavRange {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Annual yield band, percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YieldBand {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TailRisk {
    Low,
    Medium,
    High,
}

impl TailRisk {
    /// Classify by the comparables' coefficient of variation.
    pub fn from_dispersion(cv: f64) -> Self {
        if cv < 0.08 {
            Self::Low
        } else if cv < 0.15 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketDepth {
    Sufficient,
    Thin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiSource {
    CashFlowHistory,
    ExpectedYield,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketReport {
    pub nav_range: NavRange,
    pub downside_nav: f64,
    pub yield_band: YieldBand,
    pub tail_risk: TailRisk,
    pub market_depth: MarketDepth,
    pub comparable_count: usize,
    pub price_per_unit_mean: f64,
    pub price_per_unit_std_dev: f64,
    /// Size the valuation was computed on.
    pub valuation_size: f64,
    /// Annual net operating income.
    pub noi: f64,
    pub noi_source: NoiSource,
    pub claimed_value: f64,
    pub valuation_gap: f64,
}

#[derive(Clone)]
pub struct MarketEngine {
    provider: Arc<dyn ComparableProvider>,
    config: MarketConfig,
}

impl std::fmt::Debug for MarketEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketEngine")
            .field("provider", &self.provider.provider_name())
            .field("config", &self.config)
            .finish()
    }
}

impl MarketEngine {
    pub fn new(provider: Arc<dyn ComparableProvider>, config: MarketConfig) -> Self {
        Self { provider, config }
    }

    /// Engine over the simulated market described by `config`.
    pub fn from_config(config: MarketConfig) -> Self {
        let provider = SeededComparables::new(
            config.comparable_seed,
            config.base_prices.clone(),
            config.default_price_per_unit,
            config.volatility,
        );
        Self::new(Arc::new(provider), config)
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn analyze(
        &self,
        submission: &AssetSubmission,
        signals: Option<&OracleSignals>,
    ) -> Result<MarketReport, EngineError> {
        let size = signals
            .and_then(|s| s.estimated_size)
            .filter(|s| s.is_finite() && *s > 0.0)
            .unwrap_or(submission.specifications.size);

        let sample: Vec<f64> = self
            .provider
            .sample(&submission.location, self.config.comparable_sample_size)?
            .into_iter()
            .filter(|p| p.is_finite() && *p > 0.0)
            .collect();
        if sample.is_empty() {
            return Err(EngineError::NoComparables {
                location: submission.location.city.clone(),
            });
        }

        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;
        let std_dev = (sample.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / n).sqrt();

        let nav_range = NavRange {
            min: size * (mean - std_dev),
            max: size * (mean + std_dev),
            mean: size * mean,
        };
        if !(nav_range.min > 0.0 && nav_range.max.is_finite()) {
            return Err(EngineError::DegenerateValuation {
                reason: format!(
                    "NAV range [{}, {}] is not strictly positive",
                    nav_range.min, nav_range.max
                ),
            });
        }

        let (noi, noi_source) = net_operating_income(submission, nav_range.mean);
        let a = noi / nav_range.max * 100.0;
        let b = noi / nav_range.min * 100.0;
        let yield_band = YieldBand {
            min: a.min(b),
            max: a.max(b),
        };

        let claimed = submission.claimed_value;
        let valuation_gap = if claimed < nav_range.min {
            (nav_range.min - claimed) / nav_range.mean
        } else if claimed > nav_range.max {
            (claimed - nav_range.max) / nav_range.mean
        } else {
            0.0
        };

        let market_depth = if sample.len() >= self.config.min_market_depth {
            MarketDepth::Sufficient
        } else {
            MarketDepth::Thin
        };

        Ok(MarketReport {
            nav_range,
            downside_nav: nav_range.mean * self.config.stress_factor,
            yield_band,
            tail_risk: TailRisk::from_dispersion(std_dev / mean),
            market_depth,
            comparable_count: sample.len(),
            price_per_unit_mean: mean,
            price_per_unit_std_dev: std_dev,
            valuation_size: size,
            noi,
            noi_source,
            claimed_value: claimed,
            valuation_gap,
        })
    }
}

/// Annual NOI from reported history, or from the claimed yield on mean NAV
/// when the history is empty or records no flow at all.
fn net_operating_income(submission: &AssetSubmission, nav_mean: f64) -> (f64, NoiSource) {
    let history = &submission.financials.historical_cash_flow;
    let has_flow = history
        .iter()
        .any(|r| r.income != 0.0 || r.expenses != 0.0);
    if has_flow {
        let monthly = history.iter().map(|r| r.net()).sum::<f64>() / history.len() as f64;
        (monthly * 12.0, NoiSource::CashFlowHistory)
    } else {
        (
            submission.financials.expected_yield / 100.0 * nav_mean,
            NoiSource::ExpectedYield,
        )
    }
}

/// Market analysis as a pipeline collaborator.
#[async_trait]
pub trait MarketAnalyzer: Send + Sync {
    async fn analyze_market(
        &self,
        submission: &AssetSubmission,
        signals: Option<&OracleSignals>,
    ) -> Result<MarketReport, EngineError>;
}

#[async_trait]
impl MarketAnalyzer for MarketEngine {
    async fn analyze_market(
        &self,
        submission: &AssetSubmission,
        signals: Option<&OracleSignals>,
    ) -> Result<MarketReport, EngineError> {
        self.analyze(submission, signals)
    }
}
