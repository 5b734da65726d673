//! # ptk-engines — Verification Scoring Engines
//!
//! Three stateless services, each independently instantiable and injected
//! into the orchestrator:
//!
//! - [`market`]: valuation band, downside and yield band from comparables.
//! - [`fraud`]: anomaly score from an open registry of [`FraudRule`]s.
//! - [`consensus`]: weighted vote over the three evidence stages with a
//!   hard fraud veto.
//!
//! Market and fraud analysis sit behind the async [`MarketAnalyzer`] and
//! [`FraudDetector`] traits so a deployment can run them remotely; the
//! in-process engines implement both.

pub mod comparables;
pub mod consensus;
pub mod error;
pub mod fraud;
pub mod market;
pub mod rules;

pub use comparables::{ComparableProvider, FixedComparables, SeededComparables};
pub use consensus::{
    ConsensusAggregator, ConsensusConfig, ConsensusFactor, ConsensusResult, ConsensusWeights,
    RuleCheck,
};
pub use error::EngineError;
pub use fraud::{
    Anomaly, FraudConfig, FraudContext, FraudDetector, FraudEngine, FraudReport, FraudRule,
    Severity,
};
pub use market::{
    MarketAnalyzer, MarketConfig, MarketDepth, MarketEngine, MarketReport, NavRange, NoiSource,
    TailRisk, YieldBand,
};
