//! # Comparable Price Providers
//!
//! A comparable provider returns a sample of price-per-unit-area
//! observations for an asset's location. The market engine never draws
//! randomness itself; it asks the injected provider.
//!
//! [`SeededComparables`] simulates a market: each observation is the
//! location's base price perturbed by normally distributed noise
//! (`base × (1 + volatility × z)`, `z ~ N(0, 1)`). Given a seed, the sample
//! for a location is fully reproducible. [`FixedComparables`] returns a
//! caller-supplied sample verbatim.

use std::collections::BTreeMap;

use ptk_core::Location;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};

use crate::error::EngineError;

pub trait ComparableProvider: Send + Sync {
    /// Draw up to `count` price-per-unit-area observations near `location`.
    fn sample(&self, location: &Location, count: usize) -> Result<Vec<f64>, EngineError>;

    fn provider_name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct SeededComparables {
    seed: Option<u64>,
    /// Lowercased city or district name → base price per unit area.
    base_prices: BTreeMap<String, f64>,
    default_price: f64,
    volatility: f64,
}

impl SeededComparables {
    pub fn new(
        seed: Option<u64>,
        base_prices: BTreeMap<String, f64>,
        default_price: f64,
        volatility: f64,
    ) -> Self {
        let base_prices = base_prices
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        Self {
            seed,
            base_prices,
            default_price,
            volatility,
        }
    }

    /// The default market: 10,000 per unit in New York, 5,000 elsewhere,
    /// 10% volatility.
    pub fn with_seed(seed: Option<u64>) -> Self {
        Self::new(seed, default_base_prices(), 5_000.0, 0.1)
    }

    /// Base price for a location: an exact city match first, then any
    /// configured market named in the address.
    pub fn base_price(&self, location: &Location) -> f64 {
        let city = location.city.trim().to_lowercase();
        if let Some(p) = self.base_prices.get(&city) {
            return *p;
        }
        let address = location.address.to_lowercase();
        self.base_prices
            .iter()
            .find(|(market, _)| address.contains(market.as_str()))
            .map(|(_, p)| *p)
            .unwrap_or(self.default_price)
    }

    fn rng_for(&self, location: &Location) -> StdRng {
        match self.seed {
            Some(seed) => {
                // Mix the location into the seed so two cities never share
                // a sample, while one city always gets the same one.
                let digest = Sha256::digest(location.city.trim().to_lowercase().as_bytes());
                let mut head = [0u8; 8];
                head.copy_from_slice(&digest[..8]);
                StdRng::seed_from_u64(seed ^ u64::from_le_bytes(head))
            }
            None => StdRng::from_entropy(),
        }
    }
}

pub fn default_base_prices() -> BTreeMap<String, f64> {
    BTreeMap::from([("new york".to_string(), 10_000.0)])
}

/// Standard normal draw (Box–Muller).
fn standard_normal(rng: &mut StdRng) -> f64 {
    // gen::<f64>() is in [0, 1); shift u1 into (0, 1] so ln(u1) is finite.
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

impl ComparableProvider for SeededComparables {
    fn sample(&self, location: &Location, count: usize) -> Result<Vec<f64>, EngineError> {
        let base = self.base_price(location);
        if !(base.is_finite() && base > 0.0) {
            return Err(EngineError::NoComparables {
                location: location.city.clone(),
            });
        }
        let mut rng = self.rng_for(location);
        let floor = base * 0.01;
        Ok((0..count)
            .map(|_| (base * (1.0 + self.volatility * standard_normal(&mut rng))).max(floor))
            .collect())
    }

    fn provider_name(&self) -> &str {
        "SeededComparables"
    }
}

/// Returns the same sample for every location.
#[derive(Debug, Clone)]
pub struct FixedComparables(pub Vec<f64>);

impl ComparableProvider for FixedComparables {
    fn sample(&self, location: &Location, count: usize) -> Result<Vec<f64>, EngineError> {
        if self.0.is_empty() {
            return Err(EngineError::NoComparables {
                location: location.city.clone(),
            });
        }
        Ok(self.0.iter().copied().take(count.max(1)).collect())
    }

    fn provider_name(&self) -> &str {
        "FixedComparables"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptk_core::submission::fixtures::office_tower;

    fn location(city: &str, address: &str) -> Location {
        let mut loc = office_tower().location;
        loc.city = city.to_string();
        loc.address = address.to_string();
        loc
    }

    #[test]
    fn same_seed_same_sample() {
        let p = SeededComparables::with_seed(Some(42));
        let loc = location("Bengaluru", "ORR");
        assert_eq!(p.sample(&loc, 10).unwrap(), p.sample(&loc, 10).unwrap());
        let q = SeededComparables::with_seed(Some(42));
        assert_eq!(p.sample(&loc, 10).unwrap(), q.sample(&loc, 10).unwrap());
    }

    #[test]
    fn different_seeds_differ() {
        let loc = location("Bengaluru", "ORR");
        let a = SeededComparables::with_seed(Some(1)).sample(&loc, 10).unwrap();
        let b = SeededComparables::with_seed(Some(2)).sample(&loc, 10).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn new_york_is_priced_higher() {
        let p = SeededComparables::with_seed(Some(7));
        assert_eq!(p.base_price(&location("New York", "5th Ave")), 10_000.0);
        assert_eq!(p.base_price(&location("Manhattan", "1 Wall St, New York")), 10_000.0);
        assert_eq!(p.base_price(&location("Pune", "Baner Road")), 5_000.0);
    }

    #[test]
    fn sample_stays_near_base() {
        let p = SeededComparables::with_seed(Some(99));
        let s = p.sample(&location("Pune", "x"), 200).unwrap();
        assert_eq!(s.len(), 200);
        let mean = s.iter().sum::<f64>() / s.len() as f64;
        assert!((mean - 5_000.0).abs() < 250.0, "mean drifted: {mean}");
        assert!(s.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn standard_normal_is_finite() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..10_000 {
            assert!(standard_normal(&mut rng).is_finite());
        }
    }

    #[test]
    fn fixed_provider_returns_sample() {
        let p = FixedComparables(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.sample(&location("a", "b"), 2).unwrap(), vec![1.0, 2.0]);
        assert!(FixedComparables(vec![]).sample(&location("a", "b"), 2).is_err());
    }
}
