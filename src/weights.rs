use crate::error::{CpiError, Result};
use std::collections::BTreeMap;

/// Nominal weights of the regions that make up the national aggregate.
pub fn default_region_weights() -> BTreeMap<String, f64> {
    [
        ("Región GBA", 0.449),
        ("Región Pampeana", 0.319),
        ("Región Noroeste", 0.083),
        ("Región Noreste", 0.080),
        ("Región Cuyo", 0.049),
        ("Región Patagonia", 0.020),
    ]
    .into_iter()
    .map(|(region, weight)| (region.to_string(), weight))
    .collect()
}

/// Region weights rescaled so they sum to exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionWeights {
    weights: BTreeMap<String, f64>,
}

impl RegionWeights {
    pub fn renormalized(nominal: &BTreeMap<String, f64>) -> Result<Self> {
        validate_weights(nominal)?;

        let factor: f64 = nominal.values().sum();
        let weights = nominal
            .iter()
            .map(|(region, weight)| (region.clone(), weight / factor))
            .collect();

        Ok(Self { weights })
    }

    pub fn get(&self, region: &str) -> Option<f64> {
        self.weights.get(region).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }
}

fn validate_weights(weights: &BTreeMap<String, f64>) -> Result<()> {
    if weights.is_empty() {
        return Err(CpiError::InvalidRegionWeights(
            "At least one region weight is required".to_string(),
        ));
    }

    if let Some((region, weight)) = weights
        .iter()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(CpiError::InvalidRegionWeights(format!(
            "Weight for '{}' must be a non-negative number (got {})",
            region, weight
        )));
    }

    let sum: f64 = weights.values().sum();
    if sum <= 0.0 {
        return Err(CpiError::InvalidRegionWeights(format!(
            "Weights must have a positive sum (got {})",
            sum
        )));
    }

    Ok(())
}
