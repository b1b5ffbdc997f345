// src/sweep/portfolio.rs
//! Multi-leg positions
//!
//! Outputs of several options are combined with the sign of each leg's
//! position (long +1, short -1). Only outputs that are linear in the price
//! can be summed this way, so `omega` is rejected.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::engine::SweepSpec;
use crate::analytics::Greek;
use crate::contract::{OptionContract, Param, ParamOverrides};
use crate::error::{PricingError, PricingResult};

/// Year fraction standing in for "at expiry"; T = 0 is outside the model domain.
pub const EXPIRY_TIME: f64 = 1e-6;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Portfolio {
    legs: Vec<OptionContract>,
}

/// Signed aggregate of one output over a sweep grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSweep {
    pub greek: Greek,
    pub coordinates: BTreeMap<Param, ArrayD<f64>>,
    pub values: ArrayD<f64>,
}

/// Points in the life of the position used for payoff-style plots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecaySnapshot {
    Now,
    HalfLife,
    Expiry,
}

impl DecaySnapshot {
    pub const ALL: [DecaySnapshot; 3] = [DecaySnapshot::Now, DecaySnapshot::HalfLife, DecaySnapshot::Expiry];

    /// Time to expiry at this snapshot for a leg currently `t` years out
    pub fn time_for(self, t: f64) -> f64 {
        match self {
            DecaySnapshot::Now => t,
            DecaySnapshot::HalfLife => 0.5 * t,
            DecaySnapshot::Expiry => EXPIRY_TIME,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DecaySnapshot::Now => "Now",
            DecaySnapshot::HalfLife => "Half Time",
            DecaySnapshot::Expiry => "Expiration",
        }
    }
}

/// Position value against the underlying price at one snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecayProfile {
    pub snapshot: DecaySnapshot,
    pub spot: ArrayD<f64>,
    pub value: ArrayD<f64>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_legs(legs: Vec<OptionContract>) -> Self {
        Portfolio { legs }
    }

    pub fn push(&mut self, leg: OptionContract) {
        self.legs.push(leg);
    }

    pub fn legs(&self) -> &[OptionContract] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    fn check_aggregatable(&self, greek: Greek) -> PricingResult<()> {
        if self.legs.is_empty() {
            return Err(PricingError::missing("legs", "portfolio has no options"));
        }
        if !greek.is_additive() {
            return Err(PricingError::UnsupportedOperation {
                operation: format!("summing '{}'", greek),
                context: "output is not linear in the option price".to_string(),
            });
        }
        Ok(())
    }

    /// Signed sum of `greek` at every leg's stored parameters
    pub fn value(&self, greek: Greek) -> PricingResult<f64> {
        self.check_aggregatable(greek)?;
        let none = ParamOverrides::new();
        Ok(self
            .legs
            .iter()
            .map(|leg| leg.direction().sign() * leg.evaluate(greek, &none))
            .sum())
    }

    /// Signed sum of `greek` over a shared sweep grid.
    ///
    /// Non-swept parameters stay at each leg's own values, so legs with
    /// different strikes or expiries combine naturally.
    pub fn sweep(&self, spec: &SweepSpec, greek: Greek) -> PricingResult<PortfolioSweep> {
        self.check_aggregatable(greek)?;

        let mut coordinates = BTreeMap::new();
        let mut total: Option<ArrayD<f64>> = None;
        for leg in &self.legs {
            let (coords, mut outputs) = leg.sweep(spec, greek.flag())?.into_parts();
            let values = outputs
                .remove(&greek)
                .ok_or_else(|| PricingError::UnknownOutput {
                    name: greek.as_str().to_string(),
                })?;
            let sign = leg.direction().sign();
            match total.as_mut() {
                Some(acc) => acc.scaled_add(sign, &values),
                None => {
                    total = Some(values * sign);
                    coordinates = coords;
                }
            }
        }

        debug!(legs = self.legs.len(), %greek, "aggregated portfolio sweep");
        let values = total.ok_or_else(|| PricingError::missing("legs", "portfolio has no options"))?;
        Ok(PortfolioSweep {
            greek,
            coordinates,
            values,
        })
    }

    /// Position value against S0 in `[min, max]` now, at half the remaining
    /// life, and at expiry.
    pub fn decay_profiles(&self, min: f64, max: f64, steps: usize) -> PricingResult<Vec<DecayProfile>> {
        let spec = SweepSpec::new().axis(Param::S0, min, max, steps);
        DecaySnapshot::ALL
            .iter()
            .map(|&snapshot| {
                let shifted = self
                    .legs
                    .iter()
                    .map(|leg| {
                        let t = snapshot.time_for(leg.time_to_expiry());
                        leg.displaced(&ParamOverrides::new().t(t))
                    })
                    .collect::<PricingResult<Vec<_>>>()?;
                let sweep = Portfolio::from_legs(shifted).sweep(&spec, Greek::Price)?;
                let spot = sweep
                    .coordinates
                    .get(&Param::S0)
                    .cloned()
                    .ok_or_else(|| PricingError::missing("S0", "sweep produced no S0 axis"))?;
                Ok(DecayProfile {
                    snapshot,
                    spot,
                    value: sweep.values,
                })
            })
            .collect()
    }

    /// Every output for every leg at its stored parameters, signs not applied
    pub fn greeks_table(&self) -> Vec<BTreeMap<Greek, f64>> {
        let none = ParamOverrides::new();
        self.legs
            .iter()
            .map(|leg| {
                Greek::ALL
                    .iter()
                    .map(|&g| (g, leg.evaluate(g, &none)))
                    .collect()
            })
            .collect()
    }
}
