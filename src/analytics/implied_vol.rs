// src/analytics/implied_vol.rs
//! Implied volatility inversion
//!
//! Solves `price(σ) - target = 0` for σ. The price is strictly increasing in
//! σ (vega > 0), so a root exists inside `[lower_bound, upper_bound]` exactly
//! when the target lies between the prices at the two bounds.
//!
//! # Algorithm
//!
//! Safeguarded Newton-Raphson seeded at `initial_guess`:
//! ```text
//! σ_{n+1} = σ_n - (price(σ_n) - target) / vega(σ_n)
//! ```
//! A bracket `[lo, hi]` with `price(lo) < target < price(hi)` is kept at every
//! step. Whenever the Newton step leaves the bracket (or vega underflows) the
//! iteration falls back to bisection, so convergence never depends on the
//! seed being close to the root.

use super::bs_analytic::{bs_price, bs_vega, BsParams, OptionType};
use crate::error::{validation::*, PricingError, PricingResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

const METHOD: &str = "implied volatility (safeguarded Newton)";

/// Solver settings for [`implied_volatility`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolConfig {
    pub initial_guess: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Absolute tolerance on `|price(σ) - target|`
    pub price_tolerance: f64,
    /// Stop once the bracket is narrower than this
    pub vol_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ImpliedVolConfig {
    fn default() -> Self {
        ImpliedVolConfig {
            initial_guess: 0.20,
            lower_bound: 1e-6,
            upper_bound: 5.0,
            price_tolerance: 1e-10,
            vol_tolerance: 1e-12,
            max_iterations: 200,
        }
    }
}

impl ImpliedVolConfig {
    pub fn validate(&self) -> PricingResult<()> {
        validate_positive("lower_bound", self.lower_bound)?;
        validate_positive("upper_bound", self.upper_bound)?;
        validate_positive("price_tolerance", self.price_tolerance)?;
        validate_positive("vol_tolerance", self.vol_tolerance)?;
        if self.upper_bound <= self.lower_bound {
            return Err(PricingError::InvalidParameters {
                parameter: "upper_bound".to_string(),
                value: self.upper_bound,
                constraint: format!("must exceed lower_bound ({})", self.lower_bound),
            });
        }
        validate_finite("initial_guess", self.initial_guess)?;
        if self.max_iterations == 0 {
            return Err(PricingError::InvalidParameters {
                parameter: "max_iterations".to_string(),
                value: 0.0,
                constraint: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Invert the Black-Scholes-Merton price for volatility.
///
/// `params.vol` is ignored; every other field is held fixed.
///
/// # Errors
///
/// - `InvalidParameters` for a negative or non-finite target, or a bad config
/// - `ConvergenceFailure` when the target is not attainable for any σ inside
///   the configured bounds, or the iteration budget runs out
pub fn implied_volatility(
    otype: OptionType,
    target: f64,
    params: &BsParams,
    cfg: &ImpliedVolConfig,
) -> PricingResult<f64> {
    cfg.validate()?;
    validate_non_negative("market_price", target)?;

    let objective = |vol: f64| bs_price(otype, &BsParams { vol, ..*params }) - target;

    let mut lo = cfg.lower_bound;
    let mut hi = cfg.upper_bound;
    let f_lo = objective(lo);
    let f_hi = objective(hi);

    if f_lo.abs() <= cfg.price_tolerance {
        warn!(target, vol = lo, "implied volatility sits on the lower solver bound");
        return Ok(lo);
    }
    if f_hi.abs() <= cfg.price_tolerance {
        warn!(target, vol = hi, "implied volatility sits on the upper solver bound");
        return Ok(hi);
    }
    if f_lo > 0.0 || f_hi < 0.0 {
        return Err(PricingError::ConvergenceFailure {
            method: METHOD.to_string(),
            iterations: 0,
            reason: format!(
                "target price {} outside attainable range [{}, {}] for vol in [{}, {}]",
                target,
                f_lo + target,
                f_hi + target,
                cfg.lower_bound,
                cfg.upper_bound
            ),
        });
    }

    let mut vol = if cfg.initial_guess > lo && cfg.initial_guess < hi {
        cfg.initial_guess
    } else {
        0.5 * (lo + hi)
    };

    for iteration in 1..=cfg.max_iterations {
        let f = objective(vol);
        trace!(iteration, vol, residual = f, "implied vol step");

        if f.abs() <= cfg.price_tolerance {
            debug!(iteration, vol, "implied volatility converged");
            return Ok(vol);
        }

        if f < 0.0 {
            lo = vol;
        } else {
            hi = vol;
        }

        if hi - lo <= cfg.vol_tolerance {
            debug!(iteration, vol, "implied volatility bracket collapsed");
            return Ok(0.5 * (lo + hi));
        }

        let vega = bs_vega(otype, &BsParams { vol, ..*params });
        let newton = vol - f / vega;
        vol = if vega > f64::MIN_POSITIVE && newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }

    Err(PricingError::ConvergenceFailure {
        method: METHOD.to_string(),
        iterations: cfg.max_iterations,
        reason: format!(
            "residual above tolerance {} with bracket [{}, {}]",
            cfg.price_tolerance, lo, hi
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use approx::assert_relative_eq;

    fn params() -> BsParams {
        BsParams {
            s0: 100.0,
            k: 100.0,
            vol: f64::NAN,
            r: 0.05,
            t: 1.0,
            q: 0.0,
        }
    }

    #[test]
    fn test_recovers_reference_vol() {
        let vol = implied_volatility(
            OptionType::Call,
            10.450_583_572_185_565,
            &params(),
            &ImpliedVolConfig::default(),
        )
        .unwrap();
        assert_relative_eq!(vol, 0.2, epsilon = 1e-8);
    }

    #[test]
    fn test_far_seed_still_converges() {
        let cfg = ImpliedVolConfig {
            initial_guess: 4.5,
            ..Default::default()
        };
        let p = BsParams { vol: 0.35, k: 130.0, ..params() };
        let target = bs_price(OptionType::Put, &p);
        let vol = implied_volatility(OptionType::Put, target, &p, &cfg).unwrap();
        assert_relative_eq!(vol, 0.35, epsilon = 1e-8);
    }

    #[test]
    fn test_below_intrinsic_fails() {
        let p = BsParams { s0: 120.0, ..params() };
        // Call worth at least S - K e^(-rT) ≈ 24.88
        let err = implied_volatility(OptionType::Call, 5.0, &p, &ImpliedVolConfig::default())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Convergence);
    }

    #[test]
    fn test_above_upper_bound_fails() {
        let err = implied_volatility(OptionType::Call, 150.0, &params(), &ImpliedVolConfig::default())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Convergence);
    }

    #[test]
    fn test_iteration_budget_exhausted() {
        let cfg = ImpliedVolConfig {
            max_iterations: 1,
            initial_guess: 4.0,
            price_tolerance: 1e-14,
            ..Default::default()
        };
        let err = implied_volatility(OptionType::Call, 10.45, &params(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            PricingError::ConvergenceFailure { iterations: 1, .. }
        ));
    }

    #[test]
    fn test_invalid_config() {
        let cfg = ImpliedVolConfig {
            lower_bound: 2.0,
            upper_bound: 1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        assert!(implied_volatility(OptionType::Call, -1.0, &params(), &ImpliedVolConfig::default()).is_err());
    }
}
