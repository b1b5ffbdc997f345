// src/analytics/bs_analytic.rs
//! Analytical Black-Scholes-Merton formulas for European options and Greeks
//!
//! # Mathematical Foundation
//!
//! Under the Black-Scholes-Merton model with continuous dividend yield `q`,
//! the underlying follows:
//! ```text
//! dS_t = (r - q) S_t dt + σ S_t dW_t
//! ```
//!
//! Every formula below is built from the same two quantities:
//! ```text
//! d₁ = [ln(S/K) + (r - q + σ²/2)T] / (σ√T)
//! d₂ = d₁ - σ√T
//! ```
//!
//! All sensitivities are exact derivatives of the price, not finite
//! difference approximations. Sign conventions:
//! - `theta` is `-∂V/∂T` (decay as calendar time passes)
//! - `charm` is `-∂Δ/∂T`
//! - `veta` is `+∂ν/∂T`, `color` is `+∂Γ/∂T`

use crate::math_utils::{norm_cdf, norm_pdf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PricingError;

/// Call or put payoff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// +1 for calls, -1 for puts
    pub fn phi(self) -> f64 {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "Call"),
            OptionType::Put => write!(f, "Put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            _ => Err(PricingError::InvalidParameters {
                parameter: format!("option type '{}'", s),
                value: f64::NAN,
                constraint: "must be 'Call' or 'Put'".to_string(),
            }),
        }
    }
}

/// The six pricing inputs bundled as one value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BsParams {
    /// Spot price of the underlying
    pub s0: f64,
    /// Strike
    pub k: f64,
    /// Volatility (annualised)
    pub vol: f64,
    /// Continuously compounded risk-free rate
    pub r: f64,
    /// Time to expiry in years
    pub t: f64,
    /// Continuous dividend yield
    pub q: f64,
}

/// Intermediate quantities shared by every formula, computed once per call.
#[derive(Debug, Clone, Copy)]
pub struct Terms {
    pub d1: f64,
    pub d2: f64,
    pub sqrt_t: f64,
    /// σ√T
    pub vol_sqrt_t: f64,
    /// e^(-qT)
    pub disc_q: f64,
    /// e^(-rT)
    pub disc_r: f64,
    /// φ(d₁)
    pub pdf_d1: f64,
}

impl Terms {
    pub fn new(p: &BsParams) -> Terms {
        let sqrt_t = p.t.sqrt();
        let vol_sqrt_t = p.vol * sqrt_t;
        let d1 = ((p.s0 / p.k).ln() + (p.r - p.q + 0.5 * p.vol * p.vol) * p.t) / vol_sqrt_t;
        let d2 = d1 - vol_sqrt_t;
        Terms {
            d1,
            d2,
            sqrt_t,
            vol_sqrt_t,
            disc_q: (-p.q * p.t).exp(),
            disc_r: (-p.r * p.t).exp(),
            pdf_d1: norm_pdf(d1),
        }
    }
}

/// Payoff at expiry: `max(S-K, 0)` or `max(K-S, 0)`
pub fn intrinsic_value(otype: OptionType, s0: f64, k: f64) -> f64 {
    (otype.phi() * (s0 - k)).max(0.0)
}

/// No-arbitrage price bounds `(lower, upper)` for a European option.
///
/// ```text
/// call: max(S e^(-qT) - K e^(-rT), 0) ≤ C ≤ S e^(-qT)
/// put:  max(K e^(-rT) - S e^(-qT), 0) ≤ P ≤ K e^(-rT)
/// ```
pub fn price_bounds(otype: OptionType, p: &BsParams) -> (f64, f64) {
    let fwd_s = p.s0 * (-p.q * p.t).exp();
    let fwd_k = p.k * (-p.r * p.t).exp();
    match otype {
        OptionType::Call => ((fwd_s - fwd_k).max(0.0), fwd_s),
        OptionType::Put => ((fwd_k - fwd_s).max(0.0), fwd_k),
    }
}

/// Black-Scholes-Merton price
///
/// # Formula
/// ```text
/// C = S e^(-qT) Φ(d₁) - K e^(-rT) Φ(d₂)
/// P = K e^(-rT) Φ(-d₂) - S e^(-qT) Φ(-d₁)
/// ```
pub fn bs_price(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    price_with(otype, p, &x)
}

fn price_with(otype: OptionType, p: &BsParams, x: &Terms) -> f64 {
    match otype {
        OptionType::Call => p.s0 * x.disc_q * norm_cdf(x.d1) - p.k * x.disc_r * norm_cdf(x.d2),
        OptionType::Put => p.k * x.disc_r * norm_cdf(-x.d2) - p.s0 * x.disc_q * norm_cdf(-x.d1),
    }
}

/// Delta (∂V/∂S)
///
/// ```text
/// call: e^(-qT) Φ(d₁)
/// put: -e^(-qT) Φ(-d₁)
/// ```
pub fn bs_delta(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    delta_with(otype, &x)
}

fn delta_with(otype: OptionType, x: &Terms) -> f64 {
    match otype {
        OptionType::Call => x.disc_q * norm_cdf(x.d1),
        OptionType::Put => -x.disc_q * norm_cdf(-x.d1),
    }
}

/// Vega (∂V/∂σ), identical for calls and puts
///
/// ```text
/// ν = S e^(-qT) φ(d₁) √T
/// ```
pub fn bs_vega(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    vega_with(p, &x)
}

fn vega_with(p: &BsParams, x: &Terms) -> f64 {
    p.s0 * x.disc_q * x.pdf_d1 * x.sqrt_t
}

/// Theta (-∂V/∂T)
///
/// ```text
/// call: -S e^(-qT) φ(d₁) σ/(2√T) - r K e^(-rT) Φ(d₂) + q S e^(-qT) Φ(d₁)
/// put:  -S e^(-qT) φ(d₁) σ/(2√T) + r K e^(-rT) Φ(-d₂) - q S e^(-qT) Φ(-d₁)
/// ```
pub fn bs_theta(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    let decay = -p.s0 * x.disc_q * x.pdf_d1 * p.vol / (2.0 * x.sqrt_t);
    match otype {
        OptionType::Call => {
            decay - p.r * p.k * x.disc_r * norm_cdf(x.d2) + p.q * p.s0 * x.disc_q * norm_cdf(x.d1)
        }
        OptionType::Put => {
            decay + p.r * p.k * x.disc_r * norm_cdf(-x.d2)
                - p.q * p.s0 * x.disc_q * norm_cdf(-x.d1)
        }
    }
}

/// Rho (∂V/∂r)
///
/// ```text
/// call:  K T e^(-rT) Φ(d₂)
/// put:  -K T e^(-rT) Φ(-d₂)
/// ```
pub fn bs_rho(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    match otype {
        OptionType::Call => p.k * p.t * x.disc_r * norm_cdf(x.d2),
        OptionType::Put => -p.k * p.t * x.disc_r * norm_cdf(-x.d2),
    }
}

/// Omega, the elasticity `Δ·S/V`. Unbounded as the price goes to zero.
pub fn bs_omega(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    delta_with(otype, &x) * p.s0 / price_with(otype, p, &x)
}

/// Gamma (∂²V/∂S²), identical for calls and puts
///
/// ```text
/// Γ = e^(-qT) φ(d₁) / (S σ √T)
/// ```
pub fn bs_gamma(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    gamma_with(p, &x)
}

fn gamma_with(p: &BsParams, x: &Terms) -> f64 {
    x.disc_q * x.pdf_d1 / (p.s0 * x.vol_sqrt_t)
}

/// Vanna (∂²V/∂S∂σ) = `-e^(-qT) φ(d₁) d₂ / σ`
pub fn bs_vanna(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    -x.disc_q * x.pdf_d1 * x.d2 / p.vol
}

/// Charm (-∂²V/∂T∂S)
///
/// ```text
/// call:  q e^(-qT) Φ(d₁)  - e^(-qT) φ(d₁) [2(r-q)T - d₂σ√T] / (2Tσ√T)
/// put:  -q e^(-qT) Φ(-d₁) - e^(-qT) φ(d₁) [2(r-q)T - d₂σ√T] / (2Tσ√T)
/// ```
pub fn bs_charm(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    let drift = x.disc_q * x.pdf_d1 * (2.0 * (p.r - p.q) * p.t - x.d2 * x.vol_sqrt_t)
        / (2.0 * p.t * x.vol_sqrt_t);
    match otype {
        OptionType::Call => p.q * x.disc_q * norm_cdf(x.d1) - drift,
        OptionType::Put => -p.q * x.disc_q * norm_cdf(-x.d1) - drift,
    }
}

/// Vomma (∂²V/∂σ²) = `ν d₁ d₂ / σ`
pub fn bs_vomma(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    vega_with(p, &x) * x.d1 * x.d2 / p.vol
}

/// Veta (∂²V/∂σ∂T)
///
/// ```text
/// -S e^(-qT) φ(d₁) √T [q + (r-q)d₁/(σ√T) - (1 + d₁d₂)/(2T)]
/// ```
pub fn bs_veta(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    -vega_with(p, &x)
        * (p.q + (p.r - p.q) * x.d1 / x.vol_sqrt_t - (1.0 + x.d1 * x.d2) / (2.0 * p.t))
}

/// Speed (∂³V/∂S³) = `-Γ/S · (d₁/(σ√T) + 1)`
pub fn bs_speed(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    -gamma_with(p, &x) / p.s0 * (x.d1 / x.vol_sqrt_t + 1.0)
}

/// Zomma (∂³V/∂S²∂σ) = `Γ (d₁d₂ - 1) / σ`
pub fn bs_zomma(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    gamma_with(p, &x) * (x.d1 * x.d2 - 1.0) / p.vol
}

/// Color (∂³V/∂S²∂T)
///
/// ```text
/// -e^(-qT) φ(d₁) / (2STσ√T) · [2qT + 1 + d₁ (2(r-q)T - d₂σ√T) / (σ√T)]
/// ```
pub fn bs_color(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    let bracket = 2.0 * p.q * p.t
        + 1.0
        + x.d1 * (2.0 * (p.r - p.q) * p.t - x.d2 * x.vol_sqrt_t) / x.vol_sqrt_t;
    -x.disc_q * x.pdf_d1 / (2.0 * p.s0 * p.t * x.vol_sqrt_t) * bracket
}

/// Ultima (∂³V/∂σ³) = `-ν/σ² · [d₁d₂(1 - d₁d₂) + d₁² + d₂²]`
pub fn bs_ultima(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    let d1d2 = x.d1 * x.d2;
    -vega_with(p, &x) / (p.vol * p.vol) * (d1d2 * (1.0 - d1d2) + x.d1 * x.d1 + x.d2 * x.d2)
}

/// Dual delta (∂V/∂K)
///
/// ```text
/// call: -e^(-rT) Φ(d₂)
/// put:   e^(-rT) Φ(-d₂)
/// ```
pub fn bs_dual_delta(otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    match otype {
        OptionType::Call => -x.disc_r * norm_cdf(x.d2),
        OptionType::Put => x.disc_r * norm_cdf(-x.d2),
    }
}

/// Dual gamma (∂²V/∂K²) = `e^(-rT) φ(d₂) / (K σ √T)`
pub fn bs_dual_gamma(_otype: OptionType, p: &BsParams) -> f64 {
    let x = Terms::new(p);
    x.disc_r * norm_pdf(x.d2) / (p.k * x.vol_sqrt_t)
}
