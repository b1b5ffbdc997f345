//! # bsm-sweep: Black-Scholes-Merton Greeks and Parameter Sweeps
//!
//! A Rust library for pricing European options under Black-Scholes-Merton
//! with a continuous dividend yield, computing sixteen closed-form
//! sensitivities up to third order, inverting market prices to implied
//! volatility, and evaluating any of these over grids of swept inputs.
//!
//! ## Key Features
//!
//! - **Closed-form Greeks**: delta through ultima, plus dual delta/gamma
//! - **Implied Volatility**: bounded, safeguarded Newton root-finding
//! - **Parameter Overrides**: evaluate at displaced inputs without mutating the option
//! - **Sweeps**: 1–3 swept parameters, meshgrid-style coordinate grids
//! - **Positions**: signed aggregation of long/short legs and time-decay profiles
//!
//! ## Quick Start
//!
//! ```rust
//! use bsm_sweep::analytics::{GreekSet, OptionType};
//! use bsm_sweep::contract::{OptionContract, Param, ParamOverrides};
//! use bsm_sweep::sweep::SweepSpec;
//!
//! let call = OptionContract::builder(OptionType::Call)
//!     .spot(100.0)
//!     .strike(100.0)
//!     .time_to_expiry(1.0)
//!     .volatility(0.2)
//!     .rate(0.05)
//!     .build()
//!     .expect("Valid option");
//!
//! assert!((call.market_price() - 10.4506).abs() < 1e-4);
//! assert!((call.delta(&ParamOverrides::new()) - 0.6368).abs() < 1e-4);
//!
//! let spec = SweepSpec::new()
//!     .axis(Param::S0, 80.0, 120.0, 41)
//!     .axis(Param::T, 0.1, 1.0, 10);
//! let surface = call
//!     .sweep(&spec, GreekSet::PRICE | GreekSet::GAMMA)
//!     .expect("Valid sweep");
//! assert_eq!(surface.shape(), &[10, 41]);
//! ```
//!
//! ## Mathematical Foundation
//!
//! All outputs are built from
//! ```text
//! d₁ = [ln(S/K) + (r - q + σ²/2)T] / (σ√T),   d₂ = d₁ - σ√T
//! ```
//! and are exact derivatives of the price, so they agree with finite
//! differences to the accuracy of the difference scheme.

// Module declarations
pub mod error;
pub mod math_utils;
pub mod analytics;
pub mod contract;
pub mod sweep;

// Re-export commonly used types for convenience
pub use analytics::{Greek, GreekSet, OptionType};
pub use contract::{OptionContract, Param, ParamOverrides, PositionDirection};
pub use error::{ErrorCategory, PricingError, PricingResult};
pub use sweep::{Portfolio, SweepResult, SweepSpec};
