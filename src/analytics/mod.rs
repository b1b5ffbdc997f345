// src/analytics/mod.rs
//! Closed-form pricing model: prices, Greeks and implied volatility.

pub mod bs_analytic;
pub mod greek;
pub mod implied_vol;

pub use bs_analytic::{BsParams, OptionType};
pub use greek::{Greek, GreekSet};
pub use implied_vol::{implied_volatility, ImpliedVolConfig};
