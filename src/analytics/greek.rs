// src/analytics/greek.rs
//! Output tags for the pricing model
//!
//! `Greek` names one of the 17 evaluable outputs (the price plus sixteen
//! sensitivities) and maps each onto its closed-form kernel. `GreekSet` is
//! the bitflag form used to request several outputs from a sweep at once.

use super::bs_analytic::{self, BsParams, OptionType};
use crate::error::{PricingError, PricingResult};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One evaluable output of the pricing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Greek {
    Price,
    Delta,
    Vega,
    Theta,
    Rho,
    Omega,
    Gamma,
    Vanna,
    Charm,
    Vomma,
    Veta,
    Speed,
    Zomma,
    Color,
    Ultima,
    DualDelta,
    DualGamma,
}

impl Greek {
    pub const ALL: [Greek; 17] = [
        Greek::Price,
        Greek::Delta,
        Greek::Vega,
        Greek::Theta,
        Greek::Rho,
        Greek::Omega,
        Greek::Gamma,
        Greek::Vanna,
        Greek::Charm,
        Greek::Vomma,
        Greek::Veta,
        Greek::Speed,
        Greek::Zomma,
        Greek::Color,
        Greek::Ultima,
        Greek::DualDelta,
        Greek::DualGamma,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Greek::Price => "price",
            Greek::Delta => "delta",
            Greek::Vega => "vega",
            Greek::Theta => "theta",
            Greek::Rho => "rho",
            Greek::Omega => "omega",
            Greek::Gamma => "gamma",
            Greek::Vanna => "vanna",
            Greek::Charm => "charm",
            Greek::Vomma => "vomma",
            Greek::Veta => "veta",
            Greek::Speed => "speed",
            Greek::Zomma => "zomma",
            Greek::Color => "color",
            Greek::Ultima => "ultima",
            Greek::DualDelta => "dualDelta",
            Greek::DualGamma => "dualGamma",
        }
    }

    /// Order of the derivative with respect to the model inputs (0 for price)
    pub fn order(self) -> u8 {
        match self {
            Greek::Price => 0,
            Greek::Delta
            | Greek::Vega
            | Greek::Theta
            | Greek::Rho
            | Greek::Omega
            | Greek::DualDelta => 1,
            Greek::Gamma | Greek::Vanna | Greek::Charm | Greek::Vomma | Greek::Veta | Greek::DualGamma => 2,
            Greek::Speed | Greek::Zomma | Greek::Color | Greek::Ultima => 3,
        }
    }

    /// True when the output is a linear functional of the price, so values of
    /// several positions can be summed.
    pub fn is_additive(self) -> bool {
        self != Greek::Omega
    }

    pub fn flag(self) -> GreekSet {
        match self {
            Greek::Price => GreekSet::PRICE,
            Greek::Delta => GreekSet::DELTA,
            Greek::Vega => GreekSet::VEGA,
            Greek::Theta => GreekSet::THETA,
            Greek::Rho => GreekSet::RHO,
            Greek::Omega => GreekSet::OMEGA,
            Greek::Gamma => GreekSet::GAMMA,
            Greek::Vanna => GreekSet::VANNA,
            Greek::Charm => GreekSet::CHARM,
            Greek::Vomma => GreekSet::VOMMA,
            Greek::Veta => GreekSet::VETA,
            Greek::Speed => GreekSet::SPEED,
            Greek::Zomma => GreekSet::ZOMMA,
            Greek::Color => GreekSet::COLOR,
            Greek::Ultima => GreekSet::ULTIMA,
            Greek::DualDelta => GreekSet::DUAL_DELTA,
            Greek::DualGamma => GreekSet::DUAL_GAMMA,
        }
    }

    /// Dispatch table from output tag to closed-form kernel.
    pub fn evaluate(self, otype: OptionType, p: &BsParams) -> f64 {
        let kernel: fn(OptionType, &BsParams) -> f64 = match self {
            Greek::Price => bs_analytic::bs_price,
            Greek::Delta => bs_analytic::bs_delta,
            Greek::Vega => bs_analytic::bs_vega,
            Greek::Theta => bs_analytic::bs_theta,
            Greek::Rho => bs_analytic::bs_rho,
            Greek::Omega => bs_analytic::bs_omega,
            Greek::Gamma => bs_analytic::bs_gamma,
            Greek::Vanna => bs_analytic::bs_vanna,
            Greek::Charm => bs_analytic::bs_charm,
            Greek::Vomma => bs_analytic::bs_vomma,
            Greek::Veta => bs_analytic::bs_veta,
            Greek::Speed => bs_analytic::bs_speed,
            Greek::Zomma => bs_analytic::bs_zomma,
            Greek::Color => bs_analytic::bs_color,
            Greek::Ultima => bs_analytic::bs_ultima,
            Greek::DualDelta => bs_analytic::bs_dual_delta,
            Greek::DualGamma => bs_analytic::bs_dual_gamma,
        };
        kernel(otype, p)
    }
}

impl fmt::Display for Greek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Greek {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Greek::ALL
            .iter()
            .copied()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| PricingError::UnknownOutput {
                name: s.to_string(),
            })
    }
}

bitflags! {
    /// Set of requested outputs
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct GreekSet: u32 {
        const PRICE      = 1 << 0;
        const DELTA      = 1 << 1;
        const VEGA       = 1 << 2;
        const THETA      = 1 << 3;
        const RHO        = 1 << 4;
        const OMEGA      = 1 << 5;
        const GAMMA      = 1 << 6;
        const VANNA      = 1 << 7;
        const CHARM      = 1 << 8;
        const VOMMA      = 1 << 9;
        const VETA       = 1 << 10;
        const SPEED      = 1 << 11;
        const ZOMMA      = 1 << 12;
        const COLOR      = 1 << 13;
        const ULTIMA     = 1 << 14;
        const DUAL_DELTA = 1 << 15;
        const DUAL_GAMMA = 1 << 16;

        const FIRST_ORDER = Self::DELTA.bits() | Self::VEGA.bits() | Self::THETA.bits()
            | Self::RHO.bits() | Self::OMEGA.bits() | Self::DUAL_DELTA.bits();
        const SECOND_ORDER = Self::GAMMA.bits() | Self::VANNA.bits() | Self::CHARM.bits()
            | Self::VOMMA.bits() | Self::VETA.bits() | Self::DUAL_GAMMA.bits();
        const THIRD_ORDER = Self::SPEED.bits() | Self::ZOMMA.bits() | Self::COLOR.bits()
            | Self::ULTIMA.bits();
        const EVERYTHING = Self::PRICE.bits() | Self::FIRST_ORDER.bits()
            | Self::SECOND_ORDER.bits() | Self::THIRD_ORDER.bits();
    }
}

impl GreekSet {
    /// Parse output names, failing on the first unknown one.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> PricingResult<GreekSet> {
        names.iter().try_fold(GreekSet::empty(), |set, name| {
            Ok(set | name.as_ref().parse::<Greek>()?.flag())
        })
    }

    /// Members in canonical `Greek::ALL` order
    pub fn greeks(self) -> impl Iterator<Item = Greek> {
        Greek::ALL
            .into_iter()
            .filter(move |g| self.contains(g.flag()))
    }
}

impl From<Greek> for GreekSet {
    fn from(greek: Greek) -> Self {
        greek.flag()
    }
}
