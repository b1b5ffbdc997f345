// src/contract/params.rs
//! Parameter names and partial overrides
//!
//! Every pricing call evaluates at the option's stored parameters unless an
//! override is supplied. Overrides are merged onto the stored values; the
//! option itself never changes.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::analytics::BsParams;
use crate::error::PricingError;

/// One of the six pricing inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Param {
    #[serde(rename = "S0")]
    S0,
    #[serde(rename = "K")]
    K,
    #[serde(rename = "vol")]
    Vol,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "T")]
    T,
    #[serde(rename = "q")]
    Q,
}

impl Param {
    pub const ALL: [Param; 6] = [Param::S0, Param::K, Param::Vol, Param::R, Param::T, Param::Q];

    pub fn as_str(self) -> &'static str {
        match self {
            Param::S0 => "S0",
            Param::K => "K",
            Param::Vol => "vol",
            Param::R => "r",
            Param::T => "T",
            Param::Q => "q",
        }
    }

    /// S0, K, vol and T are only meaningful when strictly positive
    pub fn requires_positive(self) -> bool {
        matches!(self, Param::S0 | Param::K | Param::Vol | Param::T)
    }

    pub fn get(self, p: &BsParams) -> f64 {
        match self {
            Param::S0 => p.s0,
            Param::K => p.k,
            Param::Vol => p.vol,
            Param::R => p.r,
            Param::T => p.t,
            Param::Q => p.q,
        }
    }

    pub fn set(self, p: &mut BsParams, value: f64) {
        match self {
            Param::S0 => p.s0 = value,
            Param::K => p.k = value,
            Param::Vol => p.vol = value,
            Param::R => p.r = value,
            Param::T => p.t = value,
            Param::Q => p.q = value,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Param {
    type Err = PricingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Param::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PricingError::UnknownParameter {
                name: s.to_string(),
            })
    }
}

/// Partial set of scalar overrides. Unset fields fall back to the option.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParamOverrides {
    pub s0: Option<f64>,
    pub k: Option<f64>,
    pub vol: Option<f64>,
    pub r: Option<f64>,
    pub t: Option<f64>,
    pub q: Option<f64>,
}

impl ParamOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn s0(mut self, value: f64) -> Self {
        self.s0 = Some(value);
        self
    }

    pub fn k(mut self, value: f64) -> Self {
        self.k = Some(value);
        self
    }

    pub fn vol(mut self, value: f64) -> Self {
        self.vol = Some(value);
        self
    }

    pub fn r(mut self, value: f64) -> Self {
        self.r = Some(value);
        self
    }

    pub fn t(mut self, value: f64) -> Self {
        self.t = Some(value);
        self
    }

    pub fn q(mut self, value: f64) -> Self {
        self.q = Some(value);
        self
    }

    pub fn with(mut self, param: Param, value: f64) -> Self {
        *self.slot(param) = Some(value);
        self
    }

    fn slot(&mut self, param: Param) -> &mut Option<f64> {
        match param {
            Param::S0 => &mut self.s0,
            Param::K => &mut self.k,
            Param::Vol => &mut self.vol,
            Param::R => &mut self.r,
            Param::T => &mut self.t,
            Param::Q => &mut self.q,
        }
    }

    /// Stored defaults with every set override substituted.
    pub fn merge_onto(&self, defaults: &BsParams) -> BsParams {
        BsParams {
            s0: self.s0.unwrap_or(defaults.s0),
            k: self.k.unwrap_or(defaults.k),
            vol: self.vol.unwrap_or(defaults.vol),
            r: self.r.unwrap_or(defaults.r),
            t: self.t.unwrap_or(defaults.t),
            q: self.q.unwrap_or(defaults.q),
        }
    }
}

/// Array-valued overrides for broadcast evaluation.
///
/// A missing entry is the option's stored scalar. Present entries may have
/// any shapes that broadcast together (a 0-d array acts as a scalar).
#[derive(Debug, Clone, Default)]
pub struct GridOverrides {
    entries: [Option<ArrayD<f64>>; 6],
}

impl GridOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, param: Param, values: ArrayD<f64>) -> Self {
        self.set(param, values);
        self
    }

    pub fn set(&mut self, param: Param, values: ArrayD<f64>) {
        self.entries[param as usize] = Some(values);
    }

    pub fn get(&self, param: Param) -> Option<&ArrayD<f64>> {
        self.entries[param as usize].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BsParams {
        BsParams {
            s0: 100.0,
            k: 95.0,
            vol: 0.2,
            r: 0.01,
            t: 0.5,
            q: 0.0,
        }
    }

    #[test]
    fn test_merge_only_touches_set_fields() {
        let merged = ParamOverrides::new().vol(0.3).t(0.25).merge_onto(&base());
        assert_eq!(merged.vol, 0.3);
        assert_eq!(merged.t, 0.25);
        assert_eq!(merged.s0, 100.0);
        assert_eq!(merged.k, 95.0);
    }

    #[test]
    fn test_param_names() {
        for p in Param::ALL {
            assert_eq!(p.as_str().parse::<Param>().unwrap(), p);
        }
        assert!("sigma".parse::<Param>().is_err());
    }

    #[test]
    fn test_serialized_names_match_public_names() {
        for p in Param::ALL {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.as_str()));
            assert_eq!(serde_json::from_str::<Param>(&json).unwrap(), p);
        }
    }

    #[test]
    fn test_get_set() {
        let mut p = base();
        Param::Q.set(&mut p, 0.03);
        assert_eq!(Param::Q.get(&p), 0.03);
        let via_with = ParamOverrides::new().with(Param::K, 120.0).merge_onto(&base());
        assert_eq!(via_with.k, 120.0);
    }
}
