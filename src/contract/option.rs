// src/contract/option.rs
//! European option contract
//!
//! An `OptionContract` is built once and never mutated. Exactly one of
//! volatility or market price is supplied at construction and the other is
//! derived:
//! - volatility given → market price is the model price
//! - market price given → volatility is the implied volatility
//!
//! Time to expiry is either given in years or derived from an expiry date
//! through a [`TradingCalendar`].

use chrono::NaiveDate;
use ndarray::{ArrayD, Dimension, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::calendar::{year_fraction_to_expiry, TradingCalendar, WeekdayCalendar};
use super::params::{GridOverrides, Param, ParamOverrides};
use crate::analytics::{implied_volatility, BsParams, Greek, ImpliedVolConfig, OptionType};
use crate::error::{validation::*, PricingError, PricingResult};
use crate::sweep::grid::broadcast_shape;

pub const DEFAULT_RISK_FREE_RATE: f64 = 0.025;

/// Below this many years the closed forms lose precision quickly
const SHORT_EXPIRY_WARNING: f64 = 1e-4;

/// Long or short holding. Does not enter the pricing formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PositionDirection {
    #[default]
    Long,
    Short,
}

impl PositionDirection {
    pub fn sign(self) -> f64 {
        match self {
            PositionDirection::Long => 1.0,
            PositionDirection::Short => -1.0,
        }
    }
}

impl fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionDirection::Long => write!(f, "Long"),
            PositionDirection::Short => write!(f, "Short"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionContract {
    option_type: OptionType,
    direction: PositionDirection,
    params: BsParams,
    market_price: f64,
    expiry_date: Option<NaiveDate>,
}

impl OptionContract {
    pub fn builder<'a>(option_type: OptionType) -> OptionBuilder<'a> {
        OptionBuilder::new(option_type)
    }

    /// Shorthand for the common case of a known volatility and year fraction.
    pub fn new(
        option_type: OptionType,
        s0: f64,
        k: f64,
        t: f64,
        vol: f64,
        r: f64,
        q: f64,
    ) -> PricingResult<Self> {
        OptionBuilder::new(option_type)
            .spot(s0)
            .strike(k)
            .time_to_expiry(t)
            .volatility(vol)
            .rate(r)
            .dividend_yield(q)
            .build()
    }

    pub fn option_type(&self) -> OptionType {
        self.option_type
    }

    pub fn direction(&self) -> PositionDirection {
        self.direction
    }

    pub fn params(&self) -> BsParams {
        self.params
    }

    pub fn s0(&self) -> f64 {
        self.params.s0
    }

    pub fn strike(&self) -> f64 {
        self.params.k
    }

    pub fn volatility(&self) -> f64 {
        self.params.vol
    }

    pub fn rate(&self) -> f64 {
        self.params.r
    }

    pub fn time_to_expiry(&self) -> f64 {
        self.params.t
    }

    pub fn dividend_yield(&self) -> f64 {
        self.params.q
    }

    pub fn market_price(&self) -> f64 {
        self.market_price
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    /// Stored parameters with `overrides` substituted
    pub fn resolve(&self, overrides: &ParamOverrides) -> BsParams {
        overrides.merge_onto(&self.params)
    }

    pub fn evaluate(&self, greek: Greek, overrides: &ParamOverrides) -> f64 {
        greek.evaluate(self.option_type, &self.resolve(overrides))
    }

    pub fn price(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Price, overrides)
    }

    pub fn delta(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Delta, overrides)
    }

    pub fn vega(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Vega, overrides)
    }

    pub fn theta(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Theta, overrides)
    }

    pub fn rho(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Rho, overrides)
    }

    pub fn omega(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Omega, overrides)
    }

    pub fn gamma(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Gamma, overrides)
    }

    pub fn vanna(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Vanna, overrides)
    }

    pub fn charm(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Charm, overrides)
    }

    pub fn vomma(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Vomma, overrides)
    }

    pub fn veta(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Veta, overrides)
    }

    pub fn speed(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Speed, overrides)
    }

    pub fn zomma(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Zomma, overrides)
    }

    pub fn color(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Color, overrides)
    }

    pub fn ultima(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::Ultima, overrides)
    }

    pub fn dual_delta(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::DualDelta, overrides)
    }

    pub fn dual_gamma(&self, overrides: &ParamOverrides) -> f64 {
        self.evaluate(Greek::DualGamma, overrides)
    }

    /// Elementwise evaluation over array-valued overrides.
    ///
    /// Inputs are broadcast against each other; parameters without an entry
    /// take the stored scalar. The result has the broadcast shape.
    pub fn evaluate_broadcast(
        &self,
        greek: Greek,
        overrides: &GridOverrides,
    ) -> PricingResult<ArrayD<f64>> {
        let grid = self.param_grid(overrides)?;
        Ok(grid.map(|p| greek.evaluate(self.option_type, p)))
    }

    /// Bundle array overrides into one array of parameter tuples.
    pub(crate) fn param_grid(&self, overrides: &GridOverrides) -> PricingResult<ArrayD<BsParams>> {
        let present: Vec<(Param, &ArrayD<f64>)> = Param::ALL
            .iter()
            .filter_map(|&p| overrides.get(p).map(|a| (p, a)))
            .collect();
        let shapes: Vec<&[usize]> = present.iter().map(|(_, a)| a.shape()).collect();
        let shape = broadcast_shape(&shapes)?;

        let mut views = Vec::with_capacity(present.len());
        for (param, values) in &present {
            let view = values
                .broadcast(IxDyn(&shape))
                .ok_or_else(|| PricingError::ShapeMismatch {
                    left: shape.clone(),
                    right: values.shape().to_vec(),
                })?;
            views.push((*param, view));
        }

        let base = self.params;
        Ok(ArrayD::from_shape_fn(shape, |idx| {
            let mut p = base;
            for (param, view) in &views {
                param.set(&mut p, view[idx.slice()]);
            }
            p
        }))
    }

    /// Copy with substituted parameters, revalidated, market price re-derived.
    pub fn displaced(&self, overrides: &ParamOverrides) -> PricingResult<OptionContract> {
        let params = self.resolve(overrides);
        validate_params(&params)?;
        Ok(OptionContract {
            market_price: Greek::Price.evaluate(self.option_type, &params),
            params,
            ..self.clone()
        })
    }
}

impl fmt::Display for OptionContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} K={} S0={} T={:.6} vol={:.6} r={} q={} price={:.6}",
            self.direction,
            self.option_type,
            self.params.k,
            self.params.s0,
            self.params.t,
            self.params.vol,
            self.params.r,
            self.params.q,
            self.market_price
        )
    }
}

fn validate_params(p: &BsParams) -> PricingResult<()> {
    validate_positive("S0", p.s0)?;
    validate_positive("K", p.k)?;
    validate_positive("vol", p.vol)?;
    validate_positive("T", p.t)?;
    validate_finite("r", p.r)?;
    validate_non_negative("q", p.q)?;
    Ok(())
}

/// Builder implementing option construction with input checking.
pub struct OptionBuilder<'a> {
    option_type: OptionType,
    direction: PositionDirection,
    s0: Option<f64>,
    k: Option<f64>,
    r: f64,
    q: f64,
    t: Option<f64>,
    expiry_date: Option<NaiveDate>,
    as_of: Option<NaiveDate>,
    calendar: Option<&'a dyn TradingCalendar>,
    vol: Option<f64>,
    market_price: Option<f64>,
    iv_config: ImpliedVolConfig,
}

impl<'a> OptionBuilder<'a> {
    pub fn new(option_type: OptionType) -> Self {
        OptionBuilder {
            option_type,
            direction: PositionDirection::Long,
            s0: None,
            k: None,
            r: DEFAULT_RISK_FREE_RATE,
            q: 0.0,
            t: None,
            expiry_date: None,
            as_of: None,
            calendar: None,
            vol: None,
            market_price: None,
            iv_config: ImpliedVolConfig::default(),
        }
    }

    pub fn direction(mut self, direction: PositionDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn spot(mut self, s0: f64) -> Self {
        self.s0 = Some(s0);
        self
    }

    pub fn strike(mut self, k: f64) -> Self {
        self.k = Some(k);
        self
    }

    pub fn rate(mut self, r: f64) -> Self {
        self.r = r;
        self
    }

    pub fn dividend_yield(mut self, q: f64) -> Self {
        self.q = q;
        self
    }

    pub fn time_to_expiry(mut self, t: f64) -> Self {
        self.t = Some(t);
        self
    }

    pub fn expiry_date(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Valuation date for expiry-date inputs (defaults to the local date)
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = Some(date);
        self
    }

    pub fn calendar(mut self, calendar: &'a dyn TradingCalendar) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn volatility(mut self, vol: f64) -> Self {
        self.vol = Some(vol);
        self
    }

    pub fn market_price(mut self, price: f64) -> Self {
        self.market_price = Some(price);
        self
    }

    pub fn implied_vol_config(mut self, cfg: ImpliedVolConfig) -> Self {
        self.iv_config = cfg;
        self
    }

    pub fn build(self) -> PricingResult<OptionContract> {
        let s0 = self
            .s0
            .ok_or_else(|| PricingError::missing("S0", "an underlying price is required"))?;
        let k = self
            .k
            .ok_or_else(|| PricingError::missing("K", "a strike is required"))?;
        let t = self.resolve_expiry()?;

        let mut params = BsParams {
            s0,
            k,
            vol: f64::NAN,
            r: self.r,
            t,
            q: self.q,
        };

        let market_price = match (self.vol, self.market_price) {
            (None, None) => {
                return Err(PricingError::missing(
                    "vol",
                    "supply either a volatility or a market price",
                ))
            }
            (Some(_), Some(_)) => {
                return Err(PricingError::ConflictingInputs {
                    first: "vol".to_string(),
                    second: "market_price".to_string(),
                })
            }
            (Some(vol), None) => {
                params.vol = vol;
                validate_params(&params)?;
                Greek::Price.evaluate(self.option_type, &params)
            }
            (None, Some(price)) => {
                params.vol = self.iv_config.initial_guess;
                validate_params(&params)?;
                validate_non_negative("market_price", price)?;
                params.vol = implied_volatility(self.option_type, price, &params, &self.iv_config)?;
                debug!(price, vol = params.vol, "derived implied volatility");
                price
            }
        };

        if params.t < SHORT_EXPIRY_WARNING {
            warn!(t = params.t, "time to expiry is very short; higher-order Greeks are unstable");
        }

        Ok(OptionContract {
            option_type: self.option_type,
            direction: self.direction,
            params,
            market_price,
            expiry_date: self.expiry_date,
        })
    }

    fn resolve_expiry(&self) -> PricingResult<f64> {
        match (self.t, self.expiry_date) {
            (None, None) => Err(PricingError::missing(
                "T",
                "supply either a time to expiry or an expiry date",
            )),
            (Some(_), Some(_)) => Err(PricingError::ConflictingInputs {
                first: "T".to_string(),
                second: "expiry_date".to_string(),
            }),
            (Some(t), None) => Ok(t),
            (None, Some(expiry)) => {
                let today = self
                    .as_of
                    .unwrap_or_else(|| chrono::Local::now().date_naive());
                let default_calendar = WeekdayCalendar::new();
                let calendar: &dyn TradingCalendar = match self.calendar {
                    Some(cal) => cal,
                    None => &default_calendar,
                };
                year_fraction_to_expiry(calendar, today, expiry)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use approx::assert_relative_eq;
    use ndarray::{arr0, array};

    fn reference_call() -> OptionContract {
        OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.2, 0.05, 0.0).unwrap()
    }

    #[test]
    fn test_reference_values() {
        let opt = reference_call();
        let none = ParamOverrides::new();
        assert_relative_eq!(opt.market_price(), 10.4506, epsilon = 1e-4);
        assert_relative_eq!(opt.price(&none), opt.market_price());
        assert_relative_eq!(opt.delta(&none), 0.6368, epsilon = 1e-4);
    }

    #[test]
    fn test_override_does_not_mutate() {
        let opt = reference_call();
        let shifted = opt.price(&ParamOverrides::new().s0(110.0));
        assert!(shifted > opt.market_price());
        assert_eq!(opt.s0(), 100.0);
    }

    #[test]
    fn test_missing_vol_and_price() {
        let err = OptionContract::builder(OptionType::Put)
            .spot(100.0)
            .strike(100.0)
            .time_to_expiry(1.0)
            .build()
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(matches!(err, PricingError::MissingInput { .. }));
    }

    #[test]
    fn test_missing_expiry() {
        let err = OptionContract::builder(OptionType::Call)
            .spot(100.0)
            .strike(100.0)
            .volatility(0.2)
            .build()
            .unwrap_err();
        assert!(matches!(err, PricingError::MissingInput { ref field, .. } if field == "T"));
    }

    #[test]
    fn test_conflicting_inputs() {
        let err = OptionContract::builder(OptionType::Call)
            .spot(100.0)
            .strike(100.0)
            .time_to_expiry(1.0)
            .volatility(0.2)
            .market_price(10.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, PricingError::ConflictingInputs { .. }));
    }

    #[test]
    fn test_non_positive_inputs_rejected() {
        assert!(OptionContract::new(OptionType::Call, -1.0, 100.0, 1.0, 0.2, 0.05, 0.0).is_err());
        assert!(OptionContract::new(OptionType::Call, 100.0, 0.0, 1.0, 0.2, 0.05, 0.0).is_err());
        assert!(OptionContract::new(OptionType::Call, 100.0, 100.0, 0.0, 0.2, 0.05, 0.0).is_err());
        assert!(OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.0, 0.05, 0.0).is_err());
    }

    #[test]
    fn test_from_market_price() {
        let opt = OptionContract::builder(OptionType::Call)
            .spot(100.0)
            .strike(100.0)
            .time_to_expiry(1.0)
            .rate(0.05)
            .market_price(10.450_583_572_185_565)
            .build()
            .unwrap();
        assert_relative_eq!(opt.volatility(), 0.2, epsilon = 1e-8);
    }

    #[test]
    fn test_expiry_date_with_calendar() {
        let as_of = NaiveDate::from_ymd_opt(2020, 9, 14).unwrap();
        let expiry = NaiveDate::from_ymd_opt(2020, 9, 18).unwrap();
        let cal = WeekdayCalendar::new();
        let opt = OptionContract::builder(OptionType::Put)
            .spot(334.54)
            .strike(325.0)
            .expiry_date(expiry)
            .as_of(as_of)
            .calendar(&cal)
            .volatility(0.25)
            .build()
            .unwrap();
        assert_eq!(opt.time_to_expiry(), 5.0 / 252.0);
        assert_eq!(opt.expiry_date(), Some(expiry));
        assert_eq!(opt.rate(), DEFAULT_RISK_FREE_RATE);
    }

    #[test]
    fn test_broadcast_mixed_shapes() {
        let opt = reference_call();
        let spots = array![[90.0], [100.0], [110.0]].into_dyn();
        let vols = array![0.1, 0.2].into_dyn();
        let overrides = GridOverrides::new()
            .with(Param::S0, spots)
            .with(Param::Vol, vols)
            .with(Param::R, arr0(0.05).into_dyn());
        let out = opt.evaluate_broadcast(Greek::Price, &overrides).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        assert_relative_eq!(out[IxDyn(&[1, 1])], opt.market_price(), epsilon = 1e-12);
        assert_relative_eq!(
            out[IxDyn(&[2, 0])],
            opt.price(&ParamOverrides::new().s0(110.0).vol(0.1)),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_broadcast_shape_mismatch() {
        let opt = reference_call();
        let overrides = GridOverrides::new()
            .with(Param::S0, array![90.0, 100.0, 110.0].into_dyn())
            .with(Param::K, array![95.0, 105.0].into_dyn());
        let err = opt.evaluate_broadcast(Greek::Delta, &overrides).unwrap_err();
        assert!(matches!(err, PricingError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_no_overrides_is_scalar() {
        let opt = reference_call();
        let out = opt
            .evaluate_broadcast(Greek::Gamma, &GridOverrides::new())
            .unwrap();
        assert_eq!(out.ndim(), 0);
        assert_relative_eq!(out.sum(), opt.gamma(&ParamOverrides::new()));
    }

    #[test]
    fn test_displaced_copy() {
        let opt = reference_call();
        let half = opt.displaced(&ParamOverrides::new().t(0.5)).unwrap();
        assert_eq!(half.time_to_expiry(), 0.5);
        assert!(half.market_price() < opt.market_price());
        assert_eq!(opt.time_to_expiry(), 1.0);
        assert!(opt.displaced(&ParamOverrides::new().vol(-0.1)).is_err());
    }
}
