// src/sweep/engine.rs
//! Parametric sweeps of the pricing model
//!
//! # Algorithm
//!
//! 1. Each swept parameter becomes `steps` evenly spaced points on `[min, max]`
//! 2. The axes are expanded into full coordinate grids (see [`meshgrid`])
//! 3. Parameters that are not swept stay at the option's stored values
//! 4. Every requested output is evaluated elementwise over the grid
//!
//! The parameter grid is assembled once and shared by all requested outputs.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::grid::{linspace, meshgrid, Indexing};
use crate::analytics::{Greek, GreekSet};
use crate::contract::{GridOverrides, OptionContract, Param};
use crate::error::{validation::*, PricingError, PricingResult};

/// One swept dimension
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub param: Param,
    pub min: f64,
    pub max: f64,
    pub steps: usize,
}

impl SweepAxis {
    pub fn new(param: Param, min: f64, max: f64, steps: usize) -> Self {
        SweepAxis {
            param,
            min,
            max,
            steps,
        }
    }

    pub fn validate(&self) -> PricingResult<()> {
        let name = self.param.as_str();
        validate_finite(name, self.min)?;
        validate_finite(name, self.max)?;
        validate_steps(name, self.steps)?;
        if self.param.requires_positive() {
            validate_positive(name, self.min)?;
            validate_positive(name, self.max)?;
        }
        if self.param == Param::Q {
            validate_non_negative(name, self.min)?;
            validate_non_negative(name, self.max)?;
        }
        Ok(())
    }
}

/// Ordered list of swept parameters.
///
/// Axis order matters: it fixes which grid dimension each parameter runs
/// along (subject to [`Indexing`]).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SweepSpec {
    axes: Vec<SweepAxis>,
    indexing: Indexing,
}

impl SweepSpec {
    /// Grid construction is N-dimensional, but sweeps are limited to three
    /// axes to match the surface/volume views they feed.
    pub const MAX_AXES: usize = 3;

    /// Upper limit on the total number of grid points across all axes.
    /// Each point holds one parameter tuple plus one value per output.
    pub const MAX_GRID_POINTS: usize = 10_000_000;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(mut self, param: Param, min: f64, max: f64, steps: usize) -> Self {
        self.axes.push(SweepAxis::new(param, min, max, steps));
        self
    }

    pub fn indexing(mut self, indexing: Indexing) -> Self {
        self.indexing = indexing;
        self
    }

    /// Build from `(name, (min, max, steps))` pairs, names as in [`Param::as_str`].
    pub fn from_named<S: AsRef<str>>(entries: &[(S, (f64, f64, usize))]) -> PricingResult<Self> {
        let axes = entries
            .iter()
            .map(|(name, (min, max, steps))| {
                Ok(SweepAxis::new(name.as_ref().parse()?, *min, *max, *steps))
            })
            .collect::<PricingResult<Vec<_>>>()?;
        Ok(SweepSpec {
            axes,
            indexing: Indexing::default(),
        })
    }

    pub fn axes(&self) -> &[SweepAxis] {
        &self.axes
    }

    pub fn is_swept(&self, param: Param) -> bool {
        self.axes.iter().any(|a| a.param == param)
    }

    pub fn validate(&self) -> PricingResult<()> {
        if self.axes.is_empty() {
            return Err(PricingError::invalid_sweep(
                "at least one sweep dimension is required",
            ));
        }
        if self.axes.len() > Self::MAX_AXES {
            return Err(PricingError::invalid_sweep(format!(
                "{} axes requested, at most {} supported",
                self.axes.len(),
                Self::MAX_AXES
            )));
        }
        for (i, axis) in self.axes.iter().enumerate() {
            if self.axes[..i].iter().any(|a| a.param == axis.param) {
                return Err(PricingError::invalid_sweep(format!(
                    "parameter '{}' swept more than once",
                    axis.param
                )));
            }
            axis.validate()?;
        }
        let points = self
            .axes
            .iter()
            .try_fold(1usize, |acc, a| acc.checked_mul(a.steps))
            .filter(|&n| n <= Self::MAX_GRID_POINTS);
        if points.is_none() {
            return Err(PricingError::invalid_sweep(format!(
                "grid of {} points exceeds the maximum of {}",
                self.axes
                    .iter()
                    .map(|a| a.steps.to_string())
                    .collect::<Vec<_>>()
                    .join(" x "),
                Self::MAX_GRID_POINTS
            )));
        }
        Ok(())
    }

    /// Coordinate grid for every axis, in axis order
    pub fn coordinate_grids(&self) -> Vec<ArrayD<f64>> {
        let vectors: Vec<_> = self
            .axes
            .iter()
            .map(|a| linspace(a.min, a.max, a.steps))
            .collect();
        meshgrid(&vectors, self.indexing)
    }
}

/// A single named entry of a [`SweepResult`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SweepValue<'a> {
    Scalar(f64),
    Grid(&'a ArrayD<f64>),
}

impl<'a> SweepValue<'a> {
    pub fn as_scalar(self) -> Option<f64> {
        match self {
            SweepValue::Scalar(v) => Some(v),
            SweepValue::Grid(_) => None,
        }
    }

    pub fn as_grid(self) -> Option<&'a ArrayD<f64>> {
        match self {
            SweepValue::Scalar(_) => None,
            SweepValue::Grid(g) => Some(g),
        }
    }
}

/// Coordinates, held constants and evaluated outputs of one sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepResult {
    shape: Vec<usize>,
    coordinates: BTreeMap<Param, ArrayD<f64>>,
    constants: BTreeMap<Param, f64>,
    outputs: BTreeMap<Greek, ArrayD<f64>>,
}

impl SweepResult {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn coordinate(&self, param: Param) -> Option<&ArrayD<f64>> {
        self.coordinates.get(&param)
    }

    pub fn constant(&self, param: Param) -> Option<f64> {
        self.constants.get(&param).copied()
    }

    pub fn output(&self, greek: Greek) -> Option<&ArrayD<f64>> {
        self.outputs.get(&greek)
    }

    pub fn outputs(&self) -> impl Iterator<Item = (Greek, &ArrayD<f64>)> {
        self.outputs.iter().map(|(g, a)| (*g, a))
    }

    /// Look up any entry by its public name (`"S0"`, `"vol"`, `"price"`, `"dualDelta"`, ...)
    pub fn get(&self, name: &str) -> Option<SweepValue<'_>> {
        if let Ok(param) = name.parse::<Param>() {
            return self
                .coordinate(param)
                .map(SweepValue::Grid)
                .or_else(|| self.constant(param).map(SweepValue::Scalar));
        }
        name.parse::<Greek>()
            .ok()
            .and_then(|g| self.output(g))
            .map(SweepValue::Grid)
    }

    /// All entry names: swept and constant parameters first, then outputs
    pub fn names(&self) -> Vec<&'static str> {
        Param::ALL
            .iter()
            .map(|p| p.as_str())
            .chain(self.outputs.keys().map(|g| g.as_str()))
            .collect()
    }

    pub(crate) fn into_parts(self) -> (BTreeMap<Param, ArrayD<f64>>, BTreeMap<Greek, ArrayD<f64>>) {
        (self.coordinates, self.outputs)
    }
}

impl OptionContract {
    /// Evaluate `outputs` over the grid described by `spec`.
    ///
    /// # Errors
    ///
    /// - `InvalidSweep` for zero axes, more than [`SweepSpec::MAX_AXES`],
    ///   a repeated parameter, zero steps, more than
    ///   [`SweepSpec::MAX_GRID_POINTS`] points in total or an empty output set
    /// - `InvalidParameters` for non-finite bounds, non-positive bounds on
    ///   S0, K, vol or T, or negative bounds on q
    pub fn sweep(&self, spec: &SweepSpec, outputs: GreekSet) -> PricingResult<SweepResult> {
        spec.validate()?;
        if outputs.is_empty() {
            return Err(PricingError::invalid_sweep("at least one output is required"));
        }

        let mut overrides = GridOverrides::new();
        let mut coordinates = BTreeMap::new();
        for (axis, grid) in spec.axes().iter().zip(spec.coordinate_grids()) {
            overrides.set(axis.param, grid.clone());
            coordinates.insert(axis.param, grid);
        }

        let stored = self.params();
        let constants: BTreeMap<Param, f64> = Param::ALL
            .iter()
            .filter(|p| !spec.is_swept(**p))
            .map(|p| (*p, p.get(&stored)))
            .collect();

        let params = self.param_grid(&overrides)?;
        let shape = params.shape().to_vec();
        debug!(?shape, outputs = outputs.bits(), "evaluating sweep");

        let otype = self.option_type();
        let outputs = outputs
            .greeks()
            .map(|greek| (greek, params.map(|p| greek.evaluate(otype, p))))
            .collect();

        Ok(SweepResult {
            shape,
            coordinates,
            constants,
            outputs,
        })
    }

    /// String-keyed sweep. Unknown parameter or output names are errors.
    pub fn sweep_named<S: AsRef<str>, O: AsRef<str>>(
        &self,
        axes: &[(S, (f64, f64, usize))],
        outputs: &[O],
    ) -> PricingResult<SweepResult> {
        let spec = SweepSpec::from_named(axes)?;
        let outputs = GreekSet::from_names(outputs)?;
        self.sweep(&spec, outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::OptionType;
    use crate::contract::ParamOverrides;
    use crate::error::ErrorCategory;
    use approx::assert_relative_eq;
    use ndarray::IxDyn;

    fn option() -> OptionContract {
        OptionContract::new(OptionType::Put, 100.0, 105.0, 0.5, 0.3, 0.02, 0.01).unwrap()
    }

    #[test]
    fn test_spec_validation() {
        assert_eq!(
            SweepSpec::new().validate().unwrap_err().category(),
            ErrorCategory::SweepSpec
        );
        let four = SweepSpec::new()
            .axis(Param::S0, 80.0, 120.0, 5)
            .axis(Param::K, 80.0, 120.0, 5)
            .axis(Param::Vol, 0.1, 0.5, 5)
            .axis(Param::T, 0.1, 1.0, 5);
        assert!(four.validate().is_err());
        let dup = SweepSpec::new()
            .axis(Param::S0, 80.0, 120.0, 5)
            .axis(Param::S0, 90.0, 110.0, 5);
        assert!(dup.validate().is_err());
        let bad_vol = SweepSpec::new().axis(Param::Vol, 0.0, 0.5, 5);
        assert_eq!(bad_vol.validate().unwrap_err().category(), ErrorCategory::Input);
        let negative_rate = SweepSpec::new().axis(Param::R, -0.01, 0.05, 5);
        assert!(negative_rate.validate().is_ok());
    }

    #[test]
    fn test_total_grid_size_is_capped() {
        let huge = SweepSpec::new()
            .axis(Param::S0, 80.0, 120.0, 100_000)
            .axis(Param::K, 80.0, 120.0, 100_000)
            .axis(Param::Vol, 0.1, 0.5, 100_000);
        let err = huge.validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::SweepSpec);
        assert!(option().sweep(&huge, GreekSet::PRICE).is_err());

        let at_limit = SweepSpec::new()
            .axis(Param::S0, 80.0, 120.0, 10_000)
            .axis(Param::K, 80.0, 120.0, 1_000);
        assert!(at_limit.validate().is_ok());
        let over_limit = at_limit.axis(Param::T, 0.1, 1.0, 2);
        assert!(over_limit.validate().is_err());
    }

    #[test]
    fn test_dividend_axis_must_be_non_negative() {
        let negative_q = SweepSpec::new().axis(Param::Q, -0.5, 0.0, 3);
        let err = option().sweep(&negative_q, GreekSet::PRICE).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Input);
        assert!(SweepSpec::new().axis(Param::Q, 0.0, 0.05, 3).validate().is_ok());
    }

    #[test]
    fn test_from_named_rejects_unknown() {
        assert!(SweepSpec::from_named(&[("sigma", (0.1, 0.2, 3))]).is_err());
        let spec = SweepSpec::from_named(&[("vol", (0.1, 0.2, 3))]).unwrap();
        assert_eq!(spec.axes()[0].param, Param::Vol);
    }

    #[test]
    fn test_grid_values_match_scalar_calls() {
        let opt = option();
        let spec = SweepSpec::new()
            .axis(Param::S0, 90.0, 110.0, 5)
            .axis(Param::Vol, 0.2, 0.4, 3);
        let res = opt.sweep(&spec, GreekSet::PRICE | GreekSet::VANNA).unwrap();
        assert_eq!(res.shape(), &[3, 5]);

        let s0 = res.coordinate(Param::S0).unwrap();
        let vol = res.coordinate(Param::Vol).unwrap();
        let vanna = res.output(Greek::Vanna).unwrap();
        let idx = IxDyn(&[2, 1]);
        assert_eq!(s0[idx.clone()], 95.0);
        assert_eq!(vol[idx.clone()], 0.4);
        assert_relative_eq!(
            vanna[idx.clone()],
            opt.vanna(&ParamOverrides::new().s0(95.0).vol(0.4)),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_constants_and_names() {
        let opt = option();
        let res = opt
            .sweep_named(&[("T", (0.1, 1.0, 4))], &["price", "theta"])
            .unwrap();
        assert_eq!(res.constant(Param::K), Some(105.0));
        assert_eq!(res.constant(Param::T), None);
        assert_eq!(res.get("q").and_then(|v| v.as_scalar()), Some(0.01));
        assert_eq!(res.get("T").and_then(|v| v.as_grid()).map(|g| g.len()), Some(4));
        assert!(res.get("theta").is_some());
        assert!(res.get("gamma").is_none());
        assert_eq!(res.names().len(), 8);
    }

    #[test]
    fn test_unknown_output_fails_loudly() {
        let err = option()
            .sweep_named(&[("S0", (90.0, 110.0, 3))], &["price", "lambda"])
            .unwrap_err();
        assert!(matches!(err, PricingError::UnknownOutput { .. }));
    }

    #[test]
    fn test_empty_outputs_rejected() {
        let spec = SweepSpec::new().axis(Param::S0, 90.0, 110.0, 3);
        assert!(option().sweep(&spec, GreekSet::empty()).is_err());
    }
}
