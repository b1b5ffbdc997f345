// src/sweep/grid.rs
//! Coordinate grid construction
//!
//! `meshgrid` follows the usual array-library convention: with `Indexing::Xy`
//! the first two axes are swapped, so sweeping `(S0: N points, T: M points)`
//! produces grids of shape `(M, N)` (rows follow the second parameter).
//! `Indexing::Ij` keeps axes in the order given.

use ndarray::{Array1, ArrayD};
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, PricingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Indexing {
    /// Cartesian: first two axes swapped
    #[default]
    Xy,
    /// Matrix: axis `i` of every grid follows input `i`
    Ij,
}

/// `steps` evenly spaced points from `min` to `max` inclusive.
///
/// The last point is `max` exactly; a single step yields `[min]`.
pub fn linspace(min: f64, max: f64, steps: usize) -> Array1<f64> {
    if steps < 2 {
        return Array1::from_elem(steps, min);
    }
    let step = (max - min) / (steps - 1) as f64;
    Array1::from_shape_fn(steps, |i| {
        if i + 1 == steps {
            max
        } else {
            min + step * i as f64
        }
    })
}

/// Full outer-product coordinate grids for any number of axes.
///
/// Every returned array has the same shape; grid `i` varies only along the
/// axis assigned to input `i` and is constant along all others.
pub fn meshgrid(axes: &[Array1<f64>], indexing: Indexing) -> Vec<ArrayD<f64>> {
    let mut shape: Vec<usize> = axes.iter().map(|a| a.len()).collect();
    let mut position: Vec<usize> = (0..axes.len()).collect();
    if indexing == Indexing::Xy && axes.len() >= 2 {
        shape.swap(0, 1);
        position.swap(0, 1);
    }

    axes.iter()
        .zip(position)
        .map(|(values, axis)| ArrayD::from_shape_fn(shape.clone(), |idx| values[idx[axis]]))
        .collect()
}

/// Broadcast shape of several array shapes.
///
/// Shapes are aligned on their trailing axes; each axis must either match or
/// be 1 (or absent), as in NumPy.
pub fn broadcast_shape(shapes: &[&[usize]]) -> PricingResult<Vec<usize>> {
    let ndim = shapes.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut out = vec![1usize; ndim];

    for shape in shapes {
        let offset = ndim - shape.len();
        for (i, &len) in shape.iter().enumerate() {
            let slot = &mut out[offset + i];
            if *slot == 1 {
                *slot = len;
            } else if len != 1 && len != *slot {
                return Err(PricingError::ShapeMismatch {
                    left: out.clone(),
                    right: shape.to_vec(),
                });
            }
        }
    }
    Ok(out)
}
