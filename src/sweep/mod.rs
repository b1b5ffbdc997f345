// src/sweep/mod.rs
//! Sweep engine: evaluate pricing outputs over grids of 1–3 swept parameters.

pub mod engine;
pub mod grid;
pub mod portfolio;

pub use engine::{SweepAxis, SweepResult, SweepSpec, SweepValue};
pub use grid::Indexing;
pub use portfolio::{DecayProfile, DecaySnapshot, Portfolio, PortfolioSweep};
