//! Pour point pairing and unit hydrograph aggregation
//!
//! Two independent steps of a hydrologic routing pre-processor:
//!
//! - [`pairing`] assigns scattered pour points to the nearest cell of a coarse
//!   [`TargetDomain`](domain::TargetDomain) and groups them into outlets.
//! - [`merge`] folds per-outlet unit hydrograph grids into one grid covering all of them,
//!   optionally normalizing each land cell's response to sum to one.
//!
//! Both are pure, synchronous functions of their inputs.

pub mod accumulate;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod errors;
pub mod merge;
pub mod pairing;
pub mod point;
#[cfg(feature = "python")]
pub mod python;
pub mod spatial_index;
pub mod utils;

/// Floating point type used for coordinates and weights
pub type FloatValue = f64;
