//! Pour point pairing and unit hydrograph aggregation for hydrologic routing
//!
//! Re-exports [`routeagg_core`]. Building with the `python` feature produces the
//! `routeagg._lib` extension module.

#![deny(hidden_glob_reexports)]

pub use routeagg_core::*;

#[cfg(feature = "python")]
mod bindings;
