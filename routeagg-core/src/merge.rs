//! Merging of unit hydrograph grids
//!
//! [`GridMerger::merge`] places one or two [`GriddedDataset`]s into a shared coordinate frame
//! that covers both of them, sums their contributions where they overlap, and optionally
//! normalizes the result so that each land cell's unit hydrograph sums to one.
//!
//! The output frame is rebuilt from the input extents on every call:
//!
//! ```text
//! lats = reverse(range(lat_min - res*pad, lat_max + res*(pad + 1), res))
//! lons = range(lon_min - res*pad, lon_max + res*(pad + 1), res)
//! ```
//!
//! The `pad + 1` upper bound keeps the maximum coordinate in the half-open range despite
//! floating point drift in the step accumulation.
//!
//! # Examples
//!
//! ```rust
//! use ndarray::{array, Array2, Array3};
//! use routeagg_core::dataset::GriddedDataset;
//! use routeagg_core::merge::GridMerger;
//!
//! let cell = GriddedDataset::new(
//!     array![1.0],
//!     array![1.0],
//!     Array2::ones((1, 1)),
//!     Array3::from_elem((2, 1, 1), 2.0),
//!     array![0.0, 1.0],
//!     3600.0,
//! )
//! .unwrap();
//!
//! let merged = GridMerger::new(1.0, 1).unwrap().merge(&cell, None, true).unwrap();
//! assert_eq!(merged.dim(), (3, 3));
//! assert_eq!(merged.unit_hydrograph[[0, 1, 1]], 0.5);
//! ```

use crate::dataset::GriddedDataset;
use crate::errors::{AggError, AggResult};
use crate::utils::find_nearest;
use crate::FloatValue;
use log::{debug, info};
use ndarray::{s, Array1, Array2, Array3, ArrayView1};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Reserved value written to unit hydrograph cells without any land contribution
///
/// This is the netCDF default fill value for doubles.
pub const FILL_VALUE: FloatValue = 9.969_209_968_386_869e36;

/// Folds gridded datasets into a common padded frame at a fixed resolution
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMerger {
    res: FloatValue,
    pad: usize,
    fill_value: FloatValue,
}

impl GridMerger {
    /// Create a merger for grids with resolution `res` degrees, padded by `pad` cells
    pub fn new(res: FloatValue, pad: usize) -> AggResult<Self> {
        if !res.is_finite() || res <= 0.0 {
            return Err(AggError::InvalidResolution(res));
        }
        Ok(Self {
            res,
            pad,
            fill_value: FILL_VALUE,
        })
    }

    /// Use `fill_value` instead of [`FILL_VALUE`] for masked cells
    pub fn with_fill_value(mut self, fill_value: FloatValue) -> Self {
        self.fill_value = fill_value;
        self
    }

    pub fn res(&self) -> FloatValue {
        self.res
    }

    pub fn pad(&self) -> usize {
        self.pad
    }

    pub fn fill_value(&self) -> FloatValue {
        self.fill_value
    }

    /// Merge `in_data` with the running accumulator `agg_data`
    ///
    /// `agg_data` is `None` on the first call of a sequence. Neither input is modified; a newly
    /// allocated dataset is returned which takes its `timesteps` and `unit_hydrograph_dt`
    /// from `in_data`.
    ///
    /// `maskandnorm` should only be set on the last call of a sequence, since normalizing
    /// partial sums would skew later contributions.
    pub fn merge(
        &self,
        in_data: &GriddedDataset,
        agg_data: Option<&GriddedDataset>,
        maskandnorm: bool,
    ) -> AggResult<GriddedDataset> {
        in_data.validate("in_data")?;
        let tshape = in_data.n_timesteps();
        if let Some(agg_data) = agg_data {
            agg_data.validate("agg_data")?;
            if agg_data.n_timesteps() != tshape {
                return Err(AggError::shape(
                    "agg_data unit_hydrograph time axis",
                    &[tshape],
                    &[agg_data.n_timesteps()],
                ));
            }
        }

        let (mut lat_min, mut lat_max) = in_data.lat_bounds()?;
        let (mut lon_min, mut lon_max) = in_data.lon_bounds()?;
        if let Some(agg_data) = agg_data {
            let (agg_lat_min, agg_lat_max) = agg_data.lat_bounds()?;
            let (agg_lon_min, agg_lon_max) = agg_data.lon_bounds()?;
            lat_min = lat_min.min(agg_lat_min);
            lat_max = lat_max.max(agg_lat_max);
            lon_min = lon_min.min(agg_lon_min);
            lon_max = lon_max.max(agg_lon_max);
        }

        // pad output arrays so there is a space of `pad` cells around the inputs
        let (lats, lons) = self.frame(lat_min, lat_max, lon_min, lon_max);
        let mut fraction = Array2::zeros((lats.len(), lons.len()));
        let mut unit_hydrograph = Array3::zeros((tshape, lats.len(), lons.len()));
        debug!("fraction shape {:?}", fraction.shape());
        debug!("unit_hydrograph shape {:?}", unit_hydrograph.shape());

        debug!("in_data fraction shape: {:?}", in_data.fraction.shape());
        let in_placement = Placement::locate(lats.view(), lons.view(), in_data, "in_data")?;
        let agg_placement = match agg_data {
            Some(agg_data) => {
                debug!("agg_data fraction shape: {:?}", agg_data.fraction.shape());
                Some((
                    agg_data,
                    Placement::locate(lats.view(), lons.view(), agg_data, "agg_data")?,
                ))
            }
            None => None,
        };

        in_placement.add_into(in_data, &mut fraction, &mut unit_hydrograph);
        if let Some((agg_data, placement)) = agg_placement {
            placement.add_into(agg_data, &mut fraction, &mut unit_hydrograph);
        }

        let mut merged = GriddedDataset {
            lat: lats,
            lon: lons,
            fraction,
            unit_hydrograph,
            timesteps: in_data.timesteps.clone(),
            unit_hydrograph_dt: in_data.unit_hydrograph_dt,
        };

        if maskandnorm {
            mask_and_normalize(&mut merged, self.fill_value);
            info!("Completed final aggregation step");
        }
        Ok(merged)
    }

    /// Output coordinates covering the given extent plus padding
    ///
    /// Latitudes are returned north to south.
    fn frame(
        &self,
        lat_min: FloatValue,
        lat_max: FloatValue,
        lon_min: FloatValue,
        lon_max: FloatValue,
    ) -> (Array1<FloatValue>, Array1<FloatValue>) {
        let res = self.res;
        let pad = self.pad as FloatValue;
        let ascending = Array1::range(lat_min - res * pad, lat_max + res * (pad + 1.0), res);
        let lats = ascending.iter().rev().copied().collect::<Array1<_>>();
        let lons = Array1::range(lon_min - res * pad, lon_max + res * (pad + 1.0), res);
        (lats, lons)
    }
}

/// Merge `in_data` with `agg_data` at resolution `res`, padded by `pad` cells
///
/// See [`GridMerger::merge`]. `pad` must be non-negative.
pub fn aggregate(
    in_data: &GriddedDataset,
    agg_data: Option<&GriddedDataset>,
    res: FloatValue,
    pad: i64,
    maskandnorm: bool,
) -> AggResult<GriddedDataset> {
    let pad = usize::try_from(pad).map_err(|_| AggError::InvalidPad(pad))?;
    GridMerger::new(res, pad)?.merge(in_data, agg_data, maskandnorm)
}

/// Normalize every land cell's unit hydrograph to sum to one and mask the rest
///
/// Cells with `fraction > 0` have their unit hydrograph divided by its sum over time.
/// Every timestep of all other cells is set to `fill_value`.
///
/// A land cell whose unit hydrograph sums to zero has nothing to scale and becomes NaN at
/// every timestep. It is not masked with `fill_value`.
pub fn mask_and_normalize(data: &mut GriddedDataset, fill_value: FloatValue) {
    for ((y, x), &fraction) in data.fraction.indexed_iter() {
        let mut column = data.unit_hydrograph.slice_mut(s![.., y, x]);
        if fraction > 0.0 {
            let total = column.sum();
            column.mapv_inplace(|v| v / total);
        } else {
            column.fill(fill_value);
        }
    }
}

/// Half-open row and column ranges an input occupies in the output frame
#[derive(Clone, Debug, PartialEq)]
struct Placement {
    rows: Range<usize>,
    cols: Range<usize>,
}

impl Placement {
    /// Locate `data` in the output frame by nearest coordinate
    ///
    /// Output latitudes are descending, so the input's maximum latitude gives the first row.
    fn locate(
        lats: ArrayView1<FloatValue>,
        lons: ArrayView1<FloatValue>,
        data: &GriddedDataset,
        what: &str,
    ) -> AggResult<Self> {
        let (lat_min, lat_max) = data.lat_bounds()?;
        let (lon_min, lon_max) = data.lon_bounds()?;
        let nearest = |values: ArrayView1<FloatValue>, target: FloatValue| {
            find_nearest(values, target)
                .ok_or_else(|| AggError::EmptyInput("output grid has no cells".to_string()))
        };

        let rows = nearest(lats, lat_max)?..nearest(lats, lat_min)? + 1;
        let cols = nearest(lons, lon_min)?..nearest(lons, lon_max)? + 1;
        let shape = data.dim();
        if rows.end < rows.start || rows.len() != shape.0 || cols.len() != shape.1 {
            return Err(AggError::PlacementMismatch {
                what: what.to_string(),
                shape,
                rows: (rows.start, rows.end),
                cols: (cols.start, cols.end),
            });
        }
        Ok(Self { rows, cols })
    }

    /// Add the dataset's fraction and unit hydrograph to the output sub-region
    fn add_into(
        &self,
        data: &GriddedDataset,
        fraction: &mut Array2<FloatValue>,
        unit_hydrograph: &mut Array3<FloatValue>,
    ) {
        let mut fraction_region = fraction.slice_mut(s![self.rows.clone(), self.cols.clone()]);
        fraction_region += &data.fraction;

        let mut uh_region =
            unit_hydrograph.slice_mut(s![.., self.rows.clone(), self.cols.clone()]);
        uh_region += &data.unit_hydrograph;
    }
}
