//! Gridded unit hydrograph datasets
//!
//! A [`GriddedDataset`] is a rectangular lat/lon grid carrying the land fraction of each cell
//! and a unit hydrograph (impulse response weights over time) for each cell. Latitudes run
//! north to south and longitudes west to east.

use crate::errors::{AggError, AggResult};
use crate::utils::min_max;
use crate::FloatValue;
use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GriddedDataset {
    /// Row coordinates, strictly decreasing
    pub lat: Array1<FloatValue>,
    /// Column coordinates, strictly increasing
    pub lon: Array1<FloatValue>,
    /// Fractional land coverage with shape `(lat, lon)`
    pub fraction: Array2<FloatValue>,
    /// Impulse response weights with shape `(time, lat, lon)`
    pub unit_hydrograph: Array3<FloatValue>,
    /// Time axis of the unit hydrograph, passed through untouched
    pub timesteps: Array1<FloatValue>,
    /// Length of a unit hydrograph timestep in seconds, passed through untouched
    pub unit_hydrograph_dt: FloatValue,
}

impl GriddedDataset {
    /// Create a dataset, checking that the array shapes agree with the coordinates
    pub fn new(
        lat: Array1<FloatValue>,
        lon: Array1<FloatValue>,
        fraction: Array2<FloatValue>,
        unit_hydrograph: Array3<FloatValue>,
        timesteps: Array1<FloatValue>,
        unit_hydrograph_dt: FloatValue,
    ) -> AggResult<Self> {
        let dataset = Self {
            lat,
            lon,
            fraction,
            unit_hydrograph,
            timesteps,
            unit_hydrograph_dt,
        };
        dataset.validate("dataset")?;
        Ok(dataset)
    }

    /// Check the coordinates and array shapes
    ///
    /// Coordinates must be finite, with `lat` strictly decreasing and `lon` strictly
    /// increasing. `what` names the dataset in any error.
    pub fn validate(&self, what: &str) -> AggResult<()> {
        if self.lat.is_empty() || self.lon.is_empty() {
            return Err(AggError::EmptyInput(format!(
                "{} has {} latitudes and {} longitudes",
                what,
                self.lat.len(),
                self.lon.len()
            )));
        }
        if !self.lat.iter().chain(self.lon.iter()).all(|v| v.is_finite()) {
            return Err(AggError::NonFiniteCoordinate(format!("{} lat/lon", what)));
        }
        if !self.lat.windows(2).into_iter().all(|w| w[0] > w[1]) {
            return Err(AggError::UnorderedCoordinates(format!(
                "{} lat must be strictly decreasing",
                what
            )));
        }
        if !self.lon.windows(2).into_iter().all(|w| w[0] < w[1]) {
            return Err(AggError::UnorderedCoordinates(format!(
                "{} lon must be strictly increasing",
                what
            )));
        }
        let (nlat, nlon) = self.dim();
        if self.fraction.dim() != (nlat, nlon) {
            return Err(AggError::shape(
                &format!("{} fraction", what),
                &[nlat, nlon],
                self.fraction.shape(),
            ));
        }
        let (nt, ny, nx) = self.unit_hydrograph.dim();
        if (ny, nx) != (nlat, nlon) {
            return Err(AggError::shape(
                &format!("{} unit_hydrograph", what),
                &[nt, nlat, nlon],
                self.unit_hydrograph.shape(),
            ));
        }
        Ok(())
    }

    /// Length of the unit hydrograph time axis
    pub fn n_timesteps(&self) -> usize {
        self.unit_hydrograph.dim().0
    }

    /// Number of (lat, lon) cells
    pub fn dim(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// Minimum and maximum latitude
    pub fn lat_bounds(&self) -> AggResult<(FloatValue, FloatValue)> {
        min_max(self.lat.iter())
            .ok_or_else(|| AggError::EmptyInput("dataset has no latitudes".to_string()))
    }

    /// Minimum and maximum longitude
    pub fn lon_bounds(&self) -> AggResult<(FloatValue, FloatValue)> {
        min_max(self.lon.iter())
            .ok_or_else(|| AggError::EmptyInput("dataset has no longitudes".to_string()))
    }
}
