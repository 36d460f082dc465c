//! Target grid that pour points are paired onto
//!
//! A [`TargetDomain`] holds the cell-centre coordinates and the cell identifiers of the
//! coarse routing grid. All three arrays share one 2-D shape and are indexed `[row, col]`.
//!
//! Longitudes may be stored in either the 0..360 or the -180..180 convention.
//! [`TargetDomain::normalize_longitudes`] aligns the domain with the convention used by a
//! set of pour points before they are indexed.

use crate::errors::{AggError, AggResult};
use crate::utils::min_max;
use crate::FloatValue;
use log::{info, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// How the domain longitudes are wrapped to match the pour points
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LonWrapPolicy {
    /// Only shift a 0..360 domain onto -180..180 pour points.
    ///
    /// A -180..180 domain paired with 0..360 pour points is left alone and logged as a warning.
    #[default]
    Legacy,
    /// Shift the domain in whichever direction matches the pour points
    Symmetric,
}

/// Cell centres and identifiers of the target routing grid
#[derive(Clone, Debug, PartialEq)]
pub struct TargetDomain<Id> {
    lon: Array2<FloatValue>,
    lat: Array2<FloatValue>,
    ids: Array2<Id>,
}

impl<Id> TargetDomain<Id> {
    /// Create a domain from cell-centre longitudes, latitudes and cell identifiers
    ///
    /// The three arrays must share the same non-empty shape and every coordinate must be finite.
    pub fn new(
        lon: Array2<FloatValue>,
        lat: Array2<FloatValue>,
        ids: Array2<Id>,
    ) -> AggResult<Self> {
        if lat.dim() != lon.dim() {
            return Err(AggError::shape("dom_lat", lon.shape(), lat.shape()));
        }
        if ids.dim() != lon.dim() {
            return Err(AggError::shape("dom_ids", lon.shape(), ids.shape()));
        }
        if lon.is_empty() {
            return Err(AggError::EmptyInput(
                "target domain has no grid cells".to_string(),
            ));
        }
        if !lon.iter().chain(lat.iter()).all(|v| v.is_finite()) {
            return Err(AggError::NonFiniteCoordinate(
                "target domain lat/lon".to_string(),
            ));
        }
        Ok(Self { lon, lat, ids })
    }

    /// Number of (rows, columns) in the grid
    pub fn dim(&self) -> (usize, usize) {
        self.lon.dim()
    }

    pub fn lon(&self) -> &Array2<FloatValue> {
        &self.lon
    }

    pub fn lat(&self) -> &Array2<FloatValue> {
        &self.lat
    }

    pub fn ids(&self) -> &Array2<Id> {
        &self.ids
    }

    /// Cell centre as `[lat, lon]` in row-major order
    pub(crate) fn centers(&self) -> impl Iterator<Item = [FloatValue; 2]> + '_ {
        self.lat
            .iter()
            .zip(self.lon.iter())
            .map(|(&lat, &lon)| [lat, lon])
    }

    /// Row and column of a row-major flat index
    pub(crate) fn unravel(&self, flat: usize) -> (usize, usize) {
        let (_, ncols) = self.dim();
        (flat / ncols, flat % ncols)
    }

    fn lon_bounds(&self) -> (FloatValue, FloatValue) {
        // Non-empty is checked on construction
        min_max(self.lon.iter()).unwrap_or((0.0, 0.0))
    }

    /// Align the domain longitudes with the convention of `pour_lons`
    ///
    /// Returns `true` if any domain longitude was changed.
    ///
    /// Pour points that themselves mix conventions (some negative, some above 180) cannot be
    /// aligned with any domain and are rejected.
    pub fn normalize_longitudes(
        &mut self,
        pour_lons: &[FloatValue],
        policy: LonWrapPolicy,
    ) -> AggResult<bool> {
        let Some((pour_min, pour_max)) = min_max(pour_lons) else {
            return Ok(false);
        };
        if pour_min < 0.0 && pour_max > 180.0 {
            return Err(AggError::LongitudeConvention(format!(
                "pour point longitudes span {} to {}, mixing the -180..180 and 0..360 conventions",
                pour_min, pour_max
            )));
        }

        let (dom_min, _) = self.lon_bounds();
        let mut adjusted = false;
        if pour_min < 0.0 && dom_min >= 0.0 {
            self.lon.mapv_inplace(|v| if v > 180.0 { v - 360.0 } else { v });
            info!("adjusted domain lon minimum");
            adjusted = true;
        } else if policy == LonWrapPolicy::Symmetric && pour_max > 180.0 && dom_min < 0.0 {
            self.lon.mapv_inplace(|v| if v < 0.0 { v + 360.0 } else { v });
            info!("adjusted domain lon maximum");
            adjusted = true;
        }

        let (dom_min, _) = self.lon_bounds();
        if pour_max > 180.0 && dom_min < 0.0 {
            warn!(
                "pour point longitudes reach {} but the domain uses the -180..180 convention \
                 (minimum {}); nearest cell assignment near the date line may be wrong",
                pour_max, dom_min
            );
        }
        Ok(adjusted)
    }
}
