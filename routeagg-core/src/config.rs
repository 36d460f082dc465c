//! Aggregation configuration
//!
//! Settings are read from TOML. Every field except `resolution` is optional:
//!
//! ```toml
//! resolution = 0.5
//! pad = 2
//! agg_type = "normal"        # or "single_cell_test"
//! lon_wrap = "legacy"        # or "symmetric"
//! fill_value = 9.969209968386869e36
//! ```

use crate::domain::LonWrapPolicy;
use crate::errors::{AggError, AggResult};
use crate::merge::{GridMerger, FILL_VALUE};
use crate::pairing::{AggType, SpatialPairer};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

fn default_fill_value() -> FloatValue {
    FILL_VALUE
}

/// Parameters for pairing pour points and merging unit hydrograph grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Target grid resolution in degrees.
    pub resolution: FloatValue,

    /// Cells of padding added around the merged extent on every side.
    /// Default: 0
    #[serde(default)]
    pub pad: i64,

    /// Which target cells pour points may be assigned to.
    /// Default: normal
    #[serde(default)]
    pub agg_type: AggType,

    /// How domain longitudes are wrapped to the pour point convention.
    /// Default: legacy
    #[serde(default)]
    pub lon_wrap: LonWrapPolicy,

    /// Value written to masked unit hydrograph cells.
    /// Default: the netCDF double fill value
    #[serde(default = "default_fill_value")]
    pub fill_value: FloatValue,
}

impl AggregationConfig {
    pub fn new(resolution: FloatValue) -> Self {
        Self {
            resolution,
            pad: 0,
            agg_type: AggType::default(),
            lon_wrap: LonWrapPolicy::default(),
            fill_value: FILL_VALUE,
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> AggResult<Self> {
        let config: Self = toml::from_str(contents).map_err(|e| AggError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> AggResult<String> {
        toml::to_string(self).map_err(|e| AggError::Config(e.to_string()))
    }

    pub fn validate(&self) -> AggResult<()> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(AggError::InvalidResolution(self.resolution));
        }
        if self.pad < 0 {
            return Err(AggError::InvalidPad(self.pad));
        }
        Ok(())
    }

    /// Pairer configured with this `agg_type` and `lon_wrap`
    pub fn pairer(&self) -> SpatialPairer {
        SpatialPairer::new(self.agg_type).with_lon_wrap(self.lon_wrap)
    }

    /// Merger configured with this resolution, padding and fill value
    pub fn merger(&self) -> AggResult<GridMerger> {
        self.validate()?;
        let pad = usize::try_from(self.pad).map_err(|_| AggError::InvalidPad(self.pad))?;
        Ok(GridMerger::new(self.resolution, pad)?.with_fill_value(self.fill_value))
    }
}
