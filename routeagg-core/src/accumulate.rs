//! Sequential folding of per-outlet unit hydrograph grids.

use crate::dataset::GriddedDataset;
use crate::errors::{AggError, AggResult};
use crate::merge::{mask_and_normalize, GridMerger};
use log::debug;

/// Running accumulator for a sequence of [`GridMerger::merge`] calls
///
/// Each [`fold`](Self::fold) merges one more dataset into the accumulated grid without
/// normalizing. [`finish`](Self::finish) applies the mask and normalize pass once, after every
/// contribution has been summed.
///
/// Each fold re-pads the accumulated extent, so the final grid carries `pad` extra cells per
/// fold on every side.
#[derive(Clone, Debug)]
pub struct UnitHydrographAccumulator {
    merger: GridMerger,
    current: Option<GriddedDataset>,
    folded: usize,
}

impl UnitHydrographAccumulator {
    pub fn new(merger: GridMerger) -> Self {
        Self {
            merger,
            current: None,
            folded: 0,
        }
    }

    /// Merge `in_data` into the accumulated grid
    ///
    /// On error the accumulated grid is left as it was before the call.
    pub fn fold(&mut self, in_data: &GriddedDataset) -> AggResult<()> {
        let merged = self.merger.merge(in_data, self.current.as_ref(), false)?;
        self.current = Some(merged);
        self.folded += 1;
        debug!("folded {} unit hydrograph grids", self.folded);
        Ok(())
    }

    /// Number of datasets folded so far
    pub fn folded(&self) -> usize {
        self.folded
    }

    /// The accumulated grid, before masking and normalization
    pub fn current(&self) -> Option<&GriddedDataset> {
        self.current.as_ref()
    }

    /// Mask and normalize the accumulated grid and return it
    pub fn finish(self) -> AggResult<GriddedDataset> {
        let mut data = self.current.ok_or_else(|| {
            AggError::EmptyInput("no unit hydrograph grids were folded".to_string())
        })?;
        mask_and_normalize(&mut data, self.merger.fill_value());
        Ok(data)
    }
}
