//! Pour points, outlets and the outlet mapping produced by [`make_agg_pairs`](crate::pairing::make_agg_pairs)

use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Geographic location of a drainage sub-basin outlet
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PourPoint {
    pub lat: FloatValue,
    pub lon: FloatValue,
}

impl PourPoint {
    pub fn new(lat: FloatValue, lon: FloatValue) -> Self {
        Self { lat, lon }
    }
}

/// A target-grid cell that one or more pour points have been assigned to
///
/// `lat`/`lon` are the coordinates of the matched grid-cell centre, not of any pour point.
/// `pour_points` is in the order the points were first associated with this cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Outlet<Id> {
    /// Row index into the target grid
    pub y: usize,
    /// Column index into the target grid
    pub x: usize,
    pub lat: FloatValue,
    pub lon: FloatValue,
    /// Identifier read from the target grid's id array at `(y, x)`
    pub cell_id: Id,
    pub pour_points: Vec<PourPoint>,
}

impl<Id> Outlet<Id> {
    /// Create an outlet holding a single pour point
    pub fn new(
        y: usize,
        x: usize,
        lat: FloatValue,
        lon: FloatValue,
        cell_id: Id,
        first: PourPoint,
    ) -> Self {
        Self {
            y,
            x,
            lat,
            lon,
            cell_id,
            pour_points: vec![first],
        }
    }

    pub fn len(&self) -> usize {
        self.pour_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pour_points.is_empty()
    }
}

/// Mapping from target-cell identifier to its outlet
///
/// Ordered by identifier so iteration is deterministic across runs.
pub type OutletMap<Id> = BTreeMap<Id, Outlet<Id>>;
