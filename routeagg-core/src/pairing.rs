//! Pairing of pour points with target grid cells
//!
//! Each pour point is assigned to the target cell whose centre is nearest to it, and pour
//! points sharing a cell are grouped under a single [`Outlet`]. The result is an
//! [`OutletMap`] keyed by the identifier of the target cell.
//!
//! # Examples
//!
//! ```rust
//! use ndarray::array;
//! use routeagg_core::domain::TargetDomain;
//! use routeagg_core::pairing::{AggType, SpatialPairer};
//!
//! let domain = TargetDomain::new(
//!     array![[1.0, 2.0], [1.0, 2.0]],
//!     array![[1.0, 1.0], [2.0, 2.0]],
//!     array![[10, 11], [12, 13]],
//! )
//! .unwrap();
//!
//! let outlets = SpatialPairer::new(AggType::Normal)
//!     .pair(&[0.9, 1.1, 2.2], &[0.9, 0.95, 2.1], &domain)
//!     .unwrap();
//!
//! assert_eq!(outlets.len(), 2);
//! assert_eq!(outlets[&10].pour_points.len(), 2);
//! assert_eq!(outlets[&13].pour_points.len(), 1);
//! ```

use crate::domain::{LonWrapPolicy, TargetDomain};
use crate::errors::{AggError, AggResult};
use crate::point::{Outlet, OutletMap, PourPoint};
use crate::spatial_index::CellIndex;
use crate::FloatValue;
use log::info;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::fmt;

/// Selects which target cells pour points may be assigned to
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggType {
    /// Every cell of the target grid is a candidate
    #[default]
    Normal,
    /// Only the top-left cell is a candidate, so every pour point maps to one outlet
    ///
    /// Used for diagnosing the downstream pipeline with a single degenerate outlet.
    SingleCellTest,
}

/// Diagnostic counts describing a completed pairing
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingSummary {
    /// Number of pour points supplied
    pub pour_points: usize,
    /// Number of distinct outlets created
    pub outlets: usize,
    /// Number of pour points held by the outlets
    pub aggregated: usize,
}

impl PairingSummary {
    pub fn from_outlets<Id>(outlets: &OutletMap<Id>, pour_points: usize) -> Self {
        Self {
            pour_points,
            outlets: outlets.len(),
            aggregated: outlets.values().map(|o| o.pour_points.len()).sum(),
        }
    }

    /// Percentage of pour points that were aggregated
    ///
    /// Zero when there were no pour points.
    pub fn efficiency(&self) -> FloatValue {
        if self.pour_points == 0 {
            return 0.0;
        }
        100.0 * self.aggregated as FloatValue / self.pour_points as FloatValue
    }

    /// Pour points that were not assigned to any outlet
    pub fn unassigned(&self) -> usize {
        self.pour_points.saturating_sub(self.aggregated)
    }

    fn log(&self) {
        info!("------------------ pour point pairing summary ------------------");
        info!("pour points in input list: {}", self.pour_points);
        info!("outlets to aggregate to: {}", self.outlets);
        info!("pour points aggregated: {}", self.aggregated);
        info!("efficiency: {:.2} %", self.efficiency());
        info!("unassigned pour points: {}", self.unassigned());
        info!("-----------------------------------------------------------------");
    }
}

impl fmt::Display for PairingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pour points -> {} outlets ({} aggregated, {:.2} %, {} unassigned)",
            self.pour_points,
            self.outlets,
            self.aggregated,
            self.efficiency(),
            self.unassigned()
        )
    }
}

/// Groups pour points by their nearest target grid cell
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialPairer {
    pub agg_type: AggType,
    pub lon_wrap: LonWrapPolicy,
}

impl SpatialPairer {
    pub fn new(agg_type: AggType) -> Self {
        Self {
            agg_type,
            lon_wrap: LonWrapPolicy::default(),
        }
    }

    pub fn with_lon_wrap(mut self, lon_wrap: LonWrapPolicy) -> Self {
        self.lon_wrap = lon_wrap;
        self
    }

    /// Assign every pour point to its nearest target cell
    ///
    /// `lons` and `lats` hold the pour point coordinates in degrees and must have equal length.
    /// The domain's longitudes are aligned with the pour points on a private copy; `domain`
    /// itself is not modified.
    ///
    /// Every pour point ends up in exactly one outlet and no outlet is created for a cell
    /// without pour points. An empty set of pour points gives an empty map.
    pub fn pair<Id>(
        &self,
        lons: &[FloatValue],
        lats: &[FloatValue],
        domain: &TargetDomain<Id>,
    ) -> AggResult<OutletMap<Id>>
    where
        Id: Clone + Ord,
    {
        if lons.len() != lats.len() {
            return Err(AggError::shape("lats", &[lons.len()], &[lats.len()]));
        }
        if let Some(i) = lons
            .iter()
            .zip(lats)
            .position(|(lon, lat)| !lon.is_finite() || !lat.is_finite())
        {
            return Err(AggError::NonFiniteCoordinate(format!(
                "pour point {} ({}, {})",
                i, lats[i], lons[i]
            )));
        }
        info!("Finding addresses now...");

        let mut domain = domain.clone();
        domain.normalize_longitudes(lons, self.lon_wrap)?;

        let index = match self.agg_type {
            AggType::Normal => CellIndex::build(domain.centers())?,
            AggType::SingleCellTest => CellIndex::build(domain.centers().take(1))?,
        };

        let mut outlets = OutletMap::new();
        for (&lat, &lon) in lats.iter().zip(lons) {
            let (flat, [cell_lat, cell_lon]) =
                index.nearest([lat, lon]).ok_or_else(|| {
                    AggError::EmptyInput("no candidate cell centres to index".to_string())
                })?;
            let (y, x) = domain.unravel(flat);
            let cell_id = domain.ids()[[y, x]].clone();
            let pour_point = PourPoint::new(lat, lon);

            match outlets.entry(cell_id) {
                Entry::Occupied(entry) => entry.into_mut().pour_points.push(pour_point),
                Entry::Vacant(entry) => {
                    let cell_id = entry.key().clone();
                    entry.insert(Outlet::new(y, x, cell_lat, cell_lon, cell_id, pour_point));
                }
            }
        }

        PairingSummary::from_outlets(&outlets, lons.len()).log();
        Ok(outlets)
    }
}

/// Group pour points by the nearest cell of the target grid
///
/// `dom_lon`, `dom_lat` and `dom_ids` describe the target grid and must share one shape.
/// Longitudes are aligned using [`LonWrapPolicy::Legacy`]; use [`SpatialPairer`] directly to
/// choose another policy.
pub fn make_agg_pairs<Id>(
    lons: &[FloatValue],
    lats: &[FloatValue],
    dom_lon: Array2<FloatValue>,
    dom_lat: Array2<FloatValue>,
    dom_ids: Array2<Id>,
    agg_type: AggType,
) -> AggResult<OutletMap<Id>>
where
    Id: Clone + Ord,
{
    let domain = TargetDomain::new(dom_lon, dom_lat, dom_ids)?;
    SpatialPairer::new(agg_type).pair(lons, lats, &domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_domain() -> TargetDomain<i64> {
        TargetDomain::new(
            array![[1.0, 2.0], [1.0, 2.0]],
            array![[1.0, 1.0], [2.0, 2.0]],
            array![[10, 11], [12, 13]],
        )
        .unwrap()
    }

    #[test]
    fn groups_by_nearest_cell() {
        let outlets = SpatialPairer::default()
            .pair(&[0.9, 1.1, 2.2], &[0.9, 0.95, 2.1], &small_domain())
            .unwrap();

        assert_eq!(outlets.keys().copied().collect::<Vec<_>>(), vec![10, 13]);

        let first = &outlets[&10];
        assert_eq!((first.y, first.x), (0, 0));
        assert_eq!((first.lat, first.lon), (1.0, 1.0));
        assert_eq!(
            first.pour_points,
            vec![PourPoint::new(0.9, 0.9), PourPoint::new(0.95, 1.1)]
        );

        let last = &outlets[&13];
        assert_eq!((last.y, last.x), (1, 1));
        assert_eq!((last.lat, last.lon), (2.0, 2.0));
        assert_eq!(last.pour_points, vec![PourPoint::new(2.1, 2.2)]);
    }

    #[test]
    fn single_cell_test_mode() {
        let outlets = SpatialPairer::new(AggType::SingleCellTest)
            .pair(&[0.9, 1.1, 2.2], &[0.9, 0.95, 2.1], &small_domain())
            .unwrap();
        assert_eq!(outlets.len(), 1);
        let outlet = &outlets[&10];
        assert_eq!((outlet.y, outlet.x), (0, 0));
        assert_eq!(outlet.pour_points.len(), 3);
    }

    #[test]
    fn empty_pour_points() {
        let outlets = SpatialPairer::default()
            .pair(&[], &[], &small_domain())
            .unwrap();
        assert!(outlets.is_empty());

        let summary = PairingSummary::from_outlets(&outlets, 0);
        assert_eq!(summary.efficiency(), 0.0);
        assert_eq!(summary.unassigned(), 0);
    }

    #[test]
    fn mismatched_pour_point_lengths() {
        let result = SpatialPairer::default().pair(&[0.0, 1.0], &[0.0], &small_domain());
        assert!(matches!(result, Err(AggError::ShapeMismatch { .. })));
    }

    #[test]
    fn non_finite_pour_points_are_rejected() {
        let pairer = SpatialPairer::default();
        let result = pairer.pair(&[FloatValue::NAN], &[1.0], &small_domain());
        assert!(matches!(
            result,
            Err(AggError::NonFiniteCoordinate(msg)) if msg.starts_with("pour point 0")
        ));

        let result = pairer.pair(&[1.0, 2.0], &[1.0, FloatValue::INFINITY], &small_domain());
        assert!(matches!(
            result,
            Err(AggError::NonFiniteCoordinate(msg)) if msg.starts_with("pour point 1")
        ));
    }

    #[test]
    fn caller_domain_is_not_modified() {
        let domain = TargetDomain::new(
            array![[10.0, 350.0]],
            array![[0.0, 0.0]],
            array![[1_i64, 2]],
        )
        .unwrap();
        let outlets = SpatialPairer::default()
            .pair(&[-9.0], &[0.0], &domain)
            .unwrap();

        // -9 is nearest to 350 once the domain is wrapped to -10
        let outlet = &outlets[&2];
        assert_eq!(outlet.lon, -10.0);
        assert_eq!(domain.lon(), &array![[10.0, 350.0]]);
    }

    #[test]
    fn make_agg_pairs_rejects_bad_domain() {
        let result = make_agg_pairs(
            &[0.0],
            &[0.0],
            array![[0.0, 1.0]],
            array![[0.0, 1.0]],
            array![[1_i64], [2]],
            AggType::Normal,
        );
        assert!(matches!(result, Err(AggError::ShapeMismatch { .. })));
    }

    #[test]
    fn summary_display() {
        let summary = PairingSummary {
            pour_points: 4,
            outlets: 2,
            aggregated: 4,
        };
        assert_eq!(
            summary.to_string(),
            "4 pour points -> 2 outlets (4 aggregated, 100.00 %, 0 unassigned)"
        );
    }
}
