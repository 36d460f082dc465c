//! Python bindings for pour point pairing and grid merging
//!
//! Datasets cross the boundary as dicts of numpy arrays with the keys `lat`, `lon`,
//! `fraction`, `unit_hydrograph`, `timesteps` and `unit_hydrograph_dt`.

use crate::dataset::GriddedDataset;
use crate::errors::AggError;
use crate::merge::{self, FILL_VALUE};
use crate::pairing::{self, AggType};
use numpy::{IntoPyArray, PyReadonlyArray1, PyReadonlyArray2, PyReadonlyArray3};
use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

impl From<AggError> for PyErr {
    fn from(err: AggError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn required<'py>(data: &Bound<'py, PyDict>, key: &str) -> PyResult<Bound<'py, PyAny>> {
    data.get_item(key)?
        .ok_or_else(|| PyKeyError::new_err(format!("dataset is missing '{}'", key)))
}

fn dataset_from_dict(data: &Bound<'_, PyDict>) -> PyResult<GriddedDataset> {
    let lat: PyReadonlyArray1<f64> = required(data, "lat")?.extract()?;
    let lon: PyReadonlyArray1<f64> = required(data, "lon")?.extract()?;
    let fraction: PyReadonlyArray2<f64> = required(data, "fraction")?.extract()?;
    let unit_hydrograph: PyReadonlyArray3<f64> = required(data, "unit_hydrograph")?.extract()?;
    let timesteps: Vec<f64> = required(data, "timesteps")?.extract()?;
    let unit_hydrograph_dt: f64 = required(data, "unit_hydrograph_dt")?.extract()?;

    Ok(GriddedDataset::new(
        lat.as_array().to_owned(),
        lon.as_array().to_owned(),
        fraction.as_array().to_owned(),
        unit_hydrograph.as_array().to_owned(),
        timesteps.into(),
        unit_hydrograph_dt,
    )?)
}

fn dataset_to_dict(py: Python<'_>, data: GriddedDataset) -> PyResult<Bound<'_, PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("timesteps", data.timesteps.into_pyarray_bound(py))?;
    dict.set_item("unit_hydrograph_dt", data.unit_hydrograph_dt)?;
    dict.set_item("lon", data.lon.into_pyarray_bound(py))?;
    dict.set_item("lat", data.lat.into_pyarray_bound(py))?;
    dict.set_item("fraction", data.fraction.into_pyarray_bound(py))?;
    dict.set_item("unit_hydrograph", data.unit_hydrograph.into_pyarray_bound(py))?;
    Ok(dict)
}

/// Group pour points by their nearest target grid cell.
///
/// Returns a dict mapping cell id to an outlet dict with the keys `y`, `x`, `lat`, `lon`,
/// `cell_id` and `pour_points` (a list of `(lat, lon)` tuples).
/// `agg_type="test"` maps every pour point to the top-left cell.
#[pyfunction]
#[pyo3(name = "make_agg_pairs", signature = (lons, lats, dom_lon, dom_lat, dom_ids, agg_type="agg"))]
fn py_make_agg_pairs<'py>(
    py: Python<'py>,
    lons: Vec<f64>,
    lats: Vec<f64>,
    dom_lon: PyReadonlyArray2<'py, f64>,
    dom_lat: PyReadonlyArray2<'py, f64>,
    dom_ids: PyReadonlyArray2<'py, i64>,
    agg_type: &str,
) -> PyResult<Bound<'py, PyDict>> {
    let agg_type = match agg_type {
        "test" => AggType::SingleCellTest,
        _ => AggType::Normal,
    };
    let outlets = pairing::make_agg_pairs(
        &lons,
        &lats,
        dom_lon.as_array().to_owned(),
        dom_lat.as_array().to_owned(),
        dom_ids.as_array().to_owned(),
        agg_type,
    )?;

    let result = PyDict::new_bound(py);
    for (cell_id, outlet) in outlets {
        let entry = PyDict::new_bound(py);
        entry.set_item("y", outlet.y)?;
        entry.set_item("x", outlet.x)?;
        entry.set_item("lat", outlet.lat)?;
        entry.set_item("lon", outlet.lon)?;
        entry.set_item("cell_id", outlet.cell_id)?;
        let pour_points = PyList::new_bound(
            py,
            outlet.pour_points.iter().map(|p| (p.lat, p.lon)),
        );
        entry.set_item("pour_points", pour_points)?;
        result.set_item(cell_id, entry)?;
    }
    Ok(result)
}

/// Merge `in_data` into `agg_data`, expanding the grid to fit both.
///
/// `agg_data` may be `None` or an empty dict on the first call of a sequence.
#[pyfunction]
#[pyo3(name = "aggregate", signature = (in_data, agg_data=None, res=0.0, pad=0, maskandnorm=false))]
fn py_aggregate<'py>(
    py: Python<'py>,
    in_data: &Bound<'py, PyDict>,
    agg_data: Option<&Bound<'py, PyDict>>,
    res: f64,
    pad: i64,
    maskandnorm: bool,
) -> PyResult<Bound<'py, PyDict>> {
    let in_data = dataset_from_dict(in_data)?;
    let agg_data = match agg_data {
        Some(dict) if !dict.is_empty() => Some(dataset_from_dict(dict)?),
        _ => None,
    };
    let merged = merge::aggregate(&in_data, agg_data.as_ref(), res, pad, maskandnorm)?;
    dataset_to_dict(py, merged)
}

#[pymodule]
pub fn core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_make_agg_pairs, m)?)?;
    m.add_function(wrap_pyfunction!(py_aggregate, m)?)?;
    m.add("FILL_VALUE", FILL_VALUE)?;
    Ok(())
}
