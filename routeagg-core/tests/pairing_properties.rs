//! Properties of pour point pairing that must hold for any input.

use ndarray::{array, Array2};
use routeagg_core::domain::{LonWrapPolicy, TargetDomain};
use routeagg_core::errors::AggError;
use routeagg_core::pairing::{make_agg_pairs, AggType, PairingSummary, SpatialPairer};
use routeagg_core::point::{OutletMap, PourPoint};

/// Deterministic pseudo random coordinates in `[lo, hi)`
fn coords(seed: u64, n: usize, lo: f64, hi: f64) -> Vec<f64> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            lo + unit * (hi - lo)
        })
        .collect()
}

/// A `rows` x `cols` grid of 1 degree cells with ids `1000 + flat index`
fn grid(rows: usize, cols: usize, lon0: f64) -> TargetDomain<i64> {
    let lon = Array2::from_shape_fn((rows, cols), |(_, x)| lon0 + x as f64 + 0.5);
    let lat = Array2::from_shape_fn((rows, cols), |(y, _)| 40.0 - y as f64 - 0.5);
    let ids = Array2::from_shape_fn((rows, cols), |(y, x)| 1000 + (y * cols + x) as i64);
    TargetDomain::new(lon, lat, ids).unwrap()
}

fn sorted(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.partial_cmp(b).unwrap());
    points
}

fn all_pour_points(outlets: &OutletMap<i64>) -> Vec<(f64, f64)> {
    outlets
        .values()
        .flat_map(|o| o.pour_points.iter().map(|p| (p.lat, p.lon)))
        .collect()
}

#[test]
fn every_pour_point_is_assigned_once() {
    let domain = grid(6, 8, -110.0);
    for seed in 0..5 {
        let lons = coords(seed, 200, -111.0, -101.0);
        let lats = coords(seed + 100, 200, 33.0, 41.0);

        let outlets = SpatialPairer::default()
            .pair(&lons, &lats, &domain)
            .unwrap();

        let expected = sorted(lats.iter().copied().zip(lons.iter().copied()).collect());
        assert_eq!(sorted(all_pour_points(&outlets)), expected);

        let summary = PairingSummary::from_outlets(&outlets, lons.len());
        assert_eq!(summary.aggregated, 200);
        assert_eq!(summary.unassigned(), 0);
        assert_eq!(summary.efficiency(), 100.0);
        assert!(outlets.values().all(|o| !o.is_empty()));
    }
}

#[test]
fn outlet_matches_its_cell() {
    let domain = grid(5, 5, 10.0);
    let lons = coords(7, 100, 9.0, 16.0);
    let lats = coords(8, 100, 34.0, 41.0);

    let outlets = SpatialPairer::default()
        .pair(&lons, &lats, &domain)
        .unwrap();

    for (cell_id, outlet) in &outlets {
        assert_eq!(*cell_id, outlet.cell_id);
        assert_eq!(domain.ids()[[outlet.y, outlet.x]], outlet.cell_id);
        assert_eq!(domain.lat()[[outlet.y, outlet.x]], outlet.lat);
        assert_eq!(domain.lon()[[outlet.y, outlet.x]], outlet.lon);
    }
}

#[test]
fn pour_points_go_to_the_nearest_centre() {
    let domain = grid(4, 4, 0.0);
    let lons = coords(11, 50, 0.0, 4.0);
    let lats = coords(12, 50, 36.0, 40.0);

    let outlets = SpatialPairer::default()
        .pair(&lons, &lats, &domain)
        .unwrap();

    for outlet in outlets.values() {
        for p in &outlet.pour_points {
            let own = (p.lat - outlet.lat).powi(2) + (p.lon - outlet.lon).powi(2);
            let best = domain
                .lat()
                .iter()
                .zip(domain.lon().iter())
                .map(|(lat, lon)| (p.lat - lat).powi(2) + (p.lon - lon).powi(2))
                .fold(f64::INFINITY, f64::min);
            assert!((own - best).abs() < 1e-12);
        }
    }
}

#[test]
fn single_cell_test_collects_everything() {
    let domain = grid(3, 3, 0.0);
    let lons = coords(3, 40, -50.0, 50.0);
    let lats = coords(4, 40, -50.0, 50.0);

    let outlets = SpatialPairer::new(AggType::SingleCellTest)
        .pair(&lons, &lats, &domain)
        .unwrap();

    assert_eq!(outlets.len(), 1);
    let outlet = &outlets[&1000];
    assert_eq!((outlet.y, outlet.x), (0, 0));
    assert_eq!(outlet.pour_points.len(), 40);
}

#[test]
fn two_by_two_scenario() {
    let outlets = make_agg_pairs(
        &[0.9, 1.1, 2.2],
        &[0.9, 0.95, 2.1],
        array![[1.0, 2.0], [1.0, 2.0]],
        array![[1.0, 1.0], [2.0, 2.0]],
        array![[10_i64, 11], [12, 13]],
        AggType::Normal,
    )
    .unwrap();

    assert_eq!(outlets.keys().copied().collect::<Vec<_>>(), vec![10, 13]);
    assert_eq!(outlets[&10].pour_points.len(), 2);
    assert_eq!(outlets[&13].pour_points, vec![PourPoint::new(2.1, 2.2)]);

    let summary = PairingSummary::from_outlets(&outlets, 3);
    assert_eq!(summary.efficiency(), 100.0);
    assert_eq!(summary.outlets, 2);
}

#[test]
fn pairing_is_deterministic() {
    let domain = grid(6, 6, 100.0);
    let lons = coords(21, 150, 99.0, 107.0);
    let lats = coords(22, 150, 33.0, 41.0);

    let pairer = SpatialPairer::default();
    let first = pairer.pair(&lons, &lats, &domain).unwrap();
    let second = pairer.pair(&lons, &lats, &domain).unwrap();
    assert_eq!(first, second);
}

#[test]
fn wrapped_domain_pairs_across_conventions() {
    // Domain stored as 0..360, pour points as -180..180 just west of Greenwich
    let domain = grid(2, 4, 357.0);
    let lons = vec![-2.4, -0.6];
    let lats = vec![39.5, 38.5];

    let outlets = SpatialPairer::default()
        .pair(&lons, &lats, &domain)
        .unwrap();

    // Column centres 357.5, 358.5, 359.5, 360.5 wrap to -2.5, -1.5, -0.5, 0.5
    assert_eq!(outlets.len(), 2);
    assert_eq!(outlets[&1000].lon, -2.5);
    assert_eq!(outlets[&1006].lon, -0.5);
}

#[test]
fn symmetric_wrap_pairs_0_360_pour_points() {
    let lon = array![[-179.5, -178.5, 178.5, 179.5]];
    let lat = array![[0.0, 0.0, 0.0, 0.0]];
    let ids = array![[1_i64, 2, 3, 4]];
    let domain = TargetDomain::new(lon, lat, ids).unwrap();

    let lons = vec![180.6, 179.4];
    let lats = vec![0.0, 0.0];

    let outlets = SpatialPairer::default()
        .with_lon_wrap(LonWrapPolicy::Symmetric)
        .pair(&lons, &lats, &domain)
        .unwrap();

    // 180.6 lies next to -179.5 (180.5) once the domain is shifted
    assert_eq!(outlets[&1].pour_points, vec![PourPoint::new(0.0, 180.6)]);
    assert_eq!(outlets[&1].lon, 180.5);
    assert_eq!(outlets[&4].pour_points, vec![PourPoint::new(0.0, 179.4)]);
}

#[test]
fn non_finite_pour_point_is_not_assigned() {
    let domain = grid(2, 2, 0.0);
    let result = SpatialPairer::default().pair(&[0.5, f64::NAN], &[39.5, 38.5], &domain);
    assert!(matches!(result, Err(AggError::NonFiniteCoordinate(_))));
}
