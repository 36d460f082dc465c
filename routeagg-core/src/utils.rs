//! Small numeric helpers shared by the pairing and merging code.

use crate::FloatValue;
use ndarray::ArrayView1;

/// Index of the element of `values` closest to `target`.
///
/// The first index wins when two elements are equally close.
/// Returns `None` for an empty array.
pub fn find_nearest(values: ArrayView1<FloatValue>, target: FloatValue) -> Option<usize> {
    let mut best: Option<(usize, FloatValue)> = None;
    for (i, v) in values.iter().enumerate() {
        let distance = (v - target).abs();
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }
    best.map(|(i, _)| i)
}

/// Minimum and maximum of a sequence of floats.
///
/// Returns `None` if the input is empty.
pub fn min_max<'a>(
    values: impl IntoIterator<Item = &'a FloatValue>,
) -> Option<(FloatValue, FloatValue)> {
    values.into_iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}
