//! Nearest-neighbour lookup over target grid cell centres.

use crate::errors::{AggError, AggResult};
use crate::FloatValue;
use kd_tree::KdTree2;
use ordered_float::OrderedFloat;

/// A candidate cell centre tagged with its row-major flat index
type Candidate = (usize, [FloatValue; 2]);

/// k-d tree over `[lat, lon]` cell centres
///
/// Distances are Euclidean in coordinate space, with no geodesic correction.
/// The tree is immutable once built, so queries against a given tree always return the
/// same candidate, including when two centres are equally close.
pub struct CellIndex {
    tree: KdTree2<Candidate>,
    len: usize,
}

impl CellIndex {
    /// Build the index from cell centres given in row-major order
    pub fn build(centers: impl IntoIterator<Item = [FloatValue; 2]>) -> AggResult<Self> {
        let candidates: Vec<Candidate> = centers.into_iter().enumerate().collect();
        if candidates.is_empty() {
            return Err(AggError::EmptyInput(
                "no candidate cell centres to index".to_string(),
            ));
        }
        let len = candidates.len();
        let tree = KdTree2::build_by_key(candidates, |item, k| OrderedFloat(item.1[k]));
        Ok(Self { tree, len })
    }

    /// Number of indexed cell centres
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Flat index and centre of the candidate closest to `query` (`[lat, lon]`)
    pub fn nearest(&self, query: [FloatValue; 2]) -> Option<(usize, [FloatValue; 2])> {
        self.tree
            .nearest_by(&query, |item, k| item.1[k])
            .map(|found| *found.item)
    }
}
