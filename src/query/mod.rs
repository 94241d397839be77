//! Query layer: record-resolving search, hybrid fusion, and post-filter
//! ranking over an immutable [`HnswIndex`].

pub mod composer;
pub mod filter;

use serde::{Deserialize, Serialize};

use crate::catalog::ItemRecord;
use crate::error::Result;
use crate::hnsw::{HnswIndex, SearchHit};
use crate::vector::Vector;

pub use composer::{WeightedVector, blend, fuse};
pub use filter::{SearchFilter, SortMode, filtered_search};

/// One ranked result with its resolved catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    /// Catalog ordinal of the item.
    pub ordinal: usize,
    /// The item's metadata record.
    pub record: ItemRecord,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
    /// Cosine similarity derived as `1 - distance / 2`.
    pub similarity: f32,
}

/// An ordered list of ranked results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResults {
    /// Hits ordered by ascending distance unless re-sorted by a sort mode.
    pub hits: Vec<QueryHit>,
}

impl QueryResults {
    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether there are no hits.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The closest hit, if any.
    pub fn best(&self) -> Option<&QueryHit> {
        self.hits.first()
    }

    pub(crate) fn resolve(index: &HnswIndex, hits: Vec<SearchHit>) -> Self {
        let hits = hits
            .into_iter()
            .filter_map(|hit| {
                index.store().record(hit.ordinal).map(|record| QueryHit {
                    ordinal: hit.ordinal,
                    record: record.clone(),
                    distance: hit.distance,
                    similarity: hit.similarity,
                })
            })
            .collect();
        Self { hits }
    }
}

/// Search the index and resolve hits to their catalog records.
pub fn search(index: &HnswIndex, query: &Vector, k: usize) -> Result<QueryResults> {
    let hits = index.search(query, k)?;
    Ok(QueryResults::resolve(index, hits))
}

/// Find items similar to an existing catalog item, identified by its
/// external id, using its stored embedding as the query.
///
/// The seed item itself is excluded from the results. An unknown id yields
/// an empty result rather than an error.
pub fn more_like(index: &HnswIndex, external_id: &str, k: usize) -> Result<QueryResults> {
    let Some(ordinal) = index.store().find_by_external_id(external_id) else {
        return Ok(QueryResults::default());
    };
    let Some(seed) = index.store().vector(ordinal) else {
        return Ok(QueryResults::default());
    };
    let seed = seed.clone();

    // Over-fetch by one so the seed item can be dropped.
    let mut hits = index.search(&seed, k.saturating_add(1))?;
    hits.retain(|hit| hit.ordinal != ordinal);
    hits.truncate(k);
    Ok(QueryResults::resolve(index, hits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogStore;
    use crate::hnsw::HnswConfig;

    fn sample_index() -> HnswIndex {
        let mut store = CatalogStore::new(2);
        let items = [
            ("red-shirt", vec![1.0, 0.0]),
            ("blue-shirt", vec![0.95, 0.05]),
            ("black-boot", vec![0.0, 1.0]),
        ];
        for (id, v) in items {
            store
                .push(Vector::new(v), ItemRecord::new(id, id, "misc", 10.0))
                .unwrap();
        }
        HnswIndex::build(store, HnswConfig::new(2).with_m(4).with_ef_construction(16)).unwrap()
    }

    #[test]
    fn test_search_resolves_records() {
        let index = sample_index();
        let results = search(&index, &Vector::new(vec![1.0, 0.0]), 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.best().unwrap().record.id, "red-shirt");
        assert!(results.best().unwrap().similarity > 0.99);
    }

    #[test]
    fn test_more_like_excludes_seed() {
        let index = sample_index();
        let results = more_like(&index, "red-shirt", 2).unwrap();

        assert!(!results.is_empty());
        assert!(results.hits.iter().all(|h| h.record.id != "red-shirt"));
        assert_eq!(results.best().unwrap().record.id, "blue-shirt");
    }

    #[test]
    fn test_more_like_unknown_id() {
        let index = sample_index();
        let results = more_like(&index, "no-such-item", 3).unwrap();
        assert!(results.is_empty());
    }
}
