//! HNSW (Hierarchical Navigable Small World) index for approximate
//! nearest-neighbor search over the catalog arena.
//!
//! The graph is built once over a [`CatalogStore`] and frozen: search takes
//! `&self`, touches no shared mutable state, and is safe for unbounded
//! concurrent callers. The supported mutation path is building a new index
//! and swapping it in wholesale (wrap in `Arc` and replace the handle).
//!
//! Construction inserts one vector at a time: each node draws a maximum
//! layer from an exponential distribution, descends greedily from the entry
//! point, and connects to up to `m` diverse neighbors per layer (twice that
//! at layer 0). Build is deterministic for a fixed seed.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use bincode::{Decode, Encode};
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogStore;
use crate::error::{Result, SagittaError};
use crate::vector::{Vector, similarity_from_distance, squared_euclidean};

/// Configuration for HNSW construction and search.
#[derive(Debug, Clone, Serialize, Deserialize, Encode, Decode)]
pub struct HnswConfig {
    /// Vector dimension.
    pub dim: usize,
    /// Maximum connections per node per layer above 0.
    pub m: usize,
    /// Maximum connections per node at layer 0 (typically `2 * m`).
    pub m_max0: usize,
    /// Layer-assignment decay; `1 / ln(m)` gives each extra layer
    /// probability ~`1/m`.
    pub ml: f64,
    /// Candidate-list size during construction.
    pub ef_construction: usize,
    /// Default candidate-list size during search; raised per query to `k`
    /// when `k` is larger.
    pub ef_search: usize,
    /// Hard cap on layer assignment.
    pub max_layers: usize,
    /// Seed for reproducible layer assignment.
    pub seed: u64,
}

impl HnswConfig {
    /// Create a configuration with default parameters for the given dimension.
    pub fn new(dim: usize) -> Self {
        let m = 16;
        Self {
            dim,
            m,
            m_max0: m * 2,
            ml: 1.0 / (m as f64).ln(),
            ef_construction: 200,
            ef_search: 64,
            max_layers: 16,
            seed: 42,
        }
    }

    /// Set `m`, keeping `m_max0` and `ml` consistent with it.
    pub fn with_m(mut self, m: usize) -> Self {
        self.m = m;
        self.m_max0 = m * 2;
        if m > 1 {
            self.ml = 1.0 / (m as f64).ln();
        }
        self
    }

    /// Set the construction candidate-list size.
    pub fn with_ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = ef_construction;
        self
    }

    /// Set the default search candidate-list size.
    pub fn with_ef_search(mut self, ef_search: usize) -> Self {
        self.ef_search = ef_search;
        self
    }

    /// Set the layer-assignment seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(SagittaError::invalid_operation("dimension must be > 0"));
        }
        if self.m < 2 {
            return Err(SagittaError::invalid_operation("m must be >= 2"));
        }
        if self.ef_construction < self.m {
            return Err(SagittaError::invalid_operation(
                "ef_construction must be >= m",
            ));
        }
        if self.max_layers == 0 {
            return Err(SagittaError::invalid_operation("max_layers must be > 0"));
        }
        Ok(())
    }

    /// Neighbor budget for a layer.
    pub(crate) fn layer_budget(&self, layer: usize) -> usize {
        if layer == 0 { self.m_max0 } else { self.m }
    }
}

/// One node of the graph: per-layer neighbor lists, indexed by layer.
///
/// Nodes hold only catalog ordinals; the arena owns vectors and records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub(crate) struct HnswNode {
    pub max_layer: usize,
    /// `neighbors[layer]` holds the ordinals connected at that layer,
    /// for `layer` in `0..=max_layer`.
    pub neighbors: Vec<Vec<u32>>,
}

impl HnswNode {
    fn new(max_layer: usize) -> Self {
        Self {
            max_layer,
            neighbors: vec![Vec::new(); max_layer + 1],
        }
    }

    fn neighbors_at(&self, layer: usize) -> &[u32] {
        self.neighbors.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Priority-queue entry during graph traversal.
///
/// Ordered by distance with ordinal as the tie-break, so traversal and
/// result order are fully deterministic even among duplicate vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    distance: f32,
    ordinal: u32,
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.ordinal.cmp(&other.ordinal))
    }
}

/// One ANN search hit at the ordinal level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Catalog ordinal of the matched item.
    pub ordinal: usize,
    /// Squared Euclidean distance to the query.
    pub distance: f32,
    /// Cosine similarity derived as `1 - distance / 2`.
    pub similarity: f32,
}

/// Index statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed items.
    pub total_items: usize,
    /// Embedding dimension.
    pub dim: usize,
    /// Highest populated graph layer.
    pub max_layer: usize,
    /// Directed edge count summed over all layers.
    pub total_edges: usize,
    /// Rough in-memory footprint of vectors plus graph.
    pub memory_estimate_bytes: usize,
}

/// Immutable HNSW index over a catalog arena.
#[derive(Debug)]
pub struct HnswIndex {
    config: HnswConfig,
    store: CatalogStore,
    nodes: Vec<HnswNode>,
    entry_point: Option<u32>,
    max_layer: usize,
}

impl HnswIndex {
    /// Build an index over the given store.
    ///
    /// Inserts every stored vector in ordinal order. Deterministic for a
    /// fixed `config.seed`; with a different seed the graph topology varies
    /// but search correctness does not.
    pub fn build(store: CatalogStore, config: HnswConfig) -> Result<Self> {
        config.validate()?;
        if store.dimension() != config.dim {
            return Err(SagittaError::dimension_mismatch(
                config.dim,
                store.dimension(),
            ));
        }

        let mut index = Self {
            config,
            store,
            nodes: Vec::new(),
            entry_point: None,
            max_layer: 0,
        };

        let mut rng = StdRng::seed_from_u64(index.config.seed);
        for ordinal in 0..index.store.len() {
            index.insert(ordinal as u32, &mut rng);
        }
        Ok(index)
    }

    /// Reassemble an index from persisted parts, validating graph structure.
    ///
    /// Used by the persistence codec; any inconsistency is reported as
    /// [`SagittaError::CorruptArtifact`].
    pub(crate) fn from_parts(
        store: CatalogStore,
        config: HnswConfig,
        nodes: Vec<HnswNode>,
        entry_point: Option<u32>,
        max_layer: usize,
    ) -> Result<Self> {
        config
            .validate()
            .map_err(|e| SagittaError::corrupt(format!("invalid config: {e}")))?;
        if store.dimension() != config.dim {
            return Err(SagittaError::corrupt(format!(
                "store dimension {} does not match config dimension {}",
                store.dimension(),
                config.dim
            )));
        }
        if nodes.len() != store.len() {
            return Err(SagittaError::corrupt(format!(
                "node count {} does not match item count {}",
                nodes.len(),
                store.len()
            )));
        }
        match entry_point {
            None if !nodes.is_empty() => {
                return Err(SagittaError::corrupt("non-empty graph has no entry point"));
            }
            Some(ep) if ep as usize >= nodes.len() => {
                return Err(SagittaError::corrupt(format!(
                    "entry point {ep} out of range"
                )));
            }
            _ => {}
        }
        for (ordinal, node) in nodes.iter().enumerate() {
            if node.neighbors.len() != node.max_layer + 1 {
                return Err(SagittaError::corrupt(format!(
                    "node {ordinal} has {} layer lists for max layer {}",
                    node.neighbors.len(),
                    node.max_layer
                )));
            }
            if node.max_layer > max_layer {
                return Err(SagittaError::corrupt(format!(
                    "node {ordinal} exceeds graph max layer {max_layer}"
                )));
            }
            for (layer, list) in node.neighbors.iter().enumerate() {
                if list.len() > config.layer_budget(layer) {
                    return Err(SagittaError::corrupt(format!(
                        "node {ordinal} has {} neighbors at layer {layer} (budget {})",
                        list.len(),
                        config.layer_budget(layer)
                    )));
                }
                for &neighbor in list {
                    if neighbor as usize >= nodes.len() {
                        return Err(SagittaError::corrupt(format!(
                            "node {ordinal} references out-of-range neighbor {neighbor}"
                        )));
                    }
                }
            }
        }

        Ok(Self {
            config,
            store,
            nodes,
            entry_point,
            max_layer,
        })
    }

    /// Search for the `k` nearest stored vectors to `query`.
    ///
    /// Results are ordered by ascending distance, ties broken by ordinal.
    /// An empty index or `k == 0` yields an empty result; a query of the
    /// wrong dimension is rejected.
    pub fn search(&self, query: &Vector, k: usize) -> Result<Vec<SearchHit>> {
        query.validate_dimension(self.config.dim)?;

        let Some(entry_point) = self.entry_point else {
            return Ok(Vec::new());
        };
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = query.normalized();

        // Greedy beam-1 descent through the upper layers.
        let mut closest = vec![entry_point];
        for layer in (1..=self.max_layer).rev() {
            closest = self
                .search_layer(&query.data, &closest, 1, layer)
                .into_iter()
                .map(|c| c.ordinal)
                .collect();
        }

        let ef = self.config.ef_search.max(k);
        let candidates = self.search_layer(&query.data, &closest, ef, 0);

        Ok(candidates
            .into_iter()
            .take(k)
            .map(|c| SearchHit {
                ordinal: c.ordinal as usize,
                distance: c.distance,
                similarity: similarity_from_distance(c.distance),
            })
            .collect())
    }

    /// Run many searches, in parallel, preserving per-query order.
    pub fn search_batch(&self, queries: &[Vector], k: usize) -> Result<Vec<Vec<SearchHit>>> {
        queries
            .par_iter()
            .map(|query| self.search(query, k))
            .collect()
    }

    /// The catalog arena this index was built over.
    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    /// The build configuration.
    pub fn config(&self) -> &HnswConfig {
        &self.config
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the index holds no items.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Embedding dimension.
    pub fn dimension(&self) -> usize {
        self.config.dim
    }

    /// Compute index statistics.
    pub fn stats(&self) -> IndexStats {
        let total_edges: usize = self
            .nodes
            .iter()
            .map(|n| n.neighbors.iter().map(Vec::len).sum::<usize>())
            .sum();
        let vector_bytes = self.store.len() * self.config.dim * size_of::<f32>();
        let graph_bytes = total_edges * size_of::<u32>();

        IndexStats {
            total_items: self.store.len(),
            dim: self.config.dim,
            max_layer: self.max_layer,
            total_edges,
            memory_estimate_bytes: vector_bytes + graph_bytes,
        }
    }

    pub(crate) fn nodes(&self) -> &[HnswNode] {
        &self.nodes
    }

    pub(crate) fn entry_point(&self) -> Option<u32> {
        self.entry_point
    }

    pub(crate) fn graph_max_layer(&self) -> usize {
        self.max_layer
    }

    fn vector_data(&self, ordinal: u32) -> &[f32] {
        // Ordinals come from the node arrays, which only ever hold valid ids.
        &self.store.vectors()[ordinal as usize].data
    }

    /// Draw a maximum layer for a new node from the exponential distribution.
    fn select_layer(&self, rng: &mut StdRng) -> usize {
        let uniform: f64 = rng.random();
        let layer = (-uniform.ln() * self.config.ml).floor() as usize;
        layer.min(self.config.max_layers - 1)
    }

    /// Best-first search within one layer.
    ///
    /// Maintains a result set of at most `ef` candidates and stops when the
    /// closest unexpanded candidate is farther than the worst admitted
    /// result. Returns candidates sorted closest-first.
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[u32],
        ef: usize,
        layer: usize,
    ) -> Vec<Candidate> {
        let mut visited: HashSet<u32> = HashSet::new();
        // Min-heap of candidates to expand.
        let mut to_expand: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        // Max-heap of admitted results; the root is the worst kept.
        let mut admitted: BinaryHeap<Candidate> = BinaryHeap::new();

        for &ordinal in entry_points {
            if !visited.insert(ordinal) {
                continue;
            }
            let candidate = Candidate {
                distance: squared_euclidean(query, self.vector_data(ordinal)),
                ordinal,
            };
            to_expand.push(Reverse(candidate));
            admitted.push(candidate);
        }
        while admitted.len() > ef {
            admitted.pop();
        }

        while let Some(Reverse(current)) = to_expand.pop() {
            if admitted.len() >= ef {
                if let Some(worst) = admitted.peek()
                    && current.distance > worst.distance
                {
                    break;
                }
            }

            for &neighbor in self.nodes[current.ordinal as usize].neighbors_at(layer) {
                if !visited.insert(neighbor) {
                    continue;
                }
                let candidate = Candidate {
                    distance: squared_euclidean(query, self.vector_data(neighbor)),
                    ordinal: neighbor,
                };

                let admit = admitted.len() < ef
                    || admitted
                        .peek()
                        .is_some_and(|worst| candidate < *worst);
                if admit {
                    to_expand.push(Reverse(candidate));
                    admitted.push(candidate);
                    while admitted.len() > ef {
                        admitted.pop();
                    }
                }
            }
        }

        let mut result = admitted.into_vec();
        result.sort_unstable();
        result
    }

    /// Diversity-aware neighbor selection.
    ///
    /// Iterates candidates nearest-first and admits one only if it is closer
    /// to the target than to every already-admitted neighbor; remaining
    /// slots are backfilled with the closest pruned candidates so a node is
    /// never left under-connected.
    fn select_neighbors(&self, candidates: &[Candidate], m: usize) -> Vec<u32> {
        let mut selected: Vec<Candidate> = Vec::with_capacity(m);
        let mut pruned: Vec<Candidate> = Vec::new();

        for &candidate in candidates {
            if selected.len() >= m {
                break;
            }
            let candidate_vec = self.vector_data(candidate.ordinal);
            let diverse = selected.iter().all(|kept| {
                squared_euclidean(candidate_vec, self.vector_data(kept.ordinal))
                    >= candidate.distance
            });
            if diverse {
                selected.push(candidate);
            } else {
                pruned.push(candidate);
            }
        }

        for candidate in pruned {
            if selected.len() >= m {
                break;
            }
            selected.push(candidate);
        }

        selected.into_iter().map(|c| c.ordinal).collect()
    }

    /// Insert one stored vector into the graph.
    fn insert(&mut self, ordinal: u32, rng: &mut StdRng) {
        let node_layer = self.select_layer(rng);
        self.nodes.push(HnswNode::new(node_layer));

        let Some(entry_point) = self.entry_point else {
            // First vector: entry point with no neighbors.
            self.entry_point = Some(ordinal);
            self.max_layer = node_layer;
            return;
        };

        let query: Vec<f32> = self.vector_data(ordinal).to_vec();

        // Descend with beam 1 through layers above the node's top layer.
        let mut closest = vec![entry_point];
        for layer in (node_layer + 1..=self.max_layer).rev() {
            closest = self
                .search_layer(&query, &closest, 1, layer)
                .into_iter()
                .map(|c| c.ordinal)
                .collect();
        }

        // Connect from the node's top layer down to 0.
        for layer in (0..=node_layer.min(self.max_layer)).rev() {
            let candidates =
                self.search_layer(&query, &closest, self.config.ef_construction, layer);
            let budget = self.config.layer_budget(layer);
            let selected = self.select_neighbors(&candidates, budget);

            self.nodes[ordinal as usize].neighbors[layer] = selected.clone();
            for &neighbor in &selected {
                self.nodes[neighbor as usize].neighbors[layer].push(ordinal);
                if self.nodes[neighbor as usize].neighbors[layer].len() > budget {
                    self.prune_neighbors(neighbor, layer, budget);
                }
            }

            closest = selected;
        }

        if node_layer > self.max_layer {
            self.entry_point = Some(ordinal);
            self.max_layer = node_layer;
        }
    }

    /// Re-select a node's neighbor list down to the layer budget using the
    /// same diversity rule as initial selection.
    fn prune_neighbors(&mut self, ordinal: u32, layer: usize, budget: usize) {
        let target: Vec<f32> = self.vector_data(ordinal).to_vec();
        let mut candidates: Vec<Candidate> = self.nodes[ordinal as usize].neighbors[layer]
            .iter()
            .map(|&neighbor| Candidate {
                distance: squared_euclidean(&target, self.vector_data(neighbor)),
                ordinal: neighbor,
            })
            .collect();
        candidates.sort_unstable();

        let kept = self.select_neighbors(&candidates, budget);
        self.nodes[ordinal as usize].neighbors[layer] = kept;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemRecord;

    fn store_from(vectors: &[Vec<f32>]) -> CatalogStore {
        let dim = vectors[0].len();
        let pairs = vectors.iter().enumerate().map(|(i, v)| {
            (
                Vector::new(v.clone()),
                ItemRecord::new(format!("item-{i}"), format!("item {i}"), "misc", 1.0),
            )
        });
        CatalogStore::from_pairs(dim, pairs).unwrap()
    }

    fn small_config(dim: usize) -> HnswConfig {
        HnswConfig::new(dim).with_m(8).with_ef_construction(32)
    }

    #[test]
    fn test_config_defaults_and_builders() {
        let config = HnswConfig::new(512);
        assert_eq!(config.dim, 512);
        assert_eq!(config.m, 16);
        assert_eq!(config.m_max0, 32);
        assert!((config.ml - 1.0 / 16.0_f64.ln()).abs() < 1e-12);
        assert!(config.validate().is_ok());

        let config = config.with_m(32);
        assert_eq!(config.m_max0, 64);
        assert!((config.ml - 1.0 / 32.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_config_validation() {
        assert!(HnswConfig::new(0).validate().is_err());

        let mut config = HnswConfig::new(4);
        config.ef_construction = 4; // below m
        assert!(config.validate().is_err());

        let mut config = HnswConfig::new(4);
        config.m = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_rejects_store_dimension_mismatch() {
        let store = store_from(&[vec![1.0, 0.0]]);
        let err = HnswIndex::build(store, HnswConfig::new(3)).unwrap_err();
        assert!(matches!(err, SagittaError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_from_parts_rejects_store_config_dimension_desync() {
        let index =
            HnswIndex::build(store_from(&[vec![1.0, 0.0], vec![0.0, 1.0]]), small_config(2))
                .unwrap();
        let err = HnswIndex::from_parts(
            index.store().clone(),
            small_config(3),
            index.nodes().to_vec(),
            index.entry_point(),
            index.graph_max_layer(),
        )
        .unwrap_err();
        assert!(matches!(err, SagittaError::CorruptArtifact(_)));
    }

    #[test]
    fn test_empty_index_search() {
        let index = HnswIndex::build(CatalogStore::new(4), HnswConfig::new(4)).unwrap();
        let hits = index
            .search(&Vector::new(vec![1.0, 0.0, 0.0, 0.0]), 5)
            .unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_k_zero_returns_empty() {
        let index = HnswIndex::build(store_from(&[vec![1.0, 0.0]]), small_config(2)).unwrap();
        let hits = index.search(&Vector::new(vec![1.0, 0.0]), 0).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = HnswIndex::build(store_from(&[vec![1.0, 0.0]]), small_config(2)).unwrap();
        let err = index.search(&Vector::new(vec![1.0]), 1).unwrap_err();
        assert!(matches!(err, SagittaError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_self_retrieval() {
        let vectors = vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.7, 0.7, 0.0],
            vec![0.0, 0.7, 0.7],
        ];
        let index = HnswIndex::build(store_from(&vectors), small_config(3)).unwrap();

        for ordinal in 0..index.len() {
            let stored = index.store().vector(ordinal).unwrap().clone();
            let hits = index.search(&stored, 1).unwrap();
            assert_eq!(hits.len(), 1);
            assert_eq!(hits[0].ordinal, ordinal);
            assert!(hits[0].distance < 1e-6);
            assert!(hits[0].similarity > 0.999);
        }
    }

    #[test]
    fn test_duplicate_vectors_tie_break_by_ordinal() {
        let vectors = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ];
        let index = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();

        let hits = index.search(&Vector::new(vec![1.0, 0.0]), 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].ordinal, 0);
        assert_eq!(hits[1].ordinal, 1);
    }

    #[test]
    fn test_search_is_deterministic() {
        let vectors: Vec<Vec<f32>> = (0..60)
            .map(|i| {
                let angle = i as f32 * 0.11;
                vec![angle.cos(), angle.sin(), (i as f32 * 0.03).sin()]
            })
            .collect();
        let index = HnswIndex::build(store_from(&vectors), small_config(3)).unwrap();
        let query = Vector::new(vec![0.5, 0.5, 0.1]);

        let first = index.search(&query, 10).unwrap();
        for _ in 0..5 {
            let again = index.search(&query, 10).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_fixed_seed_reproduces_graph() {
        let vectors: Vec<Vec<f32>> = (0..40)
            .map(|i| vec![(i as f32 * 0.7).cos(), (i as f32 * 0.7).sin()])
            .collect();

        let a = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();
        let b = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();

        assert_eq!(a.entry_point(), b.entry_point());
        assert_eq!(a.nodes(), b.nodes());
    }

    #[test]
    fn test_k_monotonicity() {
        let vectors: Vec<Vec<f32>> = (0..80)
            .map(|i| {
                let a = i as f32 * 0.17;
                vec![a.cos(), a.sin(), (a * 0.5).cos(), (a * 0.5).sin()]
            })
            .collect();
        let index = HnswIndex::build(store_from(&vectors), small_config(4)).unwrap();
        let query = Vector::new(vec![0.9, 0.1, 0.3, 0.2]);

        let k5 = index.search(&query, 5).unwrap();
        let k12 = index.search(&query, 12).unwrap();
        assert_eq!(&k12[..5], &k5[..]);
    }

    #[test]
    fn test_results_sorted_by_distance() {
        let vectors: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![(i as f32).cos(), (i as f32).sin()])
            .collect();
        let index = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();

        let hits = index.search(&Vector::new(vec![1.0, 0.2]), 10).unwrap();
        assert_eq!(hits.len(), 10);
        for pair in hits.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn test_neighbor_budgets_respected() {
        let vectors: Vec<Vec<f32>> = (0..120)
            .map(|i| {
                let a = i as f32 * 0.05;
                vec![a.cos(), a.sin(), (a * 3.0).cos()]
            })
            .collect();
        let config = small_config(3);
        let index = HnswIndex::build(store_from(&vectors), config.clone()).unwrap();

        for node in index.nodes() {
            for (layer, list) in node.neighbors.iter().enumerate() {
                assert!(list.len() <= config.layer_budget(layer));
            }
        }
    }

    #[test]
    fn test_layer_zero_reachability() {
        // Every node must be reachable from the entry point at layer 0.
        let vectors: Vec<Vec<f32>> = (0..60)
            .map(|i| {
                let a = i as f32 * 0.4;
                vec![a.cos(), a.sin()]
            })
            .collect();
        let index = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();

        let mut seen = vec![false; index.len()];
        let mut stack = vec![index.entry_point().unwrap() as usize];
        while let Some(current) = stack.pop() {
            if std::mem::replace(&mut seen[current], true) {
                continue;
            }
            for &neighbor in index.nodes()[current].neighbors_at(0) {
                if !seen[neighbor as usize] {
                    stack.push(neighbor as usize);
                }
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_search_batch_matches_sequential() {
        let vectors: Vec<Vec<f32>> = (0..30)
            .map(|i| vec![(i as f32 * 0.3).cos(), (i as f32 * 0.3).sin()])
            .collect();
        let index = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();

        let queries = vec![
            Vector::new(vec![1.0, 0.0]),
            Vector::new(vec![0.0, 1.0]),
            Vector::new(vec![-0.5, 0.5]),
        ];
        let batched = index.search_batch(&queries, 4).unwrap();
        assert_eq!(batched.len(), 3);
        for (query, hits) in queries.iter().zip(&batched) {
            assert_eq!(hits, &index.search(query, 4).unwrap());
        }
    }

    #[test]
    fn test_stats() {
        let vectors: Vec<Vec<f32>> = (0..25)
            .map(|i| vec![(i as f32).cos(), (i as f32).sin()])
            .collect();
        let index = HnswIndex::build(store_from(&vectors), small_config(2)).unwrap();

        let stats = index.stats();
        assert_eq!(stats.total_items, 25);
        assert_eq!(stats.dim, 2);
        assert!(stats.total_edges > 0);
        assert!(stats.memory_estimate_bytes > 0);
    }
}
