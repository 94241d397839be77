//! Catalog item records and the vector arena that owns them.
//!
//! A [`CatalogStore`] is an append-only arena in which one ordinal indexes
//! both an item's embedding and its metadata record. The graph index stores
//! only ordinals, so the embedding/metadata pairing can never desynchronize
//! inside one store. Ordinals are assigned densely in insertion order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SagittaError};
use crate::vector::Vector;

/// Metadata record for one catalog item.
///
/// The fields inspected by the query layer (`category`, `price`) are part of
/// the fixed schema; anything display-only goes into `extra` and is carried
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Stable external identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Category label used by the category allow-list filter.
    #[serde(default)]
    pub category: String,
    /// Non-negative price used by price-bound filters and price sorts.
    #[serde(default)]
    pub price: f64,
    /// Display-only fields, never inspected by index or query logic.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

impl ItemRecord {
    /// Create a record with the required fields and an empty extra map.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: category.into(),
            price,
            extra: HashMap::new(),
        }
    }
}

/// Append-only arena of (embedding, record) pairs sharing one ordinal space.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    dimension: usize,
    vectors: Vec<Vector>,
    records: Vec<ItemRecord>,
}

impl CatalogStore {
    /// Create an empty store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
            records: Vec::new(),
        }
    }

    /// Append an item, returning its ordinal.
    ///
    /// The embedding is validated against the store dimension, rejected if it
    /// contains non-finite components, and normalized to unit length.
    pub fn push(&mut self, mut vector: Vector, record: ItemRecord) -> Result<usize> {
        vector.validate_dimension(self.dimension)?;
        if !vector.is_valid() {
            return Err(SagittaError::invalid_operation(
                "vector contains NaN or infinite components",
            ));
        }
        if record.price < 0.0 {
            return Err(SagittaError::invalid_operation(format!(
                "item {:?} has negative price {}",
                record.id, record.price
            )));
        }
        vector.normalize();

        let ordinal = self.vectors.len();
        self.vectors.push(vector);
        self.records.push(record);
        Ok(ordinal)
    }

    /// Append an item without normalizing, preserving component bits.
    ///
    /// Used when reloading persisted vectors, which are already normalized;
    /// re-normalizing would perturb f32 values and break round-trip
    /// fidelity. Dimension is still validated.
    pub(crate) fn push_unnormalized(
        &mut self,
        vector: Vector,
        record: ItemRecord,
    ) -> Result<usize> {
        vector.validate_dimension(self.dimension)?;
        let ordinal = self.vectors.len();
        self.vectors.push(vector);
        self.records.push(record);
        Ok(ordinal)
    }

    /// Build a store from parallel vectors and records.
    ///
    /// Validates every pair up front, then normalizes the vectors as one
    /// batch, in parallel for larger catalogs.
    pub fn from_pairs(
        dimension: usize,
        pairs: impl IntoIterator<Item = (Vector, ItemRecord)>,
    ) -> Result<Self> {
        let (mut vectors, records): (Vec<Vector>, Vec<ItemRecord>) = pairs.into_iter().unzip();
        for (vector, record) in vectors.iter().zip(&records) {
            vector.validate_dimension(dimension)?;
            if !vector.is_valid() {
                return Err(SagittaError::invalid_operation(
                    "vector contains NaN or infinite components",
                ));
            }
            if record.price < 0.0 {
                return Err(SagittaError::invalid_operation(format!(
                    "item {:?} has negative price {}",
                    record.id, record.price
                )));
            }
        }
        Vector::normalize_batch(&mut vectors);

        let mut store = Self::new(dimension);
        for (vector, record) in vectors.into_iter().zip(records) {
            store.push_unnormalized(vector, record)?;
        }
        Ok(store)
    }

    /// Number of items in the store.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension every stored vector has.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Get the embedding at an ordinal.
    pub fn vector(&self, ordinal: usize) -> Option<&Vector> {
        self.vectors.get(ordinal)
    }

    /// Get the record at an ordinal.
    pub fn record(&self, ordinal: usize) -> Option<&ItemRecord> {
        self.records.get(ordinal)
    }

    /// All records, in ordinal order.
    pub fn records(&self) -> &[ItemRecord] {
        &self.records
    }

    /// All vectors, in ordinal order.
    pub fn vectors(&self) -> &[Vector] {
        &self.vectors
    }

    /// Find the ordinal of the first item with the given external id.
    pub fn find_by_external_id(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Sorted list of distinct category labels in the catalog.
    pub fn categories(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.category.clone())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Minimum and maximum price across the catalog, or `None` if empty.
    pub fn price_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.records.iter().map(|r| r.price);
        let first = iter.next()?;
        let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some((min, max))
    }

    /// Replace all records without touching the vectors.
    ///
    /// Count and ordering must match the existing vectors; otherwise ordinals
    /// and graph node ids would desynchronize.
    pub fn replace_records(&mut self, records: Vec<ItemRecord>) -> Result<()> {
        if records.len() != self.vectors.len() {
            return Err(SagittaError::invalid_operation(format!(
                "record count {} does not match vector count {}",
                records.len(),
                self.vectors.len()
            )));
        }
        self.records = records;
        Ok(())
    }
}
