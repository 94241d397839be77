//! Post-filter ranking: over-fetch ANN candidates, apply structured
//! predicates, re-sort, truncate.
//!
//! Filtering happens after ANN retrieval rather than during graph traversal,
//! so recall is bounded by the over-fetch count: a predicate that excludes
//! most of the catalog can legitimately return fewer than `k_final` results.
//! Callers needing exhaustive filtered recall must raise `k_fetch`.

use serde::{Deserialize, Serialize};

use crate::catalog::ItemRecord;
use crate::error::{Result, SagittaError};
use crate::hnsw::HnswIndex;
use crate::query::QueryResults;
use crate::vector::Vector;

/// Structured predicates applied to ANN candidates.
///
/// All bounds are inclusive. An empty category allow-list means no category
/// restriction. Inverted price bounds are not an error; nothing satisfies
/// them, so the result is simply empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Minimum price, inclusive.
    pub min_price: Option<f64>,
    /// Maximum price, inclusive.
    pub max_price: Option<f64>,
    /// Category allow-list; empty means any category.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl SearchFilter {
    /// A filter that admits everything.
    pub fn none() -> Self {
        Self::default()
    }

    /// Restrict to an inclusive price range.
    pub fn with_price_range(mut self, min: f64, max: f64) -> Self {
        self.min_price = Some(min);
        self.max_price = Some(max);
        self
    }

    /// Restrict to the given categories.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = categories;
        self
    }

    /// Whether a record satisfies every predicate.
    pub fn matches(&self, record: &ItemRecord) -> bool {
        if let Some(min) = self.min_price
            && record.price < min
        {
            return false;
        }
        if let Some(max) = self.max_price
            && record.price > max
        {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| *c == record.category) {
            return false;
        }
        true
    }
}

/// Ordering applied to filter survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Keep ANN distance order.
    #[default]
    Relevance,
    /// Stable sort by price, cheapest first.
    PriceAscending,
    /// Stable sort by price, most expensive first.
    PriceDescending,
}

impl SortMode {
    /// Parse a sort mode from a string, accepting both the canonical names
    /// and the short wire names.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "price_ascending" | "price_low" => Ok(SortMode::PriceAscending),
            "price_descending" | "price_high" => Ok(SortMode::PriceDescending),
            _ => Err(SagittaError::invalid_operation(format!(
                "unknown sort mode: {s}"
            ))),
        }
    }
}

/// Over-fetch `k_fetch` ANN candidates, retain those matching `filter`,
/// apply `sort`, and truncate to `k_final`.
///
/// `k_fetch` is clamped up to `k_final`. Returning fewer than `k_final`
/// survivors is valid behavior, never an error.
pub fn filtered_search(
    index: &HnswIndex,
    query: &Vector,
    k_final: usize,
    k_fetch: usize,
    filter: &SearchFilter,
    sort: SortMode,
) -> Result<QueryResults> {
    let fetched = index.search(query, k_fetch.max(k_final))?;
    let mut results = QueryResults::resolve(index, fetched);

    results.hits.retain(|hit| filter.matches(&hit.record));

    match sort {
        SortMode::Relevance => {}
        SortMode::PriceAscending => {
            results
                .hits
                .sort_by(|a, b| a.record.price.total_cmp(&b.record.price));
        }
        SortMode::PriceDescending => {
            results
                .hits
                .sort_by(|a, b| b.record.price.total_cmp(&a.record.price));
        }
    }

    results.hits.truncate(k_final);
    Ok(results)
}
