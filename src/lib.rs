//! # Sagitta
//!
//! Approximate nearest-neighbor search core for catalog similarity search.
//!
//! ## Features
//!
//! - HNSW graph index over unit-normalized embeddings
//! - Append-only arena pairing each embedding with its item record
//! - Hybrid (multi-vector) query fusion
//! - Post-filter ranking with price/category predicates and price sorts
//! - Versioned two-file persistence with metadata refresh

pub mod catalog;
pub mod cli;
pub mod error;
pub mod hnsw;
pub mod query;
pub mod storage;
pub mod vector;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
