//! Command line argument parsing for the Sagitta CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sagitta - approximate nearest-neighbor search over a catalog index
#[derive(Parser, Debug, Clone)]
#[command(name = "sagitta")]
#[command(about = "Build and query catalog similarity-search indexes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct SagittaArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build an index from a JSONL catalog dump with precomputed embeddings
    Build(BuildArgs),

    /// Query an index with an embedding read from a JSON file
    Search(SearchArgs),

    /// Show statistics for a persisted index
    Stats(StatsArgs),
}

/// Arguments for the build command
#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    /// Catalog dump: one JSON object per line, item record fields plus an
    /// "embedding" array
    #[arg(short, long)]
    pub catalog: PathBuf,

    /// Base path for the output artifact (writes <base>.graph and <base>.meta)
    #[arg(short, long)]
    pub out: PathBuf,

    /// Maximum neighbors per node per layer
    #[arg(long, default_value_t = 16)]
    pub m: usize,

    /// Candidate-list size during construction
    #[arg(long, default_value_t = 200)]
    pub ef_construction: usize,

    /// Default candidate-list size for queries against the built index
    #[arg(long, default_value_t = 64)]
    pub ef_search: usize,

    /// Seed for reproducible layer assignment
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Arguments for the search command
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Base path of the persisted index
    #[arg(short, long)]
    pub index: PathBuf,

    /// JSON file holding the query embedding as an array of numbers
    #[arg(short, long)]
    pub embedding_file: PathBuf,

    /// Number of results to return
    #[arg(short, long, default_value_t = 10)]
    pub k: usize,

    /// Over-fetch count for filtered queries; defaults to 5 * k
    #[arg(long)]
    pub k_fetch: Option<usize>,

    /// Minimum price, inclusive
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Maximum price, inclusive
    #[arg(long)]
    pub max_price: Option<f64>,

    /// Comma-separated category allow-list
    #[arg(long)]
    pub categories: Option<String>,

    /// Sort mode: relevance, price_ascending/price_low, price_descending/price_high
    #[arg(long, default_value = "relevance")]
    pub sort: String,
}

/// Arguments for the stats command
#[derive(Parser, Debug, Clone)]
pub struct StatsArgs {
    /// Base path of the persisted index
    #[arg(short, long)]
    pub index: PathBuf,
}
