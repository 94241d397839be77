//! Command implementations for the Sagitta CLI.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;

use serde::Deserialize;

use crate::catalog::{CatalogStore, ItemRecord};
use crate::cli::args::{BuildArgs, Command, SagittaArgs, SearchArgs, StatsArgs};
use crate::error::{Result, SagittaError};
use crate::hnsw::{HnswConfig, HnswIndex};
use crate::query::{SearchFilter, SortMode, filtered_search};
use crate::storage;
use crate::vector::Vector;

/// One line of a catalog dump: a record plus its precomputed embedding.
#[derive(Debug, Deserialize)]
struct CatalogLine {
    #[serde(flatten)]
    record: ItemRecord,
    embedding: Vec<f32>,
}

/// Execute a CLI command.
pub fn execute_command(args: SagittaArgs) -> Result<()> {
    match &args.command {
        Command::Build(build_args) => build_index(build_args, &args),
        Command::Search(search_args) => search_index(search_args, &args),
        Command::Stats(stats_args) => show_stats(stats_args, &args),
    }
}

fn build_index(args: &BuildArgs, cli: &SagittaArgs) -> Result<()> {
    let started = Instant::now();

    let file = File::open(&args.catalog)?;
    let reader = BufReader::new(file);

    let mut store: Option<CatalogStore> = None;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let parsed: CatalogLine = serde_json::from_str(&line).map_err(|e| {
            SagittaError::invalid_operation(format!("catalog line {}: {e}", line_no + 1))
        })?;

        let store = store.get_or_insert_with(|| CatalogStore::new(parsed.embedding.len()));
        store.push(Vector::new(parsed.embedding), parsed.record)?;
    }

    let store = store.ok_or_else(|| {
        SagittaError::invalid_operation(format!("catalog {} holds no items", args.catalog.display()))
    })?;

    let config = HnswConfig::new(store.dimension())
        .with_m(args.m)
        .with_ef_construction(args.ef_construction)
        .with_ef_search(args.ef_search)
        .with_seed(args.seed);
    let index = HnswIndex::build(store, config)?;
    storage::save(&index, &args.out)?;

    let summary = serde_json::json!({
        "indexed_items": index.len(),
        "dim": index.dimension(),
        "out": args.out.display().to_string(),
        "elapsed_ms": started.elapsed().as_millis() as u64,
    });
    print_json(&summary, cli.pretty)?;
    Ok(())
}

fn search_index(args: &SearchArgs, cli: &SagittaArgs) -> Result<()> {
    let index = storage::load(&args.index)?;

    let embedding: Vec<f32> = serde_json::from_reader(BufReader::new(File::open(
        &args.embedding_file,
    )?))?;
    let query = Vector::new(embedding);

    let mut filter = SearchFilter::none();
    filter.min_price = args.min_price;
    filter.max_price = args.max_price;
    if let Some(categories) = &args.categories {
        filter.categories = categories
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect();
    }
    let sort = SortMode::parse_str(&args.sort)?;
    let k_fetch = args.k_fetch.unwrap_or(args.k.saturating_mul(5));

    let results = filtered_search(&index, &query, args.k, k_fetch, &filter, sort)?;
    print_json(&serde_json::to_value(&results)?, cli.pretty)?;
    Ok(())
}

fn show_stats(args: &StatsArgs, cli: &SagittaArgs) -> Result<()> {
    let index = storage::load(&args.index)?;
    let stats = index.stats();

    let summary = serde_json::json!({
        "stats": stats,
        "categories": index.store().categories(),
        "price_range": index.store().price_range(),
    });
    print_json(&summary, cli.pretty)?;
    Ok(())
}

fn print_json(value: &serde_json::Value, pretty: bool) -> Result<()> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{rendered}");
    Ok(())
}
