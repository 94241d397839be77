//! Persistence codec for the HNSW index.
//!
//! An index persists as two co-located files sharing a base path:
//!
//! - `<base>.graph` is a binary stream holding graph topology, vectors,
//!   build parameters, and entry point: an 8-byte magic, a little-endian
//!   `u32` format version, a length-prefixed bincode header, a
//!   length-prefixed bincode payload, and a CRC32 of the payload.
//! - `<base>.meta` is a JSON array of item records, one per ordinal.
//!
//! The side-stream is separate so metadata can be refreshed without a graph
//! rebuild, provided item count and ordering are unchanged; violating that
//! desynchronizes ordinals from graph node ids, which the caller must not do.
//!
//! Loading validates magic, version, checksum, and graph structure before
//! returning an index; a newer-format artifact fails with a typed version
//! mismatch instead of being misread.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use bincode::{Decode, Encode};

use crate::catalog::{CatalogStore, ItemRecord};
use crate::error::{Result, SagittaError};
use crate::hnsw::{HnswConfig, HnswIndex, HnswNode};
use crate::vector::Vector;

/// Magic bytes opening every graph stream.
const MAGIC: &[u8; 8] = b"SGTXIDX\0";

/// Current graph stream format version.
pub const FORMAT_VERSION: u32 = 1;

/// Extension of the graph/vector stream.
const GRAPH_EXT: &str = "graph";

/// Extension of the metadata side-stream.
const META_EXT: &str = "meta";

#[derive(Debug, Encode, Decode)]
struct GraphHeader {
    dim: usize,
    item_count: usize,
    entry_point: Option<u32>,
    max_layer: usize,
    config: HnswConfig,
    created_at: i64,
}

#[derive(Debug, Encode, Decode)]
struct GraphPayload {
    vectors: Vec<Vec<f32>>,
    nodes: Vec<HnswNode>,
}

/// The two file paths derived from a base path.
pub fn artifact_paths(base: &Path) -> (PathBuf, PathBuf) {
    (
        base.with_extension(GRAPH_EXT),
        base.with_extension(META_EXT),
    )
}

/// Persist an index to `<base>.graph` and `<base>.meta`.
pub fn save(index: &HnswIndex, base: &Path) -> Result<()> {
    let (graph_path, meta_path) = artifact_paths(base);
    if let Some(parent) = base.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    write_graph(index, &graph_path)?;
    write_metadata(index.store().records(), &meta_path)?;
    Ok(())
}

/// Load an index from `<base>.graph` and `<base>.meta`.
pub fn load(base: &Path) -> Result<HnswIndex> {
    let (graph_path, meta_path) = artifact_paths(base);

    let (header, payload) = read_graph(&graph_path)?;
    let records = read_metadata(&meta_path)?;

    if header.dim != header.config.dim {
        return Err(SagittaError::corrupt(format!(
            "header dimension {} disagrees with config dimension {}",
            header.dim, header.config.dim
        )));
    }
    if records.len() != header.item_count {
        return Err(SagittaError::corrupt(format!(
            "metadata holds {} records, graph stream holds {} items",
            records.len(),
            header.item_count
        )));
    }
    if payload.vectors.len() != header.item_count {
        return Err(SagittaError::corrupt(format!(
            "payload holds {} vectors, header declares {}",
            payload.vectors.len(),
            header.item_count
        )));
    }

    let mut store = CatalogStore::new(header.dim);
    for (vector, record) in payload.vectors.into_iter().zip(records) {
        // Persisted vectors are already normalized; they bypass the
        // normalizing push so the stored f32 values survive bit-exact.
        if vector.len() != header.dim {
            return Err(SagittaError::corrupt(format!(
                "stored vector has dimension {}, header declares {}",
                vector.len(),
                header.dim
            )));
        }
        store = push_raw(store, vector, record)?;
    }

    HnswIndex::from_parts(
        store,
        header.config,
        payload.nodes,
        header.entry_point,
        header.max_layer,
    )
}

/// Rewrite only the metadata side-stream for an existing artifact.
///
/// The record count must match the persisted item count; ordering is the
/// caller's responsibility.
pub fn refresh_metadata(base: &Path, records: &[ItemRecord]) -> Result<()> {
    let (graph_path, meta_path) = artifact_paths(base);

    let (header, _) = read_graph(&graph_path)?;
    if records.len() != header.item_count {
        return Err(SagittaError::invalid_operation(format!(
            "record count {} does not match persisted item count {}",
            records.len(),
            header.item_count
        )));
    }

    write_metadata(records, &meta_path)
}

/// Append without re-normalizing, preserving persisted f32 values exactly.
fn push_raw(mut store: CatalogStore, data: Vec<f32>, record: ItemRecord) -> Result<CatalogStore> {
    if !data.iter().all(|x| x.is_finite()) {
        return Err(SagittaError::corrupt(
            "stored vector contains non-finite components",
        ));
    }
    store.push_unnormalized(Vector::new(data), record)?;
    Ok(store)
}

fn write_graph(index: &HnswIndex, path: &Path) -> Result<()> {
    let header = GraphHeader {
        dim: index.dimension(),
        item_count: index.len(),
        entry_point: index.entry_point(),
        max_layer: index.graph_max_layer(),
        config: index.config().clone(),
        created_at: chrono::Utc::now().timestamp(),
    };
    let payload = GraphPayload {
        vectors: index
            .store()
            .vectors()
            .iter()
            .map(|v| v.data.clone())
            .collect(),
        nodes: index.nodes().to_vec(),
    };

    let header_bytes = bincode::encode_to_vec(&header, bincode::config::standard())
        .map_err(|e| SagittaError::serialization(format!("failed to encode header: {e}")))?;
    let payload_bytes = bincode::encode_to_vec(&payload, bincode::config::standard())
        .map_err(|e| SagittaError::serialization(format!("failed to encode payload: {e}")))?;

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&payload_bytes);
    let checksum = hasher.finalize();

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(MAGIC)?;
    writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
    writer.write_all(&(header_bytes.len() as u32).to_le_bytes())?;
    writer.write_all(&header_bytes)?;
    writer.write_all(&(payload_bytes.len() as u64).to_le_bytes())?;
    writer.write_all(&payload_bytes)?;
    writer.write_all(&checksum.to_le_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

fn read_graph(path: &Path) -> Result<(GraphHeader, GraphPayload)> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(SagittaError::corrupt("bad magic in graph stream"));
    }

    let version = read_u32(&mut reader)?;
    if version != FORMAT_VERSION {
        return Err(SagittaError::VersionMismatch {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let header_len = read_u32(&mut reader)? as usize;
    let mut header_bytes = vec![0u8; header_len];
    reader.read_exact(&mut header_bytes)?;
    let (header, _): (GraphHeader, usize) =
        bincode::decode_from_slice(&header_bytes, bincode::config::standard())
            .map_err(|e| SagittaError::corrupt(format!("failed to decode header: {e}")))?;

    let payload_len = read_u64(&mut reader)? as usize;
    let mut payload_bytes = vec![0u8; payload_len];
    reader.read_exact(&mut payload_bytes)?;

    let expected_checksum = read_u32(&mut reader)?;
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&payload_bytes);
    if hasher.finalize() != expected_checksum {
        return Err(SagittaError::corrupt("payload checksum mismatch"));
    }

    let (payload, _): (GraphPayload, usize) =
        bincode::decode_from_slice(&payload_bytes, bincode::config::standard())
            .map_err(|e| SagittaError::corrupt(format!("failed to decode payload: {e}")))?;

    Ok((header, payload))
}

fn write_metadata(records: &[ItemRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

fn read_metadata(path: &Path) -> Result<Vec<ItemRecord>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let records: Vec<ItemRecord> = serde_json::from_reader(reader)
        .map_err(|e| SagittaError::corrupt(format!("failed to parse metadata stream: {e}")))?;
    Ok(records)
}

fn read_u32(reader: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_paths() {
        let (graph, meta) = artifact_paths(Path::new("data/index/products"));
        assert_eq!(graph, Path::new("data/index/products.graph"));
        assert_eq!(meta, Path::new("data/index/products.meta"));
    }

    #[test]
    fn test_load_rejects_header_config_dimension_desync() {
        let dir = tempfile::TempDir::new().unwrap();
        let base = dir.path().join("desync");
        let (graph_path, meta_path) = artifact_paths(&base);

        // Header declares dim 2 and the payload matches it, but the
        // embedded build config says dim 3.
        let header = GraphHeader {
            dim: 2,
            item_count: 1,
            entry_point: Some(0),
            max_layer: 0,
            config: HnswConfig::new(3),
            created_at: 0,
        };
        let payload = GraphPayload {
            vectors: vec![vec![1.0, 0.0]],
            nodes: vec![HnswNode {
                max_layer: 0,
                neighbors: vec![Vec::new()],
            }],
        };

        let header_bytes = bincode::encode_to_vec(&header, bincode::config::standard()).unwrap();
        let payload_bytes = bincode::encode_to_vec(&payload, bincode::config::standard()).unwrap();
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&payload_bytes);
        let checksum = hasher.finalize();

        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(header_bytes.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&header_bytes);
        bytes.extend_from_slice(&(payload_bytes.len() as u64).to_le_bytes());
        bytes.extend_from_slice(&payload_bytes);
        bytes.extend_from_slice(&checksum.to_le_bytes());
        std::fs::write(&graph_path, bytes).unwrap();

        let records = vec![ItemRecord::new("item-0", "item 0", "misc", 1.0)];
        std::fs::write(&meta_path, serde_json::to_vec(&records).unwrap()).unwrap();

        let err = load(&base).unwrap_err();
        assert!(matches!(err, SagittaError::CorruptArtifact(_)), "{err}");
    }
}
