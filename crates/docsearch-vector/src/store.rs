//! Index persistence.
//!
//! An index directory holds two artifacts keyed by the same record ids:
//! - `vectors.bin`: bincode-encoded dimension, metric, id counter and vectors
//! - `payload.json`: dimension plus each record's chunk (text + metadata)
//!
//! Both must be present and agree for [`load`] to succeed.

use std::fs;
use std::path::Path;

use docsearch_types::{Chunk, RecordId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::VectorError;
use crate::index::{EmbeddedRecord, Metric, VectorIndex};

/// Vector artifact file name
pub const VECTORS_FILE: &str = "vectors.bin";

/// Payload artifact file name
pub const PAYLOAD_FILE: &str = "payload.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct VectorFileRef<'a> {
    format_version: u32,
    dimension: usize,
    metric: Metric,
    next_id: u64,
    vectors: Vec<StoredVectorRef<'a>>,
}

#[derive(Serialize)]
struct StoredVectorRef<'a> {
    id: RecordId,
    values: &'a [f32],
}

#[derive(Deserialize)]
struct VectorFile {
    format_version: u32,
    dimension: usize,
    metric: Metric,
    next_id: u64,
    vectors: Vec<StoredVector>,
}

#[derive(Deserialize)]
struct StoredVector {
    id: RecordId,
    values: Vec<f32>,
}

#[derive(Serialize)]
struct PayloadFileRef<'a> {
    dimension: usize,
    records: Vec<StoredPayloadRef<'a>>,
}

#[derive(Serialize)]
struct StoredPayloadRef<'a> {
    id: RecordId,
    chunk: &'a Chunk,
}

#[derive(Deserialize)]
struct PayloadFile {
    dimension: usize,
    records: Vec<StoredPayload>,
}

#[derive(Deserialize)]
struct StoredPayload {
    id: RecordId,
    chunk: Chunk,
}

/// Whether both artifacts exist in `dir`
pub fn index_exists(dir: impl AsRef<Path>) -> bool {
    let dir = dir.as_ref();
    dir.join(VECTORS_FILE).is_file() && dir.join(PAYLOAD_FILE).is_file()
}

/// Persist the full record set of `index` into `dir`.
///
/// Each artifact is written to a temporary file and renamed into place.
pub fn save(index: &VectorIndex, dir: impl AsRef<Path>) -> Result<(), VectorError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let vectors = VectorFileRef {
        format_version: FORMAT_VERSION,
        dimension: index.dimension(),
        metric: index.metric(),
        next_id: index.next_id(),
        vectors: index
            .records()
            .iter()
            .map(|r| StoredVectorRef {
                id: r.record_id,
                values: &r.vector,
            })
            .collect(),
    };
    let vector_bytes = bincode::serde::encode_to_vec(&vectors, bincode::config::standard())
        .map_err(|e| VectorError::Serialization(e.to_string()))?;

    let payload = PayloadFileRef {
        dimension: index.dimension(),
        records: index
            .records()
            .iter()
            .map(|r| StoredPayloadRef {
                id: r.record_id,
                chunk: &r.chunk,
            })
            .collect(),
    };
    let payload_bytes =
        serde_json::to_vec(&payload).map_err(|e| VectorError::Serialization(e.to_string()))?;

    write_atomic(&dir.join(VECTORS_FILE), &vector_bytes)?;
    write_atomic(&dir.join(PAYLOAD_FILE), &payload_bytes)?;

    info!(path = ?dir, records = index.len(), "Saved vector index");
    Ok(())
}

/// Restore an index previously written by [`save`].
pub fn load(dir: impl AsRef<Path>) -> Result<VectorIndex, VectorError> {
    let dir = dir.as_ref();
    let vectors_path = dir.join(VECTORS_FILE);
    let payload_path = dir.join(PAYLOAD_FILE);

    for path in [&vectors_path, &payload_path] {
        if !path.is_file() {
            return Err(VectorError::IndexNotFound(path.display().to_string()));
        }
    }

    let vector_bytes = fs::read(&vectors_path)?;
    let (vectors, _): (VectorFile, usize) =
        bincode::serde::decode_from_slice(&vector_bytes, bincode::config::standard())
            .map_err(|e| VectorError::CorruptIndex(format!("{}: {}", VECTORS_FILE, e)))?;

    if vectors.format_version != FORMAT_VERSION {
        return Err(VectorError::CorruptIndex(format!(
            "unsupported format version {}",
            vectors.format_version
        )));
    }

    let payload_bytes = fs::read(&payload_path)?;
    let payload: PayloadFile = serde_json::from_slice(&payload_bytes)
        .map_err(|e| VectorError::CorruptIndex(format!("{}: {}", PAYLOAD_FILE, e)))?;

    if payload.dimension != vectors.dimension {
        return Err(VectorError::CorruptIndex(format!(
            "payload dimension {} does not match vector dimension {}",
            payload.dimension, vectors.dimension
        )));
    }
    if payload.records.len() != vectors.vectors.len() {
        return Err(VectorError::CorruptIndex(format!(
            "{} vectors but {} payload records",
            vectors.vectors.len(),
            payload.records.len()
        )));
    }

    let records = vectors
        .vectors
        .into_iter()
        .zip(payload.records)
        .map(|(v, p)| {
            if v.id != p.id {
                return Err(VectorError::CorruptIndex(format!(
                    "vector id {} paired with payload id {}",
                    v.id, p.id
                )));
            }
            Ok(EmbeddedRecord {
                record_id: v.id,
                vector: v.values,
                chunk: p.chunk,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let index = VectorIndex::from_parts(vectors.dimension, vectors.metric, vectors.next_id, records)?;
    info!(path = ?dir, records = index.len(), dim = index.dimension(), "Loaded vector index");
    Ok(index)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), VectorError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    debug!(path = ?path, bytes = bytes.len(), "Wrote index artifact");
    Ok(())
}
