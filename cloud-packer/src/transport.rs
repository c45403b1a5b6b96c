//! Chunked transport for wire payloads that exceed a message size limit.
//!
//! The whole wire payload is gzipped and base64 encoded, then the text is cut
//! into fixed-size chunks. The first chunk carries the metadata and the chunk
//! count; receivers sort by `chunk_index`, concatenate, decode and gunzip.
use std::io::{Read as _, Write as _};

use base64::{engine::general_purpose, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::TransportError;

pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<usize>,
    pub chunk_index: usize,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed: Option<bool>,
}

/// Whether a payload of `len` bytes must go through [`chunk_payload`].
pub fn needs_chunking(len: usize, limit: usize) -> bool {
    len > limit
}

/// Compress, encode and split `wire` into chunks of at most `chunk_size`
/// base64 characters.
pub fn chunk_payload(
    wire: &[u8],
    metadata: Value,
    chunk_size: usize,
) -> Result<Vec<Chunk>, TransportError> {
    if chunk_size == 0 {
        return Err(TransportError::InvalidChunkSize);
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(wire)?;
    let compressed = encoder.finish()?;
    let encoded = general_purpose::STANDARD.encode(&compressed);

    // base64 text is ASCII, so byte offsets are char boundaries
    let total = encoded.len().div_ceil(chunk_size).max(1);
    let mut metadata = Some(metadata);
    let chunks: Vec<Chunk> = (0..total)
        .map(|index| {
            let start = index * chunk_size;
            let end = (start + chunk_size).min(encoded.len());
            let data = encoded[start..end].to_string();
            if index == 0 {
                Chunk {
                    metadata: metadata.take(),
                    total_chunks: Some(total),
                    chunk_index: 0,
                    data,
                    compressed: Some(true),
                }
            } else {
                Chunk {
                    metadata: None,
                    total_chunks: None,
                    chunk_index: index,
                    data,
                    compressed: None,
                }
            }
        })
        .collect();

    log::info!(
        "chunked {} wire bytes into {} chunks ({} gzip bytes, {} base64 chars)",
        wire.len(),
        chunks.len(),
        compressed.len(),
        encoded.len()
    );
    Ok(chunks)
}

/// Restore the wire payload from chunks received in any order.
pub fn reassemble(mut chunks: Vec<Chunk>) -> Result<Vec<u8>, TransportError> {
    if chunks.is_empty() {
        return Err(TransportError::Empty);
    }
    chunks.sort_by_key(|chunk| chunk.chunk_index);

    let first = &chunks[0];
    let total = match (first.chunk_index, first.total_chunks) {
        (0, Some(total)) => total,
        _ => return Err(TransportError::MissingFirst),
    };
    let compressed = first.compressed.unwrap_or(true);
    if chunks.len() != total {
        return Err(TransportError::ChunkCount {
            expected: total,
            actual: chunks.len(),
        });
    }
    if let Some((index, _)) = chunks
        .iter()
        .enumerate()
        .find(|(index, chunk)| chunk.chunk_index != *index)
    {
        return Err(TransportError::BadIndex(index));
    }

    let encoded: String = chunks.iter().map(|chunk| chunk.data.as_str()).collect();
    let decoded = general_purpose::STANDARD.decode(encoded)?;
    if !compressed {
        return Ok(decoded);
    }

    let mut wire = Vec::new();
    GzDecoder::new(decoded.as_slice()).read_to_end(&mut wire)?;
    Ok(wire)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use serde_json::json;

    use super::*;

    /// Noise, so gzip barely shrinks it and small chunk sizes give many chunks.
    fn payload(len: usize) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(len as u64);
        (0..len).map(|_| rng.gen()).collect()
    }

    #[test]
    fn first_chunk_carries_framing() {
        let chunks = chunk_payload(&payload(4096), json!({"width": 2}), 256).unwrap();
        assert!(chunks.len() > 1);

        let first = serde_json::to_value(&chunks[0]).unwrap();
        assert_eq!(first["chunk_index"], 0);
        assert_eq!(first["total_chunks"], chunks.len());
        assert_eq!(first["compressed"], true);
        assert_eq!(first["metadata"]["width"], 2);

        let second = serde_json::to_value(&chunks[1]).unwrap();
        let keys: Vec<_> = second.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 2);
        assert!(second.get("chunk_index").is_some());
        assert!(second.get("data").is_some());
        assert!(chunks.iter().all(|c| c.data.len() <= 256));
    }

    #[test]
    fn reassembles_out_of_order() {
        let wire = payload(10_000);
        let mut chunks = chunk_payload(&wire, Value::Null, 100).unwrap();
        chunks.reverse();
        chunks.swap(1, 3);
        assert_eq!(reassemble(chunks).unwrap(), wire);
    }

    #[test]
    fn small_payload_is_one_chunk() {
        let chunks = chunk_payload(b"tiny", Value::Null, DEFAULT_CHUNK_SIZE).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].total_chunks, Some(1));
        assert_eq!(reassemble(chunks).unwrap(), b"tiny");
    }

    #[test]
    fn missing_and_duplicate_chunks_are_rejected() {
        let chunks = chunk_payload(&payload(4096), Value::Null, 200).unwrap();
        assert!(chunks.len() >= 3);

        let mut missing = chunks.clone();
        missing.remove(2);
        assert!(matches!(
            reassemble(missing),
            Err(TransportError::ChunkCount { .. })
        ));

        let mut duplicated = chunks.clone();
        duplicated[2] = duplicated[1].clone();
        assert!(matches!(
            reassemble(duplicated),
            Err(TransportError::BadIndex(2))
        ));

        let headless = chunks[1..].to_vec();
        assert!(matches!(
            reassemble(headless),
            Err(TransportError::MissingFirst)
        ));
        assert!(matches!(reassemble(Vec::new()), Err(TransportError::Empty)));
    }

    #[test]
    fn chunking_threshold() {
        assert!(!needs_chunking(10, 10));
        assert!(needs_chunking(11, 10));
        assert!(chunk_payload(b"x", Value::Null, 0).is_err());
    }
}
