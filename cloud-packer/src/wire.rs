//! `[u32 LE header length][JSON metadata][point records]`
use byteorder::{ByteOrder as _, LittleEndian};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{error::WireError, packer::PackedCloud, projection::Projection, record::POINT_STRIDE};

const LENGTH_PREFIX: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMetadata {
    pub width: usize,
    pub height: usize,
    pub point_count: usize,
    pub projection: Projection,
    /// Free-form pipeline metadata (prompt, timings, detections, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WireMetadata {
    pub fn for_cloud(cloud: &PackedCloud) -> Self {
        Self {
            width: cloud.width,
            height: cloud.height,
            point_count: cloud.point_count,
            projection: cloud.projection,
            extra: Map::new(),
        }
    }

    /// Attach a free-form field; reserved keys are left untouched.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if matches!(
            key.as_str(),
            "width" | "height" | "point_count" | "projection"
        ) {
            log::warn!("ignoring reserved wire metadata key `{key}`");
            return;
        }
        self.extra.insert(key, value.into());
    }
}

/// A decoded wire payload borrowing its point records from the input.
#[derive(Debug, Clone, PartialEq)]
pub struct WireFrame<'a> {
    pub metadata: WireMetadata,
    pub points: &'a [u8],
}

pub fn encode_wire(metadata: &WireMetadata, points: &[u8]) -> Result<Vec<u8>, WireError> {
    let header = serde_json::to_vec(metadata)?;
    let header_len =
        u32::try_from(header.len()).map_err(|_| WireError::HeaderTooLarge(header.len()))?;

    let mut out = vec![0u8; LENGTH_PREFIX];
    LittleEndian::write_u32(&mut out, header_len);
    out.reserve(header.len() + points.len());
    out.extend_from_slice(&header);
    out.extend_from_slice(points);
    Ok(out)
}

/// Split a wire payload and check that the point buffer matches the header.
pub fn decode_wire(bytes: &[u8]) -> Result<WireFrame<'_>, WireError> {
    if bytes.len() < LENGTH_PREFIX {
        return Err(WireError::Truncated {
            needed: LENGTH_PREFIX,
            actual: bytes.len(),
        });
    }
    let header_len = LittleEndian::read_u32(&bytes[..LENGTH_PREFIX]) as usize;
    let body = &bytes[LENGTH_PREFIX..];
    if body.len() < header_len {
        return Err(WireError::Truncated {
            needed: LENGTH_PREFIX + header_len,
            actual: bytes.len(),
        });
    }

    let (header, points) = body.split_at(header_len);
    let metadata: WireMetadata = serde_json::from_slice(header)?;
    let expected = metadata.point_count * POINT_STRIDE;
    if points.len() != expected {
        return Err(WireError::PayloadLength {
            expected,
            actual: points.len(),
        });
    }
    Ok(WireFrame { metadata, points })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn metadata(point_count: usize) -> WireMetadata {
        WireMetadata {
            width: 2,
            height: 1,
            point_count,
            projection: Projection::Equirectangular,
            extra: Map::new(),
        }
    }

    #[test]
    fn header_is_length_prefixed_json() {
        let mut meta = metadata(2);
        meta.insert("prompt", "a misty lake");
        let points = vec![7u8; 2 * POINT_STRIDE];
        let bytes = encode_wire(&meta, &points).unwrap();

        let header_len = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
        let header: Value = serde_json::from_slice(&bytes[4..4 + header_len]).unwrap();
        assert_eq!(header["projection"], "equirectangular");
        assert_eq!(header["prompt"], "a misty lake");
        assert_eq!(header["point_count"], 2);
        assert_eq!(&bytes[4 + header_len..], points.as_slice());

        let frame = decode_wire(&bytes).unwrap();
        assert_eq!(frame.metadata, meta);
        assert_eq!(frame.points, points.as_slice());
    }

    #[test]
    fn reserved_keys_are_not_overridden() {
        let mut meta = metadata(0);
        meta.insert("point_count", json!(99));
        meta.insert("timing", json!({"total_ms": 12}));
        assert_eq!(meta.point_count, 0);
        assert_eq!(meta.extra.len(), 1);
    }

    #[test]
    fn truncated_payloads_are_rejected() {
        let bytes = encode_wire(&metadata(3), &vec![0u8; 3 * POINT_STRIDE]).unwrap();
        assert!(matches!(
            decode_wire(&bytes[..2]),
            Err(WireError::Truncated { .. })
        ));
        assert!(matches!(
            decode_wire(&bytes[..10]),
            Err(WireError::Truncated { .. })
        ));
        assert!(matches!(
            decode_wire(&bytes[..bytes.len() - 1]),
            Err(WireError::PayloadLength { .. })
        ));
    }

    #[test]
    fn garbage_header_is_rejected() {
        let mut bytes = vec![3, 0, 0, 0];
        bytes.extend_from_slice(b"{x}");
        assert!(matches!(decode_wire(&bytes), Err(WireError::Metadata(_))));
    }
}
