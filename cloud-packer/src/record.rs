use byteorder::{ByteOrder as _, LittleEndian};
use bytemuck::{Pod, Zeroable};

use crate::error::WireError;

/// Bytes per packed point: 3×f32 position, 3×u8 color, 1×u8 category, 4×u8 padding.
pub const POINT_STRIDE: usize = (4 * 3) + (3 + 1) + 4;

/// In-memory mirror of one packed point, laid out for direct GPU upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PointRecord {
    pub position: [f32; 3],
    pub color: [u8; 3],
    pub category: u8,
    pub padding: [u8; 4],
}

const _: () = assert!(std::mem::size_of::<PointRecord>() == POINT_STRIDE);

impl PointRecord {
    pub fn new(position: [f32; 3], color: [u8; 3], category: u8) -> Self {
        Self {
            position,
            color,
            category,
            ..Self::zeroed()
        }
    }

    /// Write the little-endian record into `buffer[..POINT_STRIDE]`.
    #[inline]
    pub fn write_to(&self, buffer: &mut [u8]) {
        LittleEndian::write_f32_into(&self.position, &mut buffer[0..12]);
        buffer[12..15].copy_from_slice(&self.color);
        buffer[15] = self.category;
        buffer[16..20].copy_from_slice(&self.padding);
    }

    #[inline]
    pub fn read_from(buffer: &[u8]) -> Self {
        let mut position = [0f32; 3];
        LittleEndian::read_f32_into(&buffer[0..12], &mut position);
        Self {
            position,
            color: [buffer[12], buffer[13], buffer[14]],
            category: buffer[15],
            padding: [buffer[16], buffer[17], buffer[18], buffer[19]],
        }
    }
}

/// Parse a packed point buffer back into records.
pub fn decode_points(bytes: &[u8]) -> Result<Vec<PointRecord>, WireError> {
    if bytes.len() % POINT_STRIDE != 0 {
        return Err(WireError::PayloadLength {
            expected: bytes.len() / POINT_STRIDE * POINT_STRIDE,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(POINT_STRIDE)
        .map(PointRecord::read_from)
        .collect())
}

/// Records as raw bytes, e.g. for a vertex buffer.
pub fn as_bytes(records: &[PointRecord]) -> &[u8] {
    bytemuck::cast_slice(records)
}
