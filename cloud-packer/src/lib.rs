//! Image + depth field + category map → packed point records, plus the
//! framing used to ship them.
pub mod error;
pub mod packer;
pub mod projection;
pub mod record;
pub mod transport;
pub mod wire;

pub use error::{TransportError, WireError};
pub use packer::{PackedCloud, PointCloudPacker};
pub use projection::Projection;
pub use record::{decode_points, PointRecord, POINT_STRIDE};
pub use transport::{chunk_payload, needs_chunking, reassemble, Chunk, DEFAULT_CHUNK_SIZE};
pub use wire::{decode_wire, encode_wire, WireFrame, WireMetadata};
