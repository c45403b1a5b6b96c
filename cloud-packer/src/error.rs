use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("wire payload truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("metadata header of {0} bytes does not fit a u32 length prefix")]
    HeaderTooLarge(usize),
    #[error("invalid metadata header: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("point buffer holds {actual} bytes, expected {expected} for the declared point count")]
    PayloadLength { expected: usize, actual: usize },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chunk size must be positive")]
    InvalidChunkSize,
    #[error("no chunks to reassemble")]
    Empty,
    #[error("first chunk is missing or does not declare total_chunks")]
    MissingFirst,
    #[error("expected {expected} chunks, got {actual}")]
    ChunkCount { expected: usize, actual: usize },
    #[error("chunk {0} is missing or duplicated")]
    BadIndex(usize),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
