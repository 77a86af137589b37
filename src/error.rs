use std::path::PathBuf;

use thiserror::Error;

/// Library error type for notice-board operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Every document was skipped or none were found; the engine cannot start.
    #[error("no displayable documents found")]
    EmptyCollection,

    /// A single document or page could not be decoded.
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The viewport has no area, so no frame can be computed.
    #[error("viewport {width}x{height} has no drawable area")]
    DegenerateViewport { width: u32, height: u32 },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
