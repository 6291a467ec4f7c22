//! Error types for mesh loading and validation.

use thiserror::Error;

/// Errors that can occur while reading or validating a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Underlying I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A mesh file could not be parsed.
    #[error("failed to parse mesh: {details}")]
    Parse {
        /// Loader message.
        details: String,
    },

    /// A triangle references a vertex that does not exist.
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        /// The offending index.
        index: u32,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Buffers have inconsistent lengths.
    #[error("malformed mesh: {0}")]
    Malformed(String),
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;
