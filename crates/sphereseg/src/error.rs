//! Error types for wedge construction and clipping.

use sphereseg_mesh::MeshError;
use thiserror::Error;

/// Errors that can occur when building a wedge or clipping against it.
///
/// Geometric misses are not errors: a mesh that never touches the wedge
/// yields an empty line list.
#[derive(Error, Debug)]
pub enum SegmentError {
    /// Wedge parameters are out of range.
    #[error("invalid sphere segment: {0}")]
    InvalidSegment(String),

    /// Clipping settings are out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The model transform has non-finite entries.
    #[error("transform contains non-finite values")]
    InvalidTransform,

    /// The input mesh is malformed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Result type for sphere segment operations.
pub type Result<T> = std::result::Result<T, SegmentError>;
