//! Error types for tress.
//!
//! Most failures inside a batch operation (a missing rig root, loops of
//! differing length, a loop too short to carry a bone) are not errors: they are
//! logged and the offending island, card or loop is skipped. The variants here
//! cover invalid input and host failures that abort a whole call.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`TressError`].
pub type Result<T> = std::result::Result<T, TressError>;

/// Errors that can occur during hair-card and rig operations.
#[derive(Error, Debug)]
pub enum TressError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three corners or repeats a vertex.
    #[error("face {face} is degenerate")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A UV layer does not provide one coordinate per face corner.
    #[error("uv layer has {found} coordinates but the mesh has {expected} corners")]
    CornerCountMismatch {
        /// Number of corners in the mesh.
        expected: usize,
        /// Number of coordinates supplied.
        found: usize,
    },

    /// The requested UV channel does not exist.
    #[error("uv channel {channel} does not exist (mesh has {available})")]
    InvalidUvChannel {
        /// The requested channel.
        channel: usize,
        /// Number of channels on the mesh.
        available: usize,
    },

    /// An expected bone, rig or group is absent.
    #[error("{kind} not found: {name}")]
    NotFound {
        /// What was looked up (e.g. "bone", "rig root").
        kind: &'static str,
        /// The name that was looked up.
        name: String,
    },

    /// A bone with this name already exists.
    #[error("bone already exists: {0}")]
    BoneExists(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl TressError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        TressError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a not-found error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        TressError::NotFound {
            kind,
            name: name.into(),
        }
    }
}
