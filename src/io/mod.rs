//! Mesh file I/O.
//!
//! Hair card meshes need their UV layout, so only formats carrying texture
//! coordinates are supported.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Per-corner UVs, materials, `l` polylines |
//! | PLY | `.ply` | ✓ | ✓ | Per-vertex UVs only |
//!
//! # Usage
//!
//! ```no_run
//! use tress::io::{load, save};
//! use tress::mesh::CardMesh;
//!
//! let mesh: CardMesh = load("hair.obj").unwrap();
//! save(&mesh, "hair.ply").unwrap();
//! ```

pub mod obj;
pub mod ply;

use std::path::Path;

use crate::error::{Result, TressError};
use crate::mesh::{CardMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// PLY (Stanford polygon) format.
    Ply,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "ply" => Some(Format::Ply),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    fn detect(path: &Path) -> Result<Format> {
        Format::from_path(path).ok_or_else(|| TressError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }
}

/// Load a mesh from a file with automatic format detection.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<CardMesh<I>> {
    let path = path.as_ref();
    match Format::detect(path)? {
        Format::Obj => obj::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Save a mesh to a file with automatic format detection.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &CardMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match Format::detect(path)? {
        Format::Obj => obj::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
    }
}
