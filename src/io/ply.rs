//! PLY (Stanford polygon) format support.
//!
//! PLY stores texture coordinates per vertex. On load every corner takes the
//! UV of its vertex, read from the first of the `s t`, `u v` or
//! `texture_u texture_v` property pairs present. On save each vertex is
//! written with the UV of its last corner, so UV seams are not preserved.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{Result, TressError};
use crate::mesh::{build_from_polygons, CardMesh, MeshIndex};

const UV_PROPERTIES: [(&str, &str); 3] = [("s", "t"), ("u", "v"), ("texture_u", "texture_v")];

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use tress::io::ply;
/// use tress::mesh::CardMesh;
///
/// let mesh: CardMesh = ply::load("hair.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<CardMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(&mut BufReader::new(file), path)
}

/// Parse PLY data from a reader. `source` names the input in error messages.
pub fn read<R: Read, I: MeshIndex>(reader: &mut R, source: &Path) -> Result<CardMesh<I>> {
    let load_error = |message: &str| TressError::LoadError {
        path: source.to_path_buf(),
        message: message.to_string(),
    };

    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(reader).map_err(|e| TressError::LoadError {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| load_error("PLY file has no vertex element"))?;

    let uv_names = vertex_element.first().and_then(|first| {
        UV_PROPERTIES
            .iter()
            .find(|(u, v)| first.contains_key(*u) && first.contains_key(*v))
    });

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    let mut vertex_uvs: Vec<Point2<f64>> = Vec::new();
    for vertex in vertex_element {
        let coord = |name: &str| {
            get_float_property(vertex, name)
                .ok_or_else(|| load_error(&format!("vertex missing {} coordinate", name)))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
        if let Some(&(u, v)) = uv_names {
            vertex_uvs.push(Point2::new(coord(u)?, coord(v)?));
        }
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| load_error("PLY file has no face element"))?;

    let mut polygons: Vec<Vec<usize>> = Vec::with_capacity(face_element.len());
    for face in face_element {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| load_error("face missing vertex_indices property"))?;
        polygons.push(indices);
    }

    if polygons.is_empty() {
        return Err(load_error("PLY file contains no faces"));
    }

    let uv_layers = if vertex_uvs.is_empty() {
        Vec::new()
    } else {
        let mut corner_uvs = Vec::new();
        for poly in &polygons {
            for &v in poly {
                let uv = vertex_uvs
                    .get(v)
                    .copied()
                    .ok_or_else(|| load_error(&format!("face references invalid vertex {}", v)))?;
                corner_uvs.push(uv);
            }
        }
        vec![corner_uvs]
    };

    build_from_polygons(&vertices, &polygons, uv_layers, None)
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &CardMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as ASCII PLY, with `s t` texture coordinates from UV channel 0.
pub fn write<W: Write, I: MeshIndex>(mesh: &CardMesh<I>, writer: &mut W) -> Result<()> {
    let vertex_uvs = mesh.uv_layer(0).map(|_| {
        let mut uvs = vec![Point2::origin(); mesh.num_vertices()];
        for f in mesh.face_ids() {
            for c in mesh.face_corners(f) {
                uvs[mesh.corner_vertex(c).index()] = mesh.corner_uv(0, c);
            }
        }
        uvs
    });

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by tress")?;
    writeln!(writer, "element vertex {}", mesh.num_vertices())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    if vertex_uvs.is_some() {
        writeln!(writer, "property float s")?;
        writeln!(writer, "property float t")?;
    }
    writeln!(writer, "element face {}", mesh.num_faces())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (i, p) in mesh.positions().iter().enumerate() {
        match &vertex_uvs {
            Some(uvs) => writeln!(writer, "{} {} {} {} {}", p.x, p.y, p.z, uvs[i].x, uvs[i].y)?,
            None => writeln!(writer, "{} {} {}", p.x, p.y, p.z)?,
        }
    }

    for f in mesh.face_ids() {
        let verts: Vec<String> = mesh.face_vertices(f).map(|v| v.index().to_string()).collect();
        writeln!(writer, "{} {}", verts.len(), verts.join(" "))?;
    }

    Ok(())
}
