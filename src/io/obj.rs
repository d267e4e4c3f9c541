//! Wavefront OBJ format support.
//!
//! Reads `v`, `vt`, `f` and `usemtl` statements. Faces may use any of the
//! `v`, `v/vt`, `v//vn` and `v/vt/vn` corner forms; indices may be negative
//! (relative to the end of the list so far). Materials are numbered in order of
//! first use. Normals, groups and smoothing statements are ignored.
//!
//! Polylines, such as the length loops of hair cards, are written as `l`
//! statements.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::{Point2, Point3};

use crate::error::{Result, TressError};
use crate::mesh::{build_from_polygons, CardMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use tress::io::obj;
/// use tress::mesh::CardMesh;
///
/// let mesh: CardMesh = obj::load("hair.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<CardMesh<I>> {
    load_with_materials(path).map(|(mesh, _)| mesh)
}

/// Load a mesh and the names of its materials, indexed by material slot.
pub fn load_with_materials<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<(CardMesh<I>, Vec<String>)> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file), path)
}

/// Parse OBJ text from a reader. `source` names the input in error messages.
pub fn read<R: BufRead, I: MeshIndex>(reader: R, source: &Path) -> Result<(CardMesh<I>, Vec<String>)> {
    let load_error = |line: usize, message: String| TressError::LoadError {
        path: source.to_path_buf(),
        message: format!("line {}: {}", line, message),
    };

    let mut positions: Vec<Point3<f64>> = Vec::new();
    let mut tex_coords: Vec<Point2<f64>> = Vec::new();
    let mut polygons: Vec<Vec<usize>> = Vec::new();
    let mut corner_uvs: Vec<Option<usize>> = Vec::new();
    let mut materials: Vec<usize> = Vec::new();
    let mut material_names: Vec<String> = Vec::new();
    let mut material_slots: HashMap<String, usize> = HashMap::new();
    let mut current_material = 0;

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = n + 1;
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let c = parse_floats::<3>(tokens).map_err(|e| load_error(line_no, e))?;
                positions.push(Point3::new(c[0], c[1], c[2]));
            }
            "vt" => {
                let c = parse_floats::<2>(tokens).map_err(|e| load_error(line_no, e))?;
                tex_coords.push(Point2::new(c[0], c[1]));
            }
            "usemtl" => {
                let name = tokens.collect::<Vec<_>>().join(" ");
                current_material = *material_slots.entry(name.clone()).or_insert_with(|| {
                    material_names.push(name);
                    material_names.len() - 1
                });
            }
            "f" => {
                let mut polygon = Vec::new();
                for corner in tokens {
                    let mut parts = corner.split('/');
                    let v = parts
                        .next()
                        .ok_or_else(|| load_error(line_no, format!("bad corner '{}'", corner)))?;
                    let v = resolve_index(v, positions.len()).map_err(|e| load_error(line_no, e))?;
                    let vt = match parts.next() {
                        Some(t) if !t.is_empty() => {
                            Some(resolve_index(t, tex_coords.len()).map_err(|e| load_error(line_no, e))?)
                        }
                        _ => None,
                    };
                    polygon.push(v);
                    corner_uvs.push(vt);
                }
                polygons.push(polygon);
                materials.push(current_material);
            }
            _ => {}
        }
    }

    let uv_layers = if tex_coords.is_empty() {
        Vec::new()
    } else {
        let layer = corner_uvs
            .iter()
            .map(|vt| vt.map_or_else(Point2::origin, |i| tex_coords[i]))
            .collect();
        vec![layer]
    };

    let mesh = build_from_polygons(&positions, &polygons, uv_layers, Some(materials.as_slice()))?;
    Ok((mesh, material_names))
}

fn parse_floats<'a, const N: usize>(mut tokens: impl Iterator<Item = &'a str>) -> std::result::Result<[f64; N], String> {
    let mut values = [0.0; N];
    for value in values.iter_mut() {
        let token = tokens.next().ok_or_else(|| format!("expected {} coordinates", N))?;
        *value = token
            .parse()
            .map_err(|_| format!("invalid coordinate '{}'", token))?;
    }
    Ok(values)
}

/// Convert a 1-based (or negative, relative) OBJ index to a 0-based one.
fn resolve_index(token: &str, count: usize) -> std::result::Result<usize, String> {
    let index: i64 = token
        .parse()
        .map_err(|_| format!("invalid index '{}'", token))?;
    let resolved = if index > 0 {
        index - 1
    } else {
        count as i64 + index
    };
    if index == 0 || resolved < 0 || resolved >= count as i64 {
        return Err(format!("index {} out of range ({} defined)", index, count));
    }
    Ok(resolved as usize)
}

/// Save a mesh to an OBJ file.
///
/// Writes one `vt` per face corner from UV channel 0 and a `usemtl` statement
/// per material run, naming slot `i` `material_i`.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &CardMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as OBJ text.
pub fn write<W: Write, I: MeshIndex>(mesh: &CardMesh<I>, writer: &mut W) -> Result<()> {
    writeln!(writer, "# Generated by tress")?;
    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }

    let uvs = mesh.uv_layer(0);
    if let Some(uvs) = uvs {
        for uv in uvs {
            writeln!(writer, "vt {} {}", uv.x, uv.y)?;
        }
    }

    let mut material = None;
    for f in mesh.face_ids() {
        if material != Some(mesh.material(f)) {
            material = Some(mesh.material(f));
            writeln!(writer, "usemtl material_{}", mesh.material(f))?;
        }
        write!(writer, "f")?;
        for c in mesh.face_corners(f) {
            let v = mesh.corner_vertex(c).index() + 1;
            if uvs.is_some() {
                write!(writer, " {}/{}", v, c.index() + 1)?;
            } else {
                write!(writer, " {}", v)?;
            }
        }
        writeln!(writer)?;
    }
    Ok(())
}

/// Save polylines to an OBJ file as `l` statements.
pub fn save_polylines<P: AsRef<Path>>(loops: &[Vec<Point3<f64>>], path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write_polylines(loops, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write polylines as OBJ `v` and `l` statements, one object per polyline.
pub fn write_polylines<W: Write>(loops: &[Vec<Point3<f64>>], writer: &mut W) -> Result<()> {
    writeln!(writer, "# Generated by tress")?;
    let mut base = 1;
    for (i, points) in loops.iter().enumerate() {
        if points.len() < 2 {
            continue;
        }
        writeln!(writer, "o loop_{}", i)?;
        for p in points {
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
        write!(writer, "l")?;
        for k in 0..points.len() {
            write!(writer, " {}", base + k)?;
        }
        writeln!(writer)?;
        base += points.len();
    }
    Ok(())
}
