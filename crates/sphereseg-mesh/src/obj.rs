//! Wavefront OBJ reading and writing.
//!
//! Reading goes through `tobj`. Only geometry is kept: polygonal faces are
//! triangulated, every model in the file is merged into one mesh, and
//! normals, texture coordinates and materials are dropped.

use std::io::{BufRead, Write};

use sphereseg_math::Point3;
use tracing::debug;

use crate::error::{MeshError, Result};
use crate::TriangleMesh;

/// Read a triangle mesh from OBJ text.
///
/// `mtllib` references are not followed.
pub fn read_obj<R: BufRead>(mut reader: R) -> Result<TriangleMesh> {
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj_buf(&mut reader, &options, |_| {
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|e| MeshError::Parse {
        details: e.to_string(),
    })?;

    let mut mesh = TriangleMesh::new();
    let mut vertex_offset = 0u32;
    for model in &models {
        let m = &model.mesh;
        debug!(
            model = %model.name,
            vertices = m.positions.len() / 3,
            triangles = m.indices.len() / 3,
            "OBJ model"
        );
        mesh.vertices.extend_from_slice(&m.positions);
        mesh.indices.extend(m.indices.iter().map(|&i| i + vertex_offset));
        vertex_offset = mesh.num_vertices() as u32;
    }

    debug!(
        models = models.len(),
        vertices = mesh.num_vertices(),
        triangles = mesh.num_triangles(),
        "read OBJ mesh"
    );
    mesh.validate()?;
    Ok(mesh)
}

/// Write polylines as OBJ `v` and `l` records.
///
/// `index_base` is the number of vertices already written to the same
/// stream. Lines with fewer than two points are skipped.
pub fn write_polylines<W, L>(writer: &mut W, lines: &[L], index_base: usize) -> Result<()>
where
    W: Write,
    L: AsRef<[Point3]>,
{
    let mut base = index_base + 1;
    for line in lines {
        let points = line.as_ref();
        if points.len() < 2 {
            continue;
        }
        for p in points {
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
        write!(writer, "l")?;
        for i in 0..points.len() {
            write!(writer, " {}", base + i)?;
        }
        writeln!(writer)?;
        base += points.len();
    }
    Ok(())
}

/// Write a triangle mesh as OBJ `v` and `f` records.
///
/// `index_base` is the number of vertices already written to the same
/// stream, so several meshes can share one file.
pub fn write_mesh<W: Write>(writer: &mut W, mesh: &TriangleMesh, index_base: usize) -> Result<()> {
    for p in mesh.positions() {
        writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
    }
    for [a, b, c] in mesh.triangles() {
        let first = index_base + 1;
        writeln!(
            writer,
            "f {} {} {}",
            first + a as usize,
            first + b as usize,
            first + c as usize
        )?;
    }
    Ok(())
}
