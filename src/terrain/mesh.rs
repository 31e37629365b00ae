// src/terrain/mesh.rs
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};

use super::height_field::HeightField;

const GRASS: [f32; 4] = [0.32, 0.52, 0.22, 1.0];
const SOIL: [f32; 4] = [0.42, 0.29, 0.17, 1.0];

/// One vertex per height sample, two triangles per cell. Tilled cells are tinted
/// through vertex colors.
pub fn build_field_mesh(field: &HeightField) -> Mesh {
    let nx = field.res.x as usize;
    let nz = field.res.y as usize;
    let step = field.cell_size.max(f32::EPSILON);

    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(nx * nz);
    let mut normals: Vec<[f32; 3]> = Vec::with_capacity(nx * nz);
    let mut uvs: Vec<[f32; 2]> = Vec::with_capacity(nx * nz);
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(nx * nz);

    for j in 0..nz {
        for i in 0..nx {
            let (ix, iz) = (i as i32, j as i32);
            let h = field.get_clamped(ix, iz);
            let wx = field.origin.x + i as f32 * field.cell_size;
            let wz = field.origin.y + j as f32 * field.cell_size;

            // Central differences; clamped at the border
            let hl = field.get_clamped(ix - 1, iz);
            let hr = field.get_clamped(ix + 1, iz);
            let hd = field.get_clamped(ix, iz - 1);
            let hu = field.get_clamped(ix, iz + 1);
            let dpx = (hr - hl) / (2.0 * step);
            let dpz = (hu - hd) / (2.0 * step);
            let n = Vec3::new(-dpx, 1.0, -dpz).normalize_or_zero();

            let (ci, cj) = (i as u32, j as u32);
            let tilled = [(0, 0), (1, 0), (0, 1), (1, 1)].iter().any(|&(di, dj)| {
                ci >= di && cj >= dj && field.cell_tilled(ci - di, cj - dj)
            });

            positions.push([wx, h, wz]);
            normals.push([n.x, n.y, n.z]);
            uvs.push([i as f32 / (nx as f32 - 1.0), j as f32 / (nz as f32 - 1.0)]);
            colors.push(if tilled { SOIL } else { GRASS });
        }
    }

    let mut indices: Vec<u32> = Vec::with_capacity((nx - 1) * (nz - 1) * 6);
    for j in 0..(nz - 1) {
        for i in 0..(nx - 1) {
            let i0 = (j * nx + i) as u32;
            let i1 = (j * nx + i + 1) as u32;
            let i2 = ((j + 1) * nx + i) as u32;
            let i3 = ((j + 1) * nx + i + 1) as u32;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, Default::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}
