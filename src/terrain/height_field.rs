// src/terrain/height_field.rs
use bevy::math::{UVec2, Vec2};
use bevy::prelude::*;

use crate::farming::core::TerrainSampler;

/// In-memory terrain: a regular grid of height samples plus a tilled-soil mask.
#[derive(Resource, Clone, Debug)]
pub struct HeightField {
    /// World-space XZ of sample (0, 0)
    pub origin: Vec2,
    /// Distance between neighboring samples in world units
    pub cell_size: f32,
    /// Sample count along X and Z
    pub res: UVec2,
    /// Row-major heights (world units)
    heights: Vec<f32>,
    /// One flag per grid cell, row-major, `(res - 1)` per side
    tilled: Vec<bool>,
}

impl HeightField {
    /// Sample `height(x, z)` at every grid point.
    pub fn from_fn(origin: Vec2, cell_size: f32, res: UVec2, height: impl Fn(f32, f32) -> f32) -> Self {
        let res = res.max(UVec2::splat(2));
        let mut heights = Vec::with_capacity((res.x * res.y) as usize);
        for iz in 0..res.y {
            for ix in 0..res.x {
                let x = origin.x + ix as f32 * cell_size;
                let z = origin.y + iz as f32 * cell_size;
                heights.push(height(x, z));
            }
        }
        let cells = ((res.x - 1) * (res.y - 1)) as usize;
        Self { origin, cell_size, res, heights, tilled: vec![false; cells] }
    }

    pub fn flat(origin: Vec2, cell_size: f32, res: UVec2, y: f32) -> Self {
        Self::from_fn(origin, cell_size, res, |_, _| y)
    }

    /// Size of the covered area in world units (X, Z)
    pub fn size(&self) -> Vec2 {
        Vec2::new((self.res.x - 1) as f32, (self.res.y - 1) as f32) * self.cell_size
    }

    /// Grid cell containing world XZ, or None outside the field.
    fn cell_at(&self, x: f32, z: f32) -> Option<(u32, u32)> {
        let lx = x - self.origin.x;
        let lz = z - self.origin.y;
        let size = self.size();
        if !(lx >= 0.0 && lz >= 0.0 && lx <= size.x && lz <= size.y) {
            return None;
        }
        let cx = ((lx / self.cell_size).floor() as u32).min(self.res.x - 2);
        let cz = ((lz / self.cell_size).floor() as u32).min(self.res.y - 2);
        Some((cx, cz))
    }

    /// Mark every grid cell whose center lies inside the XZ rectangle as tilled.
    pub fn till_rect(&mut self, min: Vec2, max: Vec2) {
        let w = self.res.x - 1;
        for cz in 0..self.res.y - 1 {
            for cx in 0..w {
                let c = self.origin + (Vec2::new(cx as f32, cz as f32) + 0.5) * self.cell_size;
                if c.x >= min.x && c.x <= max.x && c.y >= min.y && c.y <= max.y {
                    self.tilled[(cz * w + cx) as usize] = true;
                }
            }
        }
    }

    #[inline]
    pub(crate) fn get_clamped(&self, x: i32, z: i32) -> f32 {
        let xi = x.clamp(0, self.res.x as i32 - 1) as u32;
        let zi = z.clamp(0, self.res.y as i32 - 1) as u32;
        // Row-major
        self.heights[(zi * self.res.x + xi) as usize]
    }

    pub(crate) fn cell_tilled(&self, cx: u32, cz: u32) -> bool {
        cx < self.res.x - 1 && cz < self.res.y - 1 && self.tilled[(cz * (self.res.x - 1) + cx) as usize]
    }

    /// Bilinear-sample the terrain height at (world_x, world_z).
    /// Returns None outside the field.
    pub fn sample_height(&self, world_x: f32, world_z: f32) -> Option<f32> {
        self.cell_at(world_x, world_z)?;

        // Sample space
        let px_f = (world_x - self.origin.x) / self.cell_size;
        let pz_f = (world_z - self.origin.y) / self.cell_size;

        let x0 = px_f.floor() as i32;
        let z0 = pz_f.floor() as i32;
        let dx = px_f - x0 as f32;
        let dz = pz_f - z0 as f32;

        let s00 = self.get_clamped(x0, z0);
        let s10 = self.get_clamped(x0 + 1, z0);
        let s01 = self.get_clamped(x0, z0 + 1);
        let s11 = self.get_clamped(x0 + 1, z0 + 1);

        let a = s00 * (1.0 - dx) + s10 * dx;
        let b = s01 * (1.0 - dx) + s11 * dx;
        Some(a * (1.0 - dz) + b * dz)
    }
}

impl TerrainSampler for HeightField {
    fn ground_height(&self, x: f32, z: f32) -> Option<f32> {
        self.sample_height(x, z)
    }

    fn is_cultivated(&self, x: f32, z: f32) -> bool {
        self.cell_at(x, z).is_some_and(|(cx, cz)| self.cell_tilled(cx, cz))
    }
}
