// src/farming/placement/grid.rs
//! Rectangular lattice around the cursor anchor.

use bevy::prelude::*;

/// Raw candidate positions plus the axes they were laid out on.
#[derive(Clone, Debug, PartialEq)]
pub struct Lattice {
    /// Raster order: outer loop along `forward` (width), inner along `left` (height).
    pub positions: Vec<Vec3>,
    pub width: u32,
    pub height: u32,
    /// One lattice step along the width axis.
    pub forward: Vec3,
    /// One lattice step along the height axis.
    pub left: Vec3,
    pub center: Vec3,
    pub spacing: f32,
}

impl Lattice {
    #[inline]
    pub fn index(&self, x: u32, z: u32) -> usize {
        (x * self.height + z) as usize
    }
}

/// Lattice size actually generated for a request: a dimension of 1 becomes 3 so
/// the snap resolver sees the cells around a lone plant.
#[inline]
pub fn context_dims(width: u32, height: u32) -> (u32, u32) {
    let grow = |d: u32| if d == 1 { 3 } else { d };
    (grow(width), grow(height))
}

/// Lay out `width * height` positions centered on `center`, `spacing` apart.
/// Every position keeps `center.y`; heights are resolved after snapping.
pub fn build_lattice(center: Vec3, yaw: f32, spacing: f32, width: u32, height: u32) -> Lattice {
    let rotation = Quat::from_rotation_y(yaw);
    let forward = rotation * Vec3::NEG_Z * spacing;
    let left = rotation * Vec3::NEG_X * spacing;

    let mut origin = center
        - forward * (width as f32 - 1.0) / 2.0
        - left * (height as f32 - 1.0) / 2.0;

    let mut positions = Vec::with_capacity((width * height) as usize);
    for _ in 0..width {
        let mut p = origin;
        for _ in 0..height {
            positions.push(p);
            p += left;
        }
        origin += forward;
    }

    Lattice { positions, width, height, forward, left, center, spacing }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn context_dims_grow_single_rows() {
        assert_eq!(context_dims(1, 1), (3, 3));
        assert_eq!(context_dims(1, 2), (3, 2));
        assert_eq!(context_dims(3, 1), (3, 3));
        assert_eq!(context_dims(4, 5), (4, 5));
    }

    #[test]
    fn lattice_is_centered_and_spaced() {
        let lat = build_lattice(Vec3::new(10.0, 2.0, -4.0), 0.0, 1.0, 3, 3);
        assert_eq!(lat.positions.len(), 9);

        let sum: Vec3 = lat.positions.iter().copied().sum();
        let mean = sum / 9.0;
        assert!(mean.distance(lat.center) < EPS);

        // inner loop steps along left (-X at yaw 0)
        assert!((lat.positions[1] - lat.positions[0] - Vec3::NEG_X).length() < EPS);
        // outer loop steps along forward (-Z at yaw 0)
        let next_row = lat.index(1, 0);
        assert!((lat.positions[next_row] - lat.positions[0] - Vec3::NEG_Z).length() < EPS);
        assert!(lat.positions.iter().all(|p| (p.y - 2.0).abs() < EPS));
    }

    #[test]
    fn raster_order_follows_yaw() {
        let yaw = std::f32::consts::FRAC_PI_2;
        let lat = build_lattice(Vec3::ZERO, yaw, 2.0, 2, 2);
        let step = lat.positions[1] - lat.positions[0];
        assert!((step - Quat::from_rotation_y(yaw) * Vec3::NEG_X * 2.0).length() < EPS);
        assert!((step.length() - 2.0).abs() < EPS);
    }

    #[test]
    fn even_dims_have_no_cell_on_anchor() {
        let lat = build_lattice(Vec3::ZERO, 0.0, 1.0, 2, 2);
        assert!(lat.positions.iter().all(|p| p.length() > 0.5));
    }
}
