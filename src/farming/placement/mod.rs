// src/farming/placement/mod.rs
//! Grid planting pipeline: lattice -> snap -> classify -> primary.
//! Every stage is a pure function of its inputs plus the world adapters in `PlantingContext`.

use bevy::prelude::*;

use crate::farming::core::{
    GridTuning, OccupancyProbe, PlacementGrid, PlacementRequest, PlantingError, SpatialQuery,
    TerrainSampler,
};

pub mod grid;
pub mod primary;
pub mod snap;
pub mod validity;

pub use grid::{build_lattice, context_dims, Lattice};
pub use primary::select_primary;
pub use snap::{canonical_quarter_turn, dock_offset, snap_lattice};
pub use validity::classify;

/// World reads the pipeline needs for one computation.
pub struct PlantingContext<'a> {
    pub query: &'a dyn SpatialQuery,
    pub terrain: &'a dyn TerrainSampler,
    pub occupancy: &'a dyn OccupancyProbe,
    pub tuning: GridTuning,
}

/// Raster indices of the context lattice that are offered for a `width` x `height` request.
/// A 1x1 request keeps the middle cell; a request with one dimension of 1 keeps
/// the central pair of the middle row; anything else keeps every cell.
pub fn collapse_indices(width: u32, height: u32, lattice: &Lattice) -> Vec<usize> {
    match (width == 1, height == 1) {
        (true, true) => vec![lattice.index(1, 1)],
        (true, false) => {
            let z0 = (height - 1) / 2;
            vec![lattice.index(1, z0), lattice.index(1, z0 + 1)]
        }
        (false, true) => {
            let x0 = (width - 1) / 2;
            vec![lattice.index(x0, 1), lattice.index(x0 + 1, 1)]
        }
        (false, false) => (0..lattice.positions.len()).collect(),
    }
}

/// Lay out, snap, classify and order the cells for one request.
pub fn plan_grid(req: &PlacementRequest, ctx: &PlantingContext) -> Result<PlacementGrid, PlantingError> {
    let spacing = req.spacing(&ctx.tuning)?;
    let (width, height) = req.effective_dims();
    let (cw, ch) = context_dims(width, height);

    let mut lattice = build_lattice(req.anchor, req.yaw, spacing, cw, ch);
    let snap = if req.snapping {
        snap_lattice(&mut lattice, ctx.query, &ctx.tuning)
    } else {
        None
    };

    let mut cells: Vec<_> = collapse_indices(width, height, &lattice)
        .into_iter()
        .map(|i| {
            classify(
                lattice.positions[i],
                req.footprint_radius,
                req.cultivated_only,
                ctx.terrain,
                ctx.occupancy,
            )
        })
        .collect();
    select_primary(&mut cells, req.anchor);

    let yaw = req.yaw + snap.map_or(0.0, |c| c.angle_deg.to_radians());
    let grid = PlacementGrid { cells, yaw, snap };

    debug!(
        "plant grid {}x{} at ({:.2}, {:.2}): {} cells, {} valid, snapped={}",
        width,
        height,
        req.anchor.x,
        req.anchor.z,
        grid.len(),
        grid.valid_count(),
        grid.snap.is_some()
    );

    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farming::core::{CategoryMask, CellStatus, NearbyObject};

    struct Empty;
    impl SpatialQuery for Empty {
        fn query_nearby(&self, _c: Vec3, _r: f32, _f: CategoryMask) -> Vec<NearbyObject> { Vec::new() }
    }
    impl OccupancyProbe for Empty {
        fn is_obstructed(&self, _c: Vec3, _r: f32) -> bool { false }
    }

    struct Flat;
    impl TerrainSampler for Flat {
        fn ground_height(&self, _x: f32, _z: f32) -> Option<f32> { Some(0.0) }
        fn is_cultivated(&self, x: f32, _z: f32) -> bool { x < 0.5 }
    }

    fn ctx() -> PlantingContext<'static> {
        PlantingContext { query: &Empty, terrain: &Flat, occupancy: &Empty, tuning: GridTuning::default() }
    }

    fn request(width: u32, height: u32) -> PlacementRequest {
        PlacementRequest {
            anchor: Vec3::ZERO,
            yaw: 0.0,
            footprint_radius: 0.5,
            width,
            height,
            snapping: true,
            mass_mode: true,
            cultivated_only: false,
        }
    }

    #[test]
    fn cell_counts() {
        for (w, h, n) in [(1, 1, 1), (1, 2, 2), (3, 1, 2), (5, 1, 2), (2, 2, 4), (2, 3, 6), (4, 4, 16)] {
            let grid = plan_grid(&request(w, h), &ctx()).unwrap();
            assert_eq!(grid.len(), n, "{w}x{h}");
        }
    }

    #[test]
    fn single_cell_sits_on_anchor() {
        let grid = plan_grid(&request(1, 1), &ctx()).unwrap();
        assert!(grid.primary().position.distance(Vec3::ZERO) < 1e-5);
    }

    #[test]
    fn one_by_two_is_the_middle_row_pair() {
        let grid = plan_grid(&request(1, 2), &ctx()).unwrap();
        let mut xs: Vec<f32> = grid.cells.iter().map(|c| c.position.x).collect();
        xs.sort_by(f32::total_cmp);
        assert!((xs[0] + 0.5).abs() < 1e-5 && (xs[1] - 0.5).abs() < 1e-5);
        assert!(grid.cells.iter().all(|c| c.position.z.abs() < 1e-5));
    }

    #[test]
    fn mass_mode_off_plants_one() {
        let mut req = request(3, 3);
        req.mass_mode = false;
        assert_eq!(plan_grid(&req, &ctx()).unwrap().len(), 1);
    }

    #[test]
    fn primary_prefers_valid_cells() {
        let mut req = request(2, 2);
        req.cultivated_only = true;
        // only cells with x < 0.5 are tilled: the two at x = -0.5
        let grid = plan_grid(&req, &ctx()).unwrap();
        assert_eq!(grid.primary().status, CellStatus::Valid);
        assert!(grid.primary().position.x < 0.0);
        assert_eq!(grid.valid_count(), 2);
    }

    #[test]
    fn malformed_request_is_rejected() {
        let mut req = request(2, 2);
        req.footprint_radius = -0.5;
        assert_eq!(plan_grid(&req, &ctx()), Err(PlantingError::InvalidFootprint(-0.5)));
        let req = request(0, 2);
        assert!(matches!(plan_grid(&req, &ctx()), Err(PlantingError::InvalidDimensions { .. })));
    }
}
