// src/farming/core.rs
//! Core types/traits for grid planting.
//! Keep this file dependency-light; the placement pipeline and the ECS glue both build on it.

use bevy::prelude::*; // Vec2, Vec3, Quat
use serde::{Deserialize, Serialize};
use std::ops::BitOr;

// ---------- Categories & ids ----------

/// Bitmask of object categories used to filter spatial queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CategoryMask(pub u32);

impl CategoryMask {
    pub const NONE: Self = Self(0);
    /// A growing plant (sapling, seedling).
    pub const PLANT: Self = Self(1);
    /// A grown crop that can be picked.
    pub const PICKABLE: Self = Self(1 << 1);
    /// Anything solid that blocks planting (rocks, walls).
    pub const SOLID: Self = Self(1 << 2);

    /// What the snap resolver aligns against.
    pub const SNAP_TARGETS: Self = Self(Self::PLANT.0 | Self::PICKABLE.0);

    pub fn contains(self, other: Self) -> bool { (self.0 & other.0) == other.0 }
    pub fn any(self, other: Self) -> bool { (self.0 & other.0) != 0 }
}

impl BitOr for CategoryMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

/// Stable identity of a placed object, as reported by the spatial query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

/// One hit of a spatial query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearbyObject {
    pub id: ObjectId,
    pub position: Vec3,
    pub category: CategoryMask,
}

// ---------- External interfaces ----------

/// Live read of the objects already placed in the world.
pub trait SpatialQuery {
    /// Objects whose footprint intersects the sphere and whose category overlaps `filter`.
    fn query_nearby(&self, center: Vec3, radius: f32, filter: CategoryMask) -> Vec<NearbyObject>;
}

/// Terrain height and soil lookups at world XZ.
pub trait TerrainSampler {
    /// Ground height (Y), or `None` when there is no terrain sample there.
    fn ground_height(&self, x: f32, z: f32) -> Option<f32>;
    /// Whether the soil at world XZ has been tilled.
    fn is_cultivated(&self, x: f32, z: f32) -> bool;
}

/// Solid-geometry overlap test. Implementations must not report the object being placed.
pub trait OccupancyProbe {
    fn is_obstructed(&self, center: Vec3, radius: f32) -> bool;
}

// ---------- Tuning ----------

/// Numeric knobs of the lattice and the snap search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridTuning {
    /// Cell spacing = 2 * footprint radius * this.
    pub spacing_multiplier: f32,
    /// Neighbor query radius = spacing * this.
    pub snap_search_multiplier: f32,
    /// Weight of the anchor distance when two neighbor pairs are equally tight.
    pub snap_tie_break_scale: f32,
}

impl Default for GridTuning {
    fn default() -> Self {
        Self { spacing_multiplier: 1.0, snap_search_multiplier: 1.5, snap_tie_break_scale: 0.001 }
    }
}

impl GridTuning {
    pub fn validate(&self) -> Result<(), PlantingError> {
        if !(self.spacing_multiplier.is_finite() && self.spacing_multiplier > 0.0) {
            return Err(PlantingError::InvalidSpacing(self.spacing_multiplier));
        }
        if !(self.snap_search_multiplier.is_finite() && self.snap_search_multiplier > 0.0) {
            return Err(PlantingError::InvalidSnapSearch(self.snap_search_multiplier));
        }
        if !(self.snap_tie_break_scale.is_finite() && self.snap_tie_break_scale >= 0.0) {
            return Err(PlantingError::InvalidTieBreak(self.snap_tie_break_scale));
        }
        Ok(())
    }
}

// ---------- Request ----------

/// Everything the pipeline needs to lay out one batch of plants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementRequest {
    /// Where the cursor ghost sits.
    pub anchor: Vec3,
    /// Yaw (radians) around +Y.
    pub yaw: f32,
    /// Clearance each plant needs (meters).
    pub footprint_radius: f32,
    pub width: u32,
    pub height: u32,
    pub snapping: bool,
    /// When off, the grid collapses to a single cell.
    pub mass_mode: bool,
    /// The plant only grows on tilled soil.
    pub cultivated_only: bool,
}

/// Largest lattice (after single rows grow to 3) a request may generate.
pub const MAX_GRID_CELLS: u32 = 4096;

impl PlacementRequest {
    /// Rejects malformed requests and returns the lattice spacing.
    pub fn spacing(&self, tuning: &GridTuning) -> Result<f32, PlantingError> {
        tuning.validate()?;
        if !(self.footprint_radius.is_finite() && self.footprint_radius > 0.0) {
            return Err(PlantingError::InvalidFootprint(self.footprint_radius));
        }
        let grow = |d: u32| if d == 1 { 3 } else { d };
        let (w, h) = self.effective_dims();
        let cells = grow(w).checked_mul(grow(h));
        if self.width == 0 || self.height == 0 || cells.is_none_or(|n| n > MAX_GRID_CELLS) {
            return Err(PlantingError::InvalidDimensions { width: self.width, height: self.height });
        }
        if !self.anchor.is_finite() || !self.yaw.is_finite() {
            return Err(PlantingError::NonFiniteAnchor);
        }
        Ok(2.0 * self.footprint_radius * tuning.spacing_multiplier)
    }

    /// Requested dimensions after the mass-mode toggle.
    pub fn effective_dims(&self) -> (u32, u32) {
        if self.mass_mode { (self.width, self.height) } else { (1, 1) }
    }

    pub fn rotation(&self) -> Quat { Quat::from_rotation_y(self.yaw) }
}

// ---------- Output ----------

/// Placement verdict for one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellStatus {
    Valid,
    /// The plant needs tilled soil and there is none.
    NeedsSpecialGround,
    /// Something solid is in the way, or there is no ground to stand on.
    Obstructed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cell {
    /// World position with Y resolved against the terrain.
    pub position: Vec3,
    pub status: CellStatus,
}

impl Cell {
    pub fn is_valid(&self) -> bool { self.status == CellStatus::Valid }
}

/// An existing plant the lattice aligns against (XZ only).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapAnchor(pub Vec2);

/// Correction applied by the snap resolver.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SnapCorrection {
    /// Yaw correction in degrees, within (-45, 45].
    pub angle_deg: f32,
    /// XZ shift subtracted from every position after rotation.
    pub translation: Vec2,
}

/// Ordered, labeled cells. Index 0 is the primary cell.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacementGrid {
    pub cells: Vec<Cell>,
    /// Final yaw of every plant (request yaw plus snap correction).
    pub yaw: f32,
    /// `None` when the lattice was left where the builder put it.
    pub snap: Option<SnapCorrection>,
}

impl PlacementGrid {
    pub fn primary(&self) -> &Cell { &self.cells[0] }
    pub fn len(&self) -> usize { self.cells.len() }
    pub fn is_empty(&self) -> bool { self.cells.is_empty() }
    pub fn rotation(&self) -> Quat { Quat::from_rotation_y(self.yaw) }
    pub fn valid_count(&self) -> usize { self.cells.iter().filter(|c| c.is_valid()).count() }
}

/// Drop the vertical coordinate.
#[inline]
pub fn xz(v: Vec3) -> Vec2 { Vec2::new(v.x, v.z) }

// ---------- Errors ----------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlantingError {
    #[error("footprint radius must be positive and finite, got {0}")]
    InvalidFootprint(f32),
    #[error("spacing multiplier must be positive and finite, got {0}")]
    InvalidSpacing(f32),
    #[error("snap search multiplier must be positive and finite, got {0}")]
    InvalidSnapSearch(f32),
    #[error("snap tie-break scale must be non-negative and finite, got {0}")]
    InvalidTieBreak(f32),
    #[error("grid dimensions must be at least 1x1 and at most {max} cells, got {width}x{height}", max = MAX_GRID_CELLS)]
    InvalidDimensions { width: u32, height: u32 },
    #[error("anchor position and yaw must be finite")]
    NonFiniteAnchor,
}
