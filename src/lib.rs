//! Grid planting for a Bevy farming sandbox: lay out a rotated grid of plant
//! cells, snap it onto nearby plants, classify each cell and pick the primary.

pub mod farming;
pub mod terrain;

pub use farming::core::{
    CategoryMask, Cell, CellStatus, GridTuning, NearbyObject, ObjectId, OccupancyProbe,
    PlacementGrid, PlacementRequest, PlantingError, SnapCorrection, SpatialQuery, TerrainSampler,
};
pub use farming::placement::{plan_grid, PlantingContext};
pub use farming::FarmingPlugin;
pub use terrain::{HeightField, TerrainPlugin};
