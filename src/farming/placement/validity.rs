// src/farming/placement/validity.rs
//! Per-cell placement verdicts. A bad cell never stops its siblings from being classified.

use bevy::prelude::*;

use crate::farming::core::{Cell, CellStatus, OccupancyProbe, TerrainSampler};

/// Resolve the ground height at `position` and decide whether a plant may go there.
///
/// Checks run in order: tilled-soil requirement, missing terrain sample, solid
/// overlap within `footprint_radius`. The first failure wins.
pub fn classify<T, O>(
    position: Vec3,
    footprint_radius: f32,
    cultivated_only: bool,
    terrain: &T,
    occupancy: &O,
) -> Cell
where
    T: TerrainSampler + ?Sized,
    O: OccupancyProbe + ?Sized,
{
    let ground = terrain.ground_height(position.x, position.z);
    let resolved = Vec3::new(position.x, ground.unwrap_or(position.y), position.z);

    let status = if cultivated_only && !terrain.is_cultivated(position.x, position.z) {
        CellStatus::NeedsSpecialGround
    } else if ground.is_none() {
        CellStatus::Obstructed
    } else if occupancy.is_obstructed(resolved, footprint_radius) {
        CellStatus::Obstructed
    } else {
        CellStatus::Valid
    };

    Cell { position: resolved, status }
}
