// src/farming/commit.rs
//! Plant the rest of a grid once the host has placed the primary plant.

use bevy::prelude::*;

use super::core::{Cell, CellStatus, PlacementGrid};

/// Host side of a commit: resources and instantiation.
pub trait PlantSink {
    /// Whether one more plant can be paid for.
    fn has_materials(&self) -> bool;
    /// Spawn a plant at `cell` and consume its cost.
    fn plant(&mut self, cell: &Cell, rotation: Quat) -> Result<(), String>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum CellOutcome {
    Planted,
    /// Classified as not placeable; nothing spent.
    Skipped(CellStatus),
    /// Ran out of resources before reaching this cell.
    OutOfMaterials,
    Failed(String),
}

/// What happened to every cell after the primary, in grid order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitReport {
    /// `(grid index, outcome)`; index 0 is never listed.
    pub outcomes: Vec<(usize, CellOutcome)>,
}

impl CommitReport {
    pub fn planted(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == CellOutcome::Planted).count()
    }

    pub fn ran_out(&self) -> bool {
        self.outcomes.iter().any(|(_, o)| *o == CellOutcome::OutOfMaterials)
    }
}

/// Walk the cells after the primary. Invalid cells are skipped; the walk stops
/// at the first cell that cannot be paid for.
pub fn commit_extra_cells<S: PlantSink + ?Sized>(grid: &PlacementGrid, sink: &mut S) -> CommitReport {
    let rotation = grid.rotation();
    let mut report = CommitReport::default();
    let mut broke = false;

    for (i, cell) in grid.cells.iter().enumerate().skip(1) {
        if broke {
            report.outcomes.push((i, CellOutcome::OutOfMaterials));
            continue;
        }
        if !cell.is_valid() {
            report.outcomes.push((i, CellOutcome::Skipped(cell.status)));
            continue;
        }
        if !sink.has_materials() {
            broke = true;
            report.outcomes.push((i, CellOutcome::OutOfMaterials));
            continue;
        }
        let outcome = match sink.plant(cell, rotation) {
            Ok(()) => CellOutcome::Planted,
            Err(reason) => {
                warn!("planting at {:?} failed: {}", cell.position, reason);
                CellOutcome::Failed(reason)
            }
        };
        report.outcomes.push((i, outcome));
    }

    info!(
        "mass plant: {} extra planted of {} cells{}",
        report.planted(),
        grid.len().saturating_sub(1),
        if broke { " (out of materials)" } else { "" }
    );
    report
}
