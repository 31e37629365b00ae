// src/farming/preview.rs
//! Owned preview state carried between frames: the last grid, which ghosts
//! should glow red, and the ghost entity slots.

use bevy::prelude::*;

use super::core::PlacementGrid;

#[derive(Resource, Default, Debug)]
pub struct PlantingPreview {
    grid: Option<PlacementGrid>,
    /// Parallel to `grid.cells`.
    highlight_invalid: Vec<bool>,
    /// Seeds the visible grid would consume.
    total_cost: u32,
    /// One slot per cell; rebuilt only when the cell count changes or after `invalidate`.
    ghosts: Vec<Option<Entity>>,
    invalidated: bool,
}

impl PlantingPreview {
    /// Replace the shown grid. A cell is highlighted when it cannot be planted or
    /// when the seeds for it and every valid cell before it exceed `budget`
    /// (`None` means placement is free).
    pub fn show(&mut self, grid: PlacementGrid, cost_per_plant: u32, budget: Option<u32>) {
        self.highlight_invalid.clear();
        let mut spent = 0u32;
        for cell in &grid.cells {
            let mut invalid = !cell.is_valid();
            if !invalid {
                spent = spent.saturating_add(cost_per_plant);
                invalid = budget.is_some_and(|b| spent > b);
            }
            self.highlight_invalid.push(invalid);
        }
        self.total_cost = spent;
        self.grid = Some(grid);
    }

    pub fn hide(&mut self) {
        self.grid = None;
        self.highlight_invalid.clear();
        self.total_cost = 0;
    }

    pub fn grid(&self) -> Option<&PlacementGrid> {
        self.grid.as_ref()
    }

    pub fn is_highlighted(&self, i: usize) -> bool {
        self.highlight_invalid.get(i).copied().unwrap_or(false)
    }

    pub fn total_cost(&self) -> u32 {
        self.total_cost
    }

    /// Force the ghost slots to be rebuilt, e.g. after the selected seed changed.
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    /// Make room for `count` ghosts. Returns the entities that must be despawned.
    pub fn ensure_slots(&mut self, count: usize) -> Vec<Entity> {
        if !self.invalidated && self.ghosts.len() == count {
            return Vec::new();
        }
        let stale: Vec<Entity> = self.ghosts.drain(..).flatten().collect();
        self.ghosts.resize(count, None);
        self.invalidated = false;
        stale
    }

    pub fn slot(&self, i: usize) -> Option<Entity> {
        self.ghosts.get(i).copied().flatten()
    }

    pub fn set_slot(&mut self, i: usize, entity: Entity) {
        if let Some(s) = self.ghosts.get_mut(i) {
            *s = Some(entity);
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = Entity> + '_ {
        self.ghosts.iter().flatten().copied()
    }
}
