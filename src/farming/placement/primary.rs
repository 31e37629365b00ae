// src/farming/placement/primary.rs
//! Move the valid cell nearest the anchor to the front.

use bevy::prelude::*;

use crate::farming::core::Cell;

/// Index of the valid cell closest to `anchor`; the earliest one wins ties.
/// `None` when nothing is valid.
pub fn nearest_valid(cells: &[Cell], anchor: Vec3) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, c) in cells.iter().enumerate() {
        if !c.is_valid() {
            continue;
        }
        let d = c.position.distance_squared(anchor);
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

/// Swap the primary cell into index 0. With no valid cell the order is unchanged.
pub fn select_primary(cells: &mut [Cell], anchor: Vec3) {
    if let Some(i) = nearest_valid(cells, anchor) {
        cells.swap(0, i);
    }
}
