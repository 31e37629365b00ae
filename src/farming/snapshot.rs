// src/farming/snapshot.rs
//! Frozen copy of the field objects, taken once per update so every stage of the
//! pipeline reads the same world.

use bevy::prelude::*;

use super::core::{CategoryMask, NearbyObject, ObjectId, OccupancyProbe, SpatialQuery};

/// Plants touching exactly one spacing apart must not count as overlapping.
pub const CONTACT_EPSILON: f32 = 1e-3;

/// Anything on the field the planter has to know about: plants, crops, rocks.
#[derive(Component, Clone, Copy, Debug)]
pub struct FieldObject {
    pub category: CategoryMask,
    /// Footprint radius (meters).
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapshotEntry {
    pub id: ObjectId,
    pub position: Vec3,
    pub radius: f32,
    pub category: CategoryMask,
}

#[derive(Clone, Debug, Default)]
pub struct WorldSnapshot {
    pub entries: Vec<SnapshotEntry>,
}

impl WorldSnapshot {
    pub fn from_entries(entries: impl IntoIterator<Item = SnapshotEntry>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    /// Copy field objects out of an ECS query.
    pub fn capture<'a>(objects: impl Iterator<Item = (Entity, &'a Transform, &'a FieldObject)>) -> Self {
        Self::from_entries(objects.map(|(e, tf, obj)| SnapshotEntry {
            id: ObjectId(e.to_bits()),
            position: tf.translation,
            radius: obj.radius,
            category: obj.category,
        }))
    }
}

impl SpatialQuery for WorldSnapshot {
    fn query_nearby(&self, center: Vec3, radius: f32, filter: CategoryMask) -> Vec<NearbyObject> {
        self.entries
            .iter()
            .filter(|e| e.category.any(filter) && e.position.distance(center) <= radius + e.radius)
            .map(|e| NearbyObject { id: e.id, position: e.position, category: e.category })
            .collect()
    }
}

impl OccupancyProbe for WorldSnapshot {
    fn is_obstructed(&self, center: Vec3, radius: f32) -> bool {
        self.entries
            .iter()
            .any(|e| e.position.distance(center) < radius + e.radius - CONTACT_EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, x: f32, radius: f32, category: CategoryMask) -> SnapshotEntry {
        SnapshotEntry { id: ObjectId(id), position: Vec3::new(x, 0.0, 0.0), radius, category }
    }

    #[test]
    fn query_filters_by_category_and_footprint() {
        let snap = WorldSnapshot::from_entries([
            entry(1, 1.0, 0.5, CategoryMask::PLANT),
            entry(2, 2.2, 0.5, CategoryMask::PICKABLE),
            entry(3, 0.5, 1.0, CategoryMask::SOLID),
        ]);
        let hits: Vec<u64> = snap
            .query_nearby(Vec3::ZERO, 1.5, CategoryMask::SNAP_TARGETS)
            .iter()
            .map(|o| o.id.0)
            .collect();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn touching_is_not_overlapping() {
        let snap = WorldSnapshot::from_entries([entry(1, 1.0, 0.5, CategoryMask::PLANT)]);
        assert!(!snap.is_obstructed(Vec3::new(0.0, 0.0, 0.0), 0.5));
        assert!(!snap.is_obstructed(Vec3::new(0.0001, 0.0, 0.0), 0.5));
        assert!(snap.is_obstructed(Vec3::new(0.2, 0.0, 0.0), 0.5));
    }

    #[test]
    fn captures_from_ecs() {
        let mut world = World::new();
        world.spawn((Transform::from_xyz(1.0, 0.0, 2.0), FieldObject { category: CategoryMask::PLANT, radius: 0.5 }));
        world.spawn(Transform::from_xyz(9.0, 0.0, 9.0));

        let mut state = world.query::<(Entity, &Transform, &FieldObject)>();
        let snap = WorldSnapshot::capture(state.iter(&world));
        assert_eq!(snap.entries.len(), 1);
        assert_eq!(snap.entries[0].position, Vec3::new(1.0, 0.0, 2.0));
    }
}
