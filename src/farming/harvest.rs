// src/farming/harvest.rs
//! Picking one crop picks the ripe crops around it.

use bevy::prelude::*;

use super::core::{CategoryMask, NearbyObject, ObjectId, SpatialQuery};

/// Reach of a mass harvest: `floor(skill * 100 / step) * 1.5` meters.
/// `None` when `increase_harvest_amount` is 0.
pub fn harvest_radius(skill_factor: f32, increase_harvest_amount: u32) -> Option<f32> {
    if increase_harvest_amount == 0 {
        return None;
    }
    let skill = if skill_factor.is_finite() { skill_factor.clamp(0.0, 1.0) } else { 0.0 };
    let steps = (skill * 100.0 / increase_harvest_amount as f32).floor();
    Some(steps * 1.5)
}

/// Every other pickable within `radius` of the crop that was picked, nearest first
/// (id breaks ties). The picked crop itself is never included.
pub fn plan_harvest<Q: SpatialQuery + ?Sized>(
    origin: ObjectId,
    origin_pos: Vec3,
    radius: f32,
    query: &Q,
) -> Vec<NearbyObject> {
    if radius <= 0.0 {
        return Vec::new();
    }
    let mut targets: Vec<NearbyObject> = query
        .query_nearby(origin_pos, radius, CategoryMask::PICKABLE)
        .into_iter()
        .filter(|o| o.id != origin && o.category.contains(CategoryMask::PICKABLE))
        .collect();

    targets.sort_by(|a, b| {
        a.position
            .distance_squared(origin_pos)
            .total_cmp(&b.position.distance_squared(origin_pos))
            .then(a.id.cmp(&b.id))
    });
    targets.dedup_by_key(|o| o.id);
    targets
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Field(Vec<NearbyObject>);

    impl SpatialQuery for Field {
        fn query_nearby(&self, center: Vec3, radius: f32, filter: CategoryMask) -> Vec<NearbyObject> {
            self.0
                .iter()
                .filter(|o| o.category.any(filter) && o.position.distance(center) <= radius)
                .copied()
                .collect()
        }
    }

    fn obj(id: u64, x: f32, category: CategoryMask) -> NearbyObject {
        NearbyObject { id: ObjectId(id), position: Vec3::new(x, 0.0, 0.0), category }
    }

    #[test]
    fn radius_steps_with_skill() {
        assert_eq!(harvest_radius(0.0, 20), Some(0.0));
        assert_eq!(harvest_radius(0.5, 20), Some(3.0));
        assert_eq!(harvest_radius(1.0, 20), Some(7.5));
        assert_eq!(harvest_radius(1.0, 0), None);
    }

    #[test]
    fn picks_neighbors_but_not_itself() {
        let field = Field(vec![
            obj(1, 0.0, CategoryMask::PICKABLE),
            obj(4, 2.0, CategoryMask::PICKABLE),
            obj(3, -1.0, CategoryMask::PICKABLE),
            obj(2, 1.0, CategoryMask::PICKABLE),
            obj(5, 0.5, CategoryMask::PLANT),
            obj(6, 9.0, CategoryMask::PICKABLE),
        ]);
        let got: Vec<u64> = plan_harvest(ObjectId(1), Vec3::ZERO, 3.0, &field).iter().map(|o| o.id.0).collect();
        assert_eq!(got, vec![2, 3, 4]);
    }

    #[test]
    fn zero_radius_picks_nothing() {
        let field = Field(vec![obj(2, 0.0, CategoryMask::PICKABLE)]);
        assert!(plan_harvest(ObjectId(1), Vec3::ZERO, 0.0, &field).is_empty());
    }
}
