// src/farming/placement/snap.rs
//! Aligns a fresh lattice with plants that are already in the ground.
//!
//! The lattice is first turned so one of its axes runs along the tightest pair of
//! existing plants, then shifted so the existing plants sit on lattice nodes.
//! Neighbors are kept in a canonical (x, z) order so ties never depend on the
//! order the spatial query happened to report them in.

use bevy::prelude::*;

use super::grid::Lattice;
use crate::farming::core::{xz, CategoryMask, GridTuning, SnapAnchor, SnapCorrection, SpatialQuery};

/// Existing plants around a lattice, deduplicated and in canonical order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Neighborhood {
    pub anchors: Vec<SnapAnchor>,
    /// Smallest XZ distance between any raw position and any anchor.
    pub min_distance: f32,
}

/// Query around every raw position and collect the plants found.
pub fn gather_neighbors<Q: SpatialQuery + ?Sized>(
    lattice: &Lattice,
    query: &Q,
    search_radius: f32,
) -> Neighborhood {
    let mut found: Vec<Vec2> = Vec::new();
    for &p in &lattice.positions {
        for hit in query.query_nearby(p, search_radius, CategoryMask::SNAP_TARGETS) {
            // + 0.0 folds -0.0 into 0.0 so total_cmp keeps equal points adjacent
            found.push(xz(hit.position) + Vec2::ZERO);
        }
    }

    found.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    found.dedup();

    let mut min_distance = f32::INFINITY;
    for &p in &lattice.positions {
        for n in &found {
            min_distance = min_distance.min(xz(p).distance(*n));
        }
    }

    Neighborhood { anchors: found.into_iter().map(SnapAnchor).collect(), min_distance }
}

/// Reduce an angle in degrees into (-45, 45]. A square lattice looks the same
/// every quarter turn, so this is the smallest turn that matches any heading.
pub fn canonical_quarter_turn(angle_deg: f32) -> f32 {
    let r = angle_deg.rem_euclid(90.0);
    if r > 45.0 { r - 90.0 } else { r }
}

/// Yaw (radians, around +Y) that turns `from` onto the direction of `to`, both in XZ.
#[inline]
pub fn signed_yaw_between(from: Vec2, to: Vec2) -> f32 {
    // Vec2 here is (x, z); matches Quat::from_rotation_y.
    let cross = from.y * to.x - from.x * to.y;
    cross.atan2(from.dot(to))
}

/// Pick the shift (cell - neighbor) of smallest length among the raw offset and
/// the offset moved one lattice step along either axis. Strictly smaller wins, so
/// the raw offset is kept on ties.
pub fn dock_offset(offset: Vec2, step_a: Vec2, step_b: Vec2) -> Vec2 {
    let candidates = [offset, offset + step_a, offset - step_a, offset + step_b, offset - step_b];
    let mut best = candidates[0];
    for c in &candidates[1..] {
        if c.length() < best.length() {
            best = *c;
        }
    }
    best
}

/// Index of the best-scoring anchor other than `skip`: distance to `from` plus a
/// small pull towards `center`.
fn closest_to(anchors: &[SnapAnchor], from: Vec2, skip: usize, center: Vec2, tie_scale: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (j, b) in anchors.iter().enumerate() {
        if j == skip {
            continue;
        }
        let score = from.distance(b.0) + tie_scale * b.0.distance(center);
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((j, score));
        }
    }
    best.map(|(j, _)| j)
}

/// Yaw correction in degrees, within (-45, 45]. Zero with fewer than two anchors.
pub fn rotation_correction(anchors: &[SnapAnchor], center: Vec2, baseline: Vec2, tie_scale: f32) -> f32 {
    if anchors.len() < 2 {
        return 0.0;
    }

    // Reference: the anchor with the tightest neighbor.
    let mut reference: Option<(usize, f32)> = None;
    for (i, a) in anchors.iter().enumerate() {
        let Some(j) = closest_to(anchors, a.0, i, center, 0.0) else { continue };
        let score = a.0.distance(anchors[j].0) + tie_scale * a.0.distance(center);
        if reference.is_none_or(|(_, s)| score < s) {
            reference = Some((i, score));
        }
    }
    let Some((i, _)) = reference else { return 0.0 };
    let Some(j) = closest_to(anchors, anchors[i].0, i, center, tie_scale) else { return 0.0 };

    let dir = anchors[j].0 - anchors[i].0;
    if dir.length_squared() <= f32::EPSILON {
        return 0.0;
    }
    canonical_quarter_turn(signed_yaw_between(baseline, dir).to_degrees())
}

/// XZ shift that docks the lattice against its closest anchor, or zero when no
/// position is within one spacing of an anchor.
pub fn translation_correction(positions: &[Vec3], anchors: &[SnapAnchor], spacing: f32, left: Vec2, forward: Vec2) -> Vec2 {
    let mut closest: Option<(f32, Vec2)> = None;
    for &p in positions {
        for a in anchors {
            let d = xz(p).distance(a.0);
            if d < spacing && closest.is_none_or(|(bd, _)| d < bd) {
                closest = Some((d, xz(p) - a.0));
            }
        }
    }
    match closest {
        Some((_, offset)) => dock_offset(offset, left, forward),
        None => Vec2::ZERO,
    }
}

/// Rotate then shift the lattice in place. Returns `None`, leaving the lattice
/// untouched, when no anchor is within one spacing of a raw position.
pub fn resolve_snap(lattice: &mut Lattice, neighborhood: &Neighborhood, tie_scale: f32) -> Option<SnapCorrection> {
    if neighborhood.anchors.is_empty() || !(neighborhood.min_distance < lattice.spacing) {
        return None;
    }
    let anchors = &neighborhood.anchors;
    let center = lattice.center;

    let angle_deg = rotation_correction(anchors, xz(center), xz(lattice.left), tie_scale);
    if angle_deg != 0.0 {
        let rot = Quat::from_rotation_y(angle_deg.to_radians());
        for p in lattice.positions.iter_mut() {
            *p = center + rot * (*p - center);
        }
        lattice.left = rot * lattice.left;
        lattice.forward = rot * lattice.forward;
    }

    let translation = translation_correction(
        &lattice.positions,
        anchors,
        lattice.spacing,
        xz(lattice.left),
        xz(lattice.forward),
    );
    if translation != Vec2::ZERO {
        let shift = Vec3::new(translation.x, 0.0, translation.y);
        for p in lattice.positions.iter_mut() {
            *p -= shift;
        }
        lattice.center -= shift;
    }

    Some(SnapCorrection { angle_deg, translation })
}

/// Gather neighbors for `lattice` and snap it to them.
pub fn snap_lattice<Q: SpatialQuery + ?Sized>(
    lattice: &mut Lattice,
    query: &Q,
    tuning: &GridTuning,
) -> Option<SnapCorrection> {
    let radius = lattice.spacing * tuning.snap_search_multiplier;
    let neighborhood = gather_neighbors(lattice, query, radius);
    let correction = resolve_snap(lattice, &neighborhood, tuning.snap_tie_break_scale);

    if let Some(c) = correction {
        debug!(
            "snap: {} neighbors, min dist {:.3}, turn {:.2} deg, shift ({:.3}, {:.3})",
            neighborhood.anchors.len(),
            neighborhood.min_distance,
            c.angle_deg,
            c.translation.x,
            c.translation.y
        );
    }
    correction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farming::core::{NearbyObject, ObjectId};
    use crate::farming::placement::grid::build_lattice;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const EPS: f32 = 1e-4;

    struct Plants(Vec<Vec3>);

    impl SpatialQuery for Plants {
        fn query_nearby(&self, center: Vec3, radius: f32, _filter: CategoryMask) -> Vec<NearbyObject> {
            self.0
                .iter()
                .enumerate()
                .filter(|(_, p)| p.distance(center) <= radius)
                .map(|(i, p)| NearbyObject { id: ObjectId(i as u64), position: *p, category: CategoryMask::PLANT })
                .collect()
        }
    }

    fn anchors(points: &[(f32, f32)]) -> Vec<SnapAnchor> {
        points.iter().map(|&(x, z)| SnapAnchor(Vec2::new(x, z))).collect()
    }

    #[test]
    fn quarter_turn_band() {
        assert_eq!(canonical_quarter_turn(0.0), 0.0);
        assert!((canonical_quarter_turn(30.0) - 30.0).abs() < EPS);
        assert!((canonical_quarter_turn(45.0) - 45.0).abs() < EPS);
        assert!((canonical_quarter_turn(-45.0) - 45.0).abs() < EPS);
        assert!((canonical_quarter_turn(46.0) + 44.0).abs() < EPS);
        assert!((canonical_quarter_turn(90.0)).abs() < EPS);
        assert!((canonical_quarter_turn(-100.0) + 10.0).abs() < EPS);
        assert!((canonical_quarter_turn(725.0) - 5.0).abs() < EPS);

        let mut deg = -720.0_f32;
        while deg <= 720.0 {
            let r = canonical_quarter_turn(deg);
            assert!(r > -45.0 && r <= 45.0, "{deg} -> {r}");
            deg += 0.37;
        }
    }

    #[test]
    fn signed_yaw_matches_quat_rotation() {
        let from = Vec2::new(1.0, 0.0);
        let angle = 0.6_f32;
        let rotated = Quat::from_rotation_y(angle) * Vec3::X;
        let got = signed_yaw_between(from, xz(rotated));
        assert!((got - angle).abs() < EPS);
    }

    #[test]
    fn dock_offset_prefers_one_step_over() {
        let left = Vec2::new(-1.0, 0.0);
        let fwd = Vec2::new(0.0, -1.0);
        let got = dock_offset(Vec2::new(-0.8, 0.0), left, fwd);
        assert!((got - Vec2::new(0.2, 0.0)).length() < EPS);

        // already close: keep the raw offset
        let got = dock_offset(Vec2::new(0.1, -0.2), left, fwd);
        assert!((got - Vec2::new(0.1, -0.2)).length() < EPS);

        // exact half step ties keep the raw offset
        let got = dock_offset(Vec2::new(0.5, 0.0), left, fwd);
        assert!((got - Vec2::new(0.5, 0.0)).length() < EPS);
    }

    #[test]
    fn single_neighbor_needs_no_turn() {
        let a = anchors(&[(1.8, 0.0)]);
        assert_eq!(rotation_correction(&a, Vec2::ZERO, Vec2::new(-1.0, 0.0), 0.001), 0.0);
    }

    #[test]
    fn turn_follows_tightest_pair() {
        // a pair 20 degrees off the X axis, and a looser stray
        let t = 20.0_f32.to_radians();
        let b = Vec2::new(3.0, 0.0);
        let dir = xz(Quat::from_rotation_y(t) * Vec3::X);
        let a = anchors(&[(b.x, b.y), (b.x + dir.x, b.y + dir.y), (-6.0, 6.0)]);
        let got = rotation_correction(&a, Vec2::ZERO, Vec2::new(-1.0, 0.0), 0.001);
        assert!((got - 20.0).abs() < 1e-2, "got {got}");
    }

    #[test]
    fn far_neighbors_leave_lattice_alone() {
        let mut lat = build_lattice(Vec3::ZERO, 0.0, 1.0, 3, 3);
        let raw = lat.clone();
        let plants = Plants(vec![Vec3::new(2.2, 0.0, 0.0)]);
        let got = snap_lattice(&mut lat, &plants, &GridTuning::default());
        assert_eq!(got, None);
        assert_eq!(lat, raw);
    }

    #[test]
    fn docks_against_lone_neighbor() {
        let mut lat = build_lattice(Vec3::ZERO, 0.0, 1.0, 3, 3);
        let raw = lat.positions.clone();
        let plants = Plants(vec![Vec3::new(1.8, 0.0, 0.0)]);
        let c = snap_lattice(&mut lat, &plants, &GridTuning::default()).unwrap();

        assert_eq!(c.angle_deg, 0.0);
        assert!((c.translation - Vec2::new(0.2, 0.0)).length() < EPS);
        for (p, r) in lat.positions.iter().zip(&raw) {
            assert!((*p - (*r - Vec3::new(0.2, 0.0, 0.0))).length() < EPS);
        }
        // the neighbor now sits on a lattice node, one step past the closest cell
        assert!(lat.positions.iter().any(|p| p.distance(Vec3::new(0.8, 0.0, 0.0)) < EPS));
    }

    #[test]
    fn rotated_row_is_matched() {
        // existing row at 30 degrees, one spacing apart, near the anchor
        let t = 30.0_f32.to_radians();
        let dir = Quat::from_rotation_y(t) * Vec3::X;
        let base = Vec3::new(0.3, 0.0, 1.4);
        let row: Vec<Vec3> = (0..4).map(|i| base + dir * i as f32).collect();

        let mut lat = build_lattice(Vec3::ZERO, 0.0, 1.0, 3, 3);
        let c = snap_lattice(&mut lat, &Plants(row.clone()), &GridTuning::default()).unwrap();
        assert!((c.angle_deg - 30.0).abs() < 1e-2, "angle {}", c.angle_deg);

        // every existing plant should now be an integer number of steps from every cell
        let left = xz(lat.left);
        let fwd = xz(lat.forward);
        for p in &lat.positions {
            for r in &row {
                let d = xz(*r) - xz(*p);
                let a = d.dot(left) / left.length_squared();
                let b = d.dot(fwd) / fwd.length_squared();
                assert!((a - a.round()).abs() < 1e-2 && (b - b.round()).abs() < 1e-2);
            }
        }
    }

    #[test]
    fn enumeration_order_does_not_matter() {
        let pts = vec![
            Vec3::new(1.7, 0.0, 0.1),
            Vec3::new(2.7, 0.0, 0.1),
            Vec3::new(1.7, 0.0, 1.1),
            Vec3::new(-1.2, 0.0, 1.6),
            Vec3::new(-0.4, 0.0, -1.9),
            Vec3::new(1.7, 0.0, 0.1),
        ];
        let mut reference = build_lattice(Vec3::new(0.2, 0.0, 0.0), 0.3, 1.0, 3, 3);
        let want = snap_lattice(&mut reference, &Plants(pts.clone()), &GridTuning::default());

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..16 {
            let mut shuffled = pts.clone();
            shuffled.shuffle(&mut rng);
            let mut lat = build_lattice(Vec3::new(0.2, 0.0, 0.0), 0.3, 1.0, 3, 3);
            let got = snap_lattice(&mut lat, &Plants(shuffled), &GridTuning::default());
            assert_eq!(got, want);
            assert_eq!(lat, reference);
        }
    }

    #[test]
    fn duplicates_are_merged() {
        let lat = build_lattice(Vec3::ZERO, 0.0, 1.0, 3, 3);
        let plants = Plants(vec![Vec3::new(0.5, 0.0, 0.5), Vec3::new(0.5, 3.0, 0.5)]);
        // the raised copy shares XZ with the first one
        let n = gather_neighbors(&lat, &plants, 5.0);
        assert_eq!(n.anchors.len(), 1);
        assert!((n.min_distance - Vec2::new(0.5, 0.5).length()).abs() < EPS);
    }

    #[test]
    fn signed_zeros_are_one_point() {
        let lat = build_lattice(Vec3::ZERO, 0.0, 1.0, 3, 3);
        let plants = Plants(vec![
            Vec3::new(-0.0, 0.0, 1.0),
            Vec3::new(-0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, 1.0),
        ]);
        let n = gather_neighbors(&lat, &plants, 10.0);
        assert_eq!(n.anchors.len(), 2);
        assert!(n.anchors.iter().all(|a| a.0.x.is_sign_positive()));
        assert_eq!(n.anchors[0].0, Vec2::new(0.0, 1.0));
        assert_eq!(n.anchors[1].0, Vec2::new(0.0, 5.0));
    }
}
