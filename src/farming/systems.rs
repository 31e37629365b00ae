// src/farming/systems.rs
//! Frame systems: aim, preview, ghosts, commit and harvest.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use super::commit::{commit_extra_cells, PlantSink};
use super::core::{CategoryMask, Cell, PlacementGrid, PlacementRequest, PlantingError, ObjectId};
use super::harvest::{harvest_radius, plan_harvest};
use super::manifest::{grid_dimensions, FarmingConfig, FarmingManifest, SeedDef, SeedId};
use super::placement::{plan_grid, PlantingContext};
use super::plugin::{
    FarmAssets, FarmingManifestHandle, FarmingSettings, FarmingSkill, PlacementCursor, PlantGhost,
    SeedPouch,
};
use super::preview::PlantingPreview;
use super::snapshot::{FieldObject, WorldSnapshot};
use crate::terrain::HeightField;

/// Yaw step for Q/E.
pub const ROTATE_STEP_DEG: f32 = 15.0;
/// How close to the cursor a crop must be to start a harvest.
pub const PICK_REACH: f32 = 1.0;

type FieldObjects<'w, 's> = Query<'w, 's, (Entity, &'static Transform, &'static FieldObject)>;

// ---------- pure helpers ----------

/// Build the request for the current cursor and seed.
pub fn build_request(
    anchor: Vec3,
    cursor: &PlacementCursor,
    seed: &SeedDef,
    config: &FarmingConfig,
    skill_factor: f32,
) -> PlacementRequest {
    let mass_mode = config.mass_mode && !cursor.single_plant;
    let (width, height) = if mass_mode {
        grid_dimensions(skill_factor, config.increase_plant_amount).unwrap_or((1, 1))
    } else {
        (1, 1)
    };
    PlacementRequest {
        anchor,
        yaw: cursor.yaw,
        footprint_radius: seed.footprint_radius,
        width,
        height,
        snapping: config.snapping,
        mass_mode,
        cultivated_only: seed.cultivated_only,
    }
}

/// Ghosts are only shown for mass planting.
pub fn previews_grid(cursor: &PlacementCursor, config: &FarmingConfig) -> bool {
    config.mass_mode && config.increase_plant_amount > 0 && !cursor.single_plant
}

/// Run the pipeline against a frozen copy of the field.
pub fn plan_on_field(
    req: &PlacementRequest,
    snapshot: &WorldSnapshot,
    field: &HeightField,
    config: &FarmingConfig,
) -> Result<PlacementGrid, PlantingError> {
    let ctx = PlantingContext {
        query: snapshot,
        terrain: field,
        occupancy: snapshot,
        tuning: config.tuning,
    };
    plan_grid(req, &ctx)
}

/// Where a ray first meets the terrain. Bisects between the camera and the y=0 plane.
pub fn ray_ground_hit(origin: Vec3, dir: Vec3, field: &HeightField) -> Option<Vec3> {
    if dir.y.abs() < f32::EPSILON {
        return None;
    }
    let t_plane = -origin.y / dir.y;
    if t_plane <= 0.0 {
        return None;
    }

    let mut t_low = 0.0;
    let mut t_high = t_plane;
    let mut hit = None;
    for _ in 0..16 {
        let t_mid = (t_low + t_high) * 0.5;
        let p = origin + dir * t_mid;
        match field.sample_height(p.x, p.z) {
            Some(ground_h) if p.y <= ground_h => {
                t_high = t_mid;
                hit = Some(Vec3::new(p.x, ground_h, p.z));
            }
            _ => t_low = t_mid,
        }
    }
    if hit.is_none() {
        let p = origin + dir * t_plane;
        hit = field.sample_height(p.x, p.z).map(|h| Vec3::new(p.x, h, p.z));
    }
    hit
}

fn selected_seed<'a>(
    manifests: &'a Assets<FarmingManifest>,
    handle: &FarmingManifestHandle,
    pouch: &SeedPouch,
) -> Option<(&'a FarmingManifest, &'a SeedDef)> {
    let manifest = manifests.get(&handle.0)?;
    let seed = manifest.get(pouch.selected?)?;
    Some((manifest, seed))
}

// ---------- manifest ----------

/// Startup: request loading the manifest, store handle.
pub fn load_manifest(
    mut handle_res: ResMut<FarmingManifestHandle>,
    settings: Res<FarmingSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() { return; }
    handle_res.0 = assets.load(settings.manifest_path.as_str());
    info!("Farming: loading manifest from '{}'", settings.manifest_path);
}

/// Update: log once when the manifest becomes available.
pub fn monitor_manifest_ready(
    handle_res: Res<FarmingManifestHandle>,
    manifests: Res<Assets<FarmingManifest>>,
    mut logged: Local<bool>,
) {
    if *logged { return; }
    if let Some(m) = manifests.get(&handle_res.0) {
        *logged = true;
        info!("Farming: manifest ready ({} seeds)", m.seeds.len());
    }
}

pub fn setup_farm_assets(
    mut farm: ResMut<FarmAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    farm.plant_mesh = meshes.add(Sphere::new(0.5));
    farm.plant_material = materials.add(Color::srgb(0.25, 0.6, 0.2));
    farm.crop_material = materials.add(Color::srgb(0.9, 0.55, 0.1));
    farm.ghost_valid = materials.add(StandardMaterial {
        base_color: Color::srgba(0.3, 0.9, 0.3, 0.4),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
    farm.ghost_invalid = materials.add(StandardMaterial {
        base_color: Color::srgba(0.9, 0.2, 0.2, 0.4),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });
}

// ---------- input ----------

/// Aim at the terrain under the mouse; Q/E turn the grid, Shift plants a single seed.
pub fn update_cursor(
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    keys: Res<ButtonInput<KeyCode>>,
    field: Option<Res<HeightField>>,
    mut cursor: ResMut<PlacementCursor>,
) {
    if keys.just_pressed(KeyCode::KeyQ) {
        cursor.yaw += ROTATE_STEP_DEG.to_radians();
    }
    if keys.just_pressed(KeyCode::KeyE) {
        cursor.yaw -= ROTATE_STEP_DEG.to_radians();
    }
    cursor.single_plant = keys.pressed(KeyCode::ShiftLeft) || keys.pressed(KeyCode::ShiftRight);

    cursor.anchor = None;
    let Some(field) = field else { return; };
    let Ok(window) = windows.single() else { return; };
    let Some(cursor_pos) = window.cursor_position() else { return; };
    let Ok((camera, cam_transform)) = cameras.single() else { return; };
    let Ok(ray) = camera.viewport_to_world(cam_transform, cursor_pos) else { return; };

    cursor.anchor = ray_ground_hit(ray.origin, *ray.direction, &field);
}

/// Digit keys pick a seed from the manifest.
pub fn select_seed(
    keys: Res<ButtonInput<KeyCode>>,
    manifests: Res<Assets<FarmingManifest>>,
    handle: Res<FarmingManifestHandle>,
    mut pouch: ResMut<SeedPouch>,
    mut preview: ResMut<PlantingPreview>,
) {
    const DIGITS: [KeyCode; 9] = [
        KeyCode::Digit1, KeyCode::Digit2, KeyCode::Digit3,
        KeyCode::Digit4, KeyCode::Digit5, KeyCode::Digit6,
        KeyCode::Digit7, KeyCode::Digit8, KeyCode::Digit9,
    ];
    let Some(manifest) = manifests.get(&handle.0) else { return; };
    for (i, key) in DIGITS.iter().enumerate() {
        if !keys.just_pressed(*key) { continue; }
        let id = SeedId(i as u32);
        if let Some(seed) = manifest.get(id) {
            if pouch.selected != Some(id) {
                pouch.selected = Some(id);
                preview.invalidate();
                info!("Farming: selected seed '{}'", seed.name);
            }
        }
    }
}

// ---------- preview ----------

/// Recompute the grid under the cursor every frame.
pub fn refresh_preview(
    cursor: Res<PlacementCursor>,
    pouch: Res<SeedPouch>,
    skill: Res<FarmingSkill>,
    manifests: Res<Assets<FarmingManifest>>,
    handle: Res<FarmingManifestHandle>,
    field: Option<Res<HeightField>>,
    objects: FieldObjects,
    mut preview: ResMut<PlantingPreview>,
) {
    let (Some(anchor), Some(field)) = (cursor.anchor, field) else {
        preview.hide();
        return;
    };
    let Some((manifest, seed)) = selected_seed(&manifests, &handle, &pouch) else {
        preview.hide();
        return;
    };
    if !previews_grid(&cursor, &manifest.config) {
        preview.hide();
        return;
    }

    let req = build_request(anchor, &cursor, seed, &manifest.config, skill.0);
    let snapshot = WorldSnapshot::capture(objects.iter());
    match plan_on_field(&req, &snapshot, &field, &manifest.config) {
        Ok(grid) => {
            let budget = (!manifest.config.free_placement).then_some(pouch.count);
            preview.show(grid, seed.cost, budget);
        }
        Err(e) => {
            debug!("Farming: no preview for '{}': {}", seed.name, e);
            preview.hide();
        }
    }
}

/// Keep one ghost per previewed cell, tinted red where planting would fail.
pub fn sync_ghosts(
    mut commands: Commands,
    mut preview: ResMut<PlantingPreview>,
    pouch: Res<SeedPouch>,
    manifests: Res<Assets<FarmingManifest>>,
    handle: Res<FarmingManifestHandle>,
    farm: Res<FarmAssets>,
    mut ghosts: Query<
        (&mut Transform, &mut MeshMaterial3d<StandardMaterial>, &mut Visibility),
        With<PlantGhost>,
    >,
) {
    let scale = selected_seed(&manifests, &handle, &pouch)
        .map_or(1.0, |(_, seed)| seed.footprint_radius * 2.0);

    let Some(grid) = preview.grid().cloned() else {
        for e in preview.slots() {
            if let Ok((_, _, mut vis)) = ghosts.get_mut(e) {
                *vis = Visibility::Hidden;
            }
        }
        return;
    };

    for e in preview.ensure_slots(grid.len()) {
        commands.entity(e).despawn();
    }

    let rotation = grid.rotation();
    for (i, cell) in grid.cells.iter().enumerate() {
        let material = if preview.is_highlighted(i) {
            farm.ghost_invalid.clone()
        } else {
            farm.ghost_valid.clone()
        };
        let tf = Transform::from_translation(cell.position)
            .with_rotation(rotation)
            .with_scale(Vec3::splat(scale));

        match preview.slot(i).map(|e| ghosts.get_mut(e)) {
            Some(Ok((mut t, mut mat, mut vis))) => {
                *t = tf;
                mat.0 = material;
                *vis = Visibility::Visible;
            }
            // Spawned this frame; its commands have not applied yet.
            Some(Err(_)) => {}
            None => {
                let e = commands
                    .spawn((
                        PlantGhost,
                        Mesh3d(farm.plant_mesh.clone()),
                        MeshMaterial3d(material),
                        tf,
                        Visibility::Visible,
                    ))
                    .id();
                preview.set_slot(i, e);
            }
        }
    }
}

// ---------- commit ----------

/// Spawns plants into the world and pays for them out of the pouch.
struct FieldPlanter<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    pouch: &'a mut SeedPouch,
    farm: &'a FarmAssets,
    seed: &'a SeedDef,
    free: bool,
}

impl PlantSink for FieldPlanter<'_, '_, '_> {
    fn has_materials(&self) -> bool {
        self.free || self.pouch.count >= self.seed.cost
    }

    fn plant(&mut self, cell: &Cell, rotation: Quat) -> Result<(), String> {
        if !self.free {
            self.pouch.count = self
                .pouch
                .count
                .checked_sub(self.seed.cost)
                .ok_or_else(|| format!("not enough '{}' seeds", self.seed.name))?;
        }
        self.commands.spawn((
            Name::new(self.seed.name.clone()),
            Mesh3d(self.farm.plant_mesh.clone()),
            MeshMaterial3d(self.farm.plant_material.clone()),
            Transform::from_translation(cell.position)
                .with_rotation(rotation)
                .with_scale(Vec3::splat(self.seed.footprint_radius * 2.0)),
            FieldObject { category: CategoryMask::PLANT, radius: self.seed.footprint_radius },
        ));
        Ok(())
    }
}

/// Left click: plant the primary cell, then the rest of the grid.
pub fn commit_planting(
    mut commands: Commands,
    buttons: Res<ButtonInput<MouseButton>>,
    cursor: Res<PlacementCursor>,
    skill: Res<FarmingSkill>,
    manifests: Res<Assets<FarmingManifest>>,
    handle: Res<FarmingManifestHandle>,
    field: Option<Res<HeightField>>,
    farm: Res<FarmAssets>,
    objects: FieldObjects,
    mut pouch: ResMut<SeedPouch>,
) {
    if !buttons.just_pressed(MouseButton::Left) { return; }
    let (Some(anchor), Some(field)) = (cursor.anchor, field) else { return; };
    let Some((manifest, seed)) = selected_seed(&manifests, &handle, &pouch) else { return; };
    let seed = seed.clone();
    let config = manifest.config;

    // Same world the preview saw, recomputed so the commit never trusts stale ghosts.
    let req = build_request(anchor, &cursor, &seed, &config, skill.0);
    let snapshot = WorldSnapshot::capture(objects.iter());
    let grid = match plan_on_field(&req, &snapshot, &field, &config) {
        Ok(g) => g,
        Err(e) => {
            warn!("Farming: cannot plant '{}': {}", seed.name, e);
            return;
        }
    };

    let primary = *grid.primary();
    if !primary.is_valid() {
        info!("Farming: '{}' cannot be planted here ({:?})", seed.name, primary.status);
        return;
    }

    let mut planter = FieldPlanter {
        commands: &mut commands,
        pouch: &mut pouch,
        farm: &farm,
        seed: &seed,
        free: config.free_placement,
    };
    if !planter.has_materials() {
        info!("Farming: out of '{}' seeds", seed.name);
        return;
    }
    if let Err(reason) = planter.plant(&primary, grid.rotation()) {
        warn!("Farming: primary plant failed: {}", reason);
        return;
    }
    commit_extra_cells(&grid, &mut planter);
}

// ---------- harvest ----------

/// F: pick the crop under the cursor and every ripe crop within the skill radius.
pub fn mass_harvest(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    cursor: Res<PlacementCursor>,
    skill: Res<FarmingSkill>,
    manifests: Res<Assets<FarmingManifest>>,
    handle: Res<FarmingManifestHandle>,
    objects: FieldObjects,
    mut pouch: ResMut<SeedPouch>,
) {
    if !keys.just_pressed(KeyCode::KeyF) { return; }
    let Some(anchor) = cursor.anchor else { return; };
    let Some(manifest) = manifests.get(&handle.0) else { return; };

    let snapshot = WorldSnapshot::capture(objects.iter());
    let picked = snapshot
        .entries
        .iter()
        .filter(|e| e.category.contains(CategoryMask::PICKABLE))
        .map(|e| (e, e.position.distance(anchor)))
        .filter(|(_, d)| *d <= PICK_REACH)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)))
        .map(|(e, _)| *e);
    let Some(origin) = picked else { return; };

    let radius = harvest_radius(skill.0, manifest.config.increase_harvest_amount).unwrap_or(0.0);
    let targets = plan_harvest(origin.id, origin.position, radius, &snapshot);

    let mut harvested = 0u32;
    for id in std::iter::once(origin.id).chain(targets.iter().map(|t| t.id)) {
        if let Some(e) = entity_of(id) {
            commands.entity(e).despawn();
            harvested += 1;
        }
    }
    pouch.count = pouch.count.saturating_add(harvested);
    info!("Farming: harvested {} crops (radius {:.1})", harvested, radius);
}

fn entity_of(id: ObjectId) -> Option<Entity> {
    Entity::try_from_bits(id.0).ok()
}
