// src/farming/plugin.rs
//! Farming plugin wiring (glue).
//! - Manifest asset/loader
//! - Cursor, seed pouch and skill resources
//! - Preview recompute + ghost sync every frame, commit on click, harvest on key

use bevy::prelude::*;

use super::manifest::{FarmingManifest, FarmingManifestLoader, SeedId};
use super::preview::PlantingPreview;
use super::systems::{
    commit_planting, load_manifest, mass_harvest, monitor_manifest_ready, refresh_preview,
    select_seed, setup_farm_assets, sync_ghosts, update_cursor,
};

/// Where the manifest lives.
#[derive(Resource, Clone)]
pub struct FarmingSettings {
    pub manifest_path: String,
}
impl Default for FarmingSettings {
    fn default() -> Self {
        Self { manifest_path: "farming/default.farming.ron".to_string() }
    }
}

/// Handle to the loaded FarmingManifest asset.
#[derive(Resource, Default)]
pub struct FarmingManifestHandle(pub Handle<FarmingManifest>);

/// Farming skill as a 0..=1 factor. Leveling lives elsewhere.
#[derive(Resource, Clone, Copy, Debug)]
pub struct FarmingSkill(pub f32);
impl Default for FarmingSkill {
    fn default() -> Self { Self(1.0) }
}

/// Where the player is aiming and how the grid is turned.
#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct PlacementCursor {
    /// Terrain point under the mouse, if any.
    pub anchor: Option<Vec3>,
    /// Yaw (radians) around +Y.
    pub yaw: f32,
    /// Held to plant a single seed instead of a grid.
    pub single_plant: bool,
}

/// Selected seed and how many seeds of it the player carries.
#[derive(Resource, Clone, Copy, Debug)]
pub struct SeedPouch {
    pub selected: Option<SeedId>,
    pub count: u32,
}
impl Default for SeedPouch {
    fn default() -> Self { Self { selected: Some(SeedId(0)), count: 40 } }
}

/// Marker on preview ghosts. `PlantingPreview` maps grid indices to them.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct PlantGhost;

/// Shared meshes/materials for plants, crops and ghosts.
#[derive(Resource, Default)]
pub struct FarmAssets {
    pub plant_mesh: Handle<Mesh>,
    pub plant_material: Handle<StandardMaterial>,
    pub crop_material: Handle<StandardMaterial>,
    pub ghost_valid: Handle<StandardMaterial>,
    pub ghost_invalid: Handle<StandardMaterial>,
}

pub struct FarmingPlugin;
impl Plugin for FarmingPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<FarmingManifest>()
            .register_asset_loader(FarmingManifestLoader)
            .init_resource::<FarmingSettings>()
            .init_resource::<FarmingManifestHandle>()
            .init_resource::<FarmingSkill>()
            .init_resource::<PlacementCursor>()
            .init_resource::<SeedPouch>()
            .init_resource::<PlantingPreview>()
            .init_resource::<FarmAssets>()
            .add_systems(Startup, (load_manifest, setup_farm_assets))
            .add_systems(Update, monitor_manifest_ready)
            .add_systems(
                Update,
                (
                    update_cursor,
                    select_seed,
                    refresh_preview,
                    sync_ghosts,
                    commit_planting,
                    mass_harvest,
                )
                    .chain(),
            );
    }
}
