use bevy::prelude::*;

use mass_plant::farming::systems::setup_farm_assets;
use mass_plant::terrain::TerrainStartupSet;
use mass_plant::{FarmingPlugin, TerrainPlugin};

mod input;
mod setup;
mod ui;

use input::camera_controller;
use ui::{spawn_status_text, update_status_text};

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "mass_plant".into(),
                ..default()
            }),
            ..default()
        }))
        // domain plugins
        .add_plugins(TerrainPlugin)   // generates + meshes the field
        .add_plugins(FarmingPlugin)   // manifest, preview, planting, harvest
        // camera, lights and scenery
        .add_systems(Startup, (setup::setup, spawn_status_text))
        .add_systems(
            Startup,
            setup::scatter_field
                .in_set(TerrainStartupSet::Decor)
                .after(setup_farm_assets),
        )
        .add_systems(Update, (camera_controller, update_status_text))
        .run();
}
