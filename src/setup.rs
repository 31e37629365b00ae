use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mass_plant::farming::plugin::FarmAssets;
use mass_plant::farming::snapshot::FieldObject;
use mass_plant::{CategoryMask, HeightField};

use crate::input::CameraOrbit;

#[derive(Component)]
pub struct MainCamera;

/// Seed for the scattered scenery.
pub const SCENE_SEED: u64 = 1337;

pub fn setup(mut commands: Commands) {
    // 1) Light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(8.0, 16.0, 6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-2.5, 12.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
        CameraOrbit {
            focus: Vec3::ZERO,
            radius: 18.0,
            yaw: 1.2,
            pitch: 0.9,
        },
    ));
}

/// Rocks around the tilled patch, a bed of ripe crops and a crooked row of
/// seedlings to snap against.
pub fn scatter_field(
    mut commands: Commands,
    field: Res<HeightField>,
    farm: Res<FarmAssets>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut rng = ChaCha8Rng::seed_from_u64(SCENE_SEED);
    let ground = |x: f32, z: f32| field.sample_height(x, z).map(|y| Vec3::new(x, y, z));

    let rock_mesh = meshes.add(Cuboid::new(1.0, 0.6, 1.0));
    let rock_material = materials.add(Color::srgb(0.45, 0.45, 0.48));
    let mut rocks = 0;
    while rocks < 24 {
        let x: f32 = rng.random_range(-20.0..20.0);
        let z: f32 = rng.random_range(-20.0..20.0);
        if f32::max(x.abs(), z.abs()) < 7.0 { continue; }
        let Some(p) = ground(x, z) else { continue; };
        let radius: f32 = rng.random_range(0.6..1.2);
        commands.spawn((
            Name::new("Rock"),
            Mesh3d(rock_mesh.clone()),
            MeshMaterial3d(rock_material.clone()),
            Transform::from_translation(p)
                .with_rotation(Quat::from_rotation_y(rng.random_range(0.0..std::f32::consts::TAU)))
                .with_scale(Vec3::splat(radius * 2.0)),
            FieldObject { category: CategoryMask::SOLID, radius },
        ));
        rocks += 1;
    }

    for ix in 0..4 {
        for iz in 0..3 {
            let Some(p) = ground(-5.0 + ix as f32, 2.0 + iz as f32) else { continue; };
            commands.spawn((
                Name::new("Ripe carrot"),
                Mesh3d(farm.plant_mesh.clone()),
                MeshMaterial3d(farm.crop_material.clone()),
                Transform::from_translation(p),
                FieldObject { category: CategoryMask::PLANT | CategoryMask::PICKABLE, radius: 0.5 },
            ));
        }
    }

    // Seedlings slightly off any axis-aligned lattice
    let row = Quat::from_rotation_y(12f32.to_radians());
    for i in 0..5 {
        let offset = row * Vec3::new(i as f32, 0.0, 0.0);
        let Some(p) = ground(0.3 + offset.x, -3.0 + offset.z) else { continue; };
        commands.spawn((
            Name::new("Seedling"),
            Mesh3d(farm.plant_mesh.clone()),
            MeshMaterial3d(farm.plant_material.clone()),
            Transform::from_translation(p).with_rotation(row),
            FieldObject { category: CategoryMask::PLANT, radius: 0.5 },
        ));
    }
    info!("Scene: scattered {} rocks, crops and seedlings (seed {})", rocks, SCENE_SEED);
}
