use bevy::prelude::*;

use crate::terrain::height_field::HeightField;
use crate::terrain::mesh::build_field_mesh;

/// Startup ordering so anything placed on the ground waits for the field.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum TerrainStartupSet {
    Load,   // HeightField resource
    Decor,  // mesh + whatever sits on the terrain
}

/// Shape of the generated field.
#[derive(Resource, Clone, Debug)]
pub struct FieldSettings {
    /// Side length in world units; the field is centered on the origin.
    pub extent: f32,
    pub cell_size: f32,
    /// Peak height of the rolling hills.
    pub relief: f32,
    /// Half-size of the tilled patch around the origin.
    pub tilled_half_extent: f32,
}

impl Default for FieldSettings {
    fn default() -> Self {
        Self { extent: 64.0, cell_size: 0.5, relief: 1.5, tilled_half_extent: 6.0 }
    }
}

/// Gentle hills that stay flat near the origin so the tilled patch is level.
pub fn rolling_hills(relief: f32) -> impl Fn(f32, f32) -> f32 {
    move |x, z| {
        let falloff = ((x * x + z * z).sqrt() / 16.0).min(1.0);
        let wave = (x * 0.21).sin() * (z * 0.17).cos() + 0.5 * (x * 0.07 + z * 0.11).sin();
        (wave * 0.5 + 0.75) * relief * falloff
    }
}

pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<FieldSettings>()
            .configure_sets(
                Startup,
                (
                    TerrainStartupSet::Load,
                    TerrainStartupSet::Decor.after(TerrainStartupSet::Load),
                ),
            )
            .add_systems(Startup, generate_field.in_set(TerrainStartupSet::Load))
            .add_systems(Startup, spawn_field_mesh.in_set(TerrainStartupSet::Decor));
    }
}

fn generate_field(mut commands: Commands, settings: Res<FieldSettings>) {
    let half = settings.extent * 0.5;
    let samples = (settings.extent / settings.cell_size).round() as u32 + 1;
    let mut field = HeightField::from_fn(
        Vec2::splat(-half),
        settings.cell_size,
        UVec2::splat(samples),
        rolling_hills(settings.relief),
    );
    let t = settings.tilled_half_extent;
    field.till_rect(Vec2::splat(-t), Vec2::splat(t));
    info!(
        "Terrain: {}x{} samples over {:.0}m, tilled patch {:.0}m wide",
        samples, samples, settings.extent, t * 2.0
    );
    commands.insert_resource(field);
}

fn spawn_field_mesh(
    mut commands: Commands,
    field: Res<HeightField>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Name::new("Field"),
        Mesh3d(meshes.add(build_field_mesh(&field))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::WHITE,
            perceptual_roughness: 0.95,
            ..default()
        })),
        Transform::IDENTITY,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farming::core::TerrainSampler;
    use bevy::ecs::system::RunSystemOnce;

    #[test]
    fn startup_inserts_a_tilled_field() {
        let mut world = World::new();
        world.insert_resource(FieldSettings::default());
        world.run_system_once(generate_field).unwrap();

        let field = world.resource::<HeightField>();
        assert_eq!(field.res, UVec2::splat(129));
        assert_eq!(field.sample_height(0.0, 0.0), Some(0.0));
        assert!(field.is_cultivated(1.0, -2.0));
        assert!(!field.is_cultivated(20.0, 20.0));
    }
}
