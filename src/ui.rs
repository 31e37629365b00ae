use bevy::prelude::*;

use mass_plant::farming::manifest::FarmingManifest;
use mass_plant::farming::plugin::{FarmingManifestHandle, SeedPouch};
use mass_plant::farming::preview::PlantingPreview;

#[derive(Component)]
pub struct StatusText;

const HELP: &str = "LMB plant | Shift single | Q/E rotate | 1-9 seed | F harvest | WASD/RMB camera";

pub fn spawn_status_text(mut commands: Commands) {
    commands.spawn((
        Node {
            position_type: PositionType::Absolute,
            left: Val::Px(12.0),
            top: Val::Px(10.0),
            ..default()
        },
        BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.5)),
    ))
    .with_children(|parent| {
        parent.spawn((
            Text::new(HELP),
            TextFont { font_size: 16.0, ..default() },
            TextColor(Color::WHITE),
            StatusText,
        ));
    });
}

pub fn update_status_text(
    pouch: Res<SeedPouch>,
    preview: Res<PlantingPreview>,
    manifests: Res<Assets<FarmingManifest>>,
    handle: Res<FarmingManifestHandle>,
    mut text: Query<&mut Text, With<StatusText>>,
) {
    let Ok(mut text) = text.single_mut() else { return; };
    let seed = manifests
        .get(&handle.0)
        .zip(pouch.selected)
        .and_then(|(m, id)| m.get(id))
        .map_or("-", |s| s.name.as_str());
    let grid = preview.grid().map_or_else(String::new, |g| {
        format!(
            " | grid {} cells, {} valid, cost {}{}",
            g.len(),
            g.valid_count(),
            preview.total_cost(),
            g.snap.map_or(String::new(), |s| format!(", snapped {:.1} deg", s.angle_deg)),
        )
    });
    text.0 = format!("{HELP}\nseed: {seed} x{}{grid}", pouch.count);
}
