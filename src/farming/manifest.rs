// src/farming/manifest.rs
//! Data-driven farming settings + seed catalog, loaded from `*.farming.ron`.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::core::{GridTuning, PlantingError};

// ---------- Settings (data form) ----------

/// Read-only knobs for planting and harvesting.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FarmingConfig {
    /// Skill percent per extra grid step. 0 disables mass planting.
    #[serde(default = "default_increase_amount")]
    pub increase_plant_amount: u32,
    /// Skill percent per extra harvest step. 0 disables mass harvesting.
    #[serde(default = "default_increase_amount")]
    pub increase_harvest_amount: u32,
    #[serde(default)]
    pub tuning: GridTuning,
    #[serde(default = "default_true")]
    pub snapping: bool,
    #[serde(default = "default_true")]
    pub mass_mode: bool,
    /// Skip the resource check entirely (creative mode).
    #[serde(default)]
    pub free_placement: bool,
}

impl Default for FarmingConfig {
    fn default() -> Self {
        Self {
            increase_plant_amount: default_increase_amount(),
            increase_harvest_amount: default_increase_amount(),
            tuning: GridTuning::default(),
            snapping: true,
            mass_mode: true,
            free_placement: false,
        }
    }
}

fn default_increase_amount() -> u32 {
    20
}
fn default_true() -> bool {
    true
}

// ---------- Density mapping ----------

/// Grid size for a skill level: `1 + floor(skill * k) / 2` wide and
/// `1 + floor(min(skill, 0.999) * k + 1) / 2` high, with `k = 100 / step`.
/// `None` when `increase_plant_amount` is 0.
pub fn grid_dimensions(skill_factor: f32, increase_plant_amount: u32) -> Option<(u32, u32)> {
    if increase_plant_amount == 0 {
        return None;
    }
    let skill = if skill_factor.is_finite() { skill_factor.clamp(0.0, 1.0) } else { 0.0 };
    let k = 100.0 / increase_plant_amount as f32;
    let width = 1 + (skill * k).floor() as u32 / 2;
    let height = 1 + (skill.min(0.999) * k + 1.0).floor() as u32 / 2;
    Some((width, height))
}

// ---------- Seeds (data form) ----------

/// One plantable seed and its single resource requirement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SeedDef {
    /// Unique human-readable name (used for lookup).
    pub name: String,
    /// Clearance a growing plant needs (meters).
    pub footprint_radius: f32,
    #[serde(default)]
    pub cultivated_only: bool,
    /// Items consumed per plant.
    #[serde(default = "default_cost")]
    pub cost: u32,
}

fn default_cost() -> u32 {
    1
}

/// Index of a seed in the manifest (stable during a session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeedId(pub u32);

/// File form of the manifest.
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    config: FarmingConfig,
    seeds: Vec<SeedDef>,
}

// ---------- Runtime manifest asset ----------

#[derive(Asset, TypePath, Clone, Debug)]
pub struct FarmingManifest {
    pub config: FarmingConfig,
    /// Ordered list; index in this vector is the `SeedId.0`.
    pub seeds: Vec<SeedDef>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, u32>,
}

impl FarmingManifest {
    pub fn index_of(&self, name: &str) -> Option<SeedId> {
        self.name_to_index.get(name).map(|&i| SeedId(i))
    }

    pub fn get(&self, id: SeedId) -> Option<&SeedDef> {
        self.seeds.get(id.0 as usize)
    }
}

/// Parse and validate manifest bytes (RON).
pub fn parse_manifest(bytes: &[u8]) -> Result<FarmingManifest, ManifestLoadError> {
    let file: ManifestFile =
        ron::de::from_bytes(bytes).map_err(|e| ManifestLoadError::Ron(e.to_string()))?;
    file.config.tuning.validate()?;

    let mut name_to_index = HashMap::with_capacity(file.seeds.len());
    for (i, seed) in file.seeds.iter().enumerate() {
        if !(seed.footprint_radius.is_finite() && seed.footprint_radius > 0.0) {
            return Err(PlantingError::InvalidFootprint(seed.footprint_radius).into());
        }
        if let Some(prev) = name_to_index.insert(seed.name.clone(), i as u32) {
            return Err(ManifestLoadError::DuplicateName {
                name: seed.name.clone(),
                first: prev,
                second: i as u32,
            });
        }
    }

    Ok(FarmingManifest { config: file.config, seeds: file.seeds, name_to_index })
}

// ---------- Asset loader for `.farming.ron` ----------

#[derive(Default)]
pub struct FarmingManifestLoader;

impl AssetLoader for FarmingManifestLoader {
    type Asset = FarmingManifest;
    type Settings = ();
    type Error = ManifestLoadError;

    fn extensions(&self) -> &[&str] {
        &["farming.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        parse_manifest(&bytes)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum ManifestLoadError {
    #[error("I/O while reading farming manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate seed name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
    #[error("Invalid farming setting: {0}")]
    Invalid(#[from] PlantingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"(
        config: (
            increase_plant_amount: 25,
            tuning: (spacing_multiplier: 1.0, snap_search_multiplier: 1.5, snap_tie_break_scale: 0.001),
        ),
        seeds: [
            (name: "carrot", footprint_radius: 0.5, cultivated_only: true),
            (name: "sapling", footprint_radius: 2.0, cost: 3),
        ],
    )"#;

    #[test]
    fn parses_manifest_with_defaults() {
        let m = parse_manifest(MANIFEST.as_bytes()).unwrap();
        assert_eq!(m.config.increase_plant_amount, 25);
        assert_eq!(m.config.increase_harvest_amount, 20);
        assert!(m.config.snapping && m.config.mass_mode);

        let carrot = m.get(m.index_of("carrot").unwrap()).unwrap();
        assert!(carrot.cultivated_only);
        assert_eq!(carrot.cost, 1);
        assert_eq!(m.get(SeedId(1)).unwrap().cost, 3);
        assert!(m.index_of("turnip").is_none());
    }

    #[test]
    fn shipped_manifest_parses() {
        let m = parse_manifest(include_bytes!("../../assets/farming/default.farming.ron")).unwrap();
        assert_eq!(m.config, FarmingConfig::default());
        assert_eq!(m.index_of("carrot"), Some(SeedId(0)));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let src = r#"(seeds: [(name: "a", footprint_radius: 0.5), (name: "a", footprint_radius: 1.0)])"#;
        let err = parse_manifest(src.as_bytes()).unwrap_err();
        assert!(matches!(err, ManifestLoadError::DuplicateName { first: 0, second: 1, .. }));
    }

    #[test]
    fn bad_values_are_rejected() {
        let src = r#"(seeds: [(name: "a", footprint_radius: 0.0)])"#;
        assert!(matches!(parse_manifest(src.as_bytes()), Err(ManifestLoadError::Invalid(_))));

        let src = r#"(config: (tuning: (spacing_multiplier: -1.0, snap_search_multiplier: 1.5, snap_tie_break_scale: 0.0)), seeds: [])"#;
        assert!(matches!(parse_manifest(src.as_bytes()), Err(ManifestLoadError::Invalid(_))));

        assert!(matches!(parse_manifest(b"(seeds: [oops])"), Err(ManifestLoadError::Ron(_))));
    }

    #[test]
    fn grid_grows_with_skill() {
        assert_eq!(grid_dimensions(0.0, 20), Some((1, 1)));
        assert_eq!(grid_dimensions(0.2, 20), Some((1, 2)));
        assert_eq!(grid_dimensions(0.4, 20), Some((2, 2)));
        assert_eq!(grid_dimensions(0.6, 20), Some((2, 3)));
        assert_eq!(grid_dimensions(1.0, 20), Some((3, 3)));
        assert_eq!(grid_dimensions(1.0, 10), Some((6, 6)));
        assert_eq!(grid_dimensions(0.5, 0), None);
    }
}
