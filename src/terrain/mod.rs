pub mod height_field;
pub mod mesh;
mod plugin;

pub use height_field::HeightField;
pub use plugin::{rolling_hills, FieldSettings, TerrainPlugin, TerrainStartupSet};
