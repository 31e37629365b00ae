pub mod core;
pub mod placement;
pub mod manifest;
pub mod commit;
pub mod harvest;
pub mod preview;
pub mod snapshot;
pub mod plugin;
pub mod systems;

pub use plugin::FarmingPlugin;
