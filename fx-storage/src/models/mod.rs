mod config_entry;
mod config_map;

pub use config_entry::ConfigEntry;
pub use config_map::ConfigMap;
