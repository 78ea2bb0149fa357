use std::fs;
use std::path::{Path, PathBuf};

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::tool::ToolState;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV_VAR: &str = "SKETCH_STUDIO_CONFIG";

/// Settings for a canvas and its host.
///
/// Missing fields fall back to their defaults, so a partial file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SketchConfig {
    /// Snapshots kept for undo, including the current one
    pub history_limit: usize,
    /// Key of the single persisted snapshot
    pub storage_key: String,
    /// File backing the key-value store on native targets
    pub storage_path: PathBuf,
    /// Persist every commit
    pub autosave: bool,
    pub export_filename: String,
    /// Where native exports are written
    pub export_dir: PathBuf,
    /// Upper bound on display density used for the raster buffer
    pub max_pixels_per_point: f32,
    /// What the eraser paints with
    pub eraser_color: Color32,
    /// Tool settings at startup; never persisted
    pub tool: ToolState,
}

impl Default for SketchConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            storage_key: "sketch_studio_v1".to_owned(),
            storage_path: PathBuf::from("sketch_studio_store.json"),
            autosave: true,
            export_filename: "sketch-art.png".to_owned(),
            export_dir: PathBuf::from("."),
            max_pixels_per_point: 2.0,
            eraser_color: Color32::WHITE,
            tool: ToolState::default(),
        }
    }
}

impl SketchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Load from the file named by `SKETCH_STUDIO_CONFIG`, or use defaults.
    /// A broken file is logged and ignored.
    pub fn from_env() -> Self {
        let Some(path) = std::env::var_os(CONFIG_ENV_VAR) else {
            return Self::default();
        };
        let path = PathBuf::from(path);
        match Self::load(&path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                log::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SketchConfig =
            serde_json::from_str(r#"{ "history_limit": 10, "autosave": false }"#).unwrap();
        assert_eq!(config.history_limit, 10);
        assert!(!config.autosave);
        assert_eq!(config.storage_key, "sketch_studio_v1");
        assert_eq!(config.max_pixels_per_point, 2.0);
    }

    #[test]
    fn test_load_reports_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert!(matches!(SketchConfig::load(&path), Err(ConfigError::Read(_))));

        fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(SketchConfig::load(&path), Err(ConfigError::Parse(_))));
    }
}
