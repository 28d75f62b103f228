use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::PitwallError;
use crate::plotting::{DEFAULT_FIGURE_HEIGHT, DEFAULT_FIGURE_WIDTH};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_RAINFALL_THRESHOLD_MM: f32 = 0.1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the session cache location
    pub cache_dir: Option<PathBuf>,
    pub figure_width: u32,
    pub figure_height: u32,
    /// Laps with at least this much rain (mm) are highlighted
    pub rainfall_threshold_mm: f32,
    /// Default directory for exported figures
    pub output_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            figure_width: DEFAULT_FIGURE_WIDTH,
            figure_height: DEFAULT_FIGURE_HEIGHT,
            rainfall_threshold_mm: DEFAULT_RAINFALL_THRESHOLD_MM,
            output_dir: None,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf, PitwallError> {
        Ok(dirs::config_dir()
            .ok_or(PitwallError::NoConfigDir)?
            .join("pitwall")
            .join(CONFIG_FILE_NAME))
    }

    /// Reads the user's config file, `None` when there isn't one yet
    pub fn from_local_file() -> Result<Option<Self>, PitwallError> {
        Self::from_file(&Self::config_path()?)
    }

    pub fn from_file(config_path: &Path) -> Result<Option<Self>, PitwallError> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        let config = serde_json::from_reader(file)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })?;
        Ok(Some(config))
    }

    pub fn save(&self) -> Result<(), PitwallError> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<(), PitwallError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| PitwallError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| PitwallError::ConfigSerializeError { source: e })
    }

    pub fn figure_size(&self) -> (u32, u32) {
        (self.figure_width, self.figure_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::from_file(&temp_dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            cache_dir: Some(PathBuf::from("/tmp/f1cache")),
            figure_width: 1200,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{"rainfall_threshold_mm": 0.5}"#).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap().unwrap();
        assert_eq!(loaded.rainfall_threshold_mm, 0.5);
        assert_eq!(loaded.figure_width, DEFAULT_FIGURE_WIDTH);
        assert!(loaded.cache_dir.is_none());
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(PitwallError::ConfigSerializeError { .. })
        ));
    }
}
