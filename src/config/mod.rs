pub mod known_cars;
pub mod link_config;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::fs;

pub use crate::config::known_cars::KnownCar;
pub use crate::config::link_config::LinkConfig;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_DIR_NAME: &str = "revcar";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub link: LinkConfig,
    /// Cars appended to every scan result, reachable without being seen.
    pub known_cars: Vec<KnownCar>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            link: LinkConfig::default(),
            known_cars: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Where the config lives when no explicit path is given.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("No user config directory on this platform"))?;
        Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Loads the config from a configuration file.
    ///
    /// A missing file is not an error; the defaults cover first runs.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let file_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        let file_path_str = file_path.to_string_lossy().into_owned();

        if !file_path.exists() {
            warn!(
                "Config file not found at {:?}, using default.",
                file_path_str
            );
            return Ok(Self::default());
        }

        let config_json = fs::read_to_string(file_path).await?;
        let config: Self = serde_json::from_str(&config_json)?;

        info!("Config loaded from {:?}", file_path_str);
        Ok(config)
    }

    /// Saves the current config to a configuration file.
    pub async fn save(&self, path: Option<&Path>) -> Result<()> {
        let file_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file_path_str = file_path.to_string_lossy().into_owned();

        let config_json = match serde_json::to_string_pretty(&self) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize config to JSON: {}", e);
                return Err(e.into());
            }
        };

        fs::write(file_path, config_json).await?;

        info!("Config saved to {:?}.", file_path_str);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::commands::IntensityPolicy;
    use crate::core::bluetooth::constants::DEFAULT_CONTROL_HANDLE;

    #[test]
    fn empty_json_yields_the_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.link.control_handle, DEFAULT_CONTROL_HANDLE);
        assert_eq!(config.link.intensity_policy, IntensityPolicy::Drop);
        assert!(config.known_cars.is_empty());
    }

    #[test]
    fn partial_link_overrides_keep_the_other_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "link": { "control_handle": 42, "intensity_policy": "Clamp" } }"#,
        )
        .unwrap();
        assert_eq!(config.link.control_handle, 42);
        assert_eq!(config.link.intensity_policy, IntensityPolicy::Clamp);
        assert_eq!(config.link.scan_timeout_secs, 10);
    }

    #[test]
    fn known_cars_round_trip_through_json() {
        let config: AppConfig = serde_json::from_str(
            r#"{ "known_cars": [ { "name": "Garage car", "address": "AA:BB:CC:DD:EE:99" } ] }"#,
        )
        .unwrap();
        assert_eq!(config.known_cars.len(), 1);
        assert_eq!(config.known_cars[0].address, "AA:BB:CC:DD:EE:99");

        let json = serde_json::to_string(&config).unwrap();
        let reparsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(reparsed.known_cars, config.known_cars);
    }

    #[tokio::test]
    async fn save_then_load_preserves_the_config() {
        let path = std::env::temp_dir().join(format!(
            "revcar-config-test-{}.json",
            std::process::id()
        ));

        let mut config = AppConfig::default();
        config.link.control_handle = 0x0021;
        config.known_cars.push(KnownCar {
            name: "Garage car".to_string(),
            address: "AA:BB:CC:DD:EE:99".to_string(),
        });
        config.save(Some(path.as_path())).await.unwrap();

        let loaded = AppConfig::load(Some(path.as_path())).await.unwrap();
        assert_eq!(loaded.link.control_handle, 0x0021);
        assert_eq!(loaded.known_cars, config.known_cars);

        let _ = fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn a_missing_file_loads_as_the_defaults() {
        let path = std::env::temp_dir().join("revcar-config-test-no-such-file.json");
        let loaded = AppConfig::load(Some(path.as_path())).await.unwrap();
        assert_eq!(loaded.link.control_handle, DEFAULT_CONTROL_HANDLE);
        assert!(loaded.known_cars.is_empty());
    }
}
