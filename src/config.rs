//! Application configuration
//!
//! Loaded from, lowest to highest priority:
//! 1. `config/default.toml`
//! 2. `config/user.toml`
//! 3. Environment variables (`DIORAMA_SECTION__KEY`)
//!
//! Missing files are skipped; every field has a default.

use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub solar: SolarConfig,
    pub house: HouseConfig,
}

impl AppConfig {
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let mut figment = Figment::new();
        for file in ["default.toml", "user.toml"] {
            let path = config_dir.join(file);
            if path.exists() {
                figment = figment.merge(Toml::file(path));
            }
        }
        // DIORAMA_SOLAR__SEED=7 -> solar.seed = 7
        figment = figment.merge(Env::prefixed("DIORAMA_").split("__"));
        Ok(figment.extract()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Diorama".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Radians of orbit per pixel dragged
    pub drag_sensitivity: f32,
    /// Distance units per wheel delta unit
    pub zoom_sensitivity: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            drag_sensitivity: 0.01,
            zoom_sensitivity: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolarConfig {
    /// Fixed RNG seed; a clock-based seed is used when absent
    pub seed: Option<u32>,
    pub initial_speed: f32,
    pub max_speed: f32,
    pub speed_step: f32,
    pub star_count: u32,
    pub asteroid_count: u32,
    pub sun_particle_count: u32,
    pub nebula_texture_size: u32,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            seed: None,
            initial_speed: 1.0,
            max_speed: 5.0,
            speed_step: 0.1,
            star_count: 10_000,
            asteroid_count: 800,
            sun_particle_count: 1000,
            nebula_texture_size: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseConfig {
    /// Duration of a full open or close swing
    pub transition_seconds: f32,
}

impl Default for HouseConfig {
    fn default() -> Self {
        Self {
            transition_seconds: 1.0,
        }
    }
}

#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[source] Box<figment::Error>);

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_match_the_shipped_scenes() {
        let config = AppConfig::default();
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.solar.star_count, 10_000);
        assert_eq!(config.solar.max_speed, 5.0);
        assert_eq!(config.house.transition_seconds, 1.0);
        assert!(config.solar.seed.is_none());
    }

    #[test]
    fn serializes_every_section() {
        let text = toml::to_string(&AppConfig::default()).unwrap();
        for section in ["[window]", "[camera]", "[solar]", "[house]"] {
            assert!(text.contains(section), "missing {section}");
        }
    }

    #[test]
    #[serial]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            "[solar]\nstar_count = 500\nasteroid_count = 20\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("user.toml"), "[solar]\nstar_count = 42\n").unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.solar.star_count, 42);
        assert_eq!(config.solar.asteroid_count, 20);
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    #[serial]
    fn environment_overrides_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.toml"), "[solar]\nseed = 3\n").unwrap();
        std::env::set_var("DIORAMA_SOLAR__SEED", "99");
        let config = AppConfig::load_from(dir.path());
        std::env::remove_var("DIORAMA_SOLAR__SEED");
        assert_eq!(config.unwrap().solar.seed, Some(99));
    }

    #[test]
    #[serial]
    fn missing_directory_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("absent")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    #[serial]
    fn malformed_value_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.toml"), "[house]\ntransition_seconds = \"slow\"\n")
            .unwrap();
        assert!(AppConfig::load_from(dir.path()).is_err());
    }
}
