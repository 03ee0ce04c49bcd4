//! Scene configuration. Loaded from `config.ron` at startup.
//!
//! Every section and field has a default, so a file only needs the values it
//! changes.

use crate::craft::CraftSettings;
use crate::turbo::TurboSettings;
use glam::Vec3;
use input::{ActivationMode, PointerMapping};
use procgen::StarfieldSettings;
use renderer::{CameraPose, CameraRigSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.ron";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlightConfig {
    #[serde(default)]
    pub turbo: TurboSettings,
    #[serde(default)]
    pub craft: CraftSettings,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub starfield: StarfieldConfig,
    #[serde(default)]
    pub reflection: ReflectionConfig,
    #[serde(default)]
    pub input: InputConfig,
}

/// One camera framing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    pub position: Vec3,
    pub look_at: Vec3,
    pub fov_degrees: f32,
}

impl From<CameraPose> for PoseConfig {
    fn from(pose: CameraPose) -> Self {
        Self {
            position: pose.position,
            look_at: pose.look_at,
            fov_degrees: pose.fov_degrees,
        }
    }
}

impl From<PoseConfig> for CameraPose {
    fn from(pose: PoseConfig) -> Self {
        Self {
            position: pose.position,
            look_at: pose.look_at,
            fov_degrees: pose.fov_degrees,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub cruise: PoseConfig,
    pub boost: PoseConfig,
    /// Per-frame position blend.
    pub position_ease: f32,
    /// Per-frame FOV blend.
    pub fov_ease: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let rig = CameraRigSettings::default();
        Self {
            cruise: rig.cruise.into(),
            boost: rig.boost.into(),
            position_ease: rig.position_ease,
            fov_ease: rig.fov_ease,
            near: rig.near,
            far: rig.far,
        }
    }
}

impl CameraConfig {
    pub fn rig_settings(&self) -> CameraRigSettings {
        CameraRigSettings {
            cruise: self.cruise.into(),
            boost: self.boost.into(),
            position_ease: self.position_ease.clamp(0.0, 1.0),
            fov_ease: self.fov_ease.clamp(0.0, 1.0),
            near: self.near,
            far: self.far,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub count: usize,
    pub seed: u64,
    /// Streaks past this x are recycled.
    pub out_of_view_x: f32,
    /// Extra per-frame x displacement at full turbo.
    pub turbo_boost_factor: f32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        let s = StarfieldSettings::default();
        Self {
            count: s.count,
            seed: s.seed,
            out_of_view_x: s.out_of_view_x,
            turbo_boost_factor: s.turbo_boost_factor,
        }
    }
}

impl StarfieldConfig {
    pub fn settings(&self) -> StarfieldSettings {
        StarfieldSettings {
            count: self.count,
            seed: self.seed,
            out_of_view_x: self.out_of_view_x,
            turbo_boost_factor: self.turbo_boost_factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionConfig {
    /// Environment map intensity applied to the craft material.
    pub intensity: f32,
}

impl Default for ReflectionConfig {
    fn default() -> Self {
        Self { intensity: 1.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub activation: ActivationMode,
    pub pointer: PointerMapping,
}

impl FlightConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match Self::from_ron(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    pub fn from_ron(data: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(data)
    }

    /// Save current config to `config.ron`. Logs on error.
    pub fn save(&self) {
        self.save_to(&config_path());
    }

    pub fn save_to(&self, path: &Path) {
        match ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()) {
            Ok(s) => {
                if let Err(e) = std::fs::write(path, s) {
                    log::warn!("Could not write config to {:?}: {}", path, e);
                }
            }
            Err(e) => log::warn!("Could not serialize config: {}", e),
        }
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(CONFIG_FILE)
}
