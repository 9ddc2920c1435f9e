use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;

/// Engine settings, read from a RON file. Missing fields take their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    pub fov_degrees: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub camera_speed_kmh: f32,
    /// Radians per second.
    pub rotation_speed: f32,
    /// Degrees per second.
    pub fov_speed: f32,
    pub fov_min: f32,
    pub fov_max: f32,
    /// Side of the quadtree root tile, centred on the origin.
    pub quadtree_size: i32,
    pub quadtree_depth: u32,
    /// Vertical extent quadtree tiles are extruded through for culling.
    pub tile_min_y: f32,
    pub tile_max_y: f32,
    /// Rasterizer threads, 0 for one per logical core.
    pub threads: usize,
    pub clear_color: [u8; 4],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fov_degrees: 90.0,
            z_near: 0.1,
            z_far: 10.0,
            camera_speed_kmh: 5.0,
            rotation_speed: 1.0,
            fov_speed: 30.0,
            fov_min: 10.0,
            fov_max: 150.0,
            quadtree_size: 1024,
            quadtree_depth: 8,
            tile_min_y: -100.0,
            tile_max_y: 100.0,
            threads: 0,
            clear_color: [0, 0, 0, 255],
        }
    }
}

impl EngineConfig {
    pub fn from_ron(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).context("failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).context("failed to serialize engine config")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_ron(&text).with_context(|| format!("in config {}", path.display()))
    }

    /// Like [`EngineConfig::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("resolution must be non-zero, got {}x{}", self.width, self.height);
        }
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            bail!("fov must be in (0, 180) degrees, got {}", self.fov_degrees);
        }
        if !(self.fov_min > 0.0 && self.fov_min <= self.fov_max && self.fov_max < 180.0) {
            bail!("invalid fov range [{}, {}]", self.fov_min, self.fov_max);
        }
        if !(self.z_near > 0.0) {
            bail!("near plane must be positive, got {}", self.z_near);
        }
        if self.z_near >= self.z_far {
            bail!("near plane {} must be closer than far plane {}", self.z_near, self.z_far);
        }
        if self.quadtree_size <= 0 || self.quadtree_depth == 0 {
            bail!("quadtree needs a positive size and depth");
        }
        if self.tile_min_y >= self.tile_max_y {
            bail!("tile vertical extent [{}, {}] is empty", self.tile_min_y, self.tile_max_y);
        }
        if self.camera_speed_kmh < 0.0 || self.rotation_speed < 0.0 || self.fov_speed < 0.0 {
            bail!("speeds must not be negative");
        }
        Ok(())
    }

    /// A camera at the origin with this config's viewport and clip planes.
    pub fn camera(&self) -> Camera {
        Camera::new(self.width, self.height, self.fov_degrees, self.z_near, self.z_far)
    }

    /// Camera speed in units (metres) per second.
    pub fn camera_speed(&self) -> f32 {
        self.camera_speed_kmh / 3.6
    }
}
