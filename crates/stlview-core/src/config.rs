//! Viewer configuration constants
//!
//! Every number the viewer uses to build its scene lives here so embedding
//! pages can tune framing, lighting and helpers without rebuilding. Any
//! field missing from a supplied document falls back to its default.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::size::Size;

/// Top-level configuration shared by every viewer on a page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// CSS selector identifying host elements
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Size used when the host element reports no layout
    #[serde(default = "default_fallback_size")]
    pub fallback_size: Size,
    /// Maximum log level for the browser console (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub framing: FramingConfig,
    #[serde(default)]
    pub lights: LightsConfig,
    #[serde(default)]
    pub helpers: HelpersConfig,
    #[serde(default)]
    pub material: MaterialConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            fallback_size: default_fallback_size(),
            log_level: default_log_level(),
            camera: CameraConfig::default(),
            framing: FramingConfig::default(),
            lights: LightsConfig::default(),
            helpers: HelpersConfig::default(),
            material: MaterialConfig::default(),
            renderer: RendererConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse a (possibly partial) JSON configuration document
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = serde_json::from_str(content)?;
        debug!(selector = %config.selector, "Parsed viewer configuration");
        Ok(config)
    }
}

fn default_selector() -> String {
    ".stl-viewer".to_string()
}

fn default_fallback_size() -> Size {
    Size::new(800.0, 500.0)
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Perspective camera parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_deg: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    /// Camera position before a mesh has been framed
    #[serde(default = "default_initial_position")]
    pub initial_position: [f32; 3],
    /// Smooth orbit motion with inertia
    #[serde(default = "default_true")]
    pub enable_damping: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_deg: default_fov(),
            near: default_near(),
            far: default_far(),
            initial_position: default_initial_position(),
            enable_damping: true,
        }
    }
}

fn default_fov() -> f32 {
    50.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    2000.0
}

fn default_initial_position() -> [f32; 3] {
    [120.0, 90.0, 120.0]
}

fn default_true() -> bool {
    true
}

/// Which model axis points up in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpAxis {
    #[default]
    Y,
    Z,
}

impl UpAxis {
    /// Parse an attribute value ("y" or "z", case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "y" => Some(UpAxis::Y),
            "z" => Some(UpAxis::Z),
            _ => None,
        }
    }

    /// Rotation bringing this axis onto the scene's +Y
    pub fn rotation(self) -> Quat {
        match self {
            UpAxis::Y => Quat::IDENTITY,
            UpAxis::Z => Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2),
        }
    }
}

/// Mesh normalization and camera framing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramingConfig {
    /// Largest mesh dimension after normalization
    #[serde(default = "default_reference_size")]
    pub reference_size: f32,
    /// Camera distance as a multiple of `reference_size`
    #[serde(default = "default_distance_factor")]
    pub distance_factor: f32,
    /// Camera height as a fraction of its distance
    #[serde(default = "default_elevation_ratio")]
    pub elevation_ratio: f32,
    #[serde(default)]
    pub up_axis: UpAxis,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            reference_size: default_reference_size(),
            distance_factor: default_distance_factor(),
            elevation_ratio: default_elevation_ratio(),
            up_axis: UpAxis::default(),
        }
    }
}

impl FramingConfig {
    /// Camera position used once a mesh has been normalized
    pub fn camera_position(&self) -> Vec3 {
        let distance = self.distance_factor * self.reference_size;
        Vec3::new(distance, distance * self.elevation_ratio, distance)
    }
}

fn default_reference_size() -> f32 {
    100.0
}

fn default_distance_factor() -> f32 {
    2.2
}

fn default_elevation_ratio() -> f32 {
    0.75
}

/// Scene lighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightsConfig {
    #[serde(default = "default_white")]
    pub sky_color: u32,
    #[serde(default = "default_ground_color")]
    pub ground_color: u32,
    #[serde(default = "default_intensity")]
    pub hemisphere_intensity: f32,
    #[serde(default = "default_white")]
    pub directional_color: u32,
    #[serde(default = "default_intensity")]
    pub directional_intensity: f32,
    #[serde(default = "default_directional_position")]
    pub directional_position: [f32; 3],
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            sky_color: default_white(),
            ground_color: default_ground_color(),
            hemisphere_intensity: default_intensity(),
            directional_color: default_white(),
            directional_intensity: default_intensity(),
            directional_position: default_directional_position(),
        }
    }
}

fn default_white() -> u32 {
    0xffffff
}

fn default_ground_color() -> u32 {
    0x444444
}

fn default_intensity() -> f32 {
    0.7
}

fn default_directional_position() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

/// Grid and axis reference helpers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpersConfig {
    #[serde(default = "default_grid_size")]
    pub grid_size: f32,
    #[serde(default = "default_grid_divisions")]
    pub grid_divisions: u32,
    #[serde(default = "default_grid_center_color")]
    pub grid_center_color: u32,
    #[serde(default = "default_grid_line_color")]
    pub grid_line_color: u32,
    /// Vertical offset keeping the grid from z-fighting with mesh faces at y=0
    #[serde(default = "default_grid_offset")]
    pub grid_offset: f32,
    #[serde(default = "default_axes_size")]
    pub axes_size: f32,
}

impl Default for HelpersConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            grid_divisions: default_grid_divisions(),
            grid_center_color: default_grid_center_color(),
            grid_line_color: default_grid_line_color(),
            grid_offset: default_grid_offset(),
            axes_size: default_axes_size(),
        }
    }
}

fn default_grid_size() -> f32 {
    200.0
}

fn default_grid_divisions() -> u32 {
    20
}

fn default_grid_center_color() -> u32 {
    0x888888
}

fn default_grid_line_color() -> u32 {
    0xdddddd
}

fn default_grid_offset() -> f32 {
    -0.01
}

fn default_axes_size() -> f32 {
    60.0
}

/// Phong material applied to the loaded mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialConfig {
    #[serde(default = "default_specular")]
    pub specular: u32,
    #[serde(default = "default_shininess")]
    pub shininess: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            specular: default_specular(),
            shininess: default_shininess(),
        }
    }
}

fn default_specular() -> u32 {
    0x111111
}

fn default_shininess() -> f32 {
    60.0
}

/// Renderer surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Upper bound for the device pixel ratio (None = use the device ratio)
    #[serde(default)]
    pub pixel_ratio_cap: Option<f64>,
    /// Request an antialiased context
    #[serde(default = "default_true")]
    pub antialias: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            pixel_ratio_cap: None,
            antialias: default_true(),
        }
    }
}
