//! Scene assembly and mesh normalization
//!
//! Builds the render graph that exists before any mesh arrives: camera,
//! renderer, orbit controls, lights and the optional grid and axis helpers.
//! Construction only; nothing here touches the host element or the network.

use glam::{Quat, Vec3};
use tracing::debug;

use crate::config::{FramingConfig, HelpersConfig, UpAxis, ViewerConfig};
use crate::error::ViewerError;
use crate::options::{Rgb, ViewerOptions};
use crate::platform::{NavigationControls, RenderEngine, Renderer, SceneGraph};
use crate::size::Size;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

/// Transform applied to a loaded mesh (translation, then rotation, then scale)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
}

impl Placement {
    /// Center `bounds` on the origin and scale its largest side to
    /// `framing.reference_size`
    pub fn normalize(bounds: &Aabb, framing: &FramingConfig, up_axis: UpAxis) -> Self {
        let max_dim = bounds.max_dimension();
        let scale = framing.reference_size / if max_dim > 0.0 { max_dim } else { 1.0 };
        let rotation = up_axis.rotation();
        let position = -(rotation * (bounds.center() * scale));

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Where a model-space point ends up in the scene
    pub fn apply(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * (point * self.scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraSpec {
    pub fov_deg: f32,
    pub aspect: f64,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererSpec {
    pub size: Size,
    pub antialias: bool,
    pub pixel_ratio_cap: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HemisphereLightSpec {
    pub sky: Rgb,
    pub ground: Rgb,
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLightSpec {
    pub color: Rgb,
    pub intensity: f32,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    pub size: f32,
    pub divisions: u32,
    pub center_color: Rgb,
    pub line_color: Rgb,
    pub offset_y: f32,
}

impl From<&HelpersConfig> for GridSpec {
    fn from(helpers: &HelpersConfig) -> Self {
        Self {
            size: helpers.grid_size,
            divisions: helpers.grid_divisions,
            center_color: Rgb::from_u32(helpers.grid_center_color),
            line_color: Rgb::from_u32(helpers.grid_line_color),
            offset_y: helpers.grid_offset,
        }
    }
}

/// Phong surface material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialSpec {
    pub color: Rgb,
    pub specular: Rgb,
    pub shininess: f32,
}

impl MaterialSpec {
    pub fn new(color: Rgb, config: &ViewerConfig) -> Self {
        Self {
            color,
            specular: Rgb::from_u32(config.material.specular),
            shininess: config.material.shininess,
        }
    }
}

/// The render graph of a freshly constructed viewer
pub(crate) struct SceneParts<E: RenderEngine> {
    pub scene: E::Scene,
    pub camera: E::Camera,
    pub renderer: E::Renderer,
    pub controls: E::Controls,
    pub lights: Vec<E::Object>,
    pub grid: Option<E::Object>,
    pub axes: Option<E::Object>,
}

pub(crate) fn assemble<E: RenderEngine>(
    engine: &E,
    options: &ViewerOptions,
    config: &ViewerConfig,
    size: Size,
) -> Result<SceneParts<E>, ViewerError> {
    let renderer = engine
        .renderer(&RendererSpec {
            size,
            antialias: config.renderer.antialias,
            pixel_ratio_cap: config.renderer.pixel_ratio_cap,
        })
        .map_err(ViewerError::Renderer)?;

    let mut scene = engine.scene(options.background);

    let camera = engine.perspective_camera(&CameraSpec {
        fov_deg: config.camera.fov_deg,
        aspect: size.aspect(),
        near: config.camera.near,
        far: config.camera.far,
        position: Vec3::from(config.camera.initial_position),
    });

    let mut controls =
        engine.orbit_controls(&camera, &renderer.surface(), config.camera.enable_damping);
    controls.set_auto_rotate(options.auto_rotate);

    let lights = vec![
        engine.hemisphere_light(&HemisphereLightSpec {
            sky: Rgb::from_u32(config.lights.sky_color),
            ground: Rgb::from_u32(config.lights.ground_color),
            intensity: config.lights.hemisphere_intensity,
        }),
        engine.directional_light(&DirectionalLightSpec {
            color: Rgb::from_u32(config.lights.directional_color),
            intensity: config.lights.directional_intensity,
            position: Vec3::from(config.lights.directional_position),
        }),
    ];
    for light in &lights {
        scene.add(light);
    }

    let grid = options.show_grid.then(|| {
        let grid = engine.grid_helper(&GridSpec::from(&config.helpers));
        scene.add(&grid);
        grid
    });

    let axes = options.show_axes.then(|| {
        let axes = engine.axes_helper(config.helpers.axes_size);
        scene.add(&axes);
        axes
    });

    debug!(
        width = size.width,
        height = size.height,
        grid = options.show_grid,
        axes = options.show_axes,
        "Assembled scene"
    );

    Ok(SceneParts {
        scene,
        camera,
        renderer,
        controls,
        lights,
        grid,
        axes,
    })
}
