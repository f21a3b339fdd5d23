//! three.js implementation of the render engine traits

use glam::{Quat, Vec3};
use js_sys::{Object, Reflect};
use stlview_core::error::PlatformError;
use stlview_core::platform::{
    MeshGeometry, NavigationControls, PerspectiveCamera, RenderEngine, Renderer, SceneGraph,
};
use stlview_core::scene::{
    Aabb, CameraSpec, DirectionalLightSpec, GridSpec, HemisphereLightSpec, MaterialSpec,
    Placement, RendererSpec,
};
use stlview_core::{Rgb, Size};
use tracing::{debug, warn};
use wasm_bindgen::JsValue;

use crate::platform::js_error;
use crate::three;

fn set_vec3(target: &three::Vector3, v: Vec3) {
    target.set(v.x as f64, v.y as f64, v.z as f64);
}

fn set_quat(target: &three::Quaternion, q: Quat) {
    target.set(q.x as f64, q.y as f64, q.z as f64, q.w as f64);
}

fn to_vec3(v: &three::Vector3) -> Vec3 {
    Vec3::new(v.x() as f32, v.y() as f32, v.z() as f32)
}

/// Build a plain JS parameter object
fn params(entries: &[(&str, JsValue)]) -> Result<Object, JsValue> {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value)?;
    }
    Ok(object)
}

pub struct WebScene(three::Scene);

impl SceneGraph for WebScene {
    type Object = three::Object3D;

    fn add(&mut self, object: &three::Object3D) {
        self.0.add(object);
    }

    fn remove(&mut self, object: &three::Object3D) {
        self.0.remove(object);
    }
}

pub struct WebCamera(three::PerspectiveCamera);

impl PerspectiveCamera for WebCamera {
    fn set_aspect(&mut self, aspect: f64) {
        self.0.set_aspect(aspect);
    }

    fn set_position(&mut self, position: Vec3) {
        set_vec3(&self.0.position(), position);
    }

    fn update_projection(&mut self) {
        self.0.update_projection_matrix();
    }
}

pub struct WebRenderer(three::WebGLRenderer);

impl Renderer for WebRenderer {
    type Scene = WebScene;
    type Camera = WebCamera;
    type Surface = web_sys::Element;

    fn surface(&self) -> web_sys::Element {
        self.0.dom_element()
    }

    fn set_size(&mut self, size: Size) {
        self.0.set_size(size.width, size.height);
    }

    fn render(&mut self, scene: &WebScene, camera: &WebCamera) {
        self.0.render(&scene.0, &camera.0);
    }

    fn dispose(&mut self) {
        self.0.dispose();
    }
}

pub struct WebControls(three::OrbitControls);

impl NavigationControls for WebControls {
    fn set_auto_rotate(&mut self, enabled: bool) {
        self.0.set_auto_rotate(enabled);
    }

    fn set_target(&mut self, target: Vec3) {
        set_vec3(&self.0.target(), target);
    }

    fn update(&mut self) {
        self.0.update();
    }

    fn dispose(&mut self) {
        self.0.dispose();
    }
}

pub struct WebGeometry(pub(crate) three::BufferGeometry);

impl MeshGeometry for WebGeometry {
    fn bounding_box(&mut self) -> Option<Aabb> {
        self.0.compute_bounding_box();
        let bounds = self.0.bounding_box()?;
        let aabb = Aabb::new(to_vec3(&bounds.min()), to_vec3(&bounds.max()));
        // An empty geometry yields an inverted infinite box
        (aabb.is_finite() && aabb.min.cmple(aabb.max).all()).then_some(aabb)
    }
}

/// Creates three.js objects for a viewer
pub struct ThreeEngine {
    device_pixel_ratio: f64,
}

impl ThreeEngine {
    pub fn new(device_pixel_ratio: f64) -> Self {
        Self { device_pixel_ratio }
    }
}

impl RenderEngine for ThreeEngine {
    type Surface = web_sys::Element;
    type Object = three::Object3D;
    type Scene = WebScene;
    type Camera = WebCamera;
    type Renderer = WebRenderer;
    type Controls = WebControls;
    type Geometry = WebGeometry;

    fn scene(&self, background: Rgb) -> WebScene {
        let scene = three::Scene::new();
        scene.set_background(&three::Color::new(background.to_u32()));
        WebScene(scene)
    }

    fn perspective_camera(&self, spec: &CameraSpec) -> WebCamera {
        let camera = three::PerspectiveCamera::new(
            spec.fov_deg as f64,
            spec.aspect,
            spec.near as f64,
            spec.far as f64,
        );
        set_vec3(&camera.position(), spec.position);
        WebCamera(camera)
    }

    fn renderer(&self, spec: &RendererSpec) -> Result<WebRenderer, PlatformError> {
        let options =
            params(&[("antialias", JsValue::from_bool(spec.antialias))]).map_err(js_error)?;
        let renderer = three::WebGLRenderer::new(&options).map_err(js_error)?;

        let ratio = match spec.pixel_ratio_cap {
            Some(cap) => self.device_pixel_ratio.min(cap),
            None => self.device_pixel_ratio,
        };
        renderer.set_pixel_ratio(ratio);
        renderer.set_size(spec.size.width, spec.size.height);
        debug!(ratio, antialias = spec.antialias, "Created WebGL renderer");
        Ok(WebRenderer(renderer))
    }

    fn orbit_controls(
        &self,
        camera: &WebCamera,
        surface: &web_sys::Element,
        enable_damping: bool,
    ) -> WebControls {
        let controls = three::OrbitControls::new(&camera.0, surface);
        controls.set_enable_damping(enable_damping);
        WebControls(controls)
    }

    fn hemisphere_light(&self, spec: &HemisphereLightSpec) -> three::Object3D {
        three::HemisphereLight::new(spec.sky.to_u32(), spec.ground.to_u32(), spec.intensity as f64)
            .into()
    }

    fn directional_light(&self, spec: &DirectionalLightSpec) -> three::Object3D {
        let light = three::DirectionalLight::new(spec.color.to_u32(), spec.intensity as f64);
        set_vec3(&light.position(), spec.position);
        light.into()
    }

    fn grid_helper(&self, spec: &GridSpec) -> three::Object3D {
        let grid = three::GridHelper::new(
            spec.size as f64,
            spec.divisions,
            spec.center_color.to_u32(),
            spec.line_color.to_u32(),
        );
        set_vec3(&grid.position(), Vec3::new(0.0, spec.offset_y, 0.0));
        grid.into()
    }

    fn axes_helper(&self, size: f32) -> three::Object3D {
        three::AxesHelper::new(size as f64).into()
    }

    fn mesh(
        &self,
        geometry: WebGeometry,
        material: &MaterialSpec,
        placement: &Placement,
    ) -> three::Object3D {
        let material = params(&[
            ("color", JsValue::from(material.color.to_u32())),
            ("specular", JsValue::from(material.specular.to_u32())),
            ("shininess", JsValue::from(material.shininess)),
        ])
        .unwrap_or_else(|e| {
            warn!(error = %js_error(e), "Failed to set material parameters; using defaults");
            Object::new()
        });
        let mesh = three::Mesh::new(&geometry.0, &three::MeshPhongMaterial::new(&material));

        set_vec3(&mesh.position(), placement.position);
        set_quat(&mesh.quaternion(), placement.rotation);
        mesh.scale().set_scalar(placement.scale as f64);
        mesh.into()
    }

    fn dispose_object(&self, object: &three::Object3D) {
        three::dispose_object(object);
    }

    fn dispose_geometry(&self, geometry: WebGeometry) {
        geometry.0.dispose();
    }
}
