//! wasm-bindgen bindings for the parts of three.js the viewer uses
//!
//! Classes are re-exported by `js/three-env.js`, which pins the three.js
//! release and pulls in the orbit controls and STL loader add-ons.

#![allow(clippy::new_without_default)]

use wasm_bindgen::prelude::*;

#[wasm_bindgen(module = "/js/three-env.js")]
extern "C" {
    #[derive(Debug, Clone)]
    pub type Object3D;

    #[wasm_bindgen(method)]
    pub fn add(this: &Object3D, child: &Object3D);

    #[wasm_bindgen(method)]
    pub fn remove(this: &Object3D, child: &Object3D);

    #[wasm_bindgen(method, getter)]
    pub fn position(this: &Object3D) -> Vector3;

    #[wasm_bindgen(method, getter)]
    pub fn quaternion(this: &Object3D) -> Quaternion;

    #[wasm_bindgen(method, getter)]
    pub fn scale(this: &Object3D) -> Vector3;

    /// Dispose geometries and materials of `root` and its descendants
    #[wasm_bindgen(js_name = disposeObject)]
    pub fn dispose_object(root: &Object3D);
}

#[wasm_bindgen(module = "/js/three-env.js")]
extern "C" {
    #[derive(Debug, Clone)]
    pub type Vector3;

    #[wasm_bindgen(method)]
    pub fn set(this: &Vector3, x: f64, y: f64, z: f64);

    #[wasm_bindgen(method, js_name = setScalar)]
    pub fn set_scalar(this: &Vector3, s: f64);

    #[wasm_bindgen(method, getter)]
    pub fn x(this: &Vector3) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn y(this: &Vector3) -> f64;

    #[wasm_bindgen(method, getter)]
    pub fn z(this: &Vector3) -> f64;

    #[derive(Debug, Clone)]
    pub type Quaternion;

    #[wasm_bindgen(method)]
    pub fn set(this: &Quaternion, x: f64, y: f64, z: f64, w: f64);

    #[derive(Debug, Clone)]
    pub type Box3;

    #[wasm_bindgen(method, getter)]
    pub fn min(this: &Box3) -> Vector3;

    #[wasm_bindgen(method, getter)]
    pub fn max(this: &Box3) -> Vector3;

    #[derive(Debug, Clone)]
    pub type Color;

    #[wasm_bindgen(constructor)]
    pub fn new(hex: u32) -> Color;
}

#[wasm_bindgen(module = "/js/three-env.js")]
extern "C" {
    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type Scene;

    #[wasm_bindgen(constructor)]
    pub fn new() -> Scene;

    #[wasm_bindgen(method, setter)]
    pub fn set_background(this: &Scene, color: &Color);

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type PerspectiveCamera;

    #[wasm_bindgen(constructor)]
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> PerspectiveCamera;

    #[wasm_bindgen(method, setter)]
    pub fn set_aspect(this: &PerspectiveCamera, aspect: f64);

    #[wasm_bindgen(method, js_name = updateProjectionMatrix)]
    pub fn update_projection_matrix(this: &PerspectiveCamera);
}

#[wasm_bindgen(module = "/js/three-env.js")]
extern "C" {
    #[derive(Debug, Clone)]
    pub type WebGLRenderer;

    /// Throws when no WebGL context can be created
    #[wasm_bindgen(constructor, catch)]
    pub fn new(params: &js_sys::Object) -> Result<WebGLRenderer, JsValue>;

    #[wasm_bindgen(method, getter = domElement)]
    pub fn dom_element(this: &WebGLRenderer) -> web_sys::Element;

    #[wasm_bindgen(method, js_name = setPixelRatio)]
    pub fn set_pixel_ratio(this: &WebGLRenderer, ratio: f64);

    #[wasm_bindgen(method, js_name = setSize)]
    pub fn set_size(this: &WebGLRenderer, width: f64, height: f64);

    #[wasm_bindgen(method)]
    pub fn render(this: &WebGLRenderer, scene: &Scene, camera: &PerspectiveCamera);

    #[wasm_bindgen(method)]
    pub fn dispose(this: &WebGLRenderer);

    #[derive(Debug, Clone)]
    pub type OrbitControls;

    #[wasm_bindgen(constructor)]
    pub fn new(camera: &PerspectiveCamera, dom_element: &web_sys::Element) -> OrbitControls;

    #[wasm_bindgen(method, setter = enableDamping)]
    pub fn set_enable_damping(this: &OrbitControls, enabled: bool);

    #[wasm_bindgen(method, setter = autoRotate)]
    pub fn set_auto_rotate(this: &OrbitControls, enabled: bool);

    #[wasm_bindgen(method, getter)]
    pub fn target(this: &OrbitControls) -> Vector3;

    #[wasm_bindgen(method)]
    pub fn update(this: &OrbitControls) -> bool;

    #[wasm_bindgen(method)]
    pub fn dispose(this: &OrbitControls);
}

#[wasm_bindgen(module = "/js/three-env.js")]
extern "C" {
    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type HemisphereLight;

    #[wasm_bindgen(constructor)]
    pub fn new(sky: u32, ground: u32, intensity: f64) -> HemisphereLight;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type DirectionalLight;

    #[wasm_bindgen(constructor)]
    pub fn new(color: u32, intensity: f64) -> DirectionalLight;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type GridHelper;

    #[wasm_bindgen(constructor)]
    pub fn new(size: f64, divisions: u32, center_color: u32, line_color: u32) -> GridHelper;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type AxesHelper;

    #[wasm_bindgen(constructor)]
    pub fn new(size: f64) -> AxesHelper;
}

#[wasm_bindgen(module = "/js/three-env.js")]
extern "C" {
    #[derive(Debug, Clone)]
    pub type BufferGeometry;

    #[wasm_bindgen(method, js_name = computeBoundingBox)]
    pub fn compute_bounding_box(this: &BufferGeometry);

    #[wasm_bindgen(method, getter = boundingBox)]
    pub fn bounding_box(this: &BufferGeometry) -> Option<Box3>;

    #[wasm_bindgen(method)]
    pub fn dispose(this: &BufferGeometry);

    #[derive(Debug, Clone)]
    pub type MeshPhongMaterial;

    #[wasm_bindgen(constructor)]
    pub fn new(params: &js_sys::Object) -> MeshPhongMaterial;

    #[wasm_bindgen(extends = Object3D)]
    #[derive(Debug, Clone)]
    pub type Mesh;

    #[wasm_bindgen(constructor)]
    pub fn new(geometry: &BufferGeometry, material: &MeshPhongMaterial) -> Mesh;

    #[derive(Debug, Clone)]
    pub type STLLoader;

    #[wasm_bindgen(constructor)]
    pub fn new() -> STLLoader;

    /// Parse binary or ASCII STL; throws on malformed input
    #[wasm_bindgen(method, catch)]
    pub fn parse(this: &STLLoader, data: &js_sys::ArrayBuffer) -> Result<BufferGeometry, JsValue>;
}
