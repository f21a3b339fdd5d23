//! Traits for the collaborators a viewer runs against
//!
//! The viewer never touches a browser, GPU or network directly. A host
//! environment implements these traits: the document and its elements, a
//! rendering engine, a mesh loader and a frame scheduler.

use glam::Vec3;

use crate::error::{LoadError, PlatformError};
use crate::options::Rgb;
use crate::scene::{
    Aabb, CameraSpec, DirectionalLightSpec, GridSpec, HemisphereLightSpec, MaterialSpec,
    Placement, RendererSpec,
};
use crate::size::Size;

/// An element in the embedding document that hosts one viewer.
///
/// Handles are cheap clones of the same underlying element; equality is
/// element identity.
pub trait HostElement: Clone + PartialEq + 'static {
    /// A DOM node that can be attached under this element
    type Node: Clone + 'static;
    type ResizeWatch: ResizeWatch + 'static;

    fn attribute(&self, name: &str) -> Option<String>;

    /// On-screen bounding box size
    fn bounding_size(&self) -> Size;

    /// Box-model client size
    fn client_size(&self) -> Size;

    fn append_child(&self, node: &Self::Node) -> Result<(), PlatformError>;

    fn remove_child(&self, node: &Self::Node) -> Result<(), PlatformError>;

    /// Invoke `on_resize` whenever the element's size changes
    fn observe_resize(
        &self,
        on_resize: Box<dyn FnMut()>,
    ) -> Result<Self::ResizeWatch, PlatformError>;
}

/// Live size observation; stops once disconnected
pub trait ResizeWatch {
    fn disconnect(&mut self);
}

pub trait SceneGraph {
    type Object;

    fn add(&mut self, object: &Self::Object);
    fn remove(&mut self, object: &Self::Object);
}

pub trait PerspectiveCamera {
    fn set_aspect(&mut self, aspect: f64);
    fn set_position(&mut self, position: Vec3);
    fn update_projection(&mut self);
}

pub trait Renderer {
    type Scene;
    type Camera;
    /// The node the renderer draws into
    type Surface;

    fn surface(&self) -> Self::Surface;
    fn set_size(&mut self, size: Size);
    fn render(&mut self, scene: &Self::Scene, camera: &Self::Camera);
    fn dispose(&mut self);
}

/// Damped orbit camera manipulation bound to user input
pub trait NavigationControls {
    fn set_auto_rotate(&mut self, enabled: bool);
    fn set_target(&mut self, target: Vec3);
    /// Advance damping and auto-rotation by one frame
    fn update(&mut self);
    fn dispose(&mut self);
}

/// Triangulated surface geometry produced by a [`MeshLoader`]
pub trait MeshGeometry {
    /// Axis-aligned bounds, or `None` when the geometry has no finite vertex
    fn bounding_box(&mut self) -> Option<Aabb>;
}

/// Factory for scene, camera, renderer and scene objects
pub trait RenderEngine: 'static {
    type Surface: Clone + 'static;
    /// Handle to anything that can be placed in a scene
    type Object: Clone + 'static;
    type Scene: SceneGraph<Object = Self::Object> + 'static;
    type Camera: PerspectiveCamera + 'static;
    type Renderer: Renderer<Scene = Self::Scene, Camera = Self::Camera, Surface = Self::Surface>
        + 'static;
    type Controls: NavigationControls + 'static;
    type Geometry: MeshGeometry + 'static;

    fn scene(&self, background: Rgb) -> Self::Scene;
    fn perspective_camera(&self, spec: &CameraSpec) -> Self::Camera;
    /// Fails when no drawing context can be acquired
    fn renderer(&self, spec: &RendererSpec) -> Result<Self::Renderer, PlatformError>;
    fn orbit_controls(
        &self,
        camera: &Self::Camera,
        surface: &Self::Surface,
        enable_damping: bool,
    ) -> Self::Controls;
    fn hemisphere_light(&self, spec: &HemisphereLightSpec) -> Self::Object;
    fn directional_light(&self, spec: &DirectionalLightSpec) -> Self::Object;
    fn grid_helper(&self, spec: &GridSpec) -> Self::Object;
    fn axes_helper(&self, size: f32) -> Self::Object;
    fn mesh(
        &self,
        geometry: Self::Geometry,
        material: &MaterialSpec,
        placement: &Placement,
    ) -> Self::Object;
    /// Release GPU buffers held by an object
    fn dispose_object(&self, object: &Self::Object);
    /// Release a geometry that never made it into a scene
    fn dispose_geometry(&self, geometry: Self::Geometry);
}

pub type LoadCallback<G> = Box<dyn FnOnce(Result<G, LoadError>)>;

/// Asynchronous mesh loading
pub trait MeshLoader: 'static {
    type Geometry;

    /// Start loading `uri`. `on_complete` runs exactly once, never from
    /// inside this call.
    fn load(&self, uri: &str, on_complete: LoadCallback<Self::Geometry>);
}

/// Display-refresh-driven callback scheduling
pub trait FrameScheduler: 'static {
    /// Dropping the handle cancels the frame if it has not run yet
    type Handle: 'static;

    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> Self::Handle;
}

/// One checkbox in a viewer toolbar
pub struct Toggle {
    pub label: String,
    pub checked: bool,
    pub on_change: Box<dyn FnMut(bool)>,
}

/// A built toolbar; dropping it releases its input listeners
pub trait ToolbarView: 'static {
    type Node;

    fn node(&self) -> &Self::Node;
}

/// The host environment as a whole
pub trait Platform: 'static {
    type Element: HostElement;
    type Engine: RenderEngine<Surface = <Self::Element as HostElement>::Node>;
    type Loader: MeshLoader<Geometry = <Self::Engine as RenderEngine>::Geometry>;
    type Frames: FrameScheduler;
    type Toolbar: ToolbarView<Node = <Self::Element as HostElement>::Node>;

    fn engine(&self) -> &Self::Engine;
    fn loader(&self) -> &Self::Loader;
    fn frames(&self) -> &Self::Frames;

    /// All elements in the document matching `selector`
    fn query_hosts(&self, selector: &str) -> Vec<Self::Element>;

    /// True while the document is still being parsed
    fn is_loading(&self) -> bool;

    /// Run `callback` once the document has finished loading
    fn when_ready(&self, callback: Box<dyn FnOnce()>);

    /// An empty positioned node that holds one viewer's canvas and toolbar
    fn build_container(&self) -> Result<NodeOf<Self>, PlatformError>;

    fn append_to(&self, parent: &NodeOf<Self>, child: &NodeOf<Self>) -> Result<(), PlatformError>;

    fn build_toolbar(&self, toggles: Vec<Toggle>) -> Result<Self::Toolbar, PlatformError>;

    /// Subscribe to content-replacement notifications from the host
    /// framework. Returns false when the page has no such channel.
    fn subscribe_page_changes(&self, on_change: Box<dyn FnMut()>) -> bool;
}

pub type NodeOf<P> = <<P as Platform>::Element as HostElement>::Node;
pub type ResizeWatchOf<P> = <<P as Platform>::Element as HostElement>::ResizeWatch;
pub type SceneOf<P> = <<P as Platform>::Engine as RenderEngine>::Scene;
pub type CameraOf<P> = <<P as Platform>::Engine as RenderEngine>::Camera;
pub type RendererOf<P> = <<P as Platform>::Engine as RenderEngine>::Renderer;
pub type ControlsOf<P> = <<P as Platform>::Engine as RenderEngine>::Controls;
pub type ObjectOf<P> = <<P as Platform>::Engine as RenderEngine>::Object;
pub type GeometryOf<P> = <<P as Platform>::Engine as RenderEngine>::Geometry;
pub type FrameHandleOf<P> = <<P as Platform>::Frames as FrameScheduler>::Handle;
