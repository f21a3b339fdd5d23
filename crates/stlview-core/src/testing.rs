//! In-memory platform for unit tests
//!
//! Every collaborator records what was done to it so tests can assert on
//! scene contents, host children, observers, pending frames and loads.
//! Frames and loads only progress when a test pumps them.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::{Rc, Weak};

use glam::Vec3;

use crate::error::{LoadError, PlatformError};
use crate::options::Rgb;
use crate::platform::{
    FrameScheduler, HostElement, LoadCallback, MeshGeometry, MeshLoader, NavigationControls,
    PerspectiveCamera, Platform, RenderEngine, Renderer, ResizeWatch, SceneGraph, Toggle,
    ToolbarView,
};
use crate::scene::{
    Aabb, CameraSpec, DirectionalLightSpec, GridSpec, HemisphereLightSpec, MaterialSpec,
    Placement, RendererSpec,
};
use crate::size::Size;

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_id() -> u64 {
    NEXT_ID.with(|n| {
        let id = n.get();
        n.set(id + 1);
        id
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Canvas,
    Toolbar,
}

/// A detached or attached node; clones share the child list
#[derive(Debug, Clone)]
pub struct MockNode {
    pub id: u64,
    pub kind: NodeKind,
    children: Rc<RefCell<Vec<MockNode>>>,
}

impl PartialEq for MockNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl MockNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            id: next_id(),
            kind,
            children: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn child_kinds(&self) -> Vec<NodeKind> {
        self.children.borrow().iter().map(|n| n.kind).collect()
    }
}

// ---------------------------------------------------------------------------
// Document

struct ElementInner {
    attrs: RefCell<HashMap<String, String>>,
    bounding: Cell<Size>,
    client: Cell<Size>,
    children: RefCell<Vec<MockNode>>,
    observers: RefCell<Vec<(u64, Box<dyn FnMut()>)>>,
    fail_appends: Cell<bool>,
}

#[derive(Clone)]
pub struct MockElement(Rc<ElementInner>);

impl PartialEq for MockElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl MockElement {
    /// A laid-out 800x500 element without classes
    pub fn new() -> Self {
        Self(Rc::new(ElementInner {
            attrs: RefCell::new(HashMap::new()),
            bounding: Cell::new(Size::new(800.0, 500.0)),
            client: Cell::new(Size::new(800.0, 500.0)),
            children: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            fail_appends: Cell::new(false),
        }))
    }

    pub fn with_class(class: &str) -> Self {
        Self::new().with_attr("class", class)
    }

    /// An element carrying the default viewer class
    pub fn viewer() -> Self {
        Self::with_class("stl-viewer")
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.0
            .attrs
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
        self
    }

    fn has_class(&self, class: &str) -> bool {
        self.0
            .attrs
            .borrow()
            .get("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }

    pub fn set_bounding_size(&self, size: Size) {
        self.0.bounding.set(size);
    }

    pub fn set_client_size(&self, size: Size) {
        self.0.client.set(size);
    }

    pub fn set_size(&self, size: Size) {
        self.set_bounding_size(size);
        self.set_client_size(size);
    }

    /// Change the layout size and notify observers
    pub fn resize(&self, size: Size) {
        self.set_size(size);
        for (_, on_resize) in self.0.observers.borrow_mut().iter_mut() {
            on_resize();
        }
    }

    pub fn children(&self) -> Vec<MockNode> {
        self.0.children.borrow().clone()
    }

    pub fn observer_count(&self) -> usize {
        self.0.observers.borrow().len()
    }

    pub fn fail_appends(&self) {
        self.0.fail_appends.set(true);
    }
}

pub struct MockResizeWatch {
    element: Weak<ElementInner>,
    id: u64,
}

impl ResizeWatch for MockResizeWatch {
    fn disconnect(&mut self) {
        if let Some(element) = self.element.upgrade() {
            element.observers.borrow_mut().retain(|(id, _)| *id != self.id);
        }
    }
}

impl HostElement for MockElement {
    type Node = MockNode;
    type ResizeWatch = MockResizeWatch;

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.attrs.borrow().get(name).cloned()
    }

    fn bounding_size(&self) -> Size {
        self.0.bounding.get()
    }

    fn client_size(&self) -> Size {
        self.0.client.get()
    }

    fn append_child(&self, node: &MockNode) -> Result<(), PlatformError> {
        if self.0.fail_appends.get() {
            return Err(PlatformError::new("append refused"));
        }
        self.0.children.borrow_mut().push(node.clone());
        Ok(())
    }

    fn remove_child(&self, node: &MockNode) -> Result<(), PlatformError> {
        let mut children = self.0.children.borrow_mut();
        let index = children
            .iter()
            .position(|c| c == node)
            .ok_or_else(|| PlatformError::new("not a child"))?;
        children.remove(index);
        Ok(())
    }

    fn observe_resize(
        &self,
        on_resize: Box<dyn FnMut()>,
    ) -> Result<MockResizeWatch, PlatformError> {
        let id = next_id();
        self.0.observers.borrow_mut().push((id, on_resize));
        Ok(MockResizeWatch {
            element: Rc::downgrade(&self.0),
            id,
        })
    }
}

// ---------------------------------------------------------------------------
// Engine

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    HemisphereLight,
    DirectionalLight,
    Grid(GridSpec),
    Axes,
    Mesh {
        placement: Placement,
        material: MaterialSpec,
    },
}

#[derive(Debug, Clone)]
pub struct MockObject {
    pub id: u64,
    pub kind: ObjectKind,
}

impl MockObject {
    fn new(kind: ObjectKind) -> Self {
        Self {
            id: next_id(),
            kind,
        }
    }
}

pub struct MockScene {
    pub background: Rgb,
    pub objects: Vec<MockObject>,
}

impl MockScene {
    pub fn count(&self, pred: impl Fn(&ObjectKind) -> bool) -> usize {
        self.objects.iter().filter(|o| pred(&o.kind)).count()
    }

    pub fn objects_where(&self, pred: impl Fn(&ObjectKind) -> bool) -> Vec<MockObject> {
        self.objects
            .iter()
            .filter(|o| pred(&o.kind))
            .cloned()
            .collect()
    }
}

impl SceneGraph for MockScene {
    type Object = MockObject;

    fn add(&mut self, object: &MockObject) {
        if !self.objects.iter().any(|o| o.id == object.id) {
            self.objects.push(object.clone());
        }
    }

    fn remove(&mut self, object: &MockObject) {
        self.objects.retain(|o| o.id != object.id);
    }
}

pub struct MockCamera {
    pub fov_deg: f32,
    pub aspect: f64,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub projection_updates: u32,
}

impl PerspectiveCamera for MockCamera {
    fn set_aspect(&mut self, aspect: f64) {
        self.aspect = aspect;
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn update_projection(&mut self) {
        self.projection_updates += 1;
    }
}

pub struct MockRenderer {
    pub surface: MockNode,
    pub size: Size,
    pub renders: u64,
    pub disposed: bool,
}

impl Renderer for MockRenderer {
    type Scene = MockScene;
    type Camera = MockCamera;
    type Surface = MockNode;

    fn surface(&self) -> MockNode {
        self.surface.clone()
    }

    fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    fn render(&mut self, _scene: &MockScene, _camera: &MockCamera) {
        assert!(!self.disposed, "render after dispose");
        self.renders += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

pub struct MockControls {
    pub auto_rotate: bool,
    pub damping: bool,
    pub target: Vec3,
    pub updates: u64,
    pub disposed: bool,
}

impl NavigationControls for MockControls {
    fn set_auto_rotate(&mut self, enabled: bool) {
        self.auto_rotate = enabled;
    }

    fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    fn update(&mut self) {
        self.updates += 1;
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

pub struct MockGeometry {
    bounds: Option<Aabb>,
    disposed: Rc<Cell<bool>>,
}

impl MockGeometry {
    pub fn new(bounds: Option<Aabb>) -> Self {
        Self {
            bounds,
            disposed: Rc::new(Cell::new(false)),
        }
    }

    pub fn disposed_flag(&self) -> Rc<Cell<bool>> {
        self.disposed.clone()
    }
}

impl MeshGeometry for MockGeometry {
    fn bounding_box(&mut self) -> Option<Aabb> {
        self.bounds
    }
}

#[derive(Default)]
pub struct MockEngine {
    pub fail_renderer: Cell<bool>,
    pub renderers_built: Cell<u32>,
    pub grids_built: Cell<u32>,
    pub objects_disposed: Cell<u32>,
}

impl RenderEngine for MockEngine {
    type Surface = MockNode;
    type Object = MockObject;
    type Scene = MockScene;
    type Camera = MockCamera;
    type Renderer = MockRenderer;
    type Controls = MockControls;
    type Geometry = MockGeometry;

    fn scene(&self, background: Rgb) -> MockScene {
        MockScene {
            background,
            objects: Vec::new(),
        }
    }

    fn perspective_camera(&self, spec: &CameraSpec) -> MockCamera {
        MockCamera {
            fov_deg: spec.fov_deg,
            aspect: spec.aspect,
            near: spec.near,
            far: spec.far,
            position: spec.position,
            projection_updates: 0,
        }
    }

    fn renderer(&self, spec: &RendererSpec) -> Result<MockRenderer, PlatformError> {
        if self.fail_renderer.get() {
            return Err(PlatformError::new("no GPU context"));
        }
        self.renderers_built.set(self.renderers_built.get() + 1);
        Ok(MockRenderer {
            surface: MockNode::new(NodeKind::Canvas),
            size: spec.size,
            renders: 0,
            disposed: false,
        })
    }

    fn orbit_controls(
        &self,
        _camera: &MockCamera,
        _surface: &MockNode,
        enable_damping: bool,
    ) -> MockControls {
        MockControls {
            auto_rotate: false,
            damping: enable_damping,
            target: Vec3::ZERO,
            updates: 0,
            disposed: false,
        }
    }

    fn hemisphere_light(&self, _spec: &HemisphereLightSpec) -> MockObject {
        MockObject::new(ObjectKind::HemisphereLight)
    }

    fn directional_light(&self, _spec: &DirectionalLightSpec) -> MockObject {
        MockObject::new(ObjectKind::DirectionalLight)
    }

    fn grid_helper(&self, spec: &GridSpec) -> MockObject {
        self.grids_built.set(self.grids_built.get() + 1);
        MockObject::new(ObjectKind::Grid(spec.clone()))
    }

    fn axes_helper(&self, _size: f32) -> MockObject {
        MockObject::new(ObjectKind::Axes)
    }

    fn mesh(
        &self,
        _geometry: MockGeometry,
        material: &MaterialSpec,
        placement: &Placement,
    ) -> MockObject {
        MockObject::new(ObjectKind::Mesh {
            placement: *placement,
            material: material.clone(),
        })
    }

    fn dispose_object(&self, _object: &MockObject) {
        self.objects_disposed.set(self.objects_disposed.get() + 1);
    }

    fn dispose_geometry(&self, geometry: MockGeometry) {
        geometry.disposed.set(true);
    }
}

// ---------------------------------------------------------------------------
// Loader and frames

#[derive(Default)]
pub struct MockLoader {
    pending: RefCell<Vec<(String, LoadCallback<MockGeometry>)>>,
}

impl MockLoader {
    pub fn requests(&self) -> Vec<String> {
        self.pending.borrow().iter().map(|(uri, _)| uri.clone()).collect()
    }

    /// Deliver the result of the oldest pending load of `uri`
    pub fn complete(&self, uri: &str, result: Result<MockGeometry, LoadError>) -> bool {
        let callback = {
            let mut pending = self.pending.borrow_mut();
            match pending.iter().position(|(u, _)| u == uri) {
                Some(index) => pending.remove(index).1,
                None => return false,
            }
        };
        callback(result);
        true
    }
}

impl MeshLoader for MockLoader {
    type Geometry = MockGeometry;

    fn load(&self, uri: &str, on_complete: LoadCallback<MockGeometry>) {
        self.pending.borrow_mut().push((uri.to_string(), on_complete));
    }
}

#[derive(Default)]
pub struct MockFrames {
    queue: RefCell<VecDeque<(u64, Box<dyn FnOnce()>)>>,
    cancelled: Rc<RefCell<HashSet<u64>>>,
    ignore_cancellation: Cell<bool>,
}

pub struct MockFrameHandle {
    id: u64,
    cancelled: Weak<RefCell<HashSet<u64>>>,
}

impl Drop for MockFrameHandle {
    fn drop(&mut self) {
        if let Some(cancelled) = self.cancelled.upgrade() {
            cancelled.borrow_mut().insert(self.id);
        }
    }
}

impl MockFrames {
    /// Run every frame queued so far; returns how many ran
    pub fn pump(&self) -> usize {
        let batch: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let mut ran = 0;
        for (id, callback) in batch {
            if !self.ignore_cancellation.get() && self.cancelled.borrow().contains(&id) {
                continue;
            }
            callback();
            ran += 1;
        }
        ran
    }

    /// Frames queued and not cancelled
    pub fn pending(&self) -> usize {
        let cancelled = self.cancelled.borrow();
        self.queue
            .borrow()
            .iter()
            .filter(|(id, _)| !cancelled.contains(id))
            .count()
    }

    /// Run cancelled frames too, like a frame that fired before cancellation
    pub fn ignore_cancellation(&self) {
        self.ignore_cancellation.set(true);
    }
}

impl FrameScheduler for MockFrames {
    type Handle = MockFrameHandle;

    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> MockFrameHandle {
        let id = next_id();
        self.queue.borrow_mut().push_back((id, callback));
        MockFrameHandle {
            id,
            cancelled: Rc::downgrade(&self.cancelled),
        }
    }
}

// ---------------------------------------------------------------------------
// Platform

type Toggles = Rc<RefCell<Vec<Toggle>>>;

pub struct MockToolbar {
    node: MockNode,
}

impl ToolbarView for MockToolbar {
    type Node = MockNode;

    fn node(&self) -> &MockNode {
        &self.node
    }
}

pub struct MockPlatform {
    pub engine: MockEngine,
    pub loader: MockLoader,
    pub frames: MockFrames,
    pub page_channel: Cell<bool>,
    pub fail_toolbar: Cell<bool>,
    hosts: RefCell<Vec<MockElement>>,
    loading: Cell<bool>,
    ready: RefCell<Vec<Box<dyn FnOnce()>>>,
    page_listeners: RefCell<Vec<Box<dyn FnMut()>>>,
    toolbars: RefCell<Vec<Toggles>>,
}

impl MockPlatform {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            engine: MockEngine::default(),
            loader: MockLoader::default(),
            frames: MockFrames::default(),
            page_channel: Cell::new(true),
            fail_toolbar: Cell::new(false),
            hosts: RefCell::new(Vec::new()),
            loading: Cell::new(false),
            ready: RefCell::new(Vec::new()),
            page_listeners: RefCell::new(Vec::new()),
            toolbars: RefCell::new(Vec::new()),
        })
    }

    pub fn add_host(&self, element: &MockElement) {
        self.hosts.borrow_mut().push(element.clone());
    }

    pub fn remove_host(&self, element: &MockElement) {
        self.hosts.borrow_mut().retain(|e| e != element);
    }

    pub fn set_loading(&self, loading: bool) {
        self.loading.set(loading);
    }

    /// Finish parsing the document and fire ready callbacks
    pub fn finish_loading(&self) {
        self.loading.set(false);
        let callbacks: Vec<_> = self.ready.borrow_mut().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Emit a page-changed notification
    pub fn navigate(&self) {
        for listener in self.page_listeners.borrow_mut().iter_mut() {
            listener();
        }
    }

    pub fn toolbar_count(&self) -> usize {
        self.toolbars.borrow().len()
    }

    pub fn toggle_states(&self, toolbar: usize) -> Vec<(String, bool)> {
        self.toolbars.borrow()[toolbar]
            .borrow()
            .iter()
            .map(|t| (t.label.clone(), t.checked))
            .collect()
    }

    /// Flip a checkbox as a user click would
    pub fn click(&self, toolbar: usize, label: &str) {
        let toggles = self.toolbars.borrow()[toolbar].clone();
        let mut toggles = toggles.borrow_mut();
        let toggle = toggles
            .iter_mut()
            .find(|t| t.label == label)
            .unwrap_or_else(|| panic!("no toggle labelled {label}"));
        toggle.checked = !toggle.checked;
        (toggle.on_change)(toggle.checked);
    }
}

impl Platform for MockPlatform {
    type Element = MockElement;
    type Engine = MockEngine;
    type Loader = MockLoader;
    type Frames = MockFrames;
    type Toolbar = MockToolbar;

    fn engine(&self) -> &MockEngine {
        &self.engine
    }

    fn loader(&self) -> &MockLoader {
        &self.loader
    }

    fn frames(&self) -> &MockFrames {
        &self.frames
    }

    fn query_hosts(&self, selector: &str) -> Vec<MockElement> {
        let class = selector.trim_start_matches('.');
        self.hosts
            .borrow()
            .iter()
            .filter(|e| e.has_class(class))
            .cloned()
            .collect()
    }

    fn is_loading(&self) -> bool {
        self.loading.get()
    }

    fn when_ready(&self, callback: Box<dyn FnOnce()>) {
        self.ready.borrow_mut().push(callback);
    }

    fn build_container(&self) -> Result<MockNode, PlatformError> {
        Ok(MockNode::new(NodeKind::Container))
    }

    fn append_to(&self, parent: &MockNode, child: &MockNode) -> Result<(), PlatformError> {
        parent.children.borrow_mut().push(child.clone());
        Ok(())
    }

    fn build_toolbar(&self, toggles: Vec<Toggle>) -> Result<MockToolbar, PlatformError> {
        if self.fail_toolbar.get() {
            return Err(PlatformError::new("toolbar refused"));
        }
        self.toolbars.borrow_mut().push(Rc::new(RefCell::new(toggles)));
        Ok(MockToolbar {
            node: MockNode::new(NodeKind::Toolbar),
        })
    }

    fn subscribe_page_changes(&self, on_change: Box<dyn FnMut()>) -> bool {
        if !self.page_channel.get() {
            return false;
        }
        self.page_listeners.borrow_mut().push(on_change);
        true
    }
}
