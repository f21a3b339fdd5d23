//! A live viewer bound to one host element

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::config::ViewerConfig;
use crate::error::{LoadError, ViewerError};
use crate::options::ViewerOptions;
use crate::platform::{
    CameraOf, ControlsOf, HostElement, NavigationControls, NodeOf, ObjectOf,
    Platform, RenderEngine, Renderer, RendererOf, ResizeWatch, ResizeWatchOf, SceneGraph, SceneOf,
};
use crate::scene::{self, GridSpec};
use crate::render_loop::FrameSlot;
use crate::size;
use crate::{loader, render_loop, resize, toolbar};

/// Progress of the one mesh load a viewer performs
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Pending,
    Loaded,
    Failed(LoadError),
}

/// Mutable state shared between the viewer handle and its callbacks
pub(crate) struct ViewerState<P: Platform> {
    pub host: P::Element,
    pub options: ViewerOptions,
    pub config: Rc<ViewerConfig>,
    pub scene: SceneOf<P>,
    pub camera: CameraOf<P>,
    pub renderer: RendererOf<P>,
    pub controls: ControlsOf<P>,
    pub lights: Vec<ObjectOf<P>>,
    pub mesh: Option<ObjectOf<P>>,
    /// Built lazily; may exist while detached from the scene
    pub grid: Option<ObjectOf<P>>,
    pub grid_visible: bool,
    pub axes: Option<ObjectOf<P>>,
    /// Wrapper holding the surface and toolbar, once attached under `host`
    pub container: Option<NodeOf<P>>,
    pub toolbar: Option<P::Toolbar>,
    pub resize_watch: Option<ResizeWatchOf<P>>,
    pub frame: FrameSlot<P>,
    pub load_status: LoadStatus,
    pub frames_rendered: u64,
    pub disposed: bool,
}

impl<P: Platform> ViewerState<P> {
    pub fn set_auto_rotate(&mut self, enabled: bool) {
        if self.disposed {
            return;
        }
        self.controls.set_auto_rotate(enabled);
        debug!(enabled, "Auto-rotate toggled");
    }

    pub fn set_grid_visible(&mut self, engine: &P::Engine, visible: bool) {
        if self.disposed || visible == self.grid_visible {
            return;
        }

        if visible {
            let spec = GridSpec::from(&self.config.helpers);
            let grid = self.grid.get_or_insert_with(|| engine.grid_helper(&spec));
            self.scene.add(grid);
        } else if let Some(grid) = &self.grid {
            self.scene.remove(grid);
        }

        self.grid_visible = visible;
        debug!(visible, "Grid toggled");
    }
}

/// Handle to a viewer instance.
///
/// Dropping the handle does not release anything; call [`Viewer::dispose`].
pub struct Viewer<P: Platform> {
    platform: Rc<P>,
    host: P::Element,
    pub(crate) state: Rc<RefCell<ViewerState<P>>>,
}

impl<P: Platform> Viewer<P> {
    /// Build a viewer inside `host` and start loading, resizing and rendering.
    ///
    /// On error every node already attached to `host` is removed again.
    pub fn create(
        platform: Rc<P>,
        host: P::Element,
        config: Rc<ViewerConfig>,
    ) -> Result<Self, ViewerError> {
        let options = ViewerOptions::from_element(&host, &config);
        let initial = size::measure(&host, config.fallback_size);
        let parts = scene::assemble(platform.engine(), &options, &config, initial)?;

        let grid_visible = parts.grid.is_some();
        let state = ViewerState {
            host: host.clone(),
            options,
            config,
            scene: parts.scene,
            camera: parts.camera,
            renderer: parts.renderer,
            controls: parts.controls,
            lights: parts.lights,
            mesh: None,
            grid: parts.grid,
            grid_visible,
            axes: parts.axes,
            container: None,
            toolbar: None,
            resize_watch: None,
            frame: Rc::new(Cell::new(None)),
            load_status: LoadStatus::Pending,
            frames_rendered: 0,
            disposed: false,
        };

        let viewer = Self {
            platform,
            host,
            state: Rc::new(RefCell::new(state)),
        };

        if let Err(e) = viewer.attach() {
            viewer.dispose();
            return Err(e);
        }

        info!(
            src = viewer.state.borrow().options.src.as_deref().unwrap_or(""),
            "Viewer created"
        );
        Ok(viewer)
    }

    fn attach(&self) -> Result<(), ViewerError> {
        {
            let mut state = self.state.borrow_mut();
            let container = self
                .platform
                .build_container()
                .map_err(ViewerError::Attach)?;
            self.platform
                .append_to(&container, &state.renderer.surface())
                .map_err(ViewerError::Attach)?;
            state
                .host
                .append_child(&container)
                .map_err(ViewerError::Attach)?;
            state.container = Some(container);
        }

        resize::observe(&self.state)?;

        if self.state.borrow().options.show_toolbar {
            toolbar::attach(&self.platform, &self.state)?;
        }

        loader::start(&self.platform, &self.state);
        render_loop::start(&self.platform, &self.state);
        Ok(())
    }

    pub fn host(&self) -> &P::Element {
        &self.host
    }

    pub fn options(&self) -> ViewerOptions {
        self.state.borrow().options.clone()
    }

    pub fn load_status(&self) -> LoadStatus {
        self.state.borrow().load_status.clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    pub fn frames_rendered(&self) -> u64 {
        self.state.borrow().frames_rendered
    }

    pub fn set_auto_rotate(&self, enabled: bool) {
        self.state.borrow_mut().set_auto_rotate(enabled);
    }

    pub fn set_grid_visible(&self, visible: bool) {
        self.state
            .borrow_mut()
            .set_grid_visible(self.platform.engine(), visible);
    }

    /// Release every resource the viewer owns and detach it from its host.
    ///
    /// Idempotent. A load still in flight is not aborted; its result is
    /// discarded when it arrives.
    pub fn dispose(&self) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state.disposed {
            return;
        }
        state.disposed = true;

        // Cancels the pending frame
        state.frame.take();

        if let Some(mut watch) = state.resize_watch.take() {
            watch.disconnect();
        }

        state.controls.dispose();
        state.renderer.dispose();

        let engine = self.platform.engine();
        let objects = state
            .mesh
            .take()
            .into_iter()
            .chain(state.grid.take())
            .chain(state.axes.take())
            .chain(state.lights.drain(..));
        for object in objects {
            state.scene.remove(&object);
            engine.dispose_object(&object);
        }
        state.grid_visible = false;

        // Releases the toolbar listeners; its node leaves with the container
        state.toolbar = None;

        if let Some(container) = state.container.take() {
            if let Err(e) = state.host.remove_child(&container) {
                warn!(error = %e, "Failed to remove viewer container");
            }
        }

        debug!(frames = state.frames_rendered, "Viewer disposed");
    }
}
