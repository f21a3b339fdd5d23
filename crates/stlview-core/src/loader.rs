//! Mesh loading and normalization
//!
//! Each viewer issues exactly one load. A successful load is centered,
//! scaled and oriented, inserted into the scene, and the camera is reframed
//! around it. A failed load leaves the scene mesh-less and records the
//! failure; it is never retried and never raised into the render loop.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use glam::Vec3;
use tracing::{debug, error, info};

use crate::error::LoadError;
use crate::platform::{
    GeometryOf, MeshGeometry, MeshLoader, NavigationControls, PerspectiveCamera, Platform,
    RenderEngine, SceneGraph,
};
use crate::scene::{MaterialSpec, Placement};
use crate::viewer::{LoadStatus, ViewerState};

pub(crate) fn start<P: Platform>(platform: &Rc<P>, state: &Rc<RefCell<ViewerState<P>>>) {
    let src = state.borrow().options.src.clone();
    let Some(src) = src else {
        fail(&mut state.borrow_mut(), LoadError::MissingSource);
        return;
    };

    debug!(src = %src, "Loading mesh");
    let weak_platform: Weak<P> = Rc::downgrade(platform);
    let weak_state = Rc::downgrade(state);
    platform.loader().load(
        &src,
        Box::new(move |result| {
            let Some(platform) = weak_platform.upgrade() else {
                return;
            };
            match weak_state.upgrade() {
                Some(state) => complete(&*platform, &state, result),
                None => discard(&*platform, result),
            }
        }),
    );
}

fn complete<P: Platform>(
    platform: &P,
    state: &Rc<RefCell<ViewerState<P>>>,
    result: Result<GeometryOf<P>, LoadError>,
) {
    let Ok(mut guard) = state.try_borrow_mut() else {
        error!("Viewer busy when mesh load completed; dropping mesh");
        discard(platform, result);
        return;
    };
    let state = &mut *guard;

    if state.disposed {
        discard(platform, result);
        return;
    }

    let mut geometry = match result {
        Ok(geometry) => geometry,
        Err(e) => return fail(state, e),
    };

    let engine = platform.engine();
    let Some(bounds) = geometry.bounding_box().filter(|b| b.is_finite()) else {
        engine.dispose_geometry(geometry);
        return fail(state, LoadError::EmptyGeometry);
    };

    let framing = &state.config.framing;
    let placement = Placement::normalize(&bounds, framing, state.options.up_axis);
    let material = MaterialSpec::new(state.options.color, &state.config);
    let mesh = engine.mesh(geometry, &material, &placement);
    state.scene.add(&mesh);
    state.mesh = Some(mesh);

    state.camera.set_position(framing.camera_position());
    state.camera.update_projection();
    state.controls.set_target(Vec3::ZERO);
    state.load_status = LoadStatus::Loaded;

    info!(
        src = state.options.src.as_deref().unwrap_or(""),
        scale = placement.scale,
        "Mesh loaded"
    );
}

/// Drop the result of a load that finished after its viewer went away
fn discard<P: Platform>(platform: &P, result: Result<GeometryOf<P>, LoadError>) {
    debug!("Mesh load finished after disposal; discarding");
    if let Ok(geometry) = result {
        platform.engine().dispose_geometry(geometry);
    }
}

fn fail<P: Platform>(state: &mut ViewerState<P>, e: LoadError) {
    error!(
        src = state.options.src.as_deref().unwrap_or(""),
        error = %e,
        "Mesh load failed"
    );
    state.load_status = LoadStatus::Failed(e);
}
