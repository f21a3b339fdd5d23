//! Keeps camera and renderer matched to the host element's size

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::ViewerError;
use crate::platform::{HostElement, PerspectiveCamera, Platform, Renderer};
use crate::size::{self, Size};
use crate::viewer::ViewerState;

/// Apply the host's current size to camera and renderer
pub(crate) fn sync<P: Platform>(state: &mut ViewerState<P>) -> Option<Size> {
    if state.disposed {
        return None;
    }

    let size = size::measure(&state.host, state.config.fallback_size);
    state.camera.set_aspect(size.aspect());
    state.camera.update_projection();
    state.renderer.set_size(size);
    trace!(width = size.width, height = size.height, "Viewport resized");
    Some(size)
}

/// Sync once now, then on every size change until the viewer is disposed.
///
/// The immediate sync covers observers that never report the size the
/// element already has.
pub(crate) fn observe<P: Platform>(state: &Rc<RefCell<ViewerState<P>>>) -> Result<(), ViewerError> {
    let host = {
        let mut guard = state.borrow_mut();
        sync(&mut guard);
        guard.host.clone()
    };

    let weak = Rc::downgrade(state);
    let watch = host
        .observe_resize(Box::new(move || {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let Ok(mut guard) = state.try_borrow_mut() else {
                debug!("Viewer busy, skipping resize");
                return;
            };
            sync(&mut guard);
        }))
        .map_err(ViewerError::Observe)?;

    state.borrow_mut().resize_watch = Some(watch);
    Ok(())
}
