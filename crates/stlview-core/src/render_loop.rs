//! Per-frame controls update and draw
//!
//! Each frame re-registers the next one with the platform's frame scheduler
//! until the viewer is disposed. The pending handle lives in a slot shared
//! with the viewer state, so rescheduling never borrows the state itself.
//! Disposal empties the slot, and a frame that still fires sees the disposed
//! flag and stops.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::platform::{FrameHandleOf, FrameScheduler, NavigationControls, Platform, Renderer};
use crate::viewer::ViewerState;

/// Holds the handle of the next requested frame
pub(crate) type FrameSlot<P> = Rc<Cell<Option<FrameHandleOf<P>>>>;

pub(crate) fn start<P: Platform>(platform: &Rc<P>, state: &Rc<RefCell<ViewerState<P>>>) {
    let slot = state.borrow().frame.clone();
    schedule(platform, Rc::downgrade(state), slot);
}

fn schedule<P: Platform>(
    platform: &Rc<P>,
    state: Weak<RefCell<ViewerState<P>>>,
    slot: FrameSlot<P>,
) {
    let weak_platform: Weak<P> = Rc::downgrade(platform);
    let next_slot = slot.clone();

    let handle = platform.frames().request_frame(Box::new(move || {
        let (Some(platform), Some(strong)) = (weak_platform.upgrade(), state.upgrade()) else {
            return;
        };
        if draw(&strong) {
            schedule(&platform, state, next_slot);
        }
    }));

    slot.set(Some(handle));
}

/// Draw one frame; false once the viewer is disposed
fn draw<P: Platform>(state: &Rc<RefCell<ViewerState<P>>>) -> bool {
    let Ok(mut guard) = state.try_borrow_mut() else {
        trace!("Viewer busy, skipping frame");
        return true;
    };
    let state = &mut *guard;
    if state.disposed {
        return false;
    }

    state.controls.update();
    state.renderer.render(&state.scene, &state.camera);
    state.frames_rendered += 1;
    trace!(frame = state.frames_rendered, "Rendered frame");
    true
}
