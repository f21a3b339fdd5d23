//! Optional checkbox toolbar for live viewer state

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::error::{PlatformError, ViewerError};
use crate::platform::{Platform, Toggle, ToolbarView};
use crate::viewer::ViewerState;

pub const LABEL_AUTO_ROTATE: &str = "Auto-rotate";
pub const LABEL_GRID: &str = "Grid";

/// Build the "Auto-rotate" and "Grid" checkboxes and place them over the canvas
pub(crate) fn attach<P: Platform>(
    platform: &Rc<P>,
    state: &Rc<RefCell<ViewerState<P>>>,
) -> Result<(), ViewerError> {
    let (auto_rotate, show_grid) = {
        let s = state.borrow();
        (s.options.auto_rotate, s.options.show_grid)
    };

    let rotate_state = Rc::downgrade(state);
    let rotate = Toggle {
        label: LABEL_AUTO_ROTATE.to_string(),
        checked: auto_rotate,
        on_change: Box::new(move |enabled| {
            let Some(state) = rotate_state.upgrade() else {
                return;
            };
            let Ok(mut s) = state.try_borrow_mut() else {
                return;
            };
            s.set_auto_rotate(enabled);
        }),
    };

    let grid_state = Rc::downgrade(state);
    let grid_platform: Weak<P> = Rc::downgrade(platform);
    let grid = Toggle {
        label: LABEL_GRID.to_string(),
        checked: show_grid,
        on_change: Box::new(move |visible| {
            let (Some(platform), Some(state)) = (grid_platform.upgrade(), grid_state.upgrade())
            else {
                return;
            };
            let Ok(mut s) = state.try_borrow_mut() else {
                return;
            };
            s.set_grid_visible(platform.engine(), visible);
        }),
    };

    let toolbar = platform
        .build_toolbar(vec![rotate, grid])
        .map_err(ViewerError::Toolbar)?;

    let mut s = state.borrow_mut();
    let container = s
        .container
        .clone()
        .ok_or_else(|| ViewerError::Toolbar(PlatformError::new("viewer is not attached")))?;
    platform
        .append_to(&container, toolbar.node())
        .map_err(ViewerError::Toolbar)?;
    s.toolbar = Some(toolbar);
    debug!("Toolbar attached");
    Ok(())
}
