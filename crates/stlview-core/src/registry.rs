//! Viewer registry and page lifecycle
//!
//! The registry is the single owner of every live viewer, keyed by host
//! element identity. An element has an entry exactly when it has a live
//! viewer, so a rescan never initializes an element twice and a page change
//! can dispose everything it previously created.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, info};

use crate::config::ViewerConfig;
use crate::platform::Platform;
use crate::viewer::Viewer;

pub struct Registry<P: Platform> {
    platform: Rc<P>,
    config: Rc<ViewerConfig>,
    viewers: Vec<Viewer<P>>,
}

impl<P: Platform> Registry<P> {
    pub fn new(platform: Rc<P>, config: ViewerConfig) -> Self {
        Self {
            platform,
            config: Rc::new(config),
            viewers: Vec::new(),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    /// Create a viewer for every matching element that does not have one.
    ///
    /// Returns the number of viewers created. A failure on one element is
    /// logged and does not stop the scan.
    pub fn init_all(&mut self) -> usize {
        let hosts = self.platform.query_hosts(&self.config.selector);
        let mut created = 0;

        for host in hosts {
            if self.viewer(&host).is_some() {
                continue;
            }
            match Viewer::create(self.platform.clone(), host, self.config.clone()) {
                Ok(viewer) => {
                    self.viewers.push(viewer);
                    created += 1;
                }
                Err(e) => error!(error = %e, "Failed to create viewer"),
            }
        }

        debug!(created, total = self.viewers.len(), "Scanned for viewers");
        created
    }

    /// Dispose every viewer and forget its element
    pub fn dispose_all(&mut self) {
        let count = self.viewers.len();
        for viewer in self.viewers.drain(..) {
            viewer.dispose();
        }
        debug!(count, "Disposed all viewers");
    }

    /// Content was replaced: tear down everything, then rescan
    pub fn on_page_changed(&mut self) {
        self.dispose_all();
        let created = self.init_all();
        info!(created, "Page changed; viewers reinitialized");
    }

    pub fn viewer(&self, host: &P::Element) -> Option<&Viewer<P>> {
        self.viewers.iter().find(|v| v.host() == host)
    }

    pub fn len(&self) -> usize {
        self.viewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.viewers.is_empty()
    }
}

/// Create the page's registry and wire it to the document lifecycle.
///
/// Scans immediately, or once the document finishes loading, and rescans on
/// every page-changed notification the host framework emits.
pub fn install<P: Platform>(platform: Rc<P>, config: ViewerConfig) -> Rc<RefCell<Registry<P>>> {
    let registry = Rc::new(RefCell::new(Registry::new(platform.clone(), config)));

    if platform.is_loading() {
        let weak = Rc::downgrade(&registry);
        platform.when_ready(Box::new(move || {
            if let Some(registry) = weak.upgrade() {
                registry.borrow_mut().init_all();
            }
        }));
        debug!("Document loading; deferring scan");
    } else {
        registry.borrow_mut().init_all();
    }

    let weak = Rc::downgrade(&registry);
    let subscribed = platform.subscribe_page_changes(Box::new(move || {
        let Some(registry) = weak.upgrade() else {
            return;
        };
        let Ok(mut registry) = registry.try_borrow_mut() else {
            error!("Registry busy; ignoring page change");
            return;
        };
        registry.on_page_changed();
    }));
    debug!(subscribed, "Viewer registry installed");

    registry
}
