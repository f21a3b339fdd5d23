//! Browser document backend
//!
//! Host elements are DOM elements and resize tracking uses `ResizeObserver`.
//! Frames come from `requestAnimationFrame`. Each viewer draws inside a
//! relatively positioned wrapper so its toolbar overlays its own canvas, and
//! toolbar inputs are plain checkboxes with `change` listeners.

use gloo_events::EventListener;
use gloo_render::{request_animation_frame, AnimationFrame};
use js_sys::{Function, Reflect};
use stlview_core::error::PlatformError;
use stlview_core::platform::{
    FrameScheduler, HostElement, Platform, ResizeWatch, Toggle, ToolbarView,
};
use stlview_core::Size;
use tracing::{debug, error, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlInputElement, ResizeObserver};

use crate::engine::ThreeEngine;
use crate::loader::StlLoader;

/// Property the host framework publishes its page-change observable under
const PAGE_OBSERVABLE: &str = "document$";

const CONTAINER_CLASS: &str = "stl-viewer-frame";
const CONTAINER_STYLE: &str = "position:relative;width:100%;height:100%;";

const TOOLBAR_CLASS: &str = "stl-viewer-toolbar";
const TOOLBAR_STYLE: &str = "position:absolute;top:8px;left:8px;display:flex;gap:12px;\
padding:4px 8px;border-radius:4px;background:rgba(0,0,0,0.45);color:#fff;font:12px sans-serif;";

pub(crate) fn js_error(value: JsValue) -> PlatformError {
    if let Some(e) = value.dyn_ref::<js_sys::Error>() {
        return PlatformError::new(String::from(e.message()));
    }
    PlatformError::new(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// A DOM element hosting a viewer
#[derive(Debug, Clone, PartialEq)]
pub struct WebHost(Element);

impl HostElement for WebHost {
    type Node = Element;
    type ResizeWatch = WebResizeWatch;

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn bounding_size(&self) -> Size {
        let rect = self.0.get_bounding_client_rect();
        Size::new(rect.width(), rect.height())
    }

    fn client_size(&self) -> Size {
        Size::new(self.0.client_width() as f64, self.0.client_height() as f64)
    }

    fn append_child(&self, node: &Element) -> Result<(), PlatformError> {
        self.0.append_child(node).map(|_| ()).map_err(js_error)
    }

    fn remove_child(&self, node: &Element) -> Result<(), PlatformError> {
        self.0.remove_child(node).map(|_| ()).map_err(js_error)
    }

    fn observe_resize(
        &self,
        on_resize: Box<dyn FnMut()>,
    ) -> Result<WebResizeWatch, PlatformError> {
        let callback = Closure::wrap(on_resize);
        let observer =
            ResizeObserver::new(callback.as_ref().unchecked_ref()).map_err(js_error)?;
        observer.observe(&self.0);
        Ok(WebResizeWatch {
            observer,
            _callback: callback,
            connected: true,
        })
    }
}

/// Owns the observer and its callback; disconnects on drop
pub struct WebResizeWatch {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut()>,
    connected: bool,
}

impl ResizeWatch for WebResizeWatch {
    fn disconnect(&mut self) {
        if self.connected {
            self.observer.disconnect();
            self.connected = false;
        }
    }
}

impl Drop for WebResizeWatch {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Checkbox bar; dropping it removes the input listeners
pub struct WebToolbar {
    node: Element,
    _listeners: Vec<EventListener>,
}

impl ToolbarView for WebToolbar {
    type Node = Element;

    fn node(&self) -> &Element {
        &self.node
    }
}

/// `requestAnimationFrame` scheduling; dropping the handle cancels
pub struct AnimationFrames;

impl FrameScheduler for AnimationFrames {
    type Handle = AnimationFrame;

    fn request_frame(&self, callback: Box<dyn FnOnce()>) -> AnimationFrame {
        request_animation_frame(move |_timestamp| callback())
    }
}

pub struct WebPlatform {
    document: Document,
    engine: ThreeEngine,
    loader: StlLoader,
    frames: AnimationFrames,
}

impl WebPlatform {
    pub fn new() -> Result<Self, PlatformError> {
        let window = web_sys::window().ok_or_else(|| PlatformError::new("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| PlatformError::new("no document"))?;

        Ok(Self {
            document,
            engine: ThreeEngine::new(window.device_pixel_ratio()),
            loader: StlLoader::new(),
            frames: AnimationFrames,
        })
    }

    fn toggle(&self, toggle: Toggle) -> Result<(Element, EventListener), JsValue> {
        let label = self.document.create_element("label")?;
        let input: HtmlInputElement = self.document.create_element("input")?.dyn_into()?;
        input.set_type("checkbox");
        input.set_checked(toggle.checked);
        label.append_child(&input)?;
        label.append_child(&self.document.create_text_node(&toggle.label))?;

        let mut on_change = toggle.on_change;
        let target = input.clone();
        let listener = EventListener::new(&input, "change", move |_event| {
            on_change(target.checked());
        });
        Ok((label, listener))
    }
}

impl Platform for WebPlatform {
    type Element = WebHost;
    type Engine = ThreeEngine;
    type Loader = StlLoader;
    type Frames = AnimationFrames;
    type Toolbar = WebToolbar;

    fn engine(&self) -> &ThreeEngine {
        &self.engine
    }

    fn loader(&self) -> &StlLoader {
        &self.loader
    }

    fn frames(&self) -> &AnimationFrames {
        &self.frames
    }

    fn query_hosts(&self, selector: &str) -> Vec<WebHost> {
        let list = match self.document.query_selector_all(selector) {
            Ok(list) => list,
            Err(e) => {
                error!(selector, error = %js_error(e), "Invalid viewer selector");
                return Vec::new();
            }
        };

        (0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(WebHost)
            .collect()
    }

    fn is_loading(&self) -> bool {
        self.document.ready_state() == "loading"
    }

    fn when_ready(&self, callback: Box<dyn FnOnce()>) {
        EventListener::once(&self.document, "DOMContentLoaded", move |_event| callback()).forget();
    }

    fn build_container(&self) -> Result<Element, PlatformError> {
        let node = self.document.create_element("div").map_err(js_error)?;
        node.set_class_name(CONTAINER_CLASS);
        node.set_attribute("style", CONTAINER_STYLE).map_err(js_error)?;
        Ok(node)
    }

    fn append_to(&self, parent: &Element, child: &Element) -> Result<(), PlatformError> {
        parent.append_child(child).map(|_| ()).map_err(js_error)
    }

    fn build_toolbar(&self, toggles: Vec<Toggle>) -> Result<WebToolbar, PlatformError> {
        let node = self.document.create_element("div").map_err(js_error)?;
        node.set_class_name(TOOLBAR_CLASS);
        node.set_attribute("style", TOOLBAR_STYLE).map_err(js_error)?;

        let mut listeners = Vec::with_capacity(toggles.len());
        for toggle in toggles {
            let (label, listener) = self.toggle(toggle).map_err(js_error)?;
            node.append_child(&label).map_err(js_error)?;
            listeners.push(listener);
        }

        Ok(WebToolbar {
            node,
            _listeners: listeners,
        })
    }

    fn subscribe_page_changes(&self, mut on_change: Box<dyn FnMut()>) -> bool {
        let Some(window) = web_sys::window() else {
            return false;
        };
        let observable = match Reflect::get(&window, &JsValue::from_str(PAGE_OBSERVABLE)) {
            Ok(value) if value.is_object() => value,
            _ => return false,
        };
        let subscribe = match Reflect::get(&observable, &JsValue::from_str("subscribe")) {
            Ok(value) => match value.dyn_into::<Function>() {
                Ok(f) => f,
                Err(_) => return false,
            },
            Err(_) => return false,
        };

        let callback = Closure::wrap(Box::new(move |_page: JsValue| on_change()) as Box<dyn FnMut(JsValue)>);
        if let Err(e) = subscribe.call1(&observable, callback.as_ref()) {
            warn!(error = %js_error(e), "Failed to subscribe to page changes");
            return false;
        }
        // The subscription lives as long as the page
        callback.forget();
        debug!("Subscribed to page changes");
        true
    }
}
