//! stlview web - Browser backend for embedded STL viewers
//!
//! Loading the wasm module scans the page for viewer hosts and keeps them in
//! sync with page changes. A few functions are exported for pages that swap
//! content without a `document$` observable.

mod engine;
mod loader;
mod platform;
mod three;

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use js_sys::{Reflect, JSON};
use stlview_core::{install, ConfigError, Registry, ViewerConfig};
use tracing::{error, info};
use wasm_bindgen::prelude::*;

use crate::platform::WebPlatform;

/// Global a page may define before the module loads to override defaults
const CONFIG_GLOBAL: &str = "stlViewerConfig";

thread_local! {
    static REGISTRY: RefCell<Option<Rc<RefCell<Registry<WebPlatform>>>>> = const { RefCell::new(None) };
}

/// Read `window.stlViewerConfig`, if present
fn read_config() -> Result<ViewerConfig, String> {
    let Some(window) = web_sys::window() else {
        return Ok(ViewerConfig::default());
    };
    let value = Reflect::get(&window, &JsValue::from_str(CONFIG_GLOBAL))
        .map_err(|e| format!("{e:?}"))?;
    if value.is_undefined() || value.is_null() {
        return Ok(ViewerConfig::default());
    }

    let json = JSON::stringify(&value).map_err(|e| format!("{e:?}"))?;
    ViewerConfig::from_json(&String::from(json)).map_err(|e: ConfigError| e.to_string())
}

fn with_registry<R>(f: impl FnOnce(&mut Registry<WebPlatform>) -> R) -> Option<R> {
    REGISTRY.with(|slot| {
        let registry = slot.borrow().clone()?;
        let mut registry = registry.try_borrow_mut().ok()?;
        Some(f(&mut registry))
    })
}

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    let config = read_config();
    let level = config
        .as_ref()
        .ok()
        .and_then(|c| tracing::Level::from_str(&c.log_level).ok())
        .unwrap_or(tracing::Level::WARN);
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(level)
            .build(),
    );

    let config = config.unwrap_or_else(|e| {
        error!(error = %e, "Invalid viewer configuration; using defaults");
        ViewerConfig::default()
    });

    let platform = match WebPlatform::new() {
        Ok(platform) => Rc::new(platform),
        Err(e) => {
            error!(error = %e, "Viewer backend unavailable");
            return;
        }
    };

    let registry = install(platform, config);
    info!(viewers = registry.borrow().len(), "STL viewers installed");
    REGISTRY.with(|slot| *slot.borrow_mut() = Some(registry));
}

/// Dispose every viewer and rescan the page
#[wasm_bindgen]
pub fn refresh() {
    if with_registry(|r| r.on_page_changed()).is_none() {
        error!("Viewer registry unavailable; refresh ignored");
    }
}

/// Create viewers for hosts added since the last scan; returns how many
#[wasm_bindgen]
pub fn scan() -> usize {
    with_registry(|r| r.init_all()).unwrap_or(0)
}

#[wasm_bindgen(js_name = viewerCount)]
pub fn viewer_count() -> usize {
    with_registry(|r| r.len()).unwrap_or(0)
}
