//! stlview core - Embedded STL viewer lifecycle
//!
//! This crate drives interactive 3D viewers embedded in a document:
//! - Declarative options read from host element attributes
//! - Scene assembly, mesh normalization and camera framing
//! - Size tracking, the per-frame render loop and an optional toolbar
//! - A page-wide registry that creates and tears down viewers
//!
//! It is host-agnostic. A platform backend (see `stlview-web`) implements
//! the traits in [`platform`] for a real document and rendering engine.

pub mod config;
pub mod error;
pub mod options;
pub mod platform;
pub mod registry;
pub mod scene;
pub mod size;
pub mod toolbar;
pub mod viewer;

mod loader;
mod render_loop;
mod resize;

#[cfg(test)]
mod testing;

pub use config::{UpAxis, ViewerConfig};
pub use error::{ConfigError, LoadError, PlatformError, ViewerError};
pub use options::{Rgb, ViewerOptions};
pub use registry::{install, Registry};
pub use scene::{Aabb, Placement};
pub use size::Size;
pub use viewer::{LoadStatus, Viewer};
