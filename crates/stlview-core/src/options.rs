//! Declarative viewer options read from host element attributes
//!
//! Recognized attributes:
//! - `data-src` - mesh URI (required)
//! - `data-color` - mesh tint, `#rrggbb` or `#rgb`
//! - `data-bg` - background color
//! - `data-grid`, `data-autorotate`, `data-controls`, `data-axes` - "true"/"false"
//! - `data-up` - model up axis, "y" or "z"
//!
//! Malformed values never fail; they fall back to the defaults below.

use crate::config::{UpAxis, ViewerConfig};
use crate::platform::HostElement;

pub const ATTR_SRC: &str = "data-src";
pub const ATTR_COLOR: &str = "data-color";
pub const ATTR_BACKGROUND: &str = "data-bg";
pub const ATTR_GRID: &str = "data-grid";
pub const ATTR_AUTOROTATE: &str = "data-autorotate";
pub const ATTR_CONTROLS: &str = "data-controls";
pub const ATTR_AXES: &str = "data-axes";
pub const ATTR_UP: &str = "data-up";

pub const DEFAULT_COLOR: Rgb = Rgb::from_u32(0x4b9fea);
pub const DEFAULT_BACKGROUND: Rgb = Rgb::from_u32(0x1e2129);

/// An 8-bit-per-channel color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn from_u32(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as u8,
            g: ((hex >> 8) & 0xff) as u8,
            b: (hex & 0xff) as u8,
        }
    }

    pub fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn parse_hex(value: &str) -> Option<Self> {
        let digits = value.trim().strip_prefix('#')?;
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match digits.len() {
            6 => u32::from_str_radix(digits, 16).ok().map(Self::from_u32),
            3 => {
                let expanded: String = digits.chars().flat_map(|c| [c, c]).collect();
                u32::from_str_radix(&expanded, 16).ok().map(Self::from_u32)
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Immutable per-instance configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    /// Mesh URI; `None` when absent or blank
    pub src: Option<String>,
    pub color: Rgb,
    pub background: Rgb,
    pub show_grid: bool,
    pub show_axes: bool,
    pub auto_rotate: bool,
    pub show_toolbar: bool,
    pub up_axis: UpAxis,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            src: None,
            color: DEFAULT_COLOR,
            background: DEFAULT_BACKGROUND,
            show_grid: true,
            show_axes: false,
            auto_rotate: false,
            show_toolbar: false,
            up_axis: UpAxis::default(),
        }
    }
}

impl ViewerOptions {
    /// Read options from `element`, filling gaps from defaults and `config`
    pub fn from_element<E: HostElement>(element: &E, config: &ViewerConfig) -> Self {
        let defaults = Self::default();
        let attr = |name: &str| element.attribute(name);

        Self {
            src: attr(ATTR_SRC)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            color: attr(ATTR_COLOR)
                .and_then(|v| Rgb::parse_hex(&v))
                .unwrap_or(defaults.color),
            background: attr(ATTR_BACKGROUND)
                .and_then(|v| Rgb::parse_hex(&v))
                .unwrap_or(defaults.background),
            show_grid: parse_bool(attr(ATTR_GRID).as_deref(), defaults.show_grid),
            show_axes: parse_bool(attr(ATTR_AXES).as_deref(), defaults.show_axes),
            auto_rotate: parse_bool(attr(ATTR_AUTOROTATE).as_deref(), defaults.auto_rotate),
            show_toolbar: parse_bool(attr(ATTR_CONTROLS).as_deref(), defaults.show_toolbar),
            up_axis: attr(ATTR_UP)
                .and_then(|v| UpAxis::parse(&v))
                .unwrap_or(config.framing.up_axis),
        }
    }
}

/// Absent => `default`; otherwise true only for a case-insensitive "true"
pub fn parse_bool(value: Option<&str>, default: bool) -> bool {
    match value {
        None => default,
        Some(v) => v.eq_ignore_ascii_case("true"),
    }
}
