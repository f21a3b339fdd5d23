//! Host element measurement

use serde::{Deserialize, Serialize};

use crate::platform::HostElement;

/// Width and height in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }
}

/// Current rendered size of `element`, never zero in either dimension.
///
/// Each dimension prefers the on-screen bounding box, then the client box,
/// then `fallback`. Elements inside hidden tabs report zero until they are
/// shown, which would otherwise yield a NaN camera aspect.
pub fn measure<E: HostElement>(element: &E, fallback: Size) -> Size {
    let rect = element.bounding_size();
    let client = element.client_size();

    Size {
        width: first_positive(&[rect.width, client.width], fallback.width),
        height: first_positive(&[rect.height, client.height], fallback.height),
    }
}

fn first_positive(candidates: &[f64], fallback: f64) -> f64 {
    candidates
        .iter()
        .copied()
        .find(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(fallback)
}
