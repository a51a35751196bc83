//! Bounding box fold and fit-to-viewport transform.

use serde::Serialize;

use crate::projection::PlanePoint;
use crate::{BOX_EPSILON, FIT_FRACTION};

/// Axis-aligned box on the projected plane. Empty boxes keep their
/// +inf/-inf seed corners.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: PlanePoint,
    pub max: PlanePoint,
}

impl BoundingBox {
    pub const EMPTY: BoundingBox = BoundingBox {
        min: PlanePoint {
            x: f64::INFINITY,
            y: f64::INFINITY,
        },
        max: PlanePoint {
            x: f64::NEG_INFINITY,
            y: f64::NEG_INFINITY,
        },
    };

    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a PlanePoint>,
    {
        points.into_iter().fold(Self::EMPTY, |b, p| b.include(*p))
    }

    pub fn include(self, p: PlanePoint) -> Self {
        BoundingBox {
            min: PlanePoint {
                x: self.min.x.min(p.x),
                y: self.min.y.min(p.y),
            },
            max: PlanePoint {
                x: self.max.x.max(p.x),
                y: self.max.y.max(p.y),
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x + BOX_EPSILON
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y + BOX_EPSILON
    }

    pub fn center(&self) -> PlanePoint {
        PlanePoint {
            x: (self.min.x + self.max.x) / 2.0,
            y: (self.min.y + self.max.y) / 2.0,
        }
    }
}

/// Pan/zoom applied to the map container: translate, then scale.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportTransform {
    pub scale: f64,
    pub translate: (f64, f64),
}

impl ViewportTransform {
    pub const IDENTITY: ViewportTransform = ViewportTransform {
        scale: 1.0,
        translate: (0.0, 0.0),
    };

    /// Map a plane point through the transform.
    pub fn apply(&self, p: PlanePoint) -> PlanePoint {
        PlanePoint {
            x: self.translate.0 + self.scale * p.x,
            y: self.translate.1 + self.scale * p.y,
        }
    }
}

/// Fit `bounds` into `FIT_FRACTION` of a `width` x `height` viewport, capped
/// at `max_zoom`. Returns None for an empty box.
pub fn fit(
    bounds: &BoundingBox,
    width: f64,
    height: f64,
    max_zoom: f64,
) -> Option<ViewportTransform> {
    if bounds.is_empty() {
        return None;
    }

    let dx = bounds.width();
    let dy = bounds.height();
    let c = bounds.center();

    let scale = max_zoom.min(FIT_FRACTION / (dx / width).max(dy / height));
    Some(ViewportTransform {
        scale,
        translate: (width / 2.0 - scale * c.x, height / 2.0 - scale * c.y),
    })
}
