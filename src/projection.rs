//! Spherical Mercator projection from (longitude, latitude) degrees to the
//! viewport plane.
//!
//! x = scale * lambda + tx
//! y = ty - scale * ln(tan(pi/4 + phi/2))
//!
//! Plane y grows downward, so northern points have smaller y.

use std::f64::consts::FRAC_PI_4;

use serde::Serialize;

/// Latitude beyond which Mercator y diverges
const MAX_LATITUDE: f64 = 85.0511287798;

fn deg2rad(d: f64) -> f64 {
    d.to_radians()
}

/// Point on the projected plane
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlanePoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mercator {
    scale: f64,
    translate: (f64, f64),
}

impl Mercator {
    pub fn new(scale: f64, translate: (f64, f64)) -> Self {
        Self { scale, translate }
    }

    /// Project a (longitude, latitude) pair. Returns None for non-finite input.
    pub fn project(&self, lon: f64, lat: f64) -> Option<PlanePoint> {
        if !lon.is_finite() || !lat.is_finite() {
            return None;
        }
        let lambda = deg2rad(lon);
        let phi = deg2rad(lat.clamp(-MAX_LATITUDE, MAX_LATITUDE));
        let y = (FRAC_PI_4 + phi / 2.0).tan().ln();

        Some(PlanePoint {
            x: self.scale * lambda + self.translate.0,
            y: self.translate.1 - self.scale * y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_lands_on_translate() {
        let proj = Mercator::new(800.0, (-1300.0, 0.0));
        let p = proj.project(0.0, 0.0).unwrap();
        assert!((p.x + 1300.0).abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn melbourne_is_inside_default_viewport() {
        let proj = Mercator::new(800.0, (-1300.0, 0.0));
        let p = proj.project(144.96, -37.81).unwrap();
        assert!(p.x > 0.0 && p.x < 1200.0, "x = {}", p.x);
        assert!(p.y > 0.0 && p.y < 800.0, "y = {}", p.y);
    }

    #[test]
    fn south_projects_below_north() {
        let proj = Mercator::new(800.0, (-1300.0, 0.0));
        let darwin = proj.project(130.84, -12.46).unwrap();
        let hobart = proj.project(147.33, -42.88).unwrap();
        assert!(hobart.y > darwin.y);
        assert!(hobart.x > darwin.x);
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let proj = Mercator::new(800.0, (0.0, 0.0));
        assert!(proj.project(f64::NAN, 0.0).is_none());
        assert!(proj.project(0.0, f64::INFINITY).is_none());
    }
}
