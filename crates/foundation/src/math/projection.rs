//! Planar map projection.
//!
//! Spherical Mercator in the d3 convention: projected `y` grows downwards
//! (screen orientation). Scene placement flips `y` (see [`Projector::to_scene`]).

use super::Vec2;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ProjectorConfig {
    /// `[lon, lat]` in degrees that lands on `translate`.
    pub center: [f64; 2],
    /// Projected units per radian.
    pub scale: f64,
    pub translate: [f64; 2],
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            center: [104.0, 37.5],
            scale: 70.0,
            translate: [0.0, 0.0],
        }
    }
}

/// Fixed-parameter Mercator projector.
///
/// Projection is a pure function of the config; the cached center offsets
/// are derived once at construction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projector {
    config: ProjectorConfig,
    center_raw: [f64; 2],
}

impl Projector {
    pub fn new(config: ProjectorConfig) -> Self {
        let center_raw = mercator_raw(config.center[0], config.center[1]);
        Self { config, center_raw }
    }

    pub fn config(&self) -> ProjectorConfig {
        self.config
    }

    /// Project `[lon, lat]` degrees. Non-finite results are rejected.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<[f64; 2]> {
        if !lon_deg.is_finite() || !lat_deg.is_finite() {
            return None;
        }
        let [rx, ry] = mercator_raw(lon_deg, lat_deg);
        let k = self.config.scale;
        let x = self.config.translate[0] + k * (rx - self.center_raw[0]);
        let y = self.config.translate[1] - k * (ry - self.center_raw[1]);
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        Some([x, y])
    }

    /// Project into the scene plane, where north points towards +Y.
    pub fn to_scene(&self, lon_deg: f64, lat_deg: f64) -> Option<Vec2> {
        let [x, y] = self.project(lon_deg, lat_deg)?;
        Some(Vec2::new(x, -y))
    }
}

impl Default for Projector {
    fn default() -> Self {
        Self::new(ProjectorConfig::default())
    }
}

fn mercator_raw(lon_deg: f64, lat_deg: f64) -> [f64; 2] {
    let lambda = lon_deg.to_radians();
    let phi = lat_deg.to_radians();
    let y = (std::f64::consts::FRAC_PI_4 + 0.5 * phi).tan().ln();
    [lambda, y]
}

#[cfg(test)]
mod tests {
    use super::{Projector, ProjectorConfig};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_maps_to_translate() {
        let p = Projector::new(ProjectorConfig {
            center: [104.0, 37.5],
            scale: 70.0,
            translate: [3.0, -2.0],
        });
        let [x, y] = p.project(104.0, 37.5).expect("finite");
        assert_close(x, 3.0, 1e-9);
        assert_close(y, -2.0, 1e-9);
    }

    #[test]
    fn projection_is_deterministic() {
        let p = Projector::default();
        let a = p.project(116.4, 39.9);
        let b = p.project(116.4, 39.9);
        assert!(a.is_some());
        assert_eq!(a, b);
        assert_eq!(Projector::default().project(116.4, 39.9), a);
    }

    #[test]
    fn east_is_positive_x_and_north_is_negative_y() {
        let p = Projector::default();
        let [x, y] = p.project(105.0, 38.5).expect("finite");
        assert!(x > 0.0);
        assert!(y < 0.0);
        let scene = p.to_scene(105.0, 38.5).expect("finite");
        assert!(scene.y > 0.0);
    }

    #[test]
    fn longitude_scales_linearly() {
        let p = Projector::new(ProjectorConfig {
            center: [0.0, 0.0],
            scale: 1.0,
            translate: [0.0, 0.0],
        });
        let [x, _] = p.project(180.0, 0.0).expect("finite");
        assert_close(x, std::f64::consts::PI, 1e-12);
    }

    #[test]
    fn rejects_poles_and_non_finite_input() {
        let p = Projector::default();
        assert!(p.project(0.0, -90.0).is_none());
        assert!(p.project(0.0, 120.0).is_none());
        assert!(p.project(f64::NAN, 10.0).is_none());
        assert!(p.project(10.0, f64::INFINITY).is_none());
    }
}
