use std::f64::consts::PI;

use foundation::math::Vec3;
use foundation::viewport::Viewport;

use crate::camera::Camera3D;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitConfig {
    /// Fraction of the pending rotation applied per update.
    pub damping: f64,
    pub rotate_speed: f64,
    /// Polar angle is kept inside `[min_polar, PI - min_polar]`.
    pub min_polar: f64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            damping: 0.25,
            rotate_speed: 0.35,
            min_polar: 1e-6,
        }
    }
}

/// Damped orbit around the camera target.
///
/// Azimuth turns about the camera up axis, polar about the camera right
/// axis. Drag input accumulates; every `update` applies a `damping` share of
/// what is pending and keeps the rest for later frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitController {
    config: OrbitConfig,
    pending_azimuth: f64,
    pending_polar: f64,
}

const SETTLED: f64 = 1e-7;

impl OrbitController {
    pub fn new(config: OrbitConfig) -> Self {
        Self {
            config,
            pending_azimuth: 0.0,
            pending_polar: 0.0,
        }
    }

    pub fn config(&self) -> OrbitConfig {
        self.config
    }

    pub fn is_settled(&self) -> bool {
        self.pending_azimuth.abs() < SETTLED && self.pending_polar.abs() < SETTLED
    }

    /// Pointer drag in pixels. A drag across the full viewport height turns
    /// one full revolution times `rotate_speed`.
    pub fn drag(&mut self, dx_px: f64, dy_px: f64, viewport: Viewport) {
        if viewport.is_empty() || !dx_px.is_finite() || !dy_px.is_finite() {
            return;
        }
        let h = viewport.height as f64;
        self.pending_azimuth -= 2.0 * PI * dx_px / h * self.config.rotate_speed;
        self.pending_polar -= 2.0 * PI * dy_px / h * self.config.rotate_speed;
    }

    /// Advances the camera one frame. Returns `true` if it moved.
    pub fn update(&mut self, camera: &mut Camera3D) -> bool {
        if self.is_settled() {
            self.pending_azimuth = 0.0;
            self.pending_polar = 0.0;
            return false;
        }

        let damping = self.config.damping.clamp(0.0, 1.0);
        let d_azimuth = self.pending_azimuth * damping;
        let d_polar = self.pending_polar * damping;
        self.pending_azimuth -= d_azimuth;
        self.pending_polar -= d_polar;

        let Some(basis) = UpBasis::new(camera.up) else {
            return false;
        };
        let offset = camera.position - camera.target;
        let Some(mut spherical) = basis.to_spherical(offset) else {
            return false;
        };

        spherical.azimuth += d_azimuth;
        let min = self.config.min_polar;
        spherical.polar = (spherical.polar + d_polar).clamp(min, PI - min);

        let next = camera.target + basis.from_spherical(spherical);
        if !next.is_finite() {
            return false;
        }
        let moved = (next - camera.position).length() > 0.0;
        camera.position = next;
        moved
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(OrbitConfig::default())
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f64,
    /// Around the up axis.
    azimuth: f64,
    /// Angle from the up axis.
    polar: f64,
}

/// Orthonormal frame whose second axis is the camera up vector.
#[derive(Debug, Copy, Clone)]
struct UpBasis {
    a: Vec3,
    up: Vec3,
    b: Vec3,
}

impl UpBasis {
    fn new(up: Vec3) -> Option<Self> {
        let up = up.normalize()?;
        let seed = if up.x.abs() < 0.9 {
            Vec3::new(1.0, 0.0, 0.0)
        } else {
            Vec3::new(0.0, 0.0, 1.0)
        };
        let a = seed.cross(up).cross(up).scale(-1.0).normalize()?;
        let b = a.cross(up);
        Some(Self { a, up, b })
    }

    fn to_spherical(&self, v: Vec3) -> Option<Spherical> {
        let radius = v.length();
        if radius <= 0.0 || !radius.is_finite() {
            return None;
        }
        let (x, y, z) = (v.dot(self.a), v.dot(self.up), v.dot(self.b));
        Some(Spherical {
            radius,
            azimuth: x.atan2(z),
            polar: (y / radius).clamp(-1.0, 1.0).acos(),
        })
    }

    fn from_spherical(&self, s: Spherical) -> Vec3 {
        let sin_p = s.polar.sin();
        let x = s.radius * sin_p * s.azimuth.sin();
        let y = s.radius * s.polar.cos();
        let z = s.radius * sin_p * s.azimuth.cos();
        self.a.scale(x) + self.up.scale(y) + self.b.scale(z)
    }
}
