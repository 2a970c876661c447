use foundation::math::{Mat4, Vec3};
use foundation::viewport::Viewport;
use scene::picking::Ray;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraConfig {
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
    pub position: [f64; 3],
    pub target: [f64; 3],
    pub up: [f64; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_y_deg: 35.0,
            near: 1.0,
            far: 10_000.0,
            position: [0.0, -50.0, 70.0],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
        }
    }
}

/// Perspective camera looking at a fixed target.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Camera3D {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub near: f64,
    pub far: f64,
    pub aspect: f64,
}

impl Camera3D {
    pub fn from_config(config: &CameraConfig, viewport: Viewport) -> Self {
        let [px, py, pz] = config.position;
        let [tx, ty, tz] = config.target;
        let [ux, uy, uz] = config.up;
        Self {
            position: Vec3::new(px, py, pz),
            target: Vec3::new(tx, ty, tz),
            up: Vec3::new(ux, uy, uz),
            fov_y_rad: config.fov_y_deg.to_radians(),
            near: config.near,
            far: config.far,
            aspect: viewport.aspect().unwrap_or(1.0),
        }
    }

    /// Keeps the previous aspect for an empty viewport.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(aspect) = viewport.aspect() {
            self.aspect = aspect;
        }
    }

    pub fn view(&self) -> Option<Mat4> {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_z0(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Option<Mat4> {
        Some(self.projection().mul(&self.view()?))
    }

    /// World point to normalized device coordinates `[x, y, depth]`.
    ///
    /// Points at or behind the eye plane have no projection.
    pub fn project_to_ndc(&self, world: Vec3) -> Option<[f64; 3]> {
        let clip = self.view_proj()?.mul_vec4([world.x, world.y, world.z, 1.0]);
        let w = clip[3];
        if !w.is_finite() || w <= 1e-9 {
            return None;
        }
        let ndc = [clip[0] / w, clip[1] / w, clip[2] / w];
        ndc.iter().all(|v| v.is_finite()).then_some(ndc)
    }

    /// Ray from the eye through a point in normalized device coordinates.
    pub fn ray_through_ndc(&self, ndc_x: f64, ndc_y: f64) -> Option<Ray> {
        let forward = (self.target - self.position).normalize()?;
        let right = forward.cross(self.up).normalize()?;
        let up = right.cross(forward);

        let tan_half = (0.5 * self.fov_y_rad).tan();
        let dir = forward
            + right.scale(ndc_x * tan_half * self.aspect)
            + up.scale(ndc_y * tan_half);
        Some(Ray::new(self.position, dir.normalize()?))
    }

    pub fn ray_through_pixel(&self, x_px: f64, y_px: f64, viewport: Viewport) -> Option<Ray> {
        let [nx, ny] = viewport.to_ndc(x_px, y_px)?;
        self.ray_through_ndc(nx, ny)
    }
}

#[cfg(test)]
mod tests {
    use super::{Camera3D, CameraConfig};
    use foundation::math::Vec3;
    use foundation::viewport::Viewport;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn camera() -> Camera3D {
        Camera3D::from_config(&CameraConfig::default(), Viewport::new(800, 600))
    }

    #[test]
    fn target_projects_to_screen_center() {
        let ndc = camera().project_to_ndc(Vec3::ZERO).expect("visible");
        assert_close(ndc[0], 0.0);
        assert_close(ndc[1], 0.0);
        assert!((0.0..=1.0).contains(&ndc[2]));
    }

    #[test]
    fn points_behind_the_eye_do_not_project() {
        let cam = camera();
        let behind = cam.position + (cam.position - cam.target);
        assert_eq!(cam.project_to_ndc(behind), None);
    }

    #[test]
    fn center_ray_points_at_target() {
        let cam = camera();
        let ray = cam
            .ray_through_pixel(400.0, 300.0, Viewport::new(800, 600))
            .expect("ray");
        let to_target = (cam.target - cam.position).normalize().expect("dir");
        assert_close(ray.dir.dot(to_target), 1.0);
    }

    #[test]
    fn ray_and_projection_agree() {
        let cam = camera();
        let ray = cam.ray_through_ndc(0.3, -0.4).expect("ray");
        let ndc = cam.project_to_ndc(ray.at(40.0)).expect("visible");
        assert!((ndc[0] - 0.3).abs() < 1e-9);
        assert!((ndc[1] + 0.4).abs() < 1e-9);
    }

    #[test]
    fn north_is_up_on_screen() {
        let cam = camera();
        let north = cam.project_to_ndc(Vec3::new(0.0, 10.0, 0.0)).expect("visible");
        let east = cam.project_to_ndc(Vec3::new(10.0, 0.0, 0.0)).expect("visible");
        assert!(north[1] > 0.0);
        assert!(east[0] > 0.0);
    }

    #[test]
    fn resize_updates_aspect_but_ignores_empty() {
        let mut cam = camera();
        cam.set_viewport(Viewport::new(1000, 500));
        assert_close(cam.aspect, 2.0);
        cam.set_viewport(Viewport::new(0, 0));
        assert_close(cam.aspect, 2.0);
    }
}
