use super::Vec3;

/// Column-major 4x4 matrix: `m[col][row]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub m: [[f64; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Right-handed perspective projection with a `[0, 1]` depth range.
    pub fn perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (0.5 * fov_y_rad).tan();
        let m00 = f / aspect;
        let m11 = f;
        let m22 = far / (near - far);
        let m23 = (near * far) / (near - far);

        Self {
            m: [
                [m00, 0.0, 0.0, 0.0],
                [0.0, m11, 0.0, 0.0],
                [0.0, 0.0, m22, -1.0],
                [0.0, 0.0, m23, 0.0],
            ],
        }
    }

    /// Right-handed view matrix. Returns `None` when `up` is parallel to the
    /// view direction or `eye == target`.
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Option<Self> {
        let f = (target - eye).normalize()?;
        let s = f.cross(up).normalize()?;
        let u = s.cross(f);

        Some(Self {
            m: [
                [s.x, u.x, -f.x, 0.0],
                [s.y, u.y, -f.y, 0.0],
                [s.z, u.z, -f.z, 0.0],
                [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
            ],
        })
    }

    pub fn mul(&self, b: &Mat4) -> Mat4 {
        let a = &self.m;
        let mut c = [[0.0f64; 4]; 4];
        for col in 0..4 {
            for row in 0..4 {
                c[col][row] = a[0][row] * b.m[col][0]
                    + a[1][row] * b.m[col][1]
                    + a[2][row] * b.m[col][2]
                    + a[3][row] * b.m[col][3];
            }
        }
        Mat4 { m: c }
    }

    pub fn mul_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let m = &self.m;
        let mut out = [0.0f64; 4];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = m[0][row] * v[0] + m[1][row] * v[1] + m[2][row] * v[2] + m[3][row] * v[3];
        }
        out
    }
}
