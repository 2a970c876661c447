use crate::math::Vec3;

/// Axis-aligned bounding box in 3D.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Aabb3 {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Aabb3 { min, max }
    }

    /// An inverted box that any `extend` call will replace.
    pub fn empty() -> Self {
        Aabb3 {
            min: [f64::INFINITY; 3],
            max: [f64::NEG_INFINITY; 3],
        }
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn extend(&mut self, p: Vec3) {
        let v = [p.x, p.y, p.z];
        for axis in 0..3 {
            self.min[axis] = self.min[axis].min(v[axis]);
            self.max[axis] = self.max[axis].max(v[axis]);
        }
    }

    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        let mut out = *self;
        for axis in 0..3 {
            out.min[axis] = out.min[axis].min(other.min[axis]);
            out.max[axis] = out.max[axis].max(other.max[axis]);
        }
        out
    }

    pub fn intersects(&self, other: &Aabb3) -> bool {
        (0..3).all(|axis| self.min[axis] <= other.max[axis] && other.min[axis] <= self.max[axis])
    }

    pub fn contains(&self, p: Vec3) -> bool {
        let v = [p.x, p.y, p.z];
        (0..3).all(|axis| v[axis] >= self.min[axis] && v[axis] <= self.max[axis])
    }
}

/// Slab test. Returns the entry distance along `dir` clamped to `t_min`.
pub fn ray_aabb_hit_t(
    origin: [f64; 3],
    dir: [f64; 3],
    bounds: &Aabb3,
    mut t_min: f64,
    mut t_max: f64,
) -> Option<f64> {
    for axis in 0..3 {
        let o = origin[axis];
        let d = dir[axis];
        let (min, max) = (bounds.min[axis], bounds.max[axis]);

        if d.abs() < 1e-12 {
            if o < min || o > max {
                return None;
            }
            continue;
        }

        let inv = 1.0 / d;
        let mut t1 = (min - o) * inv;
        let mut t2 = (max - o) * inv;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }

        t_min = t_min.max(t1);
        t_max = t_max.min(t2);
        if t_max < t_min {
            return None;
        }
    }

    Some(t_min)
}
