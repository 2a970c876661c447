//! Outline extrusion with rounded bevels.
//!
//! A ring is swept along +Z through a stack of layers. Each layer is the
//! outline pushed outwards by a miter offset; bevel layers follow a quarter
//! circle so the solid's rim is rounded at both caps.

use std::f64::consts::FRAC_PI_2;

use earcutr::earcut;
use foundation::math::{Vec2, Vec3};

use crate::mesh::MeshGeometry;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ExtrudeSettings {
    pub depth: f64,
    pub bevel_enabled: bool,
    pub bevel_thickness: f64,
    pub bevel_size: f64,
    pub bevel_segments: u32,
    /// Height of border lines above the flat top face (`depth`).
    pub border_lift: f64,
}

impl Default for ExtrudeSettings {
    fn default() -> Self {
        Self {
            depth: 4.0,
            bevel_enabled: true,
            bevel_thickness: 0.2,
            bevel_size: 0.2,
            bevel_segments: 3,
            border_lift: 0.01,
        }
    }
}

impl ExtrudeSettings {
    pub fn border_z(&self) -> f64 {
        self.depth + self.border_lift
    }
}

const EPS: f64 = 1e-12;
const MAX_MITER: f64 = 4.0;

/// Drops consecutive duplicates and the closing point of a ring.
pub fn clean_outline(points: &[Vec2]) -> Vec<Vec2> {
    let mut out: Vec<Vec2> = Vec::with_capacity(points.len());
    for &p in points {
        if let Some(last) = out.last()
            && same_point(*last, p)
        {
            continue;
        }
        out.push(p);
    }
    while out.len() >= 2 && same_point(out[0], out[out.len() - 1]) {
        out.pop();
    }
    out
}

/// Shoelace area; positive for counter-clockwise rings.
pub fn signed_area(points: &[Vec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for i in 0..n {
        twice += points[i].perp_dot(points[(i + 1) % n]);
    }
    0.5 * twice
}

/// Extrudes a planar outline into a closed solid.
///
/// Returns `None` for rings that cannot produce a solid: fewer than three
/// distinct points, zero area, or an outline the triangulator rejects.
pub fn extrude_outline(outline: &[Vec2], settings: &ExtrudeSettings) -> Option<MeshGeometry> {
    let mut ring = clean_outline(outline);
    if ring.len() < 3 {
        return None;
    }
    let area = signed_area(&ring);
    if !area.is_finite() || area.abs() <= EPS {
        return None;
    }
    if area < 0.0 {
        ring.reverse();
    }

    let mut flat: Vec<f64> = Vec::with_capacity(ring.len() * 2);
    for p in &ring {
        flat.push(p.x);
        flat.push(p.y);
    }
    let cap = match earcut(&flat, &[], 2) {
        Ok(ix) if !ix.is_empty() => ix,
        Ok(_) => return None,
        Err(err) => {
            tracing::debug!(?err, points = ring.len(), "cap triangulation failed");
            return None;
        }
    };

    let n = ring.len();
    let dirs = miter_directions(&ring);
    let layers = layer_profile(settings);

    let mut mesh = MeshGeometry::default();
    for &(offset, z) in &layers {
        for (p, d) in ring.iter().zip(&dirs) {
            let q = *p + d.scale(offset);
            mesh.push_vertex(Vec3::new(q.x, q.y, z));
        }
    }

    for k in 0..layers.len() - 1 {
        let lo = (k * n) as u32;
        let hi = ((k + 1) * n) as u32;
        for i in 0..n {
            let a = lo + i as u32;
            let b = lo + ((i + 1) % n) as u32;
            let c = hi + ((i + 1) % n) as u32;
            let d = hi + i as u32;
            mesh.push_triangle(a, b, c);
            mesh.push_triangle(a, c, d);
        }
    }

    let top = ((layers.len() - 1) * n) as u32;
    for tri in cap.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        let ccw = (ring[i1] - ring[i0]).perp_dot(ring[i2] - ring[i0]) > 0.0;
        let (i1, i2) = if ccw { (i1, i2) } else { (i2, i1) };
        // Bottom faces -Z: reverse the winding.
        mesh.push_triangle(i0 as u32, i2 as u32, i1 as u32);
        mesh.push_triangle(top + i0 as u32, top + i1 as u32, top + i2 as u32);
    }

    Some(mesh)
}

/// `(outward offset, z)` per layer, bottom to top.
fn layer_profile(settings: &ExtrudeSettings) -> Vec<(f64, f64)> {
    let depth = settings.depth.max(0.0);
    if !settings.bevel_enabled || settings.bevel_segments == 0 {
        return vec![(0.0, 0.0), (0.0, depth)];
    }

    let segments = settings.bevel_segments;
    let size = settings.bevel_size;
    let thickness = settings.bevel_thickness;
    let mut out = Vec::with_capacity(2 * (segments as usize + 1));
    for step in 0..=segments {
        let a = step as f64 / segments as f64 * FRAC_PI_2;
        out.push((size * a.sin(), -thickness * a.cos()));
    }
    for step in (0..=segments).rev() {
        let a = step as f64 / segments as f64 * FRAC_PI_2;
        out.push((size * a.sin(), depth + thickness * a.cos()));
    }
    out
}

/// Per-vertex outward miter vectors for a counter-clockwise ring.
///
/// The vector length is the miter scale (clamped), so `p + dir * offset`
/// keeps every edge `offset` away from the original edge.
fn miter_directions(ring: &[Vec2]) -> Vec<Vec2> {
    let n = ring.len();
    (0..n)
        .map(|i| {
            let prev = ring[(i + n - 1) % n];
            let cur = ring[i];
            let next = ring[(i + 1) % n];
            match (outward_normal(prev, cur), outward_normal(cur, next)) {
                (Some(a), Some(b)) => match (a + b).normalize() {
                    Some(bisector) => {
                        let cos = bisector.dot(a);
                        if cos <= 1e-6 {
                            a
                        } else {
                            bisector.scale((1.0 / cos).min(MAX_MITER))
                        }
                    }
                    None => a,
                },
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => Vec2::new(0.0, 0.0),
            }
        })
        .collect()
}

fn outward_normal(a: Vec2, b: Vec2) -> Option<Vec2> {
    let d = b - a;
    Vec2::new(d.y, -d.x).normalize()
}

fn same_point(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() <= EPS && (a.y - b.y).abs() <= EPS
}
