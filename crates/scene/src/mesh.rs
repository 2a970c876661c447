use foundation::bounds::Aabb3;
use foundation::math::Vec3;

/// Indexed triangle mesh in scene coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshGeometry {
    pub positions: Vec<Vec3>,
    /// Flat triangle list, counter-clockwise when seen from outside.
    pub indices: Vec<u32>,
    /// `None` until the first vertex is pushed.
    pub bounds: Option<Aabb3>,
}

impl MeshGeometry {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_vertex(&mut self, p: Vec3) -> u32 {
        let idx = self.positions.len() as u32;
        self.positions.push(p);
        match self.bounds.as_mut() {
            Some(b) => b.extend(p),
            None => {
                let mut b = Aabb3::empty();
                b.extend(p);
                self.bounds = Some(b);
            }
        }
        idx
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| {
            [
                self.positions[t[0] as usize],
                self.positions[t[1] as usize],
                self.positions[t[2] as usize],
            ]
        })
    }

    /// Area-weighted smooth vertex normals.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for t in self.indices.chunks_exact(3) {
            let [a, b, c] = [t[0] as usize, t[1] as usize, t[2] as usize];
            let n = (self.positions[b] - self.positions[a]).cross(self.positions[c] - self.positions[a]);
            for i in [a, b, c] {
                normals[i] = normals[i] + n;
            }
        }
        normals
            .into_iter()
            .map(|n| n.normalize().unwrap_or(Vec3::new(0.0, 0.0, 1.0)))
            .collect()
    }
}

/// Polyline drawn on top of a solid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineGeometry {
    pub points: Vec<Vec3>,
}

/// 24-bit RGB color.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    pub const BLACK: Color = Color(0x000000);
    pub const WHITE: Color = Color(0xffffff);

    pub fn to_rgb_f32(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }

    pub fn to_rgba_f32(self, alpha: f32) -> [f32; 4] {
        let [r, g, b] = self.to_rgb_f32();
        [r, g, b, alpha]
    }
}

/// Phong surface parameters for a region solid.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub color: Color,
    pub emissive: Color,
    pub specular: Color,
    pub shininess: f32,
    pub opacity: f32,
}

pub const BASELINE_OPACITY: f32 = 0.8;
pub const EMPHASIS_OPACITY: f32 = 1.0;
pub const EMPHASIS_EMISSIVE: Color = Color(0x333333);

impl Material {
    pub fn region(color: Color) -> Self {
        Self {
            color,
            emissive: Color::BLACK,
            specular: Color(0x333333),
            shininess: 30.0,
            opacity: BASELINE_OPACITY,
        }
    }

    /// Hover emphasis: glow and full opacity.
    pub fn emphasized(self) -> Self {
        Self {
            emissive: EMPHASIS_EMISSIVE,
            opacity: EMPHASIS_OPACITY,
            ..self
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LineMaterial {
    pub color: Color,
    pub width_px: f32,
}

impl Default for LineMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            width_px: 2.0,
        }
    }
}

/// Fixed, ordered region palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Color>,
}

pub const REGION_PALETTE: [Color; 10] = [
    Color(0xd13a34),
    Color(0xff7e00),
    Color(0xfbbe00),
    Color(0x6eaa5e),
    Color(0x5555aa),
    Color(0x8e67d4),
    Color(0xe371b2),
    Color(0xe67c7c),
    Color(0x6dcff6),
    Color(0xffe74c),
];

impl Palette {
    /// Falls back to the default palette when `colors` is empty.
    pub fn new(colors: Vec<Color>) -> Self {
        if colors.is_empty() {
            return Self::default();
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// `index mod len`; a pure function of the feature index.
    pub fn color_for(&self, index: usize) -> Color {
        self.colors[index % self.colors.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: REGION_PALETTE.to_vec(),
        }
    }
}
