/// Drawable surface size in pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width over height; `None` for an empty viewport.
    pub fn aspect(self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        Some(self.width as f64 / self.height as f64)
    }

    /// Pixel (y down) to normalized device coordinates (y up).
    pub fn to_ndc(self, x_px: f64, y_px: f64) -> Option<[f64; 2]> {
        if self.is_empty() || !x_px.is_finite() || !y_px.is_finite() {
            return None;
        }
        let w = self.width as f64;
        let h = self.height as f64;
        Some([(x_px / w) * 2.0 - 1.0, -(y_px / h) * 2.0 + 1.0])
    }

    /// Normalized device coordinates back to pixels.
    pub fn ndc_to_px(self, ndc_x: f64, ndc_y: f64) -> [f64; 2] {
        let w = self.width as f64;
        let h = self.height as f64;
        [(ndc_x + 1.0) * 0.5 * w, (1.0 - ndc_y) * 0.5 * h]
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}
