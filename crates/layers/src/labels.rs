use foundation::ids::RegionId;
use foundation::math::Vec3;
use foundation::viewport::Viewport;
use gpu::{Camera3D, RenderCommand, RenderFrame, TextStyle};
use scene::MapScene;

use crate::layer::{Layer, LayerId};

pub trait LabelProjector {
    /// World point to normalized device `[x, y]`; `None` when not in front
    /// of the viewer.
    fn project_ndc(&self, world: Vec3) -> Option<[f64; 2]>;
}

impl LabelProjector for Camera3D {
    fn project_ndc(&self, world: Vec3) -> Option<[f64; 2]> {
        self.project_to_ndc(world).map(|[x, y, _]| [x, y])
    }
}

/// Order in which candidates compete for screen space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LabelPriority {
    /// Region order; earlier regions win overlaps.
    #[default]
    InputOrder,
    /// Higher `LabelCandidate::priority` first, region order among equals.
    Explicit,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LabelLayoutConfig {
    pub viewport: Viewport,
    pub style: TextStyle,
    pub hovered_style: TextStyle,
    pub priority: LabelPriority,
}

impl Default for LabelLayoutConfig {
    fn default() -> Self {
        let style = TextStyle::default();
        Self {
            viewport: Viewport::default(),
            style,
            hovered_style: TextStyle {
                font_px: 22.0,
                halo_px: 6.0,
                ..style
            },
            priority: LabelPriority::InputOrder,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelCandidate {
    pub region: RegionId,
    pub text: String,
    pub anchor: Vec3,
    pub priority: f32,
}

/// Screen rectangle in pixels, y down.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenBox {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenBox {
    /// Boxes that merely touch count as overlapping.
    pub fn overlaps(&self, other: &ScreenBox) -> bool {
        let apart = self.left + self.width < other.left
            || self.top + self.height < other.top
            || other.left + other.width < self.left
            || other.top + other.height < self.top;
        !apart
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLabel {
    pub region: RegionId,
    pub text: String,
    pub bounds: ScreenBox,
    pub style: TextStyle,
    pub hovered: bool,
}

impl PlacedLabel {
    pub fn command(&self) -> RenderCommand {
        RenderCommand::Label {
            text: self.text.clone(),
            left_px: self.bounds.left,
            top_px: self.bounds.top,
            style: self.style,
        }
    }
}

/// One candidate per region that has both a name and a centroid, anchored on
/// the top face.
pub fn label_candidates(scene: &MapScene) -> Vec<LabelCandidate> {
    let depth = scene.label_depth();
    scene
        .regions()
        .iter()
        .filter_map(|region| {
            let text = region.name.as_deref()?;
            Some(LabelCandidate {
                region: region.id,
                text: text.to_string(),
                anchor: region.label_anchor(depth)?,
                priority: 0.0,
            })
        })
        .collect()
}

/// Greedy screen-space placement: a label is shown only if its box does not
/// overlap any label accepted before it.
///
/// The collision box always uses the base style so hovering never reshuffles
/// which labels are visible.
pub fn layout_labels<P: LabelProjector>(
    candidates: &[LabelCandidate],
    projector: &P,
    hovered: Option<RegionId>,
    config: &LabelLayoutConfig,
) -> Vec<PlacedLabel> {
    if config.viewport.is_empty() {
        return Vec::new();
    }
    let w = config.viewport.width as f64;
    let h = config.viewport.height as f64;

    let mut order: Vec<&LabelCandidate> = candidates.iter().collect();
    if config.priority == LabelPriority::Explicit {
        order.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    }

    let mut placed: Vec<PlacedLabel> = Vec::new();
    for candidate in order {
        let Some([x, y]) = projector.project_ndc(candidate.anchor) else {
            continue;
        };
        if !x.is_finite() || !y.is_finite() || x.abs() > 1.0 || y.abs() > 1.0 {
            continue;
        }

        let font = config.style.font_px as f64;
        let bounds = ScreenBox {
            left: (x + 1.0) / 2.0 * w,
            top: (1.0 - y) / 2.0 * h,
            width: estimate_text_width(&candidate.text, font),
            height: font,
        };
        if placed.iter().any(|p| p.bounds.overlaps(&bounds)) {
            continue;
        }

        let is_hovered = hovered == Some(candidate.region);
        placed.push(PlacedLabel {
            region: candidate.region,
            text: candidate.text.clone(),
            bounds,
            style: if is_hovered {
                config.hovered_style
            } else {
                config.style
            },
            hovered: is_hovered,
        });
    }
    placed
}

/// Advance width estimate for a bold sans face.
pub fn estimate_text_width(text: &str, font_px: f64) -> f64 {
    text.chars()
        .map(|c| if is_wide(c) { font_px } else { font_px * 0.6 })
        .sum()
}

fn is_wide(c: char) -> bool {
    matches!(
        c as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

/// Per-frame screen labels. Nothing carries over between frames except the
/// configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelsLayer {
    id: LayerId,
    pub config: LabelLayoutConfig,
    candidates: Vec<LabelCandidate>,
    placed: Vec<PlacedLabel>,
}

impl LabelsLayer {
    pub fn new(id: u64, scene: &MapScene, config: LabelLayoutConfig) -> Self {
        Self {
            id: LayerId(id),
            config,
            candidates: label_candidates(scene),
            placed: Vec::new(),
        }
    }

    /// Applies caller priorities for `LabelPriority::Explicit`.
    pub fn set_priorities<F>(&mut self, mut priority_of: F)
    where
        F: FnMut(&str) -> Option<f32>,
    {
        for c in &mut self.candidates {
            c.priority = priority_of(&c.text).unwrap_or(0.0);
        }
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
    }

    pub fn update<P: LabelProjector>(&mut self, projector: &P, hovered: Option<RegionId>) {
        self.placed = layout_labels(&self.candidates, projector, hovered, &self.config);
    }

    pub fn candidates(&self) -> &[LabelCandidate] {
        &self.candidates
    }

    pub fn placed(&self) -> &[PlacedLabel] {
        &self.placed
    }
}

impl Layer for LabelsLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn emit(&self, frame: &mut RenderFrame) {
        for label in &self.placed {
            frame.push(label.command());
        }
    }
}
