use foundation::ids::RegionId;

use crate::assembly::MapScene;
use crate::mesh::Material;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering(RegionId),
}

impl HoverState {
    pub fn region(self) -> Option<RegionId> {
        match self {
            HoverState::Idle => None,
            HoverState::Hovering(r) => Some(r),
        }
    }
}

/// What a pointer update did to the hover state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HoverTransition {
    Unchanged,
    Entered(RegionId),
    Changed { from: RegionId, to: RegionId },
    Left(RegionId),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RegionVisualState {
    pub baseline: Material,
    pub emphasized: bool,
}

impl RegionVisualState {
    pub fn material(&self) -> Material {
        if self.emphasized {
            self.baseline.emphasized()
        } else {
            self.baseline
        }
    }
}

/// Hover state plus the per-region visual table the renderer reads.
///
/// Invariant: at most one region is emphasized, and only while hovering.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightState {
    hover: HoverState,
    visuals: Vec<RegionVisualState>,
}

impl HighlightState {
    pub fn new(scene: &MapScene) -> Self {
        Self {
            hover: HoverState::Idle,
            visuals: scene
                .regions()
                .iter()
                .map(|r| RegionVisualState {
                    baseline: r.material,
                    emphasized: false,
                })
                .collect(),
        }
    }

    pub fn hover(&self) -> HoverState {
        self.hover
    }

    pub fn hovered(&self) -> Option<RegionId> {
        self.hover.region()
    }

    pub fn hovered_name<'a>(&self, scene: &'a MapScene) -> Option<&'a str> {
        self.hovered().and_then(|id| scene.region_name(id))
    }

    pub fn visual(&self, id: RegionId) -> Option<&RegionVisualState> {
        self.visuals.get(id.index())
    }

    pub fn material(&self, id: RegionId) -> Option<Material> {
        self.visual(id).map(RegionVisualState::material)
    }

    pub fn emphasized(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.visuals
            .iter()
            .enumerate()
            .filter(|(_, v)| v.emphasized)
            .map(|(i, _)| RegionId(i as u32))
    }

    /// Applies a pick result.
    ///
    /// Any hit resets every region before emphasizing the hit one, even when
    /// the hovered region did not change. Unknown ids are treated as a miss.
    pub fn update(&mut self, hit: Option<RegionId>) -> HoverTransition {
        let hit = hit.filter(|id| id.index() < self.visuals.len());
        let previous = self.hover;
        self.reset_all();

        match hit {
            Some(id) => {
                self.visuals[id.index()].emphasized = true;
                self.hover = HoverState::Hovering(id);
            }
            None => self.hover = HoverState::Idle,
        }

        match (previous, self.hover) {
            (HoverState::Idle, HoverState::Idle) => HoverTransition::Unchanged,
            (HoverState::Idle, HoverState::Hovering(to)) => HoverTransition::Entered(to),
            (HoverState::Hovering(from), HoverState::Idle) => HoverTransition::Left(from),
            (HoverState::Hovering(from), HoverState::Hovering(to)) if from == to => {
                HoverTransition::Unchanged
            }
            (HoverState::Hovering(from), HoverState::Hovering(to)) => {
                HoverTransition::Changed { from, to }
            }
        }
    }

    fn reset_all(&mut self) {
        for v in &mut self.visuals {
            v.emphasized = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{HighlightState, HoverState, HoverTransition};
    use crate::assembly::{MapScene, SceneConfig};
    use crate::mesh::{BASELINE_OPACITY, EMPHASIS_OPACITY};
    use foundation::ids::RegionId;
    use formats::{RegionFeature, RingPoint};
    use pretty_assertions::assert_eq;

    fn scene(n: usize) -> MapScene {
        let features: Vec<RegionFeature> = (0..n)
            .map(|i| {
                let dx = i as f64 * 3.0;
                RegionFeature {
                    name: Some(format!("R{i}")),
                    centroid: Some([dx + 0.5, 0.5]),
                    polygons: vec![vec![
                        [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]
                            .iter()
                            .map(|c| RingPoint::LonLat(c[0] + dx, c[1]))
                            .collect(),
                    ]],
                    properties: Default::default(),
                }
            })
            .collect();
        MapScene::from_features(&features, SceneConfig::default())
    }

    #[test]
    fn hover_sequence_keeps_at_most_one_emphasized() {
        let scene = scene(3);
        let mut state = HighlightState::new(&scene);

        assert_eq!(state.update(Some(RegionId(0))), HoverTransition::Entered(RegionId(0)));
        assert_eq!(state.emphasized().collect::<Vec<_>>(), vec![RegionId(0)]);

        assert_eq!(
            state.update(Some(RegionId(2))),
            HoverTransition::Changed {
                from: RegionId(0),
                to: RegionId(2)
            }
        );
        assert_eq!(state.emphasized().collect::<Vec<_>>(), vec![RegionId(2)]);

        assert_eq!(state.update(Some(RegionId(2))), HoverTransition::Unchanged);
        assert_eq!(state.emphasized().count(), 1);

        assert_eq!(state.update(None), HoverTransition::Left(RegionId(2)));
        assert_eq!(state.emphasized().count(), 0);
        assert_eq!(state.hover(), HoverState::Idle);
    }

    #[test]
    fn hover_then_leave_restores_baseline() {
        let scene = scene(2);
        let mut state = HighlightState::new(&scene);
        let a = scene.index().get("R0").expect("R0");

        state.update(Some(a));
        let emphasized = state.material(a).expect("material");
        assert_eq!(emphasized.opacity, EMPHASIS_OPACITY);
        assert_eq!(state.hovered_name(&scene), Some("R0"));

        state.update(None);
        for region in scene.regions() {
            let m = state.material(region.id).expect("material");
            assert_eq!(m, region.material);
            assert_eq!(m.opacity, BASELINE_OPACITY);
        }
        assert_eq!(state.hovered_name(&scene), None);
    }

    #[test]
    fn miss_while_idle_is_unchanged() {
        let scene = scene(1);
        let mut state = HighlightState::new(&scene);
        assert_eq!(state.update(None), HoverTransition::Unchanged);
    }

    #[test]
    fn unknown_region_counts_as_miss() {
        let scene = scene(1);
        let mut state = HighlightState::new(&scene);
        state.update(Some(RegionId(0)));
        assert_eq!(state.update(Some(RegionId(9))), HoverTransition::Left(RegionId(0)));
        assert_eq!(state.emphasized().count(), 0);
    }
}
