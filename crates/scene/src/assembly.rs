use std::collections::HashMap;

use foundation::ids::{RegionId, SolidId};
use foundation::math::{Projector, ProjectorConfig, Vec2, Vec3};
use formats::{RegionDataset, RegionFeature};

use crate::builder::{BuildStats, build_region_meshes};
use crate::extrude::ExtrudeSettings;
use crate::mesh::{LineGeometry, LineMaterial, Material, MeshGeometry, Palette};
use crate::spatial::{Bvh, Item as BvhItem};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneConfig {
    pub projector: ProjectorConfig,
    pub extrude: ExtrudeSettings,
    pub palette: Palette,
    pub border: LineMaterial,
}

/// An extruded ring. Only solids of named regions carry a pick tag.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSolid {
    pub id: SolidId,
    pub region: RegionId,
    pub pickable: bool,
    pub mesh: MeshGeometry,
}

/// Per-region container: solids, borders and label metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionNode {
    pub id: RegionId,
    pub name: Option<String>,
    /// Projected centroid in scene orientation.
    pub centroid: Option<Vec2>,
    pub material: Material,
    pub solids: Vec<SolidId>,
    pub borders: Vec<LineGeometry>,
}

impl RegionNode {
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// World-space label anchor on the top face.
    pub fn label_anchor(&self, depth: f64) -> Option<Vec3> {
        self.centroid.map(|c| c.extend(depth))
    }
}

/// Region name → region id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionIndex {
    by_name: HashMap<String, RegionId>,
}

impl RegionIndex {
    pub fn get(&self, name: &str) -> Option<RegionId> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Returns `false` and keeps the existing entry if `name` is taken.
    fn insert(&mut self, name: &str, id: RegionId) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_string(), id);
        true
    }
}

/// The assembled map: one node per input feature, in input order.
#[derive(Debug, Clone)]
pub struct MapScene {
    config: SceneConfig,
    projector: Projector,
    regions: Vec<RegionNode>,
    solids: Vec<RegionSolid>,
    index: RegionIndex,
    bvh: Bvh,
    stats: BuildStats,
}

impl MapScene {
    pub fn build(dataset: &RegionDataset, config: SceneConfig) -> Self {
        Self::from_features(&dataset.features, config)
    }

    pub fn from_features(features: &[RegionFeature], config: SceneConfig) -> Self {
        let projector = Projector::new(config.projector);
        let mut scene = Self {
            config,
            projector,
            regions: Vec::with_capacity(features.len()),
            solids: Vec::new(),
            index: RegionIndex::default(),
            bvh: Bvh::default(),
            stats: BuildStats::default(),
        };

        for (i, feature) in features.iter().enumerate() {
            scene.add_region(i, feature);
        }

        let items = scene
            .solids
            .iter()
            .filter_map(|s| {
                s.mesh.bounds.map(|bounds| BvhItem {
                    solid: s.id,
                    bounds,
                })
            })
            .collect();
        scene.bvh = Bvh::build(items);

        tracing::info!(
            regions = scene.regions.len(),
            solids = scene.solids.len(),
            named = scene.index.len(),
            degenerate_rings = scene.stats.degenerate_rings,
            border_only_rings = scene.stats.border_only_rings,
            malformed_points = scene.stats.malformed_points,
            rejected_points = scene.stats.rejected_points,
            "assembled map scene"
        );
        scene
    }

    fn add_region(&mut self, feature_index: usize, feature: &RegionFeature) {
        let id = RegionId(self.regions.len() as u32);
        let built = build_region_meshes(feature, &self.projector, &self.config.extrude);
        self.stats.merge(built.stats);

        let mut pickable = false;
        if let Some(name) = feature.name.as_deref() {
            pickable = true;
            if !self.index.insert(name, id) {
                tracing::warn!(name, region = id.0, "duplicate region name; index keeps the first");
            }
        }

        let centroid = feature
            .centroid
            .and_then(|[lon, lat]| self.projector.to_scene(lon, lat));

        let mut node = RegionNode {
            id,
            name: feature.name.clone(),
            centroid,
            material: Material::region(self.config.palette.color_for(feature_index)),
            solids: Vec::with_capacity(built.rings.len()),
            borders: Vec::with_capacity(built.rings.len()),
        };
        for ring in built.rings {
            if let Some(mesh) = ring.solid {
                let solid_id = SolidId(self.solids.len() as u32);
                self.solids.push(RegionSolid {
                    id: solid_id,
                    region: id,
                    pickable,
                    mesh,
                });
                node.solids.push(solid_id);
            }
            node.borders.push(ring.border);
        }
        self.regions.push(node);
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn regions(&self) -> &[RegionNode] {
        &self.regions
    }

    pub fn region(&self, id: RegionId) -> Option<&RegionNode> {
        self.regions.get(id.index())
    }

    pub fn region_by_name(&self, name: &str) -> Option<&RegionNode> {
        self.index.get(name).and_then(|id| self.region(id))
    }

    pub fn region_name(&self, id: RegionId) -> Option<&str> {
        self.region(id).and_then(|r| r.name.as_deref())
    }

    pub fn index(&self) -> &RegionIndex {
        &self.index
    }

    pub fn solids(&self) -> &[RegionSolid] {
        &self.solids
    }

    pub fn solid(&self, id: SolidId) -> Option<&RegionSolid> {
        self.solids.get(id.index())
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Height of label anchors: the flat top face.
    pub fn label_depth(&self) -> f64 {
        self.config.extrude.depth
    }
}
