use foundation::math::{Projector, Vec2, Vec3};
use formats::{RegionFeature, Ring};

use crate::extrude::{ExtrudeSettings, extrude_outline};
use crate::mesh::{LineGeometry, MeshGeometry};

/// Solid plus border for one ring. Rings without area keep only the border.
#[derive(Debug, Clone, PartialEq)]
pub struct RingMesh {
    pub solid: Option<MeshGeometry>,
    pub border: LineGeometry,
}

/// Counters for everything the builder skipped. None of these are errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct BuildStats {
    /// Entries that were not numeric pairs.
    pub malformed_points: usize,
    /// Pairs whose projection was not finite.
    pub rejected_points: usize,
    pub rings_built: usize,
    /// Rings with enough valid points but no extrudable area.
    pub border_only_rings: usize,
    /// Rings with fewer than [`MIN_RING_POINTS`] valid points.
    pub degenerate_rings: usize,
}

impl BuildStats {
    pub fn merge(&mut self, other: BuildStats) {
        self.malformed_points += other.malformed_points;
        self.rejected_points += other.rejected_points;
        self.rings_built += other.rings_built;
        self.border_only_rings += other.border_only_rings;
        self.degenerate_rings += other.degenerate_rings;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegionMeshes {
    pub rings: Vec<RingMesh>,
    pub stats: BuildStats,
}

/// Minimum number of valid points a ring needs before it is extruded.
pub const MIN_RING_POINTS: usize = 3;

/// Builds one border per usable ring of `feature`, plus a solid when the ring
/// encloses area.
///
/// Malformed points and rings with too few valid points are skipped; a
/// feature without any usable ring yields an empty result rather than an
/// error.
pub fn build_region_meshes(
    feature: &RegionFeature,
    projector: &Projector,
    settings: &ExtrudeSettings,
) -> RegionMeshes {
    let mut out = RegionMeshes::default();
    for ring in feature.rings() {
        let outline = project_ring(ring, projector, &mut out.stats);
        if outline.len() < MIN_RING_POINTS {
            out.stats.degenerate_rings += 1;
            tracing::debug!(
                region = feature.name.as_deref().unwrap_or("<unnamed>"),
                valid_points = outline.len(),
                "skipping ring with too few valid points"
            );
            continue;
        }

        let solid = extrude_outline(&outline, settings);
        if solid.is_none() {
            out.stats.border_only_rings += 1;
            tracing::debug!(
                region = feature.name.as_deref().unwrap_or("<unnamed>"),
                valid_points = outline.len(),
                "ring has no area; keeping border only"
            );
        }

        let z = settings.border_z();
        let border = LineGeometry {
            points: outline.iter().map(|p| Vec3::new(p.x, p.y, z)).collect(),
        };
        out.rings.push(RingMesh { solid, border });
        out.stats.rings_built += 1;
    }
    out
}

/// Valid projected points of a ring, in order, in scene orientation.
pub fn project_ring(ring: &Ring, projector: &Projector, stats: &mut BuildStats) -> Vec<Vec2> {
    let mut outline = Vec::with_capacity(ring.len());
    for point in ring {
        let Some((lon, lat)) = point.lon_lat() else {
            stats.malformed_points += 1;
            continue;
        };
        match projector.to_scene(lon, lat) {
            Some(p) => outline.push(p),
            None => stats.rejected_points += 1,
        }
    }
    outline
}
