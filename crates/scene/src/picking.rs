use foundation::ids::{RegionId, SolidId};
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::assembly::MapScene;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir.scale(t)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub region: RegionId,
    pub solid: SolidId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Every solid surface along `ray`, nearest first.
///
/// Ordering contract:
/// - Hits are sorted by distance along the normalized ray.
/// - Equal distances are ordered by ascending `SolidId`.
///
/// Each solid contributes at most one hit: its nearest triangle. Border lines
/// are never intersected.
pub fn intersect_all(scene: &MapScene, ray: Ray, opts: PickOptions) -> Vec<PickHit> {
    let Some(dir) = ray.dir.normalize() else {
        return Vec::new();
    };
    let ray = Ray::new(ray.origin, dir);
    let origin = ray.origin.to_array();
    let dir_a = dir.to_array();

    let mut hits = Vec::new();
    for solid_id in scene.bvh().query_ray(origin, dir_a, 0.0, opts.max_distance) {
        let Some(solid) = scene.solid(solid_id) else {
            continue;
        };
        let nearest = solid
            .mesh
            .triangles()
            .filter_map(|tri| ray_triangle_t(&ray, tri))
            .filter(|t| *t <= opts.max_distance)
            .min_by(|a, b| stable_total_cmp_f64(*a, *b));
        if let Some(t) = nearest {
            hits.push(PickHit {
                region: solid.region,
                solid: solid_id,
                distance: t,
                point: ray.at(t),
            });
        }
    }

    hits.sort_by(|a, b| {
        stable_total_cmp_f64(a.distance, b.distance).then_with(|| a.solid.cmp(&b.solid))
    });
    hits
}

/// Nearest hit on a solid that belongs to a named region.
///
/// Untagged solids do not occlude: traversal skips them and keeps looking
/// further along the ray.
pub fn pick_ray(scene: &MapScene, ray: Ray, opts: PickOptions) -> Option<PickHit> {
    intersect_all(scene, ray, opts)
        .into_iter()
        .find(|hit| scene.solid(hit.solid).is_some_and(|s| s.pickable))
}

/// Screen picking wrapper.
///
/// The caller supplies a deterministic screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    scene: &MapScene,
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PickHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_ray(scene, ray, opts)
}

/// Name of the region under the pointer, if any.
pub fn pick_region_name<'a, F>(
    scene: &'a MapScene,
    x_px: f64,
    y_px: f64,
    make_ray: F,
) -> Option<&'a str>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let hit = pick_screen(scene, x_px, y_px, make_ray, PickOptions::default())?;
    scene.region_name(hit.region)
}

/// Double-sided Möller–Trumbore. Expects a normalized direction.
fn ray_triangle_t(ray: &Ray, [a, b, c]: [Vec3; 3]) -> Option<f64> {
    const EPS: f64 = 1e-12;

    let e1 = b - a;
    let e2 = c - a;
    let p = ray.dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv = 1.0 / det;

    let s = ray.origin - a;
    let u = s.dot(p) * inv;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.dir.dot(q) * inv;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(q) * inv;
    (t >= 0.0 && t.is_finite()).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::{PickOptions, Ray, intersect_all, pick_ray, pick_region_name, ray_triangle_t};
    use crate::assembly::{MapScene, SceneConfig};
    use foundation::ids::RegionId;
    use foundation::math::{ProjectorConfig, Vec3};
    use formats::{RegionFeature, RingPoint};

    fn square(name: Option<&str>, dx: f64, dy: f64) -> RegionFeature {
        let ring = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]
            .iter()
            .map(|c| RingPoint::LonLat(c[0] + dx, c[1] + dy))
            .collect();
        RegionFeature {
            name: name.map(str::to_string),
            centroid: Some([dx + 0.5, dy + 0.5]),
            polygons: vec![vec![ring]],
            properties: Default::default(),
        }
    }

    fn config() -> SceneConfig {
        SceneConfig {
            projector: ProjectorConfig {
                center: [0.0, 0.0],
                scale: 60.0,
                translate: [0.0, 0.0],
            },
            ..SceneConfig::default()
        }
    }

    fn down_at(scene: &MapScene, lon: f64, lat: f64) -> Ray {
        let p = scene.projector().to_scene(lon, lat).expect("finite");
        Ray::new(Vec3::new(p.x, p.y, 100.0), Vec3::new(0.0, 0.0, -1.0))
    }

    #[test]
    fn triangle_hit_is_double_sided() {
        let tri = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let down = Ray::new(Vec3::new(0.2, 0.2, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let up = Ray::new(Vec3::new(0.2, 0.2, -5.0), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(ray_triangle_t(&down, tri), Some(5.0));
        assert_eq!(ray_triangle_t(&up, tri), Some(5.0));

        let miss = Ray::new(Vec3::new(0.8, 0.8, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(ray_triangle_t(&miss, tri), None);
    }

    #[test]
    fn picks_the_region_under_the_ray() {
        let scene = MapScene::from_features(
            &[square(Some("A"), 0.0, 0.0), square(Some("B"), 10.0, 10.0)],
            config(),
        );
        let hit = pick_ray(&scene, down_at(&scene, 0.3, 0.6), PickOptions::default())
            .expect("hit A");
        assert_eq!(hit.region, RegionId(0));
        // Top cap sits at depth plus bevel thickness.
        assert!((hit.point.z - 4.2).abs() < 1e-9);

        let hit = pick_ray(&scene, down_at(&scene, 10.3, 10.6), PickOptions::default())
            .expect("hit B");
        assert_eq!(scene.region_name(hit.region), Some("B"));

        assert_eq!(pick_ray(&scene, down_at(&scene, 5.0, 5.0), PickOptions::default()), None);
    }

    #[test]
    fn untagged_solids_do_not_block_tagged_ones() {
        // An unnamed region stacked on top of a named one.
        let mut features = vec![square(None, 0.0, 0.0), square(Some("Below"), 0.0, 0.0)];
        features[0].centroid = None;
        let scene = MapScene::from_features(&features, config());

        let ray = down_at(&scene, 0.3, 0.6);
        let all = intersect_all(&scene, ray, PickOptions::default());
        assert_eq!(all.len(), 2);

        let hit = pick_ray(&scene, ray, PickOptions::default()).expect("tagged hit");
        assert_eq!(scene.region_name(hit.region), Some("Below"));
    }

    #[test]
    fn equal_distance_ties_break_by_solid_id() {
        let features = vec![square(Some("First"), 0.0, 0.0), square(Some("Second"), 0.0, 0.0)];
        let scene = MapScene::from_features(&features, config());
        let hit = pick_ray(&scene, down_at(&scene, 0.3, 0.6), PickOptions::default())
            .expect("hit");
        assert_eq!(scene.region_name(hit.region), Some("First"));
    }

    #[test]
    fn screen_wrapper_uses_caller_ray() {
        let scene = MapScene::from_features(&[square(Some("A"), 0.0, 0.0)], config());
        let name = pick_region_name(&scene, 0.0, 0.0, |_, _| Some(down_at(&scene, 0.3, 0.6)));
        assert_eq!(name, Some("A"));
        assert_eq!(pick_region_name(&scene, 0.0, 0.0, |_, _| None), None);
    }

    #[test]
    fn zero_direction_hits_nothing() {
        let scene = MapScene::from_features(&[square(Some("A"), 0.0, 0.0)], config());
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO);
        assert!(intersect_all(&scene, ray, PickOptions::default()).is_empty());
    }
}
