use foundation::bounds::{Aabb3, ray_aabb_hit_t};
use foundation::ids::SolidId;
use foundation::math::precision::stable_total_cmp_f64;

/// A deterministic bounding volume hierarchy over solid bounds.
///
/// Ordering contract:
/// - queries return solids in ascending `SolidId` order.
///
/// Built once per scene; geometry never changes during interaction.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        bounds: Aabb3,
        items: Vec<Item>,
    },
    Internal {
        bounds: Aabb3,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Item {
    pub solid: SolidId,
    pub bounds: Aabb3,
}

impl Bvh {
    pub fn build(items: Vec<Item>) -> Self {
        let mut nodes = Vec::new();
        let mut items: Vec<Item> = items.into_iter().filter(|i| !i.bounds.is_empty()).collect();
        if !items.is_empty() {
            let _root = build_node(&mut nodes, &mut items);
        }
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Solids whose bounds intersect `query`, in ascending id order.
    pub fn query_aabb(&self, query: &Aabb3) -> Vec<SolidId> {
        self.collect(|bounds| bounds.intersects(query))
    }

    /// Solids whose bounds a ray passes through within `[t_min, t_max]`.
    pub fn query_ray(&self, origin: [f64; 3], dir: [f64; 3], t_min: f64, t_max: f64) -> Vec<SolidId> {
        self.collect(|bounds| ray_aabb_hit_t(origin, dir, bounds, t_min, t_max).is_some())
    }

    fn collect<F>(&self, mut accept: F) -> Vec<SolidId>
    where
        F: FnMut(&Aabb3) -> bool,
    {
        if self.nodes.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<SolidId> = Vec::new();
        let mut stack: Vec<usize> = vec![0];

        while let Some(idx) = stack.pop() {
            match &self.nodes[idx] {
                Node::Leaf { bounds, items } => {
                    if !accept(bounds) {
                        continue;
                    }
                    for item in items {
                        if accept(&item.bounds) {
                            hits.push(item.solid);
                        }
                    }
                }
                Node::Internal {
                    bounds,
                    left,
                    right,
                } => {
                    if !accept(bounds) {
                        continue;
                    }
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        hits.sort();
        hits.dedup();
        hits
    }
}

const LEAF_MAX: usize = 8;

fn build_node(nodes: &mut Vec<Node>, items: &mut [Item]) -> usize {
    let bounds = bounds_for_items(items);
    if items.len() <= LEAF_MAX {
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            bounds,
            items: items.to_vec(),
        });
        return idx;
    }

    let axis = split_axis(&bounds);
    items.sort_by(|a, b| {
        let ca = centroid_axis(&a.bounds, axis);
        let cb = centroid_axis(&b.bounds, axis);
        stable_total_cmp_f64(ca, cb).then_with(|| a.solid.cmp(&b.solid))
    });

    let mid = items.len() / 2;
    let (left_items, right_items) = items.split_at_mut(mid);

    let idx = nodes.len();
    // Patched once both children exist.
    nodes.push(Node::Leaf {
        bounds,
        items: Vec::new(),
    });

    let left = build_node(nodes, left_items);
    let right = build_node(nodes, right_items);

    nodes[idx] = Node::Internal {
        bounds,
        left,
        right,
    };
    idx
}

fn centroid_axis(aabb: &Aabb3, axis: usize) -> f64 {
    (aabb.min[axis] + aabb.max[axis]) * 0.5
}

fn split_axis(bounds: &Aabb3) -> usize {
    let ex = bounds.max[0] - bounds.min[0];
    let ey = bounds.max[1] - bounds.min[1];
    let ez = bounds.max[2] - bounds.min[2];

    // Deterministic tie-break: prefer X, then Y, then Z.
    if ex >= ey && ex >= ez {
        0
    } else if ey >= ez {
        1
    } else {
        2
    }
}

fn bounds_for_items(items: &[Item]) -> Aabb3 {
    items
        .iter()
        .fold(Aabb3::empty(), |acc, item| acc.union(&item.bounds))
}
