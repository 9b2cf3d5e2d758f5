//! Bounding volume hierarchy with surface-area-heuristic splits.
//!
//! The build reorders an owned index permutation instead of the primitive
//! array itself, so the scene's triangle store keeps its insertion order.
//! Leaves reference contiguous ranges of that permutation.

use ember_math::{Aabb, Ray, Vec3};

use crate::{HitRecord, Triangle};

/// A node of the hierarchy: an interior split or a permutation range.
#[derive(Debug, Clone)]
enum Node {
    Branch {
        bbox: Aabb,
        left: Box<Node>,
        right: Box<Node>,
    },
    Leaf {
        bbox: Aabb,
        start: usize,
        count: usize,
    },
}

impl Node {
    fn bbox(&self) -> &Aabb {
        match self {
            Node::Branch { bbox, .. } => bbox,
            Node::Leaf { bbox, .. } => bbox,
        }
    }
}

/// A SAH-built binary BVH over a triangle slice.
///
/// The tree stores indices into the triangle slice it was built from;
/// traversal takes the same slice, which must not change between build
/// and query.
#[derive(Debug, Clone)]
pub struct Bvh {
    root: Node,
    order: Vec<usize>,
}

impl Bvh {
    /// Build the hierarchy. Returns `None` for an empty slice.
    ///
    /// Ranges of at most `leaf_capacity` triangles become leaves.
    pub fn build(triangles: &[Triangle], leaf_capacity: usize) -> Option<Bvh> {
        if triangles.is_empty() {
            return None;
        }
        let leaf_capacity = leaf_capacity.max(1);

        let bounds: Vec<Aabb> = triangles.iter().map(|t| t.bounds()).collect();
        let centroids: Vec<Vec3> = triangles.iter().map(|t| t.centroid()).collect();
        let mut order: Vec<usize> = (0..triangles.len()).collect();

        let root = build_node(&bounds, &centroids, &mut order, 0, leaf_capacity);
        log::debug!(
            "built BVH over {} triangles (leaf capacity {})",
            triangles.len(),
            leaf_capacity
        );
        Some(Bvh { root, order })
    }

    /// Nearest hit along the ray, pruned by the hierarchy.
    pub fn closest_hit(&self, triangles: &[Triangle], ray: &Ray) -> Option<HitRecord> {
        self.hit_node(&self.root, triangles, ray)
    }

    fn hit_node(&self, node: &Node, triangles: &[Triangle], ray: &Ray) -> Option<HitRecord> {
        node.bbox().hit_distance(ray)?;

        match node {
            Node::Leaf { start, count, .. } => {
                let mut closest: Option<HitRecord> = None;
                for &index in &self.order[*start..*start + *count] {
                    if let Some(hit) = triangles[index].intersect(ray) {
                        if closest.as_ref().map_or(true, |c| hit.distance < c.distance) {
                            closest = Some(hit);
                        }
                    }
                }
                closest
            }
            Node::Branch { left, right, .. } => {
                let left_hit = self.hit_node(left, triangles, ray);
                let right_hit = self.hit_node(right, triangles, ray);
                match (left_hit, right_hit) {
                    (Some(l), Some(r)) => Some(if l.distance <= r.distance { l } else { r }),
                    (hit, None) | (None, hit) => hit,
                }
            }
        }
    }
}

fn range_bounds(bounds: &[Aabb], order: &[usize]) -> Aabb {
    let mut bbox = Aabb::EMPTY;
    for &index in order {
        bbox = Aabb::union(&bbox, &bounds[index]);
    }
    bbox
}

fn sort_by_axis(centroids: &[Vec3], order: &mut [usize], axis: usize) {
    order.sort_unstable_by(|&a, &b| {
        centroids[a]
            .axis(axis)
            .partial_cmp(&centroids[b].axis(axis))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Recursive top-down build over `order`, a window of the permutation that
/// begins at `base` in the full array.
fn build_node(
    bounds: &[Aabb],
    centroids: &[Vec3],
    order: &mut [usize],
    base: usize,
    leaf_capacity: usize,
) -> Node {
    let bbox = range_bounds(bounds, order);
    let n = order.len();

    if n <= leaf_capacity {
        return Node::Leaf { bbox, start: base, count: n };
    }

    // Try all three axes; for each, sweep every split position with
    // prefix/suffix bounds and keep the cheapest
    // area(left) * count(left) + area(right) * count(right).
    let mut best_axis = 0;
    let mut best_split = n / 2;
    let mut best_cost = f32::INFINITY;
    let mut prefix = vec![Aabb::EMPTY; n];
    let mut suffix = vec![Aabb::EMPTY; n];

    for axis in 0..3 {
        sort_by_axis(centroids, order, axis);

        prefix[0] = bounds[order[0]];
        for i in 1..n {
            prefix[i] = Aabb::union(&prefix[i - 1], &bounds[order[i]]);
        }
        suffix[n - 1] = bounds[order[n - 1]];
        for i in (0..n - 1).rev() {
            suffix[i] = Aabb::union(&suffix[i + 1], &bounds[order[i]]);
        }

        for split in 1..n {
            let cost = prefix[split - 1].surface_area() * split as f32
                + suffix[split].surface_area() * (n - split) as f32;
            if cost < best_cost {
                best_axis = axis;
                best_split = split;
                best_cost = cost;
            }
        }
    }

    // The last axis tried left its ordering behind; restore the winner's.
    sort_by_axis(centroids, order, best_axis);

    let (left_order, right_order) = order.split_at_mut(best_split);
    let left = build_node(bounds, centroids, left_order, base, leaf_capacity);
    let right = build_node(
        bounds,
        centroids,
        right_order,
        base + best_split,
        leaf_capacity,
    );

    Node::Branch {
        bbox,
        left: Box::new(left),
        right: Box::new(right),
    }
}
