//! A multi-dimensional kd-tree used by CURE and any algorithm that needs
//! nearest-neighbor or range queries over a point set.
//!
//! The original implementation links nodes with raw parent/child pointers.
//! Here nodes live in a slab (`Vec<KdNode<P>>`) and are addressed by a
//! stable integer handle ([`NodeRef`]); a removed node's slot is simply
//! never referenced by a live handle again. This sidesteps the cyclic
//! ownership raw pointers would require and keeps every node's lifetime
//! tied to the tree that owns it, per the crate's arena-over-pointers
//! convention for recursive structures.

use crate::error::{CoreError, Result};
use crate::geometry::Point;

/// Opaque handle to a node. Stable across insertions and unaffected by
/// unrelated removals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(usize);

#[derive(Debug, Clone)]
struct KdNode<P> {
    point: Point,
    payload: P,
    discriminator: usize,
    left: Option<NodeRef>,
    right: Option<NodeRef>,
    parent: Option<NodeRef>,
    /// `true` once removed; the slot is dead but kept to preserve existing
    /// `NodeRef`s held by callers (which will simply never resolve again).
    removed: bool,
}

/// A kd-tree over points of fixed dimension `d`, each carrying a caller
/// payload `P` (in CURE, the owning cluster's [`crate::cure::CureClusterId`]).
#[derive(Debug, Clone)]
pub struct KdTree<P> {
    nodes: Vec<KdNode<P>>,
    root: Option<NodeRef>,
    dim: usize,
}

impl<P: Copy + PartialEq> KdTree<P> {
    pub fn new(dim: usize) -> Self {
        KdTree {
            nodes: Vec::new(),
            root: None,
            dim,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| !n.removed).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dim(&self, point: &Point) -> Result<()> {
        if point.dim() != self.dim {
            return Err(CoreError::DimensionMismatch {
                expected: self.dim,
                actual: point.dim(),
            });
        }
        Ok(())
    }

    /// Inserts `point` with the given `payload`, returning a handle to the
    /// new node. The new node's discriminator is `(parent.discriminator + 1)
    /// mod d`; the root discriminates on axis 0.
    pub fn insert(&mut self, point: Point, payload: P) -> Result<NodeRef> {
        self.check_dim(&point)?;

        let Some(root) = self.root else {
            let node = KdNode {
                point,
                payload,
                discriminator: 0,
                left: None,
                right: None,
                parent: None,
                removed: false,
            };
            self.nodes.push(node);
            let r = NodeRef(self.nodes.len() - 1);
            self.root = Some(r);
            return Ok(r);
        };

        let mut current = root;
        loop {
            let (disc, go_left) = {
                let cur = &self.nodes[current.0];
                let k = cur.discriminator;
                (k, point[k] < cur.point[k])
            };
            let next = if go_left {
                self.nodes[current.0].left
            } else {
                self.nodes[current.0].right
            };
            match next {
                Some(n) => current = n,
                None => {
                    let child_disc = (disc + 1) % self.dim;
                    let node = KdNode {
                        point,
                        payload,
                        discriminator: child_disc,
                        left: None,
                        right: None,
                        parent: Some(current),
                        removed: false,
                    };
                    self.nodes.push(node);
                    let new_ref = NodeRef(self.nodes.len() - 1);
                    if go_left {
                        self.nodes[current.0].left = Some(new_ref);
                    } else {
                        self.nodes[current.0].right = Some(new_ref);
                    }
                    return Ok(new_ref);
                }
            }
        }
    }

    /// Finds any live node matching `point` (and, if given, `payload` by
    /// identity -- used to disambiguate duplicate coordinate vectors).
    pub fn find_node(&self, point: &Point, payload: Option<P>) -> Option<NodeRef> {
        let mut stack = self.root.into_iter().collect::<Vec<_>>();
        while let Some(r) = stack.pop() {
            let node = &self.nodes[r.0];
            if !node.removed
                && node.point == *point
                && payload.map_or(true, |p| p == node.payload)
            {
                return Some(r);
            }
            stack.extend(node.left);
            stack.extend(node.right);
        }
        None
    }

    /// Removes the node matching `point`/`payload`, re-linking its subtree.
    /// A no-op if no such node exists.
    pub fn remove(&mut self, point: &Point, payload: P) {
        let Some(target) = self.find_node(point, Some(payload)) else {
            return;
        };
        self.remove_node(target);
    }

    fn remove_node(&mut self, target: NodeRef) {
        // Repeatedly promote the minimum-discriminator node from the right
        // subtree (or the left, if the right is empty) to replace `target`,
        // mirroring the classic kd-tree deletion strategy.
        let node = self.nodes[target.0].clone();
        if let Some(right) = node.right {
            let min_ref = self.find_min(right, node.discriminator);
            let min_point = self.nodes[min_ref.0].point.clone();
            let min_payload = self.nodes[min_ref.0].payload;
            self.remove_node(min_ref);
            let slot = &mut self.nodes[target.0];
            slot.point = min_point;
            slot.payload = min_payload;
        } else if let Some(left) = node.left {
            let min_ref = self.find_min(left, node.discriminator);
            let min_point = self.nodes[min_ref.0].point.clone();
            let min_payload = self.nodes[min_ref.0].payload;
            self.remove_node(min_ref);
            let slot = &mut self.nodes[target.0];
            slot.point = min_point;
            slot.payload = min_payload;
            slot.right = slot.left.take();
        } else {
            self.nodes[target.0].removed = true;
            let parent = node.parent;
            if let Some(p) = parent {
                let p_node = &mut self.nodes[p.0];
                if p_node.left == Some(target) {
                    p_node.left = None;
                } else if p_node.right == Some(target) {
                    p_node.right = None;
                }
            } else {
                self.root = None;
            }
        }
    }

    /// The node with the smallest coordinate along `axis` in the subtree
    /// rooted at `start` (ties broken arbitrarily, as in the source).
    fn find_min(&self, start: NodeRef, axis: usize) -> NodeRef {
        let mut best = start;
        let mut stack = vec![start];
        while let Some(r) = stack.pop() {
            let n = &self.nodes[r.0];
            if !n.removed && n.point[axis] < self.nodes[best.0].point[axis] {
                best = r;
            }
            stack.extend(n.left);
            stack.extend(n.right);
        }
        best
    }

    pub fn point(&self, r: NodeRef) -> &Point {
        &self.nodes[r.0].point
    }

    pub fn payload(&self, r: NodeRef) -> P {
        self.nodes[r.0].payload
    }

    /// All live nodes within `radius` (inclusive) of `query`, in unspecified order.
    pub fn find_nearest_within(&self, query: &Point, radius: f64) -> Vec<(NodeRef, f64)> {
        let mut out = Vec::new();
        if let Some(root) = self.root {
            self.search_within(root, query, radius, &mut out);
        }
        out
    }

    fn search_within(&self, r: NodeRef, query: &Point, radius: f64, out: &mut Vec<(NodeRef, f64)>) {
        let node = &self.nodes[r.0];
        if !node.removed {
            let d = crate::geometry::euclidean_distance(query, &node.point);
            if d <= radius {
                out.push((r, d));
            }
        }
        let axis_diff = query[node.discriminator] - node.point[node.discriminator];
        let (near, far) = if axis_diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(n) = near {
            self.search_within(n, query, radius, out);
        }
        if axis_diff.abs() <= radius {
            if let Some(f) = far {
                self.search_within(f, query, radius, out);
            }
        }
    }

    /// The single nearest live node to `query`, if the tree is non-empty.
    pub fn find_nearest(&self, query: &Point) -> Option<(NodeRef, f64)> {
        let root = self.root?;
        let mut best: Option<(NodeRef, f64)> = None;
        self.search_nearest(root, query, &mut best);
        best
    }

    fn search_nearest(&self, r: NodeRef, query: &Point, best: &mut Option<(NodeRef, f64)>) {
        let node = &self.nodes[r.0];
        if !node.removed {
            let d = crate::geometry::euclidean_distance(query, &node.point);
            if best.map_or(true, |(_, bd)| d < bd) {
                *best = Some((r, d));
            }
        }
        let axis_diff = query[node.discriminator] - node.point[node.discriminator];
        let (near, far) = if axis_diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };
        if let Some(n) = near {
            self.search_nearest(n, query, best);
        }
        let prune = best.map_or(false, |(_, bd)| axis_diff.abs() > bd);
        if !prune {
            if let Some(f) = far {
                self.search_nearest(f, query, best);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(v: &[f64]) -> Point {
        Point::new(v.to_vec())
    }

    #[test]
    fn insert_then_find_round_trip() {
        let mut tree: KdTree<u32> = KdTree::new(2);
        let r1 = tree.insert(p(&[1.0, 1.0]), 1).unwrap();
        let r2 = tree.insert(p(&[2.0, 2.0]), 2).unwrap();
        assert_eq!(tree.find_node(&p(&[1.0, 1.0]), Some(1)), Some(r1));
        assert_eq!(tree.find_node(&p(&[2.0, 2.0]), Some(2)), Some(r2));
    }

    #[test]
    fn remove_drops_only_target() {
        let mut tree: KdTree<u32> = KdTree::new(2);
        tree.insert(p(&[1.0, 1.0]), 1).unwrap();
        tree.insert(p(&[2.0, 2.0]), 2).unwrap();
        tree.insert(p(&[3.0, 3.0]), 3).unwrap();
        tree.remove(&p(&[2.0, 2.0]), 2);
        assert!(tree.find_node(&p(&[2.0, 2.0]), Some(2)).is_none());
        assert!(tree.find_node(&p(&[1.0, 1.0]), Some(1)).is_some());
        assert!(tree.find_node(&p(&[3.0, 3.0]), Some(3)).is_some());
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn range_search_is_sound() {
        let mut tree: KdTree<u32> = KdTree::new(2);
        tree.insert(p(&[0.0, 0.0]), 0).unwrap();
        tree.insert(p(&[1.0, 0.0]), 1).unwrap();
        tree.insert(p(&[5.0, 5.0]), 2).unwrap();
        let found = tree.find_nearest_within(&p(&[0.0, 0.0]), 1.5);
        let payloads: Vec<_> = found.iter().map(|(r, _)| tree.payload(*r)).collect();
        assert!(payloads.contains(&0));
        assert!(payloads.contains(&1));
        assert!(!payloads.contains(&2));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut tree: KdTree<u32> = KdTree::new(2);
        assert!(tree.insert(p(&[1.0, 1.0, 1.0]), 0).is_err());
    }
}
