//! Broad-phase spatial indexing for world object collision queries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted by spatial index implementations.
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    /// The region the index partitions is not a finite, non-inverted rectangle.
    #[error("invalid index bounds: {0}")]
    InvalidBounds(&'static str),
    /// An entry's bounding box contains NaN or infinite coordinates.
    #[error("entry #{0} has a non-finite bounding box")]
    NonFiniteEntry(usize),
}

/// Axis-aligned bounding box. `min` is the upper-left corner in screen-style coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Aabb {
    /// Construct a box from already ordered bounds.
    #[must_use]
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Construct the box spanned by two arbitrary corners.
    #[must_use]
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            min_x: a.0.min(b.0),
            min_y: a.1.min(b.1),
            max_x: a.0.max(b.0),
            max_y: a.1.max(b.1),
        }
    }

    /// Square box of half-extent `radius` around a point.
    #[must_use]
    pub fn around(x: f64, y: f64, radius: f64) -> Self {
        Self {
            min_x: x - radius,
            min_y: y - radius,
            max_x: x + radius,
            max_y: y + radius,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Grow the box by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }

    /// Returns true when the boxes share at least one point (touching counts).
    #[must_use]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }

    fn min_along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.min_x,
            Axis::Y => self.min_y,
        }
    }

    fn max_along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.max_x,
            Axis::Y => self.max_y,
        }
    }

    /// Split into the halves below and above `line` along `axis`.
    fn split(&self, axis: Axis, line: f64) -> (Aabb, Aabb) {
        match axis {
            Axis::X => (
                Aabb::new(self.min_x, self.min_y, line, self.max_y),
                Aabb::new(line, self.min_y, self.max_x, self.max_y),
            ),
            Axis::Y => (
                Aabb::new(self.min_x, self.min_y, self.max_x, line),
                Aabb::new(self.min_x, line, self.max_x, self.max_y),
            ),
        }
    }
}

/// Anything that occupies a rectangular region of the world.
pub trait HasAabb {
    fn aabb(&self) -> Aabb;
}

impl HasAabb for Aabb {
    fn aabb(&self) -> Aabb {
        *self
    }
}

/// Partition axis of a tree node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Axis {
    #[default]
    X,
    Y,
}

impl Axis {
    /// Axis used by the children of a node split along `self`.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }
}

/// Common behaviour exposed by broad-phase collision indices.
pub trait CollisionIndex<K> {
    /// Rebuild internal structures from scratch for `entries` inside `bounds`.
    fn rebuild(&mut self, bounds: Aabb, entries: &[(K, Aabb)]) -> Result<(), IndexError>;

    /// Visit every key whose box could intersect `query`. Keys may repeat.
    fn visit_candidates(&self, query: &Aabb, visitor: &mut dyn FnMut(K));

    /// Deduplicated, ascending candidates whose box could intersect `query`.
    fn candidates(&self, query: &Aabb) -> Vec<K>
    where
        K: Ord,
    {
        let mut result = Vec::new();
        self.visit_candidates(query, &mut |key| result.push(key));
        result.sort_unstable();
        result.dedup();
        result
    }
}

/// One node of a [`KdIndex`]. Leaves own their members; internal nodes own two children.
#[derive(Debug, Clone)]
pub struct KdNode<K> {
    pub axis: Axis,
    /// Region of the world this node covers.
    pub bounds: Aabb,
    /// Split coordinate along `axis`; meaningless for leaves.
    pub split: f64,
    children: Option<(usize, usize)>,
    members: Vec<K>,
}

impl<K> KdNode<K> {
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    #[must_use]
    pub fn members(&self) -> &[K] {
        &self.members
    }
}

/// Binary space partition rebuilt every tick from object bounding boxes.
///
/// Each node splits at the mean of its members' minimum coordinate along the node's
/// axis, alternating X and Y by depth. Members straddling the split line are stored
/// on both sides, so raw traversal may report a key more than once.
#[derive(Debug, Clone)]
pub struct KdIndex<K> {
    nodes: Vec<KdNode<K>>,
    max_depth: usize,
}

impl<K> Default for KdIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KdIndex<K> {
    /// Create an empty index; queries return nothing until the first rebuild.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_depth: 0,
        }
    }

    /// Nodes in build order; the root, when present, comes first.
    #[must_use]
    pub fn nodes(&self) -> &[KdNode<K>] {
        &self.nodes
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Depth of the deepest leaf (the root alone has depth zero).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.max_depth
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.max_depth = 0;
    }
}

impl<K: Copy> KdIndex<K> {
    fn build_node(
        &mut self,
        axis: Axis,
        bounds: Aabb,
        members: Vec<(K, Aabb)>,
        depth: usize,
        depth_remaining: usize,
    ) -> usize {
        let slot = self.nodes.len();
        self.max_depth = self.max_depth.max(depth);
        self.nodes.push(KdNode {
            axis,
            bounds,
            split: 0.0,
            children: None,
            members: Vec::new(),
        });

        let count = members.len();
        if count <= 2 || depth_remaining == 0 {
            self.nodes[slot].members = members.into_iter().map(|(key, _)| key).collect();
            return slot;
        }

        let split = members
            .iter()
            .map(|(_, aabb)| aabb.min_along(axis))
            .sum::<f64>()
            / count as f64;

        let mut below = Vec::new();
        let mut above = Vec::new();
        for &(key, aabb) in &members {
            if aabb.min_along(axis) <= split {
                below.push((key, aabb));
            }
            if aabb.max_along(axis) >= split {
                above.push((key, aabb));
            }
        }

        // Every member straddles the line: splitting again would only duplicate them.
        if below.len() == count && above.len() == count {
            self.nodes[slot].members = members.into_iter().map(|(key, _)| key).collect();
            return slot;
        }

        let (bounds_below, bounds_above) = bounds.split(axis, split);
        let child_axis = axis.flip();
        let next_budget = depth_remaining - 1;
        let first = self.build_node(child_axis, bounds_below, below, depth + 1, next_budget);
        let second = self.build_node(child_axis, bounds_above, above, depth + 1, next_budget);
        let node = &mut self.nodes[slot];
        node.split = split;
        node.children = Some((first, second));
        slot
    }
}

impl<K: Copy> CollisionIndex<K> for KdIndex<K> {
    fn rebuild(&mut self, bounds: Aabb, entries: &[(K, Aabb)]) -> Result<(), IndexError> {
        if !bounds.is_finite() {
            return Err(IndexError::InvalidBounds("bounds must be finite"));
        }
        if bounds.width() < 0.0 || bounds.height() < 0.0 {
            return Err(IndexError::InvalidBounds("bounds must not be inverted"));
        }
        if let Some(position) = entries.iter().position(|(_, aabb)| !aabb.is_finite()) {
            return Err(IndexError::NonFiniteEntry(position));
        }

        self.clear();
        let depth_budget = (entries.len() as f64).sqrt().floor() as usize;
        self.build_node(Axis::X, bounds, entries.to_vec(), 0, depth_budget);
        Ok(())
    }

    fn visit_candidates(&self, query: &Aabb, visitor: &mut dyn FnMut(K)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut pending = vec![0usize];
        while let Some(slot) = pending.pop() {
            let node = &self.nodes[slot];
            match node.children {
                None => node.members.iter().for_each(|&key| visitor(key)),
                Some((below, above)) => {
                    if query.min_along(node.axis) <= node.split {
                        pending.push(below);
                    }
                    if query.max_along(node.axis) >= node.split {
                        pending.push(above);
                    }
                }
            }
        }
    }
}
