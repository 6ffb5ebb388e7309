//! # Spatial index (2D quadtree)
//!
//! This module implements the **region quadtree** used to find interaction
//! and collision candidates without testing every pair of particles.
//!
//! ## Core Concepts
//!
//! - The root node covers an axis-aligned rectangle.
//! - A node stores `(position, particle index)` entries directly until it
//!   holds more than `capacity` of them, then it splits into 4 equal
//!   quadrants and hands its entries down.
//! - A node at `max_depth` never splits; its entry list just keeps growing.
//!   Dense clusters therefore make queries slower instead of making the tree
//!   arbitrarily deep.
//! - Queries only descend into nodes whose bounds intersect the query's
//!   bounding box. That rejection test is the only pruning there is.
//!
//! Nodes live in one `Vec` (arena) and refer to their children by index.
//! The index owns no particle data: entries carry a copy of the position plus
//! the slot index into the `ParticleStore`, so it goes stale as soon as
//! particles move and is rebuilt every tick.

use crate::simulation::states::NVec2;

/// Axis-aligned rectangle, `[x, x + width) x [y, y + height)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Square of half-size `half` around `center`
    pub fn around(center: NVec2, half: f64) -> Self {
        Self::new(center.x - half, center.y - half, 2.0 * half, 2.0 * half)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> NVec2 {
        NVec2::new(self.x + 0.5 * self.width, self.y + 0.5 * self.height)
    }

    /// Half-open containment test
    pub fn contains(&self, p: &NVec2) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Closed overlap test (touching edges count as intersecting)
    pub fn intersects(&self, other: &Rect) -> bool {
        !(other.x > self.right() || other.right() < self.x || other.y > self.bottom() || other.bottom() < self.y)
    }

    /// Smallest rectangle containing `self` and `p`, grown by `pad` on the
    /// sides `p` pushed out so that `p` is strictly inside the half-open
    /// bounds
    pub fn expanded_to(&self, p: &NVec2, pad: f64) -> Rect {
        let min_x = self.x.min(p.x - pad);
        let min_y = self.y.min(p.y - pad);
        let max_x = self.right().max(p.x + pad);
        let max_y = self.bottom().max(p.y + pad);
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: NVec2,
    pub radius: f64,
}

impl Circle {
    pub fn new(center: NVec2, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn contains(&self, p: &NVec2) -> bool {
        (p - self.center).norm_squared() <= self.radius * self.radius
    }

    pub fn bounding_rect(&self) -> Rect {
        Rect::around(self.center, self.radius)
    }
}

/// One entry of the index: a position and the store slot it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadPoint {
    pub pos: NVec2,
    pub index: usize,
}

impl QuadPoint {
    pub fn new(pos: NVec2, index: usize) -> Self {
        Self { pos, index }
    }
}

/// A single quadtree node.
///
/// A node is either a leaf holding `entries`, or an internal node with
/// exactly four children (`children = Some(..)`) and no entries of its own.
#[derive(Debug, Clone)]
pub struct QuadNode {
    pub bounds: Rect,
    pub depth: usize,
    pub children: Option<[usize; 4]>, // indices into SpatialIndex::nodes
    pub entries: Vec<QuadPoint>,
}

impl QuadNode {
    fn leaf(bounds: Rect, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            entries: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpatialIndex {
    nodes: Vec<QuadNode>,
    capacity: usize,
    max_depth: usize,
    len: usize,
}

pub const DEFAULT_NODE_CAPACITY: usize = 8;
pub const DEFAULT_MAX_DEPTH: usize = 10;

impl SpatialIndex {
    /// Empty index covering `bounds`. `capacity` is clamped to at least 1.
    pub fn new(bounds: Rect, capacity: usize, max_depth: usize) -> Self {
        Self {
            nodes: vec![QuadNode::leaf(bounds, 0)],
            capacity: capacity.max(1),
            max_depth,
            len: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.nodes[0].bounds
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Number of entries stored
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Deepest node currently allocated
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    pub fn nodes(&self) -> &[QuadNode] {
        &self.nodes
    }

    /// Takes effect on the next `clear`/`rebuild`
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }

    /// Takes effect on the next `clear`/`rebuild`
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    /// Move the root to new bounds, dropping every entry
    pub fn reset(&mut self, bounds: Rect) {
        self.nodes.clear();
        self.nodes.push(QuadNode::leaf(bounds, 0));
        self.len = 0;
    }

    /// Drop every entry, keeping the root bounds
    pub fn clear(&mut self) {
        let bounds = self.bounds();
        self.reset(bounds);
    }

    /// Insert a point. Returns `false` (and stores nothing) if the point lies
    /// outside the root bounds.
    ///
    /// Walks down from the root:
    /// - internal node -> continue in the quadrant containing the point,
    /// - leaf with room, or leaf at `max_depth` -> store the point here,
    /// - full leaf above `max_depth` -> split it, push its entries down into
    ///   the new quadrants, then continue in the right quadrant.
    pub fn insert(&mut self, point: QuadPoint) -> bool {
        if !self.nodes[0].bounds.contains(&point.pos) {
            return false;
        }

        let mut node_idx = 0;
        loop {
            if let Some(children) = self.nodes[node_idx].children {
                let q = quadrant_for_point(&point.pos, &self.nodes[node_idx].bounds);
                node_idx = children[q];
                continue;
            }

            let node = &self.nodes[node_idx];
            if node.entries.len() < self.capacity || node.depth >= self.max_depth {
                self.nodes[node_idx].entries.push(point);
                self.len += 1;
                return true;
            }

            self.subdivide(node_idx);
        }
    }

    /// Clear and bulk insert. Returns the number of points actually stored.
    pub fn rebuild<I>(&mut self, points: I) -> usize
    where
        I: IntoIterator<Item = QuadPoint>,
    {
        self.clear();
        points.into_iter().filter(|p| self.insert(*p)).count()
    }

    /// Points inside `range` (half-open test)
    pub fn query_rect(&self, range: &Rect) -> Vec<QuadPoint> {
        let mut out = Vec::new();
        self.query_rect_into(range, &mut out);
        out
    }

    /// Same as [`SpatialIndex::query_rect`], appending into `out`.
    /// Returns the number of nodes visited.
    pub fn query_rect_into(&self, range: &Rect, out: &mut Vec<QuadPoint>) -> usize {
        self.visit(range, |p| {
            if range.contains(&p.pos) {
                out.push(*p);
            }
        })
    }

    /// Points inside `circle` (boundary included)
    pub fn query_circle(&self, circle: &Circle) -> Vec<QuadPoint> {
        let mut out = Vec::new();
        self.query_circle_into(circle, &mut out);
        out
    }

    /// Same as [`SpatialIndex::query_circle`], appending into `out`.
    /// Returns the number of nodes visited.
    pub fn query_circle_into(&self, circle: &Circle, out: &mut Vec<QuadPoint>) -> usize {
        let range = circle.bounding_rect();
        self.visit(&range, |p| {
            if circle.contains(&p.pos) {
                out.push(*p);
            }
        })
    }

    /// Up to `k` points closest to `target`, nearest first.
    ///
    /// Runs circle queries with a doubling radius until at least `k` points
    /// turn up or the radius reaches `max_radius`, then sorts by distance and
    /// truncates. Points further than the final radius are never returned.
    pub fn k_nearest(&self, target: NVec2, k: usize, max_radius: f64) -> Vec<QuadPoint> {
        let mut found = Vec::new();
        if k == 0 || max_radius <= 0.0 || self.len == 0 {
            return found;
        }

        let mut radius = (max_radius / KNN_START_DIVISOR).max(f64::EPSILON);
        loop {
            found.clear();
            self.query_circle_into(&Circle::new(target, radius), &mut found);
            if found.len() >= k || radius >= max_radius {
                break;
            }
            radius = (radius * 2.0).min(max_radius);
        }

        found.sort_by(|a, b| {
            let da = (a.pos - target).norm_squared();
            let db = (b.pos - target).norm_squared();
            da.total_cmp(&db)
        });
        found.truncate(k);
        found
    }

    // helpers ==============================================================================

    /// Depth-first walk over every node intersecting `range`, calling `f` on
    /// each entry of the leaves reached. Returns the number of nodes visited.
    fn visit<F>(&self, range: &Rect, mut f: F) -> usize
    where
        F: FnMut(&QuadPoint),
    {
        let mut visited = 0;
        let mut stack = vec![0usize];

        while let Some(node_idx) = stack.pop() {
            let node = &self.nodes[node_idx];
            if !node.bounds.intersects(range) {
                continue;
            }
            visited += 1;

            match node.children {
                Some(children) => stack.extend_from_slice(&children),
                None => node.entries.iter().for_each(&mut f),
            }
        }

        visited
    }

    /// Split a leaf into 4 equal quadrants and move its entries down.
    ///
    /// Child order follows [`quadrant_for_point`]: bit 0 is the x half,
    /// bit 1 is the y half.
    fn subdivide(&mut self, node_idx: usize) {
        let bounds = self.nodes[node_idx].bounds;
        let depth = self.nodes[node_idx].depth + 1;

        let mut children = [0usize; 4];
        for (q, child) in children.iter_mut().enumerate() {
            *child = self.nodes.len();
            self.nodes.push(QuadNode::leaf(child_bounds(&bounds, q), depth));
        }

        let entries = std::mem::take(&mut self.nodes[node_idx].entries);
        self.nodes[node_idx].children = Some(children);

        for e in entries {
            let q = quadrant_for_point(&e.pos, &bounds);
            self.nodes[children[q]].entries.push(e);
        }
    }
}

const KNN_START_DIVISOR: f64 = 64.0;

/// Quadrant of `p` inside `bounds`:
///
/// - Bit 0 (value 1): 0 for left (x < center.x), 1 for right (x >= center.x)
/// - Bit 1 (value 2): 0 for top (y < center.y), 1 for bottom (y >= center.y)
fn quadrant_for_point(p: &NVec2, bounds: &Rect) -> usize {
    let center = bounds.center();
    let mut q = 0;
    if p.x >= center.x { q |= 1; }
    if p.y >= center.y { q |= 2; }
    q
}

/// Bounds of quadrant `q` (same bit encoding as [`quadrant_for_point`])
fn child_bounds(parent: &Rect, q: usize) -> Rect {
    let half_w = 0.5 * parent.width;
    let half_h = 0.5 * parent.height;
    let center = parent.center();

    let x = if (q & 1) == 0 { parent.x } else { center.x };
    let y = if (q & 2) == 0 { parent.y } else { center.y };
    Rect::new(x, y, half_w, half_h)
}
