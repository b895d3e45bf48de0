//! Region quadtree used as the entity broadphase.
//!
//! The tree is rebuilt from scratch every frame. Nodes live in a flat arena
//! and refer to their children by index, so clearing the tree is a
//! truncation and no node owns another.
//!
//! Quadrant indices follow the usual convention with y pointing down:
//! 0 = north-east, 1 = north-west, 2 = south-west, 3 = south-east.

use crate::math::Rect;

/// Entries a node may hold before it tries to split.
pub const MAX_OBJECTS: usize = 10;
/// Deepest level a node may split at.
pub const MAX_LEVELS: u32 = 5;

pub const NORTH_EAST: usize = 0;
pub const NORTH_WEST: usize = 1;
pub const SOUTH_WEST: usize = 2;
pub const SOUTH_EAST: usize = 3;

/// A leaf entry: the bounds it was inserted with and an opaque payload
/// (typically an index into the caller's entity list).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadEntry {
    pub bounds: Rect,
    pub payload: usize,
}

#[derive(Clone, Debug)]
struct Node {
    level: u32,
    bounds: Rect,
    entries: Vec<QuadEntry>,
    children: Option<[usize; 4]>,
}

impl Node {
    fn new(level: u32, bounds: Rect) -> Self {
        Self {
            level,
            bounds,
            entries: Vec::new(),
            children: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Quadtree {
    nodes: Vec<Node>,
    max_objects: usize,
    max_levels: u32,
}

impl Quadtree {
    pub fn new(bounds: Rect) -> Self {
        Self::with_limits(bounds, MAX_OBJECTS, MAX_LEVELS)
    }

    pub fn with_limits(bounds: Rect, max_objects: usize, max_levels: u32) -> Self {
        Self {
            nodes: vec![Node::new(0, bounds)],
            max_objects,
            max_levels,
        }
    }

    /// Drop every entry and child, keeping the root bounds and the arena's
    /// allocation for the next rebuild.
    pub fn clear(&mut self) {
        self.nodes.truncate(1);
        if let Some(root) = self.nodes.first_mut() {
            root.entries.clear();
            root.children = None;
        }
    }

    /// Clear the tree and move the root to new bounds.
    pub fn reset(&mut self, bounds: Rect) {
        self.clear();
        if let Some(root) = self.nodes.first_mut() {
            root.bounds = bounds;
        }
    }

    pub fn bounds(&self) -> Rect {
        self.nodes[0].bounds
    }

    /// Total number of nodes, including the root. Each split adds four.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Entries stored directly at the root.
    pub fn root_entries(&self) -> &[QuadEntry] {
        &self.nodes[0].entries
    }

    /// Entries stored directly in one of the root's quadrants, if it has split.
    pub fn quadrant_entries(&self, quadrant: usize) -> Option<&[QuadEntry]> {
        let children = self.nodes[0].children?;
        let child = *children.get(quadrant)?;
        Some(&self.nodes[child].entries)
    }

    /// Total number of stored entries.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(|node| node.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Which root quadrant fully contains `rect`, or `None` if it straddles a midline.
    pub fn get_index(&self, rect: &Rect) -> Option<usize> {
        quadrant_index(&self.nodes[0].bounds, rect)
    }

    /// Store `bounds` at the deepest node whose quadrant fully contains it.
    pub fn insert(&mut self, bounds: Rect, payload: usize) {
        self.insert_at(0, QuadEntry { bounds, payload });
    }

    /// Append broadphase candidates for `query` to `out`.
    ///
    /// Returns every entry on the path from the root to the deepest quadrant
    /// containing `query`. Where `query` straddles a midline, every child it
    /// touches is searched as well. The result is a superset of the entries
    /// that actually overlap `query`.
    pub fn retrieve(&self, out: &mut Vec<QuadEntry>, query: &Rect) {
        self.retrieve_from(0, out, query);
    }

    fn insert_at(&mut self, start: usize, entry: QuadEntry) {
        let mut node = start;
        while let Some(children) = self.nodes[node].children {
            match quadrant_index(&self.nodes[node].bounds, &entry.bounds) {
                Some(quadrant) => node = children[quadrant],
                None => break,
            }
        }

        self.nodes[node].entries.push(entry);

        let over_capacity = self.nodes[node].entries.len() > self.max_objects;
        if !over_capacity || self.nodes[node].level >= self.max_levels {
            return;
        }

        let children = match self.nodes[node].children {
            Some(children) => children,
            None => self.split(node),
        };

        let bounds = self.nodes[node].bounds;
        let entries = std::mem::take(&mut self.nodes[node].entries);
        let mut remaining = Vec::with_capacity(entries.len());
        for entry in entries {
            match quadrant_index(&bounds, &entry.bounds) {
                Some(quadrant) => self.insert_at(children[quadrant], entry),
                None => remaining.push(entry),
            }
        }
        self.nodes[node].entries = remaining;
    }

    fn split(&mut self, node: usize) -> [usize; 4] {
        let level = self.nodes[node].level + 1;
        let b = self.nodes[node].bounds;
        let half_w = b.width * 0.5;
        let half_h = b.height * 0.5;

        let first = self.nodes.len();
        self.nodes.push(Node::new(level, Rect::new(b.x + half_w, b.y, half_w, half_h)));
        self.nodes.push(Node::new(level, Rect::new(b.x, b.y, half_w, half_h)));
        self.nodes.push(Node::new(level, Rect::new(b.x, b.y + half_h, half_w, half_h)));
        self.nodes.push(Node::new(level, Rect::new(b.x + half_w, b.y + half_h, half_w, half_h)));

        let children = [first, first + 1, first + 2, first + 3];
        self.nodes[node].children = Some(children);
        log::trace!("quadtree node {node} split at level {}", level - 1);
        children
    }

    fn retrieve_from(&self, node: usize, out: &mut Vec<QuadEntry>, query: &Rect) {
        let current = &self.nodes[node];
        if let Some(children) = current.children {
            match quadrant_index(&current.bounds, query) {
                Some(quadrant) => self.retrieve_from(children[quadrant], out, query),
                None => {
                    for quadrant in straddled_quadrants(&current.bounds, query) {
                        self.retrieve_from(children[quadrant], out, query);
                    }
                }
            }
        }
        out.extend_from_slice(&current.entries);
    }
}

fn quadrant_index(bounds: &Rect, rect: &Rect) -> Option<usize> {
    let vertical_mid = bounds.x + bounds.width * 0.5;
    let horizontal_mid = bounds.y + bounds.height * 0.5;

    let in_top = rect.y < horizontal_mid && rect.bottom() < horizontal_mid;
    let in_bottom = rect.y > horizontal_mid;

    if rect.x < vertical_mid && rect.right() < vertical_mid {
        if in_top {
            return Some(NORTH_WEST);
        }
        if in_bottom {
            return Some(SOUTH_WEST);
        }
    } else if rect.x > vertical_mid {
        if in_top {
            return Some(NORTH_EAST);
        }
        if in_bottom {
            return Some(SOUTH_EAST);
        }
    }
    None
}

/// Quadrants whose half-planes `query` reaches, by the same midline tests
/// `quadrant_index` sorts entries with. Child bounds are not consulted:
/// entries outside the root still live in the child on their side of each
/// midline. Edges are inclusive so zero-area queries on a midline reach
/// both sides.
fn straddled_quadrants(bounds: &Rect, query: &Rect) -> impl Iterator<Item = usize> {
    let vertical_mid = bounds.x + bounds.width * 0.5;
    let horizontal_mid = bounds.y + bounds.height * 0.5;

    let west = query.left() <= vertical_mid;
    let east = query.right() >= vertical_mid;
    let north = query.top() <= horizontal_mid;
    let south = query.bottom() >= horizontal_mid;

    [
        (NORTH_EAST, north && east),
        (NORTH_WEST, north && west),
        (SOUTH_WEST, south && west),
        (SOUTH_EAST, south && east),
    ]
    .into_iter()
    .filter_map(|(quadrant, reached)| reached.then_some(quadrant))
}
