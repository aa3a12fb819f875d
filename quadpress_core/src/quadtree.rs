//! Quadtree build and apply passes
//!
//! The tree is stored as an arena: nodes live in one `Vec` addressed by
//! index, each holding up to four child indices. Teardown is a bulk drop
//! of the arena, so deep trees never recurse on destruction.
//!
//! Construction is breadth-first. A node subdivides only when the active
//! metric rejects it at the current threshold AND a quarter of its area
//! still meets the minimum block size; the floor is checked before
//! committing to the split, never after.

use crate::metrics::ErrorMetric;
use crate::raster::{Raster, COLOR_CHANNELS};
use crate::sequence::RasterSequence;
use std::collections::VecDeque;

/// Frame delay for the refinement animation, one frame per BFS level.
pub const DEFAULT_FRAME_DELAY_MS: u32 = 700;

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Split into four children at (w/2, h/2). Children are ordered
    /// top-right, top-left, bottom-left, bottom-right; the right/bottom
    /// children absorb any odd remainder so the partition stays exact.
    pub fn split(&self) -> [Rect; 4] {
        let hw = self.width / 2;
        let hh = self.height / 2;
        [
            Rect::new(self.x + hw, self.y, self.width - hw, hh),
            Rect::new(self.x, self.y, hw, hh),
            Rect::new(self.x, self.y + hh, hw, self.height - hh),
            Rect::new(self.x + hw, self.y + hh, self.width - hw, self.height - hh),
        ]
    }
}

pub type NodeId = usize;

/// One arena node: a rectangle, subdivided or not.
#[derive(Debug, Clone)]
pub struct QuadtreeNode {
    pub rect: Rect,
    pub children: Option<[NodeId; 4]>,
}

impl QuadtreeNode {
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// A built quadtree over one raster's coordinate space.
pub struct Quadtree {
    nodes: Vec<QuadtreeNode>,
    root: NodeId,
    depth: u32,
    node_count: usize,
}

impl Quadtree {
    /// Breadth-first construction driven by the error metric.
    ///
    /// The raster must already carry the prefix table(s) the metric needs.
    /// `min_block_size` is an area floor in pixels squared; no produced
    /// leaf ever falls below it.
    pub fn build(
        raster: &Raster,
        metric: &dyn ErrorMetric,
        threshold: f64,
        min_block_size: u32,
    ) -> Self {
        let root_rect = Rect::new(0, 0, raster.width(), raster.height());
        let mut nodes = vec![QuadtreeNode {
            rect: root_rect,
            children: None,
        }];
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(0);
        let mut depth = 0u32;

        while !queue.is_empty() {
            for _ in 0..queue.len() {
                let id = queue.pop_front().expect("level drain underflow");
                let rect = nodes[id].rect;
                if rect.area() == 0 {
                    continue;
                }
                let error = metric.calculate_error(raster, rect);
                let splittable = rect.area() / 4 >= min_block_size as u64;
                if !metric.is_quality_acceptable(error, threshold) && splittable {
                    let first_child = nodes.len();
                    let mut ids = [0usize; 4];
                    for (slot, child_rect) in rect.split().into_iter().enumerate() {
                        ids[slot] = first_child + slot;
                        nodes.push(QuadtreeNode {
                            rect: child_rect,
                            children: None,
                        });
                        queue.push_back(first_child + slot);
                    }
                    nodes[id].children = Some(ids);
                }
            }
            if !queue.is_empty() {
                depth += 1;
            }
        }

        let node_count = nodes.len();
        tracing::debug!(threshold, min_block_size, depth, node_count, "Quadtree built");
        Self {
            nodes,
            root: 0,
            depth,
            node_count,
        }
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Total nodes in the tree, root and internals included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    #[inline]
    pub fn root(&self) -> &QuadtreeNode {
        &self.nodes[self.root]
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &QuadtreeNode {
        &self.nodes[id]
    }

    pub fn leaves(&self) -> impl Iterator<Item = &QuadtreeNode> {
        self.nodes.iter().filter(|n| n.is_leaf())
    }

    fn paint_average(&self, source: &Raster, target: &mut Raster, rect: Rect) {
        let area = rect.area() as i64;
        if area == 0 {
            return;
        }
        let mut avg = [0u8; COLOR_CHANNELS];
        for (c, slot) in avg.iter_mut().enumerate() {
            let sum = source.channel_block_sum(rect.x, rect.y, rect.width, rect.height, c);
            *slot = (sum / area) as u8;
        }
        target.set_block_color(rect.x, rect.y, rect.width, rect.height, avg[0], avg[1], avg[2]);
    }

    /// Flatten: paint every leaf with its exact channel average.
    ///
    /// Averages use the source's summed-area table with truncating integer
    /// division; alpha is carried over from the source untouched. The
    /// source raster must have its summed-area table built.
    pub fn apply(&self, source: &Raster) -> Raster {
        let mut output = source.pixel_copy();
        for leaf in self.leaves() {
            self.paint_average(source, &mut output, leaf.rect);
        }
        output
    }

    /// Animate: one frame per BFS level, replaying the refinement from
    /// coarse to fine. Every node at a level is painted with its average
    /// (children overpaint their parent on the next level), then the
    /// working image is snapshotted.
    pub fn apply_animation(&self, source: &Raster) -> RasterSequence {
        let mut working = source.pixel_copy();
        let mut sequence = RasterSequence::new();
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        queue.push_back(self.root);

        while !queue.is_empty() {
            for _ in 0..queue.len() {
                let id = queue.pop_front().expect("level drain underflow");
                let node = &self.nodes[id];
                self.paint_average(source, &mut working, node.rect);
                if let Some(children) = node.children {
                    queue.extend(children);
                }
            }
            sequence.push(working.clone(), DEFAULT_FRAME_DELAY_MS);
        }
        sequence
    }
}
