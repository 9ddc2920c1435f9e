use glam::Mat4;

use crate::bounds::{AABBox, OBBox};
use crate::frustum::{CullResult, classify_points};
use crate::quadtree::{QuadTile, Quadtree, QuadtreeNode};

/// Classify a clip-space box against the view volume using its 8 corners.
pub fn classify_obbox(clip_box: &OBBox) -> CullResult {
    classify_points(&clip_box.corners())
}

/// Broad-phase visibility over a [`Quadtree`].
///
/// Quadtree tiles are flat, so each one is extruded through a fixed vertical
/// range before being tested against the frustum.
#[derive(Debug, Copy, Clone)]
pub struct Culler {
    pub tile_min_y: f32,
    pub tile_max_y: f32,
}

impl Culler {
    pub fn new(tile_min_y: f32, tile_max_y: f32) -> Self {
        assert!(tile_min_y < tile_max_y, "empty vertical tile extent");
        Self { tile_min_y, tile_max_y }
    }

    /// The tile extruded through the culler's vertical range.
    pub fn tile_volume(&self, tile: QuadTile) -> AABBox {
        tile.to_aabb(self.tile_min_y, self.tile_max_y)
    }

    pub fn classify_tile(&self, tile: QuadTile, world_to_proj: &Mat4) -> CullResult {
        classify_obbox(&OBBox::from(self.tile_volume(tile)).transform(world_to_proj))
    }

    /// Walk the tree top-down, splitting items into those that still need
    /// per-object culling and those that are known to be inside the view
    /// volume. Items under tiles classified outside are dropped.
    ///
    /// An inside tile only vouches for items whose world bounds (looked up
    /// through `bounds`) fit in the tested volume. Items stored at the root
    /// because they overhang its footprint, and items taller than the vertical
    /// range, go to `needs_culling` instead.
    pub fn fill_cull_and_render_lists<T, F>(
        &self,
        tree: &Quadtree<T>,
        world_to_proj: &Mat4,
        bounds: F,
        needs_culling: &mut Vec<T>,
        ready_to_render: &mut Vec<T>,
    ) where
        T: Copy,
        F: Fn(T) -> AABBox,
    {
        self.visit(tree.root(), tree.root_tile(), world_to_proj, &bounds, needs_culling, ready_to_render);
    }

    fn visit<T: Copy, F: Fn(T) -> AABBox>(
        &self,
        node: &QuadtreeNode<T>,
        tile: QuadTile,
        world_to_proj: &Mat4,
        bounds: &F,
        needs_culling: &mut Vec<T>,
        ready_to_render: &mut Vec<T>,
    ) {
        match self.classify_tile(tile, world_to_proj) {
            CullResult::Outside => {}
            CullResult::Inside => {
                let volume = self.tile_volume(tile);
                let mut all = Vec::new();
                node.collect_items(&mut all);
                for &item in all {
                    if volume.contains(&bounds(item)) {
                        ready_to_render.push(item);
                    } else {
                        needs_culling.push(item);
                    }
                }
            }
            CullResult::Partial => {
                needs_culling.extend_from_slice(node.node_items());
                for (n, child) in node.children() {
                    self.visit(child, tile.child(n), world_to_proj, bounds, needs_culling, ready_to_render);
                }
            }
        }
    }
}
