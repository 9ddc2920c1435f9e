use glam::Vec3;

use crate::bounds::AABBox;

const NUM_CHILDREN: usize = 8;

/// Axis-aligned cube used as an octree cell.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OctCube {
    pub center: Vec3,
    pub half_size: f32,
}

impl OctCube {
    pub fn new(center: Vec3, half_size: f32) -> Self {
        Self { center, half_size }
    }

    pub fn min(&self) -> Vec3 {
        self.center - Vec3::splat(self.half_size)
    }

    pub fn max(&self) -> Vec3 {
        self.center + Vec3::splat(self.half_size)
    }

    /// Upper layer (`+y`) is 0..=3, lower layer 4..=7; each layer runs
    /// clockwise from (`-x`, `+z`).
    pub fn child(&self, n: usize) -> OctCube {
        let q = self.half_size * 0.5;
        let (dx, dz) = match n % 4 {
            0 => (-q, q),
            1 => (q, q),
            2 => (q, -q),
            _ => (-q, -q),
        };
        let dy = match n {
            0..=3 => q,
            4..=7 => -q,
            _ => unreachable!("octree cube has 8 children, asked for {n}"),
        };
        OctCube::new(self.center + Vec3::new(dx, dy, dz), q)
    }

    pub fn contains(&self, b: &AABBox) -> bool {
        b.min.cmpge(self.min()).all() && b.max.cmple(self.max()).all()
    }
}

/// Volumetric counterpart of [`crate::quadtree::Quadtree`]. Same placement
/// rules, eight children per node.
#[derive(Debug)]
pub struct Octree<T> {
    root: OctreeNode<T>,
    root_cube: OctCube,
    max_depth: u32,
}

#[derive(Debug)]
pub struct OctreeNode<T> {
    items: Vec<T>,
    children: Option<Box<[Option<OctreeNode<T>>; NUM_CHILDREN]>>,
}

impl<T> Octree<T> {
    pub fn new(half_size: f32, max_depth: u32) -> Self {
        assert!(half_size > 0.0 && max_depth > 0, "octree needs a positive size and depth");
        Self {
            root: OctreeNode::new(),
            root_cube: OctCube::new(Vec3::ZERO, half_size),
            max_depth,
        }
    }

    pub fn root(&self) -> &OctreeNode<T> {
        &self.root
    }

    pub fn root_cube(&self) -> OctCube {
        self.root_cube
    }

    pub fn add(&mut self, item: T, bounds: &AABBox) {
        self.root.add(item, bounds, self.root_cube, self.max_depth - 1);
    }

    pub fn items(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.root.collect_items(&mut out);
        out
    }
}

impl<T> OctreeNode<T> {
    fn new() -> Self {
        Self { items: Vec::new(), children: None }
    }

    pub fn node_items(&self) -> &[T] {
        &self.items
    }

    pub fn child(&self, n: usize) -> Option<&OctreeNode<T>> {
        self.children.as_ref().and_then(|c| c[n].as_ref())
    }

    pub fn children(&self) -> impl Iterator<Item = (usize, &OctreeNode<T>)> {
        (0..NUM_CHILDREN).filter_map(move |n| self.child(n).map(|c| (n, c)))
    }

    fn add(&mut self, item: T, bounds: &AABBox, cube: OctCube, levels_left: u32) {
        if levels_left > 0 {
            if let Some(n) = (0..NUM_CHILDREN).find(|&n| cube.child(n).contains(bounds)) {
                let children = self.children.get_or_insert_with(|| Box::new(Default::default()));
                children[n]
                    .get_or_insert_with(OctreeNode::new)
                    .add(item, bounds, cube.child(n), levels_left - 1);
                return;
            }
        }
        self.items.push(item);
    }

    pub fn collect_items<'a>(&'a self, out: &mut Vec<&'a T>) {
        out.extend(self.items.iter());
        for (_, child) in self.children() {
            child.collect_items(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    #[test]
    fn children_tile_the_parent() {
        let cube = OctCube::new(Vec3::ZERO, 8.0);
        let volume: f32 = (0..8).map(|n| (2.0 * cube.child(n).half_size).powi(3)).sum();
        assert_eq!(volume, 16.0_f32.powi(3));
        assert_eq!(cube.child(0).center, Vec3::new(-4.0, 4.0, 4.0));
        assert_eq!(cube.child(6).center, Vec3::new(4.0, -4.0, -4.0));
    }

    #[test]
    fn splits_on_height_too() {
        let mut tree = Octree::new(64.0, 3);
        let above = AABBox::new(Vec3::new(10.0, 10.0, 10.0), Vec3::new(11.0, 11.0, 11.0));
        let below = AABBox::new(Vec3::new(10.0, -11.0, 10.0), Vec3::new(11.0, -10.0, 11.0));
        let across = AABBox::new(Vec3::new(10.0, -1.0, 10.0), Vec3::new(11.0, 1.0, 11.0));
        tree.add("above", &above);
        tree.add("below", &below);
        tree.add("across", &across);
        assert_eq!(tree.root().node_items(), &["across"]);
        assert!(tree.root().child(1).is_some());
        assert!(tree.root().child(5).is_some());
    }

    #[test]
    fn every_item_stored_exactly_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut tree = Octree::new(100.0, 5);
        for i in 0..400usize {
            let c = Vec3::new(rng.gen_range(-90.0..90.0), rng.gen_range(-90.0..90.0), rng.gen_range(-90.0..90.0));
            let h = Vec3::splat(rng.gen_range(0.1..8.0));
            tree.add(i, &AABBox::new(c - h, c + h));
        }
        let mut found: Vec<usize> = tree.items().into_iter().copied().collect();
        found.sort_unstable();
        assert_eq!(found, (0..400).collect::<Vec<_>>());
    }
}
