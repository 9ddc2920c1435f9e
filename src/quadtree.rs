use crate::bounds::AABBox;

const NUM_CHILDREN: usize = 4;

/// Square tile on the horizontal X/Z plane. Integer sizes keep the halving
/// exact.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QuadTile {
    pub center_x: i32,
    pub center_z: i32,
    pub half_size: i32,
}

impl QuadTile {
    pub fn new(center_x: i32, center_z: i32, half_size: i32) -> Self {
        Self { center_x, center_z, half_size }
    }

    pub fn min_x(&self) -> i32 {
        self.center_x - self.half_size
    }

    pub fn max_x(&self) -> i32 {
        self.center_x + self.half_size
    }

    pub fn min_z(&self) -> i32 {
        self.center_z - self.half_size
    }

    pub fn max_z(&self) -> i32 {
        self.center_z + self.half_size
    }

    /// Children run clockwise from the top-left (`-x`, `+z`) quadrant.
    pub fn child(&self, n: usize) -> QuadTile {
        let q = self.half_size / 2;
        let (dx, dz) = match n {
            0 => (-q, q),
            1 => (q, q),
            2 => (q, -q),
            3 => (-q, -q),
            _ => unreachable!("quad tile has 4 children, asked for {n}"),
        };
        QuadTile::new(self.center_x + dx, self.center_z + dz, q)
    }

    /// Whether the X/Z footprint of `b` lies entirely inside this tile.
    pub fn contains_footprint(&self, b: &AABBox) -> bool {
        b.min.x >= self.min_x() as f32
            && b.max.x <= self.max_x() as f32
            && b.min.z >= self.min_z() as f32
            && b.max.z <= self.max_z() as f32
    }

    /// The tile extruded vertically through `[min_y, max_y]`.
    pub fn to_aabb(&self, min_y: f32, max_y: f32) -> AABBox {
        AABBox::new(
            glam::Vec3::new(self.min_x() as f32, min_y, self.min_z() as f32),
            glam::Vec3::new(self.max_x() as f32, max_y, self.max_z() as f32),
        )
    }
}

/// Broad-phase index over the X/Z footprint of objects.
///
/// An item is pushed down to the deepest child tile that wholly contains its
/// footprint; items straddling children stay at the current node. Every item
/// is stored exactly once.
#[derive(Debug)]
pub struct Quadtree<T> {
    root: QuadtreeNode<T>,
    root_tile: QuadTile,
    max_depth: u32,
}

#[derive(Debug)]
pub struct QuadtreeNode<T> {
    items: Vec<T>,
    children: Option<Box<[Option<QuadtreeNode<T>>; NUM_CHILDREN]>>,
}

impl<T> Quadtree<T> {
    /// `size` is the side of the root tile centred on the origin; `max_depth`
    /// counts levels including the root.
    pub fn new(size: i32, max_depth: u32) -> Self {
        assert!(size > 0 && max_depth > 0, "quadtree needs a positive size and depth");
        Self {
            root: QuadtreeNode::new(),
            root_tile: QuadTile::new(0, 0, size / 2),
            max_depth,
        }
    }

    pub fn root(&self) -> &QuadtreeNode<T> {
        &self.root
    }

    pub fn root_tile(&self) -> QuadTile {
        self.root_tile
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn add(&mut self, item: T, footprint: &AABBox) {
        self.root.add(item, footprint, self.root_tile, self.max_depth - 1);
    }

    pub fn items(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.root.collect_items(&mut out);
        out
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> QuadtreeNode<T> {
    fn new() -> Self {
        Self { items: Vec::new(), children: None }
    }

    /// Items stored at this node only (those straddling its children).
    pub fn node_items(&self) -> &[T] {
        &self.items
    }

    pub fn child(&self, n: usize) -> Option<&QuadtreeNode<T>> {
        self.children.as_ref().and_then(|c| c[n].as_ref())
    }

    pub fn children(&self) -> impl Iterator<Item = (usize, &QuadtreeNode<T>)> {
        (0..NUM_CHILDREN).filter_map(move |n| self.child(n).map(|c| (n, c)))
    }

    fn add(&mut self, item: T, footprint: &AABBox, tile: QuadTile, levels_left: u32) {
        if levels_left > 0 {
            if let Some(n) = (0..NUM_CHILDREN).find(|&n| tile.child(n).contains_footprint(footprint)) {
                let children = self.children.get_or_insert_with(|| Box::new([None, None, None, None]));
                children[n]
                    .get_or_insert_with(QuadtreeNode::new)
                    .add(item, footprint, tile.child(n), levels_left - 1);
                return;
            }
        }
        self.items.push(item);
    }

    /// Append every item in this subtree.
    pub fn collect_items<'a>(&'a self, out: &mut Vec<&'a T>) {
        out.extend(self.items.iter());
        for (_, child) in self.children() {
            child.collect_items(out);
        }
    }

    pub fn len(&self) -> usize {
        self.items.len() + self.children().map(|(_, c)| c.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
