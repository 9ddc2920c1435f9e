use glam::{Vec3, Vec4};

use crate::frustum::{PlaneId, is_inside_view_volume};
use crate::triangle::Triangle;

/// Clip-space vertices of one object plus, at the same index, whether each
/// vertex lies inside the view volume. Clipping appends to both in lockstep,
/// so triangles queued earlier keep valid indices.
#[derive(Debug, Default, Clone)]
pub struct VertexBuffer {
    positions: Vec<Vec4>,
    inside: Vec<bool>,
}

impl VertexBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { positions: Vec::with_capacity(capacity), inside: Vec::with_capacity(capacity) }
    }

    /// Append a vertex and return its index.
    pub fn push(&mut self, position: Vec4) -> usize {
        self.positions.push(position);
        self.inside.push(is_inside_view_volume(position));
        self.positions.len() - 1
    }

    /// Reserve a slot for a vertex no triangle will reference.
    pub fn push_unused(&mut self) -> usize {
        self.positions.push(Vec4::ZERO);
        self.inside.push(false);
        self.positions.len() - 1
    }

    #[inline(always)]
    pub fn position(&self, index: usize) -> Vec4 {
        self.positions[index]
    }

    #[inline(always)]
    pub fn is_inside(&self, index: usize) -> bool {
        self.inside[index]
    }

    pub fn positions(&self) -> &[Vec4] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Clip a triangle against the six view-volume planes.
///
/// A triangle whose three vertices are already inside is returned as is.
/// Otherwise it goes through one pass per plane; each pass turns every
/// candidate into 0, 1 or 2 triangles. Vertices created on the way are
/// appended to `vertices`; returned triangles keep the input winding.
pub fn clip_triangle(triangle: Triangle, vertices: &mut VertexBuffer) -> Vec<Triangle> {
    if triangle.indices.iter().all(|&i| vertices.is_inside(i)) {
        return vec![triangle];
    }

    let mut candidates = vec![triangle];
    for plane in PlaneId::ALL {
        let mut survivors = Vec::with_capacity(candidates.len() * 2);
        for t in candidates {
            clip_against_plane(t, plane, vertices, &mut survivors);
        }
        candidates = survivors;
        if candidates.is_empty() {
            break;
        }
    }
    candidates
}

fn clip_against_plane(triangle: Triangle, plane: PlaneId, vertices: &mut VertexBuffer, out: &mut Vec<Triangle>) {
    let inside = triangle.indices.map(|i| plane.contains(vertices.position(i)));
    match inside.iter().filter(|&&b| b).count() {
        3 => out.push(triangle),
        2 => {
            // rotate so the outside corner comes first: (o, a, b)
            let first = if !inside[0] { 0 } else if !inside[1] { 1 } else { 2 };
            let t = triangle.rotated(first);
            let [o, a, b] = t.indices;
            let [to, ta, tb] = t.texels;
            let (p, tp) = split_edge(plane, vertices.position(a), vertices.position(o), ta, to);
            let (q, tq) = split_edge(plane, vertices.position(b), vertices.position(o), tb, to);
            let ip = vertices.push(p);
            let iq = vertices.push(q);
            // the quad (p, a, b, q) as a fan around p
            out.push(Triangle::new([ip, a, b], [tp, ta, tb], t.light));
            out.push(Triangle::new([iq, ip, b], [tq, tp, tb], t.light));
        }
        1 => {
            // rotate so the inside corner comes first: (i, a, b)
            let first = if inside[0] { 0 } else if inside[1] { 1 } else { 2 };
            let t = triangle.rotated(first);
            let [i, a, b] = t.indices;
            let [ti, ta, tb] = t.texels;
            let (p, tp) = split_edge(plane, vertices.position(i), vertices.position(a), ti, ta);
            let (q, tq) = split_edge(plane, vertices.position(i), vertices.position(b), ti, tb);
            let ip = vertices.push(p);
            let iq = vertices.push(q);
            out.push(Triangle::new([i, ip, iq], [ti, tp, tq], t.light));
        }
        _ => {}
    }
}

/// Intersect the edge with `plane` and carry the texel along. The texel is
/// interpolated by the distance ratio from the inside end rather than by the
/// plane parameter, so it does not depend on the plane equation.
fn split_edge(plane: PlaneId, inside: Vec4, outside: Vec4, t_inside: Vec3, t_outside: Vec3) -> (Vec4, Vec3) {
    let p = plane.intersect(inside, outside);
    let ratio = ((p - inside).length_squared() / (outside - inside).length_squared()).sqrt();
    let texel = t_inside + (t_outside - t_inside) * ratio;
    (p, Vec3::new(texel.x, texel.y, 1.0))
}
