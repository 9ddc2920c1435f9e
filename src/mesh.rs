use glam::{Vec2, Vec3};

use crate::bounds::AABBox;
use crate::triangle::Triangle;

/// A polygon as delivered by a mesh supplier: clockwise vertex indices and,
/// optionally, one texture coordinate index per vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: [usize; 3],
    pub texcoords: Option<[usize; 3]>,
}

impl Face {
    pub fn new(vertices: [usize; 3]) -> Self {
        Self { vertices, texcoords: None }
    }

    pub fn textured(vertices: [usize; 3], texcoords: [usize; 3]) -> Self {
        Self { vertices, texcoords: Some(texcoords) }
    }
}

/// Immutable triangle mesh shared (through `Arc`) by every object that uses it.
#[derive(Debug)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    triangles: Vec<Triangle>,
    normals: Vec<Vec3>,
    bounds: AABBox,
}

impl Mesh {
    /// Build a mesh, resolving texture indices into per-corner texels and
    /// deriving face normals and the local bounding box.
    ///
    /// Panics on an out-of-range index: a malformed mesh is a programming
    /// error, not something the renderer can recover from.
    pub fn new(vertices: Vec<Vec3>, texcoords: &[Vec2], faces: &[Face]) -> Self {
        assert!(!vertices.is_empty(), "mesh has no vertices");
        let triangles: Vec<Triangle> = faces
            .iter()
            .map(|face| {
                for &i in &face.vertices {
                    assert!(i < vertices.len(), "vertex index {i} out of range ({})", vertices.len());
                }
                let texels = match face.texcoords {
                    Some(tc) => tc.map(|i| {
                        assert!(i < texcoords.len(), "texcoord index {i} out of range ({})", texcoords.len());
                        texcoords[i].extend(1.0)
                    }),
                    None => [Vec3::Z; 3],
                };
                Triangle::new(face.vertices, texels, 1.0)
            })
            .collect();

        let normals = triangles
            .iter()
            .map(|t| {
                let [a, b, c] = t.indices.map(|i| vertices[i]);
                (b - a).cross(c - a).normalize_or_zero()
            })
            .collect();

        let bounds = AABBox::from_points(&vertices);
        Self { vertices, triangles, normals, bounds }
    }

    /// Axis-aligned cube of side `size` centred on the origin, two clockwise
    /// triangles per face, each face mapped to the full texture.
    pub fn cube(size: f32) -> Self {
        let h = size * 0.5;
        let vertices: Vec<Vec3> = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 != 0 { h } else { -h },
                    if i & 2 != 0 { h } else { -h },
                    if i & 4 != 0 { h } else { -h },
                )
            })
            .collect();
        let texcoords = [Vec2::new(0.0, 1.0), Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)];
        // quad corners run clockwise seen from outside
        let quads = [
            [0, 2, 3, 1], // -Z
            [2, 6, 7, 3], // +Y
            [1, 3, 7, 5], // +X
            [4, 0, 1, 5], // -Y
            [5, 7, 6, 4], // +Z
            [4, 6, 2, 0], // -X
        ];
        let faces: Vec<Face> = quads
            .iter()
            .flat_map(|&[a, b, c, d]| {
                [Face::textured([a, b, c], [0, 1, 2]), Face::textured([c, d, a], [2, 3, 0])]
            })
            .collect();
        Self::new(vertices, &texcoords, &faces)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn bounds(&self) -> AABBox {
        self.bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_normals_point_outward() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.vertex_count(), 8);
        assert_eq!(cube.triangle_count(), 12);
        for (tri, normal) in cube.triangles().iter().zip(cube.normals()) {
            let centroid = tri.indices.iter().map(|&i| cube.vertices()[i]).sum::<Vec3>() / 3.0;
            assert!((normal.length() - 1.0).abs() < 1e-6);
            assert!(normal.dot(centroid) > 0.0, "normal {normal} points inward");
        }
    }

    #[test]
    fn cube_bounds() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.bounds().min, Vec3::splat(-1.0));
        assert_eq!(cube.bounds().max, Vec3::splat(1.0));
    }

    #[test]
    fn untextured_faces_get_unit_w() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[], &[Face::new([0, 1, 2])]);
        assert_eq!(mesh.triangles()[0].texels, [Vec3::Z; 3]);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn bad_index_panics() {
        Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[], &[Face::new([0, 1, 3])]);
    }
}
