use std::sync::Arc;

use glam::{DVec3, Mat4, Vec3};

use crate::bounds::{AABBox, OBBox};
use crate::mesh::Mesh;
use crate::texture::Texture;

/// A placed, uniformly scaled instance of a shared mesh.
///
/// The position is accumulated in `f64` so that millions of small per-frame
/// displacements do not drift.
#[derive(Debug, Clone)]
pub struct WorldObject {
    mesh: Arc<Mesh>,
    texture: Arc<Texture>,
    position: DVec3,
    scale: f32,
}

impl WorldObject {
    pub fn new(mesh: Arc<Mesh>, texture: Arc<Texture>, position: Vec3, scale: f32) -> Self {
        assert!(scale > 0.0, "object scale must be positive");
        Self { mesh, texture, position: position.as_dvec3(), scale }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn position(&self) -> Vec3 {
        self.position.as_vec3()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position.as_dvec3();
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn move_by(&mut self, delta: Vec3) {
        self.position += delta.as_dvec3();
    }

    /// Scale, then translate.
    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_translation(self.position()) * Mat4::from_scale(Vec3::splat(self.scale))
    }

    /// Un-translate, then un-scale.
    pub fn world_to_local(&self) -> Mat4 {
        Mat4::from_scale(Vec3::splat(1.0 / self.scale)) * Mat4::from_translation(-self.position())
    }

    /// The mesh's local bounding box carried into world space.
    pub fn world_bounds(&self) -> AABBox {
        OBBox::from(self.mesh.bounds()).transform(&self.local_to_world()).surrounding_aabb()
    }
}
