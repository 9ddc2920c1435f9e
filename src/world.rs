use std::sync::Arc;

use glam::Vec3;

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::controls::Controls;
use crate::culler::Culler;
use crate::mesh::Mesh;
use crate::quadtree::Quadtree;
use crate::texture::Texture;
use crate::world_object::WorldObject;

/// The scene: one camera, the placed objects and the quadtree indexing them
/// by id (their position in `objects`).
pub struct World {
    camera: Camera,
    objects: Vec<WorldObject>,
    quadtree: Quadtree<usize>,
    culler: Culler,
    camera_speed: f32,
    rotation_speed: f32,
    fov_speed: f32,
    fov_min: f32,
    fov_max: f32,
    quadtree_size: i32,
    quadtree_depth: u32,
}

impl World {
    /// Expects a validated config.
    pub fn new(config: &EngineConfig) -> Self {
        log::info!(
            "world {}x{}, fov {}, quadtree {} deep over {} units",
            config.width,
            config.height,
            config.fov_degrees,
            config.quadtree_depth,
            config.quadtree_size
        );
        Self {
            camera: config.camera(),
            objects: Vec::new(),
            quadtree: Quadtree::new(config.quadtree_size, config.quadtree_depth),
            culler: Culler::new(config.tile_min_y, config.tile_max_y),
            camera_speed: config.camera_speed(),
            rotation_speed: config.rotation_speed,
            fov_speed: config.fov_speed,
            fov_min: config.fov_min,
            fov_max: config.fov_max,
            quadtree_size: config.quadtree_size,
            quadtree_depth: config.quadtree_depth,
        }
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Place an object and return its id.
    pub fn add_object(&mut self, object: WorldObject) -> usize {
        let id = self.objects.len();
        self.quadtree.add(id, &object.world_bounds());
        self.objects.push(object);
        id
    }

    /// Displace an object. The quadtree has no removal, so it is rebuilt.
    pub fn move_object(&mut self, id: usize, delta: Vec3) {
        self.objects[id].move_by(delta);
        self.rebuild_index();
    }

    /// Lay out `per_side * per_side` copies of `mesh` on the ground plane,
    /// `spacing` apart and centred on the origin.
    pub fn add_grid(&mut self, mesh: &Arc<Mesh>, texture: &Arc<Texture>, per_side: usize, spacing: f32) {
        let offset = (per_side as f32 - 1.0) * spacing * 0.5;
        for row in 0..per_side {
            for col in 0..per_side {
                let position = Vec3::new(col as f32 * spacing - offset, 0.0, row as f32 * spacing - offset);
                self.add_object(WorldObject::new(mesh.clone(), texture.clone(), position, 1.0));
            }
        }
        log::debug!("added a {per_side}x{per_side} grid, {} objects total", self.objects.len());
    }

    fn rebuild_index(&mut self) {
        let mut quadtree = Quadtree::new(self.quadtree_size, self.quadtree_depth);
        for (id, object) in self.objects.iter().enumerate() {
            quadtree.add(id, &object.world_bounds());
        }
        self.quadtree = quadtree;
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    pub fn quadtree(&self) -> &Quadtree<usize> {
        &self.quadtree
    }

    pub fn culler(&self) -> &Culler {
        &self.culler
    }

    /// Advance the camera by `dt` seconds of the held controls. Movement is
    /// relative to where the camera is looking.
    pub fn update(&mut self, dt: f32, controls: &Controls) {
        let movement = controls.movement_direction();
        if movement != Vec3::ZERO {
            let direction = self.camera.to_world_direction(movement);
            self.camera.move_by(direction * self.camera_speed * dt);
        }

        let rotation = controls.rotation_direction();
        if rotation != Vec3::ZERO {
            self.camera.rotate_by(rotation * self.rotation_speed * dt);
        }

        let fov = controls.fov_delta();
        if fov != 0.0 {
            let target = self.camera.fov() + fov * self.fov_speed * dt;
            self.camera.set_fov(target.clamp(self.fov_min, self.fov_max));
        }
    }
}
