use glam::{Mat4, Vec3, Vec4};

use crate::accumulator::{KahanVec3, normalize_angles};

/// Viewer state. Matrices are recomputed on every call; they are read once
/// per frame so caching them buys nothing.
///
/// View space has +X right, +Y up and +Z forward. Angles are
/// `(pitch, yaw, roll)` around X, Y and Z, always kept in `[0, 2π)`.
#[derive(Debug, Clone)]
pub struct Camera {
    width: u32,
    height: u32,
    fov: f32,
    z_near: f32,
    z_far: f32,
    position: KahanVec3,
    angles: Vec3,
}

impl Camera {
    /// `fov` is in degrees. Sizes and clip distances are validated by the
    /// caller (see `EngineConfig::validate`).
    pub fn new(width: u32, height: u32, fov: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            width,
            height,
            fov,
            z_near,
            z_far,
            position: KahanVec3::default(),
            angles: Vec3::ZERO,
        }
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position.set(position);
        self
    }

    pub fn with_angles(mut self, angles: Vec3) -> Self {
        self.angles = normalize_angles(angles);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f32) {
        self.fov = fov;
    }

    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    pub fn position(&self) -> Vec3 {
        self.position.value()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position.set(position);
    }

    pub fn angles(&self) -> Vec3 {
        self.angles
    }

    pub fn move_by(&mut self, delta: Vec3) {
        self.position.add(delta);
    }

    pub fn rotate_by(&mut self, delta: Vec3) {
        self.angles = normalize_angles(self.angles + delta);
    }

    /// Camera orientation as a camera -> world rotation.
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_z(self.angles.z)
            * Mat4::from_rotation_y(self.angles.y)
            * Mat4::from_rotation_x(self.angles.x)
    }

    /// Rotate a camera-space direction into world space.
    pub fn to_world_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation().transform_vector3(direction)
    }

    /// World -> camera: undo the translation, then undo roll, yaw and pitch.
    pub fn world_to_camera(&self) -> Mat4 {
        let unrotate = Mat4::from_rotation_x(-self.angles.x)
            * Mat4::from_rotation_y(-self.angles.y)
            * Mat4::from_rotation_z(-self.angles.z);
        unrotate * Mat4::from_translation(-self.position())
    }

    /// Perspective projection into clip space where the view volume is
    /// `|x| <= w`, `|y| <= w`, `0 <= z <= w`, with `w` the view-space depth.
    pub fn projection(&self) -> Mat4 {
        let d = 1.0 / (self.fov.to_radians() * 0.5).tan();
        let delta_z = self.z_far - self.z_near;
        Mat4::from_cols(
            Vec4::new(d / self.aspect_ratio(), 0.0, 0.0, 0.0),
            Vec4::new(0.0, d, 0.0, 0.0),
            Vec4::new(0.0, 0.0, self.z_far / delta_z, 1.0),
            Vec4::new(0.0, 0.0, -self.z_far * self.z_near / delta_z, 0.0),
        )
    }

    /// NDC `[-1, 1]` to pixels. Y is flipped so rows grow downward; pixel
    /// `(x, y)` covers `[x, x+1) x [y, y+1)` and is sampled at its centre.
    pub fn viewport(&self) -> Mat4 {
        let half_width = self.width as f32 * 0.5;
        let half_height = self.height as f32 * 0.5;
        Mat4::from_cols(
            Vec4::new(half_width, 0.0, 0.0, 0.0),
            Vec4::new(0.0, -half_height, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(half_width, half_height, 0.0, 1.0),
        )
    }

    pub fn world_to_projection(&self) -> Mat4 {
        self.projection() * self.world_to_camera()
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::{FRAC_PI_2, TAU};

    use super::*;

    fn camera() -> Camera {
        Camera::new(100, 100, 90.0, 0.1, 10.0).with_position(Vec3::new(0.0, 0.0, -5.0))
    }

    #[test]
    fn near_and_far_map_to_clip_bounds() {
        let cam = Camera::new(100, 100, 90.0, 0.1, 10.0);
        let proj = cam.projection();
        let near = proj * Vec4::new(0.0, 0.0, 0.1, 1.0);
        let far = proj * Vec4::new(0.0, 0.0, 10.0, 1.0);
        assert!(near.z.abs() < 1e-6);
        assert!((far.z - far.w).abs() < 1e-4);
        assert_eq!(near.w, 0.1);
    }

    #[test]
    fn ninety_degree_fov_edges() {
        let cam = Camera::new(200, 100, 90.0, 0.1, 10.0);
        // at depth 1 the vertical half-extent is 1, the horizontal one 2
        let top = cam.projection() * Vec4::new(0.0, 1.0, 1.0, 1.0);
        let right = cam.projection() * Vec4::new(2.0, 0.0, 1.0, 1.0);
        assert!((top.y - top.w).abs() < 1e-5);
        assert!((right.x - right.w).abs() < 1e-5);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let cam = camera();
        let clip = cam.world_to_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let screen = cam.viewport() * (clip / clip.w);
        assert!((screen.x - 50.0).abs() < 1e-4);
        assert!((screen.y - 50.0).abs() < 1e-4);
        assert!(screen.z > 0.0 && screen.z < 1.0);
    }

    #[test]
    fn viewport_flips_y() {
        let cam = camera();
        let top_left = cam.viewport() * Vec4::new(-1.0, 1.0, 0.5, 1.0);
        let bottom_right = cam.viewport() * Vec4::new(1.0, -1.0, 0.5, 1.0);
        assert_eq!((top_left.x, top_left.y), (0.0, 0.0));
        assert_eq!((bottom_right.x, bottom_right.y), (100.0, 100.0));
    }

    #[test]
    fn yaw_turns_view_direction() {
        let cam = Camera::new(100, 100, 90.0, 0.1, 10.0).with_angles(Vec3::new(0.0, FRAC_PI_2, 0.0));
        let forward = cam.to_world_direction(Vec3::Z);
        assert!((forward - Vec3::X).length() < 1e-6);
        let in_view = cam.world_to_camera().transform_point3(Vec3::X);
        assert!((in_view - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn rotate_by_keeps_angles_normalized() {
        let mut cam = camera();
        for delta in [Vec3::splat(-1.0), Vec3::new(7.0, -13.0, 0.001), Vec3::splat(TAU), Vec3::splat(-1e-9)] {
            cam.rotate_by(delta);
            for a in cam.angles().to_array() {
                assert!((0.0..TAU).contains(&a), "angle {a} out of range");
            }
        }
    }

    #[test]
    fn move_by_is_drift_resistant() {
        let mut cam = Camera::new(16, 9, 45.0, 0.5, 50.0).with_position(Vec3::splat(1.0e6));
        let steps = 100_000;
        let delta = Vec3::splat(0.001);
        for _ in 0..steps {
            cam.move_by(delta);
        }
        let expected = (1.0e6_f64 + 0.001_f32 as f64 * steps as f64) as f32;
        assert!((cam.position().x - expected).abs() <= 0.0625);
    }
}
