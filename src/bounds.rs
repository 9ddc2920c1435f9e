use glam::{Mat4, Vec3, Vec4};

/// Axis-aligned bounding box. Only the two extreme corners are stored.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABBox {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Panics on an empty slice.
    pub fn from_points(points: &[Vec3]) -> Self {
        assert!(!points.is_empty(), "cannot bound an empty point set");
        let (min, max) = points[1..]
            .iter()
            .fold((points[0], points[0]), |(min, max), &p| (min.min(p), max.max(p)));
        Self { min, max }
    }

    /// Whether `other` lies entirely inside this box, faces included.
    pub fn contains(&self, other: &AABBox) -> bool {
        self.min.cmple(other.min).all() && other.max.cmple(self.max).all()
    }

    pub fn corners(&self) -> [Vec4; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            lo.extend(1.0),
            Vec4::new(lo.x, lo.y, hi.z, 1.0),
            Vec4::new(lo.x, hi.y, lo.z, 1.0),
            Vec4::new(lo.x, hi.y, hi.z, 1.0),
            hi.extend(1.0),
            Vec4::new(hi.x, hi.y, lo.z, 1.0),
            Vec4::new(hi.x, lo.y, hi.z, 1.0),
            Vec4::new(hi.x, lo.y, lo.z, 1.0),
        ]
    }
}

/// Oriented bounding box: an origin corner plus the three corners adjacent to
/// it (`i`, `j`, `k`). Any 4x4 transform of the four points still describes a
/// parallelepiped, so the box survives projection into clip space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OBBox {
    pub origin: Vec4,
    pub i: Vec4,
    pub j: Vec4,
    pub k: Vec4,
}

impl OBBox {
    pub fn corners(&self) -> [Vec4; 8] {
        let dj = self.j - self.origin;
        let dk = self.k - self.origin;
        let djdk = dj + dk;
        [
            self.origin,
            self.i,
            self.j,
            self.k,
            self.i + dj,
            self.i + dk,
            self.origin + djdk,
            self.i + djdk,
        ]
    }

    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self {
            origin: *matrix * self.origin,
            i: *matrix * self.i,
            j: *matrix * self.j,
            k: *matrix * self.k,
        }
    }

    pub fn surrounding_aabb(&self) -> AABBox {
        let points = self.corners().map(|p| p.truncate());
        AABBox::from_points(&points)
    }
}

impl From<AABBox> for OBBox {
    fn from(b: AABBox) -> Self {
        Self {
            origin: b.min.extend(1.0),
            i: Vec4::new(b.max.x, b.min.y, b.min.z, 1.0),
            j: Vec4::new(b.min.x, b.max.y, b.min.z, 1.0),
            k: Vec4::new(b.min.x, b.min.y, b.max.z, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obbox_from_aabb_has_same_corners() {
        let aabb = AABBox::new(Vec3::new(-1.0, 2.0, -3.0), Vec3::new(4.0, 5.0, 6.0));
        let mut a = aabb.corners().map(|p| p.to_array());
        let mut b = OBBox::from(aabb).corners().map(|p| p.to_array());
        a.sort_by(|x, y| x.partial_cmp(y).unwrap());
        b.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn transformed_box_round_trips_to_aabb() {
        let aabb = AABBox::new(Vec3::splat(-0.5), Vec3::splat(0.5));
        let m = Mat4::from_translation(Vec3::new(10.0, 0.0, -2.0)) * Mat4::from_scale(Vec3::splat(2.0));
        let moved = OBBox::from(aabb).transform(&m).surrounding_aabb();
        assert_eq!(moved.min, Vec3::new(9.0, -1.0, -3.0));
        assert_eq!(moved.max, Vec3::new(11.0, 1.0, -1.0));
    }

    #[test]
    fn rotated_box_grows_its_aabb() {
        let aabb = AABBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let m = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4);
        let grown = OBBox::from(aabb).transform(&m).surrounding_aabb();
        let expected = 2.0_f32.sqrt();
        assert!((grown.max.x - expected).abs() < 1e-5);
        assert!((grown.min.z + expected).abs() < 1e-5);
        assert!((grown.max.y - 1.0).abs() < 1e-6);
    }
}
