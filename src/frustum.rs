//! Clip-space view volume: `-w <= x <= w`, `-w <= y <= w`, `0 <= z <= w`.

use glam::Vec4;

/// The six half-spaces bounding the view volume, in clipping order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PlaneId {
    Near,
    Left,
    Far,
    Right,
    Top,
    Bottom,
}

impl PlaneId {
    pub const ALL: [PlaneId; 6] = [
        PlaneId::Near,
        PlaneId::Left,
        PlaneId::Far,
        PlaneId::Right,
        PlaneId::Top,
        PlaneId::Bottom,
    ];

    #[inline(always)]
    pub fn contains(self, p: Vec4) -> bool {
        match self {
            PlaneId::Near => p.z >= 0.0,
            PlaneId::Far => p.z <= p.w,
            PlaneId::Left => p.x >= -p.w,
            PlaneId::Right => p.x <= p.w,
            PlaneId::Top => p.y <= p.w,
            PlaneId::Bottom => p.y >= -p.w,
        }
    }

    /// Parameter `alpha` such that `alpha * p1 + (1 - alpha) * p2` lies on
    /// the plane. The segment must cross the plane.
    pub fn intersection_alpha(self, p1: Vec4, p2: Vec4) -> f32 {
        match self {
            PlaneId::Near => -p2.z / (p1.z - p2.z),
            PlaneId::Far => (p2.w - p2.z) / (p1.z - p2.z - p1.w + p2.w),
            PlaneId::Left => (-p2.x - p2.w) / (p1.x - p2.x + p1.w - p2.w),
            PlaneId::Right => (p2.w - p2.x) / (p1.x - p2.x - p1.w + p2.w),
            PlaneId::Top => (p2.w - p2.y) / (p1.y - p2.y - p1.w + p2.w),
            PlaneId::Bottom => (-p2.y - p2.w) / (p1.y - p2.y + p1.w - p2.w),
        }
    }

    pub fn intersect(self, p1: Vec4, p2: Vec4) -> Vec4 {
        let alpha = self.intersection_alpha(p1, p2);
        p1 * alpha + p2 * (1.0 - alpha)
    }
}

#[inline(always)]
pub fn is_inside_view_volume(p: Vec4) -> bool {
    -p.w <= p.x && p.x <= p.w && -p.w <= p.y && p.y <= p.w && 0.0 <= p.z && p.z <= p.w
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CullResult {
    Outside,
    Partial,
    Inside,
}

/// Classify a set of points (typically the 8 corners of a box) against a
/// single plane.
pub fn classify_against_plane(points: &[Vec4], plane: PlaneId) -> CullResult {
    let mut inside = false;
    let mut outside = false;
    for &p in points {
        if plane.contains(p) {
            inside = true;
        } else {
            outside = true;
        }
        if inside && outside {
            return CullResult::Partial;
        }
    }
    if inside { CullResult::Inside } else { CullResult::Outside }
}

/// Classify a point set against the whole view volume.
///
/// Outside as soon as one plane has every point outside it; Inside only when
/// every point is inside every plane; Partial otherwise. Partial is
/// conservative: a box straddling two planes may still miss the volume.
pub fn classify_points(points: &[Vec4]) -> CullResult {
    let mut partial = false;
    for plane in PlaneId::ALL {
        match classify_against_plane(points, plane) {
            CullResult::Outside => return CullResult::Outside,
            CullResult::Partial => partial = true,
            CullResult::Inside => {}
        }
    }
    if partial { CullResult::Partial } else { CullResult::Inside }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_lands_on_each_plane() {
        let inside = Vec4::new(0.1, -0.2, 0.5, 1.0);
        let outside = [
            (PlaneId::Near, Vec4::new(0.0, 0.0, -1.0, 1.0)),
            (PlaneId::Far, Vec4::new(0.0, 0.0, 3.0, 1.0)),
            (PlaneId::Left, Vec4::new(-4.0, 0.0, 0.5, 1.0)),
            (PlaneId::Right, Vec4::new(4.0, 0.0, 0.5, 1.0)),
            (PlaneId::Top, Vec4::new(0.0, 4.0, 0.5, 1.0)),
            (PlaneId::Bottom, Vec4::new(0.0, -4.0, 0.5, 1.0)),
        ];
        for (plane, out) in outside {
            assert!(plane.contains(inside));
            assert!(!plane.contains(out));
            let p = plane.intersect(inside, out);
            let on_plane = match plane {
                PlaneId::Near => p.z,
                PlaneId::Far => p.z - p.w,
                PlaneId::Left => p.x + p.w,
                PlaneId::Right => p.x - p.w,
                PlaneId::Top => p.y - p.w,
                PlaneId::Bottom => p.y + p.w,
            };
            assert!(on_plane.abs() < 1e-5, "{plane:?}: {p}");
            // argument order does not matter
            assert!((plane.intersect(out, inside) - p).length() < 1e-5);
        }
    }

    #[test]
    fn view_volume_bounds_are_inclusive() {
        assert!(is_inside_view_volume(Vec4::new(1.0, -1.0, 0.0, 1.0)));
        assert!(is_inside_view_volume(Vec4::new(-2.0, 2.0, 2.0, 2.0)));
        assert!(!is_inside_view_volume(Vec4::new(0.0, 0.0, -0.01, 1.0)));
        assert!(!is_inside_view_volume(Vec4::new(1.01, 0.0, 0.5, 1.0)));
    }

    #[test]
    fn classification_of_boxes() {
        let inside = [Vec4::new(0.0, 0.0, 0.5, 1.0), Vec4::new(0.5, 0.5, 0.9, 1.0)];
        assert_eq!(classify_points(&inside), CullResult::Inside);

        let straddling = [Vec4::new(0.0, 0.0, 0.5, 1.0), Vec4::new(3.0, 0.0, 0.5, 1.0)];
        assert_eq!(classify_points(&straddling), CullResult::Partial);

        let behind = [Vec4::new(0.0, 0.0, -0.5, 1.0), Vec4::new(3.0, 0.0, -0.1, 1.0)];
        assert_eq!(classify_points(&behind), CullResult::Outside);
    }
}
