use glam::Vec3;

/// Indices of three vertices in clockwise order (seen from outside the mesh),
/// the texel attached to each corner and a light intensity in `[0, 1]`.
///
/// Texels are `(u, v, w)` with `w = 1` until the projection stage stores
/// `1/w_clip` there for perspective correction.
///
/// Each pipeline stage builds new triangles instead of editing queued ones,
/// since clipping makes triangles that point at freshly appended vertices.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub indices: [usize; 3],
    pub texels: [Vec3; 3],
    pub light: f32,
}

impl Triangle {
    pub fn new(indices: [usize; 3], texels: [Vec3; 3], light: f32) -> Self {
        Self { indices, texels, light }
    }

    /// Untextured triangle at full intensity.
    pub fn untextured(a: usize, b: usize, c: usize) -> Self {
        Self::new([a, b, c], [Vec3::Z; 3], 1.0)
    }

    pub fn with_light(self, light: f32) -> Self {
        Self { light, ..self }
    }

    /// Same triangle with its corners rotated so corner `first` comes first.
    /// Winding is preserved.
    pub fn rotated(self, first: usize) -> Self {
        let order = [first % 3, (first + 1) % 3, (first + 2) % 3];
        Self {
            indices: order.map(|k| self.indices[k]),
            texels: order.map(|k| self.texels[k]),
            light: self.light,
        }
    }
}

/// A triangle after perspective division and viewport transform, ready for
/// the rasterizer. Points are `(x_screen, y_screen, z_ndc)`, texels are
/// `(u/w, v/w, 1/w)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScreenTriangle {
    pub points: [Vec3; 3],
    pub texels: [Vec3; 3],
    pub light: f32,
}
