use std::path::Path;

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};

/// Decoded RGB texture. Sampling is nearest-neighbour and clamps to the edge;
/// wrapping is not supported.
#[derive(Debug, Clone)]
pub struct Texture {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Texture {
    /// Wrap a row-major `width * height * 3` byte buffer.
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Self {
        assert!(width > 0 && height > 0, "texture must not be empty");
        assert_eq!(rgb.len(), (width * height * 3) as usize, "texture buffer size mismatch");
        Self { width, height, rgb }
    }

    pub fn solid(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgb(1, 1, vec![r, g, b])
    }

    /// Two-colour checkerboard with `cells` squares per side, `cell_size` texels each.
    pub fn checkerboard(cells: u32, cell_size: u32, a: [u8; 3], b: [u8; 3]) -> Self {
        let size = cells * cell_size;
        let mut rgb = Vec::with_capacity((size * size * 3) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if (x / cell_size + y / cell_size) % 2 == 0 { a } else { b };
                rgb.extend_from_slice(&color);
            }
        }
        Self::from_rgb(size, size, rgb)
    }

    pub fn from_image(img: &DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self::from_rgb(width, height, img.to_rgb8().into_raw())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path).with_context(|| format!("failed to load texture {}", path.display()))?;
        Ok(Self::from_image(&img))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = ((y * self.width + x) * 3) as usize;
        [self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]]
    }

    /// Sample at normalized coordinates. Out-of-range (or NaN) coordinates are
    /// clamped to the nearest edge texel.
    #[inline(always)]
    pub fn sample(&self, u: f32, v: f32) -> [u8; 3] {
        let max_x = self.width - 1;
        let max_y = self.height - 1;
        let x = ((u * max_x as f32) as i64).clamp(0, max_x as i64) as u32;
        let y = ((v * max_y as f32) as i64).clamp(0, max_y as i64) as u32;
        self.texel(x, y)
    }
}
