//! Textures map surface coordinates `(u, v)` and a hit point to a color.

use std::path::Path;
use std::sync::Arc;

use ember_math::{Interval, Point3};
use rand::RngCore;
use thiserror::Error;

use crate::perlin::Perlin;
use crate::Color;

/// Errors that can occur during texture loading.
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Anything that can be sampled for a color at a surface point.
pub trait Texture: Send + Sync {
    fn value(&self, u: f32, v: f32, p: Point3) -> Color;
}

/// A single constant color.
#[derive(Debug, Clone, Copy)]
pub struct SolidColor {
    albedo: Color,
}

impl SolidColor {
    pub fn new(albedo: Color) -> Self {
        Self { albedo }
    }

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(Color::new(r, g, b))
    }
}

impl Texture for SolidColor {
    fn value(&self, _u: f32, _v: f32, _p: Point3) -> Color {
        self.albedo
    }
}

/// 3D checkerboard alternating between two textures.
///
/// The parity of `floor(x) + floor(y) + floor(z)` (after scaling) picks the
/// cell, so the pattern is solid rather than painted on in UV space.
pub struct CheckerTexture {
    inv_scale: f32,
    even: Arc<dyn Texture>,
    odd: Arc<dyn Texture>,
}

impl CheckerTexture {
    pub fn new(scale: f32, even: Arc<dyn Texture>, odd: Arc<dyn Texture>) -> Self {
        Self {
            inv_scale: 1.0 / scale,
            even,
            odd,
        }
    }

    pub fn from_colors(scale: f32, even: Color, odd: Color) -> Self {
        Self::new(scale, Arc::new(SolidColor::new(even)), Arc::new(SolidColor::new(odd)))
    }
}

impl Texture for CheckerTexture {
    fn value(&self, u: f32, v: f32, p: Point3) -> Color {
        let cell = (self.inv_scale * p).floor();
        let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;

        if sum.rem_euclid(2) == 0 {
            self.even.value(u, v, p)
        } else {
            self.odd.value(u, v, p)
        }
    }
}

/// Texture backed by a decoded image, sampled nearest-pixel.
pub struct ImageTexture {
    width: u32,
    height: u32,
    /// RGB in [0, 1], row-major, top row first
    pixels: Vec<Color>,
}

impl ImageTexture {
    /// Load an image from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let texture = Self::from_rgb8(&image::open(path)?.to_rgb8());
        log::debug!("Loaded image texture {} ({}x{})", path.display(), texture.width, texture.height);
        Ok(texture)
    }

    /// Use 8-bit channels directly as `byte / 255`, without sRGB decoding.
    pub fn from_rgb8(rgb: &image::RgbImage) -> Self {
        let (width, height) = rgb.dimensions();
        let pixels = rgb
            .pixels()
            .map(|p| Color::new(p[0] as f32, p[1] as f32, p[2] as f32) / 255.0)
            .collect();
        Self::from_pixels(width, height, pixels)
    }

    /// Load an image, falling back to the cyan debug texture on failure.
    pub fn open_or_debug(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::open(path) {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("Could not load texture {}: {}", path.display(), e);
                Self::from_pixels(0, 0, Vec::new())
            }
        }
    }

    /// Build from RGB pixels in row-major order, top row first.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        Self {
            width,
            height,
            pixels,
        }
    }
}

impl Texture for ImageTexture {
    fn value(&self, u: f32, v: f32, _p: Point3) -> Color {
        // Solid cyan marks a missing image
        if self.height == 0 || self.pixels.is_empty() {
            return Color::new(0.0, 1.0, 1.0);
        }

        let unit = Interval::new(0.0, 1.0);
        let u = unit.clamp(u);
        let v = 1.0 - unit.clamp(v); // Flip V to image coordinates

        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);

        self.pixels
            .get((y * self.width + x) as usize)
            .copied()
            .unwrap_or(Color::ZERO)
    }
}

/// Marble-like pattern driven by Perlin turbulence.
pub struct NoiseTexture {
    noise: Perlin,
    scale: f32,
}

impl NoiseTexture {
    pub fn new(scale: f32, rng: &mut dyn RngCore) -> Self {
        Self {
            noise: Perlin::new(rng),
            scale,
        }
    }
}

impl Texture for NoiseTexture {
    fn value(&self, _u: f32, _v: f32, p: Point3) -> Color {
        let phase = self.scale * p.z + 10.0 * self.noise.turbulence(p, 7);
        Color::splat(0.5) * (1.0 + phase.sin())
    }
}
