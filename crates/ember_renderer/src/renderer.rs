//! Core path tracing renderer.
//!
//! Implements Monte Carlo path tracing with:
//! - Iterative bounce loop with a configurable depth budget
//! - Gamma correction and 8-bit quantization
//! - Stratified anti-aliasing when the sample count is a perfect square
//! - Scanline-parallel passes with cooperative cancellation

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::{Camera, Color, HitRecord, Hittable, Ray};
use ember_math::Interval;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

/// Color returned for rays that escape the scene.
///
/// Wraps a function of the blend factor `0.5 * (direction.y + 1)`, which
/// runs from 0 straight down to 1 straight up.
#[derive(Clone)]
pub struct Background {
    f: Arc<dyn Fn(f32) -> Color + Send + Sync>,
}

impl Background {
    /// White-to-blue vertical gradient.
    pub fn sky() -> Self {
        Self::from_fn(|a| {
            let white = Color::new(1.0, 1.0, 1.0);
            let blue = Color::new(0.5, 0.7, 1.0);
            white * (1.0 - a) + blue * a
        })
    }

    /// The same color in every direction.
    pub fn solid(color: Color) -> Self {
        Self::from_fn(move |_| color)
    }

    pub fn from_fn(f: impl Fn(f32) -> Color + Send + Sync + 'static) -> Self {
        Self { f: Arc::new(f) }
    }

    /// Evaluate for a ray that missed everything.
    #[inline]
    pub fn eval(&self, ray: &Ray) -> Color {
        let a = 0.5 * (ray.direction().y + 1.0);
        (self.f)(a)
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::sky()
    }
}

impl fmt::Debug for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Background").finish_non_exhaustive()
    }
}

/// Shared flag for stopping a render between scanlines.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every render holding a clone of this token to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clear the flag so the token can be reused.
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

/// Render configuration.
#[derive(Debug, Clone, Default)]
pub struct RenderConfig {
    /// Base seed for per-scanline generators; random when `None`
    pub seed: Option<u64>,
    /// Worker threads; rayon's global pool when `None`
    pub threads: Option<usize>,
    pub cancel: CancelToken,
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// Every scanline finished; 8-bit pixels in row-major order, top row first.
    Completed(Vec<[u8; 3]>),
    /// Cancelled before every scanline finished. Nothing should be merged.
    Cancelled,
}

/// Compute the color seen by a ray.
///
/// Equivalent to the recursion
/// `emitted + attenuation * ray_color(scattered, depth - 1)` with black at
/// depth 0 and the background on a miss, unrolled into a loop that carries
/// the product of attenuations. The scatter pdf is not applied.
pub fn ray_color(ray: &Ray, depth: u32, world: &dyn Hittable, background: &Background, rng: &mut dyn RngCore) -> Color {
    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut ray = *ray;

    for _ in 0..depth {
        let mut rec = HitRecord::default();

        if !world.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec) {
            return radiance + throughput * background.eval(&ray);
        }

        // Get emission from material (for lights)
        radiance += throughput * rec.material.emitted(rec.u, rec.v, rec.p);

        match rec.material.scatter(&ray, &rec, rng) {
            Some(scatter) => {
                throughput *= scatter.attenuation;
                ray = scatter.scattered;
            }
            // Ray was absorbed - just the emission so far
            None => return radiance,
        }
    }

    // Bounce budget exhausted
    radiance
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to gamma-corrected 8-bit RGB.
pub fn color_to_rgb8(color: Color) -> [u8; 3] {
    let intensity = Interval::new(0.0, 0.999);
    let quantize = |c: f32| (256.0 * intensity.clamp(linear_to_gamma(c))) as u8;
    [quantize(color.x), quantize(color.y), quantize(color.z)]
}

/// Render a single pixel with `samples` samples; returns the mean linear color.
///
/// A perfect-square sample count is spread over a stratified grid.
pub fn render_pixel(camera: &Camera, world: &dyn Hittable, x: u32, y: u32, samples: u32, rng: &mut dyn RngCore) -> Color {
    let samples = samples.max(1);
    let max_depth = camera.max_depth();
    let background = camera.background();
    let mut pixel_color = Color::ZERO;

    let strata = (samples as f64).sqrt() as u32;
    if strata * strata == samples {
        for s_j in 0..strata {
            for s_i in 0..strata {
                let ray = camera.get_ray_stratified(x, y, s_i, s_j, strata, rng);
                pixel_color += ray_color(&ray, max_depth, world, background, rng);
            }
        }
    } else {
        for _ in 0..samples {
            let ray = camera.get_ray(x, y, rng);
            pixel_color += ray_color(&ray, max_depth, world, background, rng);
        }
    }

    // Average the samples
    pixel_color / samples as f32
}

/// Seed for one scanline of one pass.
#[inline]
fn scanline_seed(base: u64, pass: u32, row: usize) -> u64 {
    base ^ (pass as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (row as u64 + 1).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
}

/// Render one pass of `samples` samples per pixel, in parallel over scanlines.
///
/// Runs on whatever rayon pool is current. Each scanline owns its own
/// generator seeded from (`seed`, `pass`, row), so the output does not
/// depend on the thread count.
pub fn render_pass(
    camera: &Camera,
    world: &dyn Hittable,
    samples: u32,
    seed: u64,
    pass: u32,
    cancel: &CancelToken,
) -> PassOutcome {
    let width = camera.image_width();
    let height = camera.image_height();
    let start = Instant::now();

    log::info!("Pass {}: rendering {}x{} at {} spp", pass, width, height, samples);

    let mut pixels = vec![[0u8; 3]; width as usize * height as usize];
    let rows_done = AtomicUsize::new(0);
    let skipped = AtomicBool::new(false);
    let report_every = (height as usize / 10).max(1);

    pixels.par_chunks_mut(width as usize).enumerate().for_each(|(j, row)| {
        if cancel.is_cancelled() {
            skipped.store(true, Ordering::Relaxed);
            return;
        }

        let mut rng = StdRng::seed_from_u64(scanline_seed(seed, pass, j));
        for (i, pixel) in row.iter_mut().enumerate() {
            let color = render_pixel(camera, world, i as u32, j as u32, samples, &mut rng);
            *pixel = color_to_rgb8(color);
        }

        let done = rows_done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % report_every == 0 || done == height as usize {
            log::debug!("Pass {}: {}/{} scanlines", pass, done, height);
        }
    });

    if skipped.load(Ordering::Relaxed) {
        log::warn!(
            "Pass {} cancelled after {}/{} scanlines",
            pass,
            rows_done.load(Ordering::Relaxed),
            height
        );
        return PassOutcome::Cancelled;
    }

    log::info!("Pass {} done in {:.2?}", pass, start.elapsed());
    PassOutcome::Completed(pixels)
}
