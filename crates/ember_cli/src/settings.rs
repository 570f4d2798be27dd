//! Camera overrides loaded from a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use ember_math::Vec3;
use ember_renderer::{Background, Camera, Color};
use serde::Deserialize;

/// Every field is optional; missing fields keep the scene's value.
///
/// ```json
/// { "width": 800, "samples_per_pixel": 200, "look_from": [13, 2, 3], "background": [0, 0, 0] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneSettings {
    pub aspect_ratio: Option<f32>,
    pub width: Option<u32>,
    pub samples_per_pixel: Option<u32>,
    pub max_depth: Option<u32>,
    pub vfov: Option<f32>,
    pub look_from: Option<[f32; 3]>,
    pub look_at: Option<[f32; 3]>,
    pub vup: Option<[f32; 3]>,
    pub defocus_angle: Option<f32>,
    pub focus_dist: Option<f32>,
    pub exposure_time: Option<f32>,
    /// Solid background color replacing the scene's
    pub background: Option<[f32; 3]>,
}

impl SceneSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading settings {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing settings {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Overlay these settings on a scene's camera.
    pub fn apply(&self, camera: Camera) -> Camera {
        let aspect = self.aspect_ratio.unwrap_or(camera.aspect_ratio());
        let width = self.width.unwrap_or(camera.image_width());
        let samples = self.samples_per_pixel.unwrap_or(camera.samples_per_pixel());
        let depth = self.max_depth.unwrap_or(camera.max_depth());

        let (from, at, vup) = camera.position();
        let (vfov, defocus, focus) = camera.lens();
        let exposure = self.exposure_time.unwrap_or(camera.exposure_time());

        let camera = camera
            .with_image(aspect, width)
            .with_quality(samples, depth)
            .with_position(
                self.look_from.map(Vec3::from_array).unwrap_or(from),
                self.look_at.map(Vec3::from_array).unwrap_or(at),
                self.vup.map(Vec3::from_array).unwrap_or(vup),
            )
            .with_lens(
                self.vfov.unwrap_or(vfov),
                self.defocus_angle.unwrap_or(defocus),
                self.focus_dist.unwrap_or(focus),
            )
            .with_exposure(exposure);

        match self.background {
            Some(rgb) => camera.with_background(Background::solid(Color::from_array(rgb))),
            None => camera,
        }
    }
}
