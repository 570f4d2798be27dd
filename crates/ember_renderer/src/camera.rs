//! Camera for ray generation.

use crate::renderer::Background;
use crate::sampling::{gen_f32, random_in_unit_disk};
use crate::{HitRecord, Hittable, Ray};
use ember_math::{near_zero, Interval, Point3, Vec3};
use rand::RngCore;

/// Camera for generating rays into the scene.
///
/// Configure with the `with_*` builders, then call [`Camera::initialize`]
/// before generating rays. Changing any setting clears the derived state.
#[derive(Clone)]
pub struct Camera {
    // Image settings
    aspect_ratio: f32,
    image_width: u32,
    samples_per_pixel: u32,
    max_depth: u32,

    // Camera positioning
    look_from: Point3,
    look_at: Point3,
    vup: Vec3,

    // Lens settings
    vfov: f32,          // Vertical field of view in degrees
    defocus_angle: f32, // Variation angle of rays through each pixel
    focus_dist: f32,    // Distance from camera to plane of perfect focus

    /// Shutter stays open over [0, exposure_time]
    exposure_time: f32,

    background: Background,

    // Cached computed values (set by initialize())
    initialized: bool,
    center: Point3,
    pixel00_loc: Point3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            aspect_ratio: 16.0 / 9.0,
            image_width: 400,
            samples_per_pixel: 10,
            max_depth: 50,
            look_from: Point3::ZERO,
            look_at: Point3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            exposure_time: 0.0,
            background: Background::sky(),
            initialized: false,
            center: Point3::ZERO,
            pixel00_loc: Point3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
            defocus_disk_u: Vec3::ZERO,
            defocus_disk_v: Vec3::ZERO,
        }
    }

    /// Set aspect ratio and image width; the height is derived.
    pub fn with_image(mut self, aspect_ratio: f32, width: u32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.image_width = width.max(1);
        self.initialized = false;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples.max(1);
        self.max_depth = max_depth;
        self.initialized = false;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Point3, look_at: Point3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self.initialized = false;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self.initialized = false;
        self
    }

    /// Set how long the shutter stays open, for motion blur.
    pub fn with_exposure(mut self, exposure_time: f32) -> Self {
        self.exposure_time = exposure_time.max(0.0);
        self
    }

    /// Set the color seen by rays that escape the scene.
    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    /// Image height derived from width and aspect ratio, at least 1.
    pub fn image_height(&self) -> u32 {
        ((self.image_width as f32 / self.aspect_ratio) as u32).max(1)
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// (look_from, look_at, vup)
    pub fn position(&self) -> (Point3, Point3, Vec3) {
        (self.look_from, self.look_at, self.vup)
    }

    /// (vfov, defocus_angle, focus_dist)
    pub fn lens(&self) -> (f32, f32, f32) {
        (self.vfov, self.defocus_angle, self.focus_dist)
    }

    pub fn exposure_time(&self) -> f32 {
        self.exposure_time
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Distance from `look_from` to the first surface of `world` along the
    /// view axis, i.e. what the center of the image sees.
    ///
    /// Feed it back through [`with_lens`](Self::with_lens) to focus on that
    /// surface. `None` if the axis hits nothing or `look_from == look_at`.
    pub fn focus_distance(&self, world: &dyn Hittable) -> Option<f32> {
        let axis = self.look_at - self.look_from;
        if near_zero(axis) {
            return None;
        }

        let ray = Ray::new(self.look_from, axis, 0.0);
        let mut rec = HitRecord::default();
        if world.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec) {
            Some(rec.t)
        } else {
            None
        }
    }

    /// Derive the viewport and basis vectors. Runs once; later calls are no-ops.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        let image_height = self.image_height();
        self.center = self.look_from;

        // Calculate viewport dimensions
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / image_height as f32);

        // Calculate camera basis vectors
        self.w = (self.look_from - self.look_at).normalize();
        self.u = self.vup.cross(self.w).normalize();
        self.v = self.w.cross(self.u);

        // Calculate viewport vectors
        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        // Calculate pixel delta vectors
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left = self.center - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);

        // Calculate defocus disk basis vectors
        let defocus_radius = self.focus_dist * (self.defocus_angle / 2.0).to_radians().tan();
        self.defocus_disk_u = self.u * defocus_radius;
        self.defocus_disk_v = self.v * defocus_radius;

        self.initialized = true;
        log::debug!(
            "Camera initialized: {}x{}, vfov {}, focus {}",
            self.image_width,
            image_height,
            self.vfov,
            self.focus_dist
        );
    }

    /// Generate a ray for pixel (i, j), jittered uniformly over the pixel.
    pub fn get_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset = Vec3::new(gen_f32(rng) - 0.5, gen_f32(rng) - 0.5, 0.0);
        self.ray_through(i, j, offset, rng)
    }

    /// Generate a ray for pixel (i, j), jittered inside sub-cell
    /// (`s_i`, `s_j`) of a `strata` x `strata` grid over the pixel.
    pub fn get_ray_stratified(&self, i: u32, j: u32, s_i: u32, s_j: u32, strata: u32, rng: &mut dyn RngCore) -> Ray {
        let recip = 1.0 / strata as f32;
        let offset = Vec3::new(
            (s_i as f32 + gen_f32(rng)) * recip - 0.5,
            (s_j as f32 + gen_f32(rng)) * recip - 0.5,
            0.0,
        );
        self.ray_through(i, j, offset, rng)
    }

    fn ray_through(&self, i: u32, j: u32, offset: Vec3, rng: &mut dyn RngCore) -> Ray {
        debug_assert!(self.initialized, "Camera::initialize must run before generating rays");

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample(rng)
        };

        let ray_direction = pixel_sample - ray_origin;
        let ray_time = self.exposure_time * gen_f32(rng);

        Ray::new(ray_origin, ray_direction, ray_time).with_sample(gen_f32(rng))
    }

    /// Sample a point on the defocus disk.
    fn defocus_disk_sample(&self, rng: &mut dyn RngCore) -> Point3 {
        let p = random_in_unit_disk(rng);
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
