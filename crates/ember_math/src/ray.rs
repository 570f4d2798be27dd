use crate::Vec3;

/// A ray in 3D space with origin, unit direction, and time.
///
/// The direction is normalized on construction, so the parameter `t` in
/// [`Ray::at`] is a true distance. `time` is the shutter instant used for
/// motion blur.
///
/// `sample` is a uniform value in [0, 1) drawn from the renderer's generator
/// when the ray is spawned. Hit tests that are themselves random (volumes)
/// consume it, so they stay reproducible under a fixed seed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    origin: Vec3,
    direction: Vec3,
    time: f32,
    sample: f32,
}

impl Ray {
    /// Create a new ray. `direction` must be non-zero.
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            time,
            sample: 0.5,
        }
    }

    /// Attach a uniform sample in [0, 1).
    #[inline]
    pub fn with_sample(mut self, sample: f32) -> Self {
        self.sample = sample;
        self
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the unit direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the time value of the ray (used for motion blur).
    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// The uniform sample carried by this ray; 0.5 unless set.
    #[inline]
    pub fn sample(&self) -> f32 {
        self.sample
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
            time: 0.0,
            sample: 0.5,
        }
    }
}
