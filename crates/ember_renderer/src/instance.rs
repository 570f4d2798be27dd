//! Transform wrappers that place a shared object in the world.
//!
//! Each wrapper moves the incoming ray into the wrapped object's local
//! frame, delegates the hit test, then moves the hit point and normal back
//! out. Bounding boxes are computed once at construction.

use std::sync::Arc;

use crate::{HitRecord, Hittable, Ray};
use ember_math::{degrees_to_radians, Aabb, Interval, Quat, QuatExt, Vec3};

/// An object shifted by a fixed offset.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
    bbox: Aabb,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        let bbox = object.bounding_box() + offset;
        Self { object, offset, bbox }
    }
}

impl Hittable for Translate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let local_ray = Ray::new(ray.origin() - self.offset, ray.direction(), ray.time()).with_sample(ray.sample());

        if !self.object.hit(&local_ray, ray_t, rec) {
            return false;
        }

        rec.p += self.offset;
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

/// An object rotated about an axis through the origin.
pub struct Rotate {
    object: Arc<dyn Hittable>,
    /// Object-to-world rotation
    rotation: Quat,
    inverse: Quat,
    bbox: Aabb,
}

impl Rotate {
    /// Rotate `object` by `degrees` about `axis` (right-handed).
    pub fn new(object: Arc<dyn Hittable>, axis: Vec3, degrees: f32) -> Self {
        let rotation = Quat::from_axis_angle(axis.normalize(), degrees_to_radians(degrees));
        let bbox = rotation.rotate_aabb(&object.bounding_box());

        Self {
            object,
            rotation,
            inverse: rotation.inverse(),
            bbox,
        }
    }

    /// Rotate `object` by `degrees` about the +Y axis.
    pub fn y(object: Arc<dyn Hittable>, degrees: f32) -> Self {
        Self::new(object, Vec3::Y, degrees)
    }
}

impl Hittable for Rotate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        // World space -> object space
        let origin = self.inverse * ray.origin();
        let direction = self.inverse * ray.direction();
        let local_ray = Ray::new(origin, direction, ray.time()).with_sample(ray.sample());

        if !self.object.hit(&local_ray, ray_t, rec) {
            return false;
        }

        // Object space -> world space
        rec.p = self.rotation * rec.p;
        rec.normal = self.rotation * rec.normal;
        true
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
