//! Constant-density participating medium (fog, smoke).

use std::sync::Arc;

use crate::texture::Texture;
use crate::{Color, HitRecord, Hittable, Isotropic, Ray};
use ember_math::{Aabb, Interval, Vec3};

/// A volume of uniform density filling the inside of a boundary object.
///
/// The boundary must be closed (sphere, box) for entry and exit to pair up.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase_function: Isotropic,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, texture: Arc<dyn Texture>) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::textured(texture),
        }
    }

    pub fn from_color(boundary: Arc<dyn Hittable>, density: f32, albedo: Color) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Isotropic::new(albedo),
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        let mut rec1 = HitRecord::default();
        let mut rec2 = HitRecord::default();

        // Entry, anywhere along the line
        if !self.boundary.hit(ray, Interval::UNIVERSE, &mut rec1) {
            return false;
        }

        // Exit, just past the entry surface
        if !self.boundary.hit(ray, Interval::new(rec1.t + 0.0001, f32::INFINITY), &mut rec2) {
            return false;
        }

        let mut t_enter = rec1.t.max(ray_t.min);
        let t_exit = rec2.t.min(ray_t.max);

        if t_enter >= t_exit {
            return false;
        }

        if t_enter < 0.0 {
            t_enter = 0.0;
        }

        // Direction is unit length, so t is distance
        let distance_inside_boundary = t_exit - t_enter;

        // The ray's own sample keeps seeded renders reproducible; 1 - U is in (0, 1]
        let hit_distance = self.neg_inv_density * (1.0 - ray.sample()).ln();

        if hit_distance > distance_inside_boundary {
            return false;
        }

        rec.t = t_enter + hit_distance;
        rec.p = ray.at(rec.t);

        // Arbitrary
        rec.normal = Vec3::X;
        rec.front_face = true;
        rec.material = &self.phase_function;

        true
    }

    fn bounding_box(&self) -> Aabb {
        self.boundary.bounding_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Lambertian, Sphere};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_sphere_boundary() -> Arc<dyn Hittable> {
        Arc::new(Sphere::new(Vec3::ZERO, 1.0, Arc::new(Lambertian::new(Color::ONE))))
    }

    #[test]
    fn test_missing_boundary_never_hits() {
        let fog = ConstantMedium::from_color(unit_sphere_boundary(), 10.0, Color::ONE);
        let ray = Ray::new(Vec3::new(0.0, 5.0, 5.0), -Vec3::Z, 0.0);
        let mut rec = HitRecord::default();
        for _ in 0..100 {
            assert!(!fog.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        }
    }

    #[test]
    fn test_hits_stay_inside_boundary() {
        let fog = ConstantMedium::from_color(unit_sphere_boundary(), 0.5, Color::ONE);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0);
        let mut rec = HitRecord::default();
        let mut rng = StdRng::seed_from_u64(9);

        let mut hits = 0;
        for _ in 0..2000 {
            let ray = ray.with_sample(rng.gen());
            if fog.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec) {
                hits += 1;
                assert!(rec.t >= 4.0 - 1e-4 && rec.t <= 6.0 + 1e-4, "t = {}", rec.t);
                assert!(rec.front_face);
            }
        }
        // P(scatter within 2 units) = 1 - e^-1, roughly 63%
        assert!(hits > 1000 && hits < 1500, "hits = {}", hits);
    }

    #[test]
    fn test_dense_medium_scatters_near_entry() {
        let fog = ConstantMedium::from_color(unit_sphere_boundary(), 1000.0, Color::ONE);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0);
        let mut rec = HitRecord::default();
        let mut rng = StdRng::seed_from_u64(10);

        for _ in 0..100 {
            let ray = ray.with_sample(rng.gen());
            assert!(fog.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
            assert!(rec.t < 4.1);
        }
    }

    #[test]
    fn test_free_flight_comes_from_ray_sample() {
        let fog = ConstantMedium::from_color(unit_sphere_boundary(), 0.5, Color::ONE);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0).with_sample(0.5);
        let mut rec = HitRecord::default();

        // -ln(0.5) / 0.5 = 2 ln 2 past the entry at t = 4
        assert!(fog.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        let first = rec.t;
        assert!((first - (4.0 + 2.0 * std::f32::consts::LN_2)).abs() < 1e-3, "t = {}", first);

        // Same ray, same answer
        assert!(fog.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert_eq!(rec.t, first);

        // A sample this close to 1 flies straight through
        let through = ray.with_sample(0.99);
        assert!(!fog.hit(&through, Interval::new(0.001, f32::INFINITY), &mut rec));
    }

    #[test]
    fn test_interval_before_medium_misses() {
        let fog = ConstantMedium::from_color(unit_sphere_boundary(), 1000.0, Color::ONE);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, 0.0);
        let mut rec = HitRecord::default();

        // The caller already found something closer than the medium
        assert!(!fog.hit(&ray, Interval::new(0.001, 3.0), &mut rec));
    }

    #[test]
    fn test_ray_starting_inside_medium() {
        let fog = ConstantMedium::from_color(unit_sphere_boundary(), 1000.0, Color::ONE);
        let ray = Ray::new(Vec3::ZERO, Vec3::X, 0.0);
        let mut rec = HitRecord::default();

        assert!(fog.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!(rec.t >= 0.0 && rec.t < 0.1);
    }
}
