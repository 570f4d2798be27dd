//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree where every node owns two children and the box around
//! both. Children are shared handles, so a single-object span can alias the
//! same leaf on both sides instead of allocating an extra node.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::{HitRecord, Hittable, Ray, RenderError, Result};
use ember_math::{Aabb, Interval};
use rand::{Rng, RngCore};

/// Internal BVH node.
pub struct BvhNode {
    left: Arc<dyn Hittable>,
    right: Arc<dyn Hittable>,
    bbox: Aabb,
    depth: usize,
}

impl BvhNode {
    /// Create a BVH from a list of hittable objects.
    ///
    /// The split axis of each node is drawn from `rng`, so a seeded
    /// generator gives a reproducible tree.
    pub fn new(objects: Vec<Arc<dyn Hittable>>, rng: &mut dyn RngCore) -> Result<Self> {
        if objects.is_empty() {
            log::warn!("Refusing to build a BVH over zero objects");
            return Err(RenderError::EmptyScene);
        }

        let count = objects.len();
        let node = Self::build(objects, rng);
        log::debug!("Built BVH over {} objects (depth {})", count, node.depth);
        Ok(node)
    }

    /// Recursive BVH construction. `objects` is never empty here.
    fn build(mut objects: Vec<Arc<dyn Hittable>>, rng: &mut dyn RngCore) -> Self {
        let axis = rng.gen_range(0..3);

        let (left, right, depth): (Arc<dyn Hittable>, Arc<dyn Hittable>, usize) = match objects.len() {
            1 => (Arc::clone(&objects[0]), Arc::clone(&objects[0]), 1),
            2 => {
                if box_compare(&objects[0], &objects[1], axis) == Ordering::Greater {
                    objects.swap(0, 1);
                }
                (Arc::clone(&objects[0]), Arc::clone(&objects[1]), 1)
            }
            n => {
                objects.sort_by(|a, b| box_compare(a, b, axis));

                let right_objects = objects.split_off(n / 2);
                let left = Self::build(objects, rng);
                let right = Self::build(right_objects, rng);
                let depth = 1 + left.depth.max(right.depth);
                (Arc::new(left), Arc::new(right), depth)
            }
        };

        let bbox = Aabb::surrounding(&left.bounding_box(), &right.bounding_box());
        Self {
            left,
            right,
            bbox,
            depth,
        }
    }

    /// Number of node levels, counting this one.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Hittable for BvhNode {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval, rec: &mut HitRecord<'a>) -> bool {
        if !self.bbox.hit(ray, ray_t) {
            return false;
        }

        let hit_left = self.left.hit(ray, ray_t, rec);

        // Only check right up to closest hit
        let right_max = if hit_left { rec.t } else { ray_t.max };
        let hit_right = self.right.hit(ray, Interval::new(ray_t.min, right_max), rec);

        hit_left || hit_right
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

/// Order two objects by the lower bound of their boxes on `axis`.
fn box_compare(a: &Arc<dyn Hittable>, b: &Arc<dyn Hittable>, axis: usize) -> Ordering {
    let a_min = a.bounding_box().axis_interval(axis).min;
    let b_min = b.bounding_box().axis_interval(axis).min;
    a_min.partial_cmp(&b_min).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HittableList, Lambertian, Material, Sphere};
    use ember_math::Vec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gray() -> Arc<dyn Material> {
        Arc::new(Lambertian::new(Vec3::splat(0.5)))
    }

    fn random_spheres(rng: &mut StdRng, n: usize) -> Vec<Arc<dyn Hittable>> {
        let mat = gray();
        (0..n)
            .map(|_| {
                let center = Vec3::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                );
                let radius = rng.gen_range(0.1..1.5);
                Arc::new(Sphere::new(center, radius, Arc::clone(&mat))) as Arc<dyn Hittable>
            })
            .collect()
    }

    #[test]
    fn test_bvh_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = BvhNode::new(vec![], &mut rng);
        assert!(matches!(result, Err(RenderError::EmptyScene)));
    }

    #[test]
    fn test_bvh_single_object_aliases_both_children() {
        let mut rng = StdRng::seed_from_u64(1);
        let sphere: Arc<dyn Hittable> = Arc::new(Sphere::new(Vec3::new(0.0, 0.0, -1.0), 0.5, gray()));

        let bvh = BvhNode::new(vec![sphere], &mut rng).unwrap();
        assert!(Arc::ptr_eq(&bvh.left, &bvh.right));
        assert_eq!(bvh.depth(), 1);

        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), 0.0);
        let mut rec = HitRecord::default();
        assert!(bvh.hit(&ray, Interval::new(0.001, f32::INFINITY), &mut rec));
        assert!((rec.t - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_bvh_two_objects_ordered_by_min_bound() {
        let mut rng = StdRng::seed_from_u64(2);
        // Offset on every axis so the order is the same whichever axis is drawn
        let near: Arc<dyn Hittable> = Arc::new(Sphere::new(Vec3::splat(-3.0), 0.5, gray()));
        let far: Arc<dyn Hittable> = Arc::new(Sphere::new(Vec3::splat(3.0), 0.5, gray()));

        let bvh = BvhNode::new(vec![Arc::clone(&far), Arc::clone(&near)], &mut rng).unwrap();
        assert!(Arc::ptr_eq(&bvh.left, &near));
        assert!(Arc::ptr_eq(&bvh.right, &far));
    }

    #[test]
    fn test_bvh_box_contains_children() {
        let mut rng = StdRng::seed_from_u64(3);
        let objects = random_spheres(&mut rng, 64);
        let boxes: Vec<Aabb> = objects.iter().map(|o| o.bounding_box()).collect();

        let bvh = BvhNode::new(objects, &mut rng).unwrap();
        for b in &boxes {
            assert!(bvh.bounding_box().contains_box(b));
        }
        assert!(bvh.depth() >= 6);
    }

    #[test]
    fn test_bvh_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(4);
        let objects = random_spheres(&mut rng, 100);

        let mut list = HittableList::new();
        for o in &objects {
            list.add(Arc::clone(o));
        }
        let bvh = BvhNode::new(objects, &mut rng).unwrap();

        let interval = Interval::new(0.001, f32::INFINITY);
        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
                rng.gen_range(-15.0..15.0),
            );
            let target = Vec3::new(
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-8.0..8.0),
                rng.gen_range(-8.0..8.0),
            );
            let ray = Ray::new(origin, target - origin, 0.0);

            let mut linear_rec = HitRecord::default();
            let mut bvh_rec = HitRecord::default();
            let linear_hit = list.hit(&ray, interval, &mut linear_rec);
            let bvh_hit = bvh.hit(&ray, interval, &mut bvh_rec);

            assert_eq!(linear_hit, bvh_hit);
            if linear_hit {
                assert!((linear_rec.t - bvh_rec.t).abs() < 1e-4);
            }
        }
    }

    #[test]
    fn test_bvh_shape_does_not_change_result() {
        let mut scene_rng = StdRng::seed_from_u64(5);
        let objects = random_spheres(&mut scene_rng, 40);

        let a = BvhNode::new(objects.clone(), &mut StdRng::seed_from_u64(100)).unwrap();
        let b = BvhNode::new(objects, &mut StdRng::seed_from_u64(200)).unwrap();

        for i in 0..100 {
            let angle = i as f32 * 0.0628;
            let ray = Ray::new(Vec3::new(0.0, 0.0, 20.0), Vec3::new(angle.sin(), angle.cos() * 0.3, -1.0), 0.0);
            let (mut ra, mut rb) = (HitRecord::default(), HitRecord::default());
            let interval = Interval::new(0.001, f32::INFINITY);
            assert_eq!(a.hit(&ray, interval, &mut ra), b.hit(&ray, interval, &mut rb));
            assert!((ra.t - rb.t).abs() < 1e-4);
        }
    }
}
