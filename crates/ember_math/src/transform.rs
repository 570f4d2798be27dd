// Rotation helpers for instancing.
//
// Extends glam::Quat with the bounding-box transform the path tracer needs.
// glam already provides mul_vec3() and inverse().

use crate::Aabb;
use glam::{Quat, Vec3};

/// Extension trait for Quat used by rotated instances.
pub trait QuatExt {
    /// Rotate an axis-aligned bounding box.
    /// Computes the bounding box of all 8 rotated corners.
    fn rotate_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl QuatExt for Quat {
    fn rotate_aabb(&self, aabb: &Aabb) -> Aabb {
        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);

        for corner in aabb.corners() {
            let rotated = self.mul_vec3(corner);
            lo = lo.min(rotated);
            hi = hi.max(rotated);
        }

        Aabb::from_points(lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_rotate_aabb_identity() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let rotated = Quat::IDENTITY.rotate_aabb(&aabb);

        assert!((rotated.min() - aabb.min()).length() < 0.001);
        assert!((rotated.max() - aabb.max()).length() < 0.001);
    }

    #[test]
    fn test_rotate_aabb_quarter_turn_about_y() {
        // Unit cube rotated 90 degrees about +Y: x' = z, z' = -x
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let rotated = Quat::from_rotation_y(PI / 2.0).rotate_aabb(&aabb);

        assert!((rotated.min() - Vec3::new(0.0, 0.0, -2.0)).length() < 0.001);
        assert!((rotated.max() - Vec3::new(1.0, 1.0, 0.0)).length() < 0.001);
    }

    #[test]
    fn test_rotate_aabb_encloses_rotated_corners() {
        let aabb = Aabb::from_points(Vec3::new(-1.0, 0.0, 2.0), Vec3::new(3.0, 4.0, 5.0));
        let q = Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 0.7);
        let rotated = q.rotate_aabb(&aabb);

        // Allow for float noise at the faces
        let grown = Aabb::new(
            rotated.x.expand(1e-4),
            rotated.y.expand(1e-4),
            rotated.z.expand(1e-4),
        );
        for corner in aabb.corners() {
            assert!(grown.contains_point(q.mul_vec3(corner)));
        }
    }
}
