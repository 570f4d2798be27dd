//! Gradient (Perlin) noise for procedural textures.

use ember_math::{Point3, Vec3};
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::sampling::random_unit_vector;

const POINT_COUNT: usize = 256;

/// Lattice of random unit gradients addressed through three permutations.
pub struct Perlin {
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    pub fn new(rng: &mut dyn RngCore) -> Self {
        let gradients = (0..POINT_COUNT).map(|_| random_unit_vector(rng)).collect();

        Self {
            gradients,
            perm_x: permutation(rng),
            perm_y: permutation(rng),
            perm_z: permutation(rng),
        }
    }

    /// Smooth noise in roughly [-1, 1].
    pub fn noise(&self, p: Point3) -> f32 {
        let floor = p.floor();
        let frac = p - floor;
        let (i, j, k) = (floor.x as i32, floor.y as i32, floor.z as i32);

        let mut corners = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in corners.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, corner) in row.iter_mut().enumerate() {
                    // Casts saturate far from the origin; only the low bits matter
                    let index = self.perm_x[wrap(i.wrapping_add(di as i32))]
                        ^ self.perm_y[wrap(j.wrapping_add(dj as i32))]
                        ^ self.perm_z[wrap(k.wrapping_add(dk as i32))];
                    *corner = self.gradients[index];
                }
            }
        }

        trilinear(&corners, frac)
    }

    /// Sum of `depth` octaves of absolute noise.
    pub fn turbulence(&self, p: Point3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp_p = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp_p);
            weight *= 0.5;
            temp_p *= 2.0;
        }

        accum.abs()
    }
}

#[inline]
fn wrap(i: i32) -> usize {
    (i & (POINT_COUNT as i32 - 1)) as usize
}

fn permutation(rng: &mut dyn RngCore) -> Vec<usize> {
    let mut p: Vec<usize> = (0..POINT_COUNT).collect();
    p.shuffle(rng);
    p
}

/// Hermite-smoothed trilinear blend of the gradient dot products.
fn trilinear(c: &[[[Vec3; 2]; 2]; 2], frac: Vec3) -> f32 {
    let smooth = frac * frac * (Vec3::splat(3.0) - 2.0 * frac);
    let mut accum = 0.0;

    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight = Vec3::new(frac.x - fi, frac.y - fj, frac.z - fk);
                accum += (fi * smooth.x + (1.0 - fi) * (1.0 - smooth.x))
                    * (fj * smooth.y + (1.0 - fj) * (1.0 - smooth.y))
                    * (fk * smooth.z + (1.0 - fk) * (1.0 - smooth.z))
                    * gradient.dot(weight);
            }
        }
    }

    accum
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_noise_is_zero_on_lattice_points() {
        let mut rng = StdRng::seed_from_u64(11);
        let perlin = Perlin::new(&mut rng);

        // Gradient noise vanishes at integer coordinates
        for p in [Vec3::ZERO, Vec3::new(3.0, -2.0, 7.0), Vec3::new(-5.0, 1.0, 0.0)] {
            assert!(perlin.noise(p).abs() < 1e-6);
        }
    }

    #[test]
    fn test_noise_is_bounded_and_deterministic() {
        let mut rng = StdRng::seed_from_u64(12);
        let perlin = Perlin::new(&mut rng);

        for i in 0..500 {
            let p = Vec3::new(i as f32 * 0.137, i as f32 * -0.071, i as f32 * 0.033);
            let n = perlin.noise(p);
            assert!(n.abs() <= 1.5, "noise {} out of range", n);
            assert_eq!(n, perlin.noise(p));
        }
    }

    #[test]
    fn test_noise_far_from_origin_does_not_overflow() {
        let mut rng = StdRng::seed_from_u64(4);
        let perlin = Perlin::new(&mut rng);

        for p in [Vec3::splat(1e12), Vec3::splat(-1e12), Vec3::new(3.0e9, -3.0e9, 0.25)] {
            let n = perlin.noise(p);
            assert!(n.is_finite() && n.abs() <= 1.0, "noise({:?}) = {}", p, n);
        }
    }

    #[test]
    fn test_turbulence_is_non_negative() {
        let mut rng = StdRng::seed_from_u64(13);
        let perlin = Perlin::new(&mut rng);

        for i in 0..100 {
            let p = Vec3::splat(i as f32 * 0.31);
            assert!(perlin.turbulence(p, 7) >= 0.0);
        }
    }
}
