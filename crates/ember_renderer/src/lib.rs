//! Ember renderer - CPU Monte Carlo path tracing
//!
//! Spheres, quads and volumes behind a shared hit protocol, a randomized
//! BVH, texture-driven materials, and a camera that renders scanline-parallel
//! passes into a resumable accumulation buffer.

mod accumulator;
mod bvh;
mod camera;
mod constant_medium;
mod error;
mod hittable;
mod instance;
mod material;
mod perlin;
pub mod ppm;
mod quad;
mod renderer;
pub mod sampling;
mod session;
mod sphere;
pub mod texture;

pub use accumulator::AccumulationBuffer;
pub use bvh::BvhNode;
pub use camera::Camera;
pub use constant_medium::ConstantMedium;
pub use error::{RenderError, Result};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use instance::{Rotate, Translate};
pub use material::{Color, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal, ScatterRecord};
pub use perlin::Perlin;
pub use quad::{make_box, Quad};
pub use renderer::{
    color_to_rgb8, linear_to_gamma, ray_color, render_pass, render_pixel, Background, CancelToken, PassOutcome,
    RenderConfig,
};
pub use session::{RenderSession, SessionState};
pub use sphere::Sphere;
pub use texture::{CheckerTexture, ImageTexture, NoiseTexture, SolidColor, Texture, TextureError};

/// Re-export Vec3 and common math types from ember_math
pub use ember_math::{Aabb, Interval, Point3, Ray, Vec3};
