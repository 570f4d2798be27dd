//! Built-in demo scenes.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use ember_math::{Point3, Vec3};
use ember_renderer::{
    make_box, Background, BvhNode, Camera, CheckerTexture, Color, ConstantMedium, Dielectric, DiffuseLight, Hittable,
    HittableList, ImageTexture, Lambertian, Material, Metal, NoiseTexture, Quad, Rotate, Sphere, Texture, Translate,
};
use rand::rngs::StdRng;
use rand::Rng;

use crate::cli::SceneKind;

/// A world to render and the camera that frames it.
pub struct Scene {
    pub world: Arc<dyn Hittable>,
    pub camera: Camera,
}

pub fn build(kind: SceneKind, rng: &mut StdRng, earth_texture: &Path) -> Result<Scene> {
    log::info!("Building scene {:?}", kind);
    match kind {
        SceneKind::Sample => sample(),
        SceneKind::Spheres => spheres(rng),
        SceneKind::CheckeredSpheres => checkered_spheres(),
        SceneKind::Earth => earth(earth_texture),
        SceneKind::PerlinSpheres => perlin_spheres(rng),
        SceneKind::Quads => quads(),
        SceneKind::SimpleLight => simple_light(rng),
        SceneKind::CornellBox => cornell_box(rng),
        SceneKind::CornellSmoke => cornell_smoke(),
        SceneKind::Final => final_scene(rng, earth_texture),
    }
}

fn lambertian(r: f32, g: f32, b: f32) -> Arc<dyn Material> {
    Arc::new(Lambertian::new(Color::new(r, g, b)))
}

fn random_color(rng: &mut StdRng, min: f32, max: f32) -> Color {
    Color::new(rng.gen_range(min..max), rng.gen_range(min..max), rng.gen_range(min..max))
}

fn black() -> Background {
    Background::solid(Color::ZERO)
}

fn sample() -> Result<Scene> {
    let ground = lambertian(0.8, 0.8, 0.0);
    let center = lambertian(0.7, 0.3, 0.3);
    let left = lambertian(0.9, 0.9, 0.9);
    let right: Arc<dyn Material> = Arc::new(Metal::new(Color::new(0.95, 0.95, 0.95), 0.0));
    let behind = lambertian(0.4, 0.9, 0.4);
    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));

    let mut world = HittableList::new();
    world.add(Arc::new(Sphere::new(Point3::new(0.0, -100.5, -1.0), 100.0, ground)));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, 0.5, -1.0), 0.3, center)));
    world.add(Arc::new(Sphere::new(Point3::new(-0.6, 0.0, -1.0), 0.5, left)));
    world.add(Arc::new(Sphere::new(Point3::new(0.6, 0.0, -1.0), 0.5, right)));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, -0.3, -1.5), 0.2, behind)));

    // Glass ball with three bubbles: negative radius flips the normal inward
    world.add(Arc::new(Sphere::new(Point3::new(-0.05, 0.0, -0.3), 0.15, Arc::clone(&glass))));
    for center in [
        Point3::new(-0.04, 0.02, -0.3),
        Point3::new(-0.07, -0.04, -0.26),
        Point3::new(0.04, -0.04, -0.33),
    ] {
        world.add(Arc::new(Sphere::new(center, -0.01, Arc::clone(&glass))));
    }

    let camera = Camera::new()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Point3::new(-2.0, 2.0, 1.0), Point3::new(0.0, 0.0, -1.0), Vec3::Y);

    // Wide aperture, focused on whatever sits at the image center
    let focus = camera.focus_distance(&world).unwrap_or(10.0);
    log::debug!("Sample scene focused at {:.3}", focus);
    let camera = camera.with_lens(40.0, 10.0, focus);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}

fn spheres(rng: &mut StdRng) -> Result<Scene> {
    let mut world = HittableList::new();

    let checker: Arc<dyn Texture> = Arc::new(CheckerTexture::from_colors(
        0.32,
        Color::new(0.2, 0.3, 0.1),
        Color::new(0.9, 0.9, 0.9),
    ));
    world.add(Arc::new(Sphere::new(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::textured(checker)),
    )));

    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));

    for a in -11..11 {
        for b in -11..11 {
            let choose_mat: f32 = rng.gen();
            let center = Point3::new(a as f32 + 0.9 * rng.gen::<f32>(), 0.2, b as f32 + 0.9 * rng.gen::<f32>());

            if (center - Point3::new(4.0, 0.2, 0.0)).length() <= 0.9 {
                continue;
            }

            if choose_mat < 0.8 {
                // Diffuse, bouncing during the exposure
                let albedo = random_color(rng, 0.0, 1.0) * random_color(rng, 0.0, 1.0);
                let center1 = center + Vec3::new(0.0, rng.gen_range(0.0..0.5), 0.0);
                world.add(Arc::new(Sphere::moving(
                    center,
                    center1,
                    0.2,
                    Arc::new(Lambertian::new(albedo)),
                )));
            } else if choose_mat < 0.95 {
                let albedo = random_color(rng, 0.5, 1.0);
                let fuzz = rng.gen_range(0.0..0.5);
                world.add(Arc::new(Sphere::new(center, 0.2, Arc::new(Metal::new(albedo, fuzz)))));
            } else {
                world.add(Arc::new(Sphere::new(center, 0.2, Arc::clone(&glass))));
            }
        }
    }

    world.add(Arc::new(Sphere::new(Point3::new(0.0, 1.0, 0.0), 1.0, glass)));
    world.add(Arc::new(Sphere::new(Point3::new(-4.0, 1.0, 0.0), 1.0, lambertian(0.4, 0.2, 0.1))));
    world.add(Arc::new(Sphere::new(
        Point3::new(4.0, 1.0, 0.0),
        1.0,
        Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0)),
    )));

    let world = world.into_bvh(rng)?;

    let camera = Camera::new()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0)
        .with_exposure(1.0);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}

fn checkered_spheres() -> Result<Scene> {
    let checker: Arc<dyn Texture> = Arc::new(CheckerTexture::from_colors(
        0.8,
        Color::new(0.2, 0.3, 0.1),
        Color::new(0.9, 0.9, 0.9),
    ));
    let surface: Arc<dyn Material> = Arc::new(Lambertian::textured(checker));

    let mut world = HittableList::new();
    world.add(Arc::new(Sphere::new(Point3::new(0.0, -10.0, 0.0), 10.0, Arc::clone(&surface))));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, 10.0, 0.0), 10.0, surface)));

    let camera = Camera::new()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}

fn earth(texture: &Path) -> Result<Scene> {
    let earth_texture: Arc<dyn Texture> = Arc::new(ImageTexture::open_or_debug(texture));
    let globe = Sphere::new(Point3::ZERO, 2.0, Arc::new(Lambertian::textured(earth_texture)));

    let camera = Camera::new()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Point3::new(0.0, 0.0, 12.0), Point3::ZERO, Vec3::Y)
        .with_lens(30.0, 0.0, 10.0);

    Ok(Scene {
        world: Arc::new(globe),
        camera,
    })
}

fn marble_ground_and_ball(world: &mut HittableList, rng: &mut StdRng) {
    let pertext: Arc<dyn Texture> = Arc::new(NoiseTexture::new(4.0, rng));
    let marble: Arc<dyn Material> = Arc::new(Lambertian::textured(pertext));

    world.add(Arc::new(Sphere::new(
        Point3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::clone(&marble),
    )));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, 2.0, 0.0), 2.0, marble)));
}

fn perlin_spheres(rng: &mut StdRng) -> Result<Scene> {
    let mut world = HittableList::new();
    marble_ground_and_ball(&mut world, rng);

    let camera = Camera::new()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Point3::new(13.0, 2.0, 3.0), Point3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.0, 10.0);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}

fn quads() -> Result<Scene> {
    let mut world = HittableList::new();

    let faces = [
        (Point3::new(-3.0, -2.0, 5.0), Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 4.0, 0.0), lambertian(1.0, 0.2, 0.2)),
        (Point3::new(-2.0, -2.0, 0.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0), lambertian(0.2, 1.0, 0.2)),
        (Point3::new(3.0, -2.0, 1.0), Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 4.0, 0.0), lambertian(0.2, 0.2, 1.0)),
        (Point3::new(-2.0, 3.0, 1.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0), lambertian(1.0, 0.5, 0.0)),
        (Point3::new(-2.0, -3.0, 5.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -4.0), lambertian(0.2, 0.8, 0.8)),
    ];
    for (q, u, v, mat) in faces {
        world.add(Arc::new(Quad::new(q, u, v, mat)));
    }

    let camera = Camera::new()
        .with_image(1.0, 400)
        .with_quality(100, 50)
        .with_position(Point3::new(0.0, 0.0, 9.0), Point3::ZERO, Vec3::Y)
        .with_lens(80.0, 0.0, 10.0);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}

fn simple_light(rng: &mut StdRng) -> Result<Scene> {
    let mut world = HittableList::new();
    marble_ground_and_ball(&mut world, rng);

    // Brighter than 1 so it lights its surroundings
    let difflight: Arc<dyn Material> = Arc::new(DiffuseLight::new(Color::new(4.0, 4.0, 4.0)));
    world.add(Arc::new(Quad::new(
        Point3::new(3.0, 1.0, -2.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
        Arc::clone(&difflight),
    )));
    world.add(Arc::new(Sphere::new(Point3::new(0.0, 7.0, 0.0), 2.0, difflight)));

    let camera = Camera::new()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_background(black())
        .with_position(Point3::new(26.0, 3.0, 6.0), Point3::new(0.0, 2.0, 0.0), Vec3::Y)
        .with_lens(20.0, 0.0, 10.0);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}

/// The five walls of the Cornell box plus a ceiling light.
fn cornell_walls(light: Quad, white: &Arc<dyn Material>) -> HittableList {
    let red = lambertian(0.65, 0.05, 0.05);
    let green = lambertian(0.12, 0.45, 0.15);

    let mut world = HittableList::new();
    world.add(Arc::new(Quad::new(
        Point3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    )));
    world.add(Arc::new(Quad::new(
        Point3::ZERO,
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        red,
    )));
    world.add(Arc::new(light));
    world.add(Arc::new(Quad::new(
        Point3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        Arc::clone(white),
    )));
    world.add(Arc::new(Quad::new(
        Point3::new(555.0, 555.0, 555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        Arc::clone(white),
    )));
    world.add(Arc::new(Quad::new(
        Point3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Arc::clone(white),
    )));
    world
}

/// The tall and short blocks, rotated and placed inside the box.
fn cornell_blocks(white: &Arc<dyn Material>) -> [Arc<dyn Hittable>; 2] {
    let tall: Arc<dyn Hittable> = Arc::new(make_box(Point3::ZERO, Point3::new(165.0, 330.0, 165.0), Arc::clone(white)));
    let tall: Arc<dyn Hittable> = Arc::new(Rotate::y(tall, 15.0));
    let tall: Arc<dyn Hittable> = Arc::new(Translate::new(tall, Vec3::new(265.0, 0.0, 295.0)));

    let short: Arc<dyn Hittable> = Arc::new(make_box(Point3::ZERO, Point3::splat(165.0), Arc::clone(white)));
    let short: Arc<dyn Hittable> = Arc::new(Rotate::y(short, -18.0));
    let short: Arc<dyn Hittable> = Arc::new(Translate::new(short, Vec3::new(130.0, 0.0, 65.0)));

    [tall, short]
}

fn cornell_camera() -> Camera {
    Camera::new()
        .with_image(1.0, 600)
        .with_quality(200, 50)
        .with_background(black())
        .with_position(Point3::new(278.0, 278.0, -800.0), Point3::new(278.0, 278.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 10.0)
}

fn cornell_box(rng: &mut StdRng) -> Result<Scene> {
    let white = lambertian(0.73, 0.73, 0.73);
    let light = Quad::new(
        Point3::new(343.0, 554.0, 332.0),
        Vec3::new(-130.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -105.0),
        Arc::new(DiffuseLight::new(Color::splat(15.0))),
    );

    let mut world = cornell_walls(light, &white);
    for block in cornell_blocks(&white) {
        world.add(block);
    }

    let world = world.into_bvh(rng)?;

    Ok(Scene {
        world: Arc::new(world),
        camera: cornell_camera().with_quality(200, 100),
    })
}

fn cornell_smoke() -> Result<Scene> {
    let white = lambertian(0.73, 0.73, 0.73);
    let light = Quad::new(
        Point3::new(113.0, 554.0, 127.0),
        Vec3::new(330.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 305.0),
        Arc::new(DiffuseLight::new(Color::splat(7.0))),
    );

    let mut world = cornell_walls(light, &white);
    let [tall, short] = cornell_blocks(&white);
    world.add(Arc::new(ConstantMedium::from_color(tall, 0.01, Color::ZERO)));
    world.add(Arc::new(ConstantMedium::from_color(short, 0.01, Color::ONE)));

    Ok(Scene {
        world: Arc::new(world),
        camera: cornell_camera().with_quality(50, 50),
    })
}

fn final_scene(rng: &mut StdRng, earth_texture: &Path) -> Result<Scene> {
    let ground = lambertian(0.48, 0.83, 0.53);

    let mut boxes1 = HittableList::new();
    let boxes_per_side = 20;
    for i in 0..boxes_per_side {
        for j in 0..boxes_per_side {
            let w = 100.0;
            let x0 = -1000.0 + i as f32 * w;
            let z0 = -1000.0 + j as f32 * w;
            let y1 = 1.0 + ((i + j) as f32).sin() * 101.0;

            boxes1.add(Arc::new(make_box(
                Point3::new(x0, 0.0, z0),
                Point3::new(x0 + w, y1, z0 + w),
                Arc::clone(&ground),
            )));
        }
    }

    let mut world = HittableList::new();
    world.add(Arc::new(boxes1.into_bvh(rng)?));

    world.add(Arc::new(Quad::new(
        Point3::new(123.0, 554.0, 147.0),
        Vec3::new(300.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 265.0),
        Arc::new(DiffuseLight::new(Color::splat(7.0))),
    )));

    let center1 = Point3::new(400.0, 400.0, 200.0);
    let center2 = center1 + Vec3::new(30.0, 0.0, 0.0);
    world.add(Arc::new(Sphere::moving(center1, center2, 50.0, lambertian(0.7, 0.3, 0.1))));

    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
    world.add(Arc::new(Sphere::new(Point3::new(260.0, 150.0, 45.0), 50.0, Arc::clone(&glass))));
    world.add(Arc::new(Sphere::new(
        Point3::new(0.0, 150.0, 145.0),
        50.0,
        Arc::new(Metal::new(Color::new(0.8, 0.8, 0.9), 1.0)),
    )));

    // Glass ball filled with blue haze
    let boundary: Arc<dyn Hittable> = Arc::new(Sphere::new(Point3::new(360.0, 150.0, 145.0), 70.0, Arc::clone(&glass)));
    world.add(Arc::clone(&boundary));
    world.add(Arc::new(ConstantMedium::from_color(boundary, 0.2, Color::new(0.2, 0.4, 0.9))));

    // Thin mist over everything
    let boundary: Arc<dyn Hittable> = Arc::new(Sphere::new(Point3::ZERO, 5000.0, glass));
    world.add(Arc::new(ConstantMedium::from_color(boundary, 0.0001, Color::ONE)));

    let earth: Arc<dyn Texture> = Arc::new(ImageTexture::open_or_debug(earth_texture));
    world.add(Arc::new(Sphere::new(
        Point3::new(400.0, 200.0, 400.0),
        100.0,
        Arc::new(Lambertian::textured(earth)),
    )));

    let pertext: Arc<dyn Texture> = Arc::new(NoiseTexture::new(0.1, rng));
    world.add(Arc::new(Sphere::new(
        Point3::new(220.0, 280.0, 300.0),
        80.0,
        Arc::new(Lambertian::textured(pertext)),
    )));

    let white = lambertian(0.73, 0.73, 0.73);
    let cluster: Vec<Arc<dyn Hittable>> = (0..1000)
        .map(|_| {
            let center = Point3::new(
                rng.gen_range(0.0..165.0),
                rng.gen_range(0.0..165.0),
                rng.gen_range(0.0..165.0),
            );
            Arc::new(Sphere::new(center, 10.0, Arc::clone(&white))) as Arc<dyn Hittable>
        })
        .collect();
    let cluster: Arc<dyn Hittable> = Arc::new(BvhNode::new(cluster, rng)?);
    let cluster: Arc<dyn Hittable> = Arc::new(Rotate::y(cluster, 15.0));
    world.add(Arc::new(Translate::new(cluster, Vec3::new(-100.0, 270.0, 395.0))));

    let camera = Camera::new()
        .with_image(1.0, 800)
        .with_quality(50, 40)
        .with_background(black())
        .with_position(Point3::new(478.0, 278.0, -600.0), Point3::new(278.0, 278.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 10.0)
        .with_exposure(1.0);

    Ok(Scene {
        world: Arc::new(world),
        camera,
    })
}
