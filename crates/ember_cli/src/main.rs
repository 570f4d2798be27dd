use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use ember_renderer::{RenderConfig, RenderSession};
use rand::rngs::StdRng;
use rand::SeedableRng;

mod cli;
mod scenes;
mod settings;

use cli::Args;
use settings::SceneSettings;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .format_timestamp_millis()
        .init();

    log::info!("ember v{}", env!("CARGO_PKG_VERSION"));

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let start = Instant::now();
    let scene = scenes::build(args.scene, &mut rng, &args.earth_texture)
        .with_context(|| format!("building scene {:?}", args.scene))?;
    log::info!("Scene built in {:.2?}", start.elapsed());

    let mut camera = scene.camera;
    if let Some(path) = &args.settings {
        camera = SceneSettings::load(path)?.apply(camera);
    }
    if let Some(width) = args.width {
        let aspect_ratio = camera.aspect_ratio();
        camera = camera.with_image(aspect_ratio, width);
    }
    if args.samples.is_some() || args.depth.is_some() {
        let samples = args.samples.unwrap_or(camera.samples_per_pixel());
        let depth = args.depth.unwrap_or(camera.max_depth());
        camera = camera.with_quality(samples, depth);
    }

    let config = RenderConfig {
        seed: args.seed,
        threads: args.threads,
        ..RenderConfig::default()
    };
    let samples = camera.samples_per_pixel();

    let mut session = RenderSession::new(camera, config).with_output(&args.output);
    session.initialize()?;
    log::info!(
        "Rendering {}x{}, {} spp x {} pass(es), max depth {}",
        session.camera().image_width(),
        session.camera().image_height(),
        samples,
        args.passes,
        session.camera().max_depth()
    );

    if let Some(path) = &args.resume {
        session.resume_from(path, args.resume_samples)?;
    }

    let start = Instant::now();
    if args.passes > 1 {
        let done = session.render_progressive(scene.world.as_ref(), args.passes, samples)?;
        session.finalize().context("writing final image")?;
        log::info!("Completed {} of {} passes", done, args.passes);
    } else {
        session.render(scene.world.as_ref()).context("rendering")?;
    }

    log::info!("Render finished in {:.2?}", start.elapsed());
    Ok(())
}
