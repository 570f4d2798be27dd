//! A render from configuration to finished image.
//!
//! `RenderSession` owns the camera and accumulation buffer, drives passes
//! (optionally on a dedicated thread pool), checkpoints progress to disk
//! and can resume from an earlier checkpoint.

use std::path::{Path, PathBuf};

use crate::renderer::{render_pass, PassOutcome, RenderConfig};
use crate::{AccumulationBuffer, Camera, Hittable, RenderError, Result};

/// Lifecycle of a [`RenderSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Camera not yet initialized
    Uninitialized,
    /// Ready to render
    Initialized,
    /// At least one pass has been started
    Rendering,
    /// Output written; no further passes allowed
    Finalized,
}

pub struct RenderSession {
    camera: Camera,
    config: RenderConfig,
    buffer: AccumulationBuffer,
    output: Option<PathBuf>,
    state: SessionState,
    seed: u64,
    passes: u32,
}

impl RenderSession {
    pub fn new(camera: Camera, config: RenderConfig) -> Self {
        let buffer = AccumulationBuffer::new(camera.image_width(), camera.image_height());
        let seed = config.seed.unwrap_or_else(rand::random);

        Self {
            camera,
            config,
            buffer,
            output: None,
            state: SessionState::Uninitialized,
            seed,
            passes: 0,
        }
    }

    /// Set where checkpoints and the final image are written.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn buffer(&self) -> &AccumulationBuffer {
        &self.buffer
    }

    pub fn output(&self) -> Option<&Path> {
        self.output.as_deref()
    }

    /// Completed passes so far.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    fn ensure_not_finalized(&self) -> Result<()> {
        if self.state == SessionState::Finalized {
            return Err(RenderError::InvalidState("render session already finalized"));
        }
        Ok(())
    }

    /// Derive the camera frame. Safe to call more than once.
    pub fn initialize(&mut self) -> Result<()> {
        self.ensure_not_finalized()?;
        self.camera.initialize();
        if self.state == SessionState::Uninitialized {
            self.state = SessionState::Initialized;
        }
        Ok(())
    }

    /// Seed the buffer from a previously saved image rendered with
    /// `previous_samples` samples per pixel.
    ///
    /// Returns whether the image was loaded. A missing, malformed or
    /// wrongly sized file is logged and the current buffer is kept.
    pub fn resume_from(&mut self, path: impl AsRef<Path>, previous_samples: u32) -> Result<bool> {
        self.ensure_not_finalized()?;
        let path = path.as_ref();

        match AccumulationBuffer::load(path, self.buffer.width(), self.buffer.height(), previous_samples) {
            Ok(buffer) => {
                log::info!("Resuming from {} ({} spp already rendered)", path.display(), previous_samples);
                self.buffer = buffer;
                // New passes must not replay the samples already in the image
                self.seed = resumed_seed(self.seed, previous_samples);
                Ok(true)
            }
            Err(RenderError::DimensionMismatch {
                expected_width,
                expected_height,
                found_width,
                found_height,
            }) => {
                log::error!(
                    "Cannot resume from {}: image is {}x{}, expected {}x{}; starting fresh",
                    path.display(),
                    found_width,
                    found_height,
                    expected_width,
                    expected_height
                );
                Ok(false)
            }
            Err(e) => {
                log::warn!("Cannot resume from {}: {}; starting fresh", path.display(), e);
                Ok(false)
            }
        }
    }

    /// Render one pass of `samples` samples per pixel and merge it.
    ///
    /// A cancelled pass leaves the buffer untouched. Zero samples is an
    /// [`RenderError::InvalidState`].
    pub fn render_pass(&mut self, world: &dyn Hittable, samples: u32) -> Result<PassOutcome> {
        if samples == 0 {
            return Err(RenderError::InvalidState("render pass needs at least one sample per pixel"));
        }
        self.initialize()?;
        self.state = SessionState::Rendering;

        let pass = self.passes;
        let outcome = self.run_pass(world, samples, pass);

        if let PassOutcome::Completed(pixels) = &outcome {
            self.buffer.merge(pixels, samples)?;
            self.passes += 1;
        }

        Ok(outcome)
    }

    fn run_pass(&self, world: &dyn Hittable, samples: u32, pass: u32) -> PassOutcome {
        let cancel = &self.config.cancel;

        if let Some(threads) = self.config.threads {
            match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
                Ok(pool) => {
                    return pool.install(|| render_pass(&self.camera, world, samples, self.seed, pass, cancel));
                }
                Err(e) => log::warn!("Could not build a {}-thread pool ({}); using the global pool", threads, e),
            }
        }

        render_pass(&self.camera, world, samples, self.seed, pass, cancel)
    }

    /// Run up to `passes` passes, checkpointing the output after each one.
    ///
    /// Stops early if cancelled. Returns the number of passes completed.
    pub fn render_progressive(&mut self, world: &dyn Hittable, passes: u32, samples_per_pass: u32) -> Result<u32> {
        let mut completed = 0;

        for i in 0..passes {
            match self.render_pass(world, samples_per_pass)? {
                PassOutcome::Completed(_) => completed += 1,
                PassOutcome::Cancelled => {
                    log::info!("Progressive render stopped after {}/{} passes", i, passes);
                    break;
                }
            }

            if let Some(path) = &self.output {
                self.buffer.save(path)?;
                log::info!(
                    "Checkpoint {}/{} written to {} ({} spp total)",
                    i + 1,
                    passes,
                    path.display(),
                    self.buffer.sample_count(0, 0)
                );
            }
        }

        Ok(completed)
    }

    /// Render the camera's full sample count in one pass, then finalize.
    pub fn render(&mut self, world: &dyn Hittable) -> Result<PassOutcome> {
        let samples = self.camera.samples_per_pixel();
        let outcome = self.render_pass(world, samples)?;
        self.finalize()?;
        Ok(outcome)
    }

    /// Write the output image and close the session.
    pub fn finalize(&mut self) -> Result<()> {
        self.ensure_not_finalized()?;

        if let Some(path) = &self.output {
            self.buffer.save(path)?;
            log::info!("Wrote {}", path.display());
        }

        self.state = SessionState::Finalized;
        Ok(())
    }
}

/// Seed for a session continuing an image that already holds
/// `previous_samples` samples per pixel.
fn resumed_seed(seed: u64, previous_samples: u32) -> u64 {
    let mut z = seed ^ (u64::from(previous_samples) + 1).wrapping_mul(0xD6E8_FEB8_6659_FD93);
    z = (z ^ (z >> 32)).wrapping_mul(0xD6E8_FEB8_6659_FD93);
    z ^ (z >> 32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Background;
    use crate::{Color, HittableList, Lambertian, Sphere, Vec3};
    use std::sync::Arc;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ember_session_{}_{}.ppm", name, std::process::id()))
    }

    fn small_camera() -> Camera {
        Camera::new()
            .with_image(2.0, 8)
            .with_quality(4, 5)
            .with_background(Background::solid(Color::splat(0.25)))
    }

    fn seeded() -> RenderConfig {
        RenderConfig {
            seed: Some(7),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_state_transitions() {
        let world = HittableList::new();
        let mut session = RenderSession::new(small_camera(), seeded());
        assert_eq!(session.state(), SessionState::Uninitialized);

        session.initialize().unwrap();
        session.initialize().unwrap();
        assert_eq!(session.state(), SessionState::Initialized);

        session.render_pass(&world, 1).unwrap();
        assert_eq!(session.state(), SessionState::Rendering);
        assert_eq!(session.passes(), 1);

        session.finalize().unwrap();
        assert_eq!(session.state(), SessionState::Finalized);

        assert!(matches!(session.render_pass(&world, 1), Err(RenderError::InvalidState(_))));
        assert!(matches!(session.finalize(), Err(RenderError::InvalidState(_))));
        assert!(session.initialize().is_err());
    }

    #[test]
    fn test_render_lazily_initializes() {
        let world = HittableList::new();
        let mut session = RenderSession::new(small_camera(), seeded());

        let outcome = session.render(&world).unwrap();
        assert!(matches!(outcome, PassOutcome::Completed(_)));
        assert!(session.camera().is_initialized());
        assert_eq!(session.state(), SessionState::Finalized);

        // Solid 0.25 background encodes as 128 everywhere
        assert!(session.buffer().pixels().iter().all(|p| *p == [128, 128, 128]));
        assert_eq!(session.buffer().sample_count(3, 2), 4);
    }

    #[test]
    fn test_cancelled_pass_merges_nothing() {
        let world = HittableList::new();
        let config = seeded();
        let cancel = config.cancel.clone();
        let mut session = RenderSession::new(small_camera(), config);

        cancel.cancel();
        let outcome = session.render_pass(&world, 4).unwrap();
        assert_eq!(outcome, PassOutcome::Cancelled);
        assert_eq!(session.passes(), 0);
        assert_eq!(session.buffer().sample_count(0, 0), 0);

        assert_eq!(session.render_progressive(&world, 3, 1).unwrap(), 0);
    }

    #[test]
    fn test_progressive_checkpoints_and_accumulates() {
        let path = temp_path("progressive");
        let world = HittableList::new();
        let mut session = RenderSession::new(small_camera(), seeded()).with_output(&path);

        let done = session.render_progressive(&world, 3, 2).unwrap();
        assert_eq!(done, 3);
        assert_eq!(session.buffer().sample_count(0, 0), 6);

        // The checkpoint on disk matches the buffer
        let on_disk = AccumulationBuffer::load(&path, 8, 4, 6).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(&on_disk, session.buffer());
    }

    /// Gray diffuse ball in front of the camera; every pixel is noisy at 1 spp.
    fn noisy_world() -> HittableList {
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(
            Vec3::new(0.0, 0.0, -1.0),
            0.5,
            Arc::new(Lambertian::new(Color::splat(0.5))),
        )));
        world
    }

    fn completed(outcome: PassOutcome) -> Vec<[u8; 3]> {
        match outcome {
            PassOutcome::Completed(pixels) => pixels,
            PassOutcome::Cancelled => panic!("pass was cancelled"),
        }
    }

    #[test]
    fn test_resume_from_checkpoint() {
        let path = temp_path("resume");
        let world = HittableList::new();

        let mut first = RenderSession::new(small_camera(), seeded()).with_output(&path);
        first.render_pass(&world, 3).unwrap();
        first.finalize().unwrap();

        let mut second = RenderSession::new(small_camera(), seeded());
        assert!(second.resume_from(&path, 3).unwrap());
        std::fs::remove_file(&path).ok();

        assert_eq!(second.buffer().sample_count(0, 0), 3);
        second.render_pass(&world, 2).unwrap();
        assert_eq!(second.buffer().sample_count(0, 0), 5);
    }

    #[test]
    fn test_resumed_pass_draws_new_samples() {
        let path = temp_path("resume_fresh_samples");
        let world = noisy_world();

        let mut first = RenderSession::new(small_camera(), seeded()).with_output(&path);
        let original = completed(first.render_pass(&world, 1).unwrap());
        first.finalize().unwrap();

        // Same seed without resuming replays the first pass exactly
        let mut replay = RenderSession::new(small_camera(), seeded());
        assert_eq!(completed(replay.render_pass(&world, 1).unwrap()), original);

        let mut resumed = RenderSession::new(small_camera(), seeded());
        assert!(resumed.resume_from(&path, 1).unwrap());
        std::fs::remove_file(&path).ok();

        let continued = completed(resumed.render_pass(&world, 1).unwrap());
        assert_ne!(continued, original);
        assert_eq!(resumed.buffer().sample_count(0, 0), 2);
    }

    #[test]
    fn test_resumed_seed_depends_on_prior_samples() {
        assert_ne!(resumed_seed(7, 1), 7);
        assert_ne!(resumed_seed(7, 1), resumed_seed(7, 2));
        assert_eq!(resumed_seed(7, 64), resumed_seed(7, 64));
    }

    #[test]
    fn test_oversized_resume_header_keeps_fresh_buffer() {
        let path = temp_path("resume_oversized");
        std::fs::write(&path, "P3\n4000000000 4000000000\n255\n0 0 0\n").unwrap();

        let mut session = RenderSession::new(small_camera(), seeded());
        assert!(!session.resume_from(&path, 3).unwrap());
        std::fs::remove_file(&path).ok();

        assert_eq!(session.buffer(), &AccumulationBuffer::new(8, 4));
    }

    #[test]
    fn test_malformed_resume_body_keeps_fresh_buffer() {
        let path = temp_path("resume_truncated");
        std::fs::write(&path, "P3\n8 4\n255\n0 0 0\n1 1\n").unwrap();

        let mut session = RenderSession::new(small_camera(), seeded());
        assert!(!session.resume_from(&path, 3).unwrap());
        std::fs::remove_file(&path).ok();

        assert_eq!(session.buffer().sample_count(0, 0), 0);
    }

    #[test]
    fn test_zero_sample_pass_is_rejected() {
        let world = HittableList::new();
        let mut session = RenderSession::new(small_camera(), seeded());

        assert!(matches!(session.render_pass(&world, 0), Err(RenderError::InvalidState(_))));
        assert_eq!(session.passes(), 0);
        assert_eq!(session.buffer().sample_count(0, 0), 0);

        session.render_pass(&world, 1).unwrap();
        assert_eq!(session.passes(), 1);
    }

    #[test]
    fn test_resume_mismatch_keeps_fresh_buffer() {
        let path = temp_path("resume_mismatch");
        AccumulationBuffer::new(3, 3).save(&path).unwrap();

        let mut session = RenderSession::new(small_camera(), seeded());
        assert!(!session.resume_from(&path, 10).unwrap());
        std::fs::remove_file(&path).ok();

        assert_eq!(session.buffer(), &AccumulationBuffer::new(8, 4));
    }

    #[test]
    fn test_resume_missing_file_keeps_fresh_buffer() {
        let mut session = RenderSession::new(small_camera(), seeded());
        assert!(!session.resume_from("no/such/checkpoint.ppm", 10).unwrap());
        assert_eq!(session.buffer().sample_count(0, 0), 0);
    }

    #[test]
    fn test_dedicated_thread_pool_matches_global() {
        let world = HittableList::new();

        let mut global = RenderSession::new(small_camera(), seeded());
        global.render_pass(&world, 2).unwrap();

        let config = RenderConfig {
            threads: Some(2),
            ..seeded()
        };
        let mut pooled = RenderSession::new(small_camera(), config);
        pooled.render_pass(&world, 2).unwrap();

        assert_eq!(global.buffer(), pooled.buffer());
    }
}
