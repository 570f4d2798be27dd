use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Log levels selectable on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Built-in demo scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SceneKind {
    /// A handful of spheres including hollow glass
    Sample,
    /// Random field of small spheres on a checkered ground
    Spheres,
    /// Two large checkered spheres
    CheckeredSpheres,
    /// Image-textured globe
    Earth,
    /// Marble ground and sphere
    PerlinSpheres,
    /// Five colored quads
    Quads,
    /// Marble scene lit by emitters
    SimpleLight,
    /// Cornell box with two rotated blocks
    CornellBox,
    /// Cornell box with smoke blocks
    CornellSmoke,
    /// Everything at once
    Final,
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "ember")]
#[command(about = "An offline Monte Carlo path tracer")]
pub struct Args {
    /// Scene to render
    #[arg(long, value_enum, default_value = "spheres")]
    pub scene: SceneKind,

    /// Output PPM path, also used for checkpoints
    #[arg(short, long, default_value = "output.ppm")]
    pub output: PathBuf,

    /// Image width in pixels (height follows the scene's aspect ratio)
    #[arg(long)]
    pub width: Option<u32>,

    /// Samples per pixel, per pass
    #[arg(long, short = 's')]
    pub samples: Option<u32>,

    /// Maximum bounces per path
    #[arg(long)]
    pub depth: Option<u32>,

    /// Number of progressive passes; the output is rewritten after each
    #[arg(long, default_value_t = 1)]
    pub passes: u32,

    /// Continue from a previously written image
    #[arg(long)]
    pub resume: Option<PathBuf>,

    /// Samples per pixel already contained in the resume image
    #[arg(long, default_value_t = 0, requires = "resume")]
    pub resume_samples: u32,

    /// Seed for scene generation and rendering
    #[arg(long)]
    pub seed: Option<u64>,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// JSON file overriding camera settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Image used by the earth and final scenes
    #[arg(long, default_value = "earthmap.jpg")]
    pub earth_texture: PathBuf,

    /// Set the logging level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["ember"]);
        assert_eq!(args.scene, SceneKind::Spheres);
        assert_eq!(args.output, PathBuf::from("output.ppm"));
        assert_eq!(args.passes, 1);
        assert!(args.width.is_none());
        assert!(args.resume.is_none());
    }

    #[test]
    fn test_full_command_line() {
        let args = Args::parse_from([
            "ember",
            "--scene",
            "cornell-smoke",
            "-o",
            "smoke.ppm",
            "--width",
            "300",
            "-s",
            "16",
            "--passes",
            "4",
            "--resume",
            "old.ppm",
            "--resume-samples",
            "64",
            "--seed",
            "3",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.scene, SceneKind::CornellSmoke);
        assert_eq!(args.width, Some(300));
        assert_eq!(args.samples, Some(16));
        assert_eq!(args.passes, 4);
        assert_eq!(args.resume_samples, 64);
        assert_eq!(LevelFilter::from(args.log_level), LevelFilter::Debug);
    }

    #[test]
    fn test_resume_samples_requires_resume() {
        assert!(Args::try_parse_from(["ember", "--resume-samples", "10"]).is_err());
    }
}
