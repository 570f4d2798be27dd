//! Error types for scene construction and render bookkeeping.
//!
//! The per-ray hot path never produces these; it signals misses and
//! absorption through `bool` and `Option`.

use thiserror::Error;

/// Errors raised outside the per-ray hot path.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot build a BVH from an empty object list")]
    EmptyScene,

    #[error("Image is {found_width}x{found_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        found_width: u32,
        found_height: u32,
    },

    #[error("Malformed image: {0}")]
    MalformedImage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid render state: {0}")]
    InvalidState(&'static str),
}

pub type Result<T> = std::result::Result<T, RenderError>;
