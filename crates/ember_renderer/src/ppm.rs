//! Plain-text PPM (P3) reading and writing.
//!
//! Layout: `P3`, then `<width> <height>`, then `255`, then one `R G B`
//! line per pixel, rows top to bottom.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{RenderError, Result};

/// A decoded 8-bit RGB image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PpmImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, top row first
    pub pixels: Vec<[u8; 3]>,
}

/// Encode pixels as P3 into any writer.
pub fn write_ppm_to<W: Write>(mut out: W, width: u32, height: u32, pixels: &[[u8; 3]]) -> Result<()> {
    if pixels.len() != width as usize * height as usize {
        return Err(RenderError::MalformedImage(format!(
            "{} pixels do not fill a {}x{} image",
            pixels.len(),
            width,
            height
        )));
    }

    writeln!(out, "P3")?;
    writeln!(out, "{} {}", width, height)?;
    writeln!(out, "255")?;
    for [r, g, b] in pixels {
        writeln!(out, "{} {} {}", r, g, b)?;
    }
    out.flush()?;
    Ok(())
}

/// Write pixels to a PPM file, replacing it if present.
pub fn write_ppm(path: impl AsRef<Path>, width: u32, height: u32, pixels: &[[u8; 3]]) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_ppm_to(BufWriter::new(file), width, height, pixels)
}

/// Decode P3 text.
pub fn parse_ppm(text: &str) -> Result<PpmImage> {
    let mut tokens = text.split_whitespace();
    let (width, height) = parse_header(&mut tokens)?;
    parse_body(tokens, width, height)
}

/// Decode P3 text that must be exactly `width` x `height`.
///
/// The header is checked before any pixel is read, so a file claiming
/// some other size is rejected with [`RenderError::DimensionMismatch`]
/// without touching its body.
pub fn parse_ppm_sized(text: &str, width: u32, height: u32) -> Result<PpmImage> {
    let mut tokens = text.split_whitespace();
    let (found_width, found_height) = parse_header(&mut tokens)?;

    if found_width != width || found_height != height {
        return Err(RenderError::DimensionMismatch {
            expected_width: width,
            expected_height: height,
            found_width,
            found_height,
        });
    }

    parse_body(tokens, width, height)
}

fn parse_header<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<(u32, u32)> {
    match tokens.next() {
        Some("P3") => {}
        Some(other) => return Err(RenderError::MalformedImage(format!("unsupported magic '{}'", other))),
        None => return Err(RenderError::MalformedImage("empty file".into())),
    }

    let width = next_number::<u32>(&mut *tokens, "width")?;
    let height = next_number::<u32>(&mut *tokens, "height")?;
    let max_value = next_number::<u32>(&mut *tokens, "max value")?;
    if max_value != 255 {
        return Err(RenderError::MalformedImage(format!("max value {} is not 255", max_value)));
    }

    Ok((width, height))
}

fn parse_body<'a>(mut tokens: impl Iterator<Item = &'a str>, width: u32, height: u32) -> Result<PpmImage> {
    let count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| RenderError::MalformedImage(format!("{}x{} image is too large", width, height)))?;

    // Grown as pixels parse; the header alone is not trusted for sizing
    let mut pixels = Vec::new();
    for _ in 0..count {
        let r = next_number::<u8>(&mut tokens, "red")?;
        let g = next_number::<u8>(&mut tokens, "green")?;
        let b = next_number::<u8>(&mut tokens, "blue")?;
        pixels.push([r, g, b]);
    }

    if tokens.next().is_some() {
        return Err(RenderError::MalformedImage("trailing data after pixels".into()));
    }

    Ok(PpmImage { width, height, pixels })
}

/// Read and decode a PPM file.
pub fn read_ppm(path: impl AsRef<Path>) -> Result<PpmImage> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_ppm(&text)
}

/// Read a PPM file that must be exactly `width` x `height`.
pub fn read_ppm_sized(path: impl AsRef<Path>, width: u32, height: u32) -> Result<PpmImage> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_ppm_sized(&text, width, height)
}

fn next_number<'a, T: std::str::FromStr>(tokens: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<T> {
    let token = tokens
        .next()
        .ok_or_else(|| RenderError::MalformedImage(format!("missing {}", what)))?;
    token
        .parse()
        .map_err(|_| RenderError::MalformedImage(format!("bad {} '{}'", what, token)))
}
