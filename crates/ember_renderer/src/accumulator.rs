//! Resumable per-pixel sample accumulation.

use std::path::Path;

use crate::ppm::{read_ppm_sized, write_ppm};
use crate::{RenderError, Result};

/// 8-bit image plus the number of samples behind each pixel.
///
/// Values are stored gamma-corrected, exactly as written to disk, so a
/// saved buffer can be reloaded and refined by later passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
    counts: Vec<u32>,
}

impl AccumulationBuffer {
    /// Black buffer with zero samples everywhere.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![[0; 3]; len],
            counts: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major pixels, top row first.
    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels[self.index(x, y)]
    }

    pub fn sample_count(&self, x: u32, y: u32) -> u32 {
        self.counts[self.index(x, y)]
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Fold a pass of `samples` samples per pixel into the running average.
    ///
    /// Each channel becomes `(old * old_count + new * samples) / (old_count + samples)`,
    /// rounded to the nearest integer.
    pub fn merge(&mut self, pass: &[[u8; 3]], samples: u32) -> Result<()> {
        if pass.len() != self.pixels.len() {
            return Err(RenderError::InvalidState("pass size does not match the accumulation buffer"));
        }
        if samples == 0 {
            return Ok(());
        }

        for ((acc, count), new) in self.pixels.iter_mut().zip(self.counts.iter_mut()).zip(pass) {
            let old_count = *count as u64;
            let total = old_count + samples as u64;

            for c in 0..3 {
                let weighted = acc[c] as u64 * old_count + new[c] as u64 * samples as u64;
                // Round half up; result never exceeds 255
                acc[c] = ((weighted + total / 2) / total) as u8;
            }
            *count += samples;
        }

        Ok(())
    }

    /// Write the buffer as a PPM file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_ppm(path, self.width, self.height, &self.pixels)
    }

    /// Load a PPM previously written by [`save`](Self::save).
    ///
    /// The image must be exactly `width` x `height`; every pixel is
    /// credited with `samples` prior samples.
    pub fn load(path: impl AsRef<Path>, width: u32, height: u32, samples: u32) -> Result<Self> {
        let image = read_ppm_sized(path, width, height)?;
        let counts = vec![samples; image.pixels.len()];
        Ok(Self {
            width,
            height,
            pixels: image.pixels,
            counts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("ember_acc_{}_{}.ppm", name, std::process::id()))
    }

    #[test]
    fn test_first_merge_copies_pass() {
        let mut buf = AccumulationBuffer::new(2, 1);
        buf.merge(&[[10, 20, 30], [200, 100, 0]], 4).unwrap();

        assert_eq!(buf.pixel(0, 0), [10, 20, 30]);
        assert_eq!(buf.pixel(1, 0), [200, 100, 0]);
        assert_eq!(buf.sample_count(1, 0), 4);
    }

    #[test]
    fn test_weighted_average() {
        let mut buf = AccumulationBuffer::new(1, 1);
        buf.merge(&[[100, 0, 255]], 3).unwrap();
        buf.merge(&[[200, 255, 0]], 1).unwrap();

        // (100*3 + 200) / 4 = 125, (0*3 + 255) / 4 = 63.75, (255*3) / 4 = 191.25
        assert_eq!(buf.pixel(0, 0), [125, 64, 191]);
        assert_eq!(buf.sample_count(0, 0), 4);
    }

    #[test]
    fn test_split_passes_match_single_pass_for_constant_input() {
        let pass = vec![[37, 180, 255]; 6];

        let mut single = AccumulationBuffer::new(3, 2);
        single.merge(&pass, 10).unwrap();

        let mut split = AccumulationBuffer::new(3, 2);
        split.merge(&pass, 7).unwrap();
        split.merge(&pass, 3).unwrap();

        assert_eq!(single, split);
    }

    #[test]
    fn test_zero_sample_merge_is_noop() {
        let mut buf = AccumulationBuffer::new(1, 1);
        buf.merge(&[[9, 9, 9]], 2).unwrap();
        buf.merge(&[[255, 255, 255]], 0).unwrap();
        assert_eq!(buf.pixel(0, 0), [9, 9, 9]);
        assert_eq!(buf.sample_count(0, 0), 2);
    }

    #[test]
    fn test_merge_rejects_wrong_size() {
        let mut buf = AccumulationBuffer::new(2, 2);
        assert!(matches!(buf.merge(&[[0, 0, 0]], 1), Err(RenderError::InvalidState(_))));
    }

    #[test]
    fn test_save_load_round_trip() {
        let path = temp_path("roundtrip");
        let mut buf = AccumulationBuffer::new(2, 2);
        buf.merge(&[[1, 2, 3], [4, 5, 6], [7, 8, 9], [250, 128, 0]], 5).unwrap();
        buf.save(&path).unwrap();

        let loaded = AccumulationBuffer::load(&path, 2, 2, 5).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, buf);
    }

    #[test]
    fn test_load_rejects_dimension_mismatch() {
        let path = temp_path("mismatch");
        AccumulationBuffer::new(4, 3).save(&path).unwrap();

        let result = AccumulationBuffer::load(&path, 3, 4, 1);
        std::fs::remove_file(&path).ok();

        match result {
            Err(RenderError::DimensionMismatch {
                expected_width,
                found_width,
                ..
            }) => {
                assert_eq!(expected_width, 3);
                assert_eq!(found_width, 4);
            }
            other => panic!("expected dimension mismatch, got {:?}", other),
        }
    }
}
