// SPDX-License-Identifier: GPL-3.0-only

//! Depth visualization: gamma table and near/mid/far banding

use crate::constants::{DEPTH_TABLE_SIZE, DISPLAY_BYTES_PER_PIXEL};

/// Distance band derived from the gamma-corrected depth value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthBand {
    Near,
    Mid,
    Far,
}

impl DepthBand {
    /// Display color for the band
    pub fn rgb(self) -> [u8; 3] {
        match self {
            DepthBand::Near => [255, 0, 0],
            DepthBand::Mid => [255, 255, 255],
            DepthBand::Far => [0, 0, 0],
        }
    }
}

/// Lookup table mapping raw 11-bit depth to a banded display color
pub struct DepthPalette {
    gamma: Box<[u16; DEPTH_TABLE_SIZE]>,
}

impl DepthPalette {
    pub fn new() -> Self {
        let mut gamma = Box::new([0u16; DEPTH_TABLE_SIZE]);
        for (i, slot) in gamma.iter_mut().enumerate() {
            let v = i as f32 / DEPTH_TABLE_SIZE as f32;
            let v = v.powi(3) * 6.0;
            *slot = (v * 6.0 * 256.0) as u16;
        }
        Self { gamma }
    }

    /// Gamma value for a raw sample; out-of-range samples use the last entry
    pub fn gamma(&self, raw: u16) -> u16 {
        let index = (raw as usize).min(DEPTH_TABLE_SIZE - 1);
        self.gamma[index]
    }

    pub fn classify(&self, raw: u16) -> DepthBand {
        match self.gamma(raw) >> 8 {
            0 => DepthBand::Near,
            1 => DepthBand::Mid,
            _ => DepthBand::Far,
        }
    }

    /// Convert raw depth samples into RGB24 pixels
    ///
    /// `out` is fully written: pixels without a matching sample are black.
    pub fn convert(&self, raw: &[u16], out: &mut [u8]) {
        let mut samples = raw.iter();
        for pixel in out.chunks_exact_mut(DISPLAY_BYTES_PER_PIXEL) {
            let rgb = match samples.next() {
                Some(&sample) => self.classify(sample).rgb(),
                None => DepthBand::Far.rgb(),
            };
            pixel.copy_from_slice(&rgb);
        }
    }
}

impl Default for DepthPalette {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gamma_table_is_monotonic() {
        let palette = DepthPalette::new();
        let mut prev = 0;
        for raw in 0..DEPTH_TABLE_SIZE as u16 {
            let g = palette.gamma(raw);
            assert!(g >= prev, "gamma decreased at {}", raw);
            prev = g;
        }
    }

    #[test]
    fn test_bands_cover_near_mid_far() {
        let palette = DepthPalette::new();
        assert_eq!(palette.classify(0), DepthBand::Near);
        assert_eq!(palette.classify(600), DepthBand::Near);
        assert_eq!(palette.classify(700), DepthBand::Mid);
        assert_eq!(palette.classify(1000), DepthBand::Far);
        assert_eq!(palette.classify(2047), DepthBand::Far);
    }

    #[test]
    fn test_out_of_range_sample_is_bounded() {
        let palette = DepthPalette::new();
        assert_eq!(palette.gamma(u16::MAX), palette.gamma(2047));
        assert_eq!(palette.classify(u16::MAX), DepthBand::Far);
    }

    #[test]
    fn test_convert_writes_every_pixel() {
        let palette = DepthPalette::new();
        let mut out = vec![7u8; 4 * DISPLAY_BYTES_PER_PIXEL];
        // Only two samples for four pixels
        palette.convert(&[0, 700], &mut out);
        assert_eq!(&out[0..3], &[255, 0, 0]);
        assert_eq!(&out[3..6], &[255, 255, 255]);
        assert_eq!(&out[6..12], &[0; 6]);
    }
}
