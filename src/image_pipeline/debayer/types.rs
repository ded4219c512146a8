//! Types for debayering operations

use crate::image_pipeline::common::error::{ImageError, Result};

/// Raw Bayer mosaic as read off the sensor
///
/// One byte per sample, row-major. Both dimensions are even so the 2×2 pattern
/// always tiles the grid completely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMosaic {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl RawMosaic {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(ImageError::InvalidDimensions(width, height));
        }

        let expected = width * height;
        if data.len() != expected {
            return Err(ImageError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self { width, height, data })
    }

    /// A flat field where every sample holds `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self> {
        Self::new(width, height, vec![value; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample at `row`, `col`. Panics when out of bounds, like slice indexing.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.width + col]
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// RGB image data after debayering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbImage {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u8>,
}

impl RgbImage {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height * 3],
        }
    }

    pub fn pixel(&self, row: usize, col: usize) -> [u8; 3] {
        let at = (row * self.width + col) * 3;
        [self.data[at], self.data[at + 1], self.data[at + 2]]
    }

    /// Every value of one channel (0 = R, 1 = G, 2 = B) in row-major order.
    pub fn channel(&self, channel: usize) -> impl Iterator<Item = u8> + '_ {
        self.data.iter().skip(channel).step_by(3).copied()
    }
}
