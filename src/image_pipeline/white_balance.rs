//! White balance vector, its shared process-wide handle and the estimator
//!
//! The estimator equalizes the per-channel medians of a decoded frame: the
//! channel with the brightest median keeps factor `1.0` and the other two are
//! scaled up to meet it.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::image_pipeline::common::error::{ImageError, Result};
use crate::image_pipeline::debayer::RgbImage;
use crate::image_pipeline::frame::Frame;


/// Per-channel multiplicative correction, `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteBalance([f32; 3]);

impl WhiteBalance {
    pub const NEUTRAL: WhiteBalance = WhiteBalance([1.0, 1.0, 1.0]);

    pub fn new(r: f32, g: f32, b: f32) -> Result<Self> {
        let factors = [r, g, b];
        if factors.iter().any(|f| !f.is_finite() || *f <= 0.0) {
            return Err(ImageError::InvalidWhiteBalance(factors));
        }
        Ok(Self(factors))
    }

    pub fn factors(&self) -> [f32; 3] {
        self.0
    }

    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }

    /// Scales every channel in place, saturating at 255.
    pub fn apply(&self, image: &mut RgbImage) {
        if self.is_neutral() {
            return;
        }
        for px in image.data.chunks_exact_mut(3) {
            for (value, factor) in px.iter_mut().zip(self.0) {
                *value = (*value as f32 * factor).min(u8::MAX as f32) as u8;
            }
        }
    }

    /// Factors that bring each median up to the largest one.
    ///
    /// A zero median would divide by zero; the result is then neutral.
    pub fn from_medians(medians: [f32; 3]) -> Self {
        if medians.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            warn!("Degenerate channel medians {:?}, using neutral white balance", medians);
            return Self::NEUTRAL;
        }
        let max = medians[0].max(medians[1]).max(medians[2]);
        Self([max / medians[0], max / medians[1], max / medians[2]])
    }
}

impl Default for WhiteBalance {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Process-wide white balance, read by the capture side and written by the estimator.
///
/// Cloning shares the same vector. Readers take a copy, so a frame keeps the
/// factors that were current when it was captured.
#[derive(Debug, Clone, Default)]
pub struct SharedWhiteBalance(Arc<RwLock<WhiteBalance>>);

impl SharedWhiteBalance {
    pub fn new(initial: WhiteBalance) -> Self {
        Self(Arc::new(RwLock::new(initial)))
    }

    pub fn snapshot(&self) -> WhiteBalance {
        *self.0.read()
    }

    pub fn set(&self, white_balance: WhiteBalance) {
        *self.0.write() = white_balance;
    }

    /// Estimates from `frame` and makes the result the current vector.
    pub fn update_from(&self, frame: &Frame) -> WhiteBalance {
        let estimated = estimate(frame);
        self.set(estimated);
        estimated
    }
}

/// Estimates the white balance that neutralizes `frame`, decoding it if needed.
pub fn estimate(frame: &Frame) -> WhiteBalance {
    let medians = channel_medians(frame.decode());
    let white_balance = WhiteBalance::from_medians(medians);
    debug!(?medians, factors = ?white_balance.factors(), "Estimated white balance");
    white_balance
}

/// Median of each channel over the whole image.
///
/// Even counts average the two middle values. An empty image yields zeros.
pub fn channel_medians(image: &RgbImage) -> [f32; 3] {
    let mut histograms = [[0usize; 256]; 3];
    for px in image.data.chunks_exact(3) {
        for (histogram, &value) in histograms.iter_mut().zip(px) {
            histogram[value as usize] += 1;
        }
    }

    let count = image.width * image.height;
    histograms.map(|histogram| histogram_median(&histogram, count))
}

fn histogram_median(histogram: &[usize; 256], count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    let upper = nth_value(histogram, count / 2) as f32;
    if count % 2 == 1 {
        return upper;
    }
    let lower = nth_value(histogram, count / 2 - 1) as f32;
    (lower + upper) / 2.0
}

/// The `rank`-th smallest value (0-based) recorded in `histogram`.
fn nth_value(histogram: &[usize; 256], rank: usize) -> u8 {
    let mut seen = 0;
    for (value, &hits) in histogram.iter().enumerate() {
        seen += hits;
        if seen > rank {
            return value as u8;
        }
    }
    u8::MAX
}
