//! Debayering module for converting the sensor's RGGB mosaic to RGB
//!
//! The sensor reads out a 2×2-periodic pattern:
//!
//! ```text
//! R G R G R G
//! G B G B G B
//! R G R G R G
//! ```
//!
//! Two reconstructions are offered: [`BilinearDebayer`] interpolates the missing
//! channels from the nearest same-colour neighbours, [`NearestDebayer`] replicates
//! one sample per channel across each 2×2 block.

mod bilinear;
mod nearest;
pub mod types;


pub use bilinear::BilinearDebayer;
pub use nearest::NearestDebayer;
pub use types::{RawMosaic, RgbImage};

/// Reconstructs a full RGB image from a raw mosaic.
///
/// Implementations must be pure: the same mosaic always yields the same image.
pub trait Demosaic {
    fn demosaic(&self, raw: &RawMosaic) -> RgbImage;
}

/// Selects which reconstruction a [`Frame`](crate::image_pipeline::Frame) uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DemosaicMode {
    /// Edge-aware bilinear interpolation (default)
    #[default]
    Bilinear,
    /// 2×2 block replication, cheaper and blockier
    Nearest,
}

impl Demosaic for DemosaicMode {
    fn demosaic(&self, raw: &RawMosaic) -> RgbImage {
        match self {
            DemosaicMode::Bilinear => BilinearDebayer.demosaic(raw),
            DemosaicMode::Nearest => NearestDebayer.demosaic(raw),
        }
    }
}
