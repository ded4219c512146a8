use tracing::trace;

use super::types::{RawMosaic, RgbImage};
use super::Demosaic;

/// Block-replication demosaicing
///
/// Every 2×2 block takes its R sample, the G sample below it and its B sample,
/// and paints that single colour into all four cells. No interpolation, so it is
/// roughly twice as fast as [`BilinearDebayer`](super::BilinearDebayer) at half
/// the effective resolution.
pub struct NearestDebayer;

impl Demosaic for NearestDebayer {
    fn demosaic(&self, raw: &RawMosaic) -> RgbImage {
        let width = raw.width();
        let height = raw.height();
        trace!("Nearest demosaic {}x{}", width, height);

        let mut image = RgbImage::zeros(width, height);
        let stride = width * 3;

        for y in (0..height).step_by(2) {
            for x in (0..width).step_by(2) {
                let rgb = [raw.get(y, x), raw.get(y + 1, x), raw.get(y + 1, x + 1)];
                for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                    let at = (y + dy) * stride + (x + dx) * 3;
                    image.data[at..at + 3].copy_from_slice(&rgb);
                }
            }
        }

        image
    }
}
