use tracing::trace;

use super::types::{RawMosaic, RgbImage};
use super::Demosaic;

/// Bilinear demosaicing
///
/// Each missing channel is the floor average of the two (along a row or column)
/// or four (diagonal, or the G cross) nearest samples of that channel. Sums are
/// taken in `u16` so nothing wraps before the division.
///
/// Interior pixels are reconstructed exactly that way. Along the last row/column
/// (and the first, for G and B) a neighbour can fall outside the grid; its index
/// is clamped back onto the nearest sample of the same channel, so edge pixels
/// are approximate but a flat field stays flat.
pub struct BilinearDebayer;

impl Demosaic for BilinearDebayer {
    fn demosaic(&self, raw: &RawMosaic) -> RgbImage {
        let width = raw.width();
        let height = raw.height();
        trace!("Bilinear demosaic {}x{}", width, height);

        let sites = Sites::new(raw);
        let mut image = RgbImage::zeros(width, height);

        for (y, row) in image.data.chunks_exact_mut(width * 3).enumerate() {
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                px[0] = sites.red(y, x);
                px[1] = sites.green(y, x);
                px[2] = sites.blue(y, x);
            }
        }

        image
    }
}

/// Indexes the four colour sub-grids of the mosaic.
///
/// Block `(a, c)` covers rows `2a..2a+2` and columns `2c..2c+2`; inside it R sits
/// top-left, G2 top-right, G1 bottom-left and B bottom-right.
struct Sites<'a> {
    raw: &'a RawMosaic,
    rows: isize,
    cols: isize,
}

impl<'a> Sites<'a> {
    fn new(raw: &'a RawMosaic) -> Self {
        Self {
            raw,
            rows: (raw.height() / 2) as isize,
            cols: (raw.width() / 2) as isize,
        }
    }

    #[inline]
    fn at(&self, a: isize, c: isize, dy: usize, dx: usize) -> u16 {
        let a = a.clamp(0, self.rows - 1) as usize;
        let c = c.clamp(0, self.cols - 1) as usize;
        self.raw.get(2 * a + dy, 2 * c + dx) as u16
    }

    #[inline]
    fn r(&self, a: isize, c: isize) -> u16 {
        self.at(a, c, 0, 0)
    }

    #[inline]
    fn g1(&self, a: isize, c: isize) -> u16 {
        self.at(a, c, 1, 0)
    }

    #[inline]
    fn g2(&self, a: isize, c: isize) -> u16 {
        self.at(a, c, 0, 1)
    }

    #[inline]
    fn b(&self, a: isize, c: isize) -> u16 {
        self.at(a, c, 1, 1)
    }

    fn red(&self, y: usize, x: usize) -> u8 {
        let (a, c) = ((y / 2) as isize, (x / 2) as isize);
        let v = match (y % 2, x % 2) {
            (0, 0) => self.r(a, c),
            (1, 0) => (self.r(a, c) + self.r(a + 1, c)) / 2,
            (0, _) => (self.r(a, c) + self.r(a, c + 1)) / 2,
            _ => {
                (self.r(a, c) + self.r(a + 1, c) + self.r(a, c + 1) + self.r(a + 1, c + 1)) / 4
            }
        };
        v as u8
    }

    fn green(&self, y: usize, x: usize) -> u8 {
        let (a, c) = ((y / 2) as isize, (x / 2) as isize);
        let v = match (y % 2, x % 2) {
            (1, 0) => self.g1(a, c),
            (0, 1) => self.g2(a, c),
            // B site: G1 left/right, G2 above/below
            (1, _) => (self.g1(a, c) + self.g1(a, c + 1) + self.g2(a, c) + self.g2(a + 1, c)) / 4,
            // R site: G1 above/below, G2 left/right
            _ => (self.g1(a - 1, c) + self.g1(a, c) + self.g2(a, c - 1) + self.g2(a, c)) / 4,
        };
        v as u8
    }

    fn blue(&self, y: usize, x: usize) -> u8 {
        let (a, c) = ((y / 2) as isize, (x / 2) as isize);
        let v = match (y % 2, x % 2) {
            (1, 1) => self.b(a, c),
            (1, _) => (self.b(a, c - 1) + self.b(a, c)) / 2,
            (0, 1) => (self.b(a - 1, c) + self.b(a, c)) / 2,
            _ => {
                (self.b(a - 1, c - 1) + self.b(a, c - 1) + self.b(a - 1, c) + self.b(a, c)) / 4
            }
        };
        v as u8
    }
}
