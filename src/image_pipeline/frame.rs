//! A captured frame and its lazily decoded RGB view

use std::sync::OnceLock;
use std::time::Instant;

use tracing::debug;

use crate::image_pipeline::common::timing::Timer;
use crate::image_pipeline::debayer::{Demosaic, DemosaicMode, RawMosaic, RgbImage};
use crate::image_pipeline::white_balance::WhiteBalance;


/// Demosaics `raw` and applies `white_balance` to the result.
///
/// Pure: the same mosaic, demosaicer and factors always give the same image.
pub fn decode_mosaic<D: Demosaic + ?Sized>(
    demosaic: &D,
    raw: &RawMosaic,
    white_balance: WhiteBalance,
) -> RgbImage {
    let _span = tracing::info_span!("decode_frame", width = raw.width(), height = raw.height()).entered();

    let timer = Timer::start("demosaic");
    let mut image = demosaic.demosaic(raw);
    white_balance.apply(&mut image);
    let (name, duration) = timer.stop();

    debug!("{}: {:.3}ms", name, duration.as_secs_f64() * 1000.0);
    image
}

/// One frame read off the sensor
///
/// Carries the white balance that was current at capture time. The RGB image is
/// computed on the first [`decode`](Frame::decode) and then kept; later changes
/// to the global white balance do not affect an existing frame.
#[derive(Debug)]
pub struct Frame {
    timestamp: Instant,
    raw: RawMosaic,
    white_balance: WhiteBalance,
    mode: DemosaicMode,
    rgb: OnceLock<RgbImage>,
}

impl Frame {
    pub fn new(raw: RawMosaic, white_balance: WhiteBalance, mode: DemosaicMode) -> Self {
        Self::with_timestamp(Instant::now(), raw, white_balance, mode)
    }

    pub fn with_timestamp(
        timestamp: Instant,
        raw: RawMosaic,
        white_balance: WhiteBalance,
        mode: DemosaicMode,
    ) -> Self {
        Self {
            timestamp,
            raw,
            white_balance,
            mode,
            rgb: OnceLock::new(),
        }
    }

    /// When the frame's bulk read completed.
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    pub fn raw(&self) -> &RawMosaic {
        &self.raw
    }

    pub fn white_balance(&self) -> WhiteBalance {
        self.white_balance
    }

    pub fn mode(&self) -> DemosaicMode {
        self.mode
    }

    pub fn width(&self) -> usize {
        self.raw.width()
    }

    pub fn height(&self) -> usize {
        self.raw.height()
    }

    /// The white-balanced RGB image, decoded with the frame's own mode.
    pub fn decode(&self) -> &RgbImage {
        self.decode_with(&self.mode)
    }

    /// Like [`decode`](Frame::decode) with an explicit demosaicer.
    ///
    /// Only the first call on a frame decodes; every later call, whatever
    /// demosaicer it passes, returns that first image.
    pub fn decode_with<D: Demosaic + ?Sized>(&self, demosaic: &D) -> &RgbImage {
        self.rgb
            .get_or_init(|| decode_mosaic(demosaic, &self.raw, self.white_balance))
    }

    pub fn is_decoded(&self) -> bool {
        self.rgb.get().is_some()
    }

    /// Splits the frame into its mosaic and, if it was decoded, its image.
    pub fn into_parts(self) -> (RawMosaic, Option<RgbImage>) {
        (self.raw, self.rgb.into_inner())
    }
}
