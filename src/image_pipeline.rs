//! Image processing pipeline module
//!
//! Turns the raw RGGB mosaic read off the sensor into white-balanced RGB images.
//! Demosaicing lives in `debayer`, the per-frame memoized view in `frame` and the
//! white-balance vector and its estimator in `white_balance`.

pub mod common;
pub mod debayer;
pub mod frame;
pub mod white_balance;

pub use common::{
    ImageError,
    Result,
    Timer,
};

pub use debayer::{
    BilinearDebayer,
    Demosaic,
    DemosaicMode,
    NearestDebayer,
    RawMosaic,
    RgbImage,
};

pub use frame::{
    decode_mosaic,
    Frame,
};

pub use white_balance::{
    SharedWhiteBalance,
    WhiteBalance,
};
