//! Capture parameter and controller configuration types

use std::fmt;
use std::time::Duration;

use crate::image_pipeline::{DemosaicMode, WhiteBalance};

/// Sensor readout size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const VGA: Resolution = Resolution::new(640, 480);
    pub const XGA: Resolution = Resolution::new(1024, 768);
    pub const SXGA: Resolution = Resolution::new(1280, 960);
    pub const FULL: Resolution = Resolution::new(2592, 1944);

    /// Every resolution the sensor firmware accepts.
    pub const SUPPORTED: [Resolution; 4] = [Self::VGA, Self::XGA, Self::SXGA, Self::FULL];

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Sensor readout speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpeedMode {
    #[default]
    Normal,
    Fast,
}

/// What the sensor should capture
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureParameters {
    pub resolution: Resolution,
    /// Exposure time in seconds
    pub exposure: f64,
    pub speed: SpeedMode,
    /// Offset above the sensor's base gain register value
    pub gain: u8,
}

impl Default for CaptureParameters {
    fn default() -> Self {
        Self {
            resolution: Resolution::VGA,
            exposure: 0.1,
            speed: SpeedMode::Normal,
            gain: 0,
        }
    }
}

impl CaptureParameters {
    pub fn builder() -> CaptureParametersBuilder {
        CaptureParametersBuilder::default()
    }
}

/// Builder for CaptureParameters
#[derive(Default)]
pub struct CaptureParametersBuilder {
    resolution: Option<Resolution>,
    exposure: Option<f64>,
    speed: Option<SpeedMode>,
    gain: Option<u8>,
}

impl CaptureParametersBuilder {
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn exposure(mut self, seconds: f64) -> Self {
        self.exposure = Some(seconds);
        self
    }

    pub fn speed(mut self, speed: SpeedMode) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn fast(self, fast: bool) -> Self {
        self.speed(if fast { SpeedMode::Fast } else { SpeedMode::Normal })
    }

    pub fn gain(mut self, gain: u8) -> Self {
        self.gain = Some(gain);
        self
    }

    pub fn build(self) -> CaptureParameters {
        let default = CaptureParameters::default();
        CaptureParameters {
            resolution: self.resolution.unwrap_or(default.resolution),
            exposure: self.exposure.unwrap_or(default.exposure),
            speed: self.speed.unwrap_or(default.speed),
            gain: self.gain.unwrap_or(default.gain),
        }
    }
}

/// Host-side settings for a [`DeviceController`](crate::camera::DeviceController)
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Timeout for each control transfer
    pub control_timeout: Duration,
    /// Timeout for one frame's bulk read. Also bounds how long a streaming
    /// loop can take to notice a stop request.
    pub bulk_timeout: Duration,
    /// Demosaicing used by frames this controller reads
    pub demosaic_mode: DemosaicMode,
    /// White balance in effect before any estimate is made
    pub white_balance: WhiteBalance,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            control_timeout: Duration::from_secs(1),
            bulk_timeout: Duration::from_secs(2),
            demosaic_mode: DemosaicMode::Bilinear,
            white_balance: WhiteBalance::NEUTRAL,
        }
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::default()
    }
}

/// Builder for ControllerConfig
#[derive(Default)]
pub struct ControllerConfigBuilder {
    control_timeout: Option<Duration>,
    bulk_timeout: Option<Duration>,
    demosaic_mode: Option<DemosaicMode>,
    white_balance: Option<WhiteBalance>,
}

impl ControllerConfigBuilder {
    pub fn control_timeout(mut self, timeout: Duration) -> Self {
        self.control_timeout = Some(timeout);
        self
    }

    pub fn bulk_timeout(mut self, timeout: Duration) -> Self {
        self.bulk_timeout = Some(timeout);
        self
    }

    pub fn demosaic_mode(mut self, mode: DemosaicMode) -> Self {
        self.demosaic_mode = Some(mode);
        self
    }

    pub fn white_balance(mut self, white_balance: WhiteBalance) -> Self {
        self.white_balance = Some(white_balance);
        self
    }

    pub fn build(self) -> ControllerConfig {
        let default = ControllerConfig::default();
        ControllerConfig {
            control_timeout: self.control_timeout.unwrap_or(default.control_timeout),
            bulk_timeout: self.bulk_timeout.unwrap_or(default.bulk_timeout),
            demosaic_mode: self.demosaic_mode.unwrap_or(default.demosaic_mode),
            white_balance: self.white_balance.unwrap_or(default.white_balance),
        }
    }
}
