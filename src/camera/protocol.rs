//! Wire protocol of the Scopetek 5MP CMOS camera (`0547:c004`)
//!
//! The firmware is undocumented. Everything here was recovered by watching the
//! vendor driver and must go out on the wire exactly as listed; a reordered or
//! missing transfer can leave the sensor unresponsive until it is replugged.

use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CaptureParameters, Resolution, SpeedMode};

/// USB vendor id shared by Scopetek / AmScope / Anchor cameras
pub const VENDOR_ID: u16 = 0x0547;

/// Widest readout. Frames at this width carry the short header.
pub const MAX_WIDTH: u32 = 2592;

/// Metadata bytes preceding the pixels at [`MAX_WIDTH`]
pub const FULL_WIDTH_HEADER_LEN: usize = 256;

/// Metadata bytes preceding the pixels at every other width
pub const HEADER_LEN: usize = 512;

/// Exposure register ticks per second in fast mode
pub const EXPOSURE_TICKS_FAST: f64 = 23382.0;

/// Exposure register ticks per second in normal mode
pub const EXPOSURE_TICKS_NORMAL: f64 = 11694.0;

/// Added to the requested gain to form the gain register value
pub const GAIN_OFFSET: u16 = 0x0f;

pub const SPEED_NORMAL: u16 = 0xa0;
pub const SPEED_FAST: u16 = 0xa1;

/// What the device answers to the handshake read-back
pub const HANDSHAKE_RESPONSE: [u8; 2] = [0x24, 0x03];

/// Vendor request numbers (`bRequest`)
pub mod request {
    /// Arm the sensor to deliver the next frame
    pub const QUEUE_FRAME: u8 = 179;
    pub const SET_RESOLUTION: u8 = 180;
    pub const SET_SPEED: u8 = 181;
    pub const READ_REGISTER: u8 = 182;
    pub const WRITE_REGISTER: u8 = 183;
    /// Halt streaming
    pub const STOP: u8 = 187;
}

const RESOLUTION_CODES: [(Resolution, u16); 4] = [
    (Resolution::VGA, 0xc8),
    (Resolution::XGA, 0xc7),
    (Resolution::SXGA, 0xc6),
    (Resolution::FULL, 0xc0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Host to device, no data stage
    Out,
    /// Device to host
    In,
}

/// One vendor control transfer, fully resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlTransfer {
    pub direction: Direction,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    /// Bytes read back; always 0 for [`Direction::Out`]
    pub length: u16,
}

impl ControlTransfer {
    pub const fn write(request: u8, value: u16, index: u16) -> Self {
        Self {
            direction: Direction::Out,
            request,
            value,
            index,
            length: 0,
        }
    }

    pub const fn read(request: u8, value: u16, index: u16, length: u16) -> Self {
        Self {
            direction: Direction::In,
            request,
            value,
            index,
            length,
        }
    }
}

pub const QUEUE_FRAME: ControlTransfer = ControlTransfer::write(request::QUEUE_FRAME, 0, 0);
pub const STOP: ControlTransfer = ControlTransfer::write(request::STOP, 0, 0);

/// Where a setup step takes its `wValue` from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Fixed(u16),
    Resolution,
    Speed,
    Gain,
    Exposure,
}

/// One entry of the setup table, before register values are filled in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupStep {
    pub direction: Direction,
    pub request: u8,
    pub value: Operand,
    pub index: u16,
    pub length: u16,
}

const fn out(request: u8, value: Operand, index: u16) -> SetupStep {
    SetupStep {
        direction: Direction::Out,
        request,
        value,
        index,
        length: 0,
    }
}

/// Configures the sensor and starts streaming.
pub const SETUP_SEQUENCE: [SetupStep; 10] = [
    out(request::SET_RESOLUTION, Operand::Resolution, 0),
    out(request::QUEUE_FRAME, Operand::Fixed(0), 0),
    out(request::WRITE_REGISTER, Operand::Fixed(0x19), 0x06),
    SetupStep {
        direction: Direction::In,
        request: request::READ_REGISTER,
        value: Operand::Fixed(0),
        index: 0x11,
        length: HANDSHAKE_RESPONSE.len() as u16,
    },
    out(request::SET_SPEED, Operand::Speed, 0),
    out(request::WRITE_REGISTER, Operand::Fixed(0x28), 0x35),
    out(request::WRITE_REGISTER, Operand::Fixed(0x34), 0x09),
    out(request::SET_SPEED, Operand::Fixed(SPEED_NORMAL), 0),
    out(request::WRITE_REGISTER, Operand::Gain, 0x35),
    out(request::WRITE_REGISTER, Operand::Exposure, 0x09),
];

/// Register values derived from a set of capture parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub resolution: u16,
    pub speed: u16,
    pub gain: u16,
    pub exposure: u16,
}

impl Registers {
    pub fn from_parameters(params: &CaptureParameters) -> Result<Self> {
        let resolution = resolution_code(params.resolution)?;

        if !params.exposure.is_finite() || params.exposure <= 0.0 {
            return Err(CameraError::InvalidParameter(format!(
                "exposure must be a positive number of seconds, got {}",
                params.exposure
            )));
        }

        let (ticks, speed) = match params.speed {
            SpeedMode::Fast => (EXPOSURE_TICKS_FAST, SPEED_FAST),
            SpeedMode::Normal => (EXPOSURE_TICKS_NORMAL, SPEED_NORMAL),
        };

        // Truncated, not rounded.
        let exposure = (params.exposure * ticks) as u64;
        let exposure = u16::try_from(exposure).map_err(|_| {
            CameraError::InvalidParameter(format!(
                "exposure of {}s does not fit the exposure register",
                params.exposure
            ))
        })?;

        Ok(Self {
            resolution,
            speed,
            gain: params.gain as u16 + GAIN_OFFSET,
            exposure,
        })
    }

    fn resolve(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Fixed(value) => value,
            Operand::Resolution => self.resolution,
            Operand::Speed => self.speed,
            Operand::Gain => self.gain,
            Operand::Exposure => self.exposure,
        }
    }
}

/// The setup table with register values filled in, in send order.
pub fn setup_transfers(registers: &Registers) -> Vec<ControlTransfer> {
    SETUP_SEQUENCE
        .iter()
        .map(|step| ControlTransfer {
            direction: step.direction,
            request: step.request,
            value: registers.resolve(step.value),
            index: step.index,
            length: step.length,
        })
        .collect()
}

pub fn resolution_code(resolution: Resolution) -> Result<u16> {
    RESOLUTION_CODES
        .iter()
        .find(|(supported, _)| *supported == resolution)
        .map(|(_, code)| *code)
        .ok_or(CameraError::UnsupportedResolution {
            width: resolution.width,
            height: resolution.height,
        })
}

pub fn header_len(resolution: Resolution) -> usize {
    if resolution.width == MAX_WIDTH {
        FULL_WIDTH_HEADER_LEN
    } else {
        HEADER_LEN
    }
}

/// Bytes delivered by one bulk read: header followed by one byte per pixel.
pub fn frame_len(resolution: Resolution) -> usize {
    resolution.pixels() + header_len(resolution)
}
