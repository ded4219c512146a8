//! Driver for Scopetek / AmScope USB CMOS cameras
//!
//! Open the camera through a [`UsbHost`], [`configure`](DeviceController::configure)
//! it, then either pull frames with [`read_frame`](DeviceController::read_frame)
//! or hand the controller to a [`StreamPipeline`] to capture on a background
//! thread.

mod controller;
mod error;
pub mod protocol;
mod reader;
mod rusb_host;
mod stream;
mod transport;
pub mod types;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub use controller::DeviceController;
pub use error::{CameraError, Result};
pub use rusb_host::{RusbHost, RusbTransport};
pub use stream::StreamPipeline;
pub use transport::{UsbHost, UsbTransport};
pub use types::{
    CaptureParameters,
    CaptureParametersBuilder,
    ControllerConfig,
    ControllerConfigBuilder,
    Resolution,
    SpeedMode,
};
