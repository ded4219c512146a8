//! Seams to the USB stack
//!
//! The controller never talks to libusb directly; it drives a [`UsbTransport`]
//! found through a [`UsbHost`]. [`RusbHost`](crate::camera::RusbHost) is the
//! real implementation, tests substitute a recording mock.

use std::time::Duration;

use crate::camera::error::Result;

/// Enumerates USB devices.
pub trait UsbHost {
    type Transport: UsbTransport;

    /// Opens the first device with `vendor_id`, or `None` if there is none.
    fn find_device(&self, vendor_id: u16) -> Result<Option<Self::Transport>>;
}

/// An opened camera: vendor control transfers plus the bulk data endpoint.
///
/// Implementations map a permission failure to
/// [`CameraError::PermissionDenied`](crate::camera::CameraError::PermissionDenied)
/// and a timeout to
/// [`CameraError::TransferTimeout`](crate::camera::CameraError::TransferTimeout).
pub trait UsbTransport: Send {
    /// Activates the camera's configuration and claims its interface.
    fn claim_interface(&mut self) -> Result<()>;

    fn write_control(&mut self, request: u8, value: u16, index: u16, timeout: Duration) -> Result<()>;

    /// Returns how many bytes of `buf` the device filled.
    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize>;

    /// One bulk read from the data endpoint. Returns how many bytes arrived.
    fn read_bulk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;
}
