//! Frame reader: one bulk read per frame

use std::time::Instant;

use tracing::{debug, instrument};

use crate::camera::controller::DeviceController;
use crate::camera::error::{CameraError, Result};
use crate::camera::protocol;
use crate::camera::transport::UsbTransport;
use crate::image_pipeline::{Frame, RawMosaic};

impl<T: UsbTransport> DeviceController<T> {
    /// Reads one frame from the video stream.
    ///
    /// The next frame is requested as soon as the bulk read returns, before the
    /// header is stripped, so the sensor is never left idle between reads.
    /// A short read is discarded and reported; there is no partial-frame recovery.
    #[instrument(skip(self))]
    pub fn read_frame(&mut self) -> Result<Frame> {
        let resolution = self
            .parameters
            .as_ref()
            .map(|p| p.resolution)
            .ok_or(CameraError::NotConfigured)?;

        let header_len = protocol::header_len(resolution);
        let expected = protocol::frame_len(resolution);

        let mut buffer = vec![0u8; expected];
        let received = self.transport.read_bulk(&mut buffer, self.config.bulk_timeout)?;
        if received < expected {
            return Err(CameraError::ShortRead { expected, received });
        }

        self.request_next_frame()?;

        let timestamp = Instant::now();
        buffer.drain(..header_len);
        let raw = RawMosaic::new(resolution.width as usize, resolution.height as usize, buffer)?;
        let frame = Frame::with_timestamp(
            timestamp,
            raw,
            self.white_balance.snapshot(),
            self.config.demosaic_mode,
        );

        match self.frame_rate.record(timestamp) {
            Some(fps) => debug!("Read {} byte frame, {:.1} fps", received, fps),
            None => debug!("Read {} byte frame", received),
        }

        Ok(frame)
    }
}
