use tracing::{debug, info, instrument, warn};

use crate::camera::error::{CameraError, Result};
use crate::camera::protocol::{self, ControlTransfer, Direction, Registers};
use crate::camera::transport::{UsbHost, UsbTransport};
use crate::camera::types::{CaptureParameters, ControllerConfig};
use crate::image_pipeline::common::FrameRate;
use crate::image_pipeline::white_balance::{self, SharedWhiteBalance, WhiteBalance};
use crate::image_pipeline::Frame;

/// Owns the camera and drives its control protocol.
///
/// A controller is the only thing that talks to the device, so transfers are
/// serialized by `&mut self`. Dropping a controller that is still streaming
/// halts the sensor.
pub struct DeviceController<T: UsbTransport> {
    pub(super) transport: T,
    pub(super) config: ControllerConfig,
    pub(super) parameters: Option<CaptureParameters>,
    pub(super) white_balance: SharedWhiteBalance,
    pub(super) frame_rate: FrameRate,
    armed: bool,
}

impl<T: UsbTransport> DeviceController<T> {
    /// Finds the camera on `host` and claims it.
    pub fn open<H>(host: &H, config: ControllerConfig) -> Result<Self>
    where
        H: UsbHost<Transport = T>,
    {
        let mut transport = host
            .find_device(protocol::VENDOR_ID)?
            .ok_or(CameraError::DeviceNotFound {
                vendor_id: protocol::VENDOR_ID,
            })?;

        transport.claim_interface().map_err(|e| match e {
            CameraError::PermissionDenied(_) => e,
            other => CameraError::DeviceError(format!("failed to claim interface: {}", other)),
        })?;

        info!("Camera opened");
        Ok(Self::new(transport, config))
    }

    fn new(transport: T, config: ControllerConfig) -> Self {
        let white_balance = SharedWhiteBalance::new(config.white_balance);
        Self {
            transport,
            config,
            parameters: None,
            white_balance,
            frame_rate: FrameRate::new(),
            armed: false,
        }
    }

    /// Programs the sensor for `params` and starts it streaming.
    ///
    /// On failure the device is in an unknown state; stop it and open it again.
    #[instrument(skip(self), fields(resolution = %params.resolution))]
    pub fn configure(&mut self, params: &CaptureParameters) -> Result<()> {
        let registers = Registers::from_parameters(params)?;
        debug!(?registers, "Register values");

        self.parameters = None;
        self.armed = true;
        for transfer in protocol::setup_transfers(&registers) {
            self.send(&transfer)?;
        }

        info!(
            "Configured {} exposure={}s speed={:?} gain={}",
            params.resolution, params.exposure, params.speed, params.gain
        );
        self.parameters = Some(params.clone());
        Ok(())
    }

    /// Arms the sensor to deliver the next frame.
    pub fn request_next_frame(&mut self) -> Result<()> {
        self.send(&protocol::QUEUE_FRAME)
    }

    /// Halts streaming. Best effort: a failure is logged and otherwise ignored,
    /// so this is safe to call on a halted or never-configured device.
    pub fn stop(&mut self) {
        self.armed = false;
        match self.send(&protocol::STOP) {
            Ok(()) => info!("Camera stopped"),
            Err(e) => warn!("Failed to stop camera: {}", e),
        }
    }

    /// Parameters of the last successful [`configure`](Self::configure).
    pub fn parameters(&self) -> Option<&CaptureParameters> {
        self.parameters.as_ref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Handle to the white balance copied into every new frame.
    pub fn white_balance(&self) -> SharedWhiteBalance {
        self.white_balance.clone()
    }

    /// Estimates the white balance from `frame` and makes it current.
    pub fn estimate_white_balance(&self, frame: &Frame) -> WhiteBalance {
        self.white_balance.update_from(frame)
    }

    /// Reads a fresh frame and estimates the white balance from it.
    pub fn auto_white_balance(&mut self) -> Result<WhiteBalance> {
        let frame = self.read_frame()?;
        let estimated = white_balance::estimate(&frame);
        self.white_balance.set(estimated);
        info!(factors = ?estimated.factors(), "Auto white balance");
        Ok(estimated)
    }

    /// Latest frame rate, once two frames have been read.
    pub fn fps(&self) -> Option<f64> {
        self.frame_rate.fps()
    }

    pub(super) fn reset_frame_rate(&mut self) {
        self.frame_rate.reset();
    }

    fn send(&mut self, transfer: &ControlTransfer) -> Result<()> {
        debug!(
            "ctrl {:?} req={} value={:#06x} index={:#06x}",
            transfer.direction, transfer.request, transfer.value, transfer.index
        );
        let timeout = self.config.control_timeout;
        match transfer.direction {
            Direction::Out => self.transport.write_control(
                transfer.request,
                transfer.value,
                transfer.index,
                timeout,
            ),
            Direction::In => {
                let mut response = vec![0u8; transfer.length as usize];
                let received = self.transport.read_control(
                    transfer.request,
                    transfer.value,
                    transfer.index,
                    &mut response,
                    timeout,
                )?;
                response.truncate(received);
                // Only completes the handshake; the content is not used.
                if response != protocol::HANDSHAKE_RESPONSE {
                    warn!("Unexpected handshake response {:02x?}", response);
                }
                Ok(())
            }
        }
    }
}

impl<T: UsbTransport> Drop for DeviceController<T> {
    fn drop(&mut self) {
        if self.armed {
            self.stop();
        }
    }
}
