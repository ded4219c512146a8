//! libusb-backed transport

use std::time::Duration;

use rusb::{Context, DeviceHandle, Direction, Recipient, RequestType, UsbContext};
use tracing::{debug, info};

use crate::camera::error::{CameraError, Result};
use crate::camera::transport::{UsbHost, UsbTransport};

pub struct RusbHost {
    context: Context,
}

impl RusbHost {
    pub fn new() -> Result<Self> {
        Ok(Self {
            context: Context::new()?,
        })
    }
}

impl UsbHost for RusbHost {
    type Transport = RusbTransport;

    fn find_device(&self, vendor_id: u16) -> Result<Option<RusbTransport>> {
        for device in self.context.devices()?.iter() {
            let descriptor = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };

            if descriptor.vendor_id() != vendor_id {
                continue;
            }

            // Pixels come in on the first endpoint of the first interface.
            let config = device.config_descriptor(0)?;
            let (interface, endpoint) = config
                .interfaces()
                .next()
                .and_then(|interface| {
                    let endpoint = interface
                        .descriptors()
                        .next()?
                        .endpoint_descriptors()
                        .next()?
                        .address();
                    Some((interface.number(), endpoint))
                })
                .ok_or_else(|| {
                    CameraError::DeviceError("camera exposes no data endpoint".to_string())
                })?;

            let handle = device.open()?;
            info!(
                "Found camera {:04x}:{:04x} on bus {} address {}",
                descriptor.vendor_id(),
                descriptor.product_id(),
                device.bus_number(),
                device.address()
            );

            return Ok(Some(RusbTransport {
                handle,
                configuration: config.number(),
                interface,
                endpoint,
            }));
        }

        Ok(None)
    }
}

pub struct RusbTransport {
    handle: DeviceHandle<Context>,
    configuration: u8,
    interface: u8,
    endpoint: u8,
}

impl UsbTransport for RusbTransport {
    fn claim_interface(&mut self) -> Result<()> {
        // Not supported on every platform; claiming still works without it.
        let _ = self.handle.set_auto_detach_kernel_driver(true);

        self.handle.set_active_configuration(self.configuration)?;
        self.handle.claim_interface(self.interface)?;
        debug!(
            "Claimed configuration {} interface {}, data endpoint {:#04x}",
            self.configuration, self.interface, self.endpoint
        );
        Ok(())
    }

    fn write_control(&mut self, request: u8, value: u16, index: u16, timeout: Duration) -> Result<()> {
        let request_type = rusb::request_type(Direction::Out, RequestType::Vendor, Recipient::Device);
        self.handle
            .write_control(request_type, request, value, index, &[], timeout)?;
        Ok(())
    }

    fn read_control(
        &mut self,
        request: u8,
        value: u16,
        index: u16,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<usize> {
        let request_type = rusb::request_type(Direction::In, RequestType::Vendor, Recipient::Device);
        Ok(self
            .handle
            .read_control(request_type, request, value, index, buf, timeout)?)
    }

    fn read_bulk(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize> {
        Ok(self.handle.read_bulk(self.endpoint, buf, timeout)?)
    }
}
