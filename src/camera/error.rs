use thiserror::Error;

use crate::image_pipeline::ImageError;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("No camera found with vendor id {vendor_id:#06x}")]
    DeviceNotFound { vendor_id: u16 },

    #[error("Permission denied to access camera: {0}")]
    PermissionDenied(String),

    #[error("Unsupported resolution: {width}x{height}")]
    UnsupportedResolution { width: u32, height: u32 },

    #[error("Invalid capture parameter: {0}")]
    InvalidParameter(String),

    #[error("USB transfer timed out")]
    TransferTimeout,

    #[error("USB device error: {0}")]
    DeviceError(String),

    #[error("Short bulk read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    #[error("Camera has not been configured")]
    NotConfigured,

    #[error("Capture stream is already running")]
    AlreadyStreaming,

    #[error("Invalid frame data: {0}")]
    Image(#[from] ImageError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<rusb::Error> for CameraError {
    fn from(err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => CameraError::TransferTimeout,
            rusb::Error::Access => CameraError::PermissionDenied(err.to_string()),
            other => CameraError::DeviceError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, CameraError>;
