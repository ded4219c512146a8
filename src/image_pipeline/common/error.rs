use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    #[error("Invalid mosaic dimensions: width={0}, height={1} (both must be even and non-zero)")]
    InvalidDimensions(usize, usize),

    #[error("Sample buffer holds {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid white balance factors {0:?}: every factor must be finite and positive")]
    InvalidWhiteBalance([f32; 3]),
}

pub type Result<T> = std::result::Result<T, ImageError>;
