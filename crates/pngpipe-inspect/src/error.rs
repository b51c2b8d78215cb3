/// Reasons a payload could not be inspected.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    /// The bytes do not start with any supported image signature.
    #[error("cannot identify image format")]
    UnknownFormat,

    /// The codec rejected the data.
    #[error("{0}")]
    Decode(#[from] image::ImageError),

    /// Reading the in-memory payload failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The codec panicked; the panic was contained here.
    #[error("decoder panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, InspectError>;
