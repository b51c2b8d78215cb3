/// Errors that can occur while reading from the underlying stream.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// An I/O error occurred on the underlying stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line grew past the configured limit without a newline.
    #[error("line exceeds {max} bytes without a newline")]
    LineTooLong { max: usize },
}

pub type Result<T> = std::result::Result<T, StreamError>;
