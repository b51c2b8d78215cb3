use pngpipe_stream::StreamError;

/// Errors that can occur while reading or writing the frame protocol.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The stream ended before a header line arrived.
    #[error("no header received")]
    NoHeader,

    /// Frames were requested before the header was read or written.
    #[error("stream header has not been exchanged yet")]
    HeaderPending,

    /// The header was already read or written on this stream.
    #[error("stream header already sent")]
    HeaderAlreadySent,

    /// The reader gave up after an earlier stream failure.
    #[error("frame reader failed earlier and cannot continue")]
    ReaderFailed,

    /// A header line must be a single line of text.
    #[error("header must not contain a newline")]
    InvalidHeader,

    /// The stream ended between a frame marker and its length line.
    #[error("stream ended inside a frame header; frame dropped")]
    IncompleteFrameHeader,

    /// The stream ended before the declared payload was complete.
    ///
    /// `pts` is `None` when the payload was being skipped because its
    /// timestamp line was malformed.
    #[error("unexpected end of stream while reading payload ({received} of {declared} bytes)")]
    TruncatedPayload {
        pts: Option<i64>,
        declared: u64,
        received: u64,
    },

    /// A frame metadata line did not hold `<label> <integer>`.
    #[error("malformed {field} line: {line:?}")]
    MalformedField { field: &'static str, line: String },

    /// The length line of a record could not be parsed.
    ///
    /// The end of the payload is unknown, so no later record can be located.
    #[error("malformed length line: {line:?}")]
    MalformedLength { line: String },

    /// The declared payload exceeds the configured maximum; it was skipped.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: usize },

    /// The underlying stream failed.
    #[error("frame stream error: {0}")]
    Stream(#[from] StreamError),

    /// An I/O error occurred while writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether this condition ends frame consumption for the session.
    ///
    /// A malformed pts and an oversized payload only cost one frame; the
    /// reader can keep going. A malformed length cannot be skipped.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            FrameError::MalformedField { .. } | FrameError::PayloadTooLarge { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
