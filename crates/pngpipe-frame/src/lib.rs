//! Reader and writer for the piped PNG frame protocol.
//!
//! A session is one header line followed by zero or more frame records:
//! - A line starting with `FRAME`
//! - A `<label> <pts>` line
//! - A `<label> <length>` line
//! - Exactly `length` raw payload bytes, no trailing delimiter
//!
//! [`FrameReader`] only ever yields complete frames. Truncation, malformed
//! metadata and oversized payloads surface as [`FrameError`] values.

pub mod codec;
pub mod error;
pub mod header;
pub mod reader;
pub mod writer;

pub use codec::{
    encode_frame, encode_header, is_frame_marker, parse_labeled_int, Frame, FrameConfig,
    BYTES_LABEL, DEFAULT_MAX_PAYLOAD, FRAME_MARKER, PTS_LABEL,
};
pub use error::{FrameError, Result};
pub use header::{HeaderFields, StreamHeader};
pub use reader::{FrameReader, ReaderState};
pub use writer::FrameWriter;
