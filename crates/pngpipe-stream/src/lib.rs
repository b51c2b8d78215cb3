//! Line and exact-length reads over a single byte stream.
//!
//! This is the lowest layer of pngpipe. The piped PNG protocol interleaves
//! newline-terminated text with raw binary payloads, so everything above
//! this crate reads through one [`StreamReader`] cursor:
//! - [`StreamReader::read_line`] for the text records
//! - [`StreamReader::read_exact`] for payloads of a declared length
//!
//! End of stream and short reads are reported as values, not errors.

pub mod error;
pub mod reader;

pub use error::{Result, StreamError};
pub use reader::{ReadExact, StreamReader, DEFAULT_MAX_LINE_LENGTH};
