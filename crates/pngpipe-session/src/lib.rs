//! Runs a decoder process and consumes its frame stream.
//!
//! [`DecoderProcess`] owns the child: stdin is closed, stdout is handed to a
//! [`FrameReader`](pngpipe_frame::FrameReader), stderr is drained on its own
//! thread. [`drive`] pulls frames one at a time and inspects each before
//! reading the next line. [`Session`] ties the two together and reports the
//! process exit last.

pub mod config;
pub mod error;
pub mod session;
pub mod supervisor;

pub use config::{
    DecoderConfig, SessionConfig, DEFAULT_DECODER_FORMAT, DEFAULT_OUTPUT_PLACEHOLDER,
};
pub use error::{Result, SessionError};
pub use session::{
    drive, FrameReport, Session, SessionEvent, SessionReport, StreamEnd, StreamSummary,
};
pub use supervisor::{DecoderProcess, KillHandle, ProcessExit};

#[cfg(all(test, unix))]
mod test_support;
