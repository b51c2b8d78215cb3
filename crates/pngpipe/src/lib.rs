//! Consume piped PNG frame streams produced by external decoder processes.
//!
//! A decoder writes one header line and then `FRAME` records, each carrying a
//! timestamp, a byte count and exactly that many PNG bytes. pngpipe reads the
//! stream without read-ahead, inspects every complete payload and reports
//! truncation, malformed records and decoder failures.
//!
//! # Crate Structure
//!
//! - [`stream`]: byte reader with line and exact-length reads
//! - [`frame`]: protocol reader and writer
//! - [`inspect`]: isolated PNG decoding and metadata
//! - [`session`]: decoder process supervision and the session driver

/// Re-export stream types.
pub mod stream {
    pub use pngpipe_stream::*;
}

/// Re-export frame types.
pub mod frame {
    pub use pngpipe_frame::*;
}

/// Re-export inspect types.
pub mod inspect {
    pub use pngpipe_inspect::*;
}

/// Re-export session types.
pub mod session {
    pub use pngpipe_session::*;
}
