use std::io::Read;

use pngpipe_stream::{ReadExact, StreamReader};
use tracing::{debug, warn};

use crate::codec::{is_frame_marker, parse_labeled_int, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::header::StreamHeader;

/// Where a [`FrameReader`] is in the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    AwaitingHeader,
    AwaitingFrame,
    /// Clean end of stream, end inside a frame header, or a record whose
    /// length line could not be parsed.
    Ended,
    /// End of stream inside a payload.
    Truncated,
    /// The stream ended before any header.
    NoHeader,
    /// The underlying stream failed or sent an over-long line.
    Failed,
}

impl ReaderState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ReaderState::AwaitingHeader | ReaderState::AwaitingFrame)
    }
}

/// Reads the header and then complete frames from any `Read` stream.
///
/// Handles partial reads internally; callers only ever see whole frames.
pub struct FrameReader<R> {
    stream: StreamReader<R>,
    config: FrameConfig,
    state: ReaderState,
    frames_read: u64,
    lines_skipped: u64,
}

impl<R: Read> FrameReader<R> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: R, config: FrameConfig) -> Self {
        Self {
            stream: StreamReader::with_max_line_length(inner, config.max_line_length),
            config,
            state: ReaderState::AwaitingHeader,
            frames_read: 0,
            lines_skipped: 0,
        }
    }

    /// Read the header line.
    ///
    /// Returns [`FrameError::NoHeader`] if the stream ends first. Called
    /// again, it reports the condition the reader ended in.
    pub fn read_header(&mut self) -> Result<StreamHeader> {
        match self.state {
            ReaderState::AwaitingHeader => {}
            ReaderState::NoHeader => return Err(FrameError::NoHeader),
            ReaderState::Failed => return Err(FrameError::ReaderFailed),
            _ => return Err(FrameError::HeaderAlreadySent),
        }

        match self.read_line()? {
            Some(line) => {
                self.state = ReaderState::AwaitingFrame;
                debug!(header = %line, "stream header received");
                Ok(StreamHeader::new(line))
            }
            None => {
                self.state = ReaderState::NoHeader;
                Err(FrameError::NoHeader)
            }
        }
    }

    /// Read the next complete frame (blocking).
    ///
    /// Returns `Ok(None)` at a clean end of stream and on every call once the
    /// reader is in a terminal state. Errors for which
    /// [`FrameError::is_terminal`] is false leave the reader usable.
    pub fn read_frame(&mut self) -> Result<Option<Frame>> {
        match self.state {
            ReaderState::AwaitingHeader => return Err(FrameError::HeaderPending),
            ReaderState::AwaitingFrame => {}
            _ => return Ok(None),
        }

        loop {
            let Some(line) = self.read_line()? else {
                self.state = ReaderState::Ended;
                return Ok(None);
            };

            if is_frame_marker(&line) {
                return self.read_frame_body();
            }

            self.lines_skipped += 1;
            debug!(line = %line, "skipping unrecognised line");
        }
    }

    fn read_frame_body(&mut self) -> Result<Option<Frame>> {
        let (Some(pts_line), Some(len_line)) = (self.read_line()?, self.read_line()?) else {
            self.state = ReaderState::Ended;
            warn!("stream ended inside a frame header");
            return Err(FrameError::IncompleteFrameHeader);
        };

        let pts = parse_labeled_int::<i64>("pts", &pts_line);
        let Ok(declared) = parse_labeled_int::<u64>("length", &len_line) else {
            self.state = ReaderState::Ended;
            warn!(line = %len_line, "malformed length line; stream position lost");
            return Err(FrameError::MalformedLength { line: len_line });
        };

        let pts = match pts {
            Ok(pts) => pts,
            Err(err) => {
                // The length is still good, so skip the payload to stay aligned.
                self.discard(None, declared)?;
                return Err(err);
            }
        };

        let len = match usize::try_from(declared) {
            Ok(len) if len <= self.config.max_payload_size => len,
            _ => {
                self.discard(Some(pts), declared)?;
                return Err(FrameError::PayloadTooLarge {
                    size: declared,
                    max: self.config.max_payload_size,
                });
            }
        };

        match self.stream.read_exact(len).map_err(|err| self.fail(err))? {
            ReadExact::Complete(payload) => {
                let frame = Frame::new(self.frames_read, pts, payload);
                self.frames_read += 1;
                debug!(index = frame.index, pts, len, "frame read");
                Ok(Some(frame))
            }
            ReadExact::Short { wanted, received } => {
                self.state = ReaderState::Truncated;
                Err(FrameError::TruncatedPayload {
                    pts: Some(pts),
                    declared: wanted as u64,
                    received: received.len() as u64,
                })
            }
        }
    }

    fn discard(&mut self, pts: Option<i64>, declared: u64) -> Result<()> {
        let received = self
            .stream
            .discard_exact(declared)
            .map_err(|err| self.fail(err))?;
        if received < declared {
            self.state = ReaderState::Truncated;
            return Err(FrameError::TruncatedPayload {
                pts,
                declared,
                received,
            });
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>> {
        self.stream.read_line().map_err(|err| self.fail(err))
    }

    fn fail(&mut self, err: pngpipe_stream::StreamError) -> FrameError {
        self.state = ReaderState::Failed;
        FrameError::Stream(err)
    }

    /// Current state of the protocol state machine.
    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Number of complete frames returned so far.
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Number of non-marker lines skipped between frames.
    pub fn lines_skipped(&self) -> u64 {
        self.lines_skipped
    }

    /// Total bytes consumed from the stream.
    pub fn position(&self) -> u64 {
        self.stream.position()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        self.stream.get_ref()
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        self.stream.get_mut()
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.stream.into_inner()
    }

    /// Update maximum payload size for subsequent frames.
    pub fn set_max_payload_size(&mut self, max_payload_size: usize) {
        self.config.max_payload_size = max_payload_size;
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
