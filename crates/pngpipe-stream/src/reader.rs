use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{Result, StreamError};

/// Default upper bound on a single text line: 64 KiB.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

const READ_CHUNK_SIZE: usize = 8 * 1024;
const INITIAL_LINE_CAPACITY: usize = 64;

/// Result of [`StreamReader::read_exact`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadExact {
    /// Exactly the requested number of bytes.
    Complete(Bytes),
    /// The stream ended after `received.len()` of `wanted` bytes.
    Short { wanted: usize, received: Bytes },
}

impl ReadExact {
    /// Whether all requested bytes arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self, ReadExact::Complete(_))
    }
}

/// Reads text lines and exact-length payloads from one `Read` stream.
///
/// The reader never pulls bytes beyond what the current call needs: lines are
/// read one byte at a time and payload reads are capped at the remaining
/// count. After any call the inner stream sits exactly after the last
/// consumed byte.
pub struct StreamReader<R> {
    inner: R,
    max_line_length: usize,
    position: u64,
}

impl<R: Read> StreamReader<R> {
    /// Create a reader with the default line length limit.
    pub fn new(inner: R) -> Self {
        Self::with_max_line_length(inner, DEFAULT_MAX_LINE_LENGTH)
    }

    /// Create a reader with an explicit line length limit.
    pub fn with_max_line_length(inner: R, max_line_length: usize) -> Self {
        Self {
            inner,
            max_line_length,
            position: 0,
        }
    }

    /// Read the next line without its trailing `\n`.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD. Returns `Ok(None)` only when the
    /// stream ends before any byte of a new line; a final unterminated line is
    /// returned as text.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::with_capacity(INITIAL_LINE_CAPACITY);
        let mut byte = [0u8; 1];

        loop {
            let read = match self.inner.read(&mut byte) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::Io(err)),
            };

            if read == 0 {
                if line.is_empty() {
                    return Ok(None);
                }
                break;
            }

            self.position += 1;
            if byte[0] == b'\n' {
                break;
            }
            if line.len() >= self.max_line_length {
                return Err(StreamError::LineTooLong {
                    max: self.max_line_length,
                });
            }
            line.push(byte[0]);
        }

        Ok(Some(match String::from_utf8(line) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }))
    }

    /// Read exactly `n` bytes, or report how many arrived before the stream ended.
    ///
    /// `read_exact(0)` succeeds immediately without touching the stream.
    pub fn read_exact(&mut self, n: usize) -> Result<ReadExact> {
        if n == 0 {
            return Ok(ReadExact::Complete(Bytes::new()));
        }

        let mut buf = BytesMut::with_capacity(n.min(READ_CHUNK_SIZE * 16));
        let mut chunk = [0u8; READ_CHUNK_SIZE];

        while buf.len() < n {
            let want = (n - buf.len()).min(READ_CHUNK_SIZE);
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::Io(err)),
            };

            if read == 0 {
                trace!(wanted = n, received = buf.len(), "stream ended mid-payload");
                return Ok(ReadExact::Short {
                    wanted: n,
                    received: buf.freeze(),
                });
            }

            self.position += read as u64;
            buf.extend_from_slice(&chunk[..read]);
        }

        Ok(ReadExact::Complete(buf.freeze()))
    }

    /// Consume and drop up to `n` bytes. Returns how many were discarded,
    /// which is less than `n` only if the stream ended.
    pub fn discard_exact(&mut self, n: u64) -> Result<u64> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut discarded = 0u64;

        while discarded < n {
            let want = (n - discarded).min(READ_CHUNK_SIZE as u64) as usize;
            let read = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::Io(err)),
            };
            if read == 0 {
                break;
            }
            self.position += read as u64;
            discarded += read as u64;
        }

        Ok(discarded)
    }

    /// Total bytes consumed from the inner stream.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Current line length limit.
    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> std::fmt::Debug for StreamReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamReader")
            .field("max_line_length", &self.max_line_length)
            .field("position", &self.position)
            .finish()
    }
}
