use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::{encode_frame, encode_header};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes the header and frame records to any `Write` stream.
pub struct FrameWriter<W> {
    inner: W,
    buf: BytesMut,
    header_written: bool,
    frames_written: u64,
}

impl<W: Write> FrameWriter<W> {
    /// Create a new frame writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            header_written: false,
            frames_written: 0,
        }
    }

    /// Write the header line. Must be called exactly once, before any frame.
    pub fn write_header(&mut self, header: &str) -> Result<()> {
        if self.header_written {
            return Err(FrameError::HeaderAlreadySent);
        }

        self.buf.clear();
        encode_header(header, &mut self.buf)?;
        self.write_buf()?;
        self.header_written = true;
        Ok(())
    }

    /// Encode and write one frame record (blocking).
    pub fn write_frame(&mut self, pts: i64, payload: &[u8]) -> Result<()> {
        if !self.header_written {
            return Err(FrameError::HeaderPending);
        }

        self.buf.clear();
        encode_frame(pts, payload, &mut self.buf);
        self.write_buf()?;
        self.frames_written += 1;
        Ok(())
    }

    fn write_buf(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Number of frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> W {
        self.inner
    }
}
