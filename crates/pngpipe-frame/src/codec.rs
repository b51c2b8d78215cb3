use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use pngpipe_stream::DEFAULT_MAX_LINE_LENGTH;

use crate::error::{FrameError, Result};

/// Line prefix that opens a frame record.
pub const FRAME_MARKER: &str = "FRAME";

/// Label written before the presentation timestamp.
pub const PTS_LABEL: &str = "PTS";

/// Label written before the payload length.
pub const BYTES_LABEL: &str = "BYTES";

/// Default maximum payload size: 256 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 256 * 1024 * 1024;

/// A complete frame record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based position among the complete frames of this stream.
    pub index: u64,
    /// Presentation timestamp as declared by the decoder.
    pub pts: i64,
    /// Exactly the declared number of payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(index: u64, pts: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            index,
            pts,
            payload: payload.into(),
        }
    }

    /// The total wire size of this frame (metadata lines + payload).
    pub fn wire_size(&self) -> usize {
        frame_preamble(self.pts, self.payload.len()).len() + self.payload.len()
    }
}

/// Whether a line opens a frame record.
pub fn is_frame_marker(line: &str) -> bool {
    line.starts_with(FRAME_MARKER)
}

/// Parse a `<label> <integer>` metadata line.
///
/// Everything after the first space is the value. Surrounding ASCII
/// whitespace is ignored; anything else that is not a base-10 integer is
/// [`FrameError::MalformedField`].
pub fn parse_labeled_int<T: FromStr>(field: &'static str, line: &str) -> Result<T> {
    let malformed = || FrameError::MalformedField {
        field,
        line: line.to_string(),
    };
    let (_, value) = line.split_once(' ').ok_or_else(malformed)?;
    value.trim().parse::<T>().map_err(|_| malformed())
}

/// Encode the header line.
pub fn encode_header(header: &str, dst: &mut BytesMut) -> Result<()> {
    if header.contains('\n') {
        return Err(FrameError::InvalidHeader);
    }
    dst.reserve(header.len() + 1);
    dst.put_slice(header.as_bytes());
    dst.put_u8(b'\n');
    Ok(())
}

/// Encode a frame record into the wire format.
///
/// Wire format:
/// ```text
/// FRAME\n
/// PTS <pts>\n
/// BYTES <len>\n
/// <len raw bytes>
/// ```
pub fn encode_frame(pts: i64, payload: &[u8], dst: &mut BytesMut) {
    let preamble = frame_preamble(pts, payload.len());
    dst.reserve(preamble.len() + payload.len());
    dst.put_slice(preamble.as_bytes());
    dst.put_slice(payload);
}

fn frame_preamble(pts: i64, len: usize) -> String {
    format!("{FRAME_MARKER}\n{PTS_LABEL} {pts}\n{BYTES_LABEL} {len}\n")
}

/// Configuration for the frame reader.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 256 MiB.
    pub max_payload_size: usize,
    /// Maximum length of a text line in bytes. Default: 64 KiB.
    pub max_line_length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_frame_layout() {
        let mut buf = BytesMut::new();
        encode_frame(1000, &[0, 0, 0, 0], &mut buf);
        assert_eq!(buf.as_ref(), b"FRAME\nPTS 1000\nBYTES 4\n\0\0\0\0");
    }

    #[test]
    fn encode_header_appends_newline() {
        let mut buf = BytesMut::new();
        encode_header("v1", &mut buf).unwrap();
        assert_eq!(buf.as_ref(), b"v1\n");
    }

    #[test]
    fn encode_header_rejects_newline() {
        let mut buf = BytesMut::new();
        let err = encode_header("a\nb", &mut buf).unwrap_err();
        assert!(matches!(err, FrameError::InvalidHeader));
        assert!(buf.is_empty());
    }

    #[test]
    fn parse_labeled_int_takes_text_after_first_space() {
        assert_eq!(parse_labeled_int::<i64>("pts", "PTS 1000").unwrap(), 1000);
        assert_eq!(parse_labeled_int::<i64>("pts", "PTS -3").unwrap(), -3);
        assert_eq!(parse_labeled_int::<u64>("length", "anything 42").unwrap(), 42);
        assert_eq!(parse_labeled_int::<u64>("length", "BYTES 7\r").unwrap(), 7);
    }

    #[test]
    fn parse_labeled_int_rejects_garbage() {
        for line in ["PTS", "PTS ", "PTS abc", "PTS 1 2", "BYTES 0x10"] {
            let err = parse_labeled_int::<i64>("pts", line).unwrap_err();
            assert!(
                matches!(&err, FrameError::MalformedField { field: "pts", line: l } if l == line),
                "{line:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn parse_labeled_int_rejects_negative_length() {
        assert!(parse_labeled_int::<u64>("length", "BYTES -1").is_err());
    }

    #[test]
    fn frame_marker_is_a_prefix_match() {
        assert!(is_frame_marker("FRAME"));
        assert!(is_frame_marker("FRAME 12"));
        assert!(!is_frame_marker("frame"));
        assert!(!is_frame_marker(" FRAME"));
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(0, 5, Bytes::from_static(b"test"));
        assert_eq!(frame.wire_size(), "FRAME\nPTS 5\nBYTES 4\n".len() + 4);
    }
}
