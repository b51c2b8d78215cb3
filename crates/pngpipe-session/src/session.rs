use std::fmt;
use std::io::Read;

use bytes::Bytes;
use pngpipe_frame::{Frame, FrameError, FrameReader, StreamHeader};
use pngpipe_inspect::{ImageMetadata, InspectError, Inspector};
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::supervisor::{DecoderProcess, ProcessExit};

/// Outcome of inspecting one complete frame.
#[derive(Debug)]
pub struct FrameReport {
    /// Zero-based position among complete frames.
    pub index: u64,
    pub pts: i64,
    /// Payload length in bytes.
    pub size: usize,
    pub payload: Bytes,
    pub result: std::result::Result<ImageMetadata, InspectError>,
}

impl FrameReport {
    fn inspect(frame: &Frame, inspector: &Inspector) -> Self {
        Self {
            index: frame.index,
            pts: frame.pts,
            size: frame.payload.len(),
            payload: frame.payload.clone(),
            result: inspector.inspect(&frame.payload),
        }
    }
}

/// How the frame stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// End of stream at a record boundary.
    Clean,
    /// Nothing was produced, not even a header.
    NoHeader,
    /// The stream ended between a frame marker and its length line.
    IncompleteFrameHeader,
    /// The stream ended inside a payload.
    TruncatedPayload {
        pts: Option<i64>,
        declared: u64,
        received: u64,
    },
    /// A length line could not be parsed, so the next record cannot be found.
    MalformedLength { line: String },
    /// Reading failed for another reason.
    Failed(String),
}

impl StreamEnd {
    pub fn is_clean(&self) -> bool {
        matches!(self, StreamEnd::Clean)
    }
}

impl From<FrameError> for StreamEnd {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::NoHeader => StreamEnd::NoHeader,
            FrameError::IncompleteFrameHeader => StreamEnd::IncompleteFrameHeader,
            FrameError::TruncatedPayload {
                pts,
                declared,
                received,
            } => StreamEnd::TruncatedPayload {
                pts,
                declared,
                received,
            },
            FrameError::MalformedLength { line } => StreamEnd::MalformedLength { line },
            other => StreamEnd::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for StreamEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamEnd::Clean => f.write_str("end of stream"),
            StreamEnd::NoHeader => f.write_str("no header received"),
            StreamEnd::IncompleteFrameHeader => f.write_str("stream ended inside a frame header"),
            StreamEnd::TruncatedPayload {
                declared, received, ..
            } => write!(f, "payload truncated: {received} of {declared} bytes"),
            StreamEnd::MalformedLength { line } => write!(f, "malformed length line: {line:?}"),
            StreamEnd::Failed(msg) => write!(f, "stream failed: {msg}"),
        }
    }
}

/// Something observable happened in the session, in stream order.
#[derive(Debug)]
pub enum SessionEvent {
    Header(StreamHeader),
    Frame(FrameReport),
    /// A frame record was malformed or oversized and skipped.
    FrameRejected(FrameError),
    /// The stream reached a terminal state. Emitted exactly once.
    Ended(StreamEnd),
    /// The decoder exited. Always the last event of a [`Session`].
    Exited(ProcessExit),
}

/// Counters for one consumed stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub header: Option<StreamHeader>,
    /// Complete frames handed to the inspector.
    pub frames: u64,
    /// Frames the inspector could not decode.
    pub decode_failures: u64,
    /// Records skipped for malformed metadata or size.
    pub rejected: u64,
    /// Unrecognised lines skipped between records.
    pub lines_skipped: u64,
    /// Decoded frames whose size differs from the header's.
    pub size_mismatches: u64,
    pub end: StreamEnd,
}

impl StreamSummary {
    fn new(header: Option<StreamHeader>, end: StreamEnd) -> Self {
        Self {
            header,
            frames: 0,
            decode_failures: 0,
            rejected: 0,
            lines_skipped: 0,
            size_mismatches: 0,
            end,
        }
    }
}

/// Read `reader` to a terminal state, inspecting each complete frame before
/// the next line is read.
///
/// The reader is dropped before returning, which closes a pipe the producer
/// may still be writing to.
pub fn drive<R, F>(
    mut reader: FrameReader<R>,
    inspector: &Inspector,
    mut on_event: F,
) -> StreamSummary
where
    R: Read,
    F: FnMut(&SessionEvent),
{
    let header = match reader.read_header() {
        Ok(header) => header,
        Err(err) => {
            let end = StreamEnd::from(err);
            on_event(&SessionEvent::Ended(end.clone()));
            return StreamSummary::new(None, end);
        }
    };
    on_event(&SessionEvent::Header(header.clone()));

    let declared = header.fields().dimensions();
    let mut summary = StreamSummary::new(Some(header), StreamEnd::Clean);

    let end = loop {
        match reader.read_frame() {
            Ok(Some(frame)) => {
                let report = FrameReport::inspect(&frame, inspector);
                summary.frames += 1;
                match &report.result {
                    Ok(meta) => {
                        debug!(
                            index = report.index,
                            pts = report.pts,
                            size = report.size,
                            "frame inspected"
                        );
                        if let Some((width, height)) = declared {
                            if (meta.width, meta.height) != (width, height) {
                                summary.size_mismatches += 1;
                                warn!(
                                    pts = report.pts,
                                    header_width = width,
                                    header_height = height,
                                    width = meta.width,
                                    height = meta.height,
                                    "frame size differs from header"
                                );
                            }
                        }
                    }
                    Err(err) => {
                        summary.decode_failures += 1;
                        warn!(
                            pts = report.pts,
                            error = %err,
                            "frame payload could not be decoded"
                        );
                    }
                }
                on_event(&SessionEvent::Frame(report));
            }
            Ok(None) => break StreamEnd::Clean,
            Err(err) if !err.is_terminal() => {
                summary.rejected += 1;
                warn!(error = %err, "frame record rejected");
                on_event(&SessionEvent::FrameRejected(err));
            }
            Err(err) => break StreamEnd::from(err),
        }
    };

    summary.lines_skipped = reader.lines_skipped();
    summary.end = end.clone();
    on_event(&SessionEvent::Ended(end));
    summary
}

/// Result of a full decoder session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub stream: StreamSummary,
    pub exit: ProcessExit,
}

/// Spawns a decoder and consumes its output.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    inspector: Inspector,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        let inspector = Inspector::with_config(config.inspect);
        Self { config, inspector }
    }

    /// Current session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start the decoder without consuming it yet, so callers can grab a
    /// [`KillHandle`](crate::KillHandle) first.
    pub fn spawn(&self) -> Result<DecoderProcess> {
        DecoderProcess::spawn(&self.config.decoder)
    }

    /// Spawn the decoder and run it to completion.
    pub fn run<F>(&self, on_event: F) -> Result<SessionReport>
    where
        F: FnMut(&SessionEvent),
    {
        let process = self.spawn()?;
        self.run_process(process, on_event)
    }

    /// Consume an already spawned decoder.
    ///
    /// Only spawn or wait failures are errors; every stream condition ends up
    /// in the report. [`SessionEvent::Exited`] is emitted last.
    pub fn run_process<F>(
        &self,
        mut process: DecoderProcess,
        mut on_event: F,
    ) -> Result<SessionReport>
    where
        F: FnMut(&SessionEvent),
    {
        let stdout = process
            .take_stdout()
            .ok_or(SessionError::StdoutUnavailable)?;
        let reader = FrameReader::with_config(stdout, self.config.frame.clone());
        let stream = drive(reader, &self.inspector, &mut on_event);

        let exit = process.wait()?;
        on_event(&SessionEvent::Exited(exit.clone()));
        Ok(SessionReport { stream, exit })
    }
}
