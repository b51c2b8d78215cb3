use std::fmt;
use std::io;

use pngpipe_frame::FrameError;
use pngpipe_inspect::InspectError;
use pngpipe_session::{ProcessExit, SessionError, StreamEnd, StreamSummary};

pub const SUCCESS: i32 = 0;
/// Decoder exited unsuccessfully or produced no header.
pub const FAILURE: i32 = 1;
/// Stream ended inside a frame.
pub const STREAM_TRUNCATED: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
/// Protocol violations or undecodable payloads.
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => USAGE,
        io::ErrorKind::TimedOut => TIMEOUT,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidHeader => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn inspect_error(context: &str, err: InspectError) -> CliError {
    match err {
        InspectError::Io(source) => io_error(context, source),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Spawn { source, .. } if source.kind() != io::ErrorKind::NotFound => {
            io_error(context, source)
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

/// Exit code for a finished stream, most severe condition first.
pub fn report_code(stream: &StreamSummary, exit: Option<&ProcessExit>) -> i32 {
    if exit.is_some_and(|e| e.timed_out) {
        return TIMEOUT;
    }
    if exit.is_some_and(|e| !e.success()) {
        return FAILURE;
    }
    match stream.end {
        StreamEnd::NoHeader => FAILURE,
        StreamEnd::IncompleteFrameHeader | StreamEnd::TruncatedPayload { .. } => STREAM_TRUNCATED,
        StreamEnd::MalformedLength { .. } | StreamEnd::Failed(_) => DATA_INVALID,
        StreamEnd::Clean if stream.rejected > 0 || stream.decode_failures > 0 => DATA_INVALID,
        StreamEnd::Clean => SUCCESS,
    }
}

#[cfg(test)]
mod tests {
    use pngpipe_frame::StreamHeader;

    use super::*;

    fn summary(end: StreamEnd) -> StreamSummary {
        StreamSummary {
            header: Some(StreamHeader::new("v1")),
            frames: 2,
            decode_failures: 0,
            rejected: 0,
            lines_skipped: 0,
            size_mismatches: 0,
            end,
        }
    }

    fn exit(code: Option<i32>, timed_out: bool) -> ProcessExit {
        ProcessExit {
            code,
            signal: None,
            timed_out,
            stderr: String::new(),
        }
    }

    #[test]
    fn clean_stream_is_success() {
        assert_eq!(report_code(&summary(StreamEnd::Clean), None), SUCCESS);
        assert_eq!(
            report_code(&summary(StreamEnd::Clean), Some(&exit(Some(0), false))),
            SUCCESS
        );
    }

    #[test]
    fn stream_conditions_map_to_codes() {
        assert_eq!(report_code(&summary(StreamEnd::NoHeader), None), FAILURE);
        assert_eq!(
            report_code(&summary(StreamEnd::IncompleteFrameHeader), None),
            STREAM_TRUNCATED
        );
        assert_eq!(
            report_code(
                &summary(StreamEnd::MalformedLength {
                    line: "BYTES x".into()
                }),
                None
            ),
            DATA_INVALID
        );
        let mut failures = summary(StreamEnd::Clean);
        failures.decode_failures = 1;
        assert_eq!(report_code(&failures, None), DATA_INVALID);
    }

    #[test]
    fn process_exit_takes_precedence() {
        let truncated = summary(StreamEnd::TruncatedPayload {
            pts: Some(3),
            declared: 10,
            received: 6,
        });
        assert_eq!(report_code(&truncated, Some(&exit(Some(1), false))), FAILURE);
        assert_eq!(report_code(&truncated, Some(&exit(None, true))), TIMEOUT);
    }

    #[test]
    fn missing_decoder_is_internal() {
        let err = SessionError::Spawn {
            program: "/nope".into(),
            source: io::ErrorKind::NotFound.into(),
        };
        assert_eq!(session_error("spawn", err).code, INTERNAL);

        let denied = SessionError::Spawn {
            program: "/nope".into(),
            source: io::ErrorKind::PermissionDenied.into(),
        };
        assert_eq!(session_error("spawn", denied).code, PERMISSION_DENIED);
    }
}
