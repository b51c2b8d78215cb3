use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use pngpipe_frame::FrameConfig;
use pngpipe_inspect::InspectConfig;

/// Value passed to `--output`; the decoder writes to stdout regardless.
pub const DEFAULT_OUTPUT_PLACEHOLDER: &str = "dummy";

/// Value passed to `--format`.
pub const DEFAULT_DECODER_FORMAT: &str = "piped-png";

/// How to launch the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Decoder executable.
    pub program: PathBuf,
    /// Input file handed to the decoder.
    pub input: PathBuf,
    pub output_placeholder: String,
    pub format: String,
    /// Kill the decoder once this much time has passed since spawn.
    pub deadline: Option<Duration>,
}

impl DecoderConfig {
    pub fn new(program: impl Into<PathBuf>, input: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            input: input.into(),
            output_placeholder: DEFAULT_OUTPUT_PLACEHOLDER.to_string(),
            format: DEFAULT_DECODER_FORMAT.to_string(),
            deadline: None,
        }
    }

    /// Set the decoder `--format` value.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the deadline after which the decoder is killed.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Command-line arguments, in order:
    /// `--input <input> --output <placeholder> --format <format>`.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "--input".into(),
            self.input.clone().into_os_string(),
            "--output".into(),
            self.output_placeholder.clone().into(),
            "--format".into(),
            self.format.clone().into(),
        ]
    }
}

/// Everything a [`Session`](crate::Session) needs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub decoder: DecoderConfig,
    pub frame: FrameConfig,
    pub inspect: InspectConfig,
}

impl SessionConfig {
    /// Default frame and inspect settings for `decoder`.
    pub fn new(decoder: DecoderConfig) -> Self {
        Self {
            decoder,
            frame: FrameConfig::default(),
            inspect: InspectConfig::default(),
        }
    }
}
