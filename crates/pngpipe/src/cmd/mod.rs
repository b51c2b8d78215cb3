use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use pngpipe_frame::{FrameConfig, DEFAULT_MAX_PAYLOAD};
use pngpipe_inspect::InspectConfig;
use pngpipe_session::DEFAULT_DECODER_FORMAT;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod inspect;
pub mod pack;
pub mod read;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a decoder on an input file and inspect every frame it emits.
    Inspect(InspectArgs),
    /// Inspect an already captured stream from a file or stdin.
    Read(ReadArgs),
    /// Write a frame stream built from PNG files to stdout.
    Pack(PackArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Inspect(args) => inspect::run(args, format),
        Command::Read(args) => read::run(args, format),
        Command::Pack(args) => pack::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Options shared by every command that consumes a stream.
#[derive(Args, Debug)]
pub struct StreamArgs {
    /// Decode full pixel data, not just headers.
    #[arg(long)]
    pub verify: bool,
    /// Largest accepted payload in bytes.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_PAYLOAD)]
    pub max_payload: usize,
}

impl StreamArgs {
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            max_payload_size: self.max_payload,
            ..FrameConfig::default()
        }
    }

    pub fn inspect_config(&self) -> InspectConfig {
        InspectConfig {
            verify_pixels: self.verify,
        }
    }
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Input file handed to the decoder.
    pub input: PathBuf,
    /// Decoder executable.
    #[arg(long, env = "PNGPIPE_DECODER", value_name = "PATH")]
    pub decoder: PathBuf,
    /// Value passed to the decoder's --format flag.
    #[arg(long, value_name = "FORMAT", default_value = DEFAULT_DECODER_FORMAT)]
    pub decoder_format: String,
    /// Kill the decoder after this long (e.g. 30s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Captured stream file. Reads stdin when omitted or `-`.
    pub file: Option<PathBuf>,
    #[command(flatten)]
    pub stream: StreamArgs,
}

#[derive(Args, Debug)]
pub struct PackArgs {
    /// PNG files, one frame each, in order.
    #[arg(required = true)]
    pub pngs: Vec<PathBuf>,
    /// Frame rate written to the header.
    #[arg(long, default_value_t = 25.0)]
    pub fps: f32,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else {
        (input.strip_suffix('s').unwrap_or(input), false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
