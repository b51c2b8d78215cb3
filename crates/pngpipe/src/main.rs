mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "pngpipe", version, about = "Inspect piped PNG frame streams")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inspect_subcommand() {
        let cli = Cli::try_parse_from([
            "pngpipe",
            "inspect",
            "clip.omv",
            "--decoder",
            "/usr/local/bin/decoder",
            "--timeout",
            "3s",
            "--verify",
        ])
        .expect("inspect args should parse");

        match cli.command {
            Command::Inspect(args) => {
                assert_eq!(args.decoder_format, "piped-png");
                assert_eq!(args.timeout.as_deref(), Some("3s"));
                assert!(args.stream.verify);
            }
            other => panic!("expected inspect, got {other:?}"),
        }
    }

    #[test]
    fn read_file_is_optional() {
        let cli = Cli::try_parse_from(["pngpipe", "--format", "json", "read"])
            .expect("read args should parse");
        assert!(matches!(cli.command, Command::Read(ref args) if args.file.is_none()));
        assert_eq!(cli.format, Some(OutputFormat::Json));
    }

    #[test]
    fn pack_requires_files() {
        let err = Cli::try_parse_from(["pngpipe", "pack"]).expect_err("pack needs inputs");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }
}
