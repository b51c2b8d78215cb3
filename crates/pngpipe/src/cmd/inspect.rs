use pngpipe_session::{DecoderConfig, Session, SessionConfig, SessionEvent};
use tracing::info;

use crate::cmd::{parse_duration, InspectArgs};
use crate::exit::{report_code, session_error, CliError, CliResult, INTERNAL};
use crate::output::{OutputFormat, Reporter};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let mut decoder =
        DecoderConfig::new(&args.decoder, &args.input).with_format(&args.decoder_format);
    if let Some(timeout) = &args.timeout {
        decoder = decoder.with_deadline(parse_duration(timeout)?);
    }

    let session = Session::new(SessionConfig {
        decoder,
        frame: args.stream.frame_config(),
        inspect: args.stream.inspect_config(),
    });

    let process = session
        .spawn()
        .map_err(|err| session_error("decoder start failed", err))?;
    let kill = process.kill_handle();
    ctrlc::set_handler(move || {
        info!("interrupted, stopping decoder");
        let _ = kill.kill();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;

    let mut reporter = Reporter::new(format);
    let report = session
        .run_process(process, |event: &SessionEvent| reporter.event(event))
        .map_err(|err| session_error("decoder session failed", err))?;
    reporter.finish(&report.stream, Some(&report.exit));

    Ok(report_code(&report.stream, Some(&report.exit)))
}
