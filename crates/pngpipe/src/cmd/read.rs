use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use pngpipe_frame::FrameReader;
use pngpipe_inspect::Inspector;
use pngpipe_session::{drive, SessionEvent};

use crate::cmd::ReadArgs;
use crate::exit::{io_error, report_code, CliResult};
use crate::output::{OutputFormat, Reporter};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let input: Box<dyn Read> = match args.file.as_deref() {
        None => Box::new(io::stdin().lock()),
        Some(path) if path == Path::new("-") => Box::new(io::stdin().lock()),
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("cannot open {}", path.display()), err))?,
        ),
    };

    let reader = FrameReader::with_config(input, args.stream.frame_config());
    let inspector = Inspector::with_config(args.stream.inspect_config());

    let mut reporter = Reporter::new(format);
    let summary = drive(reader, &inspector, |event: &SessionEvent| {
        reporter.event(event)
    });
    reporter.finish(&summary, None);

    Ok(report_code(&summary, None))
}
