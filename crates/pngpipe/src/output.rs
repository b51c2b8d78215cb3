use std::collections::BTreeMap;
use std::io::{self, IsTerminal, Stdout};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pngpipe_frame::FrameWriter;
use pngpipe_session::{FrameReport, ProcessExit, SessionEvent, StreamEnd, StreamSummary};
use serde::Serialize;
use tracing::warn;

const EVENT_SCHEMA: &str = "https://schemas.pngpipe.dev/cli/v1/session-event.schema.json";
const SUMMARY_SCHEMA: &str = "https://schemas.pngpipe.dev/cli/v1/session-summary.schema.json";

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per event.
    Json,
    /// A frame table once the stream has ended.
    Table,
    /// One human-readable line per event.
    Pretty,
    /// The validated stream re-emitted on stdout.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
enum EventOutput<'a> {
    Header {
        schema_id: &'static str,
        event: &'static str,
        header: &'a str,
        width: Option<u32>,
        height: Option<u32>,
        fps: Option<f64>,
    },
    Frame {
        schema_id: &'static str,
        event: &'static str,
        index: u64,
        pts: i64,
        size: usize,
        decoded: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<ImageOutput<'a>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Rejected {
        schema_id: &'static str,
        event: &'static str,
        error: String,
    },
    Ended {
        schema_id: &'static str,
        event: &'static str,
        end: &'static str,
        detail: String,
    },
    Exited {
        schema_id: &'static str,
        event: &'static str,
        code: Option<i32>,
        signal: Option<i32>,
        timed_out: bool,
        stderr: &'a str,
    },
}

#[derive(Serialize)]
struct ImageOutput<'a> {
    format: &'a str,
    width: u32,
    height: u32,
    mode: &'static str,
    info: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    schema_id: &'static str,
    header: Option<&'a str>,
    frames: u64,
    decode_failures: u64,
    rejected: u64,
    lines_skipped: u64,
    size_mismatches: u64,
    end: &'static str,
    exit_code: Option<i32>,
}

/// Renders session events in the selected output format.
pub struct Reporter {
    format: OutputFormat,
    rows: Vec<Vec<String>>,
    raw: Option<FrameWriter<Stdout>>,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            rows: Vec::new(),
            raw: (format == OutputFormat::Raw).then(|| FrameWriter::new(io::stdout())),
        }
    }

    pub fn event(&mut self, event: &SessionEvent) {
        match self.format {
            OutputFormat::Json => print_json(&event_output(event)),
            OutputFormat::Pretty => {
                if let Some(line) = pretty_line(event) {
                    println!("{line}");
                }
            }
            OutputFormat::Table => {
                if let SessionEvent::Frame(report) = event {
                    self.rows.push(table_row(report));
                }
            }
            OutputFormat::Raw => self.write_raw(event),
        }
    }

    /// Print anything that waits for the end of the session.
    pub fn finish(&mut self, stream: &StreamSummary, exit: Option<&ProcessExit>) {
        match self.format {
            OutputFormat::Table => self.print_table(stream, exit),
            OutputFormat::Json => print_json(&SummaryOutput {
                schema_id: SUMMARY_SCHEMA,
                header: stream.header.as_ref().map(|h| h.as_str()),
                frames: stream.frames,
                decode_failures: stream.decode_failures,
                rejected: stream.rejected,
                lines_skipped: stream.lines_skipped,
                size_mismatches: stream.size_mismatches,
                end: end_tag(&stream.end),
                exit_code: exit.and_then(|e| e.code),
            }),
            OutputFormat::Pretty | OutputFormat::Raw => {}
        }
    }

    fn write_raw(&mut self, event: &SessionEvent) {
        let Some(writer) = self.raw.as_mut() else {
            return;
        };
        let result = match event {
            SessionEvent::Header(header) => writer.write_header(header.as_str()),
            SessionEvent::Frame(report) => writer.write_frame(report.pts, &report.payload),
            _ => Ok(()),
        };
        if let Err(err) = result {
            warn!(error = %err, "stdout closed, dropping raw output");
            self.raw = None;
        }
    }

    fn print_table(&self, stream: &StreamSummary, exit: Option<&ProcessExit>) {
        if let Some(header) = &stream.header {
            println!("Header: {header}");
        }

        let mut frames = Table::new();
        frames
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["#", "PTS", "SIZE", "RESULT"]);
        for row in &self.rows {
            frames.add_row(row.clone());
        }
        println!("{frames}");

        let mut summary = Table::new();
        summary
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["FRAMES", "FAILED", "REJECTED", "END", "EXIT"])
            .add_row(vec![
                stream.frames.to_string(),
                stream.decode_failures.to_string(),
                stream.rejected.to_string(),
                stream.end.to_string(),
                exit.map(exit_description).unwrap_or_else(|| "-".to_string()),
            ]);
        println!("{summary}");

        if let Some(exit) = exit.filter(|e| !e.success() && !e.stderr.is_empty()) {
            println!("stderr:\n{}", exit.stderr);
        }
    }
}

fn event_output(event: &SessionEvent) -> EventOutput<'_> {
    match event {
        SessionEvent::Header(header) => {
            let fields = header.fields();
            EventOutput::Header {
                schema_id: EVENT_SCHEMA,
                event: "header",
                header: header.as_str(),
                width: fields.width,
                height: fields.height,
                fps: fields.fps(),
            }
        }
        SessionEvent::Frame(report) => {
            let (image, error) = match &report.result {
                Ok(meta) => (
                    Some(ImageOutput {
                        format: &meta.format,
                        width: meta.width,
                        height: meta.height,
                        mode: meta.mode.as_str(),
                        info: &meta.info,
                    }),
                    None,
                ),
                Err(err) => (None, Some(err.to_string())),
            };
            EventOutput::Frame {
                schema_id: EVENT_SCHEMA,
                event: "frame",
                index: report.index,
                pts: report.pts,
                size: report.size,
                decoded: image.is_some(),
                image,
                error,
            }
        }
        SessionEvent::FrameRejected(err) => EventOutput::Rejected {
            schema_id: EVENT_SCHEMA,
            event: "frame_rejected",
            error: err.to_string(),
        },
        SessionEvent::Ended(end) => EventOutput::Ended {
            schema_id: EVENT_SCHEMA,
            event: "ended",
            end: end_tag(end),
            detail: end.to_string(),
        },
        SessionEvent::Exited(exit) => EventOutput::Exited {
            schema_id: EVENT_SCHEMA,
            event: "exited",
            code: exit.code,
            signal: exit.signal,
            timed_out: exit.timed_out,
            stderr: &exit.stderr,
        },
    }
}

/// The line printed for `event` in pretty mode, if any.
pub fn pretty_line(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Header(header) => Some(format!("[HEADER] {header}")),
        SessionEvent::Frame(report) => Some(match &report.result {
            Ok(meta) => format!("[FRAME] PTS={}, {meta}", report.pts),
            Err(err) => format!("[FRAME] PTS={}, Failed to parse PNG: {err}", report.pts),
        }),
        SessionEvent::FrameRejected(err) => Some(format!("[SKIP] {err}")),
        SessionEvent::Ended(end) => match end {
            StreamEnd::Clean => None,
            StreamEnd::NoHeader => Some("No header received, decoder failed?".to_string()),
            StreamEnd::TruncatedPayload { .. } => {
                Some("Unexpected EOF while reading PNG payload".to_string())
            }
            StreamEnd::IncompleteFrameHeader => {
                Some("Unexpected EOF while reading frame header".to_string())
            }
            StreamEnd::MalformedLength { line } => Some(format!(
                "Malformed frame length {line:?}, cannot locate the next frame"
            )),
            StreamEnd::Failed(msg) => Some(format!("Stream error: {msg}")),
        },
        SessionEvent::Exited(exit) if exit.success() => None,
        SessionEvent::Exited(exit) => Some(format!(
            "Decoder {}, stderr:\n{}",
            exit_description(exit),
            exit.stderr
        )),
    }
}

fn exit_description(exit: &ProcessExit) -> String {
    match (exit.code, exit.signal) {
        _ if exit.timed_out => "killed after deadline".to_string(),
        (Some(code), _) => format!("exited with code {code}"),
        (None, Some(signal)) => format!("killed by signal {signal}"),
        (None, None) => "exited abnormally".to_string(),
    }
}

fn table_row(report: &FrameReport) -> Vec<String> {
    let result = match &report.result {
        Ok(meta) => format!("{}x{} {} {}", meta.width, meta.height, meta.mode, meta.info_display()),
        Err(err) => format!("error: {err}"),
    };
    vec![
        report.index.to_string(),
        report.pts.to_string(),
        report.size.to_string(),
        result,
    ]
}

fn end_tag(end: &StreamEnd) -> &'static str {
    match end {
        StreamEnd::Clean => "clean",
        StreamEnd::NoHeader => "no_header",
        StreamEnd::IncompleteFrameHeader => "incomplete_frame_header",
        StreamEnd::TruncatedPayload { .. } => "truncated_payload",
        StreamEnd::MalformedLength { .. } => "malformed_length",
        StreamEnd::Failed(_) => "failed",
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

#[cfg(test)]
mod tests {
    use pngpipe_frame::StreamHeader;
    use pngpipe_inspect::{ColorMode, ImageMetadata, InspectError};

    use super::*;

    fn frame(pts: i64, result: Result<ImageMetadata, InspectError>) -> SessionEvent {
        SessionEvent::Frame(FrameReport {
            index: 0,
            pts,
            size: 4,
            payload: vec![0u8; 4].into(),
            result,
        })
    }

    #[test]
    fn pretty_lines_match_report_wording() {
        let header = SessionEvent::Header(StreamHeader::new("PXY4M W2 H2 F25/1 Crgba Enc:png"));
        assert_eq!(
            pretty_line(&header).as_deref(),
            Some("[HEADER] PXY4M W2 H2 F25/1 Crgba Enc:png")
        );

        let ok = frame(
            40,
            Ok(ImageMetadata {
                format: "PNG".into(),
                width: 2,
                height: 2,
                mode: ColorMode::Rgba,
                info: BTreeMap::new(),
            }),
        );
        assert_eq!(
            pretty_line(&ok).as_deref(),
            Some("[FRAME] PTS=40, PNG: 2x2, mode=RGBA, info={}")
        );

        let bad = frame(1000, Err(InspectError::UnknownFormat));
        assert_eq!(
            pretty_line(&bad).as_deref(),
            Some("[FRAME] PTS=1000, Failed to parse PNG: cannot identify image format")
        );
    }

    #[test]
    fn pretty_end_and_exit_lines() {
        let no_header = SessionEvent::Ended(StreamEnd::NoHeader);
        assert_eq!(
            pretty_line(&no_header).as_deref(),
            Some("No header received, decoder failed?")
        );
        assert_eq!(pretty_line(&SessionEvent::Ended(StreamEnd::Clean)), None);
        assert_eq!(
            pretty_line(&SessionEvent::Ended(StreamEnd::IncompleteFrameHeader)).as_deref(),
            Some("Unexpected EOF while reading frame header")
        );
        assert_eq!(
            pretty_line(&SessionEvent::Ended(StreamEnd::Failed("broken pipe".into()))).as_deref(),
            Some("Stream error: broken pipe")
        );
        assert_eq!(
            pretty_line(&SessionEvent::Ended(StreamEnd::MalformedLength {
                line: "BYTES lots".into()
            }))
            .as_deref(),
            Some("Malformed frame length \"BYTES lots\", cannot locate the next frame")
        );

        let failed = SessionEvent::Exited(ProcessExit {
            code: Some(1),
            signal: None,
            timed_out: false,
            stderr: "bad input\n".into(),
        });
        assert_eq!(
            pretty_line(&failed).as_deref(),
            Some("Decoder exited with code 1, stderr:\nbad input\n")
        );
    }

    #[test]
    fn json_events_carry_schema_and_tag() {
        let bad = frame(1000, Err(InspectError::UnknownFormat));
        let value = serde_json::to_value(event_output(&bad)).unwrap();
        assert_eq!(value["schema_id"], EVENT_SCHEMA);
        assert_eq!(value["event"], "frame");
        assert_eq!(value["pts"], 1000);
        assert_eq!(value["decoded"], false);
        assert_eq!(value["error"], "cannot identify image format");
        assert!(value.get("image").is_none());
    }
}
