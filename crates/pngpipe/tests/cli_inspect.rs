#![cfg(all(unix, feature = "cli"))]

use std::io::Cursor;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat};
use pngpipe::frame::FrameWriter;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/pngpipe-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

/// A stand-in decoder: a shell script that ignores its flags.
fn decoder(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("decoder.sh");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("script should be written");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("script should be executable");
    path
}

fn stream_file(dir: &Path) -> PathBuf {
    let mut png = Cursor::new(Vec::new());
    DynamicImage::new_rgba8(3, 2)
        .write_to(&mut png, ImageFormat::Png)
        .expect("png should encode");

    let mut writer = FrameWriter::new(Vec::new());
    writer
        .write_header("PXY4M W3 H2 F30/1 Crgba Enc:png")
        .expect("header");
    writer.write_frame(0, png.get_ref()).expect("frame");
    writer.write_frame(1, png.get_ref()).expect("frame");

    let path = dir.join("stream.bin");
    std::fs::write(&path, writer.into_inner()).expect("stream should be written");
    path
}

fn inspect(decoder: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pngpipe"))
        .args(["--log-level", "error", "--format", "pretty", "inspect", "input.omv"])
        .arg("--decoder")
        .arg(decoder)
        .args(extra)
        .env_remove("PNGPIPE_DECODER")
        .output()
        .expect("inspect should run")
}

#[test]
fn reports_every_frame_from_decoder() {
    let dir = unique_temp_dir("inspect-ok");
    let stream = stream_file(&dir);
    let program = decoder(&dir, &format!("cat '{}'", stream.display()));

    let output = inspect(&program, &[]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "[HEADER] PXY4M W3 H2 F30/1 Crgba Enc:png\n\
         [FRAME] PTS=0, PNG: 3x2, mode=RGBA, info={}\n\
         [FRAME] PTS=1, PNG: 3x2, mode=RGBA, info={}\n"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decoder_receives_invocation_flags() {
    let dir = unique_temp_dir("inspect-args");
    let args_file = dir.join("args.txt");
    let program = decoder(
        &dir,
        &format!("printf '%s ' \"$@\" > '{}'\nprintf 'v1\\n'", args_file.display()),
    );

    let output = inspect(&program, &["--decoder-format", "piped-png"]);

    assert!(output.status.success());
    assert_eq!(
        std::fs::read_to_string(&args_file).expect("args should be recorded"),
        "--input input.omv --output dummy --format piped-png "
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn decoder_failure_is_reported_after_frames() {
    let dir = unique_temp_dir("inspect-fail");
    let stream = stream_file(&dir);
    let program = decoder(
        &dir,
        &format!("cat '{}'\necho 'omv: bad chunk' >&2\nexit 1", stream.display()),
    );

    let output = inspect(&program, &[]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("[HEADER] "));
    assert!(stdout.ends_with("[FRAME] PTS=1, PNG: 3x2, mode=RGBA, info={}\nDecoder exited with code 1, stderr:\nomv: bad chunk\n\n"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn silent_decoder_means_no_header() {
    let dir = unique_temp_dir("inspect-silent");
    let program = decoder(&dir, "exit 0");

    let output = inspect(&program, &[]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "No header received, decoder failed?\n"
    );
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn hung_decoder_times_out_with_124() {
    let dir = unique_temp_dir("inspect-timeout");
    let program = decoder(&dir, "printf 'v1\\n'\nexec sleep 30");

    let started = Instant::now();
    let output = inspect(&program, &["--timeout", "300ms"]);

    assert_eq!(output.status.code(), Some(124));
    assert!(started.elapsed() < Duration::from_secs(10));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_decoder_returns_125() {
    let output = inspect(Path::new("/nonexistent/pngpipe-decoder"), &[]);

    assert_eq!(output.status.code(), Some(125));
    assert!(String::from_utf8_lossy(&output.stderr).contains("decoder start failed"));
}

#[test]
fn json_output_ends_with_exit_event_and_summary() {
    let dir = unique_temp_dir("inspect-json");
    let stream = stream_file(&dir);
    let program = decoder(&dir, &format!("cat '{}'", stream.display()));

    let output = Command::new(env!("CARGO_BIN_EXE_pngpipe"))
        .args(["--format", "json", "inspect", "input.omv", "--decoder"])
        .arg(&program)
        .output()
        .expect("inspect should run");

    assert!(output.status.success());
    let events: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be json"))
        .collect();
    let kinds: Vec<&str> = events
        .iter()
        .filter_map(|e| e.get("event").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(kinds, vec!["header", "frame", "frame", "ended", "exited"]);
    assert_eq!(events[0]["width"], 3);
    assert_eq!(events[0]["fps"], 30.0);
    assert_eq!(events.last().map(|s| &s["exit_code"]), Some(&serde_json::json!(0)));
    let _ = std::fs::remove_dir_all(&dir);
}
