use std::fs;
use std::io;

use pngpipe_frame::FrameWriter;
use pngpipe_inspect::{ColorMode, Inspector};
use tracing::debug;

use crate::cmd::PackArgs;
use crate::exit::{
    frame_error, inspect_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE,
};

pub fn run(args: PackArgs) -> CliResult<i32> {
    if !args.fps.is_finite() || args.fps <= 0.0 {
        return Err(CliError::new(USAGE, "fps must be greater than zero"));
    }

    let inspector = Inspector::new();
    let stdout = io::stdout();
    let mut writer = FrameWriter::new(stdout.lock());
    let mut expected = None;

    for (pts, path) in args.pngs.iter().enumerate() {
        let context = path.display().to_string();
        let bytes = fs::read(path).map_err(|err| io_error(&context, err))?;
        let meta = inspector
            .inspect(&bytes)
            .map_err(|err| inspect_error(&context, err))?;

        match expected {
            None => {
                let header = header_line(meta.width, meta.height, args.fps, meta.mode);
                writer
                    .write_header(&header)
                    .map_err(|err| frame_error("write failed", err))?;
                expected = Some((meta.width, meta.height));
            }
            Some((width, height)) if (width, height) != (meta.width, meta.height) => {
                return Err(CliError::new(
                    DATA_INVALID,
                    format!(
                        "{context}: frame size mismatch: expected {width}x{height}, got {}x{}",
                        meta.width, meta.height
                    ),
                ));
            }
            Some(_) => {}
        }

        writer
            .write_frame(pts as i64, &bytes)
            .map_err(|err| frame_error("write failed", err))?;
        debug!(pts, size = bytes.len(), path = %context, "frame packed");
    }

    Ok(SUCCESS)
}

fn header_line(width: u32, height: u32, fps: f32, mode: ColorMode) -> String {
    let (num, den) = fps_to_rational(fps);
    format!(
        "PXY4M W{width} H{height} F{num}/{den} C{} Enc:png",
        mode.as_str().to_ascii_lowercase()
    )
}

/// Whole rates become `n/1`; others are rounded to millis and reduced.
fn fps_to_rational(fps: f32) -> (u32, u32) {
    if fps.fract().abs() < 1e-6 {
        return (fps.round() as u32, 1);
    }
    let den = 1000u32;
    let num = (fps * den as f32).round() as u32;
    let g = gcd(num, den);
    (num / g, den / g)
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_rates_stay_whole() {
        assert_eq!(fps_to_rational(25.0), (25, 1));
        assert_eq!(fps_to_rational(60.0), (60, 1));
    }

    #[test]
    fn fractional_rates_reduce() {
        assert_eq!(fps_to_rational(29.97), (2997, 100));
        assert_eq!(fps_to_rational(12.5), (25, 2));
    }

    #[test]
    fn header_carries_dimensions_and_mode() {
        assert_eq!(
            header_line(640, 480, 25.0, ColorMode::Rgba),
            "PXY4M W640 H480 F25/1 Crgba Enc:png"
        );
    }
}
