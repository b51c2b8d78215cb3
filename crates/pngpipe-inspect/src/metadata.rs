use std::collections::BTreeMap;
use std::fmt;

use image::ColorType;

/// Pixel layout of a decoded payload, displayed with the conventional short
/// mode tags (`L`, `RGBA`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorMode {
    /// 1-bit grayscale.
    Bilevel,
    Gray,
    Gray16,
    GrayAlpha,
    Palette,
    Rgb,
    Rgba,
    Unknown,
}

impl ColorMode {
    /// Mode from a PNG IHDR colour type and bit depth.
    pub fn from_png(color_type: u8, bit_depth: u8) -> Self {
        match (color_type, bit_depth) {
            (0, 1) => ColorMode::Bilevel,
            (0, 16) => ColorMode::Gray16,
            (0, _) => ColorMode::Gray,
            (2, _) => ColorMode::Rgb,
            (3, _) => ColorMode::Palette,
            (4, _) => ColorMode::GrayAlpha,
            (6, _) => ColorMode::Rgba,
            _ => ColorMode::Unknown,
        }
    }

    /// The tag used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ColorMode::Bilevel => "1",
            ColorMode::Gray => "L",
            ColorMode::Gray16 => "I;16",
            ColorMode::GrayAlpha => "LA",
            ColorMode::Palette => "P",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
            ColorMode::Unknown => "unknown",
        }
    }
}

impl From<ColorType> for ColorMode {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => ColorMode::Gray,
            ColorType::L16 => ColorMode::Gray16,
            ColorType::La8 | ColorType::La16 => ColorMode::GrayAlpha,
            ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => ColorMode::Rgb,
            ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
            _ => ColorMode::Unknown,
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Facts about one successfully decoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Upper-case format name, e.g. `PNG`.
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    /// Auxiliary key/value facts such as text chunks, gamma or dpi.
    pub info: BTreeMap<String, String>,
}

impl ImageMetadata {
    /// `{key: value, ...}` rendering of [`ImageMetadata::info`].
    pub fn info_display(&self) -> String {
        let entries: Vec<String> = self
            .info
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        format!("{{{}}}", entries.join(", "))
    }
}

impl fmt::Display for ImageMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}x{}, mode={}, info={}",
            self.format,
            self.width,
            self.height,
            self.mode,
            self.info_display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_modes() {
        assert_eq!(ColorMode::from_png(0, 1), ColorMode::Bilevel);
        assert_eq!(ColorMode::from_png(0, 8), ColorMode::Gray);
        assert_eq!(ColorMode::from_png(0, 16), ColorMode::Gray16);
        assert_eq!(ColorMode::from_png(2, 16), ColorMode::Rgb);
        assert_eq!(ColorMode::from_png(3, 4), ColorMode::Palette);
        assert_eq!(ColorMode::from_png(4, 8), ColorMode::GrayAlpha);
        assert_eq!(ColorMode::from_png(6, 8), ColorMode::Rgba);
        assert_eq!(ColorMode::from_png(5, 8), ColorMode::Unknown);
    }

    #[test]
    fn codec_color_types() {
        assert_eq!(ColorMode::from(ColorType::La16), ColorMode::GrayAlpha);
        assert_eq!(ColorMode::from(ColorType::Rgb32F), ColorMode::Rgb);
        assert_eq!(ColorMode::from(ColorType::Rgba8).to_string(), "RGBA");
    }

    #[test]
    fn display_matches_report_format() {
        let mut info = BTreeMap::new();
        info.insert("gamma".to_string(), "0.45455".to_string());
        info.insert("dpi".to_string(), "(72, 72)".to_string());
        let meta = ImageMetadata {
            format: "PNG".into(),
            width: 640,
            height: 480,
            mode: ColorMode::Rgba,
            info,
        };
        assert_eq!(
            meta.to_string(),
            "PNG: 640x480, mode=RGBA, info={dpi: (72, 72), gamma: 0.45455}"
        );

        let bare = ImageMetadata {
            info: BTreeMap::new(),
            ..meta
        };
        assert_eq!(bare.info_display(), "{}");
    }
}
