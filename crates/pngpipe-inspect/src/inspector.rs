use std::any::Any;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};

use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use tracing::trace;

use crate::chunks::png_details;
use crate::config::InspectConfig;
use crate::error::{InspectError, Result};
use crate::metadata::{ColorMode, ImageMetadata};

/// Inspect payload bytes with the default configuration.
pub fn inspect(bytes: &[u8]) -> Result<ImageMetadata> {
    Inspector::default().inspect(bytes)
}

/// Decodes frame payloads into [`ImageMetadata`].
///
/// Holds configuration only; every call is independent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inspector {
    config: InspectConfig,
}

impl Inspector {
    /// Create an inspector with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inspector with explicit config.
    pub fn with_config(config: InspectConfig) -> Self {
        Self { config }
    }

    /// Current inspector configuration.
    pub fn config(&self) -> &InspectConfig {
        &self.config
    }

    /// Decode `bytes` and describe the image, or explain why that failed.
    ///
    /// Never panics: a panic inside the codec comes back as
    /// [`InspectError::Panicked`]. The process panic hook is left alone, so
    /// the default hook still prints its `thread ... panicked at` message to
    /// stderr for each such frame. Install a quieter hook in the binary if
    /// that matters.
    pub fn inspect(&self, bytes: &[u8]) -> Result<ImageMetadata> {
        contain_panic(|| self.decode(bytes))
    }

    fn decode(&self, bytes: &[u8]) -> Result<ImageMetadata> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format().ok_or(InspectError::UnknownFormat)?;

        let mut decoder = reader.into_decoder()?;
        let (width, height) = decoder.dimensions();
        let mut mode = ColorMode::from(decoder.color_type());
        let mut info = BTreeMap::new();

        if format == ImageFormat::Png {
            if let Some(details) = png_details(bytes) {
                if let Some(ihdr) = details.ihdr {
                    mode = ColorMode::from_png(ihdr.color_type, ihdr.bit_depth);
                }
                info = details.info;
            }
        } else if let Some(profile) = decoder.icc_profile()? {
            info.insert("icc_profile".to_string(), format!("{} bytes", profile.len()));
        }

        if self.config.verify_pixels {
            DynamicImage::from_decoder(decoder)?;
            trace!(width, height, "pixel data verified");
        }

        Ok(ImageMetadata {
            format: format_name(format),
            width,
            height,
            mode,
            info,
        })
    }
}

fn format_name(format: ImageFormat) -> String {
    format
        .extensions_str()
        .first()
        .map(|ext| ext.to_ascii_uppercase())
        .unwrap_or_else(|| format!("{format:?}").to_ascii_uppercase())
}

fn contain_panic<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(panic) => Err(InspectError::Panicked(panic_message(panic.as_ref()))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
