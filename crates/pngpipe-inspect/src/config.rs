/// Controls how much of a payload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InspectConfig {
    /// When true, the full pixel stream is decoded so corruption after the
    /// header is detected too. Otherwise only headers and metadata are read.
    pub verify_pixels: bool,
}
