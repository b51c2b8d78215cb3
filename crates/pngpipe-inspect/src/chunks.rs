//! Minimal PNG chunk walking for ancillary metadata.
//!
//! The codec validates pixels; this module only reads the header and the
//! small ancillary chunks the codec does not expose.

use std::collections::BTreeMap;

/// The eight bytes every PNG file starts with.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// An unparsed chunk. The CRC is not checked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngChunk<'b> {
    pub kind: [u8; 4],
    pub data: &'b [u8],
}

/// Iterator over the chunks of PNG bytes. Stops at the first chunk that does
/// not fit in the remaining bytes.
#[derive(Debug, Clone)]
pub struct PngChunkIter<'b>(&'b [u8]);

impl<'b> PngChunkIter<'b> {
    /// Returns `None` if `bytes` does not start with the PNG signature.
    pub fn new(bytes: &'b [u8]) -> Option<Self> {
        bytes.strip_prefix(&PNG_SIGNATURE[..]).map(Self)
    }
}

impl<'b> Iterator for PngChunkIter<'b> {
    type Item = PngChunk<'b>;

    fn next(&mut self) -> Option<Self::Item> {
        let (len, rest) = split_u32(self.0)?;
        let (kind, rest) = rest.split_first_chunk::<4>()?;
        let len = len as usize;
        if rest.len() < len.saturating_add(4) {
            self.0 = &[];
            return None;
        }
        let (data, rest) = rest.split_at(len);
        self.0 = &rest[4..];
        Some(PngChunk { kind: *kind, data })
    }
}

/// Fields of the IHDR chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ihdr {
    pub width: u32,
    pub height: u32,
    pub bit_depth: u8,
    pub color_type: u8,
    pub interlaced: bool,
}

impl Ihdr {
    fn parse(data: &[u8]) -> Option<Self> {
        let (width, rest) = split_u32(data)?;
        let (height, rest) = split_u32(rest)?;
        match rest {
            [bit_depth, color_type, _compression, _filter, interlace, ..] => Some(Self {
                width,
                height,
                bit_depth: *bit_depth,
                color_type: *color_type,
                interlaced: *interlace == 1,
            }),
            _ => None,
        }
    }
}

/// Header plus ancillary facts gathered from a PNG's chunk list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PngDetails {
    pub ihdr: Option<Ihdr>,
    pub info: BTreeMap<String, String>,
}

/// Collect the IHDR and ancillary info from PNG bytes.
///
/// Returns `None` when the bytes are not a PNG. Malformed ancillary chunks
/// are skipped.
pub fn png_details(bytes: &[u8]) -> Option<PngDetails> {
    let mut details = PngDetails::default();

    for chunk in PngChunkIter::new(bytes)? {
        let info = &mut details.info;
        match &chunk.kind {
            b"IHDR" => {
                details.ihdr = Ihdr::parse(chunk.data);
                if details.ihdr.is_some_and(|h| h.interlaced) {
                    info.insert("interlace".into(), "1".into());
                }
            }
            b"tEXt" => {
                if let Some((key, text)) = split_nul(chunk.data) {
                    info.insert(latin1(key), latin1(text));
                }
            }
            b"iTXt" => {
                if let Some((key, text)) = parse_itxt(chunk.data) {
                    info.insert(key, text);
                }
            }
            b"gAMA" => {
                if let Some((gamma, _)) = split_u32(chunk.data) {
                    info.insert("gamma".into(), (gamma as f64 / 100_000.0).to_string());
                }
            }
            b"pHYs" => {
                if let Some((x, rest)) = split_u32(chunk.data) {
                    if let Some((y, [1, ..])) = split_u32(rest) {
                        let dpi = |ppm: u32| (ppm as f64 * 0.0254).round() as u32;
                        info.insert("dpi".into(), format!("({}, {})", dpi(x), dpi(y)));
                    }
                }
            }
            b"sRGB" => {
                if let Some(intent) = chunk.data.first() {
                    info.insert("srgb".into(), intent.to_string());
                }
            }
            b"tRNS" => {
                let color_type = details.ihdr.map(|h| h.color_type);
                info.insert("transparency".into(), describe_trns(color_type, chunk.data));
            }
            b"iCCP" => {
                if let Some((name, _)) = split_nul(chunk.data) {
                    info.insert("icc_profile".into(), latin1(name));
                }
            }
            b"IEND" => break,
            _ => {}
        }
    }

    Some(details)
}

fn split_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let (head, rest) = bytes.split_first_chunk::<4>()?;
    Some((u32::from_be_bytes(*head), rest))
}

fn split_nul(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = bytes.iter().position(|&b| b == 0)?;
    Some((&bytes[..nul], &bytes[nul + 1..]))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// `keyword\0 flag method language\0 translated\0 text`; compressed text is skipped.
fn parse_itxt(data: &[u8]) -> Option<(String, String)> {
    let (key, rest) = split_nul(data)?;
    let (&[flag, _method], rest) = rest.split_first_chunk::<2>()?;
    if flag != 0 {
        return None;
    }
    let (_language, rest) = split_nul(rest)?;
    let (_translated, text) = split_nul(rest)?;
    Some((latin1(key), String::from_utf8_lossy(text).into_owned()))
}

fn describe_trns(color_type: Option<u8>, data: &[u8]) -> String {
    let sample = |i: usize| u16::from_be_bytes([data[i], data[i + 1]]);
    match (color_type, data.len()) {
        (Some(0), 2) => sample(0).to_string(),
        (Some(2), 6) => format!("({}, {}, {})", sample(0), sample(2), sample(4)),
        (_, n) => format!("{n} palette entries"),
    }
}
