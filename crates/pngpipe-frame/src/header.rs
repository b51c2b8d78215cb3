use std::fmt;

/// The header line that opens every stream, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    raw: String,
}

impl StreamHeader {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The header text without its newline.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Best-effort parse of the conventional decoder header.
    ///
    /// Decoders emit `PXY4M W<width> H<height> F<num>/<den> C<colorspace>
    /// Enc:<encoding>`. Nothing here is required by the protocol; fields that
    /// are missing or unparsable come back as `None`.
    pub fn fields(&self) -> HeaderFields {
        HeaderFields::parse(&self.raw)
    }
}

impl fmt::Display for StreamHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Fields recognised in a conventional header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub tag: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Frame rate as `(numerator, denominator)`.
    pub frame_rate: Option<(u32, u32)>,
    pub colorspace: Option<String>,
    pub encoding: Option<String>,
}

impl HeaderFields {
    fn parse(line: &str) -> Self {
        let mut fields = HeaderFields::default();
        let mut tokens = line.split_ascii_whitespace();
        fields.tag = tokens.next().map(str::to_string);

        for token in tokens {
            if let Some(enc) = token.strip_prefix("Enc:") {
                fields.encoding = Some(enc.to_string());
            } else if let Some(w) = token.strip_prefix('W') {
                fields.width = w.parse().ok();
            } else if let Some(h) = token.strip_prefix('H') {
                fields.height = h.parse().ok();
            } else if let Some(rate) = token.strip_prefix('F') {
                fields.frame_rate = rate.split_once('/').and_then(|(num, den)| {
                    let num = num.parse().ok()?;
                    let den = den.parse().ok()?;
                    Some((num, den))
                });
            } else if let Some(c) = token.strip_prefix('C') {
                fields.colorspace = Some(c.to_string());
            }
        }

        fields
    }

    /// Declared dimensions, if both are present.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width?, self.height?))
    }

    /// Frames per second, if a non-zero rate was declared.
    pub fn fps(&self) -> Option<f64> {
        match self.frame_rate {
            Some((num, den)) if den != 0 => Some(num as f64 / den as f64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decoder_header() {
        let header = StreamHeader::new("PXY4M W640 H480 F30000/1001 Crgba Enc:png");
        let fields = header.fields();
        assert_eq!(fields.tag.as_deref(), Some("PXY4M"));
        assert_eq!(fields.dimensions(), Some((640, 480)));
        assert_eq!(fields.frame_rate, Some((30000, 1001)));
        assert_eq!(fields.colorspace.as_deref(), Some("rgba"));
        assert_eq!(fields.encoding.as_deref(), Some("png"));
        assert!((fields.fps().unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn opaque_header_has_no_fields() {
        let header = StreamHeader::new("v1");
        let fields = header.fields();
        assert_eq!(fields.tag.as_deref(), Some("v1"));
        assert_eq!(fields.dimensions(), None);
        assert_eq!(fields.fps(), None);
        assert_eq!(header.to_string(), "v1");
    }

    #[test]
    fn bad_numbers_are_ignored() {
        let fields = StreamHeader::new("PXY4M Wide H12 F1/0").fields();
        assert_eq!(fields.width, None);
        assert_eq!(fields.height, Some(12));
        assert_eq!(fields.frame_rate, Some((1, 0)));
        assert_eq!(fields.fps(), None);
    }

    #[test]
    fn empty_header_is_allowed() {
        let fields = StreamHeader::new("").fields();
        assert_eq!(fields, HeaderFields::default());
    }
}
