use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// How response bytes become text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Always UTF-8; invalid sequences become U+FFFD.
    #[default]
    ForceUtf8,
    /// BOM, then Content-Type charset, then chardetng.
    Detect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

pub fn decode_html(
    bytes: &[u8],
    content_type: Option<&str>,
    policy: DecodePolicy,
) -> Result<DecodedHtml, DecodeError> {
    match policy {
        DecodePolicy::ForceUtf8 => Ok(decode_lossy(bytes, UTF_8)),
        DecodePolicy::Detect => detect_and_decode(bytes, content_type),
    }
}

fn detect_and_decode(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedHtml, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_strict(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_strict(bytes, enc);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_strict(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            key.trim()
                .eq_ignore_ascii_case("charset")
                .then(|| value.trim_matches([' ', '"', '\'']).to_string())
        })
        .next()
}

fn decode_lossy(bytes: &[u8], enc: &'static Encoding) -> DecodedHtml {
    let (text, _, _) = enc.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
    }
}

fn decode_strict(bytes: &[u8], enc: &'static Encoding) -> Result<DecodedHtml, DecodeError> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: enc.name().to_string(),
            message: "malformed byte sequence".into(),
        });
    }
    Ok(DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
    })
}
