//! Tag text encoding/decoding.
//!
//! ID3v2 text frames select their encoding with a leading byte; every other
//! tag format (ID3v1, APE) is implicitly Latin-1/UTF-8 and never carries a
//! selector.

use log::warn;

/// The text encodings an ID3v2 text-frame payload may use, selected by its
/// leading encoding byte (`0x00`-`0x03`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TextEncoding {
    /// ISO-8859-1. Every codepoint maps 1:1 onto a byte; anything outside
    /// that range is lossily flattened to `?` on encode.
    Latin1,
    /// UTF-16 prefixed with a 2-byte BOM that selects the endianness.
    Utf16WithBom,
    /// UTF-16BE with no BOM.
    Utf16Be,
    /// UTF-8, with an optional (and non-conformant, but common) 3-byte BOM.
    Utf8,
}

impl TextEncoding {
    /// Maps an ID3v2 text-frame encoding selector byte to its encoding.
    /// Any value besides `0x00..=0x03` falls back to `Latin1`, matching how
    /// lenient readers in the wild treat an unrecognized selector.
    pub fn from_selector_byte(byte: u8) -> Self {
        match byte {
            0x00 => TextEncoding::Latin1,
            0x01 => TextEncoding::Utf16WithBom,
            0x02 => TextEncoding::Utf16Be,
            0x03 => TextEncoding::Utf8,
            _ => TextEncoding::Latin1,
        }
    }

    pub fn selector_byte(self) -> u8 {
        match self {
            TextEncoding::Latin1 => 0x00,
            TextEncoding::Utf16WithBom => 0x01,
            TextEncoding::Utf16Be => 0x02,
            TextEncoding::Utf8 => 0x03,
        }
    }
}

/// Decodes an ID3v2 text-frame payload: the first byte selects the encoding,
/// the remainder is the text.
pub fn decode_frame_payload(payload: &[u8]) -> (TextEncoding, String) {
    let encoding = payload
        .first()
        .copied()
        .map(TextEncoding::from_selector_byte)
        .unwrap_or(TextEncoding::Latin1);

    let body = if payload.is_empty() { payload } else { &payload[1..] };

    (encoding, decode(body, encoding))
}

/// Encodes `text` as an ID3v2 text-frame payload: a leading selector byte
/// followed by the encoded text. Padding to a frame's fixed slot length is
/// the caller's responsibility, since only the caller knows the slot size.
pub fn encode_frame_payload(text: &str, encoding: TextEncoding) -> Vec<u8> {
    let mut out = vec![encoding.selector_byte()];
    out.extend(encode(text, encoding));
    out
}

/// Decodes raw text bytes (no selector byte) under `encoding`, then applies
/// the trailing-NUL and non-printable stripping every tag format expects on
/// read.
pub fn decode(data: &[u8], encoding: TextEncoding) -> String {
    let decoded = match encoding {
        TextEncoding::Latin1 => decode_latin1(data),
        TextEncoding::Utf16WithBom => decode_utf16_with_bom(data),
        TextEncoding::Utf16Be => decode_utf16be(data),
        TextEncoding::Utf8 => decode_utf8(data),
    };

    strip_decoded(&decoded)
}

/// Encodes `text` under `encoding`, with no selector byte and no padding.
pub fn encode(text: &str, encoding: TextEncoding) -> Vec<u8> {
    match encoding {
        TextEncoding::Latin1 => encode_latin1(text),
        TextEncoding::Utf16WithBom => encode_utf16_with_bom(text),
        TextEncoding::Utf16Be => encode_utf16be(text),
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
    }
}

fn decode_latin1(data: &[u8]) -> String {
    let data = data.strip_suffix(&[0]).unwrap_or(data);

    data.iter()
        .map(|&byte| char::from(byte))
        .filter(|&ch| (0x20..=0x7E).contains(&(ch as u32)))
        .collect()
}

fn decode_utf16_with_bom(data: &[u8]) -> String {
    if data.len() < 2 {
        return String::new();
    }

    match (data[0], data[1]) {
        (0xFF, 0xFE) => decode_utf16le(&data[2..]),
        (0xFE, 0xFF) => decode_utf16be(&data[2..]),
        _ => {
            warn!("UTF-16 text frame is missing its BOM, assuming little-endian");
            decode_utf16le(data)
        }
    }
}

fn decode_utf16be(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}

fn decode_utf16le(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    String::from_utf16_lossy(&units)
}

fn decode_utf8(data: &[u8]) -> String {
    // Some writers prepend a non-conformant 3-byte BOM to UTF-8 payloads.
    let data = data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data);
    String::from_utf8_lossy(data).to_string()
}

fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| if u32::from(ch) > 0xFF { b'?' } else { ch as u8 })
        .collect()
}

fn encode_utf16_with_bom(text: &str) -> Vec<u8> {
    let mut out = vec![0xFF, 0xFE];
    out.extend(
        text.encode_utf16()
            .flat_map(|unit| unit.to_le_bytes()),
    );
    out
}

fn encode_utf16be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(|unit| unit.to_be_bytes()).collect()
}

/// Strips a single trailing NUL and leading/trailing control characters
/// from a fully-decoded string. Applied uniformly regardless of source
/// encoding, on top of the narrower byte-range filtering `decode_latin1`
/// already performs.
///
/// Also used directly by the APE reader: zero-padding left behind by an
/// in-place shrink is all trailing control characters, so `trim_matches`
/// strips it regardless of how many padding bytes remain.
pub(crate) fn strip_decoded(s: &str) -> String {
    let s = s.strip_suffix('\0').unwrap_or(s);
    s.trim_matches(|ch: char| ch.is_control()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const STR_UNICODE: &str = "Like a while loop with no escape \u{1d568}";

    #[test]
    fn latin1_round_trip() {
        let text = "OldAlbum";
        let encoded = encode(text, TextEncoding::Latin1);
        assert_eq!(decode(&encoded, TextEncoding::Latin1), text);
    }

    #[test]
    fn latin1_strips_trailing_nul_and_nonprintable() {
        let mut data = b"Hello".to_vec();
        data.push(0x00);
        data.push(0x01); // non-printable control byte
        assert_eq!(decode(&data, TextEncoding::Latin1), "Hello");
    }

    #[test]
    fn utf16_with_bom_round_trip_detects_endianness() {
        let encoded = encode(STR_UNICODE, TextEncoding::Utf16WithBom);
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(encoded[1], 0xFE);
        assert_eq!(decode(&encoded, TextEncoding::Utf16WithBom), STR_UNICODE);
    }

    #[test]
    fn utf16be_round_trip_preserves_surrogate_pairs() {
        let encoded = encode(STR_UNICODE, TextEncoding::Utf16Be);
        assert_eq!(decode(&encoded, TextEncoding::Utf16Be), STR_UNICODE);
    }

    #[test]
    fn utf8_round_trip() {
        let encoded = encode(STR_UNICODE, TextEncoding::Utf8);
        assert_eq!(decode(&encoded, TextEncoding::Utf8), STR_UNICODE);
    }

    #[test]
    fn utf8_strips_nonconformant_bom() {
        let mut data = vec![0xEF, 0xBB, 0xBF];
        data.extend_from_slice("Hello".as_bytes());
        assert_eq!(decode(&data, TextEncoding::Utf8), "Hello");
    }

    #[test]
    fn frame_payload_round_trip() {
        for encoding in [
            TextEncoding::Latin1,
            TextEncoding::Utf16WithBom,
            TextEncoding::Utf16Be,
            TextEncoding::Utf8,
        ] {
            let payload = encode_frame_payload("Hi", encoding);
            let (decoded_encoding, text) = decode_frame_payload(&payload);
            assert_eq!(decoded_encoding, encoding);
            assert_eq!(text, "Hi");
        }
    }

    #[test]
    fn scenario_5_utf16le_title_grows() {
        // From the spec: TIT2 payload 0x01 0xFFFE "Hi" grows to "Hello" with
        // the encoding preserved.
        let original = [0x01u8, 0xFF, 0xFE, 0x48, 0x00, 0x69, 0x00];
        let (encoding, text) = decode_frame_payload(&original);
        assert_eq!(text, "Hi");

        let rewritten = encode_frame_payload("Hello", encoding);
        assert_eq!(
            rewritten,
            vec![
                0x01, 0xFF, 0xFE, 0x48, 0x00, 0x65, 0x00, 0x6C, 0x00, 0x6C, 0x00, 0x6F, 0x00
            ]
        );
    }
}
