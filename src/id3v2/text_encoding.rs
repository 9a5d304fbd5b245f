//! ID3v2 text encoding support: the encoding byte, decode, and encode.
//!
//! Generalized from the teacher's read-only `decode_text_with_encoding` into
//! a decode+encode pair, since this crate builds tags as well as parsing
//! them. The decision table for which encoding a writer picks (§4.2.4,
//! §9 "keep the decision table ... in one place") lives in
//! [`TextEncoding::choose_for_write`].

use crate::error::Id3Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding
{
    Iso88591 = 0,
    Utf16Bom = 1,
    Utf16Be  = 2,
    Utf8     = 3
}

impl TextEncoding
{
    pub fn from_byte(byte: u8) -> Result<Self, Id3Error>
    {
        match byte
        {
            | 0 => Ok(TextEncoding::Iso88591),
            | 1 => Ok(TextEncoding::Utf16Bom),
            | 2 => Ok(TextEncoding::Utf16Be),
            | 3 => Ok(TextEncoding::Utf8),
            | other => Err(Id3Error::InvalidEncoding(other))
        }
    }

    pub fn as_byte(&self) -> u8
    {
        *self as u8
    }

    pub fn is_valid_for_version(&self, version_major: u8) -> bool
    {
        match self
        {
            | TextEncoding::Iso88591 | TextEncoding::Utf16Bom => true,
            | TextEncoding::Utf16Be | TextEncoding::Utf8 => version_major >= 4
        }
    }

    /// The single decision point for which encoding a writer should use for
    /// a given string and target version (§4.2.4): v2.4 always emits UTF-8;
    /// v2.3 emits Latin-1 when every code point fits, else UTF-16 with BOM.
    pub fn choose_for_write(text: &str, version_major: u8) -> Self
    {
        if version_major >= 4
        {
            TextEncoding::Utf8
        }
        else if text.chars().all(|c| (c as u32) <= 0xFF)
        {
            TextEncoding::Iso88591
        }
        else
        {
            TextEncoding::Utf16Bom
        }
    }

    fn terminator_len(&self) -> usize
    {
        match self
        {
            | TextEncoding::Iso88591 | TextEncoding::Utf8 => 1,
            | TextEncoding::Utf16Bom | TextEncoding::Utf16Be => 2
        }
    }
}

fn is_null_terminator(bytes: &[u8], encoding: TextEncoding) -> bool
{
    match encoding
    {
        | TextEncoding::Iso88591 | TextEncoding::Utf8 => !bytes.is_empty() && bytes[0] == 0,
        | TextEncoding::Utf16Bom | TextEncoding::Utf16Be => bytes.len() >= 2 && bytes[0] == 0 && bytes[1] == 0
    }
}

/// Split `data` at the first null terminator for `encoding`, returning the
/// bytes before and after. If no terminator is found, all of `data` is
/// treated as the first part.
pub fn split_at_terminator(data: &[u8], encoding: TextEncoding) -> (&[u8], &[u8])
{
    let term_len = encoding.terminator_len();
    let mut pos = 0;
    while pos + term_len <= data.len()
    {
        if is_null_terminator(&data[pos..pos + term_len], encoding)
        {
            return (&data[0..pos], &data[pos + term_len..]);
        }
        pos += if matches!(encoding, TextEncoding::Utf16Bom | TextEncoding::Utf16Be) { 2 } else { 1 };
    }
    (data, &[])
}

/// Decode a single string (no terminator splitting), trimming a trailing
/// terminator if present (misbehaving encoders leave one).
pub fn decode_string(data: &[u8], encoding: TextEncoding) -> Result<String, Id3Error>
{
    let term_len = encoding.terminator_len();
    let data = if data.len() >= term_len && is_null_terminator(&data[data.len() - term_len..], encoding) { &data[..data.len() - term_len] } else { data };

    match encoding
    {
        | TextEncoding::Iso88591 => Ok(decode_iso88591(data)),
        | TextEncoding::Utf8 => Ok(String::from_utf8_lossy(data).trim_end_matches('\0').to_string()),
        | TextEncoding::Utf16Bom | TextEncoding::Utf16Be => decode_utf16(data, encoding)
    }
}

/// Decode data that may contain multiple null-terminated strings (used by
/// text frames that can carry a multi-value list). Returns the first string
/// (the "primary" value) and the full list.
pub fn decode_multi_value(data: &[u8], encoding: TextEncoding) -> Result<(String, Vec<String>), Id3Error>
{
    let mut strings = Vec::new();
    let mut remaining = data;

    loop
    {
        let (chunk, rest) = split_at_terminator(remaining, encoding);
        if !chunk.is_empty() || !rest.is_empty()
        {
            let text = decode_string(chunk, encoding)?;
            if !text.is_empty() || strings.is_empty()
            {
                strings.push(text);
            }
        }
        if rest.is_empty()
        {
            break;
        }
        remaining = rest;
    }

    let primary = strings.first().cloned().unwrap_or_default();
    Ok((primary, strings))
}

pub fn decode_iso88591(data: &[u8]) -> String
{
    data.iter().map(|&b| b as char).collect()
}

pub fn encode_iso88591(text: &str) -> Vec<u8>
{
    text.chars().map(|c| c as u8).collect()
}

pub fn decode_utf16(data: &[u8], encoding: TextEncoding) -> Result<String, Id3Error>
{
    if data.is_empty()
    {
        return Ok(String::new());
    }

    let (start, little_endian) = match encoding
    {
        | TextEncoding::Utf16Bom if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xFE => (2, true),
        | TextEncoding::Utf16Bom if data.len() >= 2 && data[0] == 0xFE && data[1] == 0xFF => (2, false),
        | TextEncoding::Utf16Bom => (0, false),
        | TextEncoding::Utf16Be => (0, false),
        | _ => return Err(Id3Error::InvalidFrame { id: String::new(), reason: "not a UTF-16 encoding".into() })
    };

    let body = &data[start..];
    let usable = body.len() - (body.len() % 2);
    let mut units = Vec::with_capacity(usable / 2);
    for chunk in body[..usable].chunks_exact(2)
    {
        units.push(if little_endian { u16::from_le_bytes([chunk[0], chunk[1]]) } else { u16::from_be_bytes([chunk[0], chunk[1]]) });
    }

    String::from_utf16(&units).map_err(|_| Id3Error::InvalidFrame { id: String::new(), reason: "invalid UTF-16 sequence".into() })
}

/// Encode `text` as UTF-16 with a leading little-endian BOM, as ID3v2.3
/// writers emit for `Utf16Bom` (§4.2.4).
pub fn encode_utf16_bom(text: &str) -> Vec<u8>
{
    let mut out = vec![0xFF, 0xFE];
    for unit in text.encode_utf16()
    {
        out.extend_from_slice(&unit.to_le_bytes());
    }
    out
}

pub fn encode_utf16_be(text: &str) -> Vec<u8>
{
    let mut out = Vec::new();
    for unit in text.encode_utf16()
    {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

/// Encode `text` with `encoding`, not including any terminator.
pub fn encode_string(text: &str, encoding: TextEncoding) -> Vec<u8>
{
    match encoding
    {
        | TextEncoding::Iso88591 => encode_iso88591(text),
        | TextEncoding::Utf8 => text.as_bytes().to_vec(),
        | TextEncoding::Utf16Bom => encode_utf16_bom(text),
        | TextEncoding::Utf16Be => encode_utf16_be(text)
    }
}

/// The terminator bytes for `encoding`.
pub fn terminator(encoding: TextEncoding) -> &'static [u8]
{
    match encoding
    {
        | TextEncoding::Iso88591 | TextEncoding::Utf8 => &[0x00],
        | TextEncoding::Utf16Bom | TextEncoding::Utf16Be => &[0x00, 0x00]
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn round_trips_iso88591()
    {
        let encoded = encode_string("hello", TextEncoding::Iso88591);
        assert_eq!(decode_string(&encoded, TextEncoding::Iso88591).unwrap(), "hello");
    }

    #[test]
    fn round_trips_utf16_bom()
    {
        let encoded = encode_string("héllo", TextEncoding::Utf16Bom);
        assert_eq!(decode_string(&encoded, TextEncoding::Utf16Bom).unwrap(), "héllo");
    }

    #[test]
    fn round_trips_utf8()
    {
        let encoded = encode_string("日本語", TextEncoding::Utf8);
        assert_eq!(decode_string(&encoded, TextEncoding::Utf8).unwrap(), "日本語");
    }

    #[test]
    fn choose_for_write_picks_latin1_when_representable()
    {
        assert_eq!(TextEncoding::choose_for_write("plain ascii", 3), TextEncoding::Iso88591);
        assert_eq!(TextEncoding::choose_for_write("日本語", 3), TextEncoding::Utf16Bom);
        assert_eq!(TextEncoding::choose_for_write("anything", 4), TextEncoding::Utf8);
    }

    #[test]
    fn empty_content_decodes_to_empty_string()
    {
        assert_eq!(decode_string(&[], TextEncoding::Iso88591).unwrap(), "");
    }

    #[test]
    fn strips_trailing_null_from_misbehaving_encoders()
    {
        let mut data = encode_string("x", TextEncoding::Iso88591);
        data.push(0);
        assert_eq!(decode_string(&data, TextEncoding::Iso88591).unwrap(), "x");
    }
}
