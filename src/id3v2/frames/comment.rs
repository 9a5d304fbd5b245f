//! Comment Frame (`COMM`) and Unsynchronized Lyrics Frame (`USLT`) share
//! this shape: language + description + text.

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{self, TextEncoding};

#[derive(Debug, Clone, PartialEq)]
pub struct CommentFrame
{
    pub encoding:    TextEncoding,
    pub language:    [u8; 3],
    pub description: String,
    pub text:        String
}

impl CommentFrame
{
    pub fn parse(id: &str, data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.is_empty()
        {
            return Err(Id3Error::InvalidFrame { id: id.to_string(), reason: "empty payload".into() });
        }
        if data.len() < 4
        {
            return Err(Id3Error::InvalidFrame { id: id.to_string(), reason: "missing language prefix".into() });
        }

        let encoding = TextEncoding::from_byte(data[0])?;
        let language = [data[1], data[2], data[3]];
        let (desc_bytes, text_bytes) = text_encoding::split_at_terminator(&data[4..], encoding);
        let description = text_encoding::decode_string(desc_bytes, encoding)?;
        let text = text_encoding::decode_string(text_bytes, encoding)?;

        Ok(CommentFrame { encoding, language, description, text })
    }

    pub fn build(language: &str, description: &str, text: &str, version_major: u8) -> Vec<u8>
    {
        let encoding = TextEncoding::choose_for_write(&format!("{description}{text}"), version_major);
        let mut out = vec![encoding.as_byte()];
        out.extend_from_slice(&language_bytes(language));
        out.extend(text_encoding::encode_string(description, encoding));
        out.extend(text_encoding::terminator(encoding));
        out.extend(text_encoding::encode_string(text, encoding));
        out
    }

    pub fn language_str(&self) -> String
    {
        String::from_utf8_lossy(&self.language).to_string()
    }
}

/// Pad/truncate a language code to exactly three ASCII bytes, defaulting to
/// `und` (undetermined) when empty.
pub fn language_bytes(language: &str) -> [u8; 3]
{
    let source = if language.is_empty() { "und" } else { language };
    let bytes = source.as_bytes();
    let mut out = [b'u', b'n', b'd'];
    for i in 0..3.min(bytes.len())
    {
        out[i] = bytes[i];
    }
    out
}

impl fmt::Display for CommentFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "[{}] {}: \"{}\"", self.language_str(), self.description, self.text)
    }
}
