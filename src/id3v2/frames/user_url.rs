//! User-Defined URL Link Frame (`WXXX`). Description has an encoding byte
//! and terminator; the URL itself is always ISO-8859-1.

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{self, TextEncoding, decode_iso88591, encode_iso88591};

#[derive(Debug, Clone, PartialEq)]
pub struct UserUrlFrame
{
    pub encoding:    TextEncoding,
    pub description: String,
    pub url:         String
}

impl UserUrlFrame
{
    pub fn parse(data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.is_empty()
        {
            return Err(Id3Error::InvalidFrame { id: "WXXX".to_string(), reason: "empty payload".into() });
        }

        let encoding = TextEncoding::from_byte(data[0])?;
        let (desc_bytes, url_bytes) = text_encoding::split_at_terminator(&data[1..], encoding);
        let description = text_encoding::decode_string(desc_bytes, encoding)?;
        let url = decode_iso88591(url_bytes);

        Ok(UserUrlFrame { encoding, description, url })
    }

    pub fn build(description: &str, url: &str, version_major: u8) -> Vec<u8>
    {
        let encoding = TextEncoding::choose_for_write(description, version_major);
        let mut out = vec![encoding.as_byte()];
        out.extend(text_encoding::encode_string(description, encoding));
        out.extend(text_encoding::terminator(encoding));
        out.extend(encode_iso88591(url));
        out
    }
}

impl fmt::Display for UserUrlFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}: {}", self.description, self.url)
    }
}
