//! URL Link Frame (`W***` except `WXXX`). Always ISO-8859-1 (no encoding
//! byte).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{decode_iso88591, encode_iso88591};

#[derive(Debug, Clone, PartialEq)]
pub struct UrlFrame
{
    pub url: String
}

impl UrlFrame
{
    pub fn parse(_id: &str, data: &[u8]) -> Result<Self, Id3Error>
    {
        let trimmed = data.split(|&b| b == 0).next().unwrap_or(data);
        Ok(UrlFrame { url: decode_iso88591(trimmed) })
    }

    pub fn build(url: &str) -> Vec<u8>
    {
        encode_iso88591(url)
    }
}

impl fmt::Display for UrlFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.url)
    }
}
