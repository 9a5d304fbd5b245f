//! Text Information Frame (`T***` except `TXXX`).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{self, TextEncoding};

#[derive(Debug, Clone, PartialEq)]
pub struct TextFrame
{
    pub encoding: TextEncoding,
    pub text:     String,
    pub strings:  Vec<String>
}

impl TextFrame
{
    pub fn parse(id: &str, data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.is_empty()
        {
            // Empty-content text frames decode to empty string (§4.2.5).
            return Ok(TextFrame { encoding: TextEncoding::Iso88591, text: String::new(), strings: Vec::new() });
        }

        let encoding = TextEncoding::from_byte(data[0])?;
        let (text, strings) = text_encoding::decode_multi_value(&data[1..], encoding).map_err(|_| Id3Error::InvalidFrame { id: id.to_string(), reason: "invalid text payload".into() })?;

        Ok(TextFrame { encoding, text, strings })
    }

    pub fn build(text: &str, version_major: u8) -> Vec<u8>
    {
        let encoding = TextEncoding::choose_for_write(text, version_major);
        let mut out = vec![encoding.as_byte()];
        out.extend(text_encoding::encode_string(text, encoding));
        out
    }

    pub fn primary_text(&self) -> &str
    {
        &self.text
    }
}

impl fmt::Display for TextFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "\"{}\"", self.text)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn round_trips_through_build_and_parse()
    {
        let built = TextFrame::build("Title Here", 3);
        let parsed = TextFrame::parse("TIT2", &built).unwrap();
        assert_eq!(parsed.primary_text(), "Title Here");
    }

    #[test]
    fn empty_payload_decodes_to_empty_string()
    {
        let parsed = TextFrame::parse("TIT2", &[]).unwrap();
        assert_eq!(parsed.primary_text(), "");
    }
}
