//! User-Defined Text Information Frame (`TXXX`).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{self, TextEncoding};

#[derive(Debug, Clone, PartialEq)]
pub struct UserTextFrame
{
    pub encoding:    TextEncoding,
    pub description: String,
    pub value:       String
}

impl UserTextFrame
{
    pub fn parse(data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.is_empty()
        {
            return Err(Id3Error::InvalidFrame { id: "TXXX".to_string(), reason: "empty payload".into() });
        }

        let encoding = TextEncoding::from_byte(data[0])?;
        let (desc_bytes, value_bytes) = text_encoding::split_at_terminator(&data[1..], encoding);
        let description = text_encoding::decode_string(desc_bytes, encoding)?;
        let value = text_encoding::decode_string(value_bytes, encoding)?;

        Ok(UserTextFrame { encoding, description, value })
    }

    pub fn build(description: &str, value: &str, version_major: u8) -> Vec<u8>
    {
        let encoding = TextEncoding::choose_for_write(&format!("{description}{value}"), version_major);
        let mut out = vec![encoding.as_byte()];
        out.extend(text_encoding::encode_string(description, encoding));
        out.extend(text_encoding::terminator(encoding));
        out.extend(text_encoding::encode_string(value, encoding));
        out
    }
}

impl fmt::Display for UserTextFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}: \"{}\"", self.description, self.value)
    }
}
