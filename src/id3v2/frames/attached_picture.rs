//! Attached Picture Frame (`APIC`).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{self, TextEncoding, decode_iso88591, encode_iso88591};

/// Picture type `3` is "front cover" (§4.2.5); the value this crate writes
/// when embedding chapter/track artwork.
pub const PICTURE_TYPE_FRONT_COVER: u8 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct AttachedPictureFrame
{
    pub encoding:     TextEncoding,
    pub mime:         String,
    pub picture_type: u8,
    pub description:  String,
    pub data:         Vec<u8>
}

impl AttachedPictureFrame
{
    pub fn parse(data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.is_empty()
        {
            return Err(Id3Error::InvalidFrame { id: "APIC".to_string(), reason: "empty payload".into() });
        }
        if data.len() < 2
        {
            return Err(Id3Error::InvalidFrame { id: "APIC".to_string(), reason: "too short".into() });
        }

        let encoding = TextEncoding::from_byte(data[0])?;
        let rest = &data[1..];
        let mime_end = rest.iter().position(|&b| b == 0).ok_or_else(|| Id3Error::InvalidFrame { id: "APIC".to_string(), reason: "missing MIME terminator".into() })?;
        let mime = decode_iso88591(&rest[..mime_end]);

        let after_mime = &rest[mime_end + 1..];
        if after_mime.is_empty()
        {
            return Err(Id3Error::InvalidFrame { id: "APIC".to_string(), reason: "missing picture type".into() });
        }
        let picture_type = after_mime[0];

        let (desc_bytes, image_bytes) = text_encoding::split_at_terminator(&after_mime[1..], encoding);
        let description = text_encoding::decode_string(desc_bytes, encoding)?;

        Ok(AttachedPictureFrame { encoding, mime, picture_type, description, data: image_bytes.to_vec() })
    }

    pub fn build(mime: &str, picture_type: u8, description: &str, image_data: &[u8], version_major: u8) -> Vec<u8>
    {
        let encoding = TextEncoding::choose_for_write(description, version_major);
        let mut out = vec![encoding.as_byte()];
        out.extend(encode_iso88591(mime));
        out.push(0);
        out.push(picture_type);
        out.extend(text_encoding::encode_string(description, encoding));
        out.extend(text_encoding::terminator(encoding));
        out.extend_from_slice(image_data);
        out
    }
}

impl fmt::Display for AttachedPictureFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} picture, type {}, {} bytes", self.mime, self.picture_type, self.data.len())
    }
}
