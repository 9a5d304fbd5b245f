//! Synchronized Lyrics Frame (`SYLT`).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{self, TextEncoding};
use crate::model::lyrics::LyricsContentType;

/// Millisecond timestamp format byte, the only one this crate writes.
pub const TIMESTAMP_FORMAT_MS: u8 = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct SyncLyricsEvent
{
    pub text: String,
    pub ms:   u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncLyricsFrame
{
    pub encoding:         TextEncoding,
    pub language:         [u8; 3],
    pub timestamp_format: u8,
    pub content_type:     LyricsContentType,
    pub descriptor:       String,
    pub events:           Vec<SyncLyricsEvent>
}

impl SyncLyricsFrame
{
    pub fn parse(data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.len() < 6
        {
            return Err(Id3Error::InvalidFrame { id: "SYLT".to_string(), reason: "too short".into() });
        }

        let encoding = TextEncoding::from_byte(data[0])?;
        let language = [data[1], data[2], data[3]];
        let timestamp_format = data[4];
        let content_type = LyricsContentType::from_sylt_byte(data[5]);

        let (desc_bytes, events_bytes) = text_encoding::split_at_terminator(&data[6..], encoding);
        let descriptor = text_encoding::decode_string(desc_bytes, encoding)?;

        let mut events = Vec::new();
        let mut remaining = events_bytes;
        while !remaining.is_empty()
        {
            let (text_bytes, rest) = text_encoding::split_at_terminator(remaining, encoding);
            if rest.len() < 4
            {
                break;
            }
            let text = text_encoding::decode_string(text_bytes, encoding)?;
            let ms = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
            events.push(SyncLyricsEvent { text, ms });
            remaining = &rest[4..];
        }

        Ok(SyncLyricsFrame { encoding, language, timestamp_format, content_type, descriptor, events })
    }

    pub fn build(language: &str, content_type: LyricsContentType, descriptor: &str, events: &[SyncLyricsEvent], version_major: u8) -> Vec<u8>
    {
        let encoding = TextEncoding::choose_for_write(descriptor, version_major);
        let mut out = vec![encoding.as_byte()];
        out.extend_from_slice(&crate::id3v2::frames::comment::language_bytes(language));
        out.push(TIMESTAMP_FORMAT_MS);
        out.push(content_type.as_sylt_byte());
        out.extend(text_encoding::encode_string(descriptor, encoding));
        out.extend(text_encoding::terminator(encoding));

        for event in events
        {
            out.extend(text_encoding::encode_string(&event.text, encoding));
            out.extend(text_encoding::terminator(encoding));
            out.extend_from_slice(&event.ms.to_be_bytes());
        }

        out
    }

    pub fn language_str(&self) -> String
    {
        String::from_utf8_lossy(&self.language).to_string()
    }
}

impl fmt::Display for SyncLyricsFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "[{}] {} events", self.language_str(), self.events.len())
    }
}
