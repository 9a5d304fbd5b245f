//! Chapter Frame (`CHAP`, ID3v2 Chapter Frame Addendum).
//!
//! Layout: null-terminated element ID, then four big-endian `u32`s (start
//! ms, end ms, start byte offset, end byte offset), then a nested list of
//! nested frames (among them `TIT2` for title, `WOAR`/`WXXX` for URL, `APIC`
//! for artwork).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::frame::Frame;
use crate::id3v2::raw_frame::{self, RawFrame};
use crate::id3v2::text_encoding::decode_iso88591;

/// ID3's convention for "offset unknown" (§4.2.7): CHAP offsets this crate
/// writes are always left at this sentinel.
pub const UNKNOWN_OFFSET: u32 = 0xFFFF_FFFF;

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterFrame
{
    pub element_id:   String,
    pub start_ms:     u32,
    pub end_ms:       u32,
    pub start_offset: u32,
    pub end_offset:   u32,
    pub subframes:    Vec<Frame>
}

impl ChapterFrame
{
    pub fn parse(data: &[u8], version_major: u8) -> Result<Self, Id3Error>
    {
        let id_end = data.iter().position(|&b| b == 0).ok_or_else(|| Id3Error::InvalidFrame { id: "CHAP".to_string(), reason: "missing element ID terminator".into() })?;
        let element_id = decode_iso88591(&data[..id_end]);

        let rest = &data[id_end + 1..];
        if rest.len() < 16
        {
            return Err(Id3Error::InvalidFrame { id: "CHAP".to_string(), reason: "shorter than fixed prefix".into() });
        }

        let start_ms = u32::from_be_bytes([rest[0], rest[1], rest[2], rest[3]]);
        let end_ms = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]);
        let start_offset = u32::from_be_bytes([rest[8], rest[9], rest[10], rest[11]]);
        let end_offset = u32::from_be_bytes([rest[12], rest[13], rest[14], rest[15]]);

        let raw_subframes = raw_frame::walk_frames(&rest[16..], version_major);
        let subframes = parse_subframes(raw_subframes, version_major);

        Ok(ChapterFrame { element_id, start_ms, end_ms, start_offset, end_offset, subframes })
    }

    pub fn build(element_id: &str, start_ms: u32, end_ms: u32, subframes: &[(String, Vec<u8>)], version_major: u8) -> Result<Vec<u8>, Id3Error>
    {
        let mut out = Vec::new();
        out.extend(decode_iso88591_inverse(element_id));
        out.push(0);
        out.extend_from_slice(&start_ms.to_be_bytes());
        out.extend_from_slice(&end_ms.to_be_bytes());
        out.extend_from_slice(&UNKNOWN_OFFSET.to_be_bytes());
        out.extend_from_slice(&UNKNOWN_OFFSET.to_be_bytes());

        for (id, payload) in subframes
        {
            let header = raw_frame::build_frame_header(id, payload.len() as u32, 0, version_major)?;
            out.extend_from_slice(&header);
            out.extend_from_slice(payload);
        }

        Ok(out)
    }

    pub fn title(&self) -> Option<&str>
    {
        self.subframes.iter().find_map(|f| if let Frame::Text(t) = f { Some(t.primary_text()) } else { None })
    }

    pub fn url(&self) -> Option<&str>
    {
        self.subframes.iter().find_map(|f| match f
        {
            | Frame::Url(u) => Some(u.url.as_str()),
            | Frame::UserUrl(u) => Some(u.url.as_str()),
            | _ => None
        })
    }

    pub fn artwork_bytes(&self) -> Option<&[u8]>
    {
        self.subframes.iter().find_map(|f| if let Frame::AttachedPicture(p) = f { Some(p.data.as_slice()) } else { None })
    }
}

fn decode_iso88591_inverse(text: &str) -> Vec<u8>
{
    crate::id3v2::text_encoding::encode_iso88591(text)
}

fn parse_subframes(raw: Vec<RawFrame>, version_major: u8) -> Vec<Frame>
{
    raw.into_iter().filter_map(|r| Frame::parse(&r.id, &r.data, version_major).ok()).collect()
}

impl fmt::Display for ChapterFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} [{}ms-{}ms] \"{}\"", self.element_id, self.start_ms, self.end_ms, self.title().unwrap_or_default())
    }
}
