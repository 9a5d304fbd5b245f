//! Table of Contents Frame (`CTOC`).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::frame::Frame;
use crate::id3v2::raw_frame::{self, RawFrame};
use crate::id3v2::text_encoding::{decode_iso88591, encode_iso88591};

const FLAG_TOP_LEVEL: u8 = 0x02;
const FLAG_ORDERED: u8 = 0x01;

#[derive(Debug, Clone, PartialEq)]
pub struct TableOfContentsFrame
{
    pub element_id:        String,
    pub is_top_level:      bool,
    pub is_ordered:        bool,
    pub child_element_ids: Vec<String>,
    pub subframes:         Vec<Frame>
}

impl TableOfContentsFrame
{
    pub fn parse(data: &[u8], version_major: u8) -> Result<Self, Id3Error>
    {
        let id_end = data.iter().position(|&b| b == 0).ok_or_else(|| Id3Error::InvalidFrame { id: "CTOC".to_string(), reason: "missing element ID terminator".into() })?;
        let element_id = decode_iso88591(&data[..id_end]);

        let rest = &data[id_end + 1..];
        if rest.len() < 2
        {
            return Err(Id3Error::InvalidFrame { id: "CTOC".to_string(), reason: "shorter than fixed prefix".into() });
        }

        // Spec's bit numbering: bit 0 top-level, bit 1 ordered. The byte
        // layout used on the wire packs top-level at 0x02 and ordered at
        // 0x01 (matching the ID3v2 Chapter Frame Addendum's CTOC flags
        // byte), so bit-index 0/1 map onto those two mask bits respectively.
        let flags = rest[0];
        let is_top_level = flags & FLAG_TOP_LEVEL != 0;
        let is_ordered = flags & FLAG_ORDERED != 0;
        let entry_count = rest[1] as usize;

        let mut pos = 2;
        let mut child_element_ids = Vec::with_capacity(entry_count);
        for _ in 0..entry_count
        {
            let end = rest[pos..].iter().position(|&b| b == 0).map(|p| pos + p).ok_or_else(|| Id3Error::InvalidFrame { id: "CTOC".to_string(), reason: "truncated child element ID list".into() })?;
            child_element_ids.push(decode_iso88591(&rest[pos..end]));
            pos = end + 1;
        }

        let raw_subframes = raw_frame::walk_frames(&rest[pos..], version_major);
        let subframes = parse_subframes(raw_subframes, version_major);

        Ok(TableOfContentsFrame { element_id, is_top_level, is_ordered, child_element_ids, subframes })
    }

    pub fn build(element_id: &str, is_top_level: bool, is_ordered: bool, child_element_ids: &[String]) -> Vec<u8>
    {
        let mut out = Vec::new();
        out.extend(encode_iso88591(element_id));
        out.push(0);

        let mut flags = 0u8;
        if is_top_level
        {
            flags |= FLAG_TOP_LEVEL;
        }
        if is_ordered
        {
            flags |= FLAG_ORDERED;
        }
        out.push(flags);
        out.push(child_element_ids.len() as u8);

        for child in child_element_ids
        {
            out.extend(encode_iso88591(child));
            out.push(0);
        }

        out
    }
}

fn parse_subframes(raw: Vec<RawFrame>, version_major: u8) -> Vec<Frame>
{
    raw.into_iter().filter_map(|r| Frame::parse(&r.id, &r.data, version_major).ok()).collect()
}

impl fmt::Display for TableOfContentsFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} ({} children)", self.element_id, self.child_element_ids.len())
    }
}
