//! Private Frame (`PRIV`) and Unique File Identifier (`UFID`) share the
//! owner-string + opaque-bytes shape.

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{decode_iso88591, encode_iso88591};

#[derive(Debug, Clone, PartialEq)]
pub struct OwnerDataFrame
{
    pub owner: String,
    pub bytes: Vec<u8>
}

impl OwnerDataFrame
{
    pub fn parse(id: &str, data: &[u8]) -> Result<Self, Id3Error>
    {
        let end = data.iter().position(|&b| b == 0).ok_or_else(|| Id3Error::InvalidFrame { id: id.to_string(), reason: "missing owner terminator".into() })?;
        let owner = decode_iso88591(&data[..end]);
        let bytes = data[end + 1..].to_vec();
        Ok(OwnerDataFrame { owner, bytes })
    }

    pub fn build(owner: &str, bytes: &[u8]) -> Vec<u8>
    {
        let mut out = encode_iso88591(owner);
        out.push(0);
        out.extend_from_slice(bytes);
        out
    }
}

impl fmt::Display for OwnerDataFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} ({} bytes)", self.owner, self.bytes.len())
    }
}

pub type PrivateDataFrame = OwnerDataFrame;
pub type UniqueFileIdFrame = OwnerDataFrame;
