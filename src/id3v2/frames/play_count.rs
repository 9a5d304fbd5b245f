//! Play Counter (`PCNT`) and Popularimeter (`POPM`).
//!
//! §9's open question: the spec describes `PCNT` as a variable-width
//! big-endian counter on read, but notes the source reader assumes fixed
//! widths and the writer emits four bytes. This crate follows that as a
//! known narrow compatibility choice rather than a bug: `PlayCountFrame`
//! parses whatever width is present (at least 4 bytes, more if the counter
//! has overflowed a u32) and always writes exactly 4 bytes.

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::text_encoding::{decode_iso88591, encode_iso88591};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayCountFrame
{
    pub count: u64
}

impl PlayCountFrame
{
    pub fn parse(data: &[u8]) -> Result<Self, Id3Error>
    {
        if data.len() < 4
        {
            return Err(Id3Error::InvalidFrame { id: "PCNT".to_string(), reason: "too short".into() });
        }
        let mut count: u64 = 0;
        for &byte in data
        {
            count = (count << 8) | byte as u64;
        }
        Ok(PlayCountFrame { count })
    }

    pub fn build(count: u64) -> Vec<u8>
    {
        (count as u32).to_be_bytes().to_vec()
    }
}

impl fmt::Display for PlayCountFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{}", self.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopularimeterFrame
{
    pub email:      String,
    pub rating:     u8,
    pub play_count: u64
}

impl PopularimeterFrame
{
    pub fn parse(data: &[u8]) -> Result<Self, Id3Error>
    {
        let end = data.iter().position(|&b| b == 0).ok_or_else(|| Id3Error::InvalidFrame { id: "POPM".to_string(), reason: "missing email terminator".into() })?;
        let email = decode_iso88591(&data[..end]);

        let rest = &data[end + 1..];
        if rest.is_empty()
        {
            return Err(Id3Error::InvalidFrame { id: "POPM".to_string(), reason: "missing rating byte".into() });
        }
        let rating = rest[0];

        let mut play_count: u64 = 0;
        for &byte in &rest[1..]
        {
            play_count = (play_count << 8) | byte as u64;
        }

        Ok(PopularimeterFrame { email, rating, play_count })
    }

    pub fn build(email: &str, rating: u8, play_count: u64) -> Vec<u8>
    {
        let mut out = encode_iso88591(email);
        out.push(0);
        out.push(rating);
        out.extend_from_slice(&(play_count as u32).to_be_bytes());
        out
    }
}

impl fmt::Display for PopularimeterFrame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "{} rating={} plays={}", self.email, self.rating, self.play_count)
    }
}
