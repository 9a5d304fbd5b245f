//! `AudioMetadata` and `AudioFileInfo`, the round-trip unit read and written
//! by `AudioMarkerEngine`.

use std::collections::HashMap;

use crate::model::artwork::Artwork;
use crate::model::chapter::ChapterList;
use crate::model::lyrics::SynchronizedLyrics;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateFrame
{
    pub owner: String,
    pub bytes: Vec<u8>
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueFileIdentifier
{
    pub owner: String,
    pub bytes: Vec<u8>
}

/// A preserved, unrecognized frame/atom — the payload that makes `modify`
/// lossless for data this crate doesn't model explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueFrame
{
    pub id:    String,
    pub flags: u16,
    pub data:  Vec<u8>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioMetadata
{
    pub title:                   Option<String>,
    pub artist:                  Option<String>,
    pub album:                   Option<String>,
    pub album_artist:            Option<String>,
    pub composer:                Option<String>,
    pub genre:                   Option<String>,
    pub year:                    Option<i32>,
    pub track_number:            Option<i32>,
    pub disc_number:             Option<i32>,
    pub comment:                 Option<String>,
    pub copyright:               Option<String>,
    pub publisher:                Option<String>,
    pub encoder:                 Option<String>,
    pub bpm:                     Option<i32>,
    pub key:                     Option<String>,
    pub language:                Option<String>,
    pub isrc:                    Option<String>,
    pub unsynchronized_lyrics:   Option<String>,
    pub synchronized_lyrics:     Vec<SynchronizedLyrics>,
    pub artwork:                 Option<Artwork>,
    pub artist_url:              Option<String>,
    pub audio_source_url:        Option<String>,
    pub audio_file_url:          Option<String>,
    pub publisher_url:           Option<String>,
    pub commercial_url:          Option<String>,
    pub custom_text_fields:      HashMap<String, String>,
    pub custom_urls:             HashMap<String, String>,
    pub private_data:            Vec<PrivateFrame>,
    pub unique_file_identifiers: Vec<UniqueFileIdentifier>,
    pub play_count:              Option<u64>,
    pub rating:                  Option<u8>
}

impl AudioMetadata
{
    pub fn new() -> Self
    {
        Self::default()
    }
}

/// The round-trip unit: metadata, chapters, and whatever frames this crate
/// didn't model, kept around so `modify` can reproduce them unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioFileInfo
{
    pub metadata:       AudioMetadata,
    pub chapters:       ChapterList,
    pub unknown_frames: Vec<OpaqueFrame>
}

impl AudioFileInfo
{
    pub fn new() -> Self
    {
        Self::default()
    }
}
