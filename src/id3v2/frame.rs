//! `Frame`: the tagged union of every ID3v2 frame shape this crate
//! understands, plus the dispatch table deciding which shape an ID maps to
//! (§4.2.5).

use std::fmt;

use crate::error::Id3Error;
use crate::id3v2::frames::attached_picture::AttachedPictureFrame;
use crate::id3v2::frames::chapter::ChapterFrame;
use crate::id3v2::frames::comment::CommentFrame;
use crate::id3v2::frames::play_count::{PlayCountFrame, PopularimeterFrame};
use crate::id3v2::frames::sync_lyrics::SyncLyricsFrame;
use crate::id3v2::frames::table_of_contents::TableOfContentsFrame;
use crate::id3v2::frames::text::TextFrame;
use crate::id3v2::frames::unique_file_id::{PrivateDataFrame, UniqueFileIdFrame};
use crate::id3v2::frames::user_text::UserTextFrame;
use crate::id3v2::frames::user_url::UserUrlFrame;
use crate::id3v2::frames::url::UrlFrame;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame
{
    Text(TextFrame),
    UserDefinedText(UserTextFrame),
    Url(UrlFrame),
    UserUrl(UserUrlFrame),
    /// `COMM` and `USLT` share this shape; `is_lyrics` distinguishes which
    /// frame ID produced it so the builder can round-trip the right one.
    Comment { frame: CommentFrame, is_lyrics: bool },
    AttachedPicture(AttachedPictureFrame),
    Chapter(ChapterFrame),
    TableOfContents(TableOfContentsFrame),
    SyncLyrics(SyncLyricsFrame),
    PrivateData(PrivateDataFrame),
    UniqueFileId(UniqueFileIdFrame),
    PlayCount(PlayCountFrame),
    Popularimeter(PopularimeterFrame),
    /// Any other ID; preserved verbatim across writes.
    Unknown { id: String, data: Vec<u8> }
}

impl Frame
{
    /// Parse a frame's payload given its 4-character ID. Unknown IDs become
    /// `Frame::Unknown` rather than failing, so callers can preserve them.
    pub fn parse(id: &str, data: &[u8], version_major: u8) -> Result<Self, Id3Error>
    {
        match id
        {
            | "TXXX" => Ok(Frame::UserDefinedText(UserTextFrame::parse(data)?)),
            | "WXXX" => Ok(Frame::UserUrl(UserUrlFrame::parse(data)?)),
            | "COMM" => Ok(Frame::Comment { frame: CommentFrame::parse(id, data)?, is_lyrics: false }),
            | "USLT" => Ok(Frame::Comment { frame: CommentFrame::parse(id, data)?, is_lyrics: true }),
            | "APIC" => Ok(Frame::AttachedPicture(AttachedPictureFrame::parse(data)?)),
            | "CHAP" => Ok(Frame::Chapter(ChapterFrame::parse(data, version_major)?)),
            | "CTOC" => Ok(Frame::TableOfContents(TableOfContentsFrame::parse(data, version_major)?)),
            | "SYLT" => Ok(Frame::SyncLyrics(SyncLyricsFrame::parse(data)?)),
            | "PRIV" => Ok(Frame::PrivateData(PrivateDataFrame::parse(id, data)?)),
            | "UFID" => Ok(Frame::UniqueFileId(UniqueFileIdFrame::parse(id, data)?)),
            | "PCNT" => Ok(Frame::PlayCount(PlayCountFrame::parse(data)?)),
            | "POPM" => Ok(Frame::Popularimeter(PopularimeterFrame::parse(data)?)),
            | _ if id.starts_with('T') => Ok(Frame::Text(TextFrame::parse(id, data)?)),
            | _ if id.starts_with('W') => Ok(Frame::Url(UrlFrame::parse(id, data)?)),
            | _ => Ok(Frame::Unknown { id: id.to_string(), data: data.to_vec() })
        }
    }

    /// The frame's 4-character ID, where it's statically known (text/URL
    /// frames need their original ID supplied separately since many IDs map
    /// to the same shape).
    pub fn unknown_id(&self) -> Option<&str>
    {
        match self
        {
            | Frame::Unknown { id, .. } => Some(id),
            | _ => None
        }
    }
}

impl fmt::Display for Frame
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            | Frame::Text(t) => write!(f, "{t}"),
            | Frame::UserDefinedText(t) => write!(f, "{t}"),
            | Frame::Url(u) => write!(f, "{u}"),
            | Frame::UserUrl(u) => write!(f, "{u}"),
            | Frame::Comment { frame, .. } => write!(f, "{frame}"),
            | Frame::AttachedPicture(p) => write!(f, "{p}"),
            | Frame::Chapter(c) => write!(f, "{c}"),
            | Frame::TableOfContents(t) => write!(f, "{t}"),
            | Frame::SyncLyrics(s) => write!(f, "{s}"),
            | Frame::PrivateData(p) => write!(f, "{p}"),
            | Frame::UniqueFileId(u) => write!(f, "{u}"),
            | Frame::PlayCount(p) => write!(f, "{p}"),
            | Frame::Popularimeter(p) => write!(f, "{p}"),
            | Frame::Unknown { id, data } => write!(f, "{id} ({} bytes, unparsed)", data.len())
        }
    }
}
