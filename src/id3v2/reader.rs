//! Tag reader (§4.2.9): header parse, extended-header skip, tag-level
//! unsynchronization, frame walk, and mapping onto `AudioFileInfo`.

use tracing::trace;

use crate::error::Id3Error;
use crate::id3v2::frame::Frame;
use crate::id3v2::frames::chapter::ChapterFrame;
use crate::id3v2::frames::table_of_contents::TableOfContentsFrame;
use crate::id3v2::header::{self, HEADER_SIZE, Id3Header};
use crate::id3v2::raw_frame::{self, RawFrame};
use crate::io::ByteReader;
use crate::model::chapter::{Chapter, ChapterList};
use crate::model::lyrics::SynchronizedLyrics;
use crate::model::metadata::{AudioFileInfo, AudioMetadata, OpaqueFrame, PrivateFrame, UniqueFileIdentifier};

/// The outcome of reading a tag: the parsed header (so the writer can reuse
/// its version and span) alongside the domain-level file info.
pub struct TagReadResult
{
    pub header: Id3Header,
    pub info:   AudioFileInfo
}

/// Read the ID3v2 tag at the start of `path`. A missing or malformed magic
/// surfaces as `Id3Error::NoTag`.
pub fn read_tag(path: impl AsRef<std::path::Path>) -> Result<TagReadResult, Id3Error>
{
    let mut reader = ByteReader::open(path)?;
    if reader.file_size() < HEADER_SIZE as u64
    {
        return Err(Id3Error::NoTag);
    }

    let header_bytes = reader.read(0, HEADER_SIZE as u64)?;
    let header = Id3Header::parse(&header_bytes)?;

    let body_end = HEADER_SIZE as u64 + header.tag_size as u64;
    if body_end > reader.file_size()
    {
        return Err(Id3Error::TruncatedData { expected: body_end as usize, found: reader.file_size() as usize });
    }

    let mut body = reader.read(HEADER_SIZE as u64, header.tag_size as u64)?;
    if header.has_unsynchronization()
    {
        body = raw_frame::remove_unsynchronization(&body);
    }

    let mut cursor = 0usize;
    if header.has_extended_header()
    {
        cursor += header::extended_header_len(&body, header.version_major)?;
    }
    if cursor > body.len()
    {
        return Err(Id3Error::TruncatedData { expected: cursor, found: body.len() });
    }

    let raw_frames = raw_frame::walk_frames(&body[cursor..], header.version_major);
    let info = frames_to_file_info(raw_frames, header.version_major)?;

    Ok(TagReadResult { header, info })
}

fn frames_to_file_info(raw_frames: Vec<RawFrame>, version_major: u8) -> Result<AudioFileInfo, Id3Error>
{
    let mut metadata = AudioMetadata::new();
    let mut chapter_frames: Vec<ChapterFrame> = Vec::new();
    let mut toc_frame: Option<TableOfContentsFrame> = None;
    let mut unknown_frames = Vec::new();

    for raw in raw_frames
    {
        let parsed = match Frame::parse(&raw.id, &raw.data, version_major)
        {
            | Ok(frame) => frame,
            | Err(_) =>
            {
                trace!(frame_id = %raw.id, "frame not modeled, preserving as opaque");
                unknown_frames.push(OpaqueFrame { id: raw.id, flags: raw.flags, data: raw.data });
                continue;
            }
        };

        apply_frame(raw, parsed, &mut metadata, &mut chapter_frames, &mut toc_frame, &mut unknown_frames);
    }

    let chapters = build_chapter_list(chapter_frames, toc_frame);

    Ok(AudioFileInfo { metadata, chapters, unknown_frames })
}

fn apply_frame(raw: RawFrame, frame: Frame, metadata: &mut AudioMetadata, chapter_frames: &mut Vec<ChapterFrame>, toc_frame: &mut Option<TableOfContentsFrame>, unknown_frames: &mut Vec<OpaqueFrame>)
{
    let RawFrame { id, flags, data, .. } = raw;

    match frame
    {
        | Frame::Text(text) =>
        {
            if !apply_text_frame(&id, &text.text, metadata)
            {
                trace!(frame_id = %id, "text frame not mapped to a metadata field, preserving as opaque");
                unknown_frames.push(OpaqueFrame { id, flags, data });
            }
        }
        | Frame::UserDefinedText(t) => { metadata.custom_text_fields.insert(t.description, t.value); }
        | Frame::Url(u) =>
        {
            if !apply_url_frame(&id, &u.url, metadata)
            {
                trace!(frame_id = %id, "url frame not mapped to a metadata field, preserving as opaque");
                unknown_frames.push(OpaqueFrame { id, flags, data });
            }
        }
        | Frame::UserUrl(u) => { metadata.custom_urls.insert(u.description, u.url); }
        | Frame::Comment { frame, is_lyrics } =>
        {
            if is_lyrics
            {
                metadata.unsynchronized_lyrics = Some(frame.text);
            }
            else
            {
                metadata.comment = Some(frame.text);
            }
        }
        | Frame::AttachedPicture(p) =>
        {
            if let Some(art) = crate::model::artwork::Artwork::new(p.data)
            {
                metadata.artwork = Some(art);
            }
        }
        | Frame::Chapter(chap) => chapter_frames.push(chap),
        | Frame::TableOfContents(toc) => *toc_frame = Some(toc),
        | Frame::SyncLyrics(sylt) => metadata.synchronized_lyrics.push(sync_lyrics_from_frame(sylt)),
        | Frame::PrivateData(owner) => metadata.private_data.push(PrivateFrame { owner: owner.owner, bytes: owner.bytes }),
        | Frame::UniqueFileId(owner) => metadata.unique_file_identifiers.push(UniqueFileIdentifier { owner: owner.owner, bytes: owner.bytes }),
        | Frame::PlayCount(pcnt) => metadata.play_count = Some(pcnt.count),
        | Frame::Popularimeter(popm) =>
        {
            metadata.rating = Some(popm.rating);
            if metadata.play_count.is_none()
            {
                metadata.play_count = Some(popm.play_count);
            }
        }
        | Frame::Unknown { id, data } => unknown_frames.push(OpaqueFrame { id, flags, data })
    }
}

/// Maps a `T???` frame onto its `AudioMetadata` field. Returns `false` for
/// any text frame ID this crate doesn't model (e.g. `TCMP`, `TSSE`, `TLEN`),
/// so the caller can preserve it as an opaque frame instead of dropping it.
fn apply_text_frame(id: &str, text: &str, metadata: &mut AudioMetadata) -> bool
{
    match id
    {
        | "TIT2" => metadata.title = Some(text.to_string()),
        | "TPE1" => metadata.artist = Some(text.to_string()),
        | "TALB" => metadata.album = Some(text.to_string()),
        | "TPE2" => metadata.album_artist = Some(text.to_string()),
        | "TCOM" => metadata.composer = Some(text.to_string()),
        | "TCON" => metadata.genre = Some(text.to_string()),
        | "TYER" | "TDRC" => metadata.year = parse_year(text),
        | "TRCK" => metadata.track_number = parse_number_slash_total(text),
        | "TPOS" => metadata.disc_number = parse_number_slash_total(text),
        | "TCOP" => metadata.copyright = Some(text.to_string()),
        | "TPUB" => metadata.publisher = Some(text.to_string()),
        | "TENC" => metadata.encoder = Some(text.to_string()),
        | "TBPM" => metadata.bpm = text.parse().ok(),
        | "TKEY" => metadata.key = Some(text.to_string()),
        | "TLAN" => metadata.language = Some(text.to_string()),
        | "TSRC" => metadata.isrc = Some(text.to_string()),
        | _ => return false
    }
    true
}

/// Maps a `W???` frame onto its `AudioMetadata` field. Returns `false` for
/// any URL frame ID this crate doesn't model (e.g. `WCOP`, `WORS`, `WPAY`),
/// so the caller can preserve it as an opaque frame instead of dropping it.
fn apply_url_frame(id: &str, url: &str, metadata: &mut AudioMetadata) -> bool
{
    match id
    {
        | "WOAR" => metadata.artist_url = Some(url.to_string()),
        | "WOAS" => metadata.audio_source_url = Some(url.to_string()),
        | "WOAF" => metadata.audio_file_url = Some(url.to_string()),
        | "WPUB" => metadata.publisher_url = Some(url.to_string()),
        | "WCOM" => metadata.commercial_url = Some(url.to_string()),
        | _ => return false
    }
    true
}

/// `"n"` or `"n/total"` parses to `n`; non-numeric forms yield `None` (§4.2.6).
fn parse_number_slash_total(text: &str) -> Option<i32>
{
    text.split('/').next().and_then(|s| s.trim().parse().ok())
}

/// `TYER` is `"YYYY"`; `TDRC` is ISO 8601 — take the first four digits (§4.2.6).
fn parse_year(text: &str) -> Option<i32>
{
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() >= 4 { digits[..4].parse().ok() } else { None }
}

fn sync_lyrics_from_frame(sylt: crate::id3v2::frames::sync_lyrics::SyncLyricsFrame) -> SynchronizedLyrics
{
    use crate::model::lyrics::LyricLine;
    use crate::model::timestamp::AudioTimestamp;

    let language = sylt.language_str();
    let lines = sylt
        .events
        .into_iter()
        .filter_map(|event| AudioTimestamp::from_millis(event.ms as i64).ok().map(|time| LyricLine::new(time, event.text)))
        .collect();

    SynchronizedLyrics { language, content_type: sylt.content_type, descriptor: sylt.descriptor, lines }
}

/// Build a `ChapterList` from the parsed `CHAP` frames, in appearance order
/// (the table-of-contents ordering is structural metadata only; this crate
/// trusts frame appearance order and lets `ChapterList` re-sort by start).
fn build_chapter_list(chapter_frames: Vec<ChapterFrame>, _toc: Option<TableOfContentsFrame>) -> ChapterList
{
    let chapters: Vec<Chapter> = chapter_frames
        .into_iter()
        .filter_map(|chap| {
            let start = crate::model::timestamp::AudioTimestamp::from_millis(chap.start_ms as i64).ok()?;
            let end = crate::model::timestamp::AudioTimestamp::from_millis(chap.end_ms as i64).ok();
            let artwork = chap.artwork_bytes().and_then(|bytes| crate::model::artwork::Artwork::new(bytes.to_vec()));
            Some(Chapter { start, title: chap.title().unwrap_or_default().to_string(), end, url: chap.url().map(|s| s.to_string()), artwork })
        })
        .collect();

    ChapterList::from_unsorted(chapters)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::id3v2::frames::text::TextFrame;
    use crate::id3v2::frames::url::UrlFrame;

    fn text_frame(id: &str, text: &str) -> RawFrame
    {
        RawFrame { id: id.to_string(), size: 0, flags: 0, data: TextFrame::build(text, 4) }
    }

    fn url_frame(id: &str, url: &str) -> RawFrame
    {
        RawFrame { id: id.to_string(), size: 0, flags: 0, data: UrlFrame::build(url) }
    }

    #[test]
    fn unmapped_text_frame_is_preserved_as_opaque()
    {
        let info = frames_to_file_info(vec![text_frame("TSSE", "LAME 3.100")], 4).unwrap();
        assert_eq!(info.unknown_frames.len(), 1);
        assert_eq!(info.unknown_frames[0].id, "TSSE");
    }

    #[test]
    fn unmapped_url_frame_is_preserved_as_opaque()
    {
        let info = frames_to_file_info(vec![url_frame("WORS", "https://example.invalid/stream")], 4).unwrap();
        assert_eq!(info.unknown_frames.len(), 1);
        assert_eq!(info.unknown_frames[0].id, "WORS");
    }

    #[test]
    fn mapped_text_and_url_frames_are_not_preserved_as_opaque()
    {
        let info = frames_to_file_info(vec![text_frame("TIT2", "Title"), url_frame("WOAR", "https://example.invalid/artist")], 4).unwrap();
        assert!(info.unknown_frames.is_empty());
        assert_eq!(info.metadata.title.as_deref(), Some("Title"));
        assert_eq!(info.metadata.artist_url.as_deref(), Some("https://example.invalid/artist"));
    }
}
