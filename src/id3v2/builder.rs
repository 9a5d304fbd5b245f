//! Tag builder (§4.2.8): serializes an `AudioFileInfo` plus preserved
//! unknown frames into a complete tag, with configurable trailing padding.

use crate::binio::encode_syncsafe;
use crate::error::Id3Error;
use crate::id3v2::frames::attached_picture::{AttachedPictureFrame, PICTURE_TYPE_FRONT_COVER};
use crate::id3v2::frames::chapter::ChapterFrame;
use crate::id3v2::frames::comment::CommentFrame;
use crate::id3v2::frames::play_count::{PlayCountFrame, PopularimeterFrame};
use crate::id3v2::frames::sync_lyrics::{SyncLyricsEvent, SyncLyricsFrame};
use crate::id3v2::frames::table_of_contents::TableOfContentsFrame;
use crate::id3v2::frames::text::TextFrame;
use crate::id3v2::frames::unique_file_id::OwnerDataFrame;
use crate::id3v2::frames::url::UrlFrame;
use crate::id3v2::frames::user_text::UserTextFrame;
use crate::id3v2::frames::user_url::UserUrlFrame;
use crate::id3v2::header::{HEADER_SIZE, Id3Header};
use crate::id3v2::raw_frame;
use crate::model::chapter::ChapterList;
use crate::model::metadata::{AudioMetadata, OpaqueFrame};

/// Default trailing padding in bytes (§4.2.8, §4.2.10).
pub const DEFAULT_PADDING: usize = 2048;

/// Options controlling tag construction.
#[derive(Debug, Clone, Copy)]
pub struct WriteOptions
{
    pub version_major: u8,
    pub padding:        usize
}

impl Default for WriteOptions
{
    fn default() -> Self
    {
        Self { version_major: 4, padding: DEFAULT_PADDING }
    }
}

/// Build the full tag byte sequence (header + frames + padding) for
/// `metadata`/`chapters`, re-emitting `unknown_frames` verbatim.
pub fn build_tag(metadata: &AudioMetadata, chapters: &ChapterList, unknown_frames: &[OpaqueFrame], options: WriteOptions) -> Result<Vec<u8>, Id3Error>
{
    let mut body = Vec::new();
    append_metadata_frames(&mut body, metadata, options.version_major)?;
    append_chapter_frames(&mut body, chapters, options.version_major)?;

    for frame in unknown_frames
    {
        let header = raw_frame::build_frame_header(&frame.id, frame.data.len() as u32, frame.flags, options.version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&frame.data);
    }

    body.extend(std::iter::repeat_n(0u8, options.padding));

    let header = Id3Header { version_major: options.version_major, revision: 0, flags: 0, tag_size: body.len() as u32 };
    let mut out = header.to_bytes().to_vec();
    out.extend(body);
    Ok(out)
}

fn push_text(body: &mut Vec<u8>, id: &str, value: &str, version_major: u8) -> Result<(), Id3Error>
{
    let payload = TextFrame::build(value, version_major);
    let header = raw_frame::build_frame_header(id, payload.len() as u32, 0, version_major)?;
    body.extend_from_slice(&header);
    body.extend_from_slice(&payload);
    Ok(())
}

fn push_url(body: &mut Vec<u8>, id: &str, url: &str, version_major: u8) -> Result<(), Id3Error>
{
    let payload = UrlFrame::build(url);
    let header = raw_frame::build_frame_header(id, payload.len() as u32, 0, version_major)?;
    body.extend_from_slice(&header);
    body.extend_from_slice(&payload);
    Ok(())
}

fn append_metadata_frames(body: &mut Vec<u8>, metadata: &AudioMetadata, version_major: u8) -> Result<(), Id3Error>
{
    if let Some(v) = &metadata.title
    {
        push_text(body, "TIT2", v, version_major)?;
    }
    if let Some(v) = &metadata.artist
    {
        push_text(body, "TPE1", v, version_major)?;
    }
    if let Some(v) = &metadata.album
    {
        push_text(body, "TALB", v, version_major)?;
    }
    if let Some(v) = &metadata.album_artist
    {
        push_text(body, "TPE2", v, version_major)?;
    }
    if let Some(v) = &metadata.composer
    {
        push_text(body, "TCOM", v, version_major)?;
    }
    if let Some(v) = &metadata.genre
    {
        push_text(body, "TCON", v, version_major)?;
    }
    if let Some(v) = metadata.year
    {
        let id = if version_major >= 4 { "TDRC" } else { "TYER" };
        push_text(body, id, &v.to_string(), version_major)?;
    }
    if let Some(v) = metadata.track_number
    {
        push_text(body, "TRCK", &v.to_string(), version_major)?;
    }
    if let Some(v) = metadata.disc_number
    {
        push_text(body, "TPOS", &v.to_string(), version_major)?;
    }
    if let Some(v) = &metadata.comment
    {
        let payload = CommentFrame::build("eng", "", v, version_major);
        let header = raw_frame::build_frame_header("COMM", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    if let Some(v) = &metadata.copyright
    {
        push_text(body, "TCOP", v, version_major)?;
    }
    if let Some(v) = &metadata.publisher
    {
        push_text(body, "TPUB", v, version_major)?;
    }
    if let Some(v) = &metadata.encoder
    {
        push_text(body, "TENC", v, version_major)?;
    }
    if let Some(v) = metadata.bpm
    {
        push_text(body, "TBPM", &v.to_string(), version_major)?;
    }
    if let Some(v) = &metadata.key
    {
        push_text(body, "TKEY", v, version_major)?;
    }
    if let Some(v) = &metadata.language
    {
        push_text(body, "TLAN", v, version_major)?;
    }
    if let Some(v) = &metadata.isrc
    {
        push_text(body, "TSRC", v, version_major)?;
    }
    if let Some(v) = &metadata.unsynchronized_lyrics
    {
        let payload = CommentFrame::build("eng", "", v, version_major);
        let header = raw_frame::build_frame_header("USLT", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    for lyrics in &metadata.synchronized_lyrics
    {
        append_sylt_frame(body, lyrics, version_major)?;
    }
    if let Some(art) = &metadata.artwork
    {
        let payload = AttachedPictureFrame::build(art.format.mime_type(), PICTURE_TYPE_FRONT_COVER, "", &art.data, version_major);
        let header = raw_frame::build_frame_header("APIC", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    if let Some(v) = &metadata.artist_url
    {
        push_url(body, "WOAR", v, version_major)?;
    }
    if let Some(v) = &metadata.audio_source_url
    {
        push_url(body, "WOAS", v, version_major)?;
    }
    if let Some(v) = &metadata.audio_file_url
    {
        push_url(body, "WOAF", v, version_major)?;
    }
    if let Some(v) = &metadata.publisher_url
    {
        push_url(body, "WPUB", v, version_major)?;
    }
    if let Some(v) = &metadata.commercial_url
    {
        push_url(body, "WCOM", v, version_major)?;
    }
    for (key, value) in &metadata.custom_text_fields
    {
        let payload = UserTextFrame::build(key, value, version_major);
        let header = raw_frame::build_frame_header("TXXX", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    for (key, value) in &metadata.custom_urls
    {
        let payload = UserUrlFrame::build(key, value, version_major);
        let header = raw_frame::build_frame_header("WXXX", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    for private in &metadata.private_data
    {
        let payload = OwnerDataFrame::build(&private.owner, &private.bytes);
        let header = raw_frame::build_frame_header("PRIV", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    for ufid in &metadata.unique_file_identifiers
    {
        let payload = OwnerDataFrame::build(&ufid.owner, &ufid.bytes);
        let header = raw_frame::build_frame_header("UFID", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    if let Some(count) = metadata.play_count
    {
        let payload = PlayCountFrame::build(count);
        let header = raw_frame::build_frame_header("PCNT", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }
    if let Some(rating) = metadata.rating
    {
        let payload = PopularimeterFrame::build("", rating, metadata.play_count.unwrap_or(0));
        let header = raw_frame::build_frame_header("POPM", payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&header);
        body.extend_from_slice(&payload);
    }

    Ok(())
}

fn append_sylt_frame(body: &mut Vec<u8>, lyrics: &crate::model::lyrics::SynchronizedLyrics, version_major: u8) -> Result<(), Id3Error>
{
    let events: Vec<SyncLyricsEvent> = lyrics.lines.iter().map(|line| SyncLyricsEvent { text: line.text.clone(), ms: line.time.as_millis().max(0) as u32 }).collect();
    let payload = SyncLyricsFrame::build(&lyrics.language, lyrics.content_type, &lyrics.descriptor, &events, version_major);
    let header = raw_frame::build_frame_header("SYLT", payload.len() as u32, 0, version_major)?;
    body.extend_from_slice(&header);
    body.extend_from_slice(&payload);
    Ok(())
}

/// Emit one `CTOC` (element ID `"toc"`, top-level + ordered) followed by one
/// `CHAP` per chapter, per §4.2.7.
fn append_chapter_frames(body: &mut Vec<u8>, chapters: &ChapterList, version_major: u8) -> Result<(), Id3Error>
{
    if chapters.is_empty()
    {
        return Ok(());
    }

    let child_ids: Vec<String> = (0..chapters.len()).map(|i| format!("chp{i}")).collect();
    let toc_payload = TableOfContentsFrame::build("toc", true, true, &child_ids);
    let toc_header = raw_frame::build_frame_header("CTOC", toc_payload.len() as u32, 0, version_major)?;
    body.extend_from_slice(&toc_header);
    body.extend_from_slice(&toc_payload);

    let ends = chapters.effective_end_times();
    for (i, chapter) in chapters.iter().enumerate()
    {
        let mut subframes: Vec<(String, Vec<u8>)> = Vec::new();
        subframes.push(("TIT2".to_string(), TextFrame::build(&chapter.title_or_synthesized(i), version_major)));
        if let Some(url) = &chapter.url
        {
            subframes.push(("WOAR".to_string(), UrlFrame::build(url)));
        }
        if let Some(art) = &chapter.artwork
        {
            subframes.push(("APIC".to_string(), AttachedPictureFrame::build(art.format.mime_type(), PICTURE_TYPE_FRONT_COVER, "", &art.data, version_major)));
        }

        let start_ms = chapter.start.as_millis().max(0) as u32;
        let end_ms = ends[i].as_millis().max(0) as u32;
        let chap_payload = ChapterFrame::build(&child_ids[i], start_ms, end_ms, &subframes, version_major)?;
        let chap_header = raw_frame::build_frame_header("CHAP", chap_payload.len() as u32, 0, version_major)?;
        body.extend_from_slice(&chap_header);
        body.extend_from_slice(&chap_payload);
    }

    Ok(())
}

/// Recompute the header's syncsafe size field in place after external edits
/// to `tag[HEADER_SIZE..]` (used by the in-place write path).
pub fn patch_tag_size(tag: &mut [u8])
{
    let body_len = (tag.len() - HEADER_SIZE) as u32;
    let size = encode_syncsafe(body_len);
    tag[6] = size[0];
    tag[7] = size[1];
    tag[8] = size[2];
    tag[9] = size[3];
}
