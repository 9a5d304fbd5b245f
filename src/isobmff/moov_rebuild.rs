//! Rebuilds the `moov` atom for a write: new `ilst`/`chpl` metadata, a
//! synthetic chapter text track, and (when any chapter carries artwork) a
//! synthetic artwork video track (§4.3.5).
//!
//! Every nested atom is written directly into one growing buffer with
//! [`begin_atom`]/[`end_atom`] bookkeeping rather than assembled bottom-up
//! and concatenated, so that `stco` placeholder positions can be recorded
//! as plain indices into that buffer (§9 "keep those positions as byte
//! offsets within the returned buffer; patch by overwriting ... before the
//! buffer leaves the builder").

use crate::error::Mp4Error;
use crate::io::ByteReader;
use crate::isobmff::atom::Atom;
use crate::isobmff::builder;
use crate::isobmff::fields;
use crate::model::{AudioMetadata, ChapterList};

pub struct RebuiltMoov
{
    pub moov:                     Vec<u8>,
    pub chapter_sample_data:      Vec<u8>,
    pub artwork_sample_data:      Vec<u8>,
    /// Absolute byte positions within `moov` of each chapter-track `stco`
    /// entry, in sample order.
    pub text_track_stco_positions: Vec<usize>,
    /// Same, for the artwork video track.
    pub video_track_stco_positions: Vec<usize>,
    /// Per-sample byte sizes within `chapter_sample_data`, in the same order
    /// as `text_track_stco_positions`, so the writer can compute each
    /// sample's absolute file offset without re-deriving sample boundaries.
    pub text_sample_sizes:        Vec<u32>,
    /// Same, for `artwork_sample_data`.
    pub artwork_sample_sizes:     Vec<u32>
}

fn begin_atom(buf: &mut Vec<u8>, box_type: &[u8; 4]) -> usize
{
    let pos = buf.len();
    buf.extend_from_slice(&0u32.to_be_bytes());
    buf.extend_from_slice(box_type);
    pos
}

fn end_atom(buf: &mut Vec<u8>, pos: usize)
{
    let size = (buf.len() - pos) as u32;
    buf[pos..pos + 4].copy_from_slice(&size.to_be_bytes());
}

fn push_u32(buf: &mut Vec<u8>, v: u32)
{
    buf.extend_from_slice(&v.to_be_bytes());
}

fn push_u16(buf: &mut Vec<u8>, v: u16)
{
    buf.extend_from_slice(&v.to_be_bytes());
}

pub fn rebuild(reader: &mut ByteReader, moov: &Atom, metadata: &AudioMetadata, chapters: &ChapterList) -> Result<RebuiltMoov, Mp4Error>
{
    let mvhd = moov.child("mvhd").ok_or_else(|| Mp4Error::AtomNotFound("moov.mvhd".into()))?;
    let (movie_timescale, movie_duration) = fields::read_timescale_duration(reader, mvhd)?;

    let audio_track_id = find_audio_track_id(reader, moov)?;
    let referenced_ids = audio_chap_reference_ids(reader, moov)?;
    let removed_ids = removed_track_ids(reader, moov, &referenced_ids)?;
    let max_track_id = max_track_id(reader, moov)?;

    let has_chapters = !chapters.is_empty();
    let has_artwork = chapters.iter().any(|c| c.artwork.is_some());

    let new_text_track_id = max_track_id + 1;
    let new_video_track_id = max_track_id + 2;

    let mut buf = Vec::new();
    let moov_pos = begin_atom(&mut buf, b"moov");

    for child in &moov.children
    {
        match child.box_type.as_str()
        {
            | "udta" => continue,
            | "trak" =>
            {
                let tkhd = child.child("tkhd").ok_or_else(|| Mp4Error::AtomNotFound("trak.tkhd".into()))?;
                let track_id = fields::read_track_id(reader, tkhd)?;
                if removed_ids.contains(&track_id)
                {
                    continue;
                }
                if Some(track_id) == audio_track_id
                {
                    let chap_target = if has_chapters { Some(new_text_track_id) } else { None };
                    let bytes = rebuild_audio_track(reader, child, chap_target)?;
                    buf.extend_from_slice(&bytes);
                }
                else
                {
                    buf.extend_from_slice(&reader.read(child.offset, child.size)?);
                }
            }
            | _ => buf.extend_from_slice(&reader.read(child.offset, child.size)?)
        }
    }

    let mut text_stco_positions = Vec::new();
    let mut chapter_sample_data = Vec::new();
    let mut text_sample_sizes = Vec::new();

    if has_chapters
    {
        let (sample_data, sample_sizes, stco_positions) = append_chapter_track(&mut buf, new_text_track_id, movie_timescale, movie_duration, chapters);
        chapter_sample_data = sample_data;
        text_sample_sizes = sample_sizes;
        text_stco_positions = stco_positions;
    }

    let mut video_stco_positions = Vec::new();
    let mut artwork_sample_data = Vec::new();
    let mut artwork_sample_sizes = Vec::new();

    if has_artwork
    {
        let (sample_data, sample_sizes, stco_positions) = append_artwork_track(&mut buf, new_video_track_id, movie_timescale, chapters);
        artwork_sample_data = sample_data;
        artwork_sample_sizes = sample_sizes;
        video_stco_positions = stco_positions;
    }

    let udta = build_udta(metadata, chapters);
    buf.extend_from_slice(&udta);

    end_atom(&mut buf, moov_pos);

    Ok(RebuiltMoov {
        moov: buf,
        chapter_sample_data,
        artwork_sample_data,
        text_track_stco_positions: text_stco_positions,
        video_track_stco_positions: video_stco_positions,
        text_sample_sizes,
        artwork_sample_sizes
    })
}

fn find_audio_track_id(reader: &mut ByteReader, moov: &Atom) -> Result<Option<u32>, Mp4Error>
{
    for trak in moov.children_of("trak")
    {
        let Some(mdia) = trak.child("mdia")
        else { continue };
        let Some(hdlr) = mdia.child("hdlr")
        else { continue };
        if fields::read_handler_type(reader, hdlr)? == "soun"
        {
            let tkhd = trak.child("tkhd").ok_or_else(|| Mp4Error::AtomNotFound("trak.tkhd".into()))?;
            return Ok(Some(fields::read_track_id(reader, tkhd)?));
        }
    }
    Ok(None)
}

fn audio_chap_reference_ids(reader: &mut ByteReader, moov: &Atom) -> Result<Vec<u32>, Mp4Error>
{
    for trak in moov.children_of("trak")
    {
        let Some(mdia) = trak.child("mdia")
        else { continue };
        let Some(hdlr) = mdia.child("hdlr")
        else { continue };
        if fields::read_handler_type(reader, hdlr)? != "soun"
        {
            continue;
        }
        if let Some(tref) = trak.child("tref")
        {
            if let Some(chap) = tref.child("chap")
            {
                return fields::read_reference_track_ids(reader, chap);
            }
        }
    }
    Ok(Vec::new())
}

/// Every track to drop from the rebuilt `moov`: text/subtitle handler
/// tracks, plus anything the audio track's `tref.chap` references (§4.3.5
/// step 2).
fn removed_track_ids(reader: &mut ByteReader, moov: &Atom, referenced: &[u32]) -> Result<Vec<u32>, Mp4Error>
{
    let mut removed: Vec<u32> = referenced.to_vec();
    for trak in moov.children_of("trak")
    {
        let Some(mdia) = trak.child("mdia")
        else { continue };
        let Some(hdlr) = mdia.child("hdlr")
        else { continue };
        let handler = fields::read_handler_type(reader, hdlr)?;
        if handler == "text" || handler == "sbtl"
        {
            let tkhd = trak.child("tkhd").ok_or_else(|| Mp4Error::AtomNotFound("trak.tkhd".into()))?;
            removed.push(fields::read_track_id(reader, tkhd)?);
        }
    }
    removed.sort_unstable();
    removed.dedup();
    Ok(removed)
}

fn max_track_id(reader: &mut ByteReader, moov: &Atom) -> Result<u32, Mp4Error>
{
    let mut max_id = 0u32;
    for trak in moov.children_of("trak")
    {
        if let Some(tkhd) = trak.child("tkhd")
        {
            max_id = max_id.max(fields::read_track_id(reader, tkhd)?);
        }
    }
    Ok(max_id)
}

/// Re-emit the audio track verbatim except for its `tref`: add/refresh a
/// `chap` entry pointing at `chap_target`, or drop `tref` entirely when
/// `chap_target` is `None` (§4.3.5 step 4).
fn rebuild_audio_track(reader: &mut ByteReader, trak: &Atom, chap_target: Option<u32>) -> Result<Vec<u8>, Mp4Error>
{
    let mut buf = Vec::new();
    let trak_pos = begin_atom(&mut buf, b"trak");

    let mut wrote_tref = false;
    for child in &trak.children
    {
        if child.box_type == "tref"
        {
            wrote_tref = true;
            if let Some(target) = chap_target
            {
                write_tref(&mut buf, target);
            }
            continue;
        }
        buf.extend_from_slice(&reader.read(child.offset, child.size)?);
    }
    if !wrote_tref
    {
        if let Some(target) = chap_target
        {
            write_tref(&mut buf, target);
        }
    }

    end_atom(&mut buf, trak_pos);
    Ok(buf)
}

fn write_tref(buf: &mut Vec<u8>, target_track_id: u32)
{
    let tref_pos = begin_atom(buf, b"tref");
    let chap_pos = begin_atom(buf, b"chap");
    push_u32(buf, target_track_id);
    end_atom(buf, chap_pos);
    end_atom(buf, tref_pos);
}

fn identity_matrix(buf: &mut Vec<u8>)
{
    for v in [0x0001_0000u32, 0, 0, 0, 0x0001_0000, 0, 0, 0, 0x4000_0000]
    {
        push_u32(buf, v);
    }
}

fn write_tkhd(buf: &mut Vec<u8>, track_id: u32, duration: u32, width: u32, height: u32)
{
    let pos = begin_atom(buf, b"tkhd");
    buf.push(0); // version
    buf.extend_from_slice(&[0, 0, 1]); // flags: track enabled
    push_u32(buf, 0); // creation_time
    push_u32(buf, 0); // modification_time
    push_u32(buf, track_id);
    push_u32(buf, 0); // reserved
    push_u32(buf, duration);
    buf.extend_from_slice(&[0u8; 8]); // reserved
    push_u16(buf, 0); // layer
    push_u16(buf, 0); // alternate_group
    push_u16(buf, 0); // volume
    push_u16(buf, 0); // reserved
    identity_matrix(buf);
    push_u32(buf, width << 16);
    push_u32(buf, height << 16);
    end_atom(buf, pos);
}

fn write_mdhd(buf: &mut Vec<u8>, timescale: u32, duration: u32)
{
    let pos = begin_atom(buf, b"mdhd");
    buf.push(0);
    buf.extend_from_slice(&[0, 0, 0]);
    push_u32(buf, 0);
    push_u32(buf, 0);
    push_u32(buf, timescale);
    push_u32(buf, duration);
    push_u16(buf, 0x55C4); // packed ISO-639-2 "und"
    push_u16(buf, 0);
    end_atom(buf, pos);
}

fn write_hdlr(buf: &mut Vec<u8>, handler_type: &[u8; 4], name: &str)
{
    let pos = begin_atom(buf, b"hdlr");
    push_u32(buf, 0);
    push_u32(buf, 0); // pre_defined
    buf.extend_from_slice(handler_type);
    buf.extend_from_slice(&[0u8; 12]); // reserved
    buf.extend_from_slice(name.as_bytes());
    buf.push(0);
    end_atom(buf, pos);
}

fn write_minimal_dinf(buf: &mut Vec<u8>)
{
    let dinf_pos = begin_atom(buf, b"dinf");
    let dref_pos = begin_atom(buf, b"dref");
    push_u32(buf, 0);
    push_u32(buf, 1);
    let url_pos = begin_atom(buf, b"url ");
    push_u32(buf, 1); // flags = self-contained
    end_atom(buf, url_pos);
    end_atom(buf, dref_pos);
    end_atom(buf, dinf_pos);
}

fn write_tx3g_sample_description(buf: &mut Vec<u8>)
{
    let pos = begin_atom(buf, b"tx3g");
    buf.extend_from_slice(&[0u8; 6]); // reserved
    push_u16(buf, 1); // data_reference_index
    push_u32(buf, 0); // displayFlags
    buf.push(0); // horizontal justification
    buf.push(0); // vertical justification
    buf.extend_from_slice(&[0u8; 4]); // background color rgba
    buf.extend_from_slice(&[0u8; 8]); // default text box
    push_u32(buf, 0); // reserved
    push_u16(buf, 1); // font ID
    buf.push(0); // face style flags
    buf.push(12); // font size
    buf.extend_from_slice(&[0, 0, 0, 0xFF]); // text color rgba (opaque black)
    end_atom(buf, pos);
}

fn write_visual_sample_description(buf: &mut Vec<u8>, format: &[u8; 4], width: u16, height: u16)
{
    let pos = begin_atom(buf, format);
    buf.extend_from_slice(&[0u8; 6]);
    push_u16(buf, 1); // data_reference_index
    push_u16(buf, 0); // pre_defined
    push_u16(buf, 0); // reserved
    push_u32(buf, 0);
    push_u32(buf, 0);
    push_u32(buf, 0); // pre_defined x3
    push_u16(buf, width);
    push_u16(buf, height);
    push_u32(buf, 0x0048_0000); // horizresolution 72dpi
    push_u32(buf, 0x0048_0000); // vertresolution
    push_u32(buf, 0); // reserved
    push_u16(buf, 1); // frame_count
    buf.extend_from_slice(&[0u8; 32]); // compressorname
    push_u16(buf, 0x0018); // depth
    buf.extend_from_slice(&[0xFF, 0xFF]); // pre_defined = -1
    end_atom(buf, pos);
}

fn build_tx3g_sample(title: &str, url: Option<&str>) -> Vec<u8>
{
    let mut sample = Vec::new();
    let title_bytes = title.as_bytes();
    push_u16(&mut sample, title_bytes.len() as u16);
    sample.extend_from_slice(title_bytes);
    if let Some(url) = url
    {
        let url_bytes = url.as_bytes();
        let mut href = Vec::new();
        push_u16(&mut href, 0); // flags
        push_u16(&mut href, 0); // char count
        href.push(url_bytes.len() as u8);
        href.extend_from_slice(url_bytes);
        push_u16(&mut href, 0);
        sample.extend_from_slice(&builder::atom(b"href", &href));
    }
    sample
}

/// Build the synthetic chapter text track (§4.3.5 step 5), appending it
/// directly into `buf`. Returns the concatenated sample bytes, per-sample
/// sizes, and the absolute positions (within `buf`) of each `stco` entry.
fn append_chapter_track(buf: &mut Vec<u8>, track_id: u32, movie_timescale: u32, movie_duration: u64, chapters: &ChapterList) -> (Vec<u8>, Vec<u32>, Vec<usize>)
{
    let n = chapters.len();
    let starts_ticks: Vec<u64> = chapters.iter().map(|c| (c.start.as_millis().max(0) as u64) * movie_timescale as u64 / 1000).collect();
    let durations: Vec<u32> = (0..n)
        .map(|i| if i + 1 < n { (starts_ticks[i + 1] - starts_ticks[i]) as u32 } else { movie_duration.saturating_sub(starts_ticks[i]) as u32 })
        .collect();

    let mut sample_data = Vec::new();
    let mut sample_sizes = Vec::new();
    for (i, chapter) in chapters.iter().enumerate()
    {
        let sample = build_tx3g_sample(&chapter.title_or_synthesized(i), chapter.url.as_deref());
        sample_sizes.push(sample.len() as u32);
        sample_data.extend_from_slice(&sample);
    }

    let trak_pos = begin_atom(buf, b"trak");
    write_tkhd(buf, track_id, movie_duration as u32, 0, 0);

    let mdia_pos = begin_atom(buf, b"mdia");
    write_mdhd(buf, movie_timescale, movie_duration as u32);
    write_hdlr(buf, b"text", "Chapters");

    let minf_pos = begin_atom(buf, b"minf");
    let nmhd_pos = begin_atom(buf, b"nmhd");
    push_u32(buf, 0);
    end_atom(buf, nmhd_pos);
    write_minimal_dinf(buf);

    let stbl_pos = begin_atom(buf, b"stbl");

    let stsd_pos = begin_atom(buf, b"stsd");
    push_u32(buf, 0);
    push_u32(buf, 1);
    write_tx3g_sample_description(buf);
    end_atom(buf, stsd_pos);

    let stts_pos = begin_atom(buf, b"stts");
    push_u32(buf, 0);
    push_u32(buf, n as u32);
    for duration in &durations
    {
        push_u32(buf, 1);
        push_u32(buf, *duration);
    }
    end_atom(buf, stts_pos);

    let stsc_pos = begin_atom(buf, b"stsc");
    push_u32(buf, 0);
    push_u32(buf, if n > 0 { 1 } else { 0 });
    if n > 0
    {
        push_u32(buf, 1);
        push_u32(buf, 1);
        push_u32(buf, 1);
    }
    end_atom(buf, stsc_pos);

    let stsz_pos = begin_atom(buf, b"stsz");
    push_u32(buf, 0);
    push_u32(buf, 0);
    push_u32(buf, n as u32);
    for size in &sample_sizes
    {
        push_u32(buf, *size);
    }
    end_atom(buf, stsz_pos);

    let stco_pos = begin_atom(buf, b"stco");
    push_u32(buf, 0);
    push_u32(buf, n as u32);
    let mut stco_positions = Vec::with_capacity(n);
    for _ in 0..n
    {
        stco_positions.push(buf.len());
        push_u32(buf, 0);
    }
    end_atom(buf, stco_pos);

    end_atom(buf, stbl_pos);
    end_atom(buf, minf_pos);
    end_atom(buf, mdia_pos);
    end_atom(buf, trak_pos);

    (sample_data, sample_sizes, stco_positions)
}

/// Build the synthetic artwork video track (§4.3.5 step 6). One sample per
/// chapter that has artwork; chapters without artwork are skipped (their
/// covered span merges into the surrounding sample's duration via the
/// accumulated tick count).
fn append_artwork_track(buf: &mut Vec<u8>, track_id: u32, movie_timescale: u32, chapters: &ChapterList) -> (Vec<u8>, Vec<u32>, Vec<usize>)
{
    let chapters_vec: Vec<&crate::model::Chapter> = chapters.iter().filter(|c| c.artwork.is_some()).collect();
    let n = chapters_vec.len();

    let (format, width, height) = match chapters_vec.first().and_then(|c| c.artwork.as_ref())
    {
        | Some(art) =>
        {
            let (w, h) = art.dimensions();
            (*art.format.stsd_fourcc(), w as u16, h as u16)
        }
        | None => (*b"jpeg", 0u16, 0u16)
    };

    let ends = chapters.effective_end_times();
    let starts_by_chapter: Vec<i64> = chapters.iter().map(|c| c.start.as_millis()).collect();

    let mut sample_data = Vec::new();
    let mut sample_sizes = Vec::new();
    let mut durations = Vec::new();

    for chapter in &chapters_vec
    {
        let idx = chapters.iter().position(|c| std::ptr::eq(c, *chapter)).unwrap_or(0);
        let span_ms = (ends[idx].as_millis() - starts_by_chapter[idx]).max(0) as u64;
        durations.push((span_ms * movie_timescale as u64 / 1000) as u32);
        let art = chapter.artwork.as_ref().unwrap();
        sample_sizes.push(art.data.len() as u32);
        sample_data.extend_from_slice(&art.data);
    }

    let trak_pos = begin_atom(buf, b"trak");
    write_tkhd(buf, track_id, durations.iter().map(|d| *d as u64).sum::<u64>() as u32, width as u32, height as u32);

    let mdia_pos = begin_atom(buf, b"mdia");
    write_mdhd(buf, movie_timescale, durations.iter().map(|d| *d as u64).sum::<u64>() as u32);
    write_hdlr(buf, b"vide", "Chapter Artwork");

    let minf_pos = begin_atom(buf, b"minf");
    let vmhd_pos = begin_atom(buf, b"vmhd");
    push_u32(buf, 1); // flags = 1
    push_u16(buf, 0); // graphicsmode
    buf.extend_from_slice(&[0u8; 6]); // opcolor
    end_atom(buf, vmhd_pos);
    write_minimal_dinf(buf);

    let stbl_pos = begin_atom(buf, b"stbl");

    let stsd_pos = begin_atom(buf, b"stsd");
    push_u32(buf, 0);
    push_u32(buf, 1);
    write_visual_sample_description(buf, &format, width, height);
    end_atom(buf, stsd_pos);

    let stts_pos = begin_atom(buf, b"stts");
    push_u32(buf, 0);
    push_u32(buf, n as u32);
    for duration in &durations
    {
        push_u32(buf, 1);
        push_u32(buf, *duration);
    }
    end_atom(buf, stts_pos);

    let stsc_pos = begin_atom(buf, b"stsc");
    push_u32(buf, 0);
    push_u32(buf, if n > 0 { 1 } else { 0 });
    if n > 0
    {
        push_u32(buf, 1);
        push_u32(buf, 1);
        push_u32(buf, 1);
    }
    end_atom(buf, stsc_pos);

    let stsz_pos = begin_atom(buf, b"stsz");
    push_u32(buf, 0);
    push_u32(buf, 0);
    push_u32(buf, n as u32);
    for size in &sample_sizes
    {
        push_u32(buf, *size);
    }
    end_atom(buf, stsz_pos);

    let stco_pos = begin_atom(buf, b"stco");
    push_u32(buf, 0);
    push_u32(buf, n as u32);
    let mut stco_positions = Vec::with_capacity(n);
    for _ in 0..n
    {
        stco_positions.push(buf.len());
        push_u32(buf, 0);
    }
    end_atom(buf, stco_pos);

    end_atom(buf, stbl_pos);
    end_atom(buf, minf_pos);
    end_atom(buf, mdia_pos);
    end_atom(buf, trak_pos);

    (sample_data, sample_sizes, stco_positions)
}

/// Choose the `©lyr` serialization per §4.4.2: TTML when there's more than
/// one `SynchronizedLyrics`, any karaoke segments, or any speaker
/// attribution; LRC otherwise. Falls back to plain `unsynchronizedLyrics`
/// text when there's no synchronized lyrics at all.
fn lyrics_item_text(metadata: &AudioMetadata) -> Option<String>
{
    if !metadata.synchronized_lyrics.is_empty()
    {
        let needs_ttml = metadata.synchronized_lyrics.len() > 1 || metadata.synchronized_lyrics.iter().any(|l| l.lines.iter().any(|line| line.is_karaoke() || line.has_speaker()));
        if needs_ttml
        {
            let doc = crate::lyrics::ttml::TtmlDocument::from_lyrics(&metadata.synchronized_lyrics);
            Some(doc.export_document())
        }
        else
        {
            Some(crate::lyrics::lrc::export(&metadata.synchronized_lyrics[0]))
        }
    }
    else
    {
        metadata.unsynchronized_lyrics.clone()
    }
}

fn truncate_utf8(s: &str, max_bytes: usize) -> &str
{
    if s.len() <= max_bytes
    {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end)
    {
        end -= 1;
    }
    &s[..end]
}

fn build_chpl(chapters: &ChapterList) -> Vec<u8>
{
    let mut payload = vec![1u8, 0, 0, 0];
    let count = chapters.len().min(255);
    payload.push(count as u8);
    for (i, chapter) in chapters.iter().take(count).enumerate()
    {
        let hundred_ns = (chapter.start.as_millis().max(0) as u64) * 10_000;
        payload.extend_from_slice(&hundred_ns.to_be_bytes());
        let title = chapter.title_or_synthesized(i);
        let clamped = truncate_utf8(&title, 255);
        payload.push(clamped.len() as u8);
        payload.extend_from_slice(clamped.as_bytes());
    }
    builder::atom(b"chpl", &payload)
}

fn build_udta(metadata: &AudioMetadata, chapters: &ChapterList) -> Vec<u8>
{
    let mut items = Vec::new();

    macro_rules! push_text
    {
        ($fourcc:expr, $field:expr) =>
        {
            if let Some(v) = $field
            {
                items.push(builder::text_item($fourcc, v));
            }
        };
    }

    push_text!(b"\xa9nam", &metadata.title);
    push_text!(b"\xa9ART", &metadata.artist);
    push_text!(b"aART", &metadata.album_artist);
    push_text!(b"\xa9alb", &metadata.album);
    push_text!(b"\xa9wrt", &metadata.composer);
    push_text!(b"\xa9gen", &metadata.genre);
    push_text!(b"\xa9cmt", &metadata.comment);
    push_text!(b"cprt", &metadata.copyright);
    push_text!(b"\xa9too", &metadata.encoder);

    if let Some(year) = metadata.year
    {
        items.push(builder::text_item(b"\xa9day", &year.to_string()));
    }
    if let Some(track) = metadata.track_number
    {
        items.push(builder::track_or_disc_item(b"trkn", track as u16, 0));
    }
    if let Some(disc) = metadata.disc_number
    {
        items.push(builder::track_or_disc_item(b"disk", disc as u16, 0));
    }
    if let Some(bpm) = metadata.bpm
    {
        items.push(builder::tempo_item(bpm as u16));
    }
    if let Some(art) = &metadata.artwork
    {
        items.push(builder::cover_item(art.format.itunes_type_indicator(), &art.data));
    }
    if let Some(lyr) = lyrics_item_text(metadata)
    {
        items.push(builder::text_item(b"\xa9lyr", &lyr));
    }
    for (key, value) in &metadata.custom_text_fields
    {
        if let Some((domain, name)) = key.split_once(':')
        {
            items.push(builder::reverse_dns_item(domain, name, value));
        }
    }

    let ilst = builder::container(b"ilst", &items);
    let meta = builder::meta(&[ilst]);

    let mut children = vec![meta];
    if !chapters.is_empty()
    {
        children.push(build_chpl(chapters));
    }

    builder::container(b"udta", &children)
}
