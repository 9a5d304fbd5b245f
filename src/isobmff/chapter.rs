//! Chapter parsing from an ISOBMFF atom tree (§4.3.3): QuickTime chapter
//! tracks first, falling back to the Nero `udta.chpl` atom.

use tracing::debug;

use crate::error::Mp4Error;
use crate::io::ByteReader;
use crate::isobmff::atom::Atom;
use crate::isobmff::fields;
use crate::model::{Artwork, ArtworkFormat, Chapter, ChapterList};
use crate::model::timestamp::AudioTimestamp;

struct TextTrack
{
    track_id: u32,
    entries:  Vec<(u32 /* start tick */, String, Option<String> /* url */)>,
    timescale: u32
}

/// Parse chapters (and, when present, per-chapter artwork) from a parsed
/// `moov` atom tree.
pub fn parse_chapters(reader: &mut ByteReader, moov: &Atom) -> Result<ChapterList, Mp4Error>
{
    let text_tracks = find_candidate_text_tracks(reader, moov)?;

    if text_tracks.is_empty()
    {
        debug!("no QuickTime chapter text track found, falling back to Nero udta.chpl");
        return parse_nero_chapters(reader, moov);
    }

    let merged = merge_text_tracks(text_tracks);
    let mut chapters: Vec<Chapter> = merged
        .into_iter()
        .filter_map(|(start_ms, title, url)| {
            let start = AudioTimestamp::from_millis(start_ms as i64).ok()?;
            Some(Chapter { start, title, end: None, url, artwork: None })
        })
        .collect();

    if let Some(artworks) = find_chapter_artwork(reader, moov)?
    {
        for (chapter, art) in chapters.iter_mut().zip(artworks.into_iter())
        {
            chapter.artwork = Some(art);
        }
    }

    Ok(ChapterList::from_unsorted(chapters))
}

/// Tracks whose handler is `text`/`sbtl`; preferring ones referenced by the
/// audio track's `tref.chap`, falling back to every such track found.
fn find_candidate_text_tracks(reader: &mut ByteReader, moov: &Atom) -> Result<Vec<TextTrack>, Mp4Error>
{
    let referenced_ids = audio_chap_reference_ids(reader, moov)?;

    let mut all_text_tracks = Vec::new();
    for trak in moov.children_of("trak")
    {
        let Some(mdia) = trak.child("mdia")
        else { continue };
        let Some(hdlr) = mdia.child("hdlr")
        else { continue };
        let handler_type = fields::read_handler_type(reader, hdlr)?;
        if handler_type != "text" && handler_type != "sbtl"
        {
            continue;
        }
        let Some(tkhd) = trak.child("tkhd")
        else { continue };
        let track_id = fields::read_track_id(reader, tkhd)?;
        all_text_tracks.push((track_id, trak));
    }

    let selected: Vec<&Atom> = if referenced_ids.is_empty()
    {
        all_text_tracks.iter().map(|(_, trak)| *trak).collect()
    }
    else
    {
        all_text_tracks.iter().filter(|(id, _)| referenced_ids.contains(id)).map(|(_, trak)| *trak).collect()
    };

    selected.into_iter().map(|trak| parse_text_track(reader, trak)).collect()
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

fn parse_text_track(reader: &mut ByteReader, trak: &Atom) -> Result<TextTrack, Mp4Error>
{
    let tkhd = trak.child("tkhd").ok_or_else(|| Mp4Error::AtomNotFound("trak.tkhd".into()))?;
    let track_id = fields::read_track_id(reader, tkhd)?;

    let mdia = trak.child("mdia").ok_or_else(|| Mp4Error::AtomNotFound("trak.mdia".into()))?;
    let mdhd = mdia.child("mdhd").ok_or_else(|| Mp4Error::AtomNotFound("mdia.mdhd".into()))?;
    let (timescale, _duration) = fields::read_timescale_duration(reader, mdhd)?;

    let stbl = mdia.find("mdia.minf.stbl").ok_or_else(|| Mp4Error::AtomNotFound("mdia.minf.stbl".into()))?;
    let samples = sample_byte_ranges(reader, stbl)?;
    let durations = stbl.child("stts").map(|stts| fields::read_sample_durations(reader, stts)).transpose()?.unwrap_or_default();

    let mut entries = Vec::new();
    let mut tick = 0u32;
    for (i, (offset, size)) in samples.iter().enumerate()
    {
        let duration = durations.get(i).copied().unwrap_or(0);
        let sample_bytes = reader.read(*offset, *size as u64)?;
        if let Some((title, url)) = parse_tx3g_sample(&sample_bytes)
        {
            let is_spacer = title.trim().is_empty() && duration <= 1;
            if !is_spacer
            {
                entries.push((tick, title, url));
            }
        }
        tick += duration;
    }

    Ok(TextTrack { track_id, entries, timescale })
}

fn sample_byte_ranges(reader: &mut ByteReader, stbl: &Atom) -> Result<Vec<(u64, u32)>, Mp4Error>
{
    let stsz = stbl.child("stsz").ok_or_else(|| Mp4Error::AtomNotFound("stbl.stsz".into()))?;
    let stsc = stbl.child("stsc").ok_or_else(|| Mp4Error::AtomNotFound("stbl.stsc".into()))?;
    let chunk_atom = stbl.child("co64").or_else(|| stbl.child("stco")).ok_or_else(|| Mp4Error::AtomNotFound("stbl.stco|co64".into()))?;

    let sizes = fields::read_sample_sizes(reader, stsz)?;
    let sample_to_chunk = fields::read_sample_to_chunk(reader, stsc)?;
    let chunk_offsets = fields::read_chunk_offsets(reader, chunk_atom)?;

    Ok(fields::resolve_sample_offsets(&chunk_offsets, &sample_to_chunk, &sizes))
}

/// A `tx3g` sample: 2-byte length prefix, UTF-8 text, optional trailing
/// atoms including an `href` atom carrying a chapter URL (§4.3.3).
fn parse_tx3g_sample(data: &[u8]) -> Option<(String, Option<String>)>
{
    if data.len() < 2
    {
        return None;
    }
    let text_len = u16::from_be_bytes([data[0], data[1]]) as usize;
    if data.len() < 2 + text_len
    {
        return None;
    }
    let text = String::from_utf8_lossy(&data[2..2 + text_len]).to_string();

    let mut url = None;
    let mut pos = 2 + text_len;
    while pos + 8 <= data.len()
    {
        let atom_size = u32::from_be_bytes(data[pos..pos + 4].try_into().unwrap()) as usize;
        let atom_type = &data[pos + 4..pos + 8];
        if atom_type == b"href" && pos + atom_size <= data.len() && atom_size >= 11
        {
            let url_len = data[pos + 11] as usize;
            let start = pos + 12;
            if start + url_len <= data.len()
            {
                url = Some(String::from_utf8_lossy(&data[start..start + url_len]).to_string());
            }
        }
        if atom_size < 8
        {
            break;
        }
        pos += atom_size;
    }

    Some((text, url))
}

/// When more than one candidate text track is found (e.g. GarageBand
/// Enhanced Podcasts export both a URL-bearing and a clean-title track),
/// prefer titles from the track without URLs and attach URLs from the
/// other by nearest timestamp within 2 seconds (§4.3.3).
fn merge_text_tracks(tracks: Vec<TextTrack>) -> Vec<(u32, String, Option<String>)>
{
    if tracks.len() == 1
    {
        return normalize_ticks(&tracks[0]);
    }

    let without_urls = tracks.iter().find(|t| t.entries.iter().all(|(_, _, u)| u.is_none()));
    let with_urls = tracks.iter().find(|t| t.entries.iter().any(|(_, _, u)| u.is_some()));

    match (without_urls, with_urls)
    {
        | (Some(titles_track), Some(urls_track)) if !std::ptr::eq(titles_track, urls_track) =>
        {
            let title_entries = normalize_ticks(titles_track);
            let url_entries = normalize_ticks(urls_track);

            title_entries
                .into_iter()
                .map(|(ms, title, _)| {
                    let nearest = url_entries.iter().filter_map(|(u_ms, _, url)| url.as_ref().map(|u| (u_ms.abs_diff(ms), u.clone()))).min_by_key(|(diff, _)| *diff);
                    let url = nearest.filter(|(diff, _)| *diff <= 2000).map(|(_, u)| u);
                    (ms, title, url)
                })
                .collect()
        }
        | _ => normalize_ticks(&tracks[0])
    }
}

fn normalize_ticks(track: &TextTrack) -> Vec<(u32, String, Option<String>)>
{
    if track.timescale == 0
    {
        return Vec::new();
    }
    track.entries.iter().map(|(tick, title, url)| (((*tick as u64) * 1000 / track.timescale as u64) as u32, title.clone(), url.clone())).collect()
}

/// Per-chapter artwork from a video-handler track referenced by `tref.chap`
/// alongside the chapter text track (§4.3.3 step 2).
fn find_chapter_artwork(reader: &mut ByteReader, moov: &Atom) -> Result<Option<Vec<Artwork>>, Mp4Error>
{
    let referenced_ids = audio_chap_reference_ids(reader, moov)?;
    if referenced_ids.is_empty()
    {
        return Ok(None);
    }

    for trak in moov.children_of("trak")
    {
        let Some(tkhd) = trak.child("tkhd")
        else { continue };
        let track_id = fields::read_track_id(reader, tkhd)?;
        if !referenced_ids.contains(&track_id)
        {
            continue;
        }
        let Some(mdia) = trak.child("mdia")
        else { continue };
        let Some(hdlr) = mdia.child("hdlr")
        else { continue };
        if fields::read_handler_type(reader, hdlr)? != "vide"
        {
            continue;
        }

        let Some(stbl) = mdia.find("mdia.minf.stbl")
        else { continue };
        let format = stbl.child("stsd").map(|stsd| fields::read_stsd_first_format(reader, stsd)).transpose()?.unwrap_or_default();
        let samples = sample_byte_ranges(reader, stbl)?;

        let mut artworks = Vec::new();
        for (offset, size) in samples
        {
            let bytes = reader.read(offset, size as u64)?;
            let detected_format = if format.trim() == "jpeg" { Some(ArtworkFormat::Jpeg) } else if format.trim() == "png" { Some(ArtworkFormat::Png) } else { ArtworkFormat::detect(&bytes) };
            if let Some(fmt) = detected_format
            {
                artworks.push(Artwork { data: bytes, format: fmt });
            }
        }
        return Ok(Some(artworks));
    }

    Ok(None)
}

/// Nero `udta.chpl` fallback (§4.3.3 step 3): version + reserved(3) + count
/// + per-chapter `{u64 start in 100ns units, u8 title len, UTF-8 title}`.
fn parse_nero_chapters(reader: &mut ByteReader, moov: &Atom) -> Result<ChapterList, Mp4Error>
{
    let Some(chpl) = moov.find("moov.udta.chpl")
    else
    {
        return Ok(ChapterList::new());
    };

    let payload = chpl.read_payload(reader)?;
    if payload.len() < 5
    {
        return Ok(ChapterList::new());
    }

    let count = payload[4];
    let mut chapters = Vec::new();
    let mut pos = 5usize;

    for _ in 0..count
    {
        if pos + 9 > payload.len()
        {
            break;
        }
        let raw_start = u64::from_be_bytes(payload[pos..pos + 8].try_into().unwrap());
        let title_len = payload[pos + 8] as usize;
        pos += 9;
        if pos + title_len > payload.len()
        {
            break;
        }
        let title = String::from_utf8_lossy(&payload[pos..pos + title_len]).to_string();
        pos += title_len;

        let seconds = raw_start as f64 / 10_000_000.0;
        if let Ok(start) = AudioTimestamp::from_seconds(seconds)
        {
            chapters.push(Chapter::new(start, title));
        }
    }

    Ok(ChapterList::from_unsorted(chapters))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_tx3g_sample_with_href()
    {
        let mut sample = vec![0u8, 5];
        sample.extend_from_slice(b"Intro");
        let url = b"http://example.com";
        let mut href = vec![0u8, 0, 0, (11 + url.len()) as u8];
        href[0..4].copy_from_slice(&((11 + url.len()) as u32).to_be_bytes());
        href.extend_from_slice(b"href");
        href.extend_from_slice(&[0, 0]); // flags
        href.extend_from_slice(&[0, 0]); // char count
        href.push(url.len() as u8);
        href.extend_from_slice(url);
        href.extend_from_slice(&[0, 0]);
        sample.extend_from_slice(&href);

        let (title, parsed_url) = parse_tx3g_sample(&sample).unwrap();
        assert_eq!(title, "Intro");
        assert_eq!(parsed_url.as_deref(), Some("http://example.com"));
    }

    #[test]
    fn parses_plain_tx3g_sample_without_trailing_atoms()
    {
        let mut sample = vec![0u8, 4];
        sample.extend_from_slice(b"Main");
        let (title, url) = parse_tx3g_sample(&sample).unwrap();
        assert_eq!(title, "Main");
        assert!(url.is_none());
    }
}
