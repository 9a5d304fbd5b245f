//! Top-level ISOBMFF write procedure (§4.3.6): rebuild `moov`, patch every
//! pre-existing `stco`/`co64` entry for the shift the new `moov` introduces,
//! back-patch the placeholder entries the rebuilt chapter/artwork tracks
//! left behind, then stream the result into a sibling tempfile and replace
//! the original atomically.
//!
//! Mirrors the ID3v2 writer's tempfile/atomic-replace/cleanup-on-error
//! shape (`id3v2::writer`), generalized for the two possible top-level atom
//! orderings (`moov` before `mdat`, or after).

use std::collections::HashSet;
use std::path::Path;

use crate::error::Mp4Error;
use crate::io::{self, ByteReader, ByteWriter};
use crate::isobmff::atom::{self, Atom};
use crate::isobmff::moov_rebuild::{self, RebuiltMoov};
use crate::model::{AudioFileInfo, AudioMetadata, ChapterList};

/// Containers that may nest a `stco`/`co64` chunk-offset table.
const OFFSET_CONTAINER_TYPES: &[&str] = &["moov", "trak", "tref", "mdia", "minf", "stbl", "udta"];

fn locate_top_level(atoms: &[Atom]) -> Result<(&Atom, &Atom, &Atom), Mp4Error>
{
    let ftyp = atoms.iter().find(|a| a.box_type == "ftyp").ok_or_else(|| Mp4Error::AtomNotFound("ftyp".into()))?;
    let moov = atoms.iter().find(|a| a.box_type == "moov").ok_or_else(|| Mp4Error::AtomNotFound("moov".into()))?;
    let mdat = atoms.iter().find(|a| a.box_type == "mdat").ok_or_else(|| Mp4Error::AtomNotFound("mdat".into()))?;
    Ok((ftyp, moov, mdat))
}

/// Write `info` to `path`, replacing its metadata and chapters.
pub fn write(info: &AudioFileInfo, path: &Path) -> Result<(), Mp4Error>
{
    write_with(path, &info.metadata, &info.chapters)
}

/// Strip metadata from `path`, preserving chapters (structural, not tag
/// data — §4.3.6's closing note).
pub fn strip_metadata(path: &Path, chapters: &ChapterList) -> Result<(), Mp4Error>
{
    write_with(path, &AudioMetadata::new(), chapters)
}

fn write_with(path: &Path, metadata: &AudioMetadata, chapters: &ChapterList) -> Result<(), Mp4Error>
{
    let mut reader = ByteReader::open(path)?;
    let atoms = atom::parse_file(&mut reader)?;
    let (ftyp, moov, mdat) = locate_top_level(&atoms)?;

    let rebuilt = moov_rebuild::rebuild(&mut reader, moov, metadata, chapters)?;

    let moov_first = moov.offset < mdat.offset;
    let mdat_end = mdat.offset + mdat.size;
    let delta: i64 = if moov_first { rebuilt.moov.len() as i64 - (mdat.offset as i64 - moov.offset as i64) } else { 0 };

    let mut new_moov = rebuilt.moov;
    let skip_positions = patch_positions(&rebuilt);
    adjust_existing_offsets(&mut new_moov, delta, &skip_positions);

    let chapter_mdat_payload_offset = (mdat_end as i64 + delta + 8) as u64;
    patch_new_track_offsets(&mut new_moov, chapter_mdat_payload_offset, &rebuilt.text_track_stco_positions, &rebuilt.text_sample_sizes, 0);
    let artwork_base = rebuilt.text_sample_sizes.iter().map(|s| *s as u64).sum::<u64>();
    patch_new_track_offsets(&mut new_moov, chapter_mdat_payload_offset, &rebuilt.video_track_stco_positions, &rebuilt.artwork_sample_sizes, artwork_base);

    let tempfile = io::sibling_tempfile(path)?;
    let result = stream_rewrite(path, &tempfile, &atoms, ftyp, moov, mdat, &new_moov, &rebuilt.chapter_sample_data, &rebuilt.artwork_sample_data, moov_first);

    match result
    {
        | Ok(()) =>
        {
            io::replace_atomically(&tempfile, path)?;
            Ok(())
        }
        | Err(err) =>
        {
            io::cleanup_tempfile(&tempfile);
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn stream_rewrite(
    source: &Path,
    tempfile: &Path,
    atoms: &[Atom],
    ftyp: &Atom,
    moov: &Atom,
    mdat: &Atom,
    new_moov: &[u8],
    chapter_sample_data: &[u8],
    artwork_sample_data: &[u8],
    moov_first: bool
) -> Result<(), Mp4Error>
{
    let mut reader = ByteReader::open(source)?;
    let mut writer = ByteWriter::create(tempfile)?;

    let others: Vec<&Atom> = atoms.iter().filter(|a| a.box_type != "ftyp" && a.box_type != "moov" && a.box_type != "mdat").collect();

    writer.write(&reader.read(ftyp.offset, ftyp.size)?)?;
    for other in &others
    {
        writer.write(&reader.read(other.offset, other.size)?)?;
    }

    let has_chapter_mdat = !chapter_sample_data.is_empty() || !artwork_sample_data.is_empty();

    if moov_first
    {
        writer.write(new_moov)?;
        writer.copy_chunked(&mut reader, mdat.offset, mdat.size)?;
    }
    else
    {
        writer.copy_chunked(&mut reader, mdat.offset, mdat.size)?;
    }

    if has_chapter_mdat
    {
        let payload_len = (chapter_sample_data.len() + artwork_sample_data.len()) as u32;
        writer.write(&(payload_len + 8).to_be_bytes())?;
        writer.write(b"mdat")?;
        writer.write(chapter_sample_data)?;
        writer.write(artwork_sample_data)?;
    }

    if !moov_first
    {
        writer.write(new_moov)?;
    }

    writer.sync()?;
    Ok(())
}

/// Byte positions the rebuilt `moov` holds as zero placeholders, which must
/// be skipped by the shift-adjustment pass and patched separately.
fn patch_positions(rebuilt: &RebuiltMoov) -> HashSet<usize>
{
    rebuilt.text_track_stco_positions.iter().chain(rebuilt.video_track_stco_positions.iter()).copied().collect()
}

fn patch_new_track_offsets(moov: &mut [u8], mdat_payload_offset: u64, positions: &[usize], sample_sizes: &[u32], base: u64)
{
    let mut running = base;
    for (pos, size) in positions.iter().zip(sample_sizes.iter())
    {
        let absolute = mdat_payload_offset + running;
        moov[*pos..*pos + 4].copy_from_slice(&(absolute as u32).to_be_bytes());
        running += *size as u64;
    }
}

/// Walk every pre-existing `stco`/`co64` atom in the rebuilt `moov` buffer
/// and add `delta` to each entry not in `skip` (the new tracks' placeholder
/// entries, patched separately to an absolute offset). Clamped at zero per
/// the boundary rule "original + delta < 0 clamps to 0".
fn adjust_existing_offsets(buf: &mut [u8], delta: i64, skip: &HashSet<usize>)
{
    walk_offset_atoms(buf, 0, buf.len(), delta, skip);
}

fn walk_offset_atoms(buf: &mut [u8], start: usize, end: usize, delta: i64, skip: &HashSet<usize>)
{
    let mut offset = start;
    while offset + 8 <= end
    {
        let size = u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap()) as usize;
        if size < 8 || offset + size > end
        {
            break;
        }
        let box_type = &buf[offset + 4..offset + 8];
        let data_offset = offset + 8;

        if box_type == b"stco"
        {
            adjust_chunk_offsets(buf, data_offset, offset + size, delta, skip, false);
        }
        else if box_type == b"co64"
        {
            adjust_chunk_offsets(buf, data_offset, offset + size, delta, skip, true);
        }
        else if box_type == b"meta"
        {
            walk_offset_atoms(buf, data_offset + 4, offset + size, delta, skip);
        }
        else if OFFSET_CONTAINER_TYPES.iter().any(|t| t.as_bytes() == box_type)
        {
            walk_offset_atoms(buf, data_offset, offset + size, delta, skip);
        }

        offset += size;
    }
}

fn adjust_chunk_offsets(buf: &mut [u8], data_offset: usize, atom_end: usize, delta: i64, skip: &HashSet<usize>, is64: bool)
{
    if data_offset + 8 > atom_end
    {
        return;
    }
    let count = u32::from_be_bytes(buf[data_offset + 4..data_offset + 8].try_into().unwrap()) as usize;
    let width = if is64 { 8 } else { 4 };
    let mut at = data_offset + 8;

    for _ in 0..count
    {
        if at + width > atom_end
        {
            break;
        }
        if !skip.contains(&at)
        {
            if is64
            {
                let value = u64::from_be_bytes(buf[at..at + 8].try_into().unwrap()) as i64;
                let patched = (value + delta).max(0) as u64;
                buf[at..at + 8].copy_from_slice(&patched.to_be_bytes());
            }
            else
            {
                let value = u32::from_be_bytes(buf[at..at + 4].try_into().unwrap()) as i64;
                let patched = (value + delta).max(0) as u32;
                buf[at..at + 4].copy_from_slice(&patched.to_be_bytes());
            }
        }
        at += width;
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn stco_atom(offsets: &[u32]) -> Vec<u8>
    {
        let mut payload = Vec::new();
        payload.extend_from_slice(&0u32.to_be_bytes());
        payload.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
        for o in offsets
        {
            payload.extend_from_slice(&o.to_be_bytes());
        }
        let mut out = ((8 + payload.len()) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(b"stco");
        out.extend_from_slice(&payload);
        out
    }

    #[test]
    fn shifts_chunk_offsets_by_delta()
    {
        let mut buf = stco_atom(&[100, 200, 300]);
        let skip = HashSet::new();
        adjust_existing_offsets(&mut buf, 50, &skip);
        let entries_start = 16;
        let got: Vec<u32> = (0..3).map(|i| u32::from_be_bytes(buf[entries_start + i * 4..entries_start + i * 4 + 4].try_into().unwrap())).collect();
        assert_eq!(got, vec![150, 250, 350]);
    }

    #[test]
    fn clamps_negative_shift_to_zero()
    {
        let mut buf = stco_atom(&[10]);
        let skip = HashSet::new();
        adjust_existing_offsets(&mut buf, -100, &skip);
        let got = u32::from_be_bytes(buf[16..20].try_into().unwrap());
        assert_eq!(got, 0);
    }

    #[test]
    fn skips_positions_reserved_for_new_track_patching()
    {
        let mut buf = stco_atom(&[10, 20]);
        let mut skip = HashSet::new();
        skip.insert(16);
        adjust_existing_offsets(&mut buf, 5, &skip);
        let first = u32::from_be_bytes(buf[16..20].try_into().unwrap());
        let second = u32::from_be_bytes(buf[20..24].try_into().unwrap());
        assert_eq!(first, 10);
        assert_eq!(second, 25);
    }
}
