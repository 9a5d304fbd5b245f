//! Small fixed-layout field readers shared by the metadata, chapter, and
//! moov-rebuild code — `mvhd`/`tkhd`/`mdhd`/`hdlr`/`tref`/`stsd` payloads
//! that are consulted but never need a full dedicated struct.

use crate::error::Mp4Error;
use crate::io::ByteReader;
use crate::isobmff::atom::Atom;

/// `(timescale, duration)` from an `mvhd` or `mdhd` payload — both share the
/// version0/version1 layout (§4.3.2).
pub fn read_timescale_duration(reader: &mut ByteReader, atom: &Atom) -> Result<(u32, u64), Mp4Error>
{
    let payload = atom.read_payload(reader)?;
    if payload.is_empty()
    {
        return Err(Mp4Error::InvalidAtom { atom_type: atom.box_type.clone(), reason: "empty payload".into() });
    }
    let version = payload[0];
    let (timescale_at, duration_at, duration_len) = if version == 1 { (20usize, 24usize, 8usize) } else { (12usize, 16usize, 4usize) };

    if payload.len() < duration_at + duration_len
    {
        return Err(Mp4Error::TruncatedData { expected: duration_at + duration_len, found: payload.len() });
    }

    let timescale = u32::from_be_bytes(payload[timescale_at..timescale_at + 4].try_into().unwrap());
    let duration = if duration_len == 8
    {
        u64::from_be_bytes(payload[duration_at..duration_at + 8].try_into().unwrap())
    }
    else
    {
        u32::from_be_bytes(payload[duration_at..duration_at + 4].try_into().unwrap()) as u64
    };

    Ok((timescale, duration))
}

/// The `track_id` field from a `tkhd` payload.
pub fn read_track_id(reader: &mut ByteReader, tkhd: &Atom) -> Result<u32, Mp4Error>
{
    let payload = tkhd.read_payload(reader)?;
    if payload.is_empty()
    {
        return Err(Mp4Error::InvalidAtom { atom_type: "tkhd".into(), reason: "empty payload".into() });
    }
    let version = payload[0];
    let at = if version == 1 { 20usize } else { 12usize };
    if payload.len() < at + 4
    {
        return Err(Mp4Error::TruncatedData { expected: at + 4, found: payload.len() });
    }
    Ok(u32::from_be_bytes(payload[at..at + 4].try_into().unwrap()))
}

/// The 4-character handler type from an `hdlr` payload (e.g. `soun`,
/// `text`, `sbtl`, `vide`).
pub fn read_handler_type(reader: &mut ByteReader, hdlr: &Atom) -> Result<String, Mp4Error>
{
    let payload = hdlr.read_payload(reader)?;
    if payload.len() < 12
    {
        return Err(Mp4Error::TruncatedData { expected: 12, found: payload.len() });
    }
    Ok(String::from_utf8_lossy(&payload[8..12]).to_string())
}

/// The track IDs listed in a `tref` child reference atom (e.g. `chap`).
pub fn read_reference_track_ids(reader: &mut ByteReader, reference: &Atom) -> Result<Vec<u32>, Mp4Error>
{
    let payload = reference.read_payload(reader)?;
    Ok(payload.chunks_exact(4).map(|c| u32::from_be_bytes(c.try_into().unwrap())).collect())
}

/// The fourcc of the first sample entry in an `stsd` payload.
pub fn read_stsd_first_format(reader: &mut ByteReader, stsd: &Atom) -> Result<String, Mp4Error>
{
    let payload = stsd.read_payload(reader)?;
    if payload.len() < 16
    {
        return Err(Mp4Error::TruncatedData { expected: 16, found: payload.len() });
    }
    Ok(String::from_utf8_lossy(&payload[12..16]).to_string())
}

/// Expand an `stts` (time-to-sample) payload's run-length `(count,
/// duration)` pairs into one duration per sample.
pub fn read_sample_durations(reader: &mut ByteReader, stts: &Atom) -> Result<Vec<u32>, Mp4Error>
{
    let payload = stts.read_payload(reader)?;
    if payload.len() < 8
    {
        return Err(Mp4Error::TruncatedData { expected: 8, found: payload.len() });
    }
    let entry_count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;
    let mut out = Vec::new();
    let mut at = 8;
    for _ in 0..entry_count
    {
        if at + 8 > payload.len()
        {
            break;
        }
        let count = u32::from_be_bytes(payload[at..at + 4].try_into().unwrap());
        let duration = u32::from_be_bytes(payload[at + 4..at + 8].try_into().unwrap());
        out.extend(std::iter::repeat_n(duration, count as usize));
        at += 8;
    }
    Ok(out)
}

/// Per-sample sizes from an `stsz` payload: a uniform default size repeated
/// `sample_count` times, or the explicit per-sample table.
pub fn read_sample_sizes(reader: &mut ByteReader, stsz: &Atom) -> Result<Vec<u32>, Mp4Error>
{
    let payload = stsz.read_payload(reader)?;
    if payload.len() < 12
    {
        return Err(Mp4Error::TruncatedData { expected: 12, found: payload.len() });
    }
    let default_size = u32::from_be_bytes(payload[4..8].try_into().unwrap());
    let sample_count = u32::from_be_bytes(payload[8..12].try_into().unwrap()) as usize;

    if default_size != 0
    {
        return Ok(vec![default_size; sample_count]);
    }

    let mut out = Vec::with_capacity(sample_count);
    let mut at = 12;
    for _ in 0..sample_count
    {
        if at + 4 > payload.len()
        {
            break;
        }
        out.push(u32::from_be_bytes(payload[at..at + 4].try_into().unwrap()));
        at += 4;
    }
    Ok(out)
}

/// `(first_chunk, samples_per_chunk, sample_description_index)` triples
/// from an `stsc` payload.
pub fn read_sample_to_chunk(reader: &mut ByteReader, stsc: &Atom) -> Result<Vec<(u32, u32, u32)>, Mp4Error>
{
    let payload = stsc.read_payload(reader)?;
    if payload.len() < 8
    {
        return Err(Mp4Error::TruncatedData { expected: 8, found: payload.len() });
    }
    let entry_count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;
    let mut out = Vec::with_capacity(entry_count);
    let mut at = 8;
    for _ in 0..entry_count
    {
        if at + 12 > payload.len()
        {
            break;
        }
        let first_chunk = u32::from_be_bytes(payload[at..at + 4].try_into().unwrap());
        let samples_per_chunk = u32::from_be_bytes(payload[at + 4..at + 8].try_into().unwrap());
        let sample_desc = u32::from_be_bytes(payload[at + 8..at + 12].try_into().unwrap());
        out.push((first_chunk, samples_per_chunk, sample_desc));
        at += 12;
    }
    Ok(out)
}

/// Chunk offsets from an `stco` (32-bit) or `co64` (64-bit) payload.
pub fn read_chunk_offsets(reader: &mut ByteReader, atom: &Atom) -> Result<Vec<u64>, Mp4Error>
{
    let payload = atom.read_payload(reader)?;
    if payload.len() < 8
    {
        return Err(Mp4Error::TruncatedData { expected: 8, found: payload.len() });
    }
    let entry_count = u32::from_be_bytes(payload[4..8].try_into().unwrap()) as usize;
    let width = if atom.box_type == "co64" { 8 } else { 4 };
    let mut out = Vec::with_capacity(entry_count);
    let mut at = 8;
    for _ in 0..entry_count
    {
        if at + width > payload.len()
        {
            break;
        }
        let value = if width == 8
        {
            u64::from_be_bytes(payload[at..at + 8].try_into().unwrap())
        }
        else
        {
            u32::from_be_bytes(payload[at..at + 4].try_into().unwrap()) as u64
        };
        out.push(value);
        at += width;
    }
    Ok(out)
}

/// Resolve each sample's absolute file offset and size from the chunk
/// offset table, the sample-to-chunk run list, and per-sample sizes.
pub fn resolve_sample_offsets(chunk_offsets: &[u64], sample_to_chunk: &[(u32, u32, u32)], sample_sizes: &[u32]) -> Vec<(u64, u32)>
{
    let mut out = Vec::with_capacity(sample_sizes.len());
    let mut sample_index = 0usize;

    for chunk_number in 1..=chunk_offsets.len() as u32
    {
        let samples_per_chunk = sample_to_chunk.iter().rev().find(|(first, _, _)| *first <= chunk_number).map(|(_, n, _)| *n).unwrap_or(1);

        let mut running_offset = chunk_offsets[(chunk_number - 1) as usize];
        for _ in 0..samples_per_chunk
        {
            if sample_index >= sample_sizes.len()
            {
                return out;
            }
            let size = sample_sizes[sample_index];
            out.push((running_offset, size));
            running_offset += size as u64;
            sample_index += 1;
        }
    }

    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn resolves_one_sample_per_chunk()
    {
        let offsets = vec![100, 200, 300];
        let stsc = vec![(1, 1, 1)];
        let sizes = vec![10, 10, 10];
        let resolved = resolve_sample_offsets(&offsets, &stsc, &sizes);
        assert_eq!(resolved, vec![(100, 10), (200, 10), (300, 10)]);
    }

    #[test]
    fn resolves_multiple_samples_per_chunk()
    {
        let offsets = vec![0, 100];
        let stsc = vec![(1, 2, 1)];
        let sizes = vec![10, 20, 5, 5];
        let resolved = resolve_sample_offsets(&offsets, &stsc, &sizes);
        assert_eq!(resolved, vec![(0, 10), (10, 20), (100, 5), (105, 5)]);
    }
}
