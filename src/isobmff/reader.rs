//! Top-level ISOBMFF read entry points, composing the atom parser with the
//! metadata and chapter codecs (§4.3.2, §4.3.3).

use std::path::Path;

use crate::error::Mp4Error;
use crate::io::ByteReader;
use crate::isobmff::atom;
use crate::isobmff::chapter;
use crate::isobmff::metadata;
use crate::model::{AudioFileInfo, ChapterList};

/// Read every piece of metadata and chapter data this codec understands.
/// ISOBMFF files carry no equivalent of ID3's unknown-frame preservation,
/// so `unknown_frames` is always empty here.
pub fn read(path: &Path) -> Result<AudioFileInfo, Mp4Error>
{
    let mut reader = ByteReader::open(path)?;
    let atoms = atom::parse_file(&mut reader)?;
    let moov = atoms.iter().find(|a| a.box_type == "moov").ok_or_else(|| Mp4Error::AtomNotFound("moov".into()))?;

    let metadata = metadata::parse_metadata(&mut reader, moov)?;
    let chapters = chapter::parse_chapters(&mut reader, moov)?;

    let mut info = AudioFileInfo::new();
    info.metadata = metadata;
    info.chapters = chapters;
    Ok(info)
}

/// Read only the chapter list, skipping metadata parsing entirely.
pub fn read_chapters(path: &Path) -> Result<ChapterList, Mp4Error>
{
    let mut reader = ByteReader::open(path)?;
    let atoms = atom::parse_file(&mut reader)?;
    let moov = atoms.iter().find(|a| a.box_type == "moov").ok_or_else(|| Mp4Error::AtomNotFound("moov".into()))?;
    chapter::parse_chapters(&mut reader, moov)
}
