//! Tag writer (§4.2.10): `write`, `modify`, `stripTag`, each atomic with
//! respect to the source file via the in-place-vs-rewrite decision.

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write as _};
use std::path::Path;

use tracing::debug;

use crate::error::Id3Error;
use crate::id3v2::builder::{self, WriteOptions};
use crate::id3v2::header::HEADER_SIZE;
use crate::id3v2::reader::read_tag;
use crate::io::{self, ByteReader, ByteWriter};
use crate::model::chapter::ChapterList;
use crate::model::metadata::AudioFileInfo;

/// Replace metadata and chapters with a freshly built tag (default padding).
pub fn write(info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<(), Id3Error>
{
    write_with_options(info, &info.unknown_frames.clone(), WriteOptions::default(), path)
}

/// Like `write`, but preserves `unknownFrames` read from the existing tag.
/// If the file has no existing tag, falls back to `write`.
pub fn modify(info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<(), Id3Error>
{
    let path = path.as_ref();
    match read_tag(path)
    {
        | Ok(existing) =>
        {
            let options = WriteOptions { version_major: existing.header.version_major, padding: builder::DEFAULT_PADDING };
            write_with_options(info, &existing.info.unknown_frames, options, path)
        }
        | Err(Id3Error::NoTag) => write(info, path),
        | Err(other) => Err(other)
    }
}

fn write_with_options(info: &AudioFileInfo, unknown_frames: &[crate::model::metadata::OpaqueFrame], options: WriteOptions, path: impl AsRef<Path>) -> Result<(), Id3Error>
{
    let path = path.as_ref();
    let new_tag = builder::build_tag(&info.metadata, &info.chapters, unknown_frames, options)?;
    let old_span = existing_tag_span(path)?;
    replace_tag(path, &new_tag, old_span)
}

/// Remove all metadata. When chapters exist, rebuilds the tag retaining only
/// `CTOC`/`CHAP` (structural, not metadata); otherwise removes the tag
/// entirely so the file begins with the first audio byte.
pub fn strip_tag(path: impl AsRef<Path>) -> Result<(), Id3Error>
{
    let path = path.as_ref();
    let existing = match read_tag(path)
    {
        | Ok(existing) => existing,
        | Err(Id3Error::NoTag) => return Ok(()),
        | Err(other) => return Err(other)
    };

    let old_span = HEADER_SIZE as u64 + existing.header.tag_size as u64;

    if existing.info.chapters.is_empty()
    {
        return remove_tag(path, old_span);
    }

    let options = WriteOptions { version_major: existing.header.version_major, padding: builder::DEFAULT_PADDING };
    let chapters_only = ChapterList::from_unsorted(existing.info.chapters.into_vec());
    let new_tag = builder::build_tag(&Default::default(), &chapters_only, &[], options)?;
    replace_tag(path, &new_tag, old_span)
}

fn existing_tag_span(path: &Path) -> Result<u64, Id3Error>
{
    match read_tag(path)
    {
        | Ok(existing) => Ok(HEADER_SIZE as u64 + existing.header.tag_size as u64),
        | Err(Id3Error::NoTag) => Ok(0),
        | Err(other) => Err(other)
    }
}

/// In-place overwrite when the new tag fits within the old span, padded up
/// to exactly that span; otherwise a full rewrite through a sibling
/// tempfile, streaming the untouched audio bytes.
fn replace_tag(path: &Path, new_tag: &[u8], old_span: u64) -> Result<(), Id3Error>
{
    if (new_tag.len() as u64) <= old_span
    {
        debug!(new_len = new_tag.len(), old_span, "writing tag in place");
        let mut padded = new_tag.to_vec();
        padded.resize(old_span as usize, 0);
        builder::patch_tag_size(&mut padded);
        write_in_place(path, &padded)
    }
    else
    {
        debug!(new_len = new_tag.len(), old_span, "tag grew past available padding, rewriting through tempfile");
        rewrite_with_tempfile(path, new_tag, old_span)
    }
}

fn remove_tag(path: &Path, old_span: u64) -> Result<(), Id3Error>
{
    rewrite_with_tempfile(path, &[], old_span)
}

fn write_in_place(path: &Path, bytes: &[u8]) -> Result<(), Id3Error>
{
    let mut file = OpenOptions::new().write(true).open(path).map_err(|source| crate::error::StreamingError::CannotOpen { path: path.to_path_buf(), source })?;
    file.seek(SeekFrom::Start(0)).map_err(|source| crate::error::StreamingError::WriteFailed { source })?;
    file.write_all(bytes).map_err(|source| crate::error::StreamingError::WriteFailed { source })?;
    file.sync_all().map_err(|source| crate::error::StreamingError::WriteFailed { source })?;
    Ok(())
}

fn rewrite_with_tempfile(path: &Path, new_tag: &[u8], old_span: u64) -> Result<(), Id3Error>
{
    let tempfile_path = io::sibling_tempfile(path)?;

    let result = (|| -> Result<(), Id3Error> {
        let mut reader = ByteReader::open(path)?;
        let mut writer = ByteWriter::create(&tempfile_path)?;
        writer.write(new_tag)?;
        let audio_len = reader.file_size().saturating_sub(old_span);
        writer.copy_chunked(&mut reader, old_span, audio_len)?;
        writer.sync()?;
        Ok(())
    })();

    match result
    {
        | Ok(()) =>
        {
            io::replace_atomically(&tempfile_path, path)?;
            Ok(())
        }
        | Err(err) =>
        {
            io::cleanup_tempfile(&tempfile_path);
            Err(err)
        }
    }
}
