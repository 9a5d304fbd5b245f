//! Random-access byte I/O primitives.
//!
//! `ByteReader` and `ByteWriter` are the only types in this crate that touch
//! the filesystem directly. Every codec is built on top of them so that the
//! streaming invariant (§4.3's "the `mdat` payload must never be materialized
//! in memory") has a single enforcement point: `copy_chunked`.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::StreamingError;

/// Default chunk size used by `copy_chunked` when the caller doesn't pick one.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A read-only, random-access view of a file.
pub struct ByteReader
{
    file: File,
    path: PathBuf,
    len:  u64
}

impl ByteReader
{
    /// Open `path` for reading. Reports `fileSize` on acquisition per §5's
    /// resource-acquisition discipline.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StreamingError>
    {
        let path = path.as_ref().to_path_buf();
        if !path.exists()
        {
            return Err(StreamingError::FileNotFound(path));
        }

        let file = File::open(&path).map_err(|source| StreamingError::CannotOpen { path: path.clone(), source })?;
        let len = file.metadata().map_err(|source| StreamingError::CannotOpen { path: path.clone(), source })?.len();

        Ok(Self { file, path, len })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn file_size(&self) -> u64
    {
        self.len
    }

    /// Read exactly `count` bytes starting at `offset`.
    pub fn read(&mut self, offset: u64, count: u64) -> Result<Vec<u8>, StreamingError>
    {
        if offset.saturating_add(count) > self.len
        {
            return Err(StreamingError::OutOfBounds { offset, count, len: self.len });
        }

        self.file.seek(SeekFrom::Start(offset)).map_err(|source| StreamingError::ReadFailed { offset, source })?;

        let mut buf = vec![0u8; count as usize];
        self.file.read_exact(&mut buf).map_err(|source| StreamingError::ReadFailed { offset, source })?;
        Ok(buf)
    }

    /// Read from `offset` to the end of the file.
    pub fn read_to_end(&mut self, offset: u64) -> Result<Vec<u8>, StreamingError>
    {
        if offset > self.len
        {
            return Err(StreamingError::OutOfBounds { offset, count: 0, len: self.len });
        }
        self.read(offset, self.len - offset)
    }

    /// Stream `count` bytes from `offset` through `handler` in bounded
    /// chunks, never materializing the full range in memory.
    pub fn copy_chunked(&mut self, offset: u64, count: u64, chunk_size: usize, mut handler: impl FnMut(&[u8]) -> Result<(), StreamingError>) -> Result<(), StreamingError>
    {
        if chunk_size == 0
        {
            return Err(StreamingError::InvalidBufferSize(chunk_size));
        }
        if offset.saturating_add(count) > self.len
        {
            return Err(StreamingError::OutOfBounds { offset, count, len: self.len });
        }

        self.file.seek(SeekFrom::Start(offset)).map_err(|source| StreamingError::ReadFailed { offset, source })?;

        let mut remaining = count;
        let mut buf = vec![0u8; chunk_size.min(count.max(1) as usize)];
        let mut pos = offset;
        while remaining > 0
        {
            let to_read = remaining.min(buf.len() as u64) as usize;
            self.file.read_exact(&mut buf[..to_read]).map_err(|source| StreamingError::ReadFailed { offset: pos, source })?;
            handler(&buf[..to_read])?;
            remaining -= to_read as u64;
            pos += to_read as u64;
        }

        Ok(())
    }
}

/// An appending writer for a single target file, with an explicit `sync`
/// point so callers can guarantee durability before an atomic replace.
pub struct ByteWriter
{
    file: File,
    path: PathBuf
}

impl ByteWriter
{
    /// Create (truncating) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, StreamingError>
    {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|source| StreamingError::CannotOpen { path: path.clone(), source })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), StreamingError>
    {
        self.file.write_all(bytes).map_err(|source| StreamingError::WriteFailed { source })
    }

    /// Stream `count` bytes from `reader` at `offset` straight into this
    /// writer, in bounded chunks.
    pub fn copy_chunked(&mut self, reader: &mut ByteReader, offset: u64, count: u64) -> Result<(), StreamingError>
    {
        let file = &mut self.file;
        reader.copy_chunked(offset, count, DEFAULT_CHUNK_SIZE, move |chunk| file.write_all(chunk).map_err(|source| StreamingError::WriteFailed { source }))
    }

    /// Flush to stable storage.
    pub fn sync(&mut self) -> Result<(), StreamingError>
    {
        self.file.flush().map_err(|source| StreamingError::WriteFailed { source })?;
        self.file.sync_all().map_err(|source| StreamingError::WriteFailed { source })
    }
}

/// Create a sibling tempfile of `target` (same directory, dotted-UUID name)
/// for the atomic-rewrite write strategy used by both container writers.
pub fn sibling_tempfile(target: &Path) -> Result<PathBuf, StreamingError>
{
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let name = format!(".{}.tmp", uuid::Uuid::new_v4());
    Ok(dir.join(name))
}

/// Atomically replace `target` with `tempfile`, removing the tempfile first
/// on any failure so the source is never left partially modified.
pub fn replace_atomically(tempfile: &Path, target: &Path) -> Result<(), StreamingError>
{
    match std::fs::rename(tempfile, target)
    {
        | Ok(()) => Ok(()),
        | Err(source) =>
        {
            let _ = std::fs::remove_file(tempfile);
            Err(StreamingError::WriteFailed { source })
        }
    }
}

/// Remove a tempfile, swallowing the error (best-effort cleanup path used
/// from error branches that already have a primary error to report).
pub fn cleanup_tempfile(tempfile: &Path)
{
    let _ = std::fs::remove_file(tempfile);
}

#[cfg(test)]
mod tests
{
    use std::io::Write as _;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn read_exact_range()
    {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hello world").unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();
        assert_eq!(reader.file_size(), 11);
        assert_eq!(reader.read(6, 5).unwrap(), b"world");
    }

    #[test]
    fn out_of_bounds_read_fails()
    {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"hi").unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();
        assert!(matches!(reader.read(0, 10), Err(StreamingError::OutOfBounds { .. })));
    }

    #[test]
    fn copy_chunked_reassembles_identical_bytes()
    {
        let mut f = NamedTempFile::new().unwrap();
        let payload: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();
        f.write_all(&payload).unwrap();
        let mut reader = ByteReader::open(f.path()).unwrap();

        let mut collected = Vec::new();
        reader
            .copy_chunked(0, payload.len() as u64, 128, |chunk| {
                collected.extend_from_slice(chunk);
                Ok(())
            })
            .unwrap();

        assert_eq!(collected, payload);
    }
}
