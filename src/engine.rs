//! `AudioMarkerEngine`, the format-sniffing facade over the ID3v2 and
//! ISOBMFF codecs (§4.5). Detects a file's container from its leading
//! bytes and dispatches every operation to the matching codec, so callers
//! who don't already know the container format have one entry point.

use std::path::Path;

use tracing::instrument;

use crate::chapters::{self, ExportFormat as ChapterFormat};
use crate::error::{EngineError, ExportError};
use crate::id3v2;
use crate::isobmff;
use crate::model::{AudioFileInfo, ChapterList};

enum Container
{
    Id3v2,
    Isobmff
}

/// Every textual interchange format the engine's chapter-export API
/// accepts, including the lyrics-only formats it must reject (§4.5's "small
/// guard").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterchangeFormat
{
    PodloveJson,
    PodloveXml,
    Mp4Chaps,
    FfMetadata,
    Markdown,
    PodcastNamespace,
    CueSheet,
    Lrc,
    Ttml,
    WebVtt,
    Srt
}

fn as_chapter_format(format: InterchangeFormat) -> Option<ChapterFormat>
{
    match format
    {
        | InterchangeFormat::PodloveJson => Some(ChapterFormat::PodloveJson),
        | InterchangeFormat::PodloveXml => Some(ChapterFormat::PodloveXml),
        | InterchangeFormat::Mp4Chaps => Some(ChapterFormat::Mp4Chaps),
        | InterchangeFormat::FfMetadata => Some(ChapterFormat::FfMetadata),
        | InterchangeFormat::Markdown => Some(ChapterFormat::Markdown),
        | InterchangeFormat::PodcastNamespace => Some(ChapterFormat::PodcastNamespace),
        | InterchangeFormat::CueSheet => Some(ChapterFormat::CueSheet),
        | InterchangeFormat::Lrc | InterchangeFormat::Ttml | InterchangeFormat::WebVtt | InterchangeFormat::Srt => None
    }
}

/// Sniff the container format from up to the first 64 bytes of `path`: the
/// `ID3` magic at offset 0, or a top-level `ftyp` box anywhere in that
/// window.
fn detect_container(path: &Path) -> Result<Container, EngineError>
{
    let mut reader = crate::io::ByteReader::open(path)?;
    let scan_len = reader.file_size().min(64);
    if scan_len < 4
    {
        return Err(EngineError::UnsupportedContainer);
    }
    let header = reader.read(0, scan_len)?;

    if header.len() >= 3 && &header[0..3] == b"ID3"
    {
        return Ok(Container::Id3v2);
    }

    let mut offset = 0usize;
    while offset + 8 <= header.len()
    {
        let size = u32::from_be_bytes(header[offset..offset + 4].try_into().unwrap()) as usize;
        let box_type = &header[offset + 4..offset + 8];
        if box_type == b"ftyp"
        {
            return Ok(Container::Isobmff);
        }
        if size < 8
        {
            break;
        }
        offset += size;
    }

    Err(EngineError::UnsupportedContainer)
}

/// Facade that dispatches by detected container and composes the codecs
/// (§4.5). Stateless — every method reopens the file it's given.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioMarkerEngine;

impl AudioMarkerEngine
{
    pub fn new() -> Self
    {
        Self
    }

    /// Read every metadata field and chapter this crate models.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn read(&self, path: impl AsRef<Path>) -> Result<AudioFileInfo, EngineError>
    {
        let path = path.as_ref();
        match detect_container(path)?
        {
            | Container::Id3v2 => Ok(id3v2::read_tag(path)?.info),
            | Container::Isobmff => Ok(isobmff::read(path)?)
        }
    }

    /// Read only the chapter list, skipping the rest of the metadata.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn read_chapters(&self, path: impl AsRef<Path>) -> Result<ChapterList, EngineError>
    {
        let path = path.as_ref();
        match detect_container(path)?
        {
            | Container::Id3v2 => Ok(id3v2::read_tag(path)?.info.chapters),
            | Container::Isobmff => Ok(isobmff::read_chapters(path)?)
        }
    }

    /// Replace every piece of metadata and every chapter with `info`.
    #[instrument(skip(self, info), fields(path = %path.as_ref().display()))]
    pub fn write(&self, info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<(), EngineError>
    {
        let path = path.as_ref();
        match detect_container(path)?
        {
            | Container::Id3v2 => id3v2::write(info, path)?,
            | Container::Isobmff => isobmff::write(info, path)?
        }
        Ok(())
    }

    /// Write `info`, preserving whatever this crate doesn't model (ID3's
    /// unknown frames; ISOBMFF has no equivalent, so this is identical to
    /// `write` there).
    #[instrument(skip(self, info), fields(path = %path.as_ref().display()))]
    pub fn modify(&self, info: &AudioFileInfo, path: impl AsRef<Path>) -> Result<(), EngineError>
    {
        let path = path.as_ref();
        match detect_container(path)?
        {
            | Container::Id3v2 => id3v2::modify(info, path)?,
            | Container::Isobmff => isobmff::write(info, path)?
        }
        Ok(())
    }

    /// Clear every metadata field while keeping chapters, since chapters
    /// are structural rather than tag data (§4.3.6).
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn strip(&self, path: impl AsRef<Path>) -> Result<(), EngineError>
    {
        let path = path.as_ref();
        match detect_container(path)?
        {
            | Container::Id3v2 => id3v2::strip_tag(path)?,
            | Container::Isobmff =>
            {
                let chapters = isobmff::read_chapters(path)?;
                isobmff::strip_metadata(path, &chapters)?
            }
        }
        Ok(())
    }

    /// Replace the chapter list, leaving every other metadata field as-is.
    #[instrument(skip(self, chapters), fields(path = %path.as_ref().display()))]
    pub fn write_chapters(&self, chapters: ChapterList, path: impl AsRef<Path>) -> Result<(), EngineError>
    {
        let path = path.as_ref();
        let mut info = self.read(path)?;
        info.chapters = chapters;
        self.write(&info, path)
    }

    /// Remove every chapter, leaving every other metadata field as-is.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn clear_chapters(&self, path: impl AsRef<Path>) -> Result<(), EngineError>
    {
        self.write_chapters(ChapterList::new(), path)
    }

    /// Export this file's chapters as one of the textual chapter formats.
    /// Rejects the lyrics-only formats with `UnsupportedFormat`.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn export_chapters(&self, path: impl AsRef<Path>, format: InterchangeFormat) -> Result<String, EngineError>
    {
        let path = path.as_ref();
        let chapter_format = as_chapter_format(format)
            .ok_or_else(|| ExportError::UnsupportedFormat(format!("{format:?} is a lyrics format, not a chapter interchange format")))?;
        let chapters = self.read_chapters(path)?;
        Ok(chapters::export(&chapters, chapter_format)?)
    }

    /// Parse `text` in the given format and write the resulting chapters to
    /// `path`, leaving other metadata as-is. Rejects the lyrics-only
    /// formats with `UnsupportedFormat`.
    #[instrument(skip(self, text), fields(path = %path.as_ref().display()))]
    pub fn import_chapters(&self, text: &str, format: InterchangeFormat, path: impl AsRef<Path>) -> Result<(), EngineError>
    {
        let chapter_format = as_chapter_format(format)
            .ok_or_else(|| ExportError::UnsupportedFormat(format!("{format:?} is a lyrics format, not a chapter interchange format")))?;
        let parsed = chapters::import(text, chapter_format)?;
        self.write_chapters(parsed, path)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn rejects_lyrics_formats_from_chapter_export_guard()
    {
        assert_eq!(as_chapter_format(InterchangeFormat::Lrc), None);
        assert_eq!(as_chapter_format(InterchangeFormat::Ttml), None);
        assert_eq!(as_chapter_format(InterchangeFormat::WebVtt), None);
        assert_eq!(as_chapter_format(InterchangeFormat::Srt), None);
        assert_eq!(as_chapter_format(InterchangeFormat::CueSheet), Some(ChapterFormat::CueSheet));
    }

    #[test]
    fn rejects_file_too_small_to_sniff()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.bin");
        std::fs::write(&path, b"ab").unwrap();
        let engine = AudioMarkerEngine::new();
        assert!(matches!(engine.read(&path), Err(EngineError::UnsupportedContainer)));
    }

    #[test]
    fn rejects_unrecognized_header()
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("unknown.bin");
        std::fs::write(&path, vec![0u8; 128]).unwrap();
        let engine = AudioMarkerEngine::new();
        assert!(matches!(engine.read(&path), Err(EngineError::UnsupportedContainer)));
    }
}
