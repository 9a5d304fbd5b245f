//! Structured error taxonomy shared by every codec in this crate.
//!
//! Each enum below corresponds to one of the "kinds, not type names" listed
//! in the specification's error handling section. Every variant's `Display`
//! carries enough detail (offending bytes, frame ID, atom path) to stand on
//! its own as a single-line message.

use std::path::PathBuf;

use thiserror::Error;

/// Failures from the byte-oriented I/O layer (`ByteReader` / `ByteWriter`).
#[derive(Debug, Error)]
pub enum StreamingError
{
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("cannot open {path}: {source}")]
    CannotOpen { path: PathBuf, #[source] source: std::io::Error },

    #[error("read failed at offset {offset}: {source}")]
    ReadFailed { offset: u64, #[source] source: std::io::Error },

    #[error("write failed: {source}")]
    WriteFailed { #[source] source: std::io::Error },

    #[error("out of bounds: requested {count} bytes at offset {offset}, file is {len} bytes")]
    OutOfBounds { offset: u64, count: u64, len: u64 },

    #[error("invalid buffer size: {0}")]
    InvalidBufferSize(usize),

    #[error("file too small: need at least {need} bytes, got {got}")]
    FileTooSmall { need: u64, got: u64 }
}

/// Failures from the ID3v2 codec.
#[derive(Debug, Error)]
pub enum Id3Error
{
    #[error("no ID3v2 tag present")]
    NoTag,

    #[error("invalid ID3v2 header: {0}")]
    InvalidHeader(String),

    #[error("unsupported ID3v2 version: {0}")]
    UnsupportedVersion(u8),

    #[error("invalid frame {id}: {reason}")]
    InvalidFrame { id: String, reason: String },

    #[error("invalid text encoding byte: 0x{0:02X}")]
    InvalidEncoding(u8),

    #[error("truncated tag data: expected {expected} bytes, found {found}")]
    TruncatedData { expected: usize, found: usize },

    #[error("invalid syncsafe integer: byte 0x{0:02X} has high bit set")]
    InvalidSyncsafe(u8),

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error(transparent)]
    Io(#[from] std::io::Error)
}

/// Failures from the ISOBMFF codec.
#[derive(Debug, Error)]
pub enum Mp4Error
{
    #[error("invalid file: {0}")]
    InvalidFile(String),

    #[error("atom not found: {0}")]
    AtomNotFound(String),

    #[error("invalid atom '{atom_type}': {reason}")]
    InvalidAtom { atom_type: String, reason: String },

    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("truncated data: expected {expected} bytes, found {found}")]
    TruncatedData { expected: usize, found: usize },

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error(transparent)]
    Io(#[from] std::io::Error)
}

/// Failures from the TTML parser.
#[derive(Debug, Error)]
pub enum TtmlParseError
{
    #[error("invalid XML: {0}")]
    InvalidXml(String),

    #[error("not a TTML document (missing <tt> root)")]
    NotTTML,

    #[error("invalid time expression: {0}")]
    InvalidTimeExpression(String),

    #[error("missing attribute '{attribute}' on <{element}>")]
    MissingAttribute { element: String, attribute: String },

    #[error("missing timing (begin) on <p>")]
    MissingTiming
}

/// Failures from the chapter/lyrics interchange codecs.
#[derive(Debug, Error)]
pub enum ExportError
{
    #[error("{0} does not support import")]
    ImportNotSupported(String),

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Ttml(#[from] TtmlParseError)
}

/// The top-level error surfaced by `AudioMarkerEngine`.
#[derive(Debug, Error)]
pub enum EngineError
{
    #[error("unsupported container format")]
    UnsupportedContainer,

    #[error(transparent)]
    Streaming(#[from] StreamingError),

    #[error(transparent)]
    Id3(#[from] Id3Error),

    #[error(transparent)]
    Mp4(#[from] Mp4Error),

    #[error(transparent)]
    Ttml(#[from] TtmlParseError),

    #[error(transparent)]
    Export(#[from] ExportError)
}
