//! Reads, writes, and converts audio metadata, chapters, and lyrics across
//! ID3v2 tags and ISOBMFF (MP4/M4A/M4B) containers, plus the textual
//! chapter and lyrics interchange formats podcast tooling trades in.
//!
//! [`engine::AudioMarkerEngine`] is the main entry point; the `id3v2` and
//! `isobmff` modules are usable directly for callers who already know their
//! container format.

pub mod binio;
pub mod chapters;
pub mod engine;
pub mod error;
pub mod id3v2;
pub mod io;
pub mod isobmff;
pub mod lyrics;
pub mod model;

pub use engine::AudioMarkerEngine;
pub use error::EngineError;
pub use model::{AudioFileInfo, AudioMetadata};
