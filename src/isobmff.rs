//! ISO Base Media File Format (ISOBMFF) codec — MP4/M4A/M4B containers
//! (§4.3): the recursive atom tree parser, iTunes `ilst` metadata, chapter
//! track parsing (QuickTime `tx3g` and Nero `chpl`), and the `moov` rebuild
//! + chunk-offset patching used on write.

pub mod atom;
pub mod builder;
pub mod chapter;
pub mod fields;
pub mod genre;
pub mod metadata;
pub mod moov_rebuild;
pub mod reader;
pub mod writer;

pub use reader::{read, read_chapters};
pub use writer::{strip_metadata, write};
