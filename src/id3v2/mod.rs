//! The ID3v2.3/2.4 codec: header, frame layout, frame variants, and the
//! reader/writer/builder operating on a whole tag.

pub mod builder;
pub mod frame;
pub mod frames;
pub mod header;
pub mod raw_frame;
pub mod reader;
pub mod text_encoding;
pub mod writer;

pub use header::Id3Header;
pub use reader::read_tag;
pub use writer::{modify, strip_tag, write};
