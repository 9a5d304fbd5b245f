//! One module per ID3v2 frame shape, mirroring the teacher's
//! `id3v2::frames::*` layout.

pub mod attached_picture;
pub mod chapter;
pub mod comment;
pub mod play_count;
pub mod sync_lyrics;
pub mod table_of_contents;
pub mod text;
pub mod unique_file_id;
pub mod user_text;
pub mod user_url;
pub mod url;
