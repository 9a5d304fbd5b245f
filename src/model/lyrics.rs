//! Lyrics domain model: `LyricSegment`, `LyricLine`, `SynchronizedLyrics`.

use crate::model::timestamp::AudioTimestamp;

/// A word-level karaoke timing span within a `LyricLine`.
#[derive(Debug, Clone, PartialEq)]
pub struct LyricSegment
{
    pub start_time: AudioTimestamp,
    pub end_time:   Option<AudioTimestamp>,
    pub text:       String,
    pub style_id:   Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine
{
    pub time:     AudioTimestamp,
    pub text:     String,
    pub segments: Vec<LyricSegment>,
    pub speaker:  Option<String>
}

impl LyricLine
{
    pub fn new(time: AudioTimestamp, text: impl Into<String>) -> Self
    {
        Self { time, text: text.into(), segments: Vec::new(), speaker: None }
    }

    pub fn is_karaoke(&self) -> bool
    {
        !self.segments.is_empty()
    }

    pub fn has_speaker(&self) -> bool
    {
        self.speaker.is_some()
    }
}

/// The content-type enum carried by ID3 `SYLT` and reused across the lyrics
/// interchange formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LyricsContentType
{
    #[default]
    Lyrics,
    Text,
    Movement,
    Events,
    Chord,
    Trivia
}

impl LyricsContentType
{
    /// The ID3v2 SYLT content-type byte.
    pub fn as_sylt_byte(&self) -> u8
    {
        match self
        {
            | LyricsContentType::Lyrics => 1,
            | LyricsContentType::Text => 2,
            | LyricsContentType::Movement => 3,
            | LyricsContentType::Events => 4,
            | LyricsContentType::Chord => 5,
            | LyricsContentType::Trivia => 6
        }
    }

    pub fn from_sylt_byte(byte: u8) -> Self
    {
        match byte
        {
            | 2 => LyricsContentType::Text,
            | 3 => LyricsContentType::Movement,
            | 4 => LyricsContentType::Events,
            | 5 => LyricsContentType::Chord,
            | 6 => LyricsContentType::Trivia,
            | _ => LyricsContentType::Lyrics
        }
    }
}

/// The default ISO 639-2 language code used whenever one isn't supplied.
pub const DEFAULT_LANGUAGE: &str = "und";

#[derive(Debug, Clone, PartialEq)]
pub struct SynchronizedLyrics
{
    pub language:     String,
    pub content_type: LyricsContentType,
    pub descriptor:   String,
    pub lines:        Vec<LyricLine>
}

impl SynchronizedLyrics
{
    pub fn new() -> Self
    {
        Self { language: DEFAULT_LANGUAGE.to_string(), content_type: LyricsContentType::default(), descriptor: String::new(), lines: Vec::new() }
    }

    /// Push a line, keeping `lines` sorted by `time`. Duplicates at
    /// identical times are preserved in insertion order (stable sort).
    pub fn push_line(&mut self, line: LyricLine)
    {
        self.lines.push(line);
        self.lines.sort_by_key(|l| l.time);
    }

    pub fn language_or_default(&self) -> &str
    {
        if self.language.is_empty() { DEFAULT_LANGUAGE } else { &self.language }
    }
}

impl Default for SynchronizedLyrics
{
    fn default() -> Self
    {
        Self::new()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn ts(ms: i64) -> AudioTimestamp
    {
        AudioTimestamp::from_millis(ms).unwrap()
    }

    #[test]
    fn push_line_keeps_sorted_and_preserves_duplicates()
    {
        let mut lyrics = SynchronizedLyrics::new();
        lyrics.push_line(LyricLine::new(ts(2000), "second"));
        lyrics.push_line(LyricLine::new(ts(1000), "first"));
        lyrics.push_line(LyricLine::new(ts(1000), "first-dup"));

        let texts: Vec<&str> = lyrics.lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "first-dup", "second"]);
    }

    #[test]
    fn empty_language_defaults_to_und()
    {
        let lyrics = SynchronizedLyrics::new();
        assert_eq!(lyrics.language_or_default(), "und");
    }

    #[test]
    fn is_karaoke_iff_segments_present()
    {
        let mut line = LyricLine::new(ts(0), "hi");
        assert!(!line.is_karaoke());
        line.segments.push(LyricSegment { start_time: ts(0), end_time: None, text: "hi".into(), style_id: None });
        assert!(line.is_karaoke());
    }
}
