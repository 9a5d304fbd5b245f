//! LRC: `[MM:SS.ff]text` synchronized lyrics (§4.4).

use crate::error::ExportError;
use crate::model::lyrics::{LyricLine, SynchronizedLyrics, DEFAULT_LANGUAGE};
use crate::model::timestamp::AudioTimestamp;

enum Tag<'a>
{
    Timestamp(i64, usize),
    Metadata(&'a str, &'a str, usize)
}

/// Parse one `[MM:SS.ff]` or `[MM:SS.fff]` timestamp tag, or a bracketed
/// `[key:value]` metadata tag, from the start of `s`. Returns `None` once
/// no further leading tag is present.
fn parse_leading_tag(s: &str) -> Option<Tag<'_>>
{
    if !s.starts_with('[')
    {
        return None;
    }
    let end = s.find(']')?;
    let inner = &s[1..end];
    let consumed = end + 1;

    if inner.contains('.') && inner.contains(':')
    {
        let (mm_ss, frac) = inner.split_once('.')?;
        let (mm, ss) = mm_ss.split_once(':')?;
        let mm: i64 = mm.trim().parse().ok()?;
        let ss: i64 = ss.trim().parse().ok()?;
        let frac_ms = match frac.trim().len()
        {
            | 2 => frac.trim().parse::<i64>().ok()? * 10,
            | 3 => frac.trim().parse::<i64>().ok()?,
            | _ => return None
        };
        Some(Tag::Timestamp((mm * 60 + ss) * 1000 + frac_ms, consumed))
    }
    else if let Some((key, value)) = inner.split_once(':')
    {
        Some(Tag::Metadata(key.trim(), value.trim(), consumed))
    }
    else
    {
        None
    }
}

/// Parse an LRC document into one `SynchronizedLyrics`. Metadata tags that
/// contain no dot (`[ti:...]`, `[ar:...]`, ...) are skipped, except `[la:]`
/// which sets the language.
pub fn parse(text: &str) -> Result<SynchronizedLyrics, ExportError>
{
    let mut lyrics = SynchronizedLyrics::new();

    for raw_line in text.lines()
    {
        let mut rest = raw_line.trim();
        let mut timestamps = Vec::new();

        while let Some(tag) = parse_leading_tag(rest)
        {
            match tag
            {
                | Tag::Timestamp(ms, consumed) =>
                {
                    timestamps.push(ms);
                    rest = &rest[consumed..];
                }
                | Tag::Metadata(key, value, consumed) =>
                {
                    if key.eq_ignore_ascii_case("la")
                    {
                        lyrics.language = value.to_string();
                    }
                    rest = &rest[consumed..];
                }
            }
        }

        if timestamps.is_empty()
        {
            continue;
        }

        let text = rest.trim().to_string();
        for ms in timestamps
        {
            let time = AudioTimestamp::from_millis(ms).map_err(|e| ExportError::InvalidData(e.to_string()))?;
            lyrics.push_line(LyricLine::new(time, text.clone()));
        }
    }

    Ok(lyrics)
}

/// Export as centisecond-precision LRC (the conventional default; parsing
/// still accepts millisecond precision per §4.4).
pub fn export(lyrics: &SynchronizedLyrics) -> String
{
    let mut out = String::new();

    if lyrics.language_or_default() != DEFAULT_LANGUAGE
    {
        out.push_str(&format!("[la:{}]\n", lyrics.language_or_default()));
    }

    for line in &lyrics.lines
    {
        let ms = line.time.as_millis();
        let mm = ms / 60_000;
        let ss = (ms % 60_000) / 1000;
        let cs = (ms % 1000) / 10;
        out.push_str(&format!("[{mm:02}:{ss:02}.{cs:02}]{}\n", line.text));
    }

    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_centisecond_and_millisecond_timestamps()
    {
        let lyrics = parse("[00:12.34]hello\n[01:02.345]world\n").unwrap();
        assert_eq!(lyrics.lines.len(), 2);
        assert_eq!(lyrics.lines[0].time.as_millis(), 12_340);
        assert_eq!(lyrics.lines[1].time.as_millis(), 62_345);
    }

    #[test]
    fn skips_metadata_tags_without_a_dot()
    {
        let lyrics = parse("[ti:My Song]\n[ar:Someone]\n[00:01.00]line one\n").unwrap();
        assert_eq!(lyrics.lines.len(), 1);
    }

    #[test]
    fn recognizes_language_tag()
    {
        let lyrics = parse("[la:fra]\n[00:01.00]bonjour\n").unwrap();
        assert_eq!(lyrics.language, "fra");
    }

    #[test]
    fn supports_multiple_timestamps_per_line()
    {
        let lyrics = parse("[00:01.00][00:30.00]repeated line\n").unwrap();
        assert_eq!(lyrics.lines.len(), 2);
        assert_eq!(lyrics.lines[0].text, "repeated line");
        assert_eq!(lyrics.lines[1].text, "repeated line");
    }

    #[test]
    fn export_round_trips_through_parse()
    {
        let mut lyrics = SynchronizedLyrics::new();
        lyrics.push_line(LyricLine::new(AudioTimestamp::from_millis(1_230).unwrap(), "hi"));
        let exported = export(&lyrics);
        let reparsed = parse(&exported).unwrap();
        assert_eq!(reparsed.lines[0].time.as_millis(), 1_230);
        assert_eq!(reparsed.lines[0].text, "hi");
    }
}
