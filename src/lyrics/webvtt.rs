//! WebVTT (§4.4): `WEBVTT` header, `HH:MM:SS.mmm --> HH:MM:SS.mmm` cues.
//! `NOTE` blocks are skipped; HTML-like tags are stripped on parse.

use crate::error::ExportError;
use crate::lyrics::strip_html_tags;
use crate::model::lyrics::{LyricLine, SynchronizedLyrics};
use crate::model::timestamp::AudioTimestamp;

fn parse_timing_line(line: &str) -> Option<(AudioTimestamp, AudioTimestamp)>
{
    let (left, right) = line.split_once("-->")?;
    let start = AudioTimestamp::parse(left.trim()).ok()?;
    let end_text = right.trim().split_whitespace().next()?;
    let end = AudioTimestamp::parse(end_text).ok()?;
    Some((start, end))
}

/// Parse a WebVTT document into one `SynchronizedLyrics`. Cue end times are
/// not representable on `LyricLine` and are discarded after validating the
/// timing line.
pub fn parse(text: &str) -> Result<SynchronizedLyrics, ExportError>
{
    let mut lines_iter = text.lines().peekable();

    let header = lines_iter.next().ok_or_else(|| ExportError::InvalidFormat("empty WebVTT document".into()))?;
    if !header.trim_start().starts_with("WEBVTT")
    {
        return Err(ExportError::InvalidFormat("missing WEBVTT header".into()));
    }

    let mut lyrics = SynchronizedLyrics::new();

    while let Some(&first) = lines_iter.peek()
    {
        if first.trim().is_empty()
        {
            lines_iter.next();
            continue;
        }
        if first.trim_start().starts_with("NOTE")
        {
            while let Some(line) = lines_iter.next()
            {
                if line.trim().is_empty()
                {
                    break;
                }
            }
            continue;
        }

        let mut timing_line = lines_iter.next().unwrap();
        if !timing_line.contains("-->")
        {
            // this line was a cue identifier; the next one carries timing.
            match lines_iter.next()
            {
                | Some(next) => timing_line = next,
                | None => break
            }
        }

        let Some((start, _end)) = parse_timing_line(timing_line)
        else
        {
            continue;
        };

        let mut text_lines = Vec::new();
        for line in lines_iter.by_ref()
        {
            if line.trim().is_empty()
            {
                break;
            }
            text_lines.push(line);
        }

        let cue_text = strip_html_tags(&text_lines.join("\n"));
        lyrics.push_line(LyricLine::new(start, cue_text));
    }

    Ok(lyrics)
}

/// Export with each cue's end time set to the next cue's start, or 3
/// seconds past its own start for the final cue.
pub fn export(lyrics: &SynchronizedLyrics) -> String
{
    let mut out = String::from("WEBVTT\n\n");
    for (i, line) in lyrics.lines.iter().enumerate()
    {
        let start = line.time;
        let end = lyrics.lines.get(i + 1).map(|next| next.time).unwrap_or_else(|| AudioTimestamp::from_millis(start.as_millis() + 3000).unwrap_or(start));
        out.push_str(&format!("{} --> {}\n{}\n\n", start.format_full(), end.format_full(), line.text));
    }
    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn parses_basic_cues()
    {
        let doc = "WEBVTT\n\n00:00:01.000 --> 00:00:03.000\nHello\n\n00:00:03.000 --> 00:00:05.000\nWorld\n";
        let lyrics = parse(doc).unwrap();
        assert_eq!(lyrics.lines.len(), 2);
        assert_eq!(lyrics.lines[0].text, "Hello");
        assert_eq!(lyrics.lines[1].time.as_millis(), 3_000);
    }

    #[test]
    fn skips_note_blocks()
    {
        let doc = "WEBVTT\n\nNOTE this is a comment\nstill part of note\n\n00:00:01.000 --> 00:00:02.000\nCue\n";
        let lyrics = parse(doc).unwrap();
        assert_eq!(lyrics.lines.len(), 1);
        assert_eq!(lyrics.lines[0].text, "Cue");
    }

    #[test]
    fn strips_html_tags_from_cue_text()
    {
        let doc = "WEBVTT\n\n00:00:01.000 --> 00:00:02.000\n<b>bold</b> text\n";
        let lyrics = parse(doc).unwrap();
        assert_eq!(lyrics.lines[0].text, "bold text");
    }

    #[test]
    fn handles_cue_identifiers()
    {
        let doc = "WEBVTT\n\n1\n00:00:01.000 --> 00:00:02.000\nCue text\n";
        let lyrics = parse(doc).unwrap();
        assert_eq!(lyrics.lines[0].text, "Cue text");
    }

    #[test]
    fn rejects_missing_header()
    {
        assert!(parse("not a vtt file").is_err());
    }
}
