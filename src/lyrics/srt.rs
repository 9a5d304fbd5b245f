//! SubRip (SRT, §4.4): sequence number, `HH:MM:SS,mmm --> HH:MM:SS,mmm`
//! (comma decimal), text lines. HTML-like tags are stripped on parse.

use crate::error::ExportError;
use crate::lyrics::strip_html_tags;
use crate::model::lyrics::{LyricLine, SynchronizedLyrics};
use crate::model::timestamp::AudioTimestamp;

fn parse_srt_timestamp(text: &str) -> Option<AudioTimestamp>
{
    // SRT uses a comma for the fractional separator; `AudioTimestamp::parse`
    // expects a dot, so swap the last comma for a dot before delegating.
    let dotted = text.trim().replacen(',', ".", 1);
    AudioTimestamp::parse(&dotted).ok()
}

fn format_srt_timestamp(t: AudioTimestamp) -> String
{
    t.format_full().replacen('.', ",", 1)
}

fn parse_timing_line(line: &str) -> Option<(AudioTimestamp, AudioTimestamp)>
{
    let (left, right) = line.split_once("-->")?;
    let start = parse_srt_timestamp(left)?;
    let end_text = right.trim().split_whitespace().next()?;
    let end = parse_srt_timestamp(end_text)?;
    Some((start, end))
}

/// Parse an SRT document into one `SynchronizedLyrics`. Cue end times are
/// discarded after validating the timing line, matching WebVTT's treatment.
pub fn parse(text: &str) -> Result<SynchronizedLyrics, ExportError>
{
    if text.trim().is_empty()
    {
        return Err(ExportError::InvalidFormat("empty SRT document".into()));
    }

    let mut lyrics = SynchronizedLyrics::new();
    let mut lines_iter = text.lines().peekable();
    let mut found_any = false;

    while let Some(&first) = lines_iter.peek()
    {
        if first.trim().is_empty()
        {
            lines_iter.next();
            continue;
        }

        // Sequence number line (optional to skip defensively: if the first
        // non-blank line isn't a plain integer, treat it as the timing line).
        let mut timing_line = lines_iter.next().unwrap();
        if timing_line.trim().parse::<u32>().is_ok()
        {
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
        found_any = true;
    }

    if !found_any
    {
        return Err(ExportError::InvalidFormat("no cues found in SRT document".into()));
    }

    Ok(lyrics)
}

/// Export with each cue numbered from 1 and its end time set to the next
/// cue's start, or 3 seconds past its own start for the final cue.
pub fn export(lyrics: &SynchronizedLyrics) -> String
{
    let mut out = String::new();
    for (i, line) in lyrics.lines.iter().enumerate()
    {
        let start = line.time;
        let end = lyrics.lines.get(i + 1).map(|next| next.time).unwrap_or_else(|| AudioTimestamp::from_millis(start.as_millis() + 3000).unwrap_or(start));
        out.push_str(&format!("{}\n{} --> {}\n{}\n\n", i + 1, format_srt_timestamp(start), format_srt_timestamp(end), line.text));
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
        let doc = "1\n00:00:01,000 --> 00:00:03,000\nHello\n\n2\n00:00:03,000 --> 00:00:05,000\nWorld\n";
        let lyrics = parse(doc).unwrap();
        assert_eq!(lyrics.lines.len(), 2);
        assert_eq!(lyrics.lines[0].text, "Hello");
        assert_eq!(lyrics.lines[1].time.as_millis(), 3_000);
    }

    #[test]
    fn strips_html_tags_from_cue_text()
    {
        let doc = "1\n00:00:01,000 --> 00:00:02,000\n<b>bold</b> text\n";
        let lyrics = parse(doc).unwrap();
        assert_eq!(lyrics.lines[0].text, "bold text");
    }

    #[test]
    fn rejects_empty_input()
    {
        assert!(parse("").is_err());
    }

    #[test]
    fn export_numbers_cues_from_one()
    {
        let mut lyrics = SynchronizedLyrics::new();
        lyrics.push_line(LyricLine::new(AudioTimestamp::from_millis(1000).unwrap(), "Hello"));
        lyrics.push_line(LyricLine::new(AudioTimestamp::from_millis(3000).unwrap(), "World"));
        let exported = export(&lyrics);
        assert!(exported.starts_with("1\n00:00:01,000 --> 00:00:03,000\nHello\n\n2\n"));
    }

    #[test]
    fn round_trips_through_parse()
    {
        let mut lyrics = SynchronizedLyrics::new();
        lyrics.push_line(LyricLine::new(AudioTimestamp::from_millis(1500).unwrap(), "Bonjour"));
        let reparsed = parse(&export(&lyrics)).unwrap();
        assert_eq!(reparsed.lines[0].time, lyrics.lines[0].time);
        assert_eq!(reparsed.lines[0].text, lyrics.lines[0].text);
    }
}
