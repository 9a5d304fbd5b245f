//! FFmpeg metadata (§4.4): `;FFMETADATA1` header, then one `[CHAPTER]`
//! block per chapter carrying `TIMEBASE`, `START`, `END`, `title`.
//! Supports `TIMEBASE=1/1000` (ms) and `1/1000000` (µs) denominators.

use crate::error::ExportError;
use crate::model::chapter::{Chapter, ChapterList};
use crate::model::timestamp::AudioTimestamp;

const HEADER: &str = ";FFMETADATA1";

fn escape_value(text: &str) -> String
{
    let mut out = String::with_capacity(text.len());
    for ch in text.chars()
    {
        match ch
        {
            | '=' | ';' | '#' | '\\' =>
            {
                out.push('\\');
                out.push(ch);
            }
            | '\n' => out.push_str("\\\n"),
            | _ => out.push(ch)
        }
    }
    out
}

fn unescape_value(text: &str) -> String
{
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next()
    {
        if ch == '\\'
        {
            if let Some(next) = chars.next()
            {
                out.push(next);
                continue;
            }
        }
        out.push(ch);
    }
    out
}

struct Builder
{
    timebase_den: i64,
    start_raw:    Option<i64>,
    end_raw:      Option<i64>,
    title:        Option<String>
}

impl Builder
{
    fn new() -> Self
    {
        Self { timebase_den: 1000, start_raw: None, end_raw: None, title: None }
    }

    fn finish(&self) -> Result<Chapter, ExportError>
    {
        let start_raw = self.start_raw.ok_or_else(|| ExportError::InvalidData("[CHAPTER] missing START".into()))?;
        let den = self.timebase_den.max(1) as i128;
        let start_millis = (start_raw as i128 * 1000 / den) as i64;
        let start = AudioTimestamp::from_millis(start_millis).map_err(|e| ExportError::InvalidData(e.to_string()))?;

        let mut chapter = Chapter::new(start, self.title.clone().unwrap_or_default());
        if let Some(end_raw) = self.end_raw
        {
            let end_millis = (end_raw as i128 * 1000 / den) as i64;
            chapter.end = AudioTimestamp::from_millis(end_millis).ok();
        }
        Ok(chapter)
    }
}

pub fn export(chapters: &ChapterList) -> String
{
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');

    let ends = chapters.effective_end_times();
    for (c, end) in chapters.iter().zip(ends.iter())
    {
        out.push_str("[CHAPTER]\n");
        out.push_str("TIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\n", c.start.as_millis()));
        out.push_str(&format!("END={}\n", end.as_millis()));
        out.push_str(&format!("title={}\n", escape_value(&c.title)));
    }
    out
}

pub fn parse(text: &str) -> Result<ChapterList, ExportError>
{
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| ExportError::InvalidFormat("empty FFmetadata document".into()))?;
    if header.trim() != HEADER
    {
        return Err(ExportError::InvalidFormat("missing ;FFMETADATA1 header".into()));
    }

    let mut list = ChapterList::new();
    let mut current: Option<Builder> = None;

    for raw_line in lines
    {
        let line = raw_line.trim_end();
        if line.trim() == "[CHAPTER]"
        {
            if let Some(b) = current.take()
            {
                list.push(b.finish()?);
            }
            current = Some(Builder::new());
            continue;
        }

        let Some(builder) = current.as_mut()
        else
        {
            continue;
        };
        let Some((key, value)) = line.split_once('=')
        else
        {
            continue;
        };

        match key
        {
            | "TIMEBASE" =>
            {
                if let Some((_, den)) = value.split_once('/')
                {
                    builder.timebase_den = den.trim().parse().unwrap_or(1000);
                }
            }
            | "START" => builder.start_raw = value.trim().parse().ok(),
            | "END" => builder.end_raw = value.trim().parse().ok(),
            | "title" => builder.title = Some(unescape_value(value.trim())),
            | _ => {}
        }
    }

    if let Some(b) = current.take()
    {
        list.push(b.finish()?);
    }

    Ok(list)
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
    fn exports_millisecond_timebase()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(0), "Intro"));
        list.push(Chapter::new(ts(30_000), "Main"));
        let out = export(&list);
        assert!(out.starts_with(";FFMETADATA1\n"));
        assert!(out.contains("START=0\n"));
        assert!(out.contains("END=30000\n"));
    }

    #[test]
    fn parses_microsecond_timebase()
    {
        let doc = ";FFMETADATA1\n[CHAPTER]\nTIMEBASE=1/1000000\nSTART=0\nEND=30000000\ntitle=Intro\n";
        let list = parse(doc).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.as_slice()[0].end.unwrap().as_millis(), 30_000);
    }

    #[test]
    fn round_trips_escaped_title()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(0), "A = B; #C \\D"));
        let reparsed = parse(&export(&list)).unwrap();
        assert_eq!(reparsed.as_slice()[0].title, "A = B; #C \\D");
    }

    #[test]
    fn rejects_missing_header()
    {
        assert!(parse("[CHAPTER]\nSTART=0\n").is_err());
    }
}
