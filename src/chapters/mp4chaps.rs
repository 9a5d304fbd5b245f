//! MP4Chaps (§4.4): one chapter per line, `HH:MM:SS.mmm<space>title`.
//! Empty titles are rejected in both directions.

use crate::error::ExportError;
use crate::model::chapter::{Chapter, ChapterList};
use crate::model::timestamp::AudioTimestamp;

pub fn export(chapters: &ChapterList) -> Result<String, ExportError>
{
    let mut out = String::new();
    for c in chapters.iter()
    {
        if c.title.is_empty()
        {
            return Err(ExportError::InvalidData("MP4Chaps does not allow empty chapter titles".into()));
        }
        out.push_str(&format!("{} {}\n", c.start.format_full(), c.title));
    }
    Ok(out)
}

pub fn parse(text: &str) -> Result<ChapterList, ExportError>
{
    let mut list = ChapterList::new();
    for line in text.lines()
    {
        let line = line.trim();
        if line.is_empty()
        {
            continue;
        }
        let (ts_text, title) = line.split_once(' ').ok_or_else(|| ExportError::InvalidFormat(format!("malformed MP4Chaps line: {line}")))?;
        let title = title.trim();
        if title.is_empty()
        {
            return Err(ExportError::InvalidData("MP4Chaps does not allow empty chapter titles".into()));
        }
        let start = AudioTimestamp::parse(ts_text).map_err(|e| ExportError::InvalidData(e.to_string()))?;
        list.push(Chapter::new(start, title));
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
    fn exports_one_line_per_chapter()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(0), "Intro"));
        list.push(Chapter::new(ts(30_000), "Main"));
        assert_eq!(export(&list).unwrap(), "00:00:00.000 Intro\n00:00:30.000 Main\n");
    }

    #[test]
    fn rejects_export_of_empty_title()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(0), ""));
        assert!(export(&list).is_err());
    }

    #[test]
    fn parses_exported_output()
    {
        let list = parse("00:00:00.000 Intro\n00:01:00.000 Main\n").unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].start.as_millis(), 60_000);
    }

    #[test]
    fn rejects_parse_of_empty_title()
    {
        assert!(parse("00:00:00.000 \n").is_err());
    }
}
