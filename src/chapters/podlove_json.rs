//! Podlove Simple Chapters JSON (§4.4): `{ "version": "1.2", "chapters": [
//! { "start", "title", "href"? } ] }`, pretty-printed with sorted keys.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::model::chapter::{Chapter, ChapterList};
use crate::model::timestamp::AudioTimestamp;

// Field order matches the alphabetical key order the format expects; serde
// emits struct fields in declaration order, so this is the whole sorting
// mechanism — no separate BTreeMap pass needed.
#[derive(Debug, Serialize, Deserialize)]
struct Document
{
    chapters: Vec<JsonChapter>,
    version:  String
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonChapter
{
    #[serde(skip_serializing_if = "Option::is_none")]
    href:  Option<String>,
    start: String,
    title: String
}

pub fn export(chapters: &ChapterList) -> String
{
    let doc = Document {
        version:  "1.2".to_string(),
        chapters: chapters.iter().map(|c| JsonChapter { start: c.start.format_full(), title: c.title.clone(), href: c.url.clone() }).collect()
    };
    serde_json::to_string_pretty(&doc).unwrap_or_default()
}

pub fn parse(text: &str) -> Result<ChapterList, ExportError>
{
    let doc: Document = serde_json::from_str(text).map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
    let mut list = ChapterList::new();
    for jc in doc.chapters
    {
        let start = AudioTimestamp::parse(&jc.start).map_err(|e| ExportError::InvalidData(e.to_string()))?;
        let mut chapter = Chapter::new(start, jc.title);
        chapter.url = jc.href;
        list.push(chapter);
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
    fn exports_sorted_keys_and_version()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(0), "Intro"));
        let json = export(&list);
        assert!(json.contains("\"version\": \"1.2\""));
        assert!(json.find("\"chapters\"").unwrap() < json.find("\"version\"").unwrap());
    }

    #[test]
    fn round_trips_with_href()
    {
        let mut list = ChapterList::new();
        let mut c = Chapter::new(ts(30_000), "Main");
        c.url = Some("https://example.com".to_string());
        list.push(c);

        let reparsed = parse(&export(&list)).unwrap();
        assert_eq!(reparsed.as_slice()[0].title, "Main");
        assert_eq!(reparsed.as_slice()[0].start.as_millis(), 30_000);
        assert_eq!(reparsed.as_slice()[0].url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn rejects_malformed_json()
    {
        assert!(parse("not json").is_err());
    }
}
