//! Podcast Namespace chapters (§4.4): a subset of the podcast-namespace
//! chapters JSON spec — `{ "version": "1.2.0", "chapters": [ { "startTime",
//! "title", "url"? } ] }`, `startTime` in fractional seconds.

use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::model::chapter::{Chapter, ChapterList};
use crate::model::timestamp::AudioTimestamp;

#[derive(Debug, Serialize, Deserialize)]
struct Document
{
    chapters: Vec<JsonChapter>,
    version:  String
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonChapter
{
    #[serde(rename = "startTime")]
    start_time: f64,
    title:      String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url:        Option<String>
}

pub fn export(chapters: &ChapterList) -> Result<String, ExportError>
{
    let doc = Document {
        version:  "1.2.0".to_string(),
        chapters: chapters.iter().map(|c| JsonChapter { start_time: c.start.as_seconds(), title: c.title.clone(), url: c.url.clone() }).collect()
    };
    serde_json::to_string_pretty(&doc).map_err(|e| ExportError::InvalidData(e.to_string()))
}

pub fn parse(text: &str) -> Result<ChapterList, ExportError>
{
    let doc: Document = serde_json::from_str(text).map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
    let mut list = ChapterList::new();
    for jc in doc.chapters
    {
        let start = AudioTimestamp::from_seconds(jc.start_time).map_err(|e| ExportError::InvalidData(e.to_string()))?;
        let mut chapter = Chapter::new(start, jc.title);
        chapter.url = jc.url;
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
    fn exports_fractional_seconds()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(1_500), "Intro"));
        let json = export(&list).unwrap();
        assert!(json.contains("\"startTime\": 1.5"));
    }

    #[test]
    fn round_trips_with_url()
    {
        let mut list = ChapterList::new();
        let mut c = Chapter::new(ts(30_000), "Main");
        c.url = Some("https://example.com".to_string());
        list.push(c);

        let reparsed = parse(&export(&list).unwrap()).unwrap();
        assert_eq!(reparsed.as_slice()[0].start.as_millis(), 30_000);
        assert_eq!(reparsed.as_slice()[0].url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn rejects_malformed_json()
    {
        assert!(parse("{}").is_err());
    }
}
