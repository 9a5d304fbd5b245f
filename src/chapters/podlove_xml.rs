//! Podlove Simple Chapters XML (§4.4): `<psc:chapters version="1.2"
//! xmlns:psc="http://podlove.org/simple-chapters">` with `<psc:chapter
//! start title href?/>` children. SAX-style parse rejects a chapter
//! missing `start` or `title`.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::ExportError;
use crate::model::chapter::{Chapter, ChapterList};
use crate::model::timestamp::AudioTimestamp;

const NAMESPACE: &str = "http://podlove.org/simple-chapters";

fn local_name(bytes: &[u8]) -> String
{
    let s = String::from_utf8_lossy(bytes);
    match s.find(':')
    {
        | Some(i) => s[i + 1..].to_string(),
        | None => s.to_string()
    }
}

fn attr(e: &BytesStart, key: &str) -> Option<String>
{
    e.attributes().flatten().find(|a| local_name(a.key.as_ref()) == key).and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

pub fn parse(xml: &str) -> Result<ChapterList, ExportError>
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut list = ChapterList::new();

    loop
    {
        let event = reader.read_event().map_err(|e| ExportError::InvalidFormat(e.to_string()))?;
        match event
        {
            | Event::Eof => break,
            | Event::Start(e) | Event::Empty(e) =>
            {
                if local_name(e.name().as_ref()) != "chapter"
                {
                    continue;
                }
                let start_text = attr(&e, "start").ok_or_else(|| ExportError::InvalidFormat("psc:chapter missing 'start'".into()))?;
                let title = attr(&e, "title").ok_or_else(|| ExportError::InvalidFormat("psc:chapter missing 'title'".into()))?;
                let start = AudioTimestamp::parse(&start_text).map_err(|err| ExportError::InvalidData(err.to_string()))?;

                let mut chapter = Chapter::new(start, title);
                chapter.url = attr(&e, "href");
                list.push(chapter);
            }
            | _ => {}
        }
    }

    Ok(list)
}

pub fn export(chapters: &ChapterList) -> String
{
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<psc:chapters version=\"1.2\" xmlns:psc=\"{NAMESPACE}\">\n"));
    for c in chapters.iter()
    {
        out.push_str(&format!("  <psc:chapter start=\"{}\" title=\"{}\"", c.start.format_full(), xml_escape_attr(&c.title)));
        if let Some(href) = &c.url
        {
            out.push_str(&format!(" href=\"{}\"", xml_escape_attr(href)));
        }
        out.push_str("/>\n");
    }
    out.push_str("</psc:chapters>\n");
    out
}

fn xml_escape_attr(text: &str) -> String
{
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
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
    fn parses_chapters_with_and_without_href()
    {
        let xml = r#"<?xml version="1.0"?><psc:chapters version="1.2" xmlns:psc="http://podlove.org/simple-chapters">
            <psc:chapter start="00:00:00.000" title="Intro"/>
            <psc:chapter start="00:00:30.000" title="Main" href="https://example.com"/>
        </psc:chapters>"#;
        let list = parse(xml).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.as_slice()[1].url.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn rejects_chapter_missing_start()
    {
        let xml = r#"<psc:chapters version="1.2"><psc:chapter title="Intro"/></psc:chapters>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn rejects_chapter_missing_title()
    {
        let xml = r#"<psc:chapters version="1.2"><psc:chapter start="00:00:00.000"/></psc:chapters>"#;
        assert!(parse(xml).is_err());
    }

    #[test]
    fn round_trips_through_export()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(0), "Intro"));
        let reparsed = parse(&export(&list)).unwrap();
        assert_eq!(reparsed.as_slice()[0].title, "Intro");
    }
}
