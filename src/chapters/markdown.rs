//! Markdown (§4.4): `N. **HH:MM:SS** — title` (em-dash U+2014). Export only.

use crate::error::ExportError;
use crate::model::chapter::ChapterList;

pub fn export(chapters: &ChapterList) -> String
{
    let mut out = String::new();
    for (i, c) in chapters.iter().enumerate()
    {
        out.push_str(&format!("{}. **{}** — {}\n", i + 1, c.start.format_short(), c.title));
    }
    out
}

pub fn parse(_text: &str) -> Result<ChapterList, ExportError>
{
    Err(ExportError::ImportNotSupported("Markdown".into()))
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::model::chapter::Chapter;
    use crate::model::timestamp::AudioTimestamp;

    #[test]
    fn exports_numbered_bold_timestamps()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(AudioTimestamp::from_millis(0).unwrap(), "Intro"));
        list.push(Chapter::new(AudioTimestamp::from_millis(90_000).unwrap(), "Main"));
        let out = export(&list);
        assert_eq!(out, "1. **00:00:00** — Intro\n2. **00:01:30** — Main\n");
    }

    #[test]
    fn import_is_unsupported()
    {
        match parse("1. **00:00:00** — Intro\n")
        {
            | Err(ExportError::ImportNotSupported(_)) => {}
            | other => panic!("expected ImportNotSupported, got {other:?}")
        }
    }
}
