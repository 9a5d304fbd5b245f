//! Lyrics interchange codecs (§4.4): LRC, TTML, WebVTT, SRT. Each is a pure
//! string ↔ domain transform; none touch a file directly.

pub mod lrc;
pub mod srt;
pub mod ttml;
pub mod webvtt;

/// Collapse runs of ASCII/Unicode whitespace within a line to single
/// spaces, trimming the ends. Shared by every format that must normalize
/// cue text (§4.4.1's per-line rule, reused by WebVTT/SRT tag stripping).
pub(crate) fn normalize_line(text: &str) -> String
{
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip `<...>` HTML-like tags from cue text (WebVTT/SRT §4.4 rule),
/// leaving the enclosed text in place.
pub(crate) fn strip_html_tags(text: &str) -> String
{
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars()
    {
        match ch
        {
            | '<' => in_tag = true,
            | '>' => in_tag = false,
            | _ if !in_tag => out.push(ch),
            | _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn normalize_line_collapses_internal_whitespace()
    {
        assert_eq!(normalize_line("  hello   world  "), "hello world");
    }

    #[test]
    fn strip_html_tags_removes_markup_only()
    {
        assert_eq!(strip_html_tags("<b>bold</b> and <i>italic</i>"), "bold and italic");
    }
}
