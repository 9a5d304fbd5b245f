//! TTML (§4.4.1): full document round-trip via a SAX-style tree builder on
//! top of `quick_xml`'s pull-event `Reader`.

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::TtmlParseError;
use crate::model::lyrics::{LyricLine, LyricSegment, LyricsContentType, SynchronizedLyrics, DEFAULT_LANGUAGE};
use crate::model::timestamp::AudioTimestamp;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style
{
    pub id:         String,
    pub attributes: BTreeMap<String, String>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region
{
    pub id:         String,
    pub attributes: BTreeMap<String, String>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Agent
{
    pub id:   String,
    pub name: Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span
{
    pub begin:    AudioTimestamp,
    pub end:      Option<AudioTimestamp>,
    pub text:     String,
    pub style_id: Option<String>
}

#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph
{
    pub begin:     AudioTimestamp,
    pub end:       Option<AudioTimestamp>,
    pub text:      String,
    pub spans:     Vec<Span>,
    pub style_id:  Option<String>,
    pub region_id: Option<String>,
    pub agent_id:  Option<String>,
    pub role:      Option<String>
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Division
{
    pub language:   Option<String>,
    pub paragraphs: Vec<Paragraph>
}

#[derive(Debug, Clone, PartialEq)]
pub struct TtmlDocument
{
    pub language:    String,
    pub time_base:   String,
    pub frame_rate:  Option<f64>,
    pub title:       Option<String>,
    pub description: Option<String>,
    pub styles:      Vec<Style>,
    pub regions:     Vec<Region>,
    pub agents:      Vec<Agent>,
    pub divisions:   Vec<Division>
}

impl Default for TtmlDocument
{
    fn default() -> Self
    {
        Self { language: DEFAULT_LANGUAGE.to_string(), time_base: "media".to_string(), frame_rate: None, title: None, description: None, styles: Vec::new(), regions: Vec::new(), agents: Vec::new(), divisions: Vec::new() }
    }
}

/// ISO 639-1 → 639-2 upgrade table for division/document languages (§4.4.1).
/// Unknown or already-three-letter codes pass through unchanged.
fn upgrade_language(code: &str) -> String
{
    let upgraded = match code
    {
        | "en" => "eng",
        | "fr" => "fra",
        | "de" => "deu",
        | "es" => "spa",
        | "it" => "ita",
        | "pt" => "por",
        | "ja" => "jpn",
        | "zh" => "zho",
        | "ru" => "rus",
        | "ko" => "kor",
        | "nl" => "nld",
        | "sv" => "swe",
        | "pl" => "pol",
        | "ar" => "ara",
        | _ => return code.to_string()
    };
    upgraded.to_string()
}

impl TtmlDocument
{
    /// One `SynchronizedLyrics` per division (§4.4.1). Division language
    /// takes precedence over the document language.
    pub fn to_synchronized_lyrics(&self) -> Vec<SynchronizedLyrics>
    {
        self.divisions
            .iter()
            .map(|div| {
                let language = upgrade_language(div.language.as_deref().unwrap_or(&self.language));
                let mut lyrics = SynchronizedLyrics { language, content_type: LyricsContentType::default(), descriptor: self.title.clone().unwrap_or_default(), lines: Vec::new() };

                for p in &div.paragraphs
                {
                    let mut line = LyricLine::new(p.begin, p.text.clone());
                    line.segments = p.spans.iter().map(|s| LyricSegment { start_time: s.begin, end_time: s.end, text: s.text.clone(), style_id: s.style_id.clone() }).collect();
                    line.speaker = p.agent_id.as_ref().and_then(|id| self.agents.iter().find(|a| &a.id == id)).and_then(|a| a.name.clone()).or_else(|| p.agent_id.clone());
                    lyrics.push_line(line);
                }

                lyrics
            })
            .collect()
    }

    /// One division per `SynchronizedLyrics`; the inverse of
    /// [`TtmlDocument::to_synchronized_lyrics`].
    pub fn from_lyrics(lyrics: &[SynchronizedLyrics]) -> TtmlDocument
    {
        let mut doc = TtmlDocument::default();

        for sl in lyrics
        {
            let mut div = Division { language: Some(sl.language_or_default().to_string()), paragraphs: Vec::new() };

            for line in &sl.lines
            {
                let agent_id = line.speaker.as_ref().map(|name| {
                    if let Some(existing) = doc.agents.iter().find(|a| a.name.as_deref() == Some(name.as_str()))
                    {
                        existing.id.clone()
                    }
                    else
                    {
                        let id = format!("a{}", doc.agents.len() + 1);
                        doc.agents.push(Agent { id: id.clone(), name: Some(name.clone()) });
                        id
                    }
                });

                let spans = line.segments.iter().map(|seg| Span { begin: seg.start_time, end: seg.end_time, text: seg.text.clone(), style_id: seg.style_id.clone() }).collect();

                div.paragraphs.push(Paragraph { begin: line.time, end: None, text: line.text.clone(), spans, style_id: None, region_id: None, agent_id, role: None });
            }

            doc.divisions.push(div);
        }

        doc
    }

    /// Lossless document export: namespaced `tt`/`ttm`/`tts`/`ttp`, `head`
    /// present only when it would carry content, styles/regions in sorted
    /// key order (guaranteed by `BTreeMap`).
    pub fn export_document(&self) -> String
    {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<tt xmlns=\"http://www.w3.org/ns/ttml\" xmlns:ttm=\"http://www.w3.org/ns/ttml#metadata\" xmlns:tts=\"http://www.w3.org/ns/ttml#styling\" xmlns:ttp=\"http://www.w3.org/ns/ttml#parameter\"");
        if !self.language.is_empty()
        {
            out.push_str(&format!(" xml:lang=\"{}\"", xml_escape_attr(&self.language)));
        }
        out.push_str(&format!(" ttp:timeBase=\"{}\"", xml_escape_attr(&self.time_base)));
        if let Some(frame_rate) = self.frame_rate
        {
            out.push_str(&format!(" ttp:frameRate=\"{frame_rate}\""));
        }
        out.push_str(">\n");

        let has_head = self.title.is_some() || self.description.is_some() || !self.styles.is_empty() || !self.regions.is_empty() || !self.agents.is_empty();
        if has_head
        {
            out.push_str("  <head>\n");
            if self.title.is_some() || self.description.is_some() || !self.agents.is_empty()
            {
                out.push_str("    <metadata>\n");
                if let Some(title) = &self.title
                {
                    out.push_str(&format!("      <ttm:title>{}</ttm:title>\n", xml_escape_text(title)));
                }
                if let Some(desc) = &self.description
                {
                    out.push_str(&format!("      <ttm:desc>{}</ttm:desc>\n", xml_escape_text(desc)));
                }
                for agent in &self.agents
                {
                    out.push_str(&format!("      <ttm:agent xml:id=\"{}\">\n", xml_escape_attr(&agent.id)));
                    if let Some(name) = &agent.name
                    {
                        out.push_str(&format!("        <ttm:name>{}</ttm:name>\n", xml_escape_text(name)));
                    }
                    out.push_str("      </ttm:agent>\n");
                }
                out.push_str("    </metadata>\n");
            }
            if !self.styles.is_empty()
            {
                out.push_str("    <styling>\n");
                for style in &self.styles
                {
                    out.push_str(&format!("      <style xml:id=\"{}\"", xml_escape_attr(&style.id)));
                    for (key, value) in &style.attributes
                    {
                        out.push_str(&format!(" {key}=\"{}\"", xml_escape_attr(value)));
                    }
                    out.push_str("/>\n");
                }
                out.push_str("    </styling>\n");
            }
            if !self.regions.is_empty()
            {
                out.push_str("    <layout>\n");
                for region in &self.regions
                {
                    out.push_str(&format!("      <region xml:id=\"{}\"", xml_escape_attr(&region.id)));
                    for (key, value) in &region.attributes
                    {
                        out.push_str(&format!(" {key}=\"{}\"", xml_escape_attr(value)));
                    }
                    out.push_str("/>\n");
                }
                out.push_str("    </layout>\n");
            }
            out.push_str("  </head>\n");
        }

        out.push_str("  <body>\n");
        for div in &self.divisions
        {
            out.push_str("    <div");
            if let Some(lang) = &div.language
            {
                out.push_str(&format!(" xml:lang=\"{}\"", xml_escape_attr(lang)));
            }
            out.push_str(">\n");
            for p in &div.paragraphs
            {
                write_paragraph(&mut out, p);
            }
            out.push_str("    </div>\n");
        }
        out.push_str("  </body>\n");
        out.push_str("</tt>\n");
        out
    }
}

fn write_paragraph(out: &mut String, p: &Paragraph)
{
    out.push_str(&format!("      <p begin=\"{}\"", p.begin.format_full()));
    if let Some(end) = p.end
    {
        out.push_str(&format!(" end=\"{}\"", end.format_full()));
    }
    if let Some(style) = &p.style_id
    {
        out.push_str(&format!(" style=\"{}\"", xml_escape_attr(style)));
    }
    if let Some(region) = &p.region_id
    {
        out.push_str(&format!(" region=\"{}\"", xml_escape_attr(region)));
    }
    if let Some(agent) = &p.agent_id
    {
        out.push_str(&format!(" ttm:agent=\"{}\"", xml_escape_attr(agent)));
    }
    if let Some(role) = &p.role
    {
        out.push_str(&format!(" ttm:role=\"{}\"", xml_escape_attr(role)));
    }
    out.push('>');
    if p.spans.is_empty()
    {
        out.push_str(&xml_escape_text(&p.text));
    }
    else
    {
        for span in &p.spans
        {
            out.push_str(&format!("<span begin=\"{}\"", span.begin.format_full()));
            if let Some(end) = span.end
            {
                out.push_str(&format!(" end=\"{}\"", end.format_full()));
            }
            if let Some(style) = &span.style_id
            {
                out.push_str(&format!(" style=\"{}\"", xml_escape_attr(style)));
            }
            out.push('>');
            out.push_str(&xml_escape_text(&span.text));
            out.push_str("</span>");
        }
    }
    out.push_str("</p>\n");
}

/// The common-case export for a single `SynchronizedLyrics`: body/div/p
/// only, no head sections (§4.4.2).
pub fn export(lyrics: &SynchronizedLyrics) -> String
{
    let doc = TtmlDocument::from_lyrics(std::slice::from_ref(lyrics));
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<tt xmlns=\"http://www.w3.org/ns/ttml\">\n  <body>\n    <div>\n");
    if let Some(div) = doc.divisions.first()
    {
        for p in &div.paragraphs
        {
            write_paragraph(&mut out, p);
        }
    }
    out.push_str("    </div>\n  </body>\n</tt>\n");
    out
}

fn xml_escape_text(text: &str) -> String
{
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn xml_escape_attr(text: &str) -> String
{
    xml_escape_text(text).replace('"', "&quot;")
}

fn local_name(bytes: &[u8]) -> String
{
    let s = String::from_utf8_lossy(bytes);
    match s.find(':')
    {
        | Some(i) => s[i + 1..].to_string(),
        | None => s.to_string()
    }
}

fn attr_exact(e: &BytesStart, key: &str) -> Option<String>
{
    e.attributes().flatten().find(|a| a.key.as_ref() == key.as_bytes()).and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn attr_local(e: &BytesStart, local: &str) -> Option<String>
{
    e.attributes().flatten().find(|a| local_name(a.key.as_ref()) == local).and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Parse a clock-form time expression (`HH:MM:SS`, `HH:MM:SS.fff`, or
/// `HH:MM:SS:frames` when `frame_rate` is known).
fn parse_clock(s: &str, frame_rate: Option<f64>) -> Result<f64, TtmlParseError>
{
    let bad = || TtmlParseError::InvalidTimeExpression(s.to_string());
    let (main, frac) = s.split_once('.').map(|(m, f)| (m, Some(f))).unwrap_or((s, None));
    let parts: Vec<&str> = main.split(':').collect();

    match parts.as_slice()
    {
        | [h, m, sec] =>
        {
            let h: f64 = h.parse().map_err(|_| bad())?;
            let m: f64 = m.parse().map_err(|_| bad())?;
            let sec: f64 = sec.parse().map_err(|_| bad())?;
            let frac_s: f64 = match frac
            {
                | Some(f) => format!("0.{f}").parse().map_err(|_| bad())?,
                | None => 0.0
            };
            Ok(h * 3600.0 + m * 60.0 + sec + frac_s)
        }
        | [h, m, sec, frames] =>
        {
            let fr = frame_rate.ok_or_else(bad)?;
            let h: f64 = h.parse().map_err(|_| bad())?;
            let m: f64 = m.parse().map_err(|_| bad())?;
            let sec: f64 = sec.parse().map_err(|_| bad())?;
            let frames: f64 = frames.parse().map_err(|_| bad())?;
            Ok(h * 3600.0 + m * 60.0 + sec + frames / fr)
        }
        | _ => Err(bad())
    }
}

/// Parse an offset-form time expression: `<num>h|m|s|ms|t`, with combined
/// forms like `1h30m` recognized by repeated scanning.
fn parse_offset(s: &str, tick_rate: Option<f64>) -> Result<f64, TtmlParseError>
{
    let bad = || TtmlParseError::InvalidTimeExpression(s.to_string());
    let mut total = 0.0;
    let mut rest = s;
    let mut matched_any = false;

    while !rest.is_empty()
    {
        let digit_end = rest.find(|c: char| !c.is_ascii_digit() && c != '.').unwrap_or(rest.len());
        if digit_end == 0
        {
            return Err(bad());
        }
        let num: f64 = rest[..digit_end].parse().map_err(|_| bad())?;
        rest = &rest[digit_end..];

        let (unit_len, seconds_per_unit, is_tick) = if rest.starts_with("ms")
        {
            (2, 0.001, false)
        }
        else if rest.starts_with('h')
        {
            (1, 3600.0, false)
        }
        else if rest.starts_with('m')
        {
            (1, 60.0, false)
        }
        else if rest.starts_with('s')
        {
            (1, 1.0, false)
        }
        else if rest.starts_with('t')
        {
            (1, 0.0, true)
        }
        else
        {
            return Err(bad());
        };

        if is_tick
        {
            total += num / tick_rate.ok_or_else(bad)?;
        }
        else
        {
            total += num * seconds_per_unit;
        }
        rest = &rest[unit_len..];
        matched_any = true;
    }

    if !matched_any
    {
        return Err(bad());
    }
    Ok(total)
}

fn parse_time_expression(s: &str, frame_rate: Option<f64>, tick_rate: Option<f64>) -> Result<AudioTimestamp, TtmlParseError>
{
    let seconds = if s.contains(':') { parse_clock(s, frame_rate)? } else { parse_offset(s, tick_rate)? };
    AudioTimestamp::from_seconds(seconds).map_err(|_| TtmlParseError::InvalidTimeExpression(s.to_string()))
}

struct ParaBuilder
{
    begin:     AudioTimestamp,
    end:       Option<AudioTimestamp>,
    lines:     Vec<String>,
    spans:     Vec<Span>,
    style_id:  Option<String>,
    region_id: Option<String>,
    agent_id:  Option<String>,
    role:      Option<String>
}

struct SpanBuilder
{
    begin:    AudioTimestamp,
    end:      Option<AudioTimestamp>,
    lines:    Vec<String>,
    style_id: Option<String>
}

fn finalize_lines(lines: &[String]) -> String
{
    lines.iter().map(|l| crate::lyrics::normalize_line(l)).collect::<Vec<_>>().join("\n")
}

/// Parse a TTML document per §4.4.1's SAX-style tree-builder rules.
pub fn parse_document(xml: &str) -> Result<TtmlDocument, TtmlParseError>
{
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut doc = TtmlDocument { language: String::new(), ..TtmlDocument::default() };
    let mut seen_tt = false;

    let mut unknown_depth: u32 = 0;
    let mut capturing_title = false;
    let mut capturing_desc = false;
    let mut capturing_agent_name = false;
    let mut title_buf = String::new();
    let mut desc_buf = String::new();
    let mut agent_name_buf = String::new();

    let mut current_style: Option<Style> = None;
    let mut current_region: Option<Region> = None;
    let mut current_agent: Option<Agent> = None;

    let mut current_div: Option<Division> = None;
    let mut current_para: Option<ParaBuilder> = None;
    let mut current_span: Option<SpanBuilder> = None;

    let mut frame_rate: Option<f64> = None;
    let mut tick_rate: Option<f64> = None;

    loop
    {
        let event = reader.read_event().map_err(|e| TtmlParseError::InvalidXml(e.to_string()))?;
        match &event
        {
            | Event::Eof => break,
            | Event::Start(e) | Event::Empty(e) =>
            {
                let is_empty = matches!(event, Event::Empty(_));
                let name = local_name(e.name().as_ref());

                if unknown_depth > 0
                {
                    if !is_empty
                    {
                        unknown_depth += 1;
                    }
                    continue;
                }

                match name.as_str()
                {
                    | "tt" =>
                    {
                        seen_tt = true;
                        doc.language = attr_exact(e, "xml:lang").unwrap_or_default();
                        doc.time_base = attr_local(e, "timeBase").unwrap_or_else(|| "media".to_string());
                        frame_rate = attr_local(e, "frameRate").and_then(|v| v.parse().ok());
                        tick_rate = attr_local(e, "tickRate").and_then(|v| v.parse().ok());
                        doc.frame_rate = frame_rate;
                    }
                    | "title" =>
                    {
                        capturing_title = true;
                        title_buf.clear();
                    }
                    | "desc" =>
                    {
                        capturing_desc = true;
                        desc_buf.clear();
                    }
                    | "agent" =>
                    {
                        current_agent = Some(Agent { id: attr_exact(e, "xml:id").unwrap_or_default(), name: None });
                    }
                    | "name" if current_agent.is_some() =>
                    {
                        capturing_agent_name = true;
                        agent_name_buf.clear();
                    }
                    | "style" =>
                    {
                        let mut style = Style { id: attr_exact(e, "xml:id").unwrap_or_default(), attributes: BTreeMap::new() };
                        for attr in e.attributes().flatten()
                        {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            if key == "xml:id"
                            {
                                continue;
                            }
                            if let Ok(value) = attr.unescape_value()
                            {
                                style.attributes.insert(key, value.into_owned());
                            }
                        }
                        if is_empty
                        {
                            doc.styles.push(style);
                        }
                        else
                        {
                            current_style = Some(style);
                        }
                    }
                    | "region" =>
                    {
                        let mut region = Region { id: attr_exact(e, "xml:id").unwrap_or_default(), attributes: BTreeMap::new() };
                        for attr in e.attributes().flatten()
                        {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            if key == "xml:id"
                            {
                                continue;
                            }
                            if let Ok(value) = attr.unescape_value()
                            {
                                region.attributes.insert(key, value.into_owned());
                            }
                        }
                        if is_empty
                        {
                            doc.regions.push(region);
                        }
                        else
                        {
                            current_region = Some(region);
                        }
                    }
                    | "div" =>
                    {
                        current_div = Some(Division { language: attr_exact(e, "xml:lang"), paragraphs: Vec::new() });
                    }
                    | "p" =>
                    {
                        let begin_text = attr_local(e, "begin").ok_or(TtmlParseError::MissingTiming)?;
                        let begin = parse_time_expression(&begin_text, frame_rate, tick_rate)?;
                        let end = attr_local(e, "end").map(|t| parse_time_expression(&t, frame_rate, tick_rate)).transpose()?;
                        current_para = Some(ParaBuilder {
                            begin,
                            end,
                            lines: vec![String::new()],
                            spans: Vec::new(),
                            style_id: attr_local(e, "style"),
                            region_id: attr_local(e, "region"),
                            agent_id: attr_local(e, "agent"),
                            role: attr_local(e, "role")
                        });
                        if current_div.is_none()
                        {
                            current_div = Some(Division::default());
                        }
                        if is_empty
                        {
                            finalize_paragraph(&mut current_para, &mut current_div);
                        }
                    }
                    | "span" =>
                    {
                        let fallback_begin = current_para.as_ref().map(|p| p.begin).unwrap_or(AudioTimestamp::ZERO);
                        let begin = attr_local(e, "begin").map(|t| parse_time_expression(&t, frame_rate, tick_rate)).transpose()?.unwrap_or(fallback_begin);
                        let end = attr_local(e, "end").map(|t| parse_time_expression(&t, frame_rate, tick_rate)).transpose()?;
                        current_span = Some(SpanBuilder { begin, end, lines: vec![String::new()], style_id: attr_local(e, "style") });
                        if is_empty
                        {
                            finalize_span(&mut current_span, &mut current_para);
                        }
                    }
                    | "br" =>
                    {
                        if let Some(span) = current_span.as_mut()
                        {
                            span.lines.push(String::new());
                        }
                        else if let Some(para) = current_para.as_mut()
                        {
                            para.lines.push(String::new());
                        }
                    }
                    | _ =>
                    {
                        if !is_empty
                        {
                            unknown_depth += 1;
                        }
                    }
                }
            }
            | Event::End(e) =>
            {
                if unknown_depth > 0
                {
                    unknown_depth -= 1;
                    continue;
                }
                let name = local_name(e.name().as_ref());
                match name.as_str()
                {
                    | "title" =>
                    {
                        capturing_title = false;
                        doc.title = Some(crate::lyrics::normalize_line(&title_buf));
                    }
                    | "desc" =>
                    {
                        capturing_desc = false;
                        doc.description = Some(crate::lyrics::normalize_line(&desc_buf));
                    }
                    | "name" if capturing_agent_name =>
                    {
                        capturing_agent_name = false;
                        if let Some(agent) = current_agent.as_mut()
                        {
                            agent.name = Some(crate::lyrics::normalize_line(&agent_name_buf));
                        }
                    }
                    | "agent" =>
                    {
                        if let Some(agent) = current_agent.take()
                        {
                            doc.agents.push(agent);
                        }
                    }
                    | "style" =>
                    {
                        if let Some(style) = current_style.take()
                        {
                            doc.styles.push(style);
                        }
                    }
                    | "region" =>
                    {
                        if let Some(region) = current_region.take()
                        {
                            doc.regions.push(region);
                        }
                    }
                    | "div" =>
                    {
                        if let Some(div) = current_div.take()
                        {
                            doc.divisions.push(div);
                        }
                    }
                    | "p" => finalize_paragraph(&mut current_para, &mut current_div),
                    | "span" => finalize_span(&mut current_span, &mut current_para),
                    | _ => {}
                }
            }
            | Event::Text(e) =>
            {
                if unknown_depth > 0
                {
                    continue;
                }
                let Ok(raw) = e.unescape()
                else
                {
                    continue;
                };
                if capturing_title
                {
                    title_buf.push_str(&raw);
                }
                else if capturing_desc
                {
                    desc_buf.push_str(&raw);
                }
                else if capturing_agent_name
                {
                    agent_name_buf.push_str(&raw);
                }
                else if let Some(span) = current_span.as_mut()
                {
                    if let Some(last) = span.lines.last_mut()
                    {
                        last.push_str(&raw);
                    }
                }
                else if let Some(para) = current_para.as_mut()
                {
                    if let Some(last) = para.lines.last_mut()
                    {
                        last.push_str(&raw);
                    }
                }
            }
            | _ => {}
        }
    }

    if !seen_tt
    {
        return Err(TtmlParseError::NotTTML);
    }

    Ok(doc)
}

fn finalize_span(current_span: &mut Option<SpanBuilder>, current_para: &mut Option<ParaBuilder>)
{
    let Some(span) = current_span.take()
    else
    {
        return;
    };
    let text = finalize_lines(&span.lines);
    if let Some(para) = current_para.as_mut()
    {
        para.spans.push(Span { begin: span.begin, end: span.end, text, style_id: span.style_id });
    }
}

fn finalize_paragraph(current_para: &mut Option<ParaBuilder>, current_div: &mut Option<Division>)
{
    let Some(para) = current_para.take()
    else
    {
        return;
    };
    let text = finalize_lines(&para.lines);
    let paragraph = Paragraph { begin: para.begin, end: para.end, text, spans: para.spans, style_id: para.style_id, region_id: para.region_id, agent_id: para.agent_id, role: para.role };
    if let Some(div) = current_div.as_mut()
    {
        div.paragraphs.push(paragraph);
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn rejects_document_without_tt_root()
    {
        let err = parse_document("<foo/>").unwrap_err();
        assert!(matches!(err, TtmlParseError::NotTTML));
    }

    #[test]
    fn rejects_paragraph_without_begin()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p>no timing</p></div></body></tt>"#;
        let err = parse_document(xml).unwrap_err();
        assert!(matches!(err, TtmlParseError::MissingTiming));
    }

    #[test]
    fn parses_basic_paragraph_with_clock_timing()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="00:00:01.500" end="00:00:03.000">hello world</p></div></body></tt>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.divisions.len(), 1);
        let p = &doc.divisions[0].paragraphs[0];
        assert_eq!(p.begin.as_millis(), 1_500);
        assert_eq!(p.end.unwrap().as_millis(), 3_000);
        assert_eq!(p.text, "hello world");
    }

    #[test]
    fn br_inserts_newline_and_collapses_line_whitespace()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="0s">line   one<br/>line two</p></div></body></tt>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.divisions[0].paragraphs[0].text, "line one\nline two");
    }

    #[test]
    fn parses_span_segments_as_karaoke()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="0s"><span begin="0s" end="0.5s">hel</span><span begin="0.5s">lo</span></p></div></body></tt>"#;
        let doc = parse_document(xml).unwrap();
        let p = &doc.divisions[0].paragraphs[0];
        assert_eq!(p.spans.len(), 2);
        assert_eq!(p.spans[1].begin.as_millis(), 500);
    }

    #[test]
    fn offset_time_combined_form()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="1m5s">x</p></div></body></tt>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.divisions[0].paragraphs[0].begin.as_millis(), 65_000);
    }

    #[test]
    fn to_synchronized_lyrics_upgrades_iso639_1()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div xml:lang="en"><p begin="0s">hi</p></div></body></tt>"#;
        let doc = parse_document(xml).unwrap();
        let lyrics = doc.to_synchronized_lyrics();
        assert_eq!(lyrics[0].language, "eng");
    }

    #[test]
    fn from_lyrics_and_export_round_trip_text_and_timing()
    {
        let mut lyrics = SynchronizedLyrics::new();
        lyrics.push_line(LyricLine::new(AudioTimestamp::from_millis(1_000).unwrap(), "hi there"));
        let exported = export(&lyrics);
        let doc = parse_document(&exported).unwrap();
        let back = doc.to_synchronized_lyrics();
        assert_eq!(back[0].lines[0].text, "hi there");
        assert_eq!(back[0].lines[0].time.as_millis(), 1_000);
    }

    #[test]
    fn unrecognized_elements_are_ignored_without_leaking_text()
    {
        let xml = r#"<tt xmlns="http://www.w3.org/ns/ttml"><body><div><p begin="0s">before<unknown>ignored text</unknown>after</p></div></body></tt>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.divisions[0].paragraphs[0].text, "beforeafter");
    }
}
