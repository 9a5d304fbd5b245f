//! Chapter interchange codecs (§4.4): Podlove JSON/XML, MP4Chaps,
//! FFmetadata, Markdown, Podcast Namespace, Cue Sheet. Each format is a
//! pure string ↔ `ChapterList` transform; none touch a file directly.

pub mod cue_sheet;
pub mod ffmetadata;
pub mod markdown;
pub mod mp4chaps;
pub mod podcast_namespace;
pub mod podlove_json;
pub mod podlove_xml;

use crate::error::ExportError;
use crate::model::chapter::ChapterList;

/// One of the textual chapter interchange formats. Markdown is export-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat
{
    PodloveJson,
    PodloveXml,
    Mp4Chaps,
    FfMetadata,
    Markdown,
    PodcastNamespace,
    CueSheet
}

pub fn export(chapters: &ChapterList, format: ExportFormat) -> Result<String, ExportError>
{
    match format
    {
        | ExportFormat::PodloveJson => Ok(podlove_json::export(chapters)),
        | ExportFormat::PodloveXml => Ok(podlove_xml::export(chapters)),
        | ExportFormat::Mp4Chaps => mp4chaps::export(chapters),
        | ExportFormat::FfMetadata => Ok(ffmetadata::export(chapters)),
        | ExportFormat::Markdown => Ok(markdown::export(chapters)),
        | ExportFormat::PodcastNamespace => podcast_namespace::export(chapters),
        | ExportFormat::CueSheet => Ok(cue_sheet::export(chapters))
    }
}

pub fn import(text: &str, format: ExportFormat) -> Result<ChapterList, ExportError>
{
    match format
    {
        | ExportFormat::PodloveJson => podlove_json::parse(text),
        | ExportFormat::PodloveXml => podlove_xml::parse(text),
        | ExportFormat::Mp4Chaps => mp4chaps::parse(text),
        | ExportFormat::FfMetadata => ffmetadata::parse(text),
        | ExportFormat::Markdown => markdown::parse(text),
        | ExportFormat::PodcastNamespace => podcast_namespace::parse(text),
        | ExportFormat::CueSheet => cue_sheet::parse(text)
    }
}
