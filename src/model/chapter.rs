//! `Chapter` and `ChapterList`.

use crate::model::artwork::Artwork;
use crate::model::timestamp::AudioTimestamp;

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter
{
    pub start:   AudioTimestamp,
    pub title:   String,
    pub end:     Option<AudioTimestamp>,
    pub url:     Option<String>,
    pub artwork: Option<Artwork>
}

impl Chapter
{
    pub fn new(start: AudioTimestamp, title: impl Into<String>) -> Self
    {
        Self { start, title: title.into(), end: None, url: None, artwork: None }
    }

    /// `true` iff `end` is absent or `end >= start` (§3 invariant).
    pub fn is_valid(&self) -> bool
    {
        self.end.is_none_or(|end| end >= self.start)
    }

    /// The title, or a synthesized `"Chapter N"` label where a label is
    /// structurally required (1-based index).
    pub fn title_or_synthesized(&self, index: usize) -> String
    {
        if self.title.is_empty() { format!("Chapter {}", index + 1) } else { self.title.clone() }
    }
}

/// An ordered sequence of chapters, semantically sorted by `start`.
///
/// Per §9's design note, mutation keeps the list sorted so writers can
/// assume ordering without re-sorting on every read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterList
{
    chapters: Vec<Chapter>
}

impl ChapterList
{
    pub fn new() -> Self
    {
        Self { chapters: Vec::new() }
    }

    pub fn from_unsorted(mut chapters: Vec<Chapter>) -> Self
    {
        chapters.sort_by_key(|c| c.start);
        Self { chapters }
    }

    pub fn push(&mut self, chapter: Chapter)
    {
        let pos = self.chapters.partition_point(|c| c.start <= chapter.start);
        self.chapters.insert(pos, chapter);
    }

    pub fn is_empty(&self) -> bool
    {
        self.chapters.is_empty()
    }

    pub fn len(&self) -> usize
    {
        self.chapters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chapter>
    {
        self.chapters.iter()
    }

    pub fn as_slice(&self) -> &[Chapter]
    {
        &self.chapters
    }

    pub fn into_vec(self) -> Vec<Chapter>
    {
        self.chapters
    }

    /// Resolve each chapter's effective end time per the CHAP rule in
    /// §4.2.7: explicit `end`, else the next chapter's start, else
    /// `start + 1ms`.
    pub fn effective_end_times(&self) -> Vec<AudioTimestamp>
    {
        self.chapters
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if let Some(end) = c.end
                {
                    end
                }
                else if let Some(next) = self.chapters.get(i + 1)
                {
                    next.start
                }
                else
                {
                    AudioTimestamp::from_millis(c.start.as_millis() + 1).unwrap_or(c.start)
                }
            })
            .collect()
    }
}

impl FromIterator<Chapter> for ChapterList
{
    fn from_iter<T: IntoIterator<Item = Chapter>>(iter: T) -> Self
    {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

impl IntoIterator for ChapterList
{
    type Item = Chapter;
    type IntoIter = std::vec::IntoIter<Chapter>;

    fn into_iter(self) -> Self::IntoIter
    {
        self.chapters.into_iter()
    }
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
    fn push_keeps_sorted_order()
    {
        let mut list = ChapterList::new();
        list.push(Chapter::new(ts(30_000), "B"));
        list.push(Chapter::new(ts(0), "A"));
        list.push(Chapter::new(ts(60_000), "C"));
        let starts: Vec<i64> = list.iter().map(|c| c.start.as_millis()).collect();
        assert_eq!(starts, vec![0, 30_000, 60_000]);
    }

    #[test]
    fn effective_end_times_match_spec_example()
    {
        let list = ChapterList::from_unsorted(vec![Chapter::new(ts(0), "A"), Chapter::new(ts(30_000), "B"), Chapter::new(ts(60_000), "C")]);
        let ends: Vec<i64> = list.effective_end_times().iter().map(|t| t.as_millis()).collect();
        assert_eq!(ends, vec![30_000, 60_000, 60_001]);
    }

    #[test]
    fn empty_title_survives_without_synthesis()
    {
        let c = Chapter::new(ts(0), "");
        assert_eq!(c.title, "");
    }

    #[test]
    fn synthesized_label_used_only_when_required()
    {
        let c = Chapter::new(ts(0), "");
        assert_eq!(c.title_or_synthesized(2), "Chapter 3");
    }

    #[test]
    fn invalid_when_end_precedes_start()
    {
        let mut c = Chapter::new(ts(10_000), "X");
        c.end = Some(ts(5_000));
        assert!(!c.is_valid());
    }
}
