//! Dataset construction: quotation text and context windows cut from a novel.
//!
//! Spans index characters (not bytes) of the novel text after newlines are
//! replaced by spaces. A quotation's text runs from one character before its
//! first span to one character after its last span, so the surrounding quote
//! marks are included.

use std::io::Write;
use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ColumnMapping;
use crate::error::ScoreError;
use crate::loader::load_span_cells;

/// Parse a `quoteByteSpans` cell such as `[[120, 180], [200, 260]]`.
pub fn parse_spans(raw: &str) -> Result<Vec<(usize, usize)>, String> {
    let spans: Vec<(usize, usize)> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    if spans.is_empty() {
        return Err("empty span list".into());
    }
    Ok(spans)
}

/// Titles after which UAX #29 wrongly ends a sentence ("Mr. Darcy").
const ABBREVIATIONS: &[&str] = &[
    "Mr.", "Mrs.", "Ms.", "Messrs.", "Dr.", "St.", "Jr.", "Sr.", "Rev.", "Col.", "Capt.", "Gen.", "Lt.", "Prof.",
];

/// Sentence segments, with any segment ending in a title joined to the next.
fn merge_abbreviations(text: &str) -> Vec<Range<usize>> {
    let mut sentences = Vec::new();
    let mut pending: Option<usize> = None;
    for (i, segment) in text.split_sentence_bound_indices() {
        let start = pending.take().unwrap_or(i);
        let last_word = segment
            .split_whitespace()
            .next_back()
            .map(|w| w.trim_start_matches(|c: char| !c.is_alphanumeric()))
            .unwrap_or("");
        if ABBREVIATIONS.contains(&last_word) {
            pending = Some(start);
        } else {
            sentences.push(start..i + segment.len());
        }
    }
    if let Some(start) = pending {
        sentences.push(start..text.len());
    }
    sentences
}

/// Novel text prepared for slicing by character offset and by sentence.
pub struct NovelText {
    text: String,
    /// Byte offset of every character, plus `text.len()` at the end.
    char_starts: Vec<usize>,
    /// UAX #29 sentence segments as byte ranges, in order.
    sentences: Vec<Range<usize>>,
}

impl NovelText {
    pub fn new(raw: &str) -> Self {
        let text = raw.replace('\n', " ");
        let char_starts = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let sentences = merge_abbreviations(&text);
        Self {
            text,
            char_starts,
            sentences,
        }
    }

    pub fn char_len(&self) -> usize {
        self.char_starts.len() - 1
    }

    /// Byte offset of character `ch`, clamped to the end of the text.
    fn byte_at(&self, ch: usize) -> usize {
        self.char_starts[ch.min(self.char_len())]
    }

    /// Character bounds `start..end` of the quotation covered by `spans`.
    pub fn quote_bounds(&self, row: usize, spans: &[(usize, usize)]) -> Result<Range<usize>, ScoreError> {
        let first = spans.first().map(|s| s.0).unwrap_or(0);
        let last = spans.last().map(|s| s.1).unwrap_or(0);
        let out_of_range = || ScoreError::SpanOutOfRange {
            row,
            start: first,
            end: last,
            len: self.char_len(),
        };

        let start = first.checked_sub(1).ok_or_else(out_of_range)?;
        let end = (last + 1).min(self.char_len());
        if start > end {
            return Err(out_of_range());
        }
        Ok(start..end)
    }

    /// Text of characters `range`, end clamped to the text.
    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.text[self.byte_at(range.start)..self.byte_at(range.end)]
    }

    /// Up to `window` sentences ending at character `before`, oldest first.
    ///
    /// The sentence cut by `before` counts as one (its head only).
    pub fn left_context(&self, before: usize, window: usize) -> String {
        let bound = self.byte_at(before);
        let n = self.sentences.partition_point(|r| r.start < bound);
        let mut picked: Vec<&str> = self.sentences[..n]
            .iter()
            .rev()
            .map(|r| self.text[r.start..r.end.min(bound)].trim())
            .filter(|s| is_sentence(s))
            .take(window)
            .collect();
        picked.reverse();
        picked.join(" ")
    }

    /// Up to `window` sentences starting at character `from`.
    ///
    /// The sentence cut by `from` counts as one (its tail only).
    pub fn right_context(&self, from: usize, window: usize) -> String {
        let bound = self.byte_at(from);
        let n = self.sentences.partition_point(|r| r.end <= bound);
        self.sentences[n..]
            .iter()
            .map(|r| self.text[r.start.max(bound)..r.end].trim())
            .filter(|s| is_sentence(s))
            .take(window)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Segments with no letters or digits (stray punctuation, whitespace) are not sentences.
fn is_sentence(s: &str) -> bool {
    s.chars().any(char::is_alphanumeric)
}

fn quotation_bounds(
    quotations_csv: &str,
    novel: &NovelText,
    columns: &ColumnMapping,
) -> Result<Vec<Range<usize>>, ScoreError> {
    load_span_cells(quotations_csv, columns)?
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let row = i + 1;
            let spans = parse_spans(raw)
                .map_err(|reason| ScoreError::malformed("quotations", row, &columns.spans, raw, reason))?;
            novel.quote_bounds(row, &spans)
        })
        .collect()
}

/// Write a `quoteText` CSV with one row per quotation. Returns the row count.
pub fn write_quotes<W: Write>(
    quotations_csv: &str,
    novel: &NovelText,
    columns: &ColumnMapping,
    out: W,
) -> Result<usize, ScoreError> {
    let bounds = quotation_bounds(quotations_csv, novel, columns)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["quoteText"])?;
    for range in &bounds {
        writer.write_record([novel.slice(range.clone())])?;
    }
    writer.flush()?;

    log::info!("wrote {} quotation(s)", bounds.len());
    Ok(bounds.len())
}

/// Write a `left_context,right_context` CSV with `window` sentences per side.
///
/// The right context starts one character past the quotation's end.
pub fn write_contexts<W: Write>(
    quotations_csv: &str,
    novel: &NovelText,
    columns: &ColumnMapping,
    window: usize,
    out: W,
) -> Result<usize, ScoreError> {
    let bounds = quotation_bounds(quotations_csv, novel, columns)?;

    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(["left_context", "right_context"])?;
    for range in &bounds {
        let left = novel.left_context(range.start, window);
        let right = novel.right_context(range.end + 1, window);
        writer.write_record([left.as_str(), right.as_str()])?;
    }
    writer.flush()?;

    log::info!("wrote {} context row(s), window {window}", bounds.len());
    Ok(bounds.len())
}
