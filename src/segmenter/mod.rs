// Paragraph and sentence segmentation of a document's analysis text.
// Segments are ephemeral: they are re-derived from the text on every run.

use anyhow::Result;

use crate::config::Granularity;

pub mod normalization;
pub mod sentences;

pub use normalization::{index_key, is_marker_only, normalize_key, normalize_key_into, MIN_KEY_CHARS};
pub use sentences::BoundaryMatchers;

/// A paragraph or sentence extracted from analysis text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub granularity: Granularity,
    /// Exact, whitespace-trimmed text
    pub literal: String,
    /// Normalization key the segment is indexed under
    pub key: String,
    /// Position among the document's segments of this granularity
    pub occurrence_index: usize,
}

/// Splits analysis text into indexable segments
#[derive(Debug, Clone)]
pub struct Segmenter {
    matchers: BoundaryMatchers,
}

impl Segmenter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            matchers: BoundaryMatchers::new()?,
        })
    }

    pub fn matchers(&self) -> &BoundaryMatchers {
        &self.matchers
    }

    pub fn paragraphs<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.matchers.split_paragraphs(text)
    }

    /// Sentences in document order. Paragraph breaks always end a sentence.
    pub fn sentences(&self, text: &str) -> Vec<String> {
        self.paragraphs(text)
            .into_iter()
            .flat_map(|paragraph| self.matchers.split_sentences(paragraph))
            .collect()
    }

    /// Indexable segments of one granularity; noise and marker-only
    /// segments are skipped but still advance `occurrence_index`.
    ///
    /// File granularity has no segments: whole documents are keyed by
    /// content hash in the index.
    pub fn segments(&self, text: &str, granularity: Granularity) -> Vec<Segment> {
        let literals: Vec<String> = match granularity {
            Granularity::File => return Vec::new(),
            Granularity::Paragraph => self.paragraphs(text).into_iter().map(str::to_string).collect(),
            Granularity::Sentence => self.sentences(text),
        };

        literals
            .into_iter()
            .enumerate()
            .filter_map(|(occurrence_index, literal)| {
                index_key(&literal).map(|key| Segment {
                    granularity,
                    literal,
                    key,
                    occurrence_index,
                })
            })
            .collect()
    }
}
