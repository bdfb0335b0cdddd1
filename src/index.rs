// Corpus index: per granularity, normalization key -> ordered occurrences.
// Built once per run on the control task from per-document analyses, then
// handed to the resolver. Nothing here is global.

use std::collections::{BTreeMap, HashMap};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::{Checks, Granularity};
use crate::error::DedupError;
use crate::frontmatter::strip_frontmatter;
use crate::guard::Deadline;
use crate::segmenter::{Segment, Segmenter};

/// Position of a document in natural-sort order
pub type DocId = usize;

/// Everything the index needs from one document, computed under the guard
#[derive(Debug, Clone)]
pub struct DocumentAnalysis {
    pub document: DocId,
    /// SHA-256 of the trimmed analysis text, `None` for empty bodies or
    /// when file checks are off
    pub file_key: Option<String>,
    pub segments: BTreeMap<Granularity, Vec<Segment>>,
    /// Text was decoded lossily
    pub lossy: bool,
}

impl DocumentAnalysis {
    pub fn analyze(
        document: DocId,
        raw: &str,
        lossy: bool,
        checks: &Checks,
        segmenter: &Segmenter,
        deadline: &Deadline,
    ) -> Result<Self, DedupError> {
        let analysis_text = strip_frontmatter(raw);

        let file_key = if checks.files {
            content_key(analysis_text)
        } else {
            None
        };

        let mut segments = BTreeMap::new();
        for granularity in checks.segment_granularities() {
            deadline.check()?;
            segments.insert(granularity, segmenter.segments(analysis_text, granularity));
        }

        Ok(Self {
            document,
            file_key,
            segments,
            lossy,
        })
    }

    pub fn segment_count(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }
}

/// Hex SHA-256 of the trimmed text; empty content has no key
pub fn content_key(analysis_text: &str) -> Option<String> {
    let body = analysis_text.trim();
    if body.is_empty() {
        return None;
    }
    Some(hex::encode(Sha256::digest(body.as_bytes())))
}

/// One distinct literal of a key inside one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub document: DocId,
    pub literal: String,
    /// Repeats of this literal within the document
    pub count: usize,
    /// Position of the first repeat among the document's segments
    pub first_position: usize,
}

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub granularity: Granularity,
    pub key: String,
    pub occurrences: Vec<Occurrence>,
}

impl IndexEntry {
    pub fn total(&self) -> usize {
        self.occurrences.iter().map(|o| o.count).sum()
    }

    pub fn is_duplicate_group(&self) -> bool {
        self.total() >= 2
    }
}

/// Documents sharing a file-level content key
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub key: String,
    pub documents: Vec<DocId>,
}

#[derive(Debug, Default)]
struct GranularIndex {
    entries: Vec<IndexEntry>,
    by_key: HashMap<String, usize>,
}

impl GranularIndex {
    fn insert(&mut self, document: DocId, segment: &Segment) {
        let idx = match self.by_key.get(&segment.key) {
            Some(&idx) => idx,
            None => {
                let idx = self.entries.len();
                self.entries.push(IndexEntry {
                    granularity: segment.granularity,
                    key: segment.key.clone(),
                    occurrences: Vec::new(),
                });
                self.by_key.insert(segment.key.clone(), idx);
                idx
            }
        };

        let occurrences = &mut self.entries[idx].occurrences;
        // Merges happen one document at a time, so this document's
        // occurrences sit at the tail.
        let existing = occurrences
            .iter_mut()
            .rev()
            .take_while(|o| o.document == document)
            .find(|o| o.literal == segment.literal);
        match existing {
            Some(occurrence) => occurrence.count += 1,
            None => occurrences.push(Occurrence {
                document,
                literal: segment.literal.clone(),
                count: 1,
                first_position: segment.occurrence_index,
            }),
        }
    }
}

/// Index over the whole corpus for one run
#[derive(Debug, Default)]
pub struct CorpusIndex {
    files: Vec<FileEntry>,
    files_by_key: HashMap<String, usize>,
    segments: BTreeMap<Granularity, GranularIndex>,
    /// Documents whose text was decoded lossily
    lossy: Vec<DocId>,
    documents: usize,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one analysis into the index. Callers merge in natural order.
    pub fn merge(&mut self, analysis: DocumentAnalysis) {
        let document = analysis.document;
        let segment_count = analysis.segment_count();
        self.documents += 1;
        if analysis.lossy {
            self.lossy.push(document);
        }

        if let Some(key) = analysis.file_key {
            match self.files_by_key.get(&key) {
                Some(&idx) => self.files[idx].documents.push(document),
                None => {
                    self.files_by_key.insert(key.clone(), self.files.len());
                    self.files.push(FileEntry {
                        key,
                        documents: vec![document],
                    });
                }
            }
        }

        for (granularity, segments) in &analysis.segments {
            let index = self.segments.entry(*granularity).or_default();
            for segment in segments {
                index.insert(document, segment);
            }
        }

        debug!(document, segments = segment_count, "Merged document analysis");
    }

    pub fn document_count(&self) -> usize {
        self.documents
    }

    pub fn is_lossy(&self, document: DocId) -> bool {
        self.lossy.contains(&document)
    }

    /// File groups in first-seen order
    pub fn file_entries(&self) -> &[FileEntry] {
        &self.files
    }

    /// Entries of one granularity in first-seen order
    pub fn entries(&self, granularity: Granularity) -> &[IndexEntry] {
        self.segments
            .get(&granularity)
            .map_or(&[], |index| index.entries.as_slice())
    }

    pub fn entry(&self, granularity: Granularity, key: &str) -> Option<&IndexEntry> {
        let index = self.segments.get(&granularity)?;
        index.by_key.get(key).map(|&idx| &index.entries[idx])
    }

    pub fn duplicate_groups(&self, granularity: Granularity) -> impl Iterator<Item = &IndexEntry> {
        self.entries(granularity).iter().filter(|e| e.is_duplicate_group())
    }
}
