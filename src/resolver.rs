// Leader election over a finished corpus index.
//
// File groups resolve first; every later level only sees documents that
// survive deletion, so each duplicated segment keeps one copy somewhere.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info};

use crate::config::{Checks, Granularity};
use crate::index::{CorpusIndex, DocId, IndexEntry, Occurrence};

/// Whole-document duplicate scheduled for removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deletion {
    pub document: DocId,
    pub leader: DocId,
}

/// One literal to replace with the marker inside a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactionTarget {
    pub granularity: Granularity,
    pub literal: String,
    /// Leave the first match alone: set only for the leader literal in the
    /// leader document
    pub keep_first: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ResolutionPlan {
    pub deletions: Vec<Deletion>,
    pub redactions: BTreeMap<DocId, Vec<RedactionTarget>>,
}

impl ResolutionPlan {
    pub fn is_deleted(&self, document: DocId) -> bool {
        self.deletions.iter().any(|d| d.document == document)
    }

    pub fn targets(&self, document: DocId) -> &[RedactionTarget] {
        self.redactions.get(&document).map_or(&[], Vec::as_slice)
    }

    pub fn target_count(&self) -> usize {
        self.redactions.values().map(Vec::len).sum()
    }
}

/// Collects targets per document, applying each literal once
#[derive(Default)]
struct PlanBuilder {
    redactions: BTreeMap<DocId, Vec<RedactionTarget>>,
    seen: HashMap<(DocId, String), usize>,
}

impl PlanBuilder {
    fn push(&mut self, document: DocId, granularity: Granularity, literal: &str, keep_first: bool) {
        let targets = self.redactions.entry(document).or_default();
        match self.seen.get(&(document, literal.to_string())) {
            // A literal that leads anywhere keeps its first match.
            Some(&idx) => targets[idx].keep_first |= keep_first,
            None => {
                self.seen.insert((document, literal.to_string()), targets.len());
                targets.push(RedactionTarget {
                    granularity,
                    literal: literal.to_string(),
                    keep_first,
                });
            }
        }
    }

    fn add_group(&mut self, entry: &IndexEntry, deleted: &BTreeSet<DocId>) {
        let survivors: Vec<&Occurrence> = entry
            .occurrences
            .iter()
            .filter(|o| !deleted.contains(&o.document))
            .collect();

        let total: usize = survivors.iter().map(|o| o.count).sum();
        if total < 2 {
            return;
        }

        // Occurrences are stored in merge order, and min_by_key keeps the
        // first of equal elements, so ties go to the first one seen.
        let Some(leader) = survivors
            .iter()
            .min_by_key(|o| (o.document, o.first_position))
            .copied()
        else {
            return;
        };

        for occurrence in survivors {
            if std::ptr::eq(occurrence, leader) {
                if occurrence.count > 1 {
                    self.push(occurrence.document, entry.granularity, &occurrence.literal, true);
                }
            } else {
                self.push(occurrence.document, entry.granularity, &occurrence.literal, false);
            }
        }
    }
}

/// Build the deletion and redaction plan for a run
pub fn resolve(index: &CorpusIndex, checks: &Checks) -> ResolutionPlan {
    let mut deletions = Vec::new();
    let mut deleted = BTreeSet::new();

    if checks.files {
        for entry in index.file_entries() {
            let Some(&leader) = entry.documents.iter().min() else {
                continue;
            };
            for &document in &entry.documents {
                if document != leader && deleted.insert(document) {
                    deletions.push(Deletion { document, leader });
                }
            }
        }
    }
    deletions.sort_by_key(|d| d.document);

    let mut builder = PlanBuilder::default();
    for granularity in checks.segment_granularities() {
        let mut groups = 0usize;
        for entry in index.duplicate_groups(granularity) {
            builder.add_group(entry, &deleted);
            groups += 1;
        }
        debug!(granularity = %granularity, groups, "Resolved duplicate groups");
    }

    let plan = ResolutionPlan {
        deletions,
        redactions: builder.redactions,
    };
    info!(
        deletions = plan.deletions.len(),
        documents_with_targets = plan.redactions.len(),
        targets = plan.target_count(),
        "Built resolution plan"
    );
    plan
}
