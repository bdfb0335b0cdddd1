use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Why a document was left with its copied content
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    Timeout,
    IoError,
    DecodeError,
    WorkerFailed,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DeleteReason {
    DuplicateFile,
}

/// Pass in which a per-document event was raised
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Copy,
    Index,
    Redact,
}

/// Structured per-document event, consumed by loggers and report writers
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum DocumentEvent {
    Copied {
        document: String,
    },
    Redacted {
        document: String,
        count: usize,
    },
    Deleted {
        document: String,
        reason: DeleteReason,
        /// Document kept in place of this one
        leader: String,
    },
    Skipped {
        document: String,
        reason: SkipReason,
        phase: Phase,
        detail: String,
    },
}

impl DocumentEvent {
    pub fn document(&self) -> &str {
        match self {
            DocumentEvent::Copied { document }
            | DocumentEvent::Redacted { document, .. }
            | DocumentEvent::Deleted { document, .. }
            | DocumentEvent::Skipped { document, .. } => document,
        }
    }

    fn log(&self) {
        match self {
            DocumentEvent::Copied { document } => {
                tracing::debug!(document = %document, event = "copied", "Copied document");
            }
            DocumentEvent::Redacted { document, count } => {
                info!(document = %document, event = "redacted", count, "Updated file with redacted duplicates");
            }
            DocumentEvent::Deleted { document, leader, .. } => {
                info!(document = %document, event = "deleted", leader = %leader, "Deleted duplicate file");
            }
            DocumentEvent::Skipped { document, reason, phase, detail } => {
                warn!(document = %document, event = "skipped", ?reason, ?phase, detail = %detail, "Skipped document");
            }
        }
    }
}

/// Aggregate result of a run, serialised for `--stats-out`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunSummary {
    /// Unix timestamp (seconds) at which the run started
    pub run_start: u64,
    pub total_processing_time_ms: u64,
    pub documents_found: usize,
    pub documents_copied: usize,
    pub documents_redacted: usize,
    pub documents_deleted: usize,
    pub documents_skipped: usize,
    pub markers_inserted: usize,
    pub events: Vec<DocumentEvent>,
}

impl RunSummary {
    pub fn new(run_start: u64) -> Self {
        Self {
            run_start,
            ..Default::default()
        }
    }

    /// Record an event, log it and update the counters
    pub fn record(&mut self, event: DocumentEvent) {
        event.log();
        match &event {
            DocumentEvent::Copied { .. } => self.documents_copied += 1,
            DocumentEvent::Redacted { count, .. } => {
                self.documents_redacted += 1;
                self.markers_inserted += count;
            }
            DocumentEvent::Deleted { .. } => self.documents_deleted += 1,
            DocumentEvent::Skipped { .. } => {}
        }
        self.events.push(event);
        self.documents_skipped = self.skipped_documents().len();
    }

    /// Distinct documents with at least one skip event
    pub fn skipped_documents(&self) -> BTreeSet<&str> {
        self.events
            .iter()
            .filter(|e| matches!(e, DocumentEvent::Skipped { .. }))
            .map(DocumentEvent::document)
            .collect()
    }

    pub fn deleted_documents(&self) -> BTreeSet<&str> {
        self.events
            .iter()
            .filter(|e| matches!(e, DocumentEvent::Deleted { .. }))
            .map(DocumentEvent::document)
            .collect()
    }

    /// One-line human summary printed by the CLI
    pub fn summary_line(&self) -> String {
        format!(
            "Cleanup completed: {} processed, {} redacted, {} deleted, {} skipped",
            self.documents_found,
            self.documents_redacted,
            self.documents_deleted,
            self.documents_skipped
        )
    }

    pub async fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        info!("Wrote run stats to {}", path.display());
        Ok(())
    }
}
