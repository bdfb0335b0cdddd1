//! Run orchestration.
//!
//! One run is: mirror the input, discover documents, analyse each one under
//! the guard, merge analyses into a fresh [`CorpusIndex`], resolve, delete
//! whole-file duplicates, then redact each remaining document under the
//! guard and write it back once.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::discovery::{discover_documents, DiscoveryConfig, Document};
use crate::error::DedupError;
use crate::events::{DeleteReason, DocumentEvent, Phase, RunSummary, SkipReason};
use crate::guard::{run_blocking, ExecutionGuard};
use crate::index::{CorpusIndex, DocId, DocumentAnalysis};
use crate::mirror::{mirror_tree, resolve_path};
use crate::reader::read_document;
use crate::redactor::{redact_document, write_atomically, Redaction};
use crate::resolver::{resolve, ResolutionPlan};
use crate::segmenter::Segmenter;

pub struct Engine {
    config: EngineConfig,
    segmenter: Arc<Segmenter>,
    guard: ExecutionGuard,
    discovery: DiscoveryConfig,
}

impl Engine {
    /// Validate `config` and compile the boundary matchers
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let discovery = DiscoveryConfig {
            exclude: config.exclude_patterns()?,
        };
        let segmenter = Segmenter::new().context("Failed to compile boundary matchers")?;
        Ok(Self {
            guard: ExecutionGuard::new(config.document_timeout),
            segmenter: Arc::new(segmenter),
            discovery,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolved `(input, output)` roots; fails before anything is touched
    fn check_paths(&self) -> Result<(PathBuf, PathBuf), DedupError> {
        let input = &self.config.input_dir;
        if !input.exists() {
            return Err(DedupError::InputNotFound(input.clone()));
        }
        if !input.is_dir() {
            return Err(DedupError::InputNotDirectory(input.clone()));
        }

        let input = resolve_path(input);
        let output = resolve_path(&self.config.output_dir);
        if input.starts_with(&output) {
            return Err(DedupError::OutputOverlapsInput { input, output });
        }
        Ok((input, output))
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let start_time = Instant::now();
        let run_start = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let mut summary = RunSummary::new(run_start);

        let (input, output) = self.check_paths()?;
        info!(input = %input.display(), output = %output.display(), "Starting cleanup");

        let mirror_output = output.clone();
        let report = tokio::task::spawn_blocking(move || mirror_tree(&input, &mirror_output))
            .await
            .context("Mirror task failed")??;
        for document in report.copied {
            summary.record(DocumentEvent::Copied { document });
        }
        for failure in report.failures.into_iter().filter(|f| f.eligible) {
            summary.record(DocumentEvent::Skipped {
                document: failure.relative,
                reason: SkipReason::IoError,
                phase: Phase::Copy,
                detail: failure.message,
            });
        }

        let discovery = self.discovery.clone();
        let discovery_root = output.clone();
        let documents = tokio::task::spawn_blocking(move || discover_documents(&discovery_root, &discovery))
            .await
            .context("Discovery task failed")?;
        summary.documents_found = documents.len();
        info!("Found {} files to process", documents.len());

        let index = self.build_index(&documents, &mut summary).await?;
        let plan = resolve(&index, &self.config.checks);

        self.delete_duplicates(&documents, &plan, &mut summary).await;
        self.redact_documents(&documents, &index, &plan, &mut summary).await?;

        summary.total_processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            processed = summary.documents_found,
            redacted = summary.documents_redacted,
            deleted = summary.documents_deleted,
            skipped = summary.documents_skipped,
            markers = summary.markers_inserted,
            elapsed_ms = summary.total_processing_time_ms,
            "Cleanup completed"
        );
        Ok(summary)
    }

    async fn analyze(&self, id: DocId, document: &Document) -> Result<DocumentAnalysis, DedupError> {
        let segmenter = Arc::clone(&self.segmenter);
        let checks = self.config.checks;
        self.guard
            .run(&document.relative, |deadline| async move {
                let text = read_document(&document.path, &document.relative).await?;
                run_blocking(deadline, move |deadline| {
                    DocumentAnalysis::analyze(id, &text.text, text.lossy, &checks, &segmenter, deadline)
                })
                .await
            })
            .await
    }

    async fn build_index(&self, documents: &[Document], summary: &mut RunSummary) -> Result<CorpusIndex> {
        let mut index = CorpusIndex::new();
        for (id, document) in documents.iter().enumerate() {
            match self.analyze(id, document).await {
                Ok(analysis) => index.merge(analysis),
                Err(e) => record_failure(summary, &document.relative, Phase::Index, e)?,
            }
        }
        debug!(documents = index.document_count(), "Corpus index complete");
        Ok(index)
    }

    async fn delete_duplicates(&self, documents: &[Document], plan: &ResolutionPlan, summary: &mut RunSummary) {
        for deletion in &plan.deletions {
            let document = &documents[deletion.document];
            let leader = &documents[deletion.leader];
            match tokio::fs::remove_file(&document.path).await {
                Ok(()) => summary.record(DocumentEvent::Deleted {
                    document: document.relative.clone(),
                    reason: DeleteReason::DuplicateFile,
                    leader: leader.relative.clone(),
                }),
                Err(e) => summary.record(DocumentEvent::Skipped {
                    document: document.relative.clone(),
                    reason: SkipReason::IoError,
                    phase: Phase::Redact,
                    detail: e.to_string(),
                }),
            }
        }
    }

    async fn redact(&self, document: &Document, plan: &ResolutionPlan, id: DocId) -> Result<Redaction, DedupError> {
        let targets = plan.targets(id).to_vec();
        self.guard
            .run(&document.relative, |deadline| async move {
                let text = read_document(&document.path, &document.relative).await?;
                if text.lossy {
                    return Err(DedupError::DocumentDecode {
                        document: document.relative.clone(),
                    });
                }
                let relative = document.relative.clone();
                run_blocking(deadline, move |deadline| {
                    redact_document(&relative, &text.text, &targets, deadline)
                })
                .await
            })
            .await
    }

    async fn redact_documents(
        &self,
        documents: &[Document],
        index: &CorpusIndex,
        plan: &ResolutionPlan,
        summary: &mut RunSummary,
    ) -> Result<()> {
        for (&id, targets) in &plan.redactions {
            if targets.is_empty() || plan.is_deleted(id) {
                continue;
            }
            let document = &documents[id];

            if index.is_lossy(id) {
                let error = DedupError::DocumentDecode {
                    document: document.relative.clone(),
                };
                record_failure(summary, &document.relative, Phase::Redact, error)?;
                continue;
            }

            // The write happens only after the guard has returned.
            let outcome = match self.redact(document, plan, id).await {
                Ok(redaction) if redaction.is_changed() => {
                    write_atomically(&document.relative, &document.path, redaction.content.as_bytes())
                        .await
                        .map(|()| Some(redaction.markers))
                }
                Ok(_) => Ok(None),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(Some(count)) => summary.record(DocumentEvent::Redacted {
                    document: document.relative.clone(),
                    count,
                }),
                Ok(None) => debug!(document = %document.relative, "No matches left to redact"),
                Err(e) => record_failure(summary, &document.relative, Phase::Redact, e)?,
            }
        }
        Ok(())
    }
}

/// Turn a per-document error into a skip event; fatal errors propagate
fn record_failure(summary: &mut RunSummary, document: &str, phase: Phase, error: DedupError) -> Result<()> {
    match error.skip_reason() {
        Some(reason) => {
            summary.record(DocumentEvent::Skipped {
                document: document.to_string(),
                reason,
                phase,
                detail: error.to_string(),
            });
            Ok(())
        }
        None => Err(error.into()),
    }
}
