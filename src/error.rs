use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::events::SkipReason;

/// Errors raised by the dedup engine.
///
/// Configuration and input errors abort a run before any document is
/// touched. The `Document*` kinds are per-document and are turned into
/// skip events by the execution guard.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("input directory does not exist: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("input path is not a directory: {}", .0.display())]
    InputNotDirectory(PathBuf),
    #[error("output directory {} would overwrite input {}", .output.display(), .input.display())]
    OutputOverlapsInput { input: PathBuf, output: PathBuf },
    #[error("At least one type of check must be enabled")]
    AllChecksDisabled,
    #[error("invalid exclude pattern {pattern:?}: {message}")]
    InvalidExcludePattern { pattern: String, message: String },
    #[error("processing {document} exceeded the {timeout:?} deadline")]
    DocumentTimeout { document: String, timeout: Duration },
    #[error("i/o error on {document}: {source}")]
    DocumentIo {
        document: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{document} is not valid UTF-8 and cannot be rewritten safely")]
    DocumentDecode { document: String },
    #[error("literal pattern for {document} failed to compile: {message}")]
    LiteralPattern { document: String, message: String },
    #[error("worker for {document} failed: {message}")]
    WorkerFailed { document: String, message: String },
}

impl DedupError {
    pub fn io(document: impl Into<String>, source: std::io::Error) -> Self {
        Self::DocumentIo {
            document: document.into(),
            source,
        }
    }

    /// Skip reason for per-document errors, `None` for run-fatal ones.
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::DocumentTimeout { .. } => Some(SkipReason::Timeout),
            Self::DocumentIo { .. } => Some(SkipReason::IoError),
            Self::DocumentDecode { .. } => Some(SkipReason::DecodeError),
            Self::LiteralPattern { .. } | Self::WorkerFailed { .. } => {
                Some(SkipReason::WorkerFailed)
            }
            Self::InputNotFound(_)
            | Self::InputNotDirectory(_)
            | Self::OutputOverlapsInput { .. }
            | Self::AllChecksDisabled
            | Self::InvalidExcludePattern { .. } => None,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.skip_reason().is_none()
    }
}
