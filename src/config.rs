use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DedupError;

/// Granularity at which duplicates are detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    File,
    Paragraph,
    Sentence,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::File => "file",
            Granularity::Paragraph => "paragraph",
            Granularity::Sentence => "sentence",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which checks are enabled for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checks {
    pub files: bool,
    pub paragraphs: bool,
    pub sentences: bool,
}

impl Default for Checks {
    fn default() -> Self {
        Self {
            files: true,
            paragraphs: true,
            sentences: true,
        }
    }
}

impl Checks {
    pub fn any(&self) -> bool {
        self.files || self.paragraphs || self.sentences
    }

    pub fn is_enabled(&self, granularity: Granularity) -> bool {
        match granularity {
            Granularity::File => self.files,
            Granularity::Paragraph => self.paragraphs,
            Granularity::Sentence => self.sentences,
        }
    }

    /// Enabled segment granularities in redaction order (paragraphs first)
    pub fn segment_granularities(&self) -> Vec<Granularity> {
        [Granularity::Paragraph, Granularity::Sentence]
            .into_iter()
            .filter(|g| self.is_enabled(*g))
            .collect()
    }
}

/// Configuration for a dedup run
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tree to read documents from
    pub input_dir: PathBuf,
    /// Mirror tree that receives copies and rewrites
    pub output_dir: PathBuf,
    pub checks: Checks,
    /// Wall-clock budget for each guarded per-document step
    pub document_timeout: Duration,
    /// Glob patterns (relative to the output root) of documents to leave alone
    pub exclude: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("cleanup_output"),
            checks: Checks::default(),
            document_timeout: Duration::from_secs(30),
            exclude: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Reject configurations that cannot produce a meaningful run.
    /// Runs before any filesystem access.
    pub fn validate(&self) -> Result<(), DedupError> {
        if !self.checks.any() {
            return Err(DedupError::AllChecksDisabled);
        }
        self.exclude_patterns()?;
        Ok(())
    }

    pub fn exclude_patterns(&self) -> Result<Vec<glob::Pattern>, DedupError> {
        self.exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern).map_err(|e| DedupError::InvalidExcludePattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })
            })
            .collect()
    }
}
