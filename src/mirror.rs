// Mirror of the input tree into the output location. Every file is copied
// verbatim; only eligible documents are reported back for processing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::discovery::{is_eligible, relative_key};

/// File that could not be copied
#[derive(Debug, Clone)]
pub struct CopyFailure {
    pub relative: String,
    pub eligible: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct MirrorReport {
    /// Eligible documents copied, relative to the output root
    pub copied: Vec<String>,
    /// Files of any kind copied
    pub files_copied: usize,
    pub failures: Vec<CopyFailure>,
}

/// Absolute form of `path`, resolving symlinks where the path exists
pub fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
        let parent = if parent.as_os_str().is_empty() { Path::new(".") } else { parent };
        if let Ok(canonical_parent) = parent.canonicalize() {
            return canonical_parent.join(name);
        }
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

fn copy_file(source: &Path, dest: &Path) -> std::io::Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)?;
    Ok(())
}

/// Replace `output` with a copy of `input`. Callers have already checked
/// that `input` does not live inside `output`.
pub fn mirror_tree(input: &Path, output: &Path) -> Result<MirrorReport> {
    let input = input
        .canonicalize()
        .with_context(|| format!("Failed to resolve input directory {}", input.display()))?;

    if output.exists() {
        info!("Removing existing output directory: {}", output.display());
        let removed = if output.is_dir() {
            fs::remove_dir_all(output)
        } else {
            fs::remove_file(output)
        };
        removed.with_context(|| format!("Failed to remove existing output {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    let output = output
        .canonicalize()
        .with_context(|| format!("Failed to resolve output directory {}", output.display()))?;

    let mut report = MirrorReport::default();
    let walker = WalkDir::new(&input)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.path() != output);

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error walking input tree: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = relative_key(&input, entry.path());
        let dest = output.join(entry.path().strip_prefix(&input).unwrap_or(entry.path()));
        let eligible = is_eligible(entry.path());

        match copy_file(entry.path(), &dest) {
            Ok(()) => {
                debug!("Copied {} to {}", entry.path().display(), dest.display());
                report.files_copied += 1;
                if eligible {
                    report.copied.push(relative);
                }
            }
            Err(e) => {
                warn!("Error copying file {}: {}", entry.path().display(), e);
                report.failures.push(CopyFailure {
                    relative,
                    eligible,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        "Mirrored {} files ({} documents) into {}",
        report.files_copied,
        report.copied.len(),
        output.display()
    );
    Ok(report)
}
