use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extensions of documents that take part in analysis (case-sensitive)
pub const ELIGIBLE_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Configuration for document discovery
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Documents whose relative path matches any of these are left alone
    pub exclude: Vec<glob::Pattern>,
}

/// Eligible document inside the output tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    /// Path relative to the tree root, `/`-separated
    pub relative: String,
}

pub fn is_eligible(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ELIGIBLE_EXTENSIONS.contains(&ext))
}

/// `/`-separated form of `path` relative to `root`
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Chunk {
    Text(String),
    /// Digit run with leading zeros stripped
    Number(String),
}

impl Ord for Chunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Chunk::Text(a), Chunk::Text(b)) => a.cmp(b),
            (Chunk::Number(a), Chunk::Number(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(b)),
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Less,
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Chunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sort key where digit runs compare numerically: `file2` < `file10`.
/// Always starts with a (possibly empty) text chunk, so text and number
/// chunks line up position by position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Chunk>);

impl NaturalKey {
    pub fn new(s: &str) -> Self {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut in_digits = false;

        for ch in s.chars() {
            let is_digit = ch.is_ascii_digit();
            if is_digit != in_digits {
                chunks.push(Self::chunk(std::mem::take(&mut current), in_digits));
                in_digits = is_digit;
            }
            current.push(ch);
        }
        chunks.push(Self::chunk(current, in_digits));
        Self(chunks)
    }

    fn chunk(raw: String, digits: bool) -> Chunk {
        if digits {
            let stripped = raw.trim_start_matches('0');
            Chunk::Number(stripped.to_string())
        } else {
            Chunk::Text(raw.to_lowercase())
        }
    }
}

/// Stable natural sort; equal keys keep their input order
pub fn natural_sort(documents: &mut [Document]) {
    documents.sort_by_cached_key(|d| NaturalKey::new(&d.relative));
}

/// Walk `root` and return eligible documents in natural-sort order.
/// Unreadable directory entries are logged and skipped.
pub fn discover_documents(root: &Path, config: &DiscoveryConfig) -> Vec<Document> {
    let discovery_start = std::time::Instant::now();
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry during discovery: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_eligible(entry.path()) {
            continue;
        }

        let relative = relative_key(root, entry.path());
        if config.exclude.iter().any(|pattern| pattern.matches(&relative)) {
            debug!(document = %relative, "Excluded by pattern");
            continue;
        }
        documents.push(Document {
            path: entry.path().to_path_buf(),
            relative,
        });
    }

    natural_sort(&mut documents);
    info!(
        "Discovery completed in {}ms, found {} documents",
        discovery_start.elapsed().as_millis(),
        documents.len()
    );
    documents
}
