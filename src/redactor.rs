//! In-place duplicate redaction.
//!
//! A document's targets are applied in plan order to one in-memory copy of
//! its body. Each literal is compiled as an escaped pattern and all of its
//! matches are located on a snapshot first. Only then are the matches past
//! the cutoff replaced, so the count of kept occurrences never depends on
//! replacement side effects.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::DedupError;
use crate::frontmatter::split_frontmatter;
use crate::guard::Deadline;
use crate::resolver::RedactionTarget;

/// Text substituted for every redacted occurrence
pub const MARKER: &str = "{del}";

/// Upper bound on the compiled size of a single literal pattern
const LITERAL_SIZE_LIMIT: usize = 64 * (1 << 20);

/// Rewritten content of one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redaction {
    /// Full document: original head bytes plus the rewritten body
    pub content: String,
    /// Markers inserted
    pub markers: usize,
}

impl Redaction {
    pub fn is_changed(&self) -> bool {
        self.markers > 0
    }
}

fn compile_literal(document: &str, literal: &str) -> Result<Regex, DedupError> {
    RegexBuilder::new(&regex::escape(literal))
        .size_limit(LITERAL_SIZE_LIMIT)
        .build()
        .map_err(|e| DedupError::LiteralPattern {
            document: document.to_string(),
            message: e.to_string(),
        })
}

/// A match may not start or end in the middle of a word
fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let matched = &text[start..end];
    let starts_word = matched.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = matched.chars().next_back().is_some_and(char::is_alphanumeric);

    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    let clear_before = !starts_word || !before.is_some_and(char::is_alphanumeric);
    let clear_after = !ends_word || !after.is_some_and(char::is_alphanumeric);
    clear_before && clear_after
}

/// Replace matches of one target in `body`, returning the markers inserted
fn apply_target(
    document: &str,
    body: &mut String,
    target: &RedactionTarget,
) -> Result<usize, DedupError> {
    let pattern = compile_literal(document, &target.literal)?;

    let spans: Vec<(usize, usize)> = pattern
        .find_iter(body)
        .map(|m| (m.start(), m.end()))
        .filter(|&(start, end)| on_word_boundary(body, start, end))
        .collect();

    let cutoff = usize::from(target.keep_first);
    if spans.len() <= cutoff {
        return Ok(0);
    }

    let mut rewritten = String::with_capacity(body.len());
    let mut last = 0;
    let mut markers = 0;
    for &(start, end) in &spans[cutoff..] {
        rewritten.push_str(&body[last..start]);
        rewritten.push_str(MARKER);
        last = end;
        markers += 1;
    }
    rewritten.push_str(&body[last..]);
    *body = rewritten;
    Ok(markers)
}

/// Apply every target to `raw`, leaving the frontmatter head untouched.
/// The deadline is checked before each target.
pub fn redact_document(
    document: &str,
    raw: &str,
    targets: &[RedactionTarget],
    deadline: &Deadline,
) -> Result<Redaction, DedupError> {
    let (head, body) = split_frontmatter(raw);
    let mut body = body.to_string();
    let mut markers = 0;

    for target in targets {
        deadline.check()?;
        let inserted = apply_target(document, &mut body, target)?;
        if inserted > 0 {
            debug!(document, granularity = %target.granularity, inserted, "Applied redaction target");
        }
        markers += inserted;
    }

    let mut content = String::with_capacity(head.len() + body.len());
    content.push_str(head);
    content.push_str(&body);
    Ok(Redaction { content, markers })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.dejatext.tmp"))
}

/// Replace `path` with `content` via a sibling temp file and a rename
pub async fn write_atomically(document: &str, path: &Path, content: &[u8]) -> Result<(), DedupError> {
    let temp = temp_sibling(path);
    if let Err(e) = tokio::fs::write(&temp, content).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(DedupError::io(document, e));
    }
    if let Err(e) = tokio::fs::rename(&temp, path).await {
        let _ = tokio::fs::remove_file(&temp).await;
        return Err(DedupError::io(document, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Granularity;
    use std::time::Duration;
    use tempfile::TempDir;

    fn target(literal: &str, keep_first: bool) -> RedactionTarget {
        RedactionTarget {
            granularity: Granularity::Sentence,
            literal: literal.to_string(),
            keep_first,
        }
    }

    fn deadline() -> Deadline {
        Deadline::new("test.md", Duration::from_secs(5))
    }

    #[test]
    fn test_keep_first_replaces_repeats() {
        let raw = "This is a sentence. This is a sentence. This is a sentence.";
        let result = redact_document("a.md", raw, &[target("This is a sentence.", true)], &deadline()).unwrap();
        assert_eq!(result.content, "This is a sentence. {del} {del}");
        assert_eq!(result.markers, 2);
    }

    #[test]
    fn test_non_leader_replaces_all() {
        let raw = "Shared text here.\n\nOther text.";
        let result = redact_document("b.md", raw, &[target("Shared text here.", false)], &deadline()).unwrap();
        assert_eq!(result.content, "{del}\n\nOther text.");
        assert!(result.is_changed());
    }

    #[test]
    fn test_frontmatter_head_preserved() {
        let raw = "---\ntitle: Shared text here.\n---\nShared text here.";
        let result = redact_document("b.md", raw, &[target("Shared text here.", false)], &deadline()).unwrap();
        assert_eq!(result.content, "---\ntitle: Shared text here.\n---\n{del}");
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let literal = r"Price is $5.00 (approx) [see *notes*] a|b ^ok? {x} \n+";
        let raw = format!("{literal} Other.\n\nPrice is $5X00 (approx) [see *notes*] a|b ^ok? {{x}} \\n+");
        let result = redact_document("a.md", &raw, &[target(literal, false)], &deadline()).unwrap();
        assert_eq!(result.markers, 1);
        assert!(result.content.starts_with("{del} Other."));
        assert!(result.content.contains("$5X00"));
    }

    #[test]
    fn test_partial_words_untouched() {
        let raw = "Eyes. His eyes. Eyes.";
        let result = redact_document("a.md", raw, &[target("Eyes.", true)], &deadline()).unwrap();
        assert_eq!(result.content, "Eyes. His eyes. {del}");

        let raw = "ReEyes. Eyes.";
        let result = redact_document("a.md", raw, &[target("Eyes.", false)], &deadline()).unwrap();
        assert_eq!(result.content, "ReEyes. {del}");
    }

    #[test]
    fn test_no_match_leaves_content() {
        let raw = "Nothing to see.";
        let result = redact_document("a.md", raw, &[target("Missing literal.", false)], &deadline()).unwrap();
        assert_eq!(result.content, raw);
        assert!(!result.is_changed());
    }

    #[test]
    fn test_targets_applied_in_order() {
        let raw = "Alpha one two. Beta three four.\n\nAlpha one two. Beta three four.";
        let targets = [
            RedactionTarget {
                granularity: Granularity::Paragraph,
                literal: "Alpha one two. Beta three four.".to_string(),
                keep_first: true,
            },
            target("Alpha one two.", true),
        ];
        let result = redact_document("a.md", raw, &targets, &deadline()).unwrap();
        assert_eq!(result.content, "Alpha one two. Beta three four.\n\n{del}");
        assert_eq!(result.markers, 1);
    }

    #[test]
    fn test_expired_deadline_stops_redaction() {
        let expired = Deadline::new("a.md", Duration::ZERO);
        let result = redact_document("a.md", "Text here.", &[target("Text here.", false)], &expired);
        assert!(matches!(result, Err(DedupError::DocumentTimeout { .. })));
    }

    #[tokio::test]
    async fn test_write_atomically_replaces_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("doc.md");
        std::fs::write(&path, "old").unwrap();

        write_atomically("doc.md", &path, b"new content").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new content");
        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[tokio::test]
    async fn test_write_atomically_missing_dir_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing/doc.md");
        let result = write_atomically("missing/doc.md", &path, b"x").await;
        assert!(matches!(result, Err(DedupError::DocumentIo { .. })));
    }
}
