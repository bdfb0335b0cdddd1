//! Leading metadata block detection.
//!
//! Exporters prepend YAML-style blocks fenced by `---` lines, sometimes
//! more than one, sometimes after a single `Path: ...` line. Only the
//! analysis text loses those blocks; the on-disk copy is never changed
//! here. Callers split `raw` at [`body_offset`] so the head bytes can be
//! re-attached verbatim after a rewrite.

const FENCE: &str = "---";

/// Line of text with its byte offset in the source
#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    start: usize,
    /// Content without the line terminator
    content: &'a str,
}

impl<'a> Line<'a> {
    fn is_fence(&self) -> bool {
        self.content.trim_end() == FENCE
    }

    fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;
    for raw in text.split_inclusive('\n') {
        let content = raw.strip_suffix('\n').unwrap_or(raw);
        let content = content.strip_suffix('\r').unwrap_or(content);
        lines.push(Line { start, content });
        start += raw.len();
    }
    lines
}

/// Whether a line may appear inside a metadata block
fn is_metadata_line(line: &str) -> bool {
    let line = line.trim_end();
    if line.is_empty() || line.starts_with('#') {
        return true;
    }
    if line.starts_with(' ') || line.starts_with('\t') {
        return true;
    }
    if line == "-" || line.starts_with("- ") {
        return true;
    }
    match line.split_once(':') {
        Some((key, rest)) => {
            !key.is_empty() && (rest.is_empty() || rest.starts_with(char::is_whitespace))
        }
        None => false,
    }
}

/// Index of the closing fence for a block opened at `open`, if the block is
/// terminated and holds only metadata-like lines.
fn closing_fence(lines: &[Line<'_>], open: usize) -> Option<usize> {
    if !lines.get(open)?.is_fence() {
        return None;
    }
    for (idx, line) in lines.iter().enumerate().skip(open + 1) {
        if line.is_fence() {
            return Some(idx);
        }
        if !is_metadata_line(line.content) {
            return None;
        }
    }
    None
}

fn skip_blank(lines: &[Line<'_>], mut idx: usize) -> usize {
    while idx < lines.len() && lines[idx].is_blank() {
        idx += 1;
    }
    idx
}

/// Consume one block starting at `idx` (after blank lines). Returns the line
/// index right after its closing fence.
fn consume_block(lines: &[Line<'_>], idx: usize) -> Option<usize> {
    let open = skip_blank(lines, idx);
    let close = closing_fence(lines, open)?;

    // `---\n\n---\nkey: value\n---` is a rule followed by the real block:
    // an empty block whose closing fence opens another valid block.
    let is_empty = |from: usize, to: usize| lines[from + 1..to].iter().all(Line::is_blank);
    if is_empty(open, close) {
        if let Some(real_close) = closing_fence(lines, close) {
            if !is_empty(close, real_close) {
                return Some(real_close + 1);
            }
        }
    }
    Some(close + 1)
}

/// Byte offset where the document body starts; 0 when there is no
/// recognisable leading metadata block.
pub fn body_offset(text: &str) -> usize {
    let lines = split_lines(text);
    if lines.is_empty() {
        return 0;
    }

    let first = lines[0];
    let mut cursor = if !first.is_fence() && !first.is_blank() {
        // A single leading line is dropped only together with a block.
        match consume_block(&lines, 1) {
            Some(next) => next,
            None => return 0,
        }
    } else {
        match consume_block(&lines, 0) {
            Some(next) => next,
            None => return 0,
        }
    };

    while let Some(next) = consume_block(&lines, cursor) {
        cursor = next;
    }

    lines.get(cursor).map_or(text.len(), |line| line.start)
}

/// Split `text` into `(frontmatter, body)` with `frontmatter + body == text`
pub fn split_frontmatter(text: &str) -> (&str, &str) {
    text.split_at(body_offset(text))
}

/// Text used for duplicate analysis
pub fn strip_frontmatter(text: &str) -> &str {
    &text[body_offset(text)..]
}
