// Sentence and paragraph boundary detection backed by regex-automata.
// Boundaries are deliberately naive: `[.!?]` + whitespace + uppercase, so
// "Dr. Smith" splits after "Dr." just like any other sentence end.

use anyhow::Result;
use regex_automata::meta::Regex;
use tracing::debug;

/// Sentence end followed by whitespace and an uppercase letter
pub const SENTENCE_BOUNDARY_PATTERN: &str = r"[.!?]\s+\p{Lu}";
/// One or more blank (whitespace-only) lines
pub const PARAGRAPH_BREAK_PATTERN: &str = r"\n\s*\n";
/// Hyphen at the end of a line, with optional trailing/leading blanks
pub const HYPHEN_BREAK_PATTERN: &str = r"-[ \t]*\r?\n[ \t]*";

/// Compiled boundary automata, cheap to clone and share across workers
#[derive(Debug, Clone)]
pub struct BoundaryMatchers {
    sentence: Regex,
    paragraph: Regex,
    hyphen: Regex,
}

impl BoundaryMatchers {
    pub fn new() -> Result<Self> {
        debug!("Compiling boundary matchers");
        Ok(Self {
            sentence: Regex::new(SENTENCE_BOUNDARY_PATTERN)?,
            paragraph: Regex::new(PARAGRAPH_BREAK_PATTERN)?,
            hyphen: Regex::new(HYPHEN_BREAK_PATTERN)?,
        })
    }

    /// Trimmed, non-empty paragraphs in document order
    pub fn split_paragraphs<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut paragraphs = Vec::new();
        let mut start = 0;
        for m in self.paragraph.find_iter(text) {
            push_trimmed(&mut paragraphs, &text[start..m.start()]);
            start = m.end();
        }
        push_trimmed(&mut paragraphs, &text[start..]);
        paragraphs
    }

    /// Join `hyph-\nenated` words split across a line break
    pub fn join_hyphenated(&self, text: &str) -> String {
        let mut joined = String::with_capacity(text.len());
        let mut last = 0;
        for m in self.hyphen.find_iter(text) {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            let is_word = |c: Option<char>| c.is_some_and(char::is_alphanumeric);
            if is_word(before) && is_word(after) {
                joined.push_str(&text[last..m.start()]);
                last = m.end();
            }
        }
        joined.push_str(&text[last..]);
        joined
    }

    /// Trimmed, non-empty sentences of a single block of text.
    /// Hyphen-broken words are joined first, so sentences are owned.
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let joined = self.join_hyphenated(text);
        let mut sentences = Vec::new();
        let mut start = 0;
        for m in self.sentence.find_iter(&joined) {
            // Punctuation is a single ASCII byte at the match start; the
            // next sentence begins at the uppercase letter ending the match.
            let end = m.start() + 1;
            let upper_len = joined[..m.end()]
                .chars()
                .next_back()
                .map_or(0, char::len_utf8);
            push_trimmed_owned(&mut sentences, &joined[start..end]);
            start = m.end() - upper_len;
        }
        push_trimmed_owned(&mut sentences, &joined[start..]);
        sentences
    }
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, block: &'a str) {
    let trimmed = block.trim();
    if !trimmed.is_empty() {
        out.push(trimmed);
    }
}

fn push_trimmed_owned(out: &mut Vec<String>, block: &str) {
    let trimmed = block.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}
