// Known documents with predictable duplicate structure

/// Exported note: a `Path:` line, a horizontal rule and a metadata block
pub const EXPORTED_NOTE: &str = "Path: /Documents/Export/slips/gramsci/Hegemony\n\n---\n\n---\ndate: 2024-03-21\ntags:\n  - \"#theory\"\n---\nHegemony is maintained through consent.\n\nThe common sense of an era is contested ground.";

/// Shares its second paragraph with `EXPORTED_NOTE`
pub const SECOND_NOTE: &str = "---\ntitle: Second note\n---\nA different opening paragraph here.\n\nThe common sense of an era is contested ground.";

/// Every sentence appears twice
pub const REPEATED_SENTENCES: &str = "This is a sentence. This is a sentence. Another line entirely.\n\nAnother line entirely.";

/// Literal containing every regex metacharacter
pub const METACHAR_LITERAL: &str = r"Cost is $5.00 (approx) + [tax] * {rate} | ^caret? \slash.";
