pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod events;
pub mod frontmatter;
pub mod guard;
pub mod index;
pub mod mirror;
pub mod reader;
pub mod redactor;
pub mod resolver;
pub mod segmenter;

// Re-export main types for convenient access
pub use config::{Checks, EngineConfig, Granularity};
pub use engine::Engine;
pub use error::DedupError;
pub use events::{DeleteReason, DocumentEvent, Phase, RunSummary, SkipReason};
pub use frontmatter::{split_frontmatter, strip_frontmatter};
pub use redactor::MARKER;

// Re-export the analysis pipeline for benchmarks and embedding
pub use index::{CorpusIndex, DocumentAnalysis};
pub use resolver::{resolve, ResolutionPlan, RedactionTarget};
pub use segmenter::{normalize_key, Segment, Segmenter};
