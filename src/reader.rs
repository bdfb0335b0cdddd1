use std::path::Path;

use tracing::{debug, warn};

use crate::error::DedupError;

/// Decoded document text plus read statistics
#[derive(Debug, Clone)]
pub struct DocumentText {
    pub text: String,
    /// Invalid UTF-8 was replaced with U+FFFD while decoding
    pub lossy: bool,
    pub bytes_read: u64,
    pub duration_ms: u64,
}

/// Decode bytes as UTF-8, falling back to lossy decoding
pub fn decode(document: &str, bytes: Vec<u8>) -> (String, bool) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, false),
        Err(e) => {
            // WHY: keep indexing the readable parts; rewrites are refused later
            warn!(document, valid_up_to = e.utf8_error().valid_up_to(), "Document is not valid UTF-8, decoding lossily");
            (String::from_utf8_lossy(e.as_bytes()).into_owned(), true)
        }
    }
}

/// Read a whole document from disk
pub async fn read_document(path: &Path, document: &str) -> Result<DocumentText, DedupError> {
    let start_time = std::time::Instant::now();
    debug!("Starting async read of file: {}", path.display());

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DedupError::io(document, e))?;
    let bytes_read = bytes.len() as u64;
    let (text, lossy) = decode(document, bytes);

    let duration_ms = start_time.elapsed().as_millis() as u64;
    debug!(document, bytes_read, duration_ms, lossy, "Read document");

    Ok(DocumentText {
        text,
        lossy,
        bytes_read,
        duration_ms,
    })
}
