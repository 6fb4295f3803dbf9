use std::io;
use std::path::Path;
use thiserror::Error;

/// Terminal pipeline failures. The display text is what ends up in the job
/// record and in the failure callback.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source not found: {0}")]
    SourceNotFound(String),
    #[error("download failed: {0}")]
    DownloadFailure(String),
    #[error("frame extraction failed: {0}")]
    ExtractionFailure(String),
    #[error("no frames generated")]
    EmptyResult,
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("sprite composition failed: {0}")]
    Compose(String),
}

impl PipelineError {
    pub fn io(context: impl AsRef<str>, path: &Path, source: io::Error) -> Self {
        Self::Io {
            context: format!("{} {}", context.as_ref(), path.display()),
            source,
        }
    }
}

/// Cuts tool diagnostics down to `limit` characters, respecting char
/// boundaries.
pub fn truncate_diagnostic(text: &str, limit: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
