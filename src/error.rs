use std::path::PathBuf;

/// Reasons a single document is skipped. None of these abort the run.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// The extraction collaborator could not read the PDF.
    #[error("extraction failed for {path:?}: {message}")]
    Extraction { path: PathBuf, message: String },

    /// No date could be found in the file name or the text.
    #[error("could not determine the date of {path:?}")]
    Undated { path: PathBuf },

    /// The corpus file could not be written.
    #[error("failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The worker processing the document panicked or was cancelled.
    #[error("worker for {path:?} failed: {message}")]
    Worker { path: PathBuf, message: String },
}

impl DocumentError {
    /// Short label used in the run summary
    pub fn kind(&self) -> &'static str {
        match self {
            DocumentError::Extraction { .. } => "extraction",
            DocumentError::Undated { .. } => "undated",
            DocumentError::Write { .. } => "write",
            DocumentError::Worker { .. } => "worker",
        }
    }
}
