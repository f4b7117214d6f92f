use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

use crate::models::{RawPages, page_from_text};

const FORM_FEED: char = '\u{c}';

/// Extraction collaborator: turns one input file into pages of raw lines
pub trait PageSource: Send + Sync {
    fn extract_pages(&self, path: &Path) -> Result<RawPages>;
}

/// Extracts text with poppler's `pdftotext`, one page per form feed.
/// Pre-extracted `.txt` files (same form-feed layout) are read directly.
#[derive(Debug, Clone)]
pub struct PdftotextSource {
    program: PathBuf,
}

impl PdftotextSource {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("pdftotext"),
        }
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PdftotextSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for PdftotextSource {
    fn extract_pages(&self, path: &Path) -> Result<RawPages> {
        let is_text = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
        if is_text {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read file: {:?}", path))?;
            return Ok(pages_from_text(&content));
        }

        let output = Command::new(&self.program)
            .arg("-enc")
            .arg("UTF-8")
            .arg(path)
            .arg("-")
            .output()
            .with_context(|| format!("failed to invoke {:?} on {:?}", self.program, path))?;

        if !output.status.success() {
            bail!(
                "pdftotext failed with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let pages = pages_from_text(&text);
        debug!("Extracted {} page(s) from {:?}", pages.len(), path);
        Ok(pages)
    }
}

/// Split extracted text into pages on form feeds
pub fn pages_from_text(text: &str) -> RawPages {
    let mut chunks: Vec<&str> = text.split(FORM_FEED).collect();

    // pdftotext terminates every page, including the last, with a form feed
    if chunks.len() > 1 && chunks.last().is_some_and(|c| c.trim().is_empty()) {
        chunks.pop();
    }

    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| page_from_text(chunk, i as u32 + 1))
        .collect()
}
