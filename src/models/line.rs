use serde::{Deserialize, Serialize};

/// A single line of text as returned by the PDF extraction collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    /// Extracted text, untouched
    pub text: String,
    /// 1-based page number
    pub page: u32,
    /// Vertical order on the page (top = 0)
    pub position: u32,
}

impl RawLine {
    pub fn new(text: impl Into<String>, page: u32, position: u32) -> Self {
        Self {
            text: text.into(),
            page,
            position,
        }
    }
}

/// A cleaned line: trimmed, whitespace-collapsed, de-hyphenated, never empty
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedLine {
    pub text: String,
    pub page: u32,
}

/// All raw lines of one document, grouped by page in reading order
pub type RawPages = Vec<Vec<RawLine>>;

/// Build a page of raw lines from plain text, one line per `\n`
pub fn page_from_text(text: &str, page: u32) -> Vec<RawLine> {
    text.lines()
        .enumerate()
        .map(|(i, line)| RawLine::new(line, page, i as u32))
        .collect()
}
