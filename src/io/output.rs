use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Chamber, DocumentRecord, Party, Speaker};

/// Machine-readable corpus document
#[derive(Debug, Clone, Serialize)]
pub struct CorpusJson {
    pub source: String,
    pub date: NaiveDate,
    pub turns: Vec<CorpusTurn>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorpusTurn {
    pub speaker: Speaker,
    pub name: Option<String>,
    pub party: Party,
    pub chamber: Chamber,
    pub first_page: u32,
    pub last_page: u32,
    pub text: String,
}

impl CorpusJson {
    pub fn from_record(record: &DocumentRecord) -> Self {
        let turns = record
            .turns
            .iter()
            .map(|t| CorpusTurn {
                speaker: t.turn.speaker.clone(),
                name: t.identity.canonical_name.clone(),
                party: t.identity.party.clone(),
                chamber: t.identity.chamber,
                first_page: t.turn.first_page(),
                last_page: t.turn.page_range.1,
                text: t.turn.text.clone(),
            })
            .collect();

        Self {
            source: source_name(&record.source_path),
            date: record.date,
            turns,
        }
    }

    /// Pretty-printed JSON with a trailing newline
    pub fn to_json(&self) -> Result<String> {
        let mut json = serde_json::to_string_pretty(self).context("Failed to serialize corpus JSON")?;
        json.push('\n');
        Ok(json)
    }
}

/// Speaker-tagged text format, one block per turn
pub struct CorpusText<'a> {
    record: &'a DocumentRecord,
    width: usize,
}

impl<'a> CorpusText<'a> {
    pub fn new(record: &'a DocumentRecord) -> Self {
        Self { record, width: 80 }
    }

    pub fn with_width(record: &'a DocumentRecord, width: usize) -> Self {
        Self { record, width }
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# source: {}", source_name(&self.record.source_path));
        let _ = writeln!(output, "# date: {}", self.record.date.format("%Y-%m-%d"));
        let _ = writeln!(output, "# turns: {}", self.record.turns.len());
        output.push('\n');

        for resolved in &self.record.turns {
            let turn = &resolved.turn;
            let identity = &resolved.identity;
            let _ = writeln!(
                output,
                "[speaker={} name={} party={} chamber={} pages={}-{}]",
                tag_value(&turn.speaker.to_string()),
                tag_value(identity.canonical_name.as_deref().unwrap_or("-")),
                identity.party,
                identity.chamber,
                turn.page_range.0,
                turn.page_range.1,
            );
            output.push_str(&wrap_text(&turn.text, self.width));
            output.push_str("\n\n");
        }

        output
    }
}

/// Lower-cased text of one document, grouped by party
#[derive(Debug, Clone)]
pub struct PartyFragments {
    pub date: NaiveDate,
    pub source_path: PathBuf,
    pub texts: Vec<(Party, String)>,
}

impl PartyFragments {
    /// Collect the text of every turn resolved to a known party, minor parties included
    pub fn from_record(record: &DocumentRecord) -> Self {
        let texts = record
            .turns
            .iter()
            .filter(|t| t.identity.party.is_known())
            .map(|t| (t.identity.party.clone(), t.turn.text.to_lowercase()))
            .collect();

        Self {
            date: record.date,
            source_path: record.source_path.clone(),
            texts,
        }
    }
}

/// Write `<Party>_party_corpus.txt` for every party with text.
/// Documents are ordered by date, then source path.
pub fn write_party_corpora(mut fragments: Vec<PartyFragments>, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fragments.sort_by(|a, b| (a.date, &a.source_path).cmp(&(b.date, &b.source_path)));

    let mut by_party: BTreeMap<Party, String> = BTreeMap::new();
    for fragment in &fragments {
        for (party, text) in &fragment.texts {
            let corpus = by_party.entry(party.clone()).or_default();
            corpus.push_str(text);
            corpus.push('\n');
        }
    }

    let mut written = Vec::new();
    for (party, corpus) in by_party {
        let path = out_dir.join(format!("{}_party_corpus.txt", file_label(party.as_str())));
        std::fs::write(&path, corpus)
            .with_context(|| format!("Failed to write party corpus: {:?}", path))?;
        written.push(path);
    }

    Ok(written)
}

/// File name of the source, for headers
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Party labels may contain spaces or slashes
fn file_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

/// Quote tag values containing spaces
fn tag_value(value: &str) -> String {
    if value.contains(char::is_whitespace) {
        format!("\"{}\"", value.replace('"', "'"))
    } else {
        value.to_string()
    }
}

/// Greedy word wrap; width counts characters, and a longer word gets its own line
fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for word in text.split_whitespace() {
        let word_width = word.chars().count();
        if current_width > 0 && current_width + 1 + word_width > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push(' ');
            current_width += 1;
        }
        current.push_str(word);
        current_width += word_width;
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
