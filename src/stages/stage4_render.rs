use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::DocumentError;
use crate::io::{CorpusJson, CorpusText};
use crate::models::DocumentRecord;

/// Configuration for Stage 4 rendering
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Also write a `.json` file next to the text corpus file
    pub write_json: bool,
    /// Wrap width for turn text
    pub wrap_width: usize,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            write_json: false,
            wrap_width: 80,
        }
    }
}

/// Files produced for one document
#[derive(Debug, Clone)]
pub struct WrittenDocument {
    pub text_path: PathBuf,
    pub json_path: Option<PathBuf>,
    pub turns: usize,
}

/// Perform Stage 4: write the corpus file(s) for one document
///
/// Output names derive from the date and source file name only, so
/// re-running over the same input overwrites with identical bytes.
pub fn write_document(
    record: &DocumentRecord,
    out_dir: &Path,
    config: &WriterConfig,
) -> Result<WrittenDocument, DocumentError> {
    let stem = output_stem(record);

    let text_path = out_dir.join(format!("{}.txt", stem));
    let text = CorpusText::with_width(record, config.wrap_width).format();
    write_file(&text_path, text)?;

    let json_path = if config.write_json {
        let path = out_dir.join(format!("{}.json", stem));
        let json = CorpusJson::from_record(record)
            .to_json()
            .map_err(|e| DocumentError::Write {
                path: path.clone(),
                source: std::io::Error::other(e.to_string()),
            })?;
        write_file(&path, json)?;
        Some(path)
    } else {
        None
    };

    info!(
        "Wrote {} turns ({} named, {} resolved) from {:?} to {:?}",
        record.turns.len(),
        record.named_turn_count(),
        record.resolved_turn_count(),
        record.source_path,
        text_path
    );

    Ok(WrittenDocument {
        text_path,
        json_path,
        turns: record.turns.len(),
    })
}

/// `<YYYY-MM-DD>_<file stem>` with unsafe characters replaced
pub fn output_stem(record: &DocumentRecord) -> String {
    let stem = record
        .source_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let sanitized: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("{}_{}", record.date.format("%Y-%m-%d"), sanitized)
}

fn write_file(path: &Path, content: String) -> Result<(), DocumentError> {
    std::fs::write(path, content).map_err(|source| DocumentError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(path: &str) -> DocumentRecord {
        DocumentRecord {
            source_path: PathBuf::from(path),
            date: NaiveDate::from_ymd_opt(1991, 1, 11).unwrap(),
            turns: vec![],
        }
    }

    #[test]
    fn test_writer_config_default() {
        let config = WriterConfig::default();
        assert!(!config.write_json);
        assert_eq!(config.wrap_width, 80);
    }

    #[test]
    fn test_output_stem() {
        assert_eq!(
            output_stem(&record("/in/CREC-1991-01-11.pdf")),
            "1991-01-11_CREC-1991-01-11"
        );
        assert_eq!(
            output_stem(&record("floor debate (final).pdf")),
            "1991-01-11_floor_debate__final_"
        );
    }

    #[test]
    fn test_write_document_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = WriterConfig {
            write_json: true,
            ..Default::default()
        };
        let record = record("CREC-1991-01-11.pdf");

        let first = write_document(&record, dir.path(), &config).unwrap();
        let first_bytes = std::fs::read(&first.text_path).unwrap();
        let second = write_document(&record, dir.path(), &config).unwrap();

        assert_eq!(first.text_path, second.text_path);
        assert_eq!(first_bytes, std::fs::read(&second.text_path).unwrap());
        assert!(second.json_path.unwrap().exists());
    }

    #[test]
    fn test_unwritable_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = write_document(&record("a-1991-01-11.pdf"), &missing, &WriterConfig::default())
            .unwrap_err();
        assert!(matches!(err, DocumentError::Write { .. }));
    }
}
