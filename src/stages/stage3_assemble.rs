use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::{debug, info};

use crate::error::DocumentError;
use crate::models::{DateRange, DocumentRecord, RawLine, ResolvedTurn};

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{2})-(\d{2})").expect("valid regex"));

static COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{4})(\d{2})(\d{2})(?:\D|$)").expect("valid regex"));

static LONG_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(January|February|March|April|May|June|July|August|September|October|November|December)\s+(\d{1,2}),\s*(\d{4})\b",
    )
    .expect("valid regex")
});

/// Result of Stage 3 assembly
#[derive(Debug, Clone)]
pub enum AssemblyOutcome {
    Assembled(DocumentRecord),
    /// The document's date lies outside the configured range
    FilteredOut { date: NaiveDate },
}

/// Perform Stage 3: build the document record
///
/// Applies the date filter, drops turns with no text, and keeps the
/// segmenter's order.
pub fn assemble(
    turns: Vec<ResolvedTurn>,
    source_path: &Path,
    date: NaiveDate,
    range: &DateRange,
) -> AssemblyOutcome {
    if !range.contains(date) {
        info!("{:?} dated {} is outside the date range", source_path, date);
        return AssemblyOutcome::FilteredOut { date };
    }

    let before = turns.len();
    let turns: Vec<ResolvedTurn> = turns
        .into_iter()
        .filter(|t| !t.turn.text.trim().is_empty())
        .collect();

    if turns.len() < before {
        debug!(
            "{:?}: dropped {} empty turn(s)",
            source_path,
            before - turns.len()
        );
    }

    AssemblyOutcome::Assembled(DocumentRecord {
        source_path: source_path.to_path_buf(),
        date,
        turns,
    })
}

/// Determine a document's date from its file name, falling back to its text.
/// Must run on raw lines: the dated banner is boilerplate and gets stripped.
pub fn document_date(path: &Path, pages: &[Vec<RawLine>]) -> Result<NaiveDate, DocumentError> {
    date_from_file_name(path)
        .or_else(|| date_from_text(pages))
        .ok_or_else(|| DocumentError::Undated {
            path: path.to_path_buf(),
        })
}

/// `CREC-1991-01-10-pt1-PgS1.pdf`, `senate_19910110.pdf`
pub fn date_from_file_name(path: &Path) -> Option<NaiveDate> {
    let name = path.file_name()?.to_string_lossy();

    ISO_DATE
        .captures_iter(&name)
        .chain(COMPACT_DATE.captures_iter(&name))
        .find_map(|caps| {
            let year = caps[1].parse().ok()?;
            let month = caps[2].parse().ok()?;
            let day = caps[3].parse().ok()?;
            NaiveDate::from_ymd_opt(year, month, day)
        })
}

/// First "Month day, year" date, preferring Congressional Record banners
pub fn date_from_text(pages: &[Vec<RawLine>]) -> Option<NaiveDate> {
    let lines = || pages.iter().flatten().map(|l| l.text.as_str());

    lines()
        .filter(|l| l.contains("CONGRESSIONAL RECORD"))
        .chain(lines())
        .find_map(parse_long_date)
}

fn parse_long_date(text: &str) -> Option<NaiveDate> {
    let caps = LONG_DATE.captures(text)?;
    let normalized = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
    NaiveDate::parse_from_str(&normalized, "%B %d %Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SpeakerIdentity, Speaker, Turn, page_from_text};
    use std::path::PathBuf;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn resolved(speaker: Speaker, text: &str, page: u32) -> ResolvedTurn {
        ResolvedTurn {
            turn: Turn {
                speaker,
                text: text.to_string(),
                page_range: (page, page),
            },
            identity: SpeakerIdentity::unknown(),
        }
    }

    fn range() -> DateRange {
        DateRange::new(Some(date(1991, 1, 10)), Some(date(1991, 1, 12))).unwrap()
    }

    #[test]
    fn test_date_filter() {
        let path = PathBuf::from("CREC-1991-01-09.pdf");
        let outcome = assemble(vec![], &path, date(1991, 1, 9), &range());
        assert!(matches!(outcome, AssemblyOutcome::FilteredOut { .. }));

        let outcome = assemble(vec![], &path, date(1991, 1, 11), &range());
        assert!(matches!(outcome, AssemblyOutcome::Assembled(_)));
    }

    #[test]
    fn test_empty_turns_dropped_order_kept() {
        let turns = vec![
            resolved(Speaker::named("KENNEDY"), "", 1),
            resolved(Speaker::named("HATCH"), "I object.", 1),
            resolved(Speaker::procedural("PRESIDING OFFICER"), "   ", 2),
            resolved(Speaker::named("KENNEDY"), "I withdraw the request.", 2),
        ];

        let outcome = assemble(turns, Path::new("a.pdf"), date(1991, 1, 10), &range());
        let AssemblyOutcome::Assembled(record) = outcome else {
            panic!("expected an assembled record");
        };

        let speakers: Vec<_> = record.turns.iter().map(|t| t.turn.speaker_raw()).collect();
        assert_eq!(speakers, vec![Some("HATCH"), Some("KENNEDY")]);
        assert_eq!(record.date, date(1991, 1, 10));
    }

    #[test]
    fn test_date_from_file_name() {
        assert_eq!(
            date_from_file_name(Path::new("/data/CREC-1991-01-10-pt1-PgS1.pdf")),
            Some(date(1991, 1, 10))
        );
        assert_eq!(
            date_from_file_name(Path::new("senate_19910111.pdf")),
            Some(date(1991, 1, 11))
        );
        assert_eq!(date_from_file_name(Path::new("CREC-1991-13-45.pdf")), None);
        assert_eq!(date_from_file_name(Path::new("transcript.pdf")), None);
    }

    #[test]
    fn test_date_from_banner_text() {
        let pages = vec![page_from_text(
            "On March 4, 1990, the committee met.\nS 12 CONGRESSIONAL RECORD \u{2014} SENATE January 12, 1991",
            1,
        )];

        assert_eq!(date_from_text(&pages), Some(date(1991, 1, 12)));
    }

    #[test]
    fn test_undated_document_is_error() {
        let pages = vec![page_from_text("No dates here.", 1)];
        let err = document_date(Path::new("transcript.pdf"), &pages).unwrap_err();

        assert!(matches!(err, DocumentError::Undated { .. }));
    }
}
