use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use super::stage1_segment::ends_sentence;
use crate::models::{NormalizedLine, RawLine};

const SOFT_HYPHEN: char = '\u{ad}';

static LEADING_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[SHE]\s?)?\d{1,5}\s+").expect("valid regex"));

static TRAILING_PAGE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:[SHE]\s?)?\d{1,5}$").expect("valid regex"));

/// "January 10, 1991", optionally preceded by a weekday
static BANNER_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:(?:Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday),\s*)?(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s*\d{4}",
    )
    .expect("valid regex")
});

/// Configuration for Stage 0
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    /// Lines matching any of these (after whitespace cleanup) are stripped wherever they occur
    pub boilerplate_patterns: Vec<Regex>,
    /// Lines matching any of these are stripped only near the top or bottom of a page
    pub edge_patterns: Vec<Regex>,
    /// How many non-empty lines at each end of a page count as header/footer territory
    pub edge_lines: usize,
    /// Recurring-line detection only runs on documents with at least this many pages
    pub min_pages_for_recurrence: usize,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            boilerplate_patterns: vec![
                // Left page: "S 412 CONGRESSIONAL RECORD - SENATE January 10, 1991"
                // Right page: "January 10, 1991 CONGRESSIONAL RECORD - SENATE S 413"
                Regex::new(
                    r"^(?:(?:[SHE]\s?)?\d{1,5}\s+)?(?:(?:[A-Z][a-z]+day,\s*)?[A-Z][a-z]+\s+\d{1,2},\s*\d{4}\s+)?CONGRESSIONAL RECORD\s*[-\u{2013}\u{2014}]+\s*(?:SENATE|HOUSE)\b.*$",
                )
                .expect("valid regex"),
            ],
            edge_patterns: vec![
                // Bare page numbers: "12", "S 412", "H1203"
                Regex::new(r"^(?:[SHE]\s?)?\d{1,5}$").expect("valid regex"),
            ],
            edge_lines: 2,
            min_pages_for_recurrence: 2,
        }
    }
}

/// Result of Stage 0 normalization
#[derive(Debug, Clone)]
pub struct NormalizationResult {
    /// Normalized lines per page, in page order
    pub pages: Vec<Vec<NormalizedLine>>,
    /// Number of raw lines stripped as boilerplate
    pub boilerplate_removed: usize,
    /// Distinct header/footer lines found by the recurrence pre-pass
    pub recurring_lines: usize,
    /// Pages that came out empty
    pub empty_pages: Vec<u32>,
}

impl NormalizationResult {
    /// All lines of the document in reading order
    pub fn into_lines(self) -> Vec<NormalizedLine> {
        self.pages.into_iter().flatten().collect()
    }

    pub fn line_count(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }
}

/// Document-wide boilerplate knowledge, built in a pre-pass over every page
#[derive(Debug, Clone)]
pub struct BoilerplateFilter {
    recurring: HashSet<String>,
    patterns: Vec<Regex>,
    edge_patterns: Vec<Regex>,
}

impl BoilerplateFilter {
    /// Pass 1: collect page-edge lines that recur (modulo page numbers and
    /// dates) on a strict majority of the document's pages. Lines that end a
    /// sentence are speech, not running heads, and never count.
    pub fn detect(pages: &[Vec<RawLine>], config: &NormalizerConfig) -> Self {
        let mut recurring = HashSet::new();
        let page_count = pages.len();

        if page_count >= config.min_pages_for_recurrence.max(1) {
            let mut pages_seen: HashMap<String, usize> = HashMap::new();

            for page in pages {
                let edges = edge_flags(page, config.edge_lines);
                let keys: HashSet<String> = page
                    .iter()
                    .zip(edges)
                    .filter(|(_, at_edge)| *at_edge)
                    .map(|(line, _)| clean_text(&line.text))
                    .filter(|cleaned| !ends_sentence(cleaned.trim_end_matches(SOFT_HYPHEN)))
                    .map(|cleaned| recurrence_key(&cleaned))
                    .filter(|key| !key.is_empty())
                    .collect();
                for key in keys {
                    *pages_seen.entry(key).or_insert(0) += 1;
                }
            }

            recurring = pages_seen
                .into_iter()
                .filter(|(_, seen)| *seen * 2 > page_count)
                .map(|(key, _)| key)
                .collect();
        }

        debug!(
            "Boilerplate pre-pass: {} recurring line(s) over {} page(s)",
            recurring.len(),
            page_count
        );

        Self {
            recurring,
            patterns: config.boilerplate_patterns.clone(),
            edge_patterns: config.edge_patterns.clone(),
        }
    }

    /// Check a cleaned line; `at_edge` says whether it sits in the page's header/footer band
    pub fn is_boilerplate(&self, cleaned: &str, at_edge: bool) -> bool {
        let stripped = cleaned.trim_end_matches(SOFT_HYPHEN);
        if self.patterns.iter().any(|p| p.is_match(stripped)) {
            return true;
        }
        at_edge
            && (self.edge_patterns.iter().any(|p| p.is_match(stripped))
                || self.recurring.contains(&recurrence_key(cleaned)))
    }

    pub fn recurring_count(&self) -> usize {
        self.recurring.len()
    }
}

/// Perform Stage 0: normalize every page of a document
///
/// Runs the boilerplate pre-pass over all pages, then cleans each page:
/// 1. Collapses whitespace and drops empty lines
/// 2. Strips boilerplate (configured patterns and recurring headers/footers)
/// 3. Joins words hyphen-broken across a line break
pub fn normalize(pages: &[Vec<RawLine>], config: &NormalizerConfig) -> NormalizationResult {
    let filter = BoilerplateFilter::detect(pages, config);

    let mut normalized = Vec::with_capacity(pages.len());
    let mut boilerplate_removed = 0;
    let mut empty_pages = Vec::new();

    for (index, page) in pages.iter().enumerate() {
        let (lines, removed) = clean_page(page, &filter, config.edge_lines);
        boilerplate_removed += removed;

        if lines.is_empty() {
            let page_number = page.first().map(|l| l.page).unwrap_or(index as u32 + 1);
            warn!("Page {} produced no text after normalization", page_number);
            empty_pages.push(page_number);
        }

        normalized.push(lines);
    }

    NormalizationResult {
        pages: normalized,
        boilerplate_removed,
        recurring_lines: filter.recurring_count(),
        empty_pages,
    }
}

fn clean_page(
    lines: &[RawLine],
    filter: &BoilerplateFilter,
    edge_lines: usize,
) -> (Vec<NormalizedLine>, usize) {
    let mut out: Vec<NormalizedLine> = Vec::new();
    let mut removed = 0;

    for (raw, at_edge) in lines.iter().zip(edge_flags(lines, edge_lines)) {
        let cleaned = clean_text(&raw.text);
        if cleaned.is_empty() {
            continue;
        }
        if filter.is_boilerplate(&cleaned, at_edge) {
            removed += 1;
            continue;
        }

        if let Some(previous) = out.last_mut() {
            if join_hyphenated(&mut previous.text, &cleaned) {
                continue;
            }
            strip_soft_hyphen(&mut previous.text);
        }

        out.push(NormalizedLine {
            text: cleaned,
            page: raw.page,
        });
    }

    // A trailing soft hyphen that found no continuation is dropped
    if let Some(last) = out.last_mut() {
        strip_soft_hyphen(&mut last.text);
    }
    out.retain(|l| !l.text.is_empty());

    (out, removed)
}

fn strip_soft_hyphen(text: &mut String) {
    let kept = text.trim_end_matches(SOFT_HYPHEN).trim_end().len();
    text.truncate(kept);
}

/// Append `next` to `text` if `text` ends in a broken word that `next` continues.
/// Returns true when the join happened.
pub(crate) fn join_hyphenated(text: &mut String, next: &str) -> bool {
    let starts_lowercase = next.chars().next().is_some_and(|c| c.is_lowercase());
    if !starts_lowercase {
        return false;
    }

    match hyphen_break_at(text) {
        Some(cut) => {
            text.truncate(cut);
            text.push_str(next);
            true
        }
        None => false,
    }
}

/// Byte offset of a line-final break hyphen, if the line ends in one
fn hyphen_break_at(text: &str) -> Option<usize> {
    let mut rev = text.char_indices().rev();
    let (last_idx, last) = rev.next()?;

    match last {
        SOFT_HYPHEN => Some(last_idx),
        '-' => match rev.next() {
            Some((_, before)) if before.is_alphabetic() => Some(last_idx),
            _ => None,
        },
        _ => None,
    }
}

/// Whitespace collapse, escape cleanup and soft-hyphen removal for one line.
/// A soft hyphen at the very end is kept so the join step can see it.
fn clean_text(text: &str) -> String {
    let text = text.replace("\\'", "'");
    let trailing_soft = text.trim_end().ends_with(SOFT_HYPHEN);

    let mut collapsed = String::with_capacity(text.len());
    for word in text
        .split(|c: char| c.is_whitespace() || c.is_control())
        .map(|w| w.replace(SOFT_HYPHEN, ""))
        .filter(|w| !w.is_empty())
    {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(&word);
    }

    if trailing_soft && !collapsed.is_empty() {
        collapsed.push(SOFT_HYPHEN);
    }
    collapsed
}

/// For each line, whether it is among the first or last `band` non-empty
/// lines of its page by vertical position
fn edge_flags(page: &[RawLine], band: usize) -> Vec<bool> {
    let mut positions: Vec<u32> = page
        .iter()
        .filter(|line| !clean_text(&line.text).is_empty())
        .map(|line| line.position)
        .collect();
    positions.sort_unstable();
    let len = positions.len();

    page.iter()
        .map(|line| {
            let rank = positions.partition_point(|&p| p < line.position);
            rank < band || rank + band >= len
        })
        .collect()
}

/// Line identity for recurrence: dates and page numbers don't count, so
/// left- and right-hand running heads share a key
fn recurrence_key(cleaned: &str) -> String {
    let stripped = cleaned.trim_end_matches(SOFT_HYPHEN);
    let stripped = BANNER_DATE.replace_all(stripped, " ");
    let stripped = LEADING_PAGE_NUMBER.replace(stripped.trim(), "");
    let stripped = TRAILING_PAGE_NUMBER.replace(&stripped, "");
    stripped.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::page_from_text;
    use crate::stages::stage1_segment::{SegmenterConfig, segment};

    fn texts(lines: &[NormalizedLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_hyphen_join() {
        let pages = vec![page_from_text("the congres-\nsional record", 1)];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(texts(&result.pages[0]), vec!["the congressional record"]);
    }

    #[test]
    fn test_soft_hyphen_join() {
        let pages = vec![page_from_text("appro\u{ad}\npriations bill", 1)];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(texts(&result.pages[0]), vec!["appropriations bill"]);
    }

    #[test]
    fn test_no_join_before_capital_or_dash() {
        let pages = vec![page_from_text(
            "Mr. President, the Byrd-\nDole amendment--\nand others",
            1,
        )];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(
            texts(&result.pages[0]),
            vec!["Mr. President, the Byrd-", "Dole amendment--", "and others"]
        );
    }

    #[test]
    fn test_whitespace_collapse_and_empty_lines() {
        let pages = vec![page_from_text("  I   yield\t the floor.  \n   \n\nDon\\'t", 1)];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(texts(&result.pages[0]), vec!["I yield the floor.", "Don't"]);
    }

    #[test]
    fn test_recurring_header_stripped() {
        let pages = vec![
            page_from_text("January 10, 1991 Senate Debate 1\nFirst page text.", 1),
            page_from_text("January 10, 1991 Senate Debate 2\nSecond page text.", 2),
            page_from_text("January 10, 1991 Senate Debate 3\nThird page text.", 3),
        ];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(result.boilerplate_removed, 3);
        assert_eq!(texts(&result.pages[0]), vec!["First page text."]);
        assert_eq!(texts(&result.pages[2]), vec!["Third page text."]);
    }

    #[test]
    fn test_minority_recurrence_kept() {
        let pages = vec![
            page_from_text("Mr. President, I object.", 1),
            page_from_text("Mr. President, I object.", 2),
            page_from_text("Other text.", 3),
            page_from_text("More text.", 4),
        ];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(result.boilerplate_removed, 0);
        assert_eq!(result.line_count(), 4);
    }

    #[test]
    fn test_single_page_has_no_recurrence() {
        let pages = vec![page_from_text("Only page.\nStill content.", 1)];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(result.line_count(), 2);
    }

    #[test]
    fn test_banner_pattern_stripped() {
        let pages = vec![page_from_text(
            "S 412 CONGRESSIONAL RECORD \u{2014} SENATE January 10, 1991\n427\nBody text.",
            1,
        )];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(texts(&result.pages[0]), vec!["Body text."]);
        assert_eq!(result.boilerplate_removed, 2);
    }

    #[test]
    fn test_empty_page_reported() {
        let pages = vec![page_from_text("Text.", 1), page_from_text("  \n 17 ", 2)];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert!(result.pages[1].is_empty());
        assert_eq!(result.empty_pages, vec![2]);
    }

    #[test]
    fn test_alternating_running_heads_stripped() {
        let pages = vec![
            page_from_text("S 412 CONGRESSIONAL RECORD \u{2014} SENATE January 10, 1991\nMr. BYRD. First.", 1),
            page_from_text("January 10, 1991 CONGRESSIONAL RECORD \u{2014} SENATE S 413\nSecond page.", 2),
            page_from_text("S 414 CONGRESSIONAL RECORD \u{2014} SENATE January 10, 1991\nThird page.", 3),
            page_from_text("January 10, 1991 CONGRESSIONAL RECORD \u{2014} SENATE S 415\nFourth page.", 4),
        ];
        let result = normalize(&pages, &NormalizerConfig::default());
        let turns = segment(&result.into_lines(), &SegmenterConfig::default());

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].text, "First. Second page. Third page. Fourth page.");
    }

    #[test]
    fn test_running_heads_share_recurrence_key() {
        let config = NormalizerConfig {
            boilerplate_patterns: Vec::new(),
            ..Default::default()
        };
        let pages = vec![
            page_from_text("S 412 CONGRESSIONAL RECORD \u{2014} SENATE January 10, 1991\nOne.", 1),
            page_from_text("January 10, 1991 CONGRESSIONAL RECORD \u{2014} SENATE S 413\nTwo.", 2),
            page_from_text("S 414 CONGRESSIONAL RECORD \u{2014} SENATE January 10, 1991\nThree.", 3),
        ];
        let result = normalize(&pages, &config);

        assert_eq!(result.recurring_lines, 1);
        assert_eq!(result.boilerplate_removed, 3);
        assert_eq!(texts(&result.pages[1]), vec!["Two."]);
    }

    #[test]
    fn test_repeated_speech_is_not_boilerplate() {
        let pages = vec![
            page_from_text(
                "Mr. BYRD. I ask unanimous consent that the order be rescinded.\n\
                 The PRESIDING OFFICER. Without objection, it is so ordered.",
                1,
            ),
            page_from_text(
                "Mr. DOLE. I ask unanimous consent to proceed to the bill.\n\
                 The PRESIDING OFFICER. Without objection, it is so ordered.",
                2,
            ),
        ];
        let result = normalize(&pages, &NormalizerConfig::default());
        let turns = segment(&result.into_lines(), &SegmenterConfig::default());

        let speakers: Vec<Option<&str>> = turns.iter().map(|t| t.speaker_raw()).collect();
        assert_eq!(
            speakers,
            vec![
                Some("BYRD"),
                Some("PRESIDING OFFICER"),
                Some("DOLE"),
                Some("PRESIDING OFFICER")
            ]
        );
    }

    #[test]
    fn test_recurrence_ignores_mid_page_lines() {
        let page = |n: u32| {
            page_from_text(
                &format!(
                    "Header {}\nOpening line.\nSecond line.\nTREATY OF PEACE\nThird line.\nFourth line.\nClosing line.",
                    n
                ),
                n,
            )
        };
        let result = normalize(&[page(1), page(2), page(3)], &NormalizerConfig::default());

        assert!(texts(&result.pages[1]).contains(&"TREATY OF PEACE"));
        // "Header N" recurs at the top of every page
        assert_eq!(texts(&result.pages[1])[0], "Opening line.");
        assert_eq!(result.boilerplate_removed, 3);
    }

    #[test]
    fn test_bare_number_only_stripped_at_page_edge() {
        let pages = vec![page_from_text(
            "Mr. BYRD. The treaty was signed in\nthe year\n1991\nand ratified\nshortly after.\nS 413",
            1,
        )];
        let result = normalize(&pages, &NormalizerConfig::default());

        assert_eq!(
            texts(&result.pages[0]),
            vec![
                "Mr. BYRD. The treaty was signed in",
                "the year",
                "1991",
                "and ratified",
                "shortly after."
            ]
        );
        assert_eq!(result.boilerplate_removed, 1);
    }

    #[test]
    fn test_join_hyphenated_requires_lowercase() {
        let mut text = "inter-".to_string();
        assert!(!join_hyphenated(&mut text, "State"));
        assert!(join_hyphenated(&mut text, "state commerce"));
        assert_eq!(text, "interstate commerce");
    }
}
