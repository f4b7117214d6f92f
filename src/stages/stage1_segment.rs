use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::stage0_normalize::join_hyphenated;
use crate::models::{NormalizedLine, Speaker, Turn};

/// "Mr. SMITH. text", "Mrs. McCAIN of Arizona. text", "Miss Smith."
static NAMED_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:Mr|Mrs|Ms|Dr)\.|Miss)\s+(?P<surname>[A-Z][A-Za-z'\-]+(?:\s[A-Z][A-Za-z'\-]+)?)(?:\s+of\s+(?P<state>[A-Z][a-z]+(?:\s[A-Z][a-z]+)*))?\.(?:\s+(?P<rest>.*))?$",
    )
    .expect("valid regex")
});

/// "The PRESIDING OFFICER. text", "The PRESIDING OFFICER (Mr. KERRY). text"
static PROCEDURAL_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^The\s+(?P<role>PRESIDING OFFICER|ACTING PRESIDENT pro tempore|PRESIDENT pro tempore|VICE PRESIDENT|CHIEF JUSTICE|SPEAKER pro tempore|CHAIRMAN|CHAIR|CLERK|SPEAKER|PRESIDENT)(?:\s*\([^)]*\))?\.(?:\s+(?P<rest>.*))?$",
    )
    .expect("valid regex")
});

/// Configuration for Stage 1
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Words that follow a title but are forms of address, not surnames
    pub reserved_titles: Vec<String>,
    /// Only accept a marker when the previous line ended a sentence
    pub require_sentence_break: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            reserved_titles: ["President", "Speaker", "Chairman", "Chair", "Leader", "Clerk"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            require_sentence_break: true,
        }
    }
}

/// A speaker marker found at the start of a line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub speaker: Speaker,
    /// Text after the marker on the same line
    pub rest: &'a str,
}

/// Parse a speaker marker at the start of `text`, if any
pub fn parse_marker<'a>(text: &'a str, config: &SegmenterConfig) -> Option<Marker<'a>> {
    if let Some(caps) = PROCEDURAL_MARKER.captures(text) {
        let role = caps.name("role")?.as_str();
        return Some(Marker {
            speaker: Speaker::procedural(role),
            rest: caps.name("rest").map_or("", |m| m.as_str()),
        });
    }

    let caps = NAMED_MARKER.captures(text)?;
    let surname = caps.name("surname")?.as_str();
    let first_word = surname.split_whitespace().next().unwrap_or(surname);
    if config
        .reserved_titles
        .iter()
        .any(|t| t.eq_ignore_ascii_case(first_word))
    {
        return None;
    }

    Some(Marker {
        speaker: Speaker::Named {
            surname: surname.to_string(),
            state: caps.name("state").map(|m| m.as_str().to_string()),
        },
        rest: caps.name("rest").map_or("", |m| m.as_str()),
    })
}

/// Whether a line ends a sentence, ignoring closing quotes and brackets
pub fn ends_sentence(text: &str) -> bool {
    text.trim_end()
        .trim_end_matches(['"', '\'', '\u{201d}', '\u{2019}', ')', ']'])
        .ends_with(['.', '?', '!', ':'])
}

/// Section headings ("PRAYER", "MORNING BUSINESS") have no lowercase letters
pub fn is_heading(text: &str) -> bool {
    text.chars().any(char::is_alphabetic) && !text.chars().any(char::is_lowercase)
}

/// A marker may only open a turn after a sentence end or a heading
fn is_turn_boundary(previous: &str) -> bool {
    ends_sentence(previous) || is_heading(previous)
}

/// A turn still receiving lines
struct OpenTurn {
    speaker: Speaker,
    text: String,
    first_page: u32,
    last_page: u32,
}

impl OpenTurn {
    fn new(speaker: Speaker, text: &str, page: u32) -> Self {
        Self {
            speaker,
            text: text.trim().to_string(),
            first_page: page,
            last_page: page,
        }
    }

    fn append(&mut self, line: &NormalizedLine) {
        if self.text.is_empty() {
            self.text.push_str(&line.text);
        } else if !join_hyphenated(&mut self.text, &line.text) {
            self.text.push(' ');
            self.text.push_str(&line.text);
        }
        self.last_page = line.page;
    }

    fn close(self) -> Turn {
        Turn {
            speaker: self.speaker,
            text: self.text,
            page_range: (self.first_page, self.last_page),
        }
    }
}

/// Perform Stage 1: split the document's lines into speaker turns
///
/// A marker line closes the open turn and opens a new one. Other lines
/// continue the open turn, or start an unattributed turn if none is open.
pub fn segment(lines: &[NormalizedLine], config: &SegmenterConfig) -> Vec<Turn> {
    let mut turns = Vec::new();
    let mut open: Option<OpenTurn> = None;
    let mut previous: Option<&str> = None;

    for line in lines {
        let at_sentence_break =
            !config.require_sentence_break || previous.is_none_or(is_turn_boundary);

        let marker = parse_marker(&line.text, config);
        match marker {
            Some(marker) if at_sentence_break => {
                if let Some(turn) = open.take() {
                    turns.push(turn.close());
                }
                open = Some(OpenTurn::new(marker.speaker, marker.rest, line.page));
            }
            marker => {
                if marker.is_some() {
                    debug!(
                        "Page {}: marker-like line treated as continuation: {:?}",
                        line.page, line.text
                    );
                }
                if let Some(turn) = open.as_mut() {
                    turn.append(line);
                } else {
                    open = Some(OpenTurn::new(Speaker::Unattributed, &line.text, line.page));
                }
            }
        }

        previous = Some(line.text.as_str());
    }

    if let Some(turn) = open.take() {
        turns.push(turn.close());
    }

    turns
}
