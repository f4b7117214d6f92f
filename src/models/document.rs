use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ResolvedTurn;

/// Inclusive date range; an open bound is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s > e {
                bail!("Invalid date range: start {} is after end {}", s, e);
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// An assembled transcript, ready for the corpus writer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub source_path: PathBuf,
    pub date: NaiveDate,
    pub turns: Vec<ResolvedTurn>,
}

impl DocumentRecord {
    pub fn named_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| t.turn.speaker.is_named()).count()
    }

    pub fn resolved_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| !t.identity.is_unknown()).count()
    }
}
