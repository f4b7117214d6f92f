use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Turn;

/// Party affiliation for a term of service
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Party {
    Democrat,
    Republican,
    Independent,
    /// Any other label in the dataset ("Whig", "Conservative", ...), kept verbatim
    Other(String),
    Unknown,
}

impl Party {
    /// Map the dataset's party label; an empty label is Unknown
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "" => Party::Unknown,
            "democrat" | "democratic" => Party::Democrat,
            "republican" => Party::Republican,
            "independent" => Party::Independent,
            _ => Party::Other(label.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Party::Democrat => "Democrat",
            Party::Republican => "Republican",
            Party::Independent => "Independent",
            Party::Other(label) => label,
            Party::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Party::Unknown)
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chamber of Congress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chamber {
    Senate,
    House,
    Unknown,
}

impl Chamber {
    /// Map the dataset's term type ("sen" / "rep")
    pub fn from_term_type(term_type: &str) -> Self {
        match term_type {
            "sen" => Chamber::Senate,
            "rep" => Chamber::House,
            _ => Chamber::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Chamber::Senate => "Senate",
            Chamber::House => "House",
            Chamber::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Chamber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved identity of a speaker on a given date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerIdentity {
    /// Canonical legislator name; None when unresolved
    pub canonical_name: Option<String>,
    pub party: Party,
    pub chamber: Chamber,
}

impl SpeakerIdentity {
    pub fn unknown() -> Self {
        Self {
            canonical_name: None,
            party: Party::Unknown,
            chamber: Chamber::Unknown,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.canonical_name.is_none()
    }
}

impl Default for SpeakerIdentity {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One term of service, flattened from the legislator dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegislatorTerm {
    /// Stable legislator identifier (bioguide id, or the display name when absent)
    pub legislator_id: String,
    pub canonical_name: String,
    pub surname: String,
    pub party: Party,
    pub chamber: Chamber,
    /// Two-letter postal code
    pub state: Option<String>,
    pub term_start: NaiveDate,
    pub term_end: NaiveDate,
}

impl LegislatorTerm {
    /// Whether the inclusive term interval contains `date`
    pub fn serves_on(&self, date: NaiveDate) -> bool {
        self.term_start <= date && date <= self.term_end
    }

    pub fn identity(&self) -> SpeakerIdentity {
        SpeakerIdentity {
            canonical_name: Some(self.canonical_name.clone()),
            party: self.party.clone(),
            chamber: self.chamber,
        }
    }
}

/// A turn with its resolved speaker identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTurn {
    #[serde(flatten)]
    pub turn: Turn,
    pub identity: SpeakerIdentity,
}
