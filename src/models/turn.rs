use std::fmt;

use serde::{Deserialize, Serialize};

/// Who a turn is attributed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Speaker {
    /// A member addressed by title and surname, e.g. "Mr. SMITH of Oregon."
    Named {
        /// Surname as printed in the marker
        surname: String,
        /// State qualifier, if the marker carried one
        #[serde(skip_serializing_if = "Option::is_none")]
        state: Option<String>,
    },
    /// A chair or officer role, e.g. "The PRESIDING OFFICER."
    Procedural { role: String },
    /// Text before the first marker (preamble, prayers, procedural prose)
    Unattributed,
}

impl Speaker {
    pub fn named(surname: impl Into<String>) -> Self {
        Speaker::Named {
            surname: surname.into(),
            state: None,
        }
    }

    pub fn procedural(role: impl Into<String>) -> Self {
        Speaker::Procedural { role: role.into() }
    }

    /// The name printed in the marker, minus title and punctuation
    pub fn speaker_raw(&self) -> Option<&str> {
        match self {
            Speaker::Named { surname, .. } => Some(surname),
            Speaker::Procedural { role } => Some(role),
            Speaker::Unattributed => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Speaker::Named { .. })
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Named {
                surname,
                state: Some(state),
            } => write!(f, "{} of {}", surname, state),
            Speaker::Named { surname, .. } => write!(f, "{}", surname),
            Speaker::Procedural { role } => write!(f, "{}", role),
            Speaker::Unattributed => write!(f, "-"),
        }
    }
}

/// A contiguous block of text attributed to one speaker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    /// Line contents joined into one paragraph
    pub text: String,
    /// First and last page the turn spans
    pub page_range: (u32, u32),
}

impl Turn {
    pub fn speaker_raw(&self) -> Option<&str> {
        self.speaker.speaker_raw()
    }

    pub fn first_page(&self) -> u32 {
        self.page_range.0
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}
