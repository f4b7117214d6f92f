use serde::{Deserialize, Serialize};

/// One legislator from the `congress-legislators` dataset
/// (legislators-current.json / legislators-historical.json)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegislatorEntry {
    #[serde(default)]
    pub id: LegislatorIds,
    pub name: LegislatorName,
    #[serde(default)]
    pub terms: Vec<TermEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LegislatorIds {
    #[serde(default)]
    pub bioguide: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegislatorName {
    #[serde(default)]
    pub first: Option<String>,
    pub last: String,
    #[serde(default)]
    pub official_full: Option<String>,
}

/// A single term of service
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TermEntry {
    /// "sen" or "rep"
    #[serde(rename = "type")]
    pub term_type: String,
    /// ISO date, YYYY-MM-DD
    pub start: String,
    /// ISO date, YYYY-MM-DD
    pub end: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
}

impl LegislatorEntry {
    /// Display name: the official full name when present, else "First Last"
    pub fn display_name(&self) -> String {
        if let Some(full) = &self.name.official_full {
            return full.clone();
        }
        match &self.name.first {
            Some(first) => format!("{} {}", first, self.name.last),
            None => self.name.last.clone(),
        }
    }
}
