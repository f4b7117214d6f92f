use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{
    Chamber, LegislatorEntry, LegislatorTerm, Party, ResolvedTurn, Speaker, SpeakerIdentity,
    Turn,
};

/// Configuration for Stage 2
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Only consider terms served in this chamber
    pub chamber: Option<Chamber>,
}

/// Read-only surname index over every term of service in the dataset.
/// Built once at startup and shared across document workers.
#[derive(Debug, Default)]
pub struct LegislatorRegistry {
    by_surname: HashMap<String, Vec<LegislatorTerm>>,
    legislator_count: usize,
}

impl LegislatorRegistry {
    /// Flatten dataset entries into one record per term
    pub fn from_entries(entries: impl IntoIterator<Item = LegislatorEntry>) -> Self {
        let mut terms = Vec::new();
        let mut legislator_count = 0;

        for entry in entries {
            legislator_count += 1;
            let canonical_name = entry.display_name();
            let legislator_id = entry
                .id
                .bioguide
                .clone()
                .unwrap_or_else(|| canonical_name.clone());

            for term in &entry.terms {
                let (Some(term_start), Some(term_end)) = (parse_iso(&term.start), parse_iso(&term.end))
                else {
                    warn!(
                        "Skipping term of {} with unparseable dates {:?}..{:?}",
                        canonical_name, term.start, term.end
                    );
                    continue;
                };

                terms.push(LegislatorTerm {
                    legislator_id: legislator_id.clone(),
                    canonical_name: canonical_name.clone(),
                    surname: entry.name.last.clone(),
                    party: term.party.as_deref().map_or(Party::Unknown, Party::from_label),
                    chamber: Chamber::from_term_type(&term.term_type),
                    state: term.state.clone(),
                    term_start,
                    term_end,
                });
            }
        }

        let mut registry = Self::from_terms(terms);
        registry.legislator_count = legislator_count;
        registry
    }

    pub fn from_terms(terms: Vec<LegislatorTerm>) -> Self {
        let mut by_surname: HashMap<String, Vec<LegislatorTerm>> = HashMap::new();
        for term in terms {
            by_surname
                .entry(surname_key(&term.surname))
                .or_default()
                .push(term);
        }

        let legislator_count = by_surname
            .values()
            .flatten()
            .map(|t| t.legislator_id.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();

        Self {
            by_surname,
            legislator_count,
        }
    }

    /// Terms with a matching surname whose interval contains `date`
    pub fn candidates(&self, surname: &str, date: NaiveDate) -> Vec<&LegislatorTerm> {
        self.by_surname
            .get(&surname_key(surname))
            .map(|terms| terms.iter().filter(|t| t.serves_on(date)).collect())
            .unwrap_or_default()
    }

    pub fn legislator_count(&self) -> usize {
        self.legislator_count
    }

    pub fn term_count(&self) -> usize {
        self.by_surname.values().map(Vec::len).sum()
    }
}

/// How a single speaker lookup ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(SpeakerIdentity),
    /// Chair, clerk or unattributed text; no lookup performed
    NotApplicable,
    NotFound,
    /// Several distinct legislators fit; carries how many
    Ambiguous(usize),
}

impl Resolution {
    pub fn into_identity(self) -> SpeakerIdentity {
        match self {
            Resolution::Resolved(identity) => identity,
            _ => SpeakerIdentity::unknown(),
        }
    }
}

/// Result of Stage 2 resolution
#[derive(Debug, Clone)]
pub struct ResolutionResult {
    /// One resolved turn per input turn, same order
    pub turns: Vec<ResolvedTurn>,
    pub resolved: usize,
    pub not_found: usize,
    pub ambiguous: usize,
}

/// Resolve a speaker to a legislator serving on `date`
pub fn resolve_speaker(
    speaker: &Speaker,
    date: NaiveDate,
    registry: &LegislatorRegistry,
    config: &ResolverConfig,
) -> Resolution {
    let (surname, state) = match speaker {
        Speaker::Named { surname, state } => (surname, state),
        Speaker::Procedural { .. } | Speaker::Unattributed => return Resolution::NotApplicable,
    };

    let normalized = normalize_surname(surname);
    let mut candidates = registry.candidates(&normalized, date);

    if let Some(chamber) = config.chamber {
        candidates.retain(|t| t.chamber == chamber);
    }

    if let Some(state_name) = state {
        match state_code(state_name) {
            Some(code) => candidates.retain(|t| t.state.as_deref() == Some(code)),
            None => debug!("Unrecognized state qualifier {:?} for {}", state_name, normalized),
        }
    }

    // Several terms of one legislator count once
    let mut distinct: BTreeMap<&str, &LegislatorTerm> = BTreeMap::new();
    for term in candidates {
        distinct.entry(term.legislator_id.as_str()).or_insert(term);
    }

    match distinct.len() {
        0 => Resolution::NotFound,
        1 => {
            let term = distinct.values().next().copied();
            term.map_or(Resolution::NotFound, |t| Resolution::Resolved(t.identity()))
        }
        n => Resolution::Ambiguous(n),
    }
}

/// Perform Stage 2: attach an identity to every turn
///
/// Never drops a turn; anything that does not resolve cleanly gets the
/// Unknown identity.
pub fn resolve_turns(
    turns: Vec<Turn>,
    date: NaiveDate,
    registry: &LegislatorRegistry,
    config: &ResolverConfig,
) -> ResolutionResult {
    let mut resolved = 0;
    let mut not_found = 0;
    let mut ambiguous = 0;

    let turns = turns
        .into_iter()
        .map(|turn| {
            let resolution = resolve_speaker(&turn.speaker, date, registry, config);
            match &resolution {
                Resolution::Resolved(_) => resolved += 1,
                Resolution::NotFound => {
                    not_found += 1;
                    debug!("No legislator named {} serving on {}", turn.speaker, date);
                }
                Resolution::Ambiguous(n) => {
                    ambiguous += 1;
                    debug!(
                        "{} legislators named {} serving on {}; leaving unresolved",
                        n, turn.speaker, date
                    );
                }
                Resolution::NotApplicable => {}
            }
            ResolvedTurn {
                turn,
                identity: resolution.into_identity(),
            }
        })
        .collect();

    ResolutionResult {
        turns,
        resolved,
        not_found,
        ambiguous,
    }
}

/// Title-case an all-capitals surname ("McCAIN" stays, "SMITH" becomes "Smith")
pub fn normalize_surname(raw: &str) -> String {
    let cleaned = raw.trim().trim_matches(|c: char| c == '.' || c == ',');
    if cleaned.chars().any(char::is_lowercase) {
        return cleaned.to_string();
    }

    let mut out = String::with_capacity(cleaned.len());
    let mut word_start = true;
    for c in cleaned.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
        word_start = matches!(c, ' ' | '-' | '\'');
    }
    out
}

/// Case- and punctuation-insensitive lookup key
fn surname_key(surname: &str) -> String {
    surname
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_uppercase)
        .collect()
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Postal code for a state name as printed in a marker qualifier
fn state_code(name: &str) -> Option<&'static str> {
    const STATES: &[(&str, &str)] = &[
        ("Alabama", "AL"),
        ("Alaska", "AK"),
        ("Arizona", "AZ"),
        ("Arkansas", "AR"),
        ("California", "CA"),
        ("Colorado", "CO"),
        ("Connecticut", "CT"),
        ("Delaware", "DE"),
        ("Florida", "FL"),
        ("Georgia", "GA"),
        ("Hawaii", "HI"),
        ("Idaho", "ID"),
        ("Illinois", "IL"),
        ("Indiana", "IN"),
        ("Iowa", "IA"),
        ("Kansas", "KS"),
        ("Kentucky", "KY"),
        ("Louisiana", "LA"),
        ("Maine", "ME"),
        ("Maryland", "MD"),
        ("Massachusetts", "MA"),
        ("Michigan", "MI"),
        ("Minnesota", "MN"),
        ("Mississippi", "MS"),
        ("Missouri", "MO"),
        ("Montana", "MT"),
        ("Nebraska", "NE"),
        ("Nevada", "NV"),
        ("New Hampshire", "NH"),
        ("New Jersey", "NJ"),
        ("New Mexico", "NM"),
        ("New York", "NY"),
        ("North Carolina", "NC"),
        ("North Dakota", "ND"),
        ("Ohio", "OH"),
        ("Oklahoma", "OK"),
        ("Oregon", "OR"),
        ("Pennsylvania", "PA"),
        ("Rhode Island", "RI"),
        ("South Carolina", "SC"),
        ("South Dakota", "SD"),
        ("Tennessee", "TN"),
        ("Texas", "TX"),
        ("Utah", "UT"),
        ("Vermont", "VT"),
        ("Virginia", "VA"),
        ("Washington", "WA"),
        ("West Virginia", "WV"),
        ("Wisconsin", "WI"),
        ("Wyoming", "WY"),
    ];

    STATES
        .iter()
        .find(|(state, _)| state.eq_ignore_ascii_case(name.trim()))
        .map(|(_, code)| *code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn term(id: &str, name: &str, surname: &str, party: Party, state: &str) -> LegislatorTerm {
        LegislatorTerm {
            legislator_id: id.to_string(),
            canonical_name: name.to_string(),
            surname: surname.to_string(),
            party,
            chamber: Chamber::Senate,
            state: Some(state.to_string()),
            term_start: date(1985, 1, 3),
            term_end: date(1991, 1, 3),
        }
    }

    fn registry() -> LegislatorRegistry {
        let mut terms = vec![
            term("B001210", "Robert C. Byrd", "Byrd", Party::Democrat, "WV"),
            term("S000522", "Robert Smith", "Smith", Party::Republican, "NH"),
            term("S000999", "Gordon Smith", "Smith", Party::Republican, "OR"),
            term("M000303", "John McCain", "McCain", Party::Republican, "AZ"),
        ];
        // Byrd's next term touches the previous one on Jan 3
        let mut next = term("B001210", "Robert C. Byrd", "Byrd", Party::Democrat, "WV");
        next.term_start = date(1991, 1, 3);
        next.term_end = date(1997, 1, 3);
        terms.push(next);
        LegislatorRegistry::from_terms(terms)
    }

    #[test]
    fn test_resolve_unique_surname() {
        let identity = resolve_speaker(
            &Speaker::named("BYRD"),
            date(1991, 1, 10),
            &registry(),
            &ResolverConfig::default(),
        )
        .into_identity();

        assert_eq!(identity.canonical_name.as_deref(), Some("Robert C. Byrd"));
        assert_eq!(identity.party, Party::Democrat);
        assert_eq!(identity.chamber, Chamber::Senate);
    }

    #[test]
    fn test_overlapping_terms_of_one_legislator_count_once() {
        let resolution = resolve_speaker(
            &Speaker::named("BYRD"),
            date(1991, 1, 3),
            &registry(),
            &ResolverConfig::default(),
        );
        assert!(matches!(resolution, Resolution::Resolved(_)));
    }

    #[test]
    fn test_ambiguous_surname_is_unknown() {
        let resolution = resolve_speaker(
            &Speaker::named("SMITH"),
            date(1990, 6, 1),
            &registry(),
            &ResolverConfig::default(),
        );

        assert_eq!(resolution, Resolution::Ambiguous(2));
        assert_eq!(resolution.into_identity(), SpeakerIdentity::unknown());
    }

    #[test]
    fn test_state_qualifier_disambiguates() {
        let speaker = Speaker::Named {
            surname: "SMITH".to_string(),
            state: Some("New Hampshire".to_string()),
        };
        let identity = resolve_speaker(&speaker, date(1990, 6, 1), &registry(), &ResolverConfig::default())
            .into_identity();

        assert_eq!(identity.canonical_name.as_deref(), Some("Robert Smith"));
    }

    #[test]
    fn test_out_of_term_and_missing_are_not_found() {
        let registry = registry();
        let config = ResolverConfig::default();

        assert_eq!(
            resolve_speaker(&Speaker::named("McCAIN"), date(1992, 1, 1), &registry, &config),
            Resolution::NotFound
        );
        assert_eq!(
            resolve_speaker(&Speaker::named("NOBODY"), date(1990, 1, 1), &registry, &config),
            Resolution::NotFound
        );
        assert!(matches!(
            resolve_speaker(&Speaker::named("McCAIN"), date(1990, 1, 1), &registry, &config),
            Resolution::Resolved(_)
        ));
    }

    #[test]
    fn test_procedural_and_unattributed_skip_lookup() {
        let registry = registry();
        let config = ResolverConfig::default();

        assert_eq!(
            resolve_speaker(&Speaker::procedural("PRESIDING OFFICER"), date(1990, 1, 1), &registry, &config),
            Resolution::NotApplicable
        );
        assert_eq!(
            resolve_speaker(&Speaker::Unattributed, date(1990, 1, 1), &registry, &config),
            Resolution::NotApplicable
        );
    }

    #[test]
    fn test_chamber_restriction() {
        let config = ResolverConfig {
            chamber: Some(Chamber::House),
        };
        let resolution = resolve_speaker(&Speaker::named("BYRD"), date(1991, 1, 10), &registry(), &config);
        assert_eq!(resolution, Resolution::NotFound);
    }

    #[test]
    fn test_resolve_turns_keeps_every_turn() {
        let turns = vec![
            Turn {
                speaker: Speaker::Unattributed,
                text: "The Senate met.".to_string(),
                page_range: (1, 1),
            },
            Turn {
                speaker: Speaker::named("SMITH"),
                text: "I object.".to_string(),
                page_range: (1, 1),
            },
            Turn {
                speaker: Speaker::named("BYRD"),
                text: "I yield.".to_string(),
                page_range: (1, 2),
            },
        ];

        let result = resolve_turns(turns, date(1990, 6, 1), &registry(), &ResolverConfig::default());

        assert_eq!(result.turns.len(), 3);
        assert_eq!(result.resolved, 1);
        assert_eq!(result.ambiguous, 1);
        assert_eq!(result.not_found, 0);
        assert!(result.turns[1].identity.is_unknown());
        assert_eq!(result.turns[2].identity.party, Party::Democrat);
    }

    #[test]
    fn test_normalize_surname() {
        assert_eq!(normalize_surname("SMITH"), "Smith");
        assert_eq!(normalize_surname("D'AMATO"), "D'Amato");
        assert_eq!(normalize_surname("McCAIN"), "McCAIN");
        assert_eq!(surname_key("McCAIN"), surname_key("McCain"));
        assert_eq!(surname_key("D'AMATO"), "DAMATO");
    }

    #[test]
    fn test_registry_from_entries() {
        let json = r#"[
            {"id": {"bioguide": "K000148"}, "name": {"first": "John", "last": "Kerry", "official_full": "John F. Kerry"},
             "terms": [{"type": "sen", "start": "1985-01-03", "end": "1991-01-03", "state": "MA", "party": "Democrat"},
                       {"type": "sen", "start": "1991-01-03", "end": "bogus", "state": "MA", "party": "Democrat"}]}
        ]"#;
        let entries: Vec<LegislatorEntry> = serde_json::from_str(json).unwrap();
        let registry = LegislatorRegistry::from_entries(entries);

        assert_eq!(registry.legislator_count(), 1);
        assert_eq!(registry.term_count(), 1);
        assert_eq!(registry.candidates("KERRY", date(1990, 1, 1)).len(), 1);
    }
}
