//! Consistency Checker - contradictions and hints over a story snapshot
//!
//! Everything here is a pure function of its inputs:
//! - `timeline`: characters placed at events they cannot attend
//! - `relationship`: pairwise relationship hints between characters
//! - `arc`: completeness score and development hints for one character
//!
//! Problems found in the data are returned as typed entries, never as errors.

pub mod arc;
pub mod relationship;
pub mod timeline;

pub use arc::{ArcIssue, ArcReport, DevelopmentHint, HintCategory};
pub use relationship::{RelationshipKind, RelationshipSuggestion};
pub use timeline::{Conflict, ConflictKind};

use crate::model::{Character, StorySnapshot, TimelineEvent};
use crate::nlp::TextSimilarity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tunable thresholds for the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Allowed gap, in years, between a stated age and the age computed at an event.
    pub age_tolerance_years: u32,
    /// Largest age difference for which two characters count as peers.
    pub peer_age_gap: u32,
    /// Strengths/weaknesses similarity above which they are flagged as redundant.
    pub similarity_threshold: f32,
    /// Importance from which a "minor" role is flagged.
    pub major_importance: u8,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            age_tolerance_years: 5,
            peer_age_gap: 5,
            similarity_threshold: 0.7,
            major_importance: 8,
        }
    }
}

/// Combined output for a whole story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub conflicts: Vec<Conflict>,
    pub suggestions: Vec<RelationshipSuggestion>,
}

/// The consistency checker.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyChecker {
    config: CheckerConfig,
}

impl ConsistencyChecker {
    pub fn new(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Find characters placed at events before their birth, after their
    /// death, or at an age far from the one on their sheet.
    pub fn check_timeline_consistency(
        &self,
        events: &[TimelineEvent],
        characters: &[Character],
    ) -> Vec<Conflict> {
        timeline::check_timeline(events, characters, &self.config)
    }

    /// Suggest family, peer, professional and social links between characters.
    pub fn suggest_relationships(&self, characters: &[Character]) -> Vec<RelationshipSuggestion> {
        relationship::suggest_relationships(characters, &self.config)
    }

    /// Score how complete a character's arc is.
    pub fn analyze_character_arc_coherence<S: TextSimilarity + ?Sized>(
        &self,
        character: &Character,
        similarity: &S,
    ) -> ArcReport {
        arc::analyze_arc(character, similarity, &self.config)
    }

    /// Propose directions to develop a character further.
    pub fn suggest_character_development(&self, character: &Character) -> Vec<DevelopmentHint> {
        arc::suggest_development(character)
    }

    /// Run both the timeline check and the relationship rules over a snapshot.
    pub fn check_snapshot(&self, snapshot: &StorySnapshot) -> ConsistencyReport {
        let conflicts = self.check_timeline_consistency(&snapshot.events, &snapshot.characters);
        let suggestions = self.suggest_relationships(&snapshot.characters);
        tracing::info!(
            "Checked {} events and {} characters: {} conflicts, {} suggestions",
            snapshot.events.len(),
            snapshot.characters.len(),
            conflicts.len(),
            suggestions.len()
        );
        ConsistencyReport { conflicts, suggestions }
    }
}

/// Parse a strict `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let bytes = value.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(parse_date("1995-06-15"), NaiveDate::from_ymd_opt(1995, 6, 15));
        assert_eq!(parse_date(" 2000-01-01 "), NaiveDate::from_ymd_opt(2000, 1, 1));
        assert!(parse_date("1995-6-15").is_none());
        assert!(parse_date("15/06/1995").is_none());
        assert!(parse_date("1995-02-30").is_none());
        assert!(parse_date("1995-06-15T10:00:00").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_check_snapshot_combines_both() {
        let snapshot = StorySnapshot {
            characters: vec![
                Character {
                    id: 1,
                    name: "Jean Dupont".to_string(),
                    born: Some("2000-01-01".to_string()),
                    ..Default::default()
                },
                Character {
                    id: 2,
                    name: "Marie Dupont".to_string(),
                    ..Default::default()
                },
            ],
            events: vec![TimelineEvent {
                id: 1,
                title: "War begins".to_string(),
                date: Some("1995-06-15".to_string()),
                character_ids: vec![1],
                ..Default::default()
            }],
        };

        let report = ConsistencyChecker::default().check_snapshot(&snapshot);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.suggestions.len(), 1);
        assert_eq!(report.suggestions[0].kind, RelationshipKind::Family);
    }

    #[test]
    fn test_idempotent() {
        let checker = ConsistencyChecker::default();
        let characters = vec![
            Character {
                id: 1,
                name: "Ada Byron".to_string(),
                age: Some(30),
                born: Some("1900-01-01".to_string()),
                died: Some("1950-01-01".to_string()),
                ..Default::default()
            },
            Character {
                id: 2,
                name: "Lord Byron".to_string(),
                age: Some(33),
                ..Default::default()
            },
        ];
        let events = vec![
            TimelineEvent {
                id: 1,
                title: "Ball".to_string(),
                date: Some("1960-01-01".to_string()),
                character_ids: vec![1, 2],
                ..Default::default()
            },
            TimelineEvent {
                id: 2,
                title: "Storm".to_string(),
                date: Some("sometime".to_string()),
                character_ids: vec![1],
                ..Default::default()
            },
        ];

        assert_eq!(
            checker.check_timeline_consistency(&events, &characters),
            checker.check_timeline_consistency(&events, &characters)
        );
        assert_eq!(
            checker.suggest_relationships(&characters),
            checker.suggest_relationships(&characters)
        );
    }
}
