//! Timeline conflicts
//!
//! Walks every dated event and compares it against the birth date, death
//! date and stated age of each character attending it.

use super::{parse_date, CheckerConfig, Severity};
use crate::model::{Character, TimelineEvent};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kinds of timeline contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    /// Character attends an event dated before their birth
    BornAfterEvent,
    /// Character attends an event dated after their death
    PresentAfterDeath,
    /// Stated age is far from the age computed at the event
    AgeInconsistency,
    /// Event date is not a `YYYY-MM-DD` date
    InvalidDate,
}

impl ConflictKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::BornAfterEvent => "born_after_event",
            ConflictKind::PresentAfterDeath => "present_after_death",
            ConflictKind::AgeInconsistency => "age_inconsistency",
            ConflictKind::InvalidDate => "invalid_date",
        }
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected contradiction between character data and event placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub died_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stated_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_age: Option<i64>,
    pub message: String,
}

impl Conflict {
    fn for_event(kind: ConflictKind, severity: Severity, event: &TimelineEvent, message: String) -> Self {
        Self {
            kind,
            severity,
            event_id: Some(event.id),
            event_title: Some(event.title.clone()),
            event_date: event.date.clone(),
            character_id: None,
            character_name: None,
            born_date: None,
            died_date: None,
            stated_age: None,
            computed_age: None,
            message,
        }
    }

    fn for_attendance(
        kind: ConflictKind,
        severity: Severity,
        event: &TimelineEvent,
        character: &Character,
        message: String,
    ) -> Self {
        Self {
            character_id: Some(character.id),
            character_name: Some(character.name.clone()),
            ..Self::for_event(kind, severity, event, message)
        }
    }
}

/// Check every dated event against the characters attending it.
///
/// Conflicts come out in discovery order: events in input order, then
/// characters in the order the event lists them.
pub fn check_timeline(
    events: &[TimelineEvent],
    characters: &[Character],
    config: &CheckerConfig,
) -> Vec<Conflict> {
    let mut by_id: HashMap<i64, &Character> = HashMap::with_capacity(characters.len());
    for character in characters {
        by_id.entry(character.id).or_insert(character);
    }

    let mut conflicts = Vec::new();

    for event in events {
        let Some(raw_date) = event.date.as_deref().filter(|d| !d.trim().is_empty()) else {
            continue;
        };

        let Some(event_date) = parse_date(raw_date) else {
            conflicts.push(Conflict::for_event(
                ConflictKind::InvalidDate,
                Severity::Error,
                event,
                format!("Invalid date: {}", raw_date),
            ));
            continue;
        };

        for character_id in &event.character_ids {
            let Some(character) = by_id.get(character_id) else {
                tracing::debug!("Event {} references unknown character {}", event.id, character_id);
                continue;
            };
            check_attendance(event, event_date, character, config, &mut conflicts);
        }
    }

    conflicts
}

fn check_attendance(
    event: &TimelineEvent,
    event_date: NaiveDate,
    character: &Character,
    config: &CheckerConfig,
    conflicts: &mut Vec<Conflict>,
) {
    let born = character_date(character, "born", character.born.as_deref());
    let died = character_date(character, "died", character.died.as_deref());

    if let Some(born) = born {
        if born > event_date {
            let mut conflict = Conflict::for_attendance(
                ConflictKind::BornAfterEvent,
                Severity::Error,
                event,
                character,
                format!("{} is present at {} but born after", character.name, event.title),
            );
            conflict.born_date = character.born.clone();
            conflicts.push(conflict);
        }
    }

    if let Some(died) = died {
        if died < event_date {
            let mut conflict = Conflict::for_attendance(
                ConflictKind::PresentAfterDeath,
                Severity::Error,
                event,
                character,
                format!("{} is present at {} but died before", character.name, event.title),
            );
            conflict.died_date = character.died.clone();
            conflicts.push(conflict);
        }
    }

    if let (Some(born), Some(age)) = (born, character.age) {
        // 365-day years: ages are coarse story metadata
        let age_at_event = (event_date - born).num_days().div_euclid(365);
        if (age_at_event - i64::from(age)).abs() > i64::from(config.age_tolerance_years) {
            let mut conflict = Conflict::for_attendance(
                ConflictKind::AgeInconsistency,
                Severity::Warning,
                event,
                character,
                format!(
                    "Recorded age: {}, computed age at {}: {}",
                    age, event.title, age_at_event
                ),
            );
            conflict.born_date = character.born.clone();
            conflict.stated_age = Some(age);
            conflict.computed_age = Some(age_at_event);
            conflicts.push(conflict);
        }
    }
}

/// Parse a birth or death date, ignoring it when malformed.
fn character_date(character: &Character, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.filter(|d| !d.trim().is_empty())?;
    let parsed = parse_date(raw);
    if parsed.is_none() {
        tracing::warn!(
            "Ignoring unparseable {} date {:?} for character {} ({})",
            field,
            raw,
            character.id,
            character.name
        );
    }
    parsed
}
