//! Story bible entities
//!
//! One canonical shape per entity. These are plain data records: the store
//! owns them, the checker and analyzers only read them.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A story: the root every other entity hangs off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub blurb: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

/// A character sheet.
///
/// Only `name` is required. Dates are kept as the strings the author typed;
/// they are parsed (and possibly rejected) by whoever needs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub id: i64,
    pub story_id: i64,
    pub name: String,
    pub surname: Option<String>,
    pub nickname: Option<String>,
    /// Narrative role: protagonist, antagonist, supporting, minor
    pub role: Option<String>,
    /// Archetype: hero, mentor, ally, shadow, trickster...
    pub archetype: Option<String>,
    /// How central the character is, 1-10
    pub importance: Option<u8>,
    pub age: Option<u32>,
    pub born: Option<String>,
    pub died: Option<String>,
    pub occupation: Option<String>,
    pub social_class: Option<String>,
    pub physical_description: Option<String>,
    pub personality: Option<String>,
    pub backstory: Option<String>,
    pub desires: Option<String>,
    pub fears: Option<String>,
    pub internal_conflict: Option<String>,
    pub strengths: Option<String>,
    pub weaknesses: Option<String>,
    pub character_arc: Option<String>,
    pub notes: Option<String>,
}

/// A place where events happen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub story_id: i64,
    pub name: String,
    /// City, region, planet, building...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

/// World-building entry: magic systems, factions, history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoreEntry {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub story_id: i64,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// An entry on the story timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub story_id: i64,
    pub title: String,
    /// Expected as `YYYY-MM-DD`
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub location_id: Option<i64>,
    /// Characters present at the event. Order carries no meaning.
    #[serde(rename = "characters", default)]
    pub character_ids: Vec<i64>,
}

/// A chapter of prose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manuscript {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub story_id: i64,
    pub title: String,
    #[serde(default = "default_chapter")]
    pub chapter: u32,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_chapter() -> u32 {
    1
}

fn default_status() -> String {
    "draft".to_string()
}

impl Default for Manuscript {
    fn default() -> Self {
        Self {
            id: 0,
            story_id: 0,
            title: String::new(),
            chapter: default_chapter(),
            text: None,
            status: default_status(),
        }
    }
}

/// The slice of a story the consistency checker works on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorySnapshot {
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub events: Vec<TimelineEvent>,
}

/// True when the field holds something other than whitespace.
pub fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Apply a partial JSON update to a record.
///
/// Keys present in `patch` replace the current values; `id` and `story_id`
/// are never changed.
pub fn apply_patch<T>(current: &T, patch: &Value) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let patch = patch
        .as_object()
        .ok_or_else(|| Error::InvalidInput("update body must be a JSON object".to_string()))?;

    let mut merged = serde_json::to_value(current)?;
    if let Some(fields) = merged.as_object_mut() {
        for (key, value) in patch {
            if key == "id" || key == "story_id" {
                continue;
            }
            fields.insert(key.clone(), value.clone());
        }
    }

    serde_json::from_value(merged).map_err(|e| Error::InvalidInput(e.to_string()))
}

/// Character fields holding free text.
const CHARACTER_TEXT_FIELDS: &[&str] = &[
    "surname",
    "nickname",
    "role",
    "archetype",
    "born",
    "died",
    "occupation",
    "social_class",
    "physical_description",
    "personality",
    "backstory",
    "desires",
    "fears",
    "internal_conflict",
    "strengths",
    "weaknesses",
    "character_arc",
    "notes",
];

fn as_object(value: Value, what: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::InvalidInput(format!("{} must be an object, got {}", what, other))),
    }
}

fn drop_unless(map: &mut Map<String, Value>, key: &str, keep: impl Fn(&Value) -> bool) {
    if map.get(key).is_some_and(|v| !v.is_null() && !keep(v)) {
        if let Some(value) = map.remove(key) {
            tracing::debug!("Ignoring malformed {} value {}", key, value);
        }
    }
}

impl Character {
    /// Decode a character from loosely typed JSON.
    ///
    /// Optional fields of the wrong type are treated as absent: an `age`
    /// that is not a non-negative integer counts as undeclared, and a
    /// non-string `born` or `died` is ignored.
    pub fn from_loose(value: Value) -> Result<Self> {
        let mut map = as_object(value, "character")?;
        drop_unless(&mut map, "age", |v| v.as_u64().is_some_and(|n| u32::try_from(n).is_ok()));
        drop_unless(&mut map, "importance", |v| v.as_u64().is_some_and(|n| u8::try_from(n).is_ok()));
        for field in CHARACTER_TEXT_FIELDS {
            drop_unless(&mut map, field, Value::is_string);
        }
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

impl TimelineEvent {
    /// Decode an event from loosely typed JSON.
    ///
    /// A non-string `date` is kept as its JSON text so it reads as an
    /// unparseable date. A missing `title` becomes empty.
    pub fn from_loose(value: Value) -> Result<Self> {
        let mut map = as_object(value, "event")?;
        if let Some(date) = map.get_mut("date") {
            if !date.is_null() && !date.is_string() {
                *date = Value::String(date.to_string());
            }
        }
        map.entry("title").or_insert_with(|| Value::String(String::new()));
        drop_unless(&mut map, "summary", Value::is_string);
        drop_unless(&mut map, "location_id", Value::is_i64);
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_characters_field_name() {
        let event: TimelineEvent = serde_json::from_value(json!({
            "id": 1,
            "title": "War begins",
            "date": "1995-06-15",
            "characters": [1, 2]
        }))
        .unwrap();
        assert_eq!(event.character_ids, vec![1, 2]);

        let back = serde_json::to_value(&event).unwrap();
        assert_eq!(back["characters"], json!([1, 2]));
    }

    #[test]
    fn test_character_null_age() {
        let character: Character =
            serde_json::from_value(json!({"id": 1, "name": "Anna Smith", "age": null})).unwrap();
        assert_eq!(character.age, None);
        assert_eq!(character.name, "Anna Smith");
    }

    #[test]
    fn test_has_text() {
        assert!(has_text(&Some("brave".to_string())));
        assert!(!has_text(&Some("   ".to_string())));
        assert!(!has_text(&None));
    }

    #[test]
    fn test_apply_patch_keeps_identity() {
        let story = Story {
            id: 4,
            title: "Draft".to_string(),
            ..Default::default()
        };

        let updated = apply_patch(&story, &json!({"id": 99, "title": "Final", "genre": "noir"})).unwrap();
        assert_eq!(updated.id, 4);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.genre.as_deref(), Some("noir"));
    }

    #[test]
    fn test_apply_patch_rejects_non_object() {
        let story = Story::default();
        assert!(matches!(apply_patch(&story, &json!([1, 2])), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_location_type_field() {
        let location: Location =
            serde_json::from_value(json!({"name": "Paris", "type": "city"})).unwrap();
        assert_eq!(location.kind.as_deref(), Some("city"));
    }

    #[test]
    fn test_character_from_loose_drops_malformed_fields() {
        let character = Character::from_loose(json!({
            "id": 3,
            "name": "Jean Dupont",
            "age": "thirty",
            "born": 2000,
            "died": "2080-01-01",
            "occupation": ["sailor"]
        }))
        .unwrap();
        assert_eq!(character.name, "Jean Dupont");
        assert_eq!(character.age, None);
        assert_eq!(character.born, None);
        assert_eq!(character.died.as_deref(), Some("2080-01-01"));
        assert_eq!(character.occupation, None);

        let negative = Character::from_loose(json!({"id": 4, "name": "Tom", "age": -3})).unwrap();
        assert_eq!(negative.age, None);
        let valid = Character::from_loose(json!({"id": 5, "name": "Anna", "age": 30})).unwrap();
        assert_eq!(valid.age, Some(30));
    }

    #[test]
    fn test_character_from_loose_rejects_non_object() {
        assert!(matches!(Character::from_loose(json!("Anna")), Err(Error::InvalidInput(_))));
        assert!(Character::from_loose(json!({"id": 1, "name": 7})).is_err());
    }

    #[test]
    fn test_event_from_loose_stringifies_date() {
        let event = TimelineEvent::from_loose(json!({"id": 2, "date": 19950615, "characters": [1]})).unwrap();
        assert_eq!(event.date.as_deref(), Some("19950615"));
        assert_eq!(event.title, "");
        assert_eq!(event.character_ids, vec![1]);

        let event = TimelineEvent::from_loose(json!({"id": 3, "title": "Calm", "date": null})).unwrap();
        assert_eq!(event.date, None);
    }
}
