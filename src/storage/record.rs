//! Uniform CRUD access to every stored entity, so callers can be written once
//! per operation instead of once per table.

use super::SqliteStore;
use crate::model::{Character, Location, LoreEntry, Manuscript, Story, TimelineEvent};
use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human name used in error messages ("Character 4 not found")
    const NAME: &'static str;

    fn id(&self) -> i64;

    /// Reject records that cannot be stored.
    fn validate(&self) -> Result<()>;

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self>;
    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>>;
    fn list(store: &SqliteStore, story_id: Option<i64>) -> Result<Vec<Self>>;
    fn update(store: &SqliteStore, record: &Self) -> Result<()>;
    fn delete(store: &SqliteStore, id: i64) -> Result<()>;

    /// Load by id or fail with `NotFound`.
    fn fetch(store: &SqliteStore, id: i64) -> Result<Self> {
        Self::get(store, id)?.ok_or_else(|| Error::NotFound(format!("{} {}", Self::NAME, id)))
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::InvalidInput(format!("{} is required", field)));
    }
    Ok(())
}

fn require_story(story_id: i64) -> Result<()> {
    if story_id <= 0 {
        return Err(Error::InvalidInput("story_id is required".to_string()));
    }
    Ok(())
}

impl Record for Story {
    const NAME: &'static str = "Story";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require(&self.title, "title")
    }

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self> {
        store.insert_story(record)
    }

    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>> {
        store.get_story(id)
    }

    /// Stories have no parent; the filter is ignored.
    fn list(store: &SqliteStore, _story_id: Option<i64>) -> Result<Vec<Self>> {
        store.list_stories()
    }

    fn update(store: &SqliteStore, record: &Self) -> Result<()> {
        store.update_story(record)
    }

    fn delete(store: &SqliteStore, id: i64) -> Result<()> {
        store.delete_story(id)
    }
}

impl Record for Character {
    const NAME: &'static str = "Character";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require_story(self.story_id)?;
        require(&self.name, "name")?;
        match self.importance {
            Some(importance) if !(1..=10).contains(&importance) => Err(Error::InvalidInput(format!(
                "importance must be between 1 and 10, got {}",
                importance
            ))),
            _ => Ok(()),
        }
    }

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self> {
        store.insert_character(record)
    }

    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>> {
        store.get_character(id)
    }

    fn list(store: &SqliteStore, story_id: Option<i64>) -> Result<Vec<Self>> {
        store.list_characters(story_id)
    }

    fn update(store: &SqliteStore, record: &Self) -> Result<()> {
        store.update_character(record)
    }

    fn delete(store: &SqliteStore, id: i64) -> Result<()> {
        store.delete_character(id)
    }
}

impl Record for Location {
    const NAME: &'static str = "Location";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require_story(self.story_id)?;
        require(&self.name, "name")
    }

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self> {
        store.insert_location(record)
    }

    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>> {
        store.get_location(id)
    }

    fn list(store: &SqliteStore, story_id: Option<i64>) -> Result<Vec<Self>> {
        store.list_locations(story_id)
    }

    fn update(store: &SqliteStore, record: &Self) -> Result<()> {
        store.update_location(record)
    }

    fn delete(store: &SqliteStore, id: i64) -> Result<()> {
        store.delete_location(id)
    }
}

impl Record for LoreEntry {
    const NAME: &'static str = "Lore entry";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require_story(self.story_id)?;
        require(&self.title, "title")
    }

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self> {
        store.insert_lore(record)
    }

    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>> {
        store.get_lore(id)
    }

    fn list(store: &SqliteStore, story_id: Option<i64>) -> Result<Vec<Self>> {
        store.list_lore(story_id)
    }

    fn update(store: &SqliteStore, record: &Self) -> Result<()> {
        store.update_lore(record)
    }

    fn delete(store: &SqliteStore, id: i64) -> Result<()> {
        store.delete_lore(id)
    }
}

impl Record for TimelineEvent {
    const NAME: &'static str = "Event";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require_story(self.story_id)?;
        require(&self.title, "title")
    }

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self> {
        store.insert_event(record)
    }

    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>> {
        store.get_event(id)
    }

    /// A timeline only makes sense within one story.
    fn list(store: &SqliteStore, story_id: Option<i64>) -> Result<Vec<Self>> {
        let story_id =
            story_id.ok_or_else(|| Error::InvalidInput("story_id query parameter is required".to_string()))?;
        store.list_events(story_id)
    }

    fn update(store: &SqliteStore, record: &Self) -> Result<()> {
        store.update_event(record)
    }

    fn delete(store: &SqliteStore, id: i64) -> Result<()> {
        store.delete_event(id)
    }
}

impl Record for Manuscript {
    const NAME: &'static str = "Manuscript";

    fn id(&self) -> i64 {
        self.id
    }

    fn validate(&self) -> Result<()> {
        require_story(self.story_id)?;
        require(&self.title, "title")
    }

    fn insert(store: &SqliteStore, record: &Self) -> Result<Self> {
        store.insert_manuscript(record)
    }

    fn get(store: &SqliteStore, id: i64) -> Result<Option<Self>> {
        store.get_manuscript(id)
    }

    fn list(store: &SqliteStore, story_id: Option<i64>) -> Result<Vec<Self>> {
        store.list_manuscripts(story_id)
    }

    fn update(store: &SqliteStore, record: &Self) -> Result<()> {
        store.update_manuscript(record)
    }

    fn delete(store: &SqliteStore, id: i64) -> Result<()> {
        store.delete_manuscript(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(Story::default().validate().is_err());
        let orphan = Character {
            name: "Anna".to_string(),
            ..Default::default()
        };
        assert!(matches!(orphan.validate(), Err(Error::InvalidInput(_))));
        let nameless = Character {
            story_id: 1,
            name: "  ".to_string(),
            ..Default::default()
        };
        assert!(nameless.validate().is_err());
    }

    #[test]
    fn test_character_importance_range() {
        let with_importance = |importance| Character {
            story_id: 1,
            name: "Anna".to_string(),
            importance,
            ..Default::default()
        };
        assert!(with_importance(None).validate().is_ok());
        assert!(with_importance(Some(1)).validate().is_ok());
        assert!(with_importance(Some(10)).validate().is_ok());
        assert!(matches!(with_importance(Some(0)).validate(), Err(Error::InvalidInput(_))));
        match with_importance(Some(200)).validate() {
            Err(Error::InvalidInput(msg)) => assert_eq!(msg, "importance must be between 1 and 10, got 200"),
            other => panic!("unexpected: {:?}", other.is_ok()),
        }
    }

    #[test]
    fn test_fetch_missing() {
        let store = SqliteStore::open_in_memory().unwrap();
        match Manuscript::fetch(&store, 7) {
            Err(Error::NotFound(what)) => assert_eq!(what, "Manuscript 7"),
            other => panic!("unexpected: {:?}", other.map(|m| m.id)),
        }
    }

    #[test]
    fn test_timeline_list_needs_story() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(TimelineEvent::list(&store, None), Err(Error::InvalidInput(_))));
    }
}
