//! SQLite storage implementation

use super::schema;
use crate::model::{Character, Location, LoreEntry, Manuscript, Story, StorySnapshot, TimelineEvent};
use crate::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const CHARACTER_COLUMNS: &str = "id, story_id, name, surname, nickname, role, archetype, importance, age, \
     born, died, occupation, social_class, physical_description, personality, backstory, desires, fears, \
     internal_conflict, strengths, weaknesses, character_arc, notes";

/// SQLite-backed storage for story bibles
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON")?;
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    fn require_story(&self, story_id: i64) -> Result<()> {
        if self.get_story(story_id)?.is_none() {
            return Err(Error::NotFound(format!("Story {}", story_id)));
        }
        Ok(())
    }

    fn expect_changed(changed: usize, what: &str, id: i64) -> Result<()> {
        if changed == 0 {
            return Err(Error::NotFound(format!("{} {}", what, id)));
        }
        Ok(())
    }

    // ========== Story Operations ==========

    /// Insert a story, returning it with its new id
    pub fn insert_story(&self, story: &Story) -> Result<Story> {
        self.conn.execute(
            "INSERT INTO stories (title, synopsis, blurb, genre) VALUES (?1, ?2, ?3, ?4)",
            params![story.title, story.synopsis, story.blurb, story.genre],
        )?;
        Ok(Story {
            id: self.conn.last_insert_rowid(),
            ..story.clone()
        })
    }

    pub fn get_story(&self, id: i64) -> Result<Option<Story>> {
        self.conn
            .query_row(
                "SELECT id, title, synopsis, blurb, genre FROM stories WHERE id = ?1",
                [id],
                row_to_story,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_stories(&self) -> Result<Vec<Story>> {
        let mut stmt = self.conn.prepare("SELECT id, title, synopsis, blurb, genre FROM stories ORDER BY id")?;
        let stories = stmt.query_map([], row_to_story)?.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(stories)
    }

    pub fn update_story(&self, story: &Story) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE stories SET title = ?2, synopsis = ?3, blurb = ?4, genre = ?5 WHERE id = ?1",
            params![story.id, story.title, story.synopsis, story.blurb, story.genre],
        )?;
        Self::expect_changed(changed, "Story", story.id)
    }

    /// Delete a story and everything that belongs to it
    pub fn delete_story(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM stories WHERE id = ?1", [id])?;
        Self::expect_changed(changed, "Story", id)
    }

    // ========== Character Operations ==========

    pub fn insert_character(&self, character: &Character) -> Result<Character> {
        self.require_story(character.story_id)?;
        self.conn.execute(
            r#"
            INSERT INTO characters (story_id, name, surname, nickname, role, archetype, importance, age,
                born, died, occupation, social_class, physical_description, personality, backstory,
                desires, fears, internal_conflict, strengths, weaknesses, character_arc, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
            "#,
            params![
                character.story_id,
                character.name,
                character.surname,
                character.nickname,
                character.role,
                character.archetype,
                character.importance,
                character.age,
                character.born,
                character.died,
                character.occupation,
                character.social_class,
                character.physical_description,
                character.personality,
                character.backstory,
                character.desires,
                character.fears,
                character.internal_conflict,
                character.strengths,
                character.weaknesses,
                character.character_arc,
                character.notes,
            ],
        )?;
        Ok(Character {
            id: self.conn.last_insert_rowid(),
            ..character.clone()
        })
    }

    pub fn get_character(&self, id: i64) -> Result<Option<Character>> {
        let sql = format!("SELECT {} FROM characters WHERE id = ?1", CHARACTER_COLUMNS);
        self.conn.query_row(&sql, [id], row_to_character).optional().map_err(Into::into)
    }

    /// List characters, optionally restricted to one story
    pub fn list_characters(&self, story_id: Option<i64>) -> Result<Vec<Character>> {
        let characters = match story_id {
            Some(story_id) => {
                let sql = format!("SELECT {} FROM characters WHERE story_id = ?1 ORDER BY id", CHARACTER_COLUMNS);
                let mut stmt = self.conn.prepare(&sql)?;
                stmt.query_map([story_id], row_to_character)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!("SELECT {} FROM characters ORDER BY id", CHARACTER_COLUMNS);
                let mut stmt = self.conn.prepare(&sql)?;
                stmt.query_map([], row_to_character)?
                    .collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        Ok(characters)
    }

    pub fn update_character(&self, character: &Character) -> Result<()> {
        let changed = self.conn.execute(
            r#"
            UPDATE characters SET name = ?2, surname = ?3, nickname = ?4, role = ?5, archetype = ?6,
                importance = ?7, age = ?8, born = ?9, died = ?10, occupation = ?11, social_class = ?12,
                physical_description = ?13, personality = ?14, backstory = ?15, desires = ?16, fears = ?17,
                internal_conflict = ?18, strengths = ?19, weaknesses = ?20, character_arc = ?21, notes = ?22
            WHERE id = ?1
            "#,
            params![
                character.id,
                character.name,
                character.surname,
                character.nickname,
                character.role,
                character.archetype,
                character.importance,
                character.age,
                character.born,
                character.died,
                character.occupation,
                character.social_class,
                character.physical_description,
                character.personality,
                character.backstory,
                character.desires,
                character.fears,
                character.internal_conflict,
                character.strengths,
                character.weaknesses,
                character.character_arc,
                character.notes,
            ],
        )?;
        Self::expect_changed(changed, "Character", character.id)
    }

    pub fn delete_character(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM characters WHERE id = ?1", [id])?;
        Self::expect_changed(changed, "Character", id)
    }

    // ========== Location Operations ==========

    pub fn insert_location(&self, location: &Location) -> Result<Location> {
        self.require_story(location.story_id)?;
        self.conn.execute(
            "INSERT INTO locations (story_id, name, kind, summary) VALUES (?1, ?2, ?3, ?4)",
            params![location.story_id, location.name, location.kind, location.summary],
        )?;
        Ok(Location {
            id: self.conn.last_insert_rowid(),
            ..location.clone()
        })
    }

    pub fn get_location(&self, id: i64) -> Result<Option<Location>> {
        self.conn
            .query_row(
                "SELECT id, story_id, name, kind, summary FROM locations WHERE id = ?1",
                [id],
                row_to_location,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_locations(&self, story_id: Option<i64>) -> Result<Vec<Location>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, story_id, name, kind, summary FROM locations
             WHERE ?1 IS NULL OR story_id = ?1 ORDER BY id",
        )?;
        let locations = stmt
            .query_map([story_id], row_to_location)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(locations)
    }

    pub fn update_location(&self, location: &Location) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE locations SET name = ?2, kind = ?3, summary = ?4 WHERE id = ?1",
            params![location.id, location.name, location.kind, location.summary],
        )?;
        Self::expect_changed(changed, "Location", location.id)
    }

    pub fn delete_location(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM locations WHERE id = ?1", [id])?;
        Self::expect_changed(changed, "Location", id)
    }

    // ========== Lore Operations ==========

    pub fn insert_lore(&self, entry: &LoreEntry) -> Result<LoreEntry> {
        self.require_story(entry.story_id)?;
        self.conn.execute(
            "INSERT INTO lore_entries (story_id, title, category, content) VALUES (?1, ?2, ?3, ?4)",
            params![entry.story_id, entry.title, entry.category, entry.content],
        )?;
        Ok(LoreEntry {
            id: self.conn.last_insert_rowid(),
            ..entry.clone()
        })
    }

    pub fn get_lore(&self, id: i64) -> Result<Option<LoreEntry>> {
        self.conn
            .query_row(
                "SELECT id, story_id, title, category, content FROM lore_entries WHERE id = ?1",
                [id],
                row_to_lore,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn list_lore(&self, story_id: Option<i64>) -> Result<Vec<LoreEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, story_id, title, category, content FROM lore_entries
             WHERE ?1 IS NULL OR story_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map([story_id], row_to_lore)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn update_lore(&self, entry: &LoreEntry) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE lore_entries SET title = ?2, category = ?3, content = ?4 WHERE id = ?1",
            params![entry.id, entry.title, entry.category, entry.content],
        )?;
        Self::expect_changed(changed, "Lore entry", entry.id)
    }

    pub fn delete_lore(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM lore_entries WHERE id = ?1", [id])?;
        Self::expect_changed(changed, "Lore entry", id)
    }

    // ========== Timeline Operations ==========

    /// Participants and location must belong to the event's story.
    fn validate_event(&self, event: &TimelineEvent) -> Result<()> {
        for &character_id in &event.character_ids {
            let owned: Option<i64> = self
                .conn
                .query_row(
                    "SELECT id FROM characters WHERE id = ?1 AND story_id = ?2",
                    [character_id, event.story_id],
                    |row| row.get(0),
                )
                .optional()?;
            if owned.is_none() {
                return Err(Error::InvalidInput(format!(
                    "Character {} does not belong to story {}",
                    character_id, event.story_id
                )));
            }
        }
        if let Some(location_id) = event.location_id {
            let owned = self.get_location(location_id)?.is_some_and(|l| l.story_id == event.story_id);
            if !owned {
                return Err(Error::InvalidInput(format!(
                    "Location {} does not belong to story {}",
                    location_id, event.story_id
                )));
            }
        }
        Ok(())
    }

    fn write_event_characters(tx: &rusqlite::Transaction<'_>, event_id: i64, character_ids: &[i64]) -> Result<()> {
        tx.execute("DELETE FROM event_characters WHERE event_id = ?1", [event_id])?;
        for (position, character_id) in character_ids.iter().enumerate() {
            tx.execute(
                "INSERT OR IGNORE INTO event_characters (event_id, character_id, position) VALUES (?1, ?2, ?3)",
                params![event_id, character_id, position as i64],
            )?;
        }
        Ok(())
    }

    /// Insert an event and its participant list
    pub fn insert_event(&self, event: &TimelineEvent) -> Result<TimelineEvent> {
        self.require_story(event.story_id)?;
        self.validate_event(event)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO timeline_events (story_id, title, date, sort_order, summary, location_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![event.story_id, event.title, event.date, event.sort_order, event.summary, event.location_id],
        )?;
        let id = tx.last_insert_rowid();
        Self::write_event_characters(&tx, id, &event.character_ids)?;
        tx.commit()?;

        Ok(TimelineEvent {
            id,
            character_ids: dedup_ids(&event.character_ids),
            ..event.clone()
        })
    }

    pub fn get_event(&self, id: i64) -> Result<Option<TimelineEvent>> {
        let event = self
            .conn
            .query_row(
                "SELECT id, story_id, title, date, sort_order, summary, location_id FROM timeline_events WHERE id = ?1",
                [id],
                row_to_event,
            )
            .optional()?;
        match event {
            Some(mut event) => {
                event.character_ids = self.event_character_ids(event.id)?;
                Ok(Some(event))
            }
            None => Ok(None),
        }
    }

    /// Events of a story in narrative order
    pub fn list_events(&self, story_id: i64) -> Result<Vec<TimelineEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, story_id, title, date, sort_order, summary, location_id FROM timeline_events
             WHERE story_id = ?1 ORDER BY sort_order, id",
        )?;
        let mut events = stmt
            .query_map([story_id], row_to_event)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for event in &mut events {
            event.character_ids = self.event_character_ids(event.id)?;
        }
        Ok(events)
    }

    fn event_character_ids(&self, event_id: i64) -> Result<Vec<i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT character_id FROM event_characters WHERE event_id = ?1 ORDER BY position")?;
        let ids = stmt
            .query_map([event_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    /// Replace an event, including its participant list
    pub fn update_event(&self, event: &TimelineEvent) -> Result<()> {
        self.validate_event(event)?;

        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE timeline_events SET title = ?2, date = ?3, sort_order = ?4, summary = ?5, location_id = ?6
             WHERE id = ?1",
            params![event.id, event.title, event.date, event.sort_order, event.summary, event.location_id],
        )?;
        Self::expect_changed(changed, "Event", event.id)?;
        Self::write_event_characters(&tx, event.id, &event.character_ids)?;
        tx.commit()?;
        Ok(())
    }

    pub fn delete_event(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM timeline_events WHERE id = ?1", [id])?;
        Self::expect_changed(changed, "Event", id)
    }

    // ========== Manuscript Operations ==========

    pub fn insert_manuscript(&self, manuscript: &Manuscript) -> Result<Manuscript> {
        self.require_story(manuscript.story_id)?;
        self.conn.execute(
            "INSERT INTO manuscripts (story_id, title, chapter, text, status) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                manuscript.story_id,
                manuscript.title,
                manuscript.chapter,
                manuscript.text,
                manuscript.status
            ],
        )?;
        Ok(Manuscript {
            id: self.conn.last_insert_rowid(),
            ..manuscript.clone()
        })
    }

    pub fn get_manuscript(&self, id: i64) -> Result<Option<Manuscript>> {
        self.conn
            .query_row(
                "SELECT id, story_id, title, chapter, text, status FROM manuscripts WHERE id = ?1",
                [id],
                row_to_manuscript,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Manuscripts ordered by chapter
    pub fn list_manuscripts(&self, story_id: Option<i64>) -> Result<Vec<Manuscript>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, story_id, title, chapter, text, status FROM manuscripts
             WHERE ?1 IS NULL OR story_id = ?1 ORDER BY story_id, chapter, id",
        )?;
        let manuscripts = stmt
            .query_map([story_id], row_to_manuscript)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(manuscripts)
    }

    pub fn update_manuscript(&self, manuscript: &Manuscript) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE manuscripts SET title = ?2, chapter = ?3, text = ?4, status = ?5 WHERE id = ?1",
            params![manuscript.id, manuscript.title, manuscript.chapter, manuscript.text, manuscript.status],
        )?;
        Self::expect_changed(changed, "Manuscript", manuscript.id)
    }

    pub fn delete_manuscript(&self, id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM manuscripts WHERE id = ?1", [id])?;
        Self::expect_changed(changed, "Manuscript", id)
    }

    // ========== Utility Operations ==========

    /// Characters and timeline of one story, ready for the checker
    pub fn load_snapshot(&self, story_id: i64) -> Result<StorySnapshot> {
        self.require_story(story_id)?;
        Ok(StorySnapshot {
            characters: self.list_characters(Some(story_id))?,
            events: self.list_events(story_id)?,
        })
    }

    fn count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            stories: self.count("stories")?,
            characters: self.count("characters")?,
            locations: self.count("locations")?,
            lore_entries: self.count("lore_entries")?,
            events: self.count("timeline_events")?,
            manuscripts: self.count("manuscripts")?,
        })
    }
}

fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn row_to_story(row: &Row) -> rusqlite::Result<Story> {
    Ok(Story {
        id: row.get(0)?,
        title: row.get(1)?,
        synopsis: row.get(2)?,
        blurb: row.get(3)?,
        genre: row.get(4)?,
    })
}

fn row_to_character(row: &Row) -> rusqlite::Result<Character> {
    Ok(Character {
        id: row.get("id")?,
        story_id: row.get("story_id")?,
        name: row.get("name")?,
        surname: row.get("surname")?,
        nickname: row.get("nickname")?,
        role: row.get("role")?,
        archetype: row.get("archetype")?,
        importance: row.get("importance")?,
        age: row.get("age")?,
        born: row.get("born")?,
        died: row.get("died")?,
        occupation: row.get("occupation")?,
        social_class: row.get("social_class")?,
        physical_description: row.get("physical_description")?,
        personality: row.get("personality")?,
        backstory: row.get("backstory")?,
        desires: row.get("desires")?,
        fears: row.get("fears")?,
        internal_conflict: row.get("internal_conflict")?,
        strengths: row.get("strengths")?,
        weaknesses: row.get("weaknesses")?,
        character_arc: row.get("character_arc")?,
        notes: row.get("notes")?,
    })
}

fn row_to_location(row: &Row) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        story_id: row.get(1)?,
        name: row.get(2)?,
        kind: row.get(3)?,
        summary: row.get(4)?,
    })
}

fn row_to_lore(row: &Row) -> rusqlite::Result<LoreEntry> {
    Ok(LoreEntry {
        id: row.get(0)?,
        story_id: row.get(1)?,
        title: row.get(2)?,
        category: row.get(3)?,
        content: row.get(4)?,
    })
}

fn row_to_event(row: &Row) -> rusqlite::Result<TimelineEvent> {
    Ok(TimelineEvent {
        id: row.get(0)?,
        story_id: row.get(1)?,
        title: row.get(2)?,
        date: row.get(3)?,
        sort_order: row.get(4)?,
        summary: row.get(5)?,
        location_id: row.get(6)?,
        character_ids: Vec::new(),
    })
}

fn row_to_manuscript(row: &Row) -> rusqlite::Result<Manuscript> {
    Ok(Manuscript {
        id: row.get(0)?,
        story_id: row.get(1)?,
        title: row.get(2)?,
        chapter: row.get(3)?,
        text: row.get(4)?,
        status: row.get(5)?,
    })
}

/// Database statistics
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DbStats {
    pub stories: usize,
    pub characters: usize,
    pub locations: usize,
    pub lore_entries: usize,
    pub events: usize,
    pub manuscripts: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Stories: {}", self.stories)?;
        writeln!(f, "  Characters: {}", self.characters)?;
        writeln!(f, "  Locations: {}", self.locations)?;
        writeln!(f, "  Lore entries: {}", self.lore_entries)?;
        writeln!(f, "  Timeline events: {}", self.events)?;
        writeln!(f, "  Manuscripts: {}", self.manuscripts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(store: &SqliteStore) -> Story {
        store
            .insert_story(&Story {
                title: "The Long Winter".to_string(),
                ..Default::default()
            })
            .unwrap()
    }

    fn character(store: &SqliteStore, story_id: i64, name: &str) -> Character {
        store
            .insert_character(&Character {
                story_id,
                name: name.to_string(),
                born: Some("1980-03-01".to_string()),
                importance: Some(9),
                ..Default::default()
            })
            .unwrap()
    }

    #[test]
    fn test_story_crud() {
        let store = SqliteStore::open_in_memory().unwrap();

        let mut saved = story(&store);
        assert!(saved.id > 0);
        assert_eq!(store.get_story(saved.id).unwrap().unwrap().title, "The Long Winter");

        saved.genre = Some("drama".to_string());
        store.update_story(&saved).unwrap();
        assert_eq!(store.get_story(saved.id).unwrap().unwrap().genre.as_deref(), Some("drama"));

        store.delete_story(saved.id).unwrap();
        assert!(store.get_story(saved.id).unwrap().is_none());
        assert!(matches!(store.delete_story(saved.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_character_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        let saved = character(&store, story.id, "Anna Smith");

        let loaded = store.get_character(saved.id).unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.importance, Some(9));
    }

    #[test]
    fn test_child_requires_story() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.insert_character(&Character {
            story_id: 42,
            name: "Nobody".to_string(),
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_by_story() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = story(&store);
        let second = story(&store);
        character(&store, first.id, "Anna");
        character(&store, second.id, "Tom");

        assert_eq!(store.list_characters(Some(first.id)).unwrap().len(), 1);
        assert_eq!(store.list_characters(None).unwrap().len(), 2);
    }

    #[test]
    fn test_event_characters_preserved() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        let anna = character(&store, story.id, "Anna");
        let tom = character(&store, story.id, "Tom");

        let event = store
            .insert_event(&TimelineEvent {
                story_id: story.id,
                title: "Harbor meeting".to_string(),
                date: Some("2001-05-05".to_string()),
                character_ids: vec![tom.id, anna.id, tom.id],
                ..Default::default()
            })
            .unwrap();
        assert_eq!(event.character_ids, vec![tom.id, anna.id]);

        let loaded = store.get_event(event.id).unwrap().unwrap();
        assert_eq!(loaded.character_ids, vec![tom.id, anna.id]);

        store.delete_character(tom.id).unwrap();
        let loaded = store.get_event(event.id).unwrap().unwrap();
        assert_eq!(loaded.character_ids, vec![anna.id]);
    }

    #[test]
    fn test_event_rejects_foreign_character() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = story(&store);
        let second = story(&store);
        let stranger = character(&store, second.id, "Stranger");

        let result = store.insert_event(&TimelineEvent {
            story_id: first.id,
            title: "Party".to_string(),
            character_ids: vec![stranger.id],
            ..Default::default()
        });
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_events_in_sort_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        for (title, order) in [("Third", 3), ("First", 1), ("Second", 2)] {
            store
                .insert_event(&TimelineEvent {
                    story_id: story.id,
                    title: title.to_string(),
                    sort_order: order,
                    ..Default::default()
                })
                .unwrap();
        }

        let titles: Vec<String> = store.list_events(story.id).unwrap().into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_update_event_replaces_participants() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        let anna = character(&store, story.id, "Anna");
        let tom = character(&store, story.id, "Tom");

        let mut event = store
            .insert_event(&TimelineEvent {
                story_id: story.id,
                title: "Duel".to_string(),
                character_ids: vec![anna.id],
                ..Default::default()
            })
            .unwrap();
        event.character_ids = vec![tom.id];
        event.date = Some("not a date".to_string());
        store.update_event(&event).unwrap();

        let loaded = store.get_event(event.id).unwrap().unwrap();
        assert_eq!(loaded.character_ids, vec![tom.id]);
        assert_eq!(loaded.date.as_deref(), Some("not a date"));
    }

    #[test]
    fn test_story_delete_cascades() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        let anna = character(&store, story.id, "Anna");
        store
            .insert_event(&TimelineEvent {
                story_id: story.id,
                title: "Birth".to_string(),
                character_ids: vec![anna.id],
                ..Default::default()
            })
            .unwrap();
        store
            .insert_manuscript(&Manuscript {
                story_id: story.id,
                title: "Chapter one".to_string(),
                ..Default::default()
            })
            .unwrap();

        store.delete_story(story.id).unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.characters, 0);
        assert_eq!(stats.events, 0);
        assert_eq!(stats.manuscripts, 0);
    }

    #[test]
    fn test_manuscripts_by_chapter() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        for chapter in [3, 1, 2] {
            store
                .insert_manuscript(&Manuscript {
                    story_id: story.id,
                    title: format!("Chapter {}", chapter),
                    chapter,
                    ..Default::default()
                })
                .unwrap();
        }

        let chapters: Vec<u32> = store
            .list_manuscripts(Some(story.id))
            .unwrap()
            .into_iter()
            .map(|m| m.chapter)
            .collect();
        assert_eq!(chapters, vec![1, 2, 3]);
    }

    #[test]
    fn test_load_snapshot() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        let anna = character(&store, story.id, "Anna");
        store
            .insert_event(&TimelineEvent {
                story_id: story.id,
                title: "Arrival".to_string(),
                character_ids: vec![anna.id],
                ..Default::default()
            })
            .unwrap();

        let snapshot = store.load_snapshot(story.id).unwrap();
        assert_eq!(snapshot.characters.len(), 1);
        assert_eq!(snapshot.events[0].character_ids, vec![anna.id]);
        assert!(matches!(store.load_snapshot(999), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_stats() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = story(&store);
        character(&store, story.id, "Anna");
        store
            .insert_lore(&LoreEntry {
                story_id: story.id,
                title: "The old war".to_string(),
                ..Default::default()
            })
            .unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.stories, 1);
        assert_eq!(stats.characters, 1);
        assert_eq!(stats.lore_entries, 1);
        assert!(stats.to_string().contains("Characters: 1"));
    }
}
