//! Demo story bible used by `storyteller seed`.
//!
//! Jean Dupont is deliberately placed at an event that predates his birth
//! so a fresh database has something for the checker to report.

use crate::model::{Character, Location, LoreEntry, Manuscript, Story, TimelineEvent};
use crate::storage::SqliteStore;
use crate::Result;

fn text(value: &str) -> Option<String> {
    Some(value.to_string())
}

/// Insert the demo story and return it.
pub fn seed_demo(store: &SqliteStore) -> Result<Story> {
    let story = store.insert_story(&Story {
        id: 0,
        title: "The Harbor War".to_string(),
        synopsis: text("Two siblings run a smuggling ring while a siege closes on their port town."),
        blurb: text("When the harbor burns, loyalty is the last cargo left."),
        genre: text("historical drama"),
    })?;

    let anna = store.insert_character(&Character {
        story_id: story.id,
        name: "Anna Smith".to_string(),
        role: text("protagonist"),
        archetype: text("hero"),
        importance: Some(10),
        age: Some(28),
        born: text("1970-04-12"),
        occupation: text("harbor pilot"),
        social_class: text("working"),
        personality: text("Stubborn, quick, fiercely loyal to her brother."),
        backstory: text("Raised on the docks after their father drowned."),
        desires: text("Keep the family boat and her brother out of prison."),
        fears: text("Open water at night."),
        internal_conflict: text("Duty to the town against love for Tom."),
        strengths: text("Reads the tides and people equally well."),
        weaknesses: text("Trusts no one outside the family."),
        ..Default::default()
    })?;

    let tom = store.insert_character(&Character {
        story_id: story.id,
        name: "Tom Smith".to_string(),
        role: text("supporting"),
        importance: Some(7),
        age: Some(25),
        born: text("1973-09-30"),
        occupation: text("harbor smuggler"),
        social_class: text("working"),
        personality: text("Charming and reckless."),
        desires: text("Get rich before the siege ends."),
        ..Default::default()
    })?;

    let jean = store.insert_character(&Character {
        story_id: story.id,
        name: "Jean Dupont".to_string(),
        nickname: text("Captain"),
        role: text("minor"),
        archetype: text("mentor"),
        importance: Some(8),
        born: text("2000-01-01"),
        occupation: text("garrison captain"),
        social_class: text("officer"),
        ..Default::default()
    })?;

    let port = store.insert_location(&Location {
        id: 0,
        story_id: story.id,
        name: "Saint-Aubin".to_string(),
        kind: text("port town"),
        summary: text("A walled harbor town with a single deep-water quay."),
    })?;

    store.insert_lore(&LoreEntry {
        id: 0,
        story_id: story.id,
        title: "The Tide Tax".to_string(),
        category: text("law"),
        content: text("Every hull entering the harbor pays a tithe in salt."),
    })?;

    store.insert_event(&TimelineEvent {
        id: 0,
        story_id: story.id,
        title: "War begins".to_string(),
        date: text("1995-06-15"),
        sort_order: 1,
        summary: text("The garrison closes the harbor mouth."),
        location_id: Some(port.id),
        character_ids: vec![anna.id, tom.id, jean.id],
    })?;

    store.insert_event(&TimelineEvent {
        id: 0,
        story_id: story.id,
        title: "The quay burns".to_string(),
        date: text("1998-02-03"),
        sort_order: 2,
        summary: text("Tom's cargo catches fire and takes the quay with it."),
        location_id: Some(port.id),
        character_ids: vec![anna.id, tom.id],
    })?;

    store.insert_manuscript(&Manuscript {
        id: 0,
        story_id: story.id,
        title: "Low Tide".to_string(),
        chapter: 1,
        text: text(
            "Anna Smith watched the harbor mouth close. Then the Captain rode past the quay. \
             “Hold the boat,” Tom said.\n\nThe fog did not lift.",
        ),
        status: "draft".to_string(),
    })?;

    tracing::info!("Seeded demo story {} ({})", story.id, story.title);
    Ok(story)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::{ConflictKind, ConsistencyChecker, RelationshipKind};

    #[test]
    fn test_seed_contents() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = seed_demo(&store).unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.stories, 1);
        assert_eq!(stats.characters, 3);
        assert_eq!(stats.events, 2);
        assert_eq!(stats.manuscripts, 1);
        assert_eq!(store.list_locations(Some(story.id)).unwrap().len(), 1);
    }

    #[test]
    fn test_seed_has_a_conflict_to_find() {
        let store = SqliteStore::open_in_memory().unwrap();
        let story = seed_demo(&store).unwrap();
        let snapshot = store.load_snapshot(story.id).unwrap();

        let report = ConsistencyChecker::default().check_snapshot(&snapshot);
        assert_eq!(report.conflicts.len(), 1);
        assert_eq!(report.conflicts[0].kind, ConflictKind::BornAfterEvent);
        assert_eq!(report.conflicts[0].character_name.as_deref(), Some("Jean Dupont"));
        assert!(report
            .suggestions
            .iter()
            .any(|s| s.kind == RelationshipKind::Family));
    }
}
