//! Markdown export of a story bible and of annotated manuscripts

use crate::model::{has_text, Character, Location, LoreEntry, Manuscript, Story, TimelineEvent};
use crate::nlp::ManuscriptReport;
use crate::storage::SqliteStore;
use crate::{Error, Result};
use std::collections::HashMap;

const MISSING: &str = "_Not provided_";

fn or_missing(value: &Option<String>) -> &str {
    if has_text(value) {
        value.as_deref().unwrap_or(MISSING)
    } else {
        MISSING
    }
}

fn or_label<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    if has_text(value) { value.as_deref().unwrap_or(fallback) } else { fallback }
}

/// Render a whole story bible as one markdown document.
pub fn export_markdown(
    story: &Story,
    characters: &[Character],
    locations: &[Location],
    lore: &[LoreEntry],
    events: &[TimelineEvent],
) -> String {
    let mut out = Vec::new();

    out.push(format!("# {}\n", story.title));
    out.push("## Synopsis\n".to_string());
    out.push(format!("{}\n", or_missing(&story.synopsis)));
    out.push("## Blurb\n".to_string());
    out.push(format!("{}\n", or_missing(&story.blurb)));

    out.push("## Characters\n".to_string());
    for c in characters {
        out.push(character_section(c));
    }

    out.push("## Locations\n".to_string());
    for location in locations {
        out.push(format!(
            "### {} ({})\n\n{}\n",
            location.name,
            or_label(&location.kind, "General"),
            or_missing(&location.summary)
        ));
    }

    out.push("## Lore\n".to_string());
    for entry in lore {
        out.push(format!(
            "### {} (Category: {})\n\n{}\n",
            entry.title,
            or_label(&entry.category, "Misc"),
            or_missing(&entry.content)
        ));
    }

    let names: HashMap<i64, &str> = characters.iter().map(|c| (c.id, c.name.as_str())).collect();
    out.push("## Chronology\n".to_string());
    for event in events {
        let cast: Vec<&str> = event
            .character_ids
            .iter()
            .filter_map(|id| names.get(id).copied())
            .collect();
        let cast = if cast.is_empty() {
            String::new()
        } else {
            format!(" [Characters: {}]", cast.join(", "))
        };
        out.push(format!(
            "### {} ({}){}\n\n{}\n",
            event.title,
            or_label(&event.date, "Undated"),
            cast,
            or_missing(&event.summary)
        ));
    }

    out.join("\n")
}

fn character_section(c: &Character) -> String {
    let age = c.age.map(|a| a.to_string()).unwrap_or_else(|| "Unknown".to_string());
    format!(
        "### {name} ({role})\n\n\
         #### Basics\n\n\
         - Age: {age}\n\
         - Born: {born}\n\
         - Occupation: {occupation}\n\n\
         #### Appearance\n\n{appearance}\n\n\
         #### Personality and history\n\n\
         **Personality:**\n{personality}\n\n\
         **Backstory:**\n{backstory}\n\n\
         #### Narrative drive\n\n\
         - Desires: {desires}\n\
         - Fears: {fears}\n\
         - Internal conflict: {conflict}\n\
         - Arc: {arc}\n\n\
         #### Notes\n\n{notes}\n",
        name = c.name,
        role = or_label(&c.role, "Undefined"),
        age = age,
        born = or_label(&c.born, "Unknown"),
        occupation = or_missing(&c.occupation),
        appearance = or_missing(&c.physical_description),
        personality = or_missing(&c.personality),
        backstory = or_missing(&c.backstory),
        desires = or_missing(&c.desires),
        fears = or_missing(&c.fears),
        conflict = or_missing(&c.internal_conflict),
        arc = or_missing(&c.character_arc),
        notes = or_missing(&c.notes),
    )
}

/// Load a story and render it.
pub fn export_story(store: &SqliteStore, story_id: i64) -> Result<String> {
    let story = store
        .get_story(story_id)?
        .ok_or_else(|| Error::NotFound(format!("Story {}", story_id)))?;
    let characters = store.list_characters(Some(story_id))?;
    let locations = store.list_locations(Some(story_id))?;
    let lore = store.list_lore(Some(story_id))?;
    let events = store.list_events(story_id)?;

    Ok(export_markdown(&story, &characters, &locations, &lore, &events))
}

/// A chapter followed by its analysis.
pub fn export_manuscript_markdown(manuscript: &Manuscript, report: &ManuscriptReport) -> String {
    let mut out = vec![
        format!("# {} (chapter {})\n", manuscript.title, manuscript.chapter),
        "## Text\n".to_string(),
        format!("{}\n", or_missing(&manuscript.text)),
        "## Analysis\n".to_string(),
        format!(
            "- Words: {}\n- Sentences: {}\n- Unique words: {}\n",
            report.analysis.stats.word_count, report.analysis.stats.sentence_count, report.analysis.stats.unique_words
        ),
    ];

    out.push("### Entities\n".to_string());
    for entity in &report.analysis.entities {
        out.push(format!("- {} ({})", entity.text, entity.label));
    }

    if !report.conflicts.is_empty() {
        out.push("\n### Conflicts\n".to_string());
        for conflict in &report.conflicts {
            out.push(format!("- [{}] {}", conflict.severity, conflict.message));
        }
    }

    out.join("\n")
}
