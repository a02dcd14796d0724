//! Database schema definitions

/// SQL to create the stories table
pub const CREATE_STORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS stories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    synopsis TEXT,
    blurb TEXT,
    genre TEXT
)
"#;

/// SQL to create the characters table
pub const CREATE_CHARACTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    surname TEXT,
    nickname TEXT,
    role TEXT,
    archetype TEXT,
    importance INTEGER,
    age INTEGER,
    born TEXT,
    died TEXT,
    occupation TEXT,
    social_class TEXT,
    physical_description TEXT,
    personality TEXT,
    backstory TEXT,
    desires TEXT,
    fears TEXT,
    internal_conflict TEXT,
    strengths TEXT,
    weaknesses TEXT,
    character_arc TEXT,
    notes TEXT
)
"#;

/// SQL to create the locations table
pub const CREATE_LOCATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    kind TEXT,
    summary TEXT
)
"#;

/// SQL to create the lore_entries table
pub const CREATE_LORE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS lore_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    category TEXT,
    content TEXT
)
"#;

/// SQL to create the timeline_events table
/// Dates stay text so malformed values survive storage and surface as conflicts
pub const CREATE_EVENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS timeline_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    date TEXT,
    sort_order INTEGER NOT NULL DEFAULT 0,
    summary TEXT,
    location_id INTEGER REFERENCES locations(id) ON DELETE SET NULL
)
"#;

/// SQL to create the event_characters join table
pub const CREATE_EVENT_CHARACTERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS event_characters (
    event_id INTEGER NOT NULL REFERENCES timeline_events(id) ON DELETE CASCADE,
    character_id INTEGER NOT NULL REFERENCES characters(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    PRIMARY KEY (event_id, character_id)
)
"#;

/// SQL to create the manuscripts table
pub const CREATE_MANUSCRIPTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS manuscripts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    story_id INTEGER NOT NULL REFERENCES stories(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    chapter INTEGER NOT NULL DEFAULT 1,
    text TEXT,
    status TEXT NOT NULL DEFAULT 'draft'
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_characters_story ON characters(story_id)",
    "CREATE INDEX IF NOT EXISTS idx_locations_story ON locations(story_id)",
    "CREATE INDEX IF NOT EXISTS idx_lore_story ON lore_entries(story_id)",
    "CREATE INDEX IF NOT EXISTS idx_events_story ON timeline_events(story_id, sort_order)",
    "CREATE INDEX IF NOT EXISTS idx_event_characters_character ON event_characters(character_id)",
    "CREATE INDEX IF NOT EXISTS idx_manuscripts_story ON manuscripts(story_id, chapter)",
];

/// All schema creation statements, in dependency order
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_STORIES_TABLE,
        CREATE_CHARACTERS_TABLE,
        CREATE_LOCATIONS_TABLE,
        CREATE_LORE_TABLE,
        CREATE_EVENTS_TABLE,
        CREATE_EVENT_CHARACTERS_TABLE,
        CREATE_MANUSCRIPTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
