use crate::OutputFormat;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use storyteller::config::{self, StorytellerConfig};
use storyteller::consistency::{Conflict, ConsistencyChecker};
use storyteller::nlp::{self, AnalysisMode, NlpBackend, TextAnalyzer};
use storyteller::output::is_quiet;
use storyteller::server::{self, AppState};
use storyteller::storage::{Record, SqliteStore};
use storyteller::ui::{self, Icons, Spinner};
use storyteller::{export, seed, Character, Manuscript, StorySnapshot};

/// Resolved settings shared by every command
pub struct Context {
    pub config: StorytellerConfig,
    pub database: PathBuf,
}

impl Context {
    pub fn load(config_path: Option<&Path>, database: Option<&Path>) -> anyhow::Result<Self> {
        let config = config::load_config(config_path)?.unwrap_or_default();
        let database = config.database_path(database);
        Ok(Self { config, database })
    }

    fn open_store(&self) -> anyhow::Result<SqliteStore> {
        config::ensure_db_dir(&self.database)?;
        tracing::debug!("Opening database {}", self.database.display());
        Ok(SqliteStore::open(&self.database)?)
    }

    fn checker(&self) -> ConsistencyChecker {
        ConsistencyChecker::new(self.config.checker.clone())
    }

    fn analyzer(&self) -> anyhow::Result<Arc<dyn TextAnalyzer>> {
        if self.config.nlp.backend == NlpBackend::Embedding {
            let spinner = Spinner::new("Loading embedding model...");
            let analyzer = match nlp::build_analyzer(&self.config.nlp) {
                Ok(analyzer) => analyzer,
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            spinner.finish_with_message("Embedding model ready");
            return Ok(analyzer);
        }
        Ok(nlp::build_analyzer(&self.config.nlp)?)
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_conflicts(conflicts: &[Conflict]) {
    if conflicts.is_empty() {
        ui::success("No timeline conflicts");
        return;
    }
    if is_quiet() {
        for conflict in conflicts {
            ui::severity_line(conflict.severity, &conflict.message);
        }
    } else {
        println!("{}", ui::conflicts_table(conflicts));
    }
}

pub fn run_init(ctx: &Context, config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = config_path.map(Path::to_path_buf).unwrap_or_else(config::default_config_path);
    let starter = StorytellerConfig {
        database: Some(ctx.database.display().to_string()),
        ..StorytellerConfig::starter()
    };
    config::write_config(&path, &starter, force)?;

    ctx.open_store()?;
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    config::ensure_gitignore(root)?;

    ui::success(&format!("Wrote {}", path.display()));
    ui::status(Icons::DATABASE, "Database", &ctx.database.display().to_string());
    Ok(())
}

pub fn run_seed(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let story = seed::seed_demo(&store)?;
    ui::success(&format!("Seeded \"{}\" as story {}", story.title, story.id));
    if !is_quiet() {
        ui::info("Try", &format!("storyteller check --story {}", story.id));
    }
    Ok(())
}

pub fn run_serve(ctx: Context, port: Option<u16>) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let state = Arc::new(AppState::new(store, ctx.checker(), ctx.analyzer()?));

    let mut server_config = ctx.config.server.clone();
    if let Some(port) = port {
        server_config.port = port;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server::start_server(&server_config, state))
}

pub fn run_check(
    ctx: &Context,
    story: Option<i64>,
    input: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let snapshot: StorySnapshot = match (story, input) {
        (Some(story_id), _) => ctx.open_store()?.load_snapshot(story_id)?,
        (None, Some(path)) => {
            let contents = std::fs::read_to_string(path)?;
            serde_json::from_str(&contents)
                .map_err(|e| anyhow::anyhow!("{} is not a story snapshot: {}", path.display(), e))?
        }
        (None, None) => anyhow::bail!("either --story or --input is required"),
    };

    let report = ctx.checker().check_snapshot(&snapshot);

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            if !is_quiet() {
                ui::header(&format!(
                    "Checked {} events and {} characters",
                    snapshot.events.len(),
                    snapshot.characters.len()
                ));
            }
            ui::section("Timeline");
            print_conflicts(&report.conflicts);
            ui::section("Relationships");
            if report.suggestions.is_empty() {
                println!("{}", ui::dim("No suggestions"));
            } else {
                println!("{}", ui::suggestions_table(&report.suggestions));
            }
        }
    }
    Ok(())
}

pub fn run_suggest(ctx: &Context, story: i64, format: OutputFormat) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let characters = store.list_characters(Some(story))?;
    if characters.is_empty() {
        storyteller::Story::fetch(&store, story)?;
    }
    if characters.len() < 2 && format == OutputFormat::Text {
        ui::warn(&format!("Story {} has fewer than two characters", story));
    }
    let suggestions = ctx.checker().suggest_relationships(&characters);

    match format {
        OutputFormat::Json => print_json(&suggestions)?,
        OutputFormat::Text if suggestions.is_empty() => println!("{}", ui::dim("No suggestions")),
        OutputFormat::Text => println!("{}", ui::suggestions_table(&suggestions)),
    }
    Ok(())
}

pub fn run_arc(ctx: &Context, character_id: i64, format: OutputFormat) -> anyhow::Result<()> {
    let character = Character::fetch(&ctx.open_store()?, character_id)?;
    let checker = ctx.checker();
    let analyzer = ctx.analyzer()?;

    let arc = checker.analyze_character_arc_coherence(&character, analyzer.as_ref());
    let development = checker.suggest_character_development(&character);

    if format == OutputFormat::Json {
        return print_json(&serde_json::json!({
            "character_id": character.id,
            "name": character.name,
            "score": arc.score,
            "issues": arc.issues,
            "complete": arc.complete,
            "development": development,
        }));
    }

    ui::header(&format!("Arc of {}", character.name));
    let verdict = if arc.complete { "complete" } else { "incomplete" };
    ui::status(Icons::STATS, "Score", &format!("{}/100 ({})", arc.score, verdict));
    for issue in &arc.issues {
        ui::severity_line(issue.severity, &issue.message);
    }
    if !development.is_empty() {
        ui::section("Ideas");
        for hint in &development {
            println!("  {} {} {}", Icons::SPARKLE, format!("[{}]", hint.category).bold(), hint.suggestion);
        }
    }
    Ok(())
}

pub fn run_analyze(
    ctx: &Context,
    manuscript_id: i64,
    mode: AnalysisMode,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let manuscript = Manuscript::fetch(&store, manuscript_id)?;
    let characters = store.list_characters(Some(manuscript.story_id))?;
    let events = store.list_events(manuscript.story_id)?;
    let analyzer = ctx.analyzer()?;

    let report = nlp::analyze_manuscript(
        &manuscript,
        &characters,
        &events,
        mode,
        analyzer.as_ref(),
        &ctx.checker(),
    );

    if let Some(path) = output {
        std::fs::write(path, export::export_manuscript_markdown(&manuscript, &report))?;
        tracing::info!("Wrote annotated manuscript to {}", path.display());
    }

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Text => {
            ui::header(&format!("Chapter {}: {}", report.chapter, report.title));
            let stats = &report.analysis.stats;
            println!(
                "{}",
                ui::stats_table(&[
                    ("Words", stats.word_count.to_string()),
                    ("Sentences", stats.sentence_count.to_string()),
                    ("Unique words", stats.unique_words.to_string()),
                    ("Entities", report.analysis.entities.len().to_string()),
                ])
            );
            if let Some(style) = &report.analysis.style {
                ui::summary_row("Words per sentence:", &style.avg_sentence_length.to_string());
            }
            if let Some(ratio) = report.analysis.dialogue_ratio {
                ui::summary_row("Dialogue ratio:", &ratio.to_string());
            }
            ui::section("Characters");
            for mention in &report.mentions {
                println!("  {} {} x{}", Icons::PERSON, mention.name, mention.count);
            }
            ui::section("Timeline");
            print_conflicts(&report.conflicts);
        }
    }
    Ok(())
}

pub fn run_export(ctx: &Context, story: i64, output: Option<&Path>) -> anyhow::Result<()> {
    let markdown = export::export_story(&ctx.open_store()?, story)?;
    match output {
        Some(path) => {
            std::fs::write(path, markdown)?;
            ui::success(&format!("Exported story {} to {}", story, path.display()));
        }
        None => println!("{}", markdown),
    }
    Ok(())
}

pub fn run_stats(ctx: &Context, format: OutputFormat) -> anyhow::Result<()> {
    let stats = ctx.open_store()?.stats()?;
    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Text if is_quiet() => print!("{}", stats),
        OutputFormat::Text => {
            ui::status(Icons::DATABASE, "Database", &ctx.database.display().to_string());
            println!(
                "{}",
                ui::stats_table(&[
                    ("Stories", stats.stories.to_string()),
                    ("Characters", stats.characters.to_string()),
                    ("Locations", stats.locations.to_string()),
                    ("Lore entries", stats.lore_entries.to_string()),
                    ("Timeline events", stats.events.to_string()),
                    ("Manuscripts", stats.manuscripts.to_string()),
                ])
            );
        }
    }
    Ok(())
}
