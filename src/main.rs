//! Storyteller CLI - keep the facts of a story straight while writing it

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use storyteller::nlp::AnalysisMode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "storyteller")]
#[command(version)]
#[command(about = "Story bible backend - timeline checks, relationship hints and manuscript analysis")]
#[command(long_about = r#"
Storyteller keeps a story bible in SQLite and checks it for contradictions:
  • Characters present at events before their birth or after their death
  • Stated ages that disagree with birth dates
  • Likely family, peer, professional and social relationships
  • Character arc completeness and manuscript analysis

Example usage:
  storyteller init
  storyteller seed
  storyteller check --story 1
  storyteller serve --port 8000
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides config)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter storyteller.toml and create the database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Insert a demo story
    Seed,

    /// Start the REST server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check a story timeline for contradictions
    Check {
        /// Story id in the database
        #[arg(short, long, required_unless_present = "input", conflicts_with = "input")]
        story: Option<i64>,

        /// JSON snapshot file with `characters` and `events`
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Suggest relationships between the characters of a story
    Suggest {
        #[arg(short, long)]
        story: i64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Score a character's arc and propose development ideas
    Arc {
        /// Character id
        #[arg(long)]
        character: i64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Analyze a manuscript chapter
    Analyze {
        /// Manuscript id
        #[arg(short, long)]
        manuscript: i64,

        /// Analysis depth (fast, detailed)
        #[arg(long, default_value = "fast")]
        mode: AnalysisMode,

        /// Write the chapter with its analysis as markdown
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Export a story bible as markdown
    Export {
        #[arg(short, long)]
        story: i64,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show database statistics
    Stats {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let ctx = commands::Context::load(cli.config.as_deref(), cli.database.as_deref())?;

    let result = match cli.command {
        Commands::Init { force } => commands::run_init(&ctx, cli.config.as_deref(), force),
        Commands::Seed => commands::run_seed(&ctx),
        Commands::Serve { port } => commands::run_serve(ctx, port),
        Commands::Check { story, input, format } => commands::run_check(&ctx, story, input.as_deref(), format),
        Commands::Suggest { story, format } => commands::run_suggest(&ctx, story, format),
        Commands::Arc { character, format } => commands::run_arc(&ctx, character, format),
        Commands::Analyze {
            manuscript,
            mode,
            output,
            format,
        } => commands::run_analyze(&ctx, manuscript, mode, output.as_deref(), format),
        Commands::Export { story, output } => commands::run_export(&ctx, story, output.as_deref()),
        Commands::Stats { format } => commands::run_stats(&ctx, format),
    };

    if let Err(err) = result {
        storyteller::ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
    Ok(())
}
