mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, schema::SchemaSubcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "artiflow",
    about = "Schema-driven artifact workflows: track which documents a change still needs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .artiflow/ or .git/)
    #[arg(long, global = true, env = "ARTIFLOW_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize artiflow in the current project
    Init,

    /// Create a new change directory
    New {
        /// Change name (kebab-case)
        name: String,
        /// Workflow schema (default: config default_schema)
        #[arg(long)]
        schema: Option<String>,
    },

    /// List changes
    List,

    /// Show artifact status for a change
    Status {
        #[arg(long)]
        change: String,
        /// Override the schema recorded for the change
        #[arg(long)]
        schema: Option<String>,
    },

    /// Print the enriched instructions for one artifact
    Instructions {
        /// Artifact id
        artifact: String,
        #[arg(long)]
        change: String,
        #[arg(long)]
        schema: Option<String>,
    },

    /// Show artifacts that are ready to be written
    Next {
        #[arg(long)]
        change: String,
        #[arg(long)]
        schema: Option<String>,
    },

    /// Show whether implementation can start, with task progress
    Apply {
        #[arg(long)]
        change: String,
        #[arg(long)]
        schema: Option<String>,
    },

    /// Inspect and validate workflow schemas
    Schema {
        #[command(subcommand)]
        subcommand: SchemaSubcommand,
    },

    /// Inspect and validate project config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::New { name, schema } => {
            cmd::change::new(&root, &name, schema.as_deref(), cli.json)
        }
        Commands::List => cmd::change::list(&root, cli.json),
        Commands::Status { change, schema } => {
            cmd::status::run(&root, &change, schema.as_deref(), cli.json)
        }
        Commands::Instructions {
            artifact,
            change,
            schema,
        } => cmd::instructions::run(&root, &artifact, &change, schema.as_deref(), cli.json),
        Commands::Next { change, schema } => {
            cmd::next::run(&root, &change, schema.as_deref(), cli.json)
        }
        Commands::Apply { change, schema } => {
            cmd::apply::run(&root, &change, schema.as_deref(), cli.json)
        }
        Commands::Schema { subcommand } => cmd::schema::run(subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
