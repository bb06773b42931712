// Ghostwriter - command line entry point

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use ghostwriter::services::knowledge::{AssemblyRequest, ContextBudgets, KnowledgeContextAssembler};
use ghostwriter::services::structured_output::{recover_value, RequiredShape};
use ghostwriter::storage::{resolve_path, ConfigService, SqliteDocumentStore, CONFIG_ENV_VAR};
use ghostwriter::utils::database_path;
use ghostwriter_core::KnowledgeUsage;

#[derive(Parser)]
#[command(name = "ghostwriter", version, about = "Interview knowledge and model output tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Recover a JSON object from raw model output and print the result.
    Recover {
        /// File holding the raw output (stdin when omitted).
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Top-level key that must be present.
        #[arg(long = "require", value_name = "KEY")]
        require: Vec<String>,

        /// Top-level key that must hold a non-empty array.
        #[arg(long = "non-empty", value_name = "KEY")]
        non_empty: Vec<String>,
    },

    /// Assemble a knowledge context from a SQLite store and print it.
    Assemble {
        /// Knowledge database (defaults to ~/.ghostwriter/knowledge.db).
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Caller (user) id used for authorization.
        #[arg(long)]
        caller: String,

        /// article, article-editing, dialogue or evaluation.
        #[arg(long)]
        usage: KnowledgeUsage,

        /// Explicitly requested fragment id (repeatable).
        #[arg(long = "fragment", value_name = "ID")]
        fragments: Vec<String>,

        /// Config file (defaults to $GHOSTWRITER_CONFIG, then ~/.ghostwriter/config.json).
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the effective configuration.
    Config {
        /// Config file (defaults to $GHOSTWRITER_CONFIG, then ~/.ghostwriter/config.json).
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Recover {
            input,
            require,
            non_empty,
        } => {
            let raw = match &input {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("reading stdin")?;
                    buf
                }
            };

            let shape = require
                .into_iter()
                .fold(RequiredShape::object(), |shape, key| shape.require(key));
            let shape = non_empty
                .into_iter()
                .fold(shape, |shape, key| shape.non_empty_array(key));

            let recovered = recover_value(&raw, &shape);
            println!("{}", serde_json::to_string_pretty(&recovered)?);
            if !recovered.is_ok() {
                std::process::exit(2);
            }
        }

        Command::Assemble {
            db,
            caller,
            usage,
            fragments,
            config,
        } => {
            let config = open_config(config)?.get_config_clone();
            let db = match db {
                Some(path) => path,
                None => database_path().context("resolving knowledge database path")?,
            };
            let store = SqliteDocumentStore::open(&db)
                .with_context(|| format!("opening knowledge database {}", db.display()))?;

            let assembler =
                KnowledgeContextAssembler::with_settings(Arc::new(store), &config.knowledge);
            let request =
                AssemblyRequest::new(caller, usage, ContextBudgets::from(&config.knowledge))
                    .with_fragments(fragments);
            let context = assembler.assemble(&request).await;
            println!("{}", serde_json::to_string_pretty(&context)?);
        }

        Command::Config { path } => {
            let service = open_config(path)?;
            tracing::debug!(path = %service.path().display(), "configuration loaded");
            println!("{}", serde_json::to_string_pretty(service.get_config())?);
        }
    }

    Ok(())
}

fn open_config(path: Option<PathBuf>) -> anyhow::Result<ConfigService> {
    let path = resolve_path(path, std::env::var_os(CONFIG_ENV_VAR))
        .context("resolving configuration path")?;
    ConfigService::open(path).context("loading configuration")
}
