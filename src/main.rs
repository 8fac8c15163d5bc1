//! docchat CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use docchat::{
    commands::{
        cmd_ask, cmd_ingest, cmd_init, cmd_list_sources, cmd_remove, cmd_status, print_sources,
        print_status, AskOptions, InitOptions,
    },
    config::Config,
    embed::OllamaEmbedder,
    error::{Error, Result},
    generate::{ChatSession, GenerationClient, Role},
    store::IndexStore,
};
use futures::StreamExt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version, about = "Chat with your local documents over Ollama", long_about = None)]
struct Cli {
    /// Base directory (defaults to ~/.docchat)
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize docchat configuration and index
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Ingest a document into the index
    Ingest {
        /// Path to the document (txt, md, pdf, docx)
        path: PathBuf,
    },

    /// Ask a question against the indexed documents
    Ask {
        /// The question
        question: String,

        /// Number of chunks to retrieve
        #[arg(short, long)]
        k: Option<usize>,

        /// Answer from the model alone, without document context
        #[arg(long)]
        no_context: bool,

        /// Print the supporting chunks after the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Remove an ingested document and its chunks
    Remove {
        /// File name of the document (use 'docchat sources' to list)
        source_name: String,
    },

    /// List ingested documents
    Sources,

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Init doesn't need an existing config
    if let Commands::Init { force } = cli.command {
        let config = cmd_init(InitOptions {
            base_dir: cli.dir,
            force,
        })
        .await?;
        println!("Initialized docchat at {}", config.paths.base_dir.display());
        return Ok(());
    }

    // Completions don't need config or index
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "docchat", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.dir.clone())?;

    let embedder = Arc::new(OllamaEmbedder::from_config(&config)?);
    let store = IndexStore::open(&config.paths.db_file, embedder, config.index.similarity_metric)
        .await?;
    let client = GenerationClient::new(&config.ollama_url)?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } => unreachable!(),

        Commands::Ingest { path } => {
            let stats = cmd_ingest(&config, &store, &path).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if stats.chunks_indexed == 0 {
                println!("No extractable text in '{}', nothing indexed", stats.source_name);
            } else {
                println!(
                    "Ingested '{}': {} chunks indexed ({} replaced)",
                    stats.source_name, stats.chunks_indexed, stats.chunks_replaced
                );
            }
        }

        Commands::Ask {
            question,
            k,
            no_context,
            show_context,
        } => {
            let options = AskOptions {
                k,
                use_knowledge_base: !no_context,
            };
            let mut session = ChatSession::new();
            let outcome =
                cmd_ask(&config, &store, &client, &mut session, &question, options).await?;

            let mut stream = outcome.stream;
            let mut stdout = std::io::stdout();
            let mut answer = String::new();
            while let Some(fragment) = stream.next().await {
                match fragment {
                    Ok(text) => {
                        print!("{}", text);
                        stdout.flush()?;
                        answer.push_str(&text);
                    }
                    Err(e) => {
                        println!();
                        return Err(e);
                    }
                }
            }
            println!();
            session.record_turn(Role::Assistant, answer);

            if show_context && !outcome.context.is_empty() {
                println!("\nSupporting chunks:");
                for hit in &outcome.context {
                    println!(
                        "  {} [{}/{}] (distance {:.3})",
                        hit.source_name,
                        hit.chunk_index + 1,
                        hit.chunk_count,
                        hit.distance
                    );
                }
            }
        }

        Commands::Remove { source_name } => {
            let stats = cmd_remove(&config, &store, &source_name).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else if stats.chunks_removed == 0 && !stats.file_removed {
                println!("No document named '{}' in the index", stats.source_name);
            } else {
                println!(
                    "Removed '{}': {} chunks",
                    stats.source_name, stats.chunks_removed
                );
            }
        }

        Commands::Sources => {
            let sources = cmd_list_sources(&store).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
            } else {
                print_sources(&sources);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &store, &client).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

fn load_config(base_dir: Option<PathBuf>) -> Result<Config> {
    let mut probe = Config::default();
    probe.init_paths(base_dir.clone());
    if !probe.paths.config_file.exists() {
        return Err(Error::NotInitialized);
    }
    Config::load_from(base_dir)
}
