//! CLI entry point for the vantage knowledge layer.
//!
//! Stands in for the training loop as the orchestrating caller: schema
//! bootstrap, a scripted demo episode, partition stats, and reset.

mod scenario;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use vantage_core::types::EpisodeId;
use vantage_graph::{GraphClient, GraphConfig};
use vantage_sync::Synchronizer;

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Episode knowledge graph tooling for autonomous pentest training")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: vantage).
    #[arg(short, long, default_value = "vantage", global = true)]
    config: String,
}

#[derive(Subcommand)]
enum Command {
    /// Create the lookup indexes episode partitions rely on.
    Schema,
    /// Run a scripted demo episode and print its report.
    Demo {
        /// Environment label recorded in the journal.
        #[arg(long, default_value = "chain-demo")]
        environment: String,

        /// Directory to save the episode journal into.
        #[arg(long)]
        journal_dir: Option<String>,

        /// Keep the episode partition instead of clearing it at the end.
        #[arg(long)]
        keep: bool,
    },
    /// Print node counts for an episode partition.
    Stats {
        /// Episode ID (UUID).
        #[arg(long)]
        episode: String,
    },
    /// Clear an episode partition.
    Reset {
        /// Episode ID (UUID).
        #[arg(long)]
        episode: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let graph_config = load_graph_config(&cli.config);
    let graph = GraphClient::connect(&graph_config).await?;

    match cli.command {
        Command::Schema => {
            graph.ensure_schema().await?;
            tracing::info!("Schema bootstrap complete");
        }
        Command::Demo {
            environment,
            journal_dir,
            keep,
        } => {
            let report =
                scenario::run_demo_episode(&graph, &environment, journal_dir.as_deref(), keep)
                    .await?;
            println!("{report}");
        }
        Command::Stats { episode } => {
            let episode = parse_episode(&episode)?;
            let stats = graph.graph_stats(&episode).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Reset { episode } => {
            let episode = parse_episode(&episode)?;
            let sync = Synchronizer::new(graph);
            let deleted = sync.reset_episode(&episode).await?;
            tracing::info!(nodes_deleted = deleted, "Episode partition cleared");
        }
    }

    Ok(())
}

fn parse_episode(raw: &str) -> anyhow::Result<EpisodeId> {
    let uuid = uuid::Uuid::parse_str(raw)?;
    Ok(EpisodeId(uuid))
}

fn load_graph_config(file_prefix: &str) -> GraphConfig {
    let cfg = config::Config::builder()
        .add_source(config::File::with_name(file_prefix).required(false))
        .add_source(
            config::Environment::with_prefix("VANTAGE")
                .separator("__")
                .try_parsing(true),
        )
        .build();

    match cfg {
        Ok(c) => GraphConfig {
            uri: c
                .get_string("neo4j.uri")
                .unwrap_or_else(|_| "bolt://localhost:7687".to_string()),
            user: c
                .get_string("neo4j.user")
                .unwrap_or_else(|_| "neo4j".to_string()),
            password: c
                .get_string("neo4j.password")
                .unwrap_or_else(|_| "vantage-dev".to_string()),
            ..Default::default()
        },
        Err(_) => GraphConfig::default(),
    }
}
