/*!
confhist CLI - record tool configurations and find them again by identifier.
*/

use anyhow::Context;
use clap::{Parser, Subcommand};
use confhist_core::{
    create_history_store, observability, CompositeIdentifier, ConfigurationSnapshot, ContentHash,
    HistoryConfig, Located,
};
use std::io::Read;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing::{info, warn};

/// Longest configuration summary shown in the locate table
const SUMMARY_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "confhist")]
#[command(about = "Content-addressable history of tool configurations")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// History root directory
    #[arg(long, global = true, env = "CONFHIST_HISTORY_DIR")]
    history_dir: Option<PathBuf>,

    /// Print Prometheus metrics after the command completes
    #[cfg(feature = "metrics")]
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a JSON configuration and print its content hash
    Record {
        /// File holding the configuration; reads stdin when omitted
        file: Option<PathBuf>,
    },
    /// Locate recorded configurations by composite identifier
    Locate {
        /// Five hash characters followed by a hex position, e.g. 916f01f
        identifier: String,
        /// Print matching snapshots as JSON
        #[arg(long)]
        json: bool,
        /// Order matches by recording time instead of listing order
        #[arg(long)]
        chronological: bool,
    },
    /// Build a composite identifier from a content hash and a position
    Encode {
        /// Full content hash as printed by `record`
        hash: String,
        /// Position to embed
        #[arg(allow_negative_numbers = true)]
        position: i32,
    },
}

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Recorded")]
    recorded_at: String,
    #[tabled(rename = "Configuration")]
    summary: String,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    observability::init_observability(cli.verbose, cli.log_json)?;

    let config = create_history_config(&cli)?;

    match &cli.command {
        Commands::Record { file } => record_configuration(&config, file.as_deref())?,
        Commands::Locate {
            identifier,
            json,
            chronological,
        } => locate_configurations(&config, identifier, *json, *chronological)?,
        Commands::Encode { hash, position } => encode_identifier(hash, *position)?,
    }

    #[cfg(feature = "metrics")]
    {
        if cli.metrics {
            let metrics = observability::HistoryMetrics::global();
            print!("{}", metrics.gather_metrics()?);
        }
    }

    Ok(())
}

fn create_history_config(cli: &Cli) -> Result<HistoryConfig, anyhow::Error> {
    let root = match &cli.history_dir {
        Some(dir) => dir.clone(),
        None => HistoryConfig::default_root()
            .context("no history directory given and no default could be resolved")?,
    };
    let config = HistoryConfig::with_root(root);
    config.validate()?;
    Ok(config)
}

fn record_configuration(
    config: &HistoryConfig,
    file: Option<&std::path::Path>,
) -> Result<(), anyhow::Error> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read configuration from stdin")?;
            buffer
        }
    };

    let configuration: serde_json::Value =
        serde_json::from_str(&raw).context("configuration is not valid JSON")?;

    let store = create_history_store(config.clone())?;
    let hash = store.record(&configuration)?;
    info!("Recorded configuration under {}", config.root.display());

    println!("{hash}");
    println!("identifier: {}", CompositeIdentifier::for_hash(&hash, 0));
    Ok(())
}

fn locate_configurations(
    config: &HistoryConfig,
    identifier: &str,
    json: bool,
    chronological: bool,
) -> Result<(), anyhow::Error> {
    let store = create_history_store(config.clone())?;
    let mut located = store.locate::<serde_json::Value>(identifier)?;
    if chronological {
        located = located.into_chronological();
    }

    if located.skipped > 0 {
        warn!(
            "{} matching entries could not be decoded and were skipped",
            located.skipped
        );
    }

    if json {
        println!("{}", render_json(&located)?);
        return Ok(());
    }

    println!(
        "Position: {} ({})",
        located.position,
        format_position(located.position)
    );
    if located.is_empty() {
        println!("No matching history entries");
        return Ok(());
    }

    let rows: Vec<EntryRow> = located
        .snapshots
        .iter()
        .enumerate()
        .map(|(index, snapshot)| entry_row(index, snapshot))
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

fn encode_identifier(hash: &str, position: i32) -> Result<(), anyhow::Error> {
    let hash: ContentHash = hash.parse()?;
    println!("{}", CompositeIdentifier::for_hash(&hash, position));
    Ok(())
}

fn entry_row(index: usize, snapshot: &ConfigurationSnapshot<serde_json::Value>) -> EntryRow {
    EntryRow {
        index,
        recorded_at: format_timestamp(snapshot),
        summary: summarize(&snapshot.configuration),
    }
}

fn format_timestamp(snapshot: &ConfigurationSnapshot<serde_json::Value>) -> String {
    snapshot
        .recorded_at
        .with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

fn render_json(located: &Located<serde_json::Value>) -> Result<String, anyhow::Error> {
    Ok(serde_json::to_string_pretty(located)?)
}

/// Hex rendering matching the identifier encoding, e.g. `0x1f` or `-0x1`
fn format_position(position: i32) -> String {
    if position < 0 {
        format!("-0x{:x}", i64::from(position).unsigned_abs())
    } else {
        format!("0x{position:x}")
    }
}

fn summarize(configuration: &serde_json::Value) -> String {
    let compact = configuration.to_string();
    if compact.chars().count() <= SUMMARY_WIDTH {
        return compact;
    }
    let truncated: String = compact.chars().take(SUMMARY_WIDTH - 3).collect();
    format!("{truncated}...")
}
