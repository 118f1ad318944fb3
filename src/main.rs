use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Read;
use std::path::PathBuf;
use std::process;

use quotawatch::config::Config;
use quotawatch::display::ReportDisplay;
use quotawatch::logging::init_logging;
use quotawatch::models::Snapshot;
use quotawatch::profiles::ProfileRegistry;
use quotawatch::query::{HistoryFormat, QueryEngine};
use quotawatch::range::{RangeToken, RetentionPeriod};
use quotawatch::storage::DocumentStore;
use quotawatch::store::SnapshotStore;
use quotawatch::summarizer::Summarizer;

#[derive(Parser)]
#[command(name = "quotawatch")]
#[command(about = "Local usage/quota tracker with rolling history, hourly compaction and forecasts")]
#[command(version)]
struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Profile to operate on (defaults to the active profile)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Individual history points
    Raw,
    /// Aggregate totals for the range
    Summary,
}

impl From<FormatArg> for HistoryFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Raw => HistoryFormat::Raw,
            FormatArg::Summary => HistoryFormat::Summary,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the latest collected snapshot
    Current,
    /// Show range-filtered history (raw points or summary totals)
    History {
        /// Range token: 1h, 6h, 12h, 24h, 7d, 30d
        #[arg(long, default_value = "24h")]
        range: String,
        /// Response format
        #[arg(long, value_enum, default_value_t = FormatArg::Raw)]
        format: FormatArg,
    },
    /// Show usage rates over a trailing window
    Rates {
        /// Window in hours
        #[arg(long, default_value_t = 1)]
        window: u32,
    },
    /// Forecast quota exhaustion from recent growth
    Predict {
        /// Window in hours (defaults to the configured prediction window)
        #[arg(long)]
        window: Option<u32>,
    },
    /// Show peak usage by hour of day and day of week
    Insights {
        /// Range token: 1h, 6h, 12h, 24h, 7d, 30d
        #[arg(long, default_value = "24h")]
        range: String,
    },
    /// Append one snapshot read as JSON from stdin (collector entry point)
    Record,
    /// Archive aged snapshots into hourly summaries and trim the raw log
    Cleanup {
        /// Retention period: 24h, 7d, 30d (defaults to the configured period)
        #[arg(long)]
        retention: Option<String>,
    },
    /// Manage account profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the effective configuration (file, env and defaults merged) to a
    /// TOML file for later editing
    Init {
        /// Destination path
        #[arg(long, default_value = "quotawatch.toml")]
        path: PathBuf,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Register a new profile
    Add {
        name: String,
        /// Auth token for the upstream metering API
        #[arg(long)]
        token: String,
        /// Base URL of the upstream metering API
        #[arg(long)]
        base_url: Option<String>,
    },
    /// Make a profile the active one
    Switch { name: String },
    /// List profiles
    List,
    /// Delete a profile and its collected data
    Remove { name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let json = cli.json;

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => return handle_error(e, json),
    };
    init_logging(&config.logging);

    match run(cli, &config) {
        Ok(()) => Ok(()),
        Err(e) => handle_error(e, json),
    }
}

fn run(cli: Cli, config: &Config) -> Result<()> {
    let docs = DocumentStore::new(&config.storage.data_dir);
    let registry = ProfileRegistry::new(docs.clone());
    let display = ReportDisplay::new(cli.json, config.output.json_pretty);
    let json = cli.json;

    // Profile and config subcommands manage the tool itself; everything else
    // operates on one resolved profile.
    if let Commands::Profile { command } = &cli.command {
        return run_profile_command(command, &registry, &display, json);
    }
    if let Commands::Config { command } = &cli.command {
        return run_config_command(command, config, json);
    }

    let profile = resolve_profile(cli.profile.as_deref(), &registry)?;
    let engine = QueryEngine::new(docs.clone());

    match cli.command {
        Commands::Current => {
            let snapshot = engine.current(&profile)?;
            display.display_current(&profile, &snapshot);
        }
        Commands::History { range, format } => {
            let range: RangeToken = range.parse()?;
            let response = engine.history(&profile, range, format.into())?;
            display.display_history(&profile, range.as_str(), &response);
        }
        Commands::Rates { window } => {
            let rates = engine.rates(&profile, window)?;
            display.display_rates(&profile, &rates);
        }
        Commands::Predict { window } => {
            let window = window.unwrap_or(config.prediction.window_hours);
            let prediction = engine.predict(&profile, window)?;
            display.display_prediction(&profile, &prediction);
        }
        Commands::Insights { range } => {
            let range: RangeToken = range.parse()?;
            let report = engine.insights(&profile, range)?;
            display.display_insights(&profile, &report);
        }
        Commands::Record => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read snapshot from stdin")?;
            let snapshot: Snapshot =
                serde_json::from_str(&input).context("Failed to parse snapshot from stdin")?;

            let store = SnapshotStore::new(docs, config.storage.clone());
            let doc = store.append(&profile, snapshot, config.retention.period)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "profile": profile,
                        "entries": doc.entries.len(),
                        "lastUpdated": doc.last_updated,
                    })
                );
            } else {
                println!("Recorded snapshot for '{}' ({} entries)", profile, doc.entries.len());
            }
        }
        Commands::Cleanup { retention } => {
            let retention: RetentionPeriod = match retention {
                Some(token) => token.parse()?,
                None => config.retention.period,
            };
            let summarizer = Summarizer::new(docs, config.storage.clone());
            let report = summarizer.archive(&profile, retention)?;
            display.display_cleanup(&profile, &report);
        }
        Commands::Profile { .. } | Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn run_config_command(command: &ConfigCommands, config: &Config, json: bool) -> Result<()> {
    match command {
        ConfigCommands::Init { path } => {
            config.save_to_file(path)?;
            if json {
                println!("{}", serde_json::json!({ "written": path }));
            } else {
                println!("Wrote configuration to {}", path.display());
            }
        }
    }
    Ok(())
}

fn run_profile_command(
    command: &ProfileCommands,
    registry: &ProfileRegistry,
    display: &ReportDisplay,
    json: bool,
) -> Result<()> {
    match command {
        ProfileCommands::Add { name, token, base_url } => {
            let profile = registry.create(name, token, base_url.clone())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&profile)?);
            } else {
                println!("Created profile '{}'", profile.name);
            }
        }
        ProfileCommands::Switch { name } => {
            registry.switch(name)?;
            if json {
                println!("{}", serde_json::json!({ "active": name }));
            } else {
                println!("Switched to profile '{}'", name);
            }
        }
        ProfileCommands::List => {
            let listings = registry.list()?;
            display.display_profiles(&listings);
        }
        ProfileCommands::Remove { name } => {
            registry.delete(name)?;
            if json {
                println!("{}", serde_json::json!({ "deleted": name }));
            } else {
                println!("Deleted profile '{}' and its collected data", name);
            }
        }
    }
    Ok(())
}

/// Use the explicit `--profile` flag when given, otherwise the registry's
/// active profile. An explicit unknown name is rejected up front rather than
/// surfacing later as an empty-history error.
fn resolve_profile(flag: Option<&str>, registry: &ProfileRegistry) -> Result<String> {
    match flag {
        Some(name) => {
            let known = name == quotawatch::profiles::DEFAULT_PROFILE
                || registry.load()?.profiles.contains_key(name);
            if !known {
                return Err(quotawatch::QuotawatchError::UnknownProfile(name.to_string()).into());
            }
            Ok(name.to_string())
        }
        None => Ok(registry.active()?),
    }
}

fn handle_error(e: anyhow::Error, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::json!({ "error": e.to_string() }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
