//! `juggle` - TaskJuggler bridge command line.
//!
//! Reads a JSON file of task records, renders a `.tjp` source, optionally
//! runs `tj3` over it and writes the scheduled start times back.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use schedule_juggler::config::JugglerConfig;
use schedule_juggler::juggler::Juggler;
use schedule_juggler::loader::{Capability, SourceProfile};
use schedule_juggler::render::render;
use schedule_juggler::writeback::{booking_updates, write_back, JsonRecords, DEFAULT_BOOKING_FIELD};

/// Built-in record layouts.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    Records,
    Tracker,
    Tabular,
}

impl Profile {
    fn source_profile(self) -> SourceProfile {
        match self {
            Self::Records => SourceProfile::records(),
            Self::Tracker => SourceProfile::tracker(),
            Self::Tabular => SourceProfile::tabular(),
        }
    }
}

/// Command-line arguments for juggle
#[derive(Parser, Debug)]
#[command(name = "juggle")]
#[command(about = "Schedule task records with TaskJuggler")]
#[command(version)]
struct Args {
    /// JSON file holding an array of records
    #[arg(short, long)]
    input: PathBuf,

    /// Record layout (ignored when the config file defines a profile)
    #[arg(short, long, value_enum, default_value = "records")]
    profile: Profile,

    /// TOML configuration file
    #[arg(short, long, env = "JUGGLER_CONFIG")]
    config: Option<PathBuf>,

    /// Write the generated .tjp source here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the scheduler and merge its results
    #[arg(long)]
    run: bool,

    /// Schedule but do not write results back
    #[arg(long)]
    dry_run: bool,

    /// Keep the scheduler's temporary files
    #[arg(long)]
    retain: bool,

    /// Write the updated records to this file instead of stdout
    #[arg(long)]
    write_back: Option<PathBuf>,

    /// Log filter (overrides RUST_LOG)
    #[arg(short, long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "schedule_juggler=info,juggle=info".into()),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = match &args.config {
        Some(path) => JugglerConfig::load(path)?,
        None => JugglerConfig::default(),
    };
    if args.retain {
        config.run.retain_temp_files = true;
    }
    let profile = config
        .profile
        .clone()
        .unwrap_or_else(|| args.profile.source_profile());

    let records = read_records(&args.input)?;
    info!(records = records.len(), profile = %profile.name, "loaded input");

    let juggler = Juggler::new(config).with_profile(profile);
    let mut plan = juggler.plan(&records)?;

    if let Some(output) = &args.output {
        juggler.write_file(&plan.tree, output)?;
    }
    if !args.run {
        if args.output.is_none() {
            print!("{}", render(&plan.tree));
        }
        return Ok(());
    }

    let merged = juggler.run(&mut plan.tree)?;
    info!(
        attached = merged.attached,
        dangling = merged.dangling.len(),
        unallocated = merged.unallocated.len(),
        "scheduling finished"
    );

    if args.dry_run {
        let updates = booking_updates(&plan.tree);
        println!("{}", serde_json::to_string_pretty(&updates)?);
        return Ok(());
    }

    let id_field = juggler
        .profile()
        .binding(Capability::Identifier)
        .map(|b| b.path.clone())
        .unwrap_or_else(|| "id".to_string());
    if id_field.contains('.') {
        warn!(field = %id_field, "nested identifier fields are matched at the top level only");
    }
    let mut sink = JsonRecords::new(records, id_field);
    write_back(&plan.tree, &mut sink, DEFAULT_BOOKING_FIELD);

    let updated = serde_json::to_string_pretty(sink.records())?;
    match &args.write_back {
        Some(path) => fs::write(path, updated)
            .with_context(|| format!("cannot write {}", path.display()))?,
        None => println!("{updated}"),
    }
    Ok(())
}

/// Accepts a bare array, or an object wrapping one under `records` or
/// `issues` (tracker search results).
fn read_records(path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let value: Value = serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))?;
    match value {
        Value::Array(records) => Ok(records),
        Value::Object(mut object) => {
            for key in ["records", "issues"] {
                if let Some(Value::Array(records)) = object.remove(key) {
                    return Ok(records);
                }
            }
            bail!("{} holds no record array", path.display())
        }
        _ => bail!("{} holds no record array", path.display()),
    }
}
