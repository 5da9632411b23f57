//! Intention Engine - Interaction trace analysis
//!
//! Replays recorded interaction traces through the engine and reports the
//! classified intentions, cognitive-load estimate, and preload outcomes.

use intention_engine::app::cli::{Cli, Commands, ConfigAction};
use intention_engine::app::config::EngineConfig;
use intention_engine::preload::source::StaticPreloadSource;
use intention_engine::replay::trace::{load_trace, replay_trace};
use intention_engine::time::clock::ManualClock;
use intention_engine::IntentionEngine;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    // Initialize tracing (--verbose enables debug-level output)
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Load config
    let config = if let Some(path) = &cli.config {
        EngineConfig::load(path)?
    } else {
        EngineConfig::load_default()?
    };

    match cli.command {
        Commands::Replay {
            input,
            output,
            data,
        } => {
            run_replay(&input, output, data, config)?;
        }
        Commands::Init { force } => {
            run_init(force, &config)?;
        }
        Commands::Config { action } => {
            run_config(action, &config, cli.config.as_ref())?;
        }
    }

    Ok(())
}

fn run_replay(
    input: &Path,
    output: Option<PathBuf>,
    data: Option<PathBuf>,
    config: EngineConfig,
) -> anyhow::Result<()> {
    if !input.exists() {
        anyhow::bail!("Trace file not found: {:?}", input);
    }

    info!("Replaying trace {:?}", input);
    let (events, skipped) = load_trace(input)?;
    info!("Loaded {} events ({} malformed lines skipped)", events.len(), skipped);

    // Canned preload payloads keep replay fully offline
    let source = match data {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            let payloads: HashMap<String, serde_json::Value> = serde_json::from_str(&content)?;
            StaticPreloadSource::from_map(payloads)
        }
        None => StaticPreloadSource::empty(),
    };

    let clock = Arc::new(ManualClock::new());
    let mut engine = IntentionEngine::new(config, clock.clone(), Arc::new(source))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let report = runtime.block_on(replay_trace(&mut engine, &clock, &events, skipped));
    engine.dispose();

    info!(
        "Replay complete: {} intentions, load {:?}",
        report.intentions.len(),
        report.cognitive_load.level
    );

    match output {
        Some(path) => {
            report.save(&path)?;
            info!("Saved report to {:?}", path);
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn run_init(force: bool, config: &EngineConfig) -> anyhow::Result<()> {
    let config_path = EngineConfig::default_path();

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config already exists at {:?}. Use --force to overwrite.",
            config_path
        );
    }

    config.save_default()?;
    println!("Created config at {:?}", config_path);
    println!("\nConfig content:\n{}", config.to_toml()?);

    Ok(())
}

fn run_config(
    action: ConfigAction,
    config: &EngineConfig,
    config_path: Option<&PathBuf>,
) -> anyhow::Result<()> {
    let path = config_path
        .cloned()
        .unwrap_or_else(EngineConfig::default_path);

    match action {
        ConfigAction::Show => {
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => {
            let value = toml::Value::try_from(config)?;
            match lookup_key(&value, &key) {
                Some(v) => println!("{v}"),
                None => anyhow::bail!("Unknown config key: {key}"),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut tree = toml::Value::try_from(config)?;
            set_key(&mut tree, &key, &value)?;
            let updated: EngineConfig = tree.try_into()?;
            updated.validate()?;
            updated.save(&path)?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Reset { force } => {
            if path.exists() && !force {
                anyhow::bail!("Use --force to reset config at {:?}", path);
            }
            EngineConfig::default().save(&path)?;
            println!("Reset config at {:?}", path);
        }
    }

    Ok(())
}

/// Navigate a dotted key path through a TOML tree.
fn lookup_key<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    let mut current = value;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Set a dotted key, parsing the value against the existing type.
fn set_key(tree: &mut toml::Value, key: &str, raw: &str) -> anyhow::Result<()> {
    let (parent_path, leaf) = match key.rsplit_once('.') {
        Some((parent, leaf)) => (Some(parent), leaf),
        None => (None, key),
    };

    let parent = match parent_path {
        Some(path) => {
            let mut current = &mut *tree;
            for part in path.split('.') {
                current = current
                    .get_mut(part)
                    .ok_or_else(|| anyhow::anyhow!("Unknown config key: {key}"))?;
            }
            current
        }
        None => tree,
    };

    let existing = parent
        .get(leaf)
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {key}"))?;

    let new_value = match existing {
        toml::Value::Integer(_) => toml::Value::Integer(raw.parse()?),
        toml::Value::Float(_) => toml::Value::Float(raw.parse()?),
        toml::Value::Boolean(_) => toml::Value::Boolean(raw.parse()?),
        toml::Value::String(_) => toml::Value::String(raw.to_string()),
        _ => anyhow::bail!("Config key {key} cannot be set from the command line"),
    };

    parent
        .as_table_mut()
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {key}"))?
        .insert(leaf.to_string(), new_value);
    Ok(())
}
