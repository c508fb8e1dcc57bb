//! keychord CLI
//!
//! Validate key map configuration, list bindings and replay event scripts.

mod replay;
mod script;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use keychord_config::Config;
use keychord_core::{compile, shadowed_by};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

#[derive(Parser, Debug)]
#[command(name = "keychord")]
#[command(about = "Key sequence matching tool")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/keychord/config.kdl")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration file
    Validate,

    /// List every handler with its key sequences
    Bindings,

    /// Feed an event script through the engine
    Replay {
        /// Script with one event per line (`down <key>`, `up <key>`, `blur`)
        script: String,

        /// Print dispatched handlers as JSON lines
        #[arg(long)]
        json: bool,

        /// Only register callbacks for these handlers
        #[arg(long = "only", value_name = "HANDLER")]
        only: Vec<String>,
    },
}

type FilterHandle = reload::Handle<EnvFilter, Registry>;

/// Install the subscriber; `RUST_LOG` wins over the configured log level.
fn init_tracing() -> Option<FilterHandle> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        }
        Err(_) => {
            let (filter, handle) = reload::Layer::new(EnvFilter::new("warn"));
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            Some(handle)
        }
    }
}

fn main() -> miette::Result<()> {
    let filter_handle = init_tracing();

    let cli = Cli::parse();

    // Expand tilde in config path
    let config_path: PathBuf = shellexpand::tilde(&cli.config).into_owned().into();

    let config = load_config(&config_path)?;

    if let Some(handle) = filter_handle {
        let level = config.settings.log_level.as_filter();
        if let Err(e) = handle.reload(EnvFilter::new(level)) {
            tracing::warn!("Could not apply log level '{}': {}", level, e);
        }
    }

    match cli.command {
        Commands::Validate => cmd_validate(&config_path, &config),
        Commands::Bindings => cmd_bindings(&config),
        Commands::Replay { script, json, only } => cmd_replay(&config, &script, json, &only),
    }
}

fn load_config(config_path: &Path) -> miette::Result<Config> {
    tracing::debug!("Loading configuration from {}", config_path.display());
    keychord_config::parse_config(config_path).map_err(miette::Report::new)
}

fn cmd_validate(config_path: &Path, config: &Config) -> miette::Result<()> {
    println!("Validating configuration: {}", config_path.display());

    let trie = compile(&config.key_map).map_err(miette::Report::new)?;

    println!("Configuration is valid!");
    println!(
        "  Handlers: {} ({} sequence(s), {} distinct)",
        config.key_map.len(),
        config.key_map.sequence_count(),
        trie.len()
    );
    println!(
        "  Prevent default: {}",
        if config.settings.prevent_default { "yes" } else { "no" }
    );
    println!("  Dead path policy: {:?}", config.settings.dead_path);
    println!(
        "  Swallow on release: {}",
        if config.settings.swallow_on_release.is_empty() {
            "<none>".to_string()
        } else {
            config.settings.swallow_on_release.join(", ")
        }
    );
    Ok(())
}

fn cmd_bindings(config: &Config) -> miette::Result<()> {
    let trie = compile(&config.key_map).map_err(miette::Report::new)?;

    if config.key_map.is_empty() {
        println!("No bindings configured.");
        return Ok(());
    }

    for binding in &config.key_map {
        println!("{}", binding.handler);
        for sequence in &binding.sequences {
            let keys = sequence.join(" ");
            match shadowed_by(sequence, &trie, &binding.handler) {
                Some(owner) => println!("    {}  (shadowed by '{}')", keys, owner),
                None => println!("    {}", keys),
            }
        }
    }

    Ok(())
}

fn cmd_replay(config: &Config, script: &str, json: bool, only: &[String]) -> miette::Result<()> {
    let script_path: PathBuf = shellexpand::tilde(script).into_owned().into();
    let events =
        script::read_script(&script_path).map_err(|e| miette::miette!("{:#}", e))?;

    for handler in only {
        if config.key_map.get(handler).is_none() {
            tracing::warn!("--only names unknown handler '{}'", handler);
        }
    }

    let result = replay::replay(config, &events, only).map_err(miette::Report::new)?;

    if json {
        for invocation in &result.invocations {
            let line = serde_json::to_string(invocation).map_err(|e| miette::miette!("{}", e))?;
            println!("{}", line);
        }
        return Ok(());
    }

    for (line, event, outcome) in &result.outcomes {
        println!("{:>4}  {:<20} {}", line, event.to_string(), replay::describe(outcome));
    }
    println!(
        "\n{} event(s), {} handler call(s)",
        result.outcomes.len(),
        result.invocations.len()
    );

    Ok(())
}
