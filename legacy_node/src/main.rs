use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use legacy_node::{
    ErrorKind, FileStorage, Hash, LedgerError, LegacyRegistry, NodeConfig, Storage,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "legacy", version, about = "Digital legacy ledger CLI")]
struct Cli {
    /// Path to node configuration file (YAML/TOML/JSON)
    #[arg(long, env = "LEGACY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory from the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Ledger(LedgerCommand),
    /// Print the effective configuration
    Config,
}

/// Commands that open the ledger snapshot
#[derive(Subcommand)]
enum LedgerCommand {
    /// Create a locked legacy and print its key
    Create {
        #[arg(long)]
        owner: u64,
        /// Content identifier (e.g. IPFS CID)
        #[arg(long)]
        content: String,
        #[arg(long, default_value = "")]
        rules: String,
    },
    /// Print a legacy record as JSON
    Get { key: Hash },
    /// Unlock a legacy (succeeds once)
    Unlock { key: Hash },
    /// Print the key a pair would be stored under
    Key {
        #[arg(long)]
        owner: u64,
        #[arg(long)]
        content: String,
    },
    /// List legacies owned by an entity
    List {
        #[arg(long)]
        owner: u64,
    },
    /// Print storage statistics
    Stats,
}

fn load_config(cli: &Cli) -> Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => NodeConfig::from_env().context("failed to read LEGACY_* environment")?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    Ok(config)
}

fn run(cli: Cli, config: NodeConfig) -> Result<()> {
    match cli.command {
        Commands::Config => {
            print!("{}", config.to_yaml()?);
            Ok(())
        }
        Commands::Ledger(command) => run_ledger(command, &config),
    }
}

fn run_ledger(command: LedgerCommand, config: &NodeConfig) -> Result<()> {
    let snapshot = config.snapshot_path();
    let storage = FileStorage::open(&snapshot)
        .with_context(|| format!("failed to open ledger at {}", snapshot.display()))?;
    let mut registry = LegacyRegistry::new(storage);

    match command {
        LedgerCommand::Create {
            owner,
            content,
            rules,
        } => {
            let key = registry.create(owner, &content, &rules)?;
            println!("{}", key);
        }
        LedgerCommand::Get { key } => {
            let record = registry.get(&key)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        LedgerCommand::Unlock { key } => {
            registry.unlock(&key)?;
        }
        LedgerCommand::Key { owner, content } => {
            println!("{}", registry.key_for(owner, &content));
        }
        LedgerCommand::List { owner } => {
            let entries: Vec<_> = registry
                .legacies_of(owner)?
                .into_iter()
                .map(|(key, record)| serde_json::json!({ "key": key, "record": record }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        LedgerCommand::Stats => {
            let stats = registry.storage().get_stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    registry.storage_mut().flush()?;
    for event in registry.events_mut().drain() {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<LedgerError>().map(LedgerError::kind) {
        Some(ErrorKind::Conflict) => ExitCode::from(2),
        Some(ErrorKind::NotFound) => ExitCode::from(3),
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();
    info!("Using ledger snapshot {}", config.snapshot_path().display());

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            exit_code(&err)
        }
    }
}
