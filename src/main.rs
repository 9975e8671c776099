//! Binary entrypoint for the Clanhall CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml`
//! - `status` - print a summary of every clan in the store
//! - `check` - load the store and verify its invariants
//! - `run --as <identity> <command...>` - execute one `/clan` chat command against the store
//!
//! See the library crate docs for module-level details: `clanhall::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use clanhall::clan::ClanService;
use clanhall::commands::{handle_clan_command, ReplyTone};
use clanhall::config::Config;
use clanhall::logutil::init_logging;
use clanhall::storage::ClanStore;

#[derive(Parser)]
#[command(name = "clanhall")]
#[command(about = "Clan membership and invitation engine for multiplayer game hosts")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show every clan with its owner and member count
    Status,
    /// Load the clan store and verify it is consistent
    Check,
    /// Run a single clan chat command as the given player
    Run {
        /// Identity of the acting player
        #[arg(long = "as")]
        actor: String,
        /// The command, e.g. `/clan invite bob`
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let (config, load_error) = match Config::load(&cli.config).await {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(Some(&config), cli.verbose);
    if let Some(e) = load_error {
        info!("{}; using defaults", e);
    }

    match cli.command {
        // Written before any config exists
        Commands::Init => {}
        Commands::Status => {
            let clans = ClanService::from_config(&config)?;
            let list = clans.list_clans();
            println!("{} clans in {}", list.len(), config.storage.store_path().display());
            for clan in list {
                println!(
                    "  {:<24} owner={:<20} members={:<4} invites={}",
                    clan.name(),
                    clan.owner(),
                    clan.member_count(),
                    clan.pending_invites().len()
                );
            }
        }
        Commands::Check => {
            let store = ClanStore::from_config(&config.storage);
            match store.load() {
                Ok(registry) => {
                    println!("OK: {} clans in {}", registry.len(), store.path().display());
                }
                Err(e) => {
                    error!("Clan store {} failed to load: {}", store.path().display(), e);
                    return Err(anyhow!("clan store is unusable: {}", e));
                }
            }
        }
        Commands::Run { actor, command } => {
            let clans = ClanService::from_config(&config)?;
            let input = command.join(" ");
            let reply = handle_clan_command(&clans, &actor, &input)
                .ok_or_else(|| anyhow!("'{}' is not a clan command", input))?;
            for line in &reply.lines {
                println!("{}", line);
            }
            if let Some(notice) = &reply.notice {
                println!("[to {}] {}", notice.recipient, notice.text);
            }
            clans.flush()?;
            if reply.tone == ReplyTone::Error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
