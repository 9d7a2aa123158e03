//! # chatsync
//!
//! CLI tool for browsing and sending chatsync messages.
//!
//! ## Commands
//!
//! - `chats`: List your conversations
//! - `init`: Seed the starter conversations for a new user
//! - `watch`: Follow a conversation, printing messages as they arrive
//! - `send`: Send a message and print the refreshed thread
//!
//! ## Example
//!
//! ```bash
//! # Seed chats and list them
//! chatsync init
//! chatsync chats
//!
//! # Follow conversation 4 until Ctrl-C
//! chatsync watch 4
//!
//! # Reply as user 2
//! chatsync --user 2 send 4 "On my way"
//!
//! # Try it without a server
//! chatsync --mock watch 1 --for 10
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use chat_client::ClientConfig;
use chat_types::ConversationId;

mod commands;

use commands::{chats, init, send, watch};

const DEFAULT_FILTER: &str = "warn,chatsync=info,chat_client=info";

/// CLI tool for browsing and sending chatsync messages.
#[derive(Parser, Debug)]
#[command(name = "chatsync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir, then built-in defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as this user id instead of the configured one
    #[arg(long, global = true)]
    user: Option<i64>,

    /// Use an in-memory store with demo chats instead of the HTTP store
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List your conversations
    Chats,

    /// Seed the starter conversations for this user
    Init,

    /// Follow a conversation and print messages as they arrive
    Watch {
        /// Conversation id
        conversation: i64,

        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long = "for")]
        duration: Option<u64>,
    },

    /// Send a message to a conversation
    Send {
        /// Conversation id
        conversation: i64,

        /// Message text
        text: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(path) => ClientConfig::from_file(&path)?,
        None => ClientConfig::from_file_or_default(&default_config_path()?)?,
    };
    if let Some(user) = cli.user {
        config = config.with_user(user);
    }
    tracing::debug!(
        "Using store {} as user {}{}",
        config.store.base_url,
        config.user.id,
        if cli.mock { " (mock)" } else { "" }
    );

    match cli.command {
        Commands::Chats => {
            chats::run(&config, cli.mock).await?;
        }
        Commands::Init => {
            init::run(&config, cli.mock).await?;
        }
        Commands::Watch {
            conversation,
            duration,
        } => {
            let duration = duration.map(std::time::Duration::from_secs);
            watch::run(&config, ConversationId::new(conversation), duration, cli.mock).await?;
        }
        Commands::Send { conversation, text } => {
            send::run(&config, ConversationId::new(conversation), &text, cli.mock).await?;
        }
    }

    Ok(())
}

/// Install the tracing subscriber. `RUST_LOG` overrides the default filter.
fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Get the default config file path for chatsync.
fn default_config_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "chatsync", "chatsync")
        .context("Could not determine home directory")?;
    Ok(config_file_in(dirs.config_dir()))
}

fn config_file_in(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}
