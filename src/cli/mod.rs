//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod health;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

use crate::cli::health::run_health;
use crate::cli::say::run_say;
use crate::cli::settings::{handle_set, handle_unset, SettingError};
use crate::core::chat_stream::HttpTransport;
use crate::core::config::Config;
use crate::core::constants::API_KEY_ENV;
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::init_tracing;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_SHA"),
    "\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    "\nrustc: ",
    env!("VERGEN_RUSTC_SEMVER"),
);

#[derive(Parser)]
#[command(name = "ragchat")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A terminal chat client for a retrieval-augmented document backend")]
#[command(
    long_about = "ragchat sends questions to a RAG backend and streams the answers into \
your terminal as they are generated.\n\n\
Authentication:\n\
  Pass --api-key, set RAGCHAT_API_KEY, or type /key <KEY> inside a chat session.\n\
  The key is kept in memory only.\n\n\
Configuration:\n\
  ragchat set base-url <URL>     Backend address (default http://localhost:8000)\n\
  ragchat set log-level <LEVEL>  Default tracing filter\n\n\
Chat commands:\n\
  /key <KEY>        Set the API key for this session\n\
  /cancel           Stop the reply that is streaming\n\
  /help             Show the command list\n\
  /quit             Leave the session"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL, overriding the configured one
    #[arg(short = 'u', long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// API key sent with every question
    #[arg(
        short = 'k',
        long,
        global = true,
        env = API_KEY_ENV,
        hide_env_values = true,
        value_name = "KEY"
    )]
    pub api_key: Option<String>,

    /// Write logs to the given file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session (default)
    Chat,
    /// Ask a single question and print the streamed answer
    Say {
        /// Question to send
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },
    /// Check that the backend is reachable
    Health,
    /// Set configuration values, or show them when no value is given
    Set {
        /// Configuration key to set
        key: Option<String>,
        /// Value to set for the key
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Option<Vec<String>>,
    },
    /// Unset configuration values
    Unset {
        /// Configuration key to unset
        key: String,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn exit_on_setting_error(result: Result<(), SettingError>) -> Result<(), Box<dyn Error>> {
    if let Err(err) = result {
        err.print();
        std::process::exit(err.exit_code());
    }
    Ok(())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("⚠️  Ignoring configuration: {err}");
            Config::default()
        }
    };
    init_tracing(args.verbose, config.log_level.as_deref(), args.log.as_deref())?;

    let base_url = config.resolve_base_url(args.base_url.as_deref());
    debug!(base_url = %base_url, "Resolved backend");

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(HttpTransport::new(base_url), args.api_key).await,
        Commands::Say { prompt } => run_say(HttpTransport::new(base_url), prompt, args.api_key).await,
        Commands::Health => run_health(HttpTransport::new(base_url)).await,
        Commands::Set { key, value } => exit_on_setting_error(handle_set(key, value)),
        Commands::Unset { key } => exit_on_setting_error(handle_unset(key)),
    }
}
