//! Command-line interface parsing and handling
//!
//! This module parses arguments, resolves runtime settings from the config
//! file plus flags, and dispatches to the subcommands.

pub mod chat;
pub mod conversation_list;
pub mod model_list;
pub mod say;
pub mod settings;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::chat::run_chat;
use crate::cli::conversation_list::list_conversations;
use crate::cli::model_list::list_models;
use crate::cli::say::run_say;
use crate::cli::settings::run_config_command;
use crate::core::app::{ChatApp, SessionEvent};
use crate::core::chat_stream::HttpChatTransport;
use crate::core::config::{Config, StoreKind};
use crate::core::store::http::HttpStore;
use crate::core::store::memory::MemoryStore;
use crate::core::store::ConversationStore;
use crate::utils::clipboard::SystemClipboard;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("VERGEN_GIT_DESCRIBE"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ")\nbuilt: ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    "\ntarget: ",
    env!("VERGEN_CARGO_TARGET_TRIPLE"),
    "\nrustc: ",
    env!("VERGEN_RUSTC_SEMVER"),
);

#[derive(Parser)]
#[command(name = "ollachat")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "A streaming chat client for Ollama-style model endpoints")]
#[command(
    long_about = "Ollachat talks to an Ollama-compatible model endpoint (/chat, /tags) and keeps \
conversations in a small JSON store (/conversations, /messages). Replies are streamed \
and printed as they arrive.\n\n\
Configuration:\n\
  Settings live in config.toml in the platform config directory. Use \
'ollachat config' to inspect or edit them; flags override the file.\n\n\
Environment Variables:\n\
  OLLACHAT_LOG      Log filter directives (default: warn)\n\n\
Commands inside the chat:\n\
  /help             List every chat command"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to chat with
    #[arg(short = 'm', long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Base URL of the model endpoint
    #[arg(long, global = true, value_name = "URL")]
    pub model_url: Option<String>,

    /// Base URL of the conversation store
    #[arg(long, global = true, value_name = "URL")]
    pub store_url: Option<String>,

    /// Conversation store to use: http or memory
    #[arg(long, global = true, value_name = "KIND")]
    pub store: Option<StoreKind>,

    /// Write diagnostics to this file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send one prompt and stream the answer to stdout
    Say {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        prompt: Vec<String>,
    },
    /// List the models served by the endpoint
    Models,
    /// List stored conversations
    Conversations,
    /// Show or edit the configuration file
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum ConfigAction {
    /// Print effective settings
    Show,
    /// Print the config file location
    Path,
    /// Set a key (model-base-url, store-base-url, default-model, store)
    Set {
        key: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        value: Vec<String>,
    },
    /// Remove a key so its default applies
    Unset { key: String },
}

/// Endpoints and choices after merging the config file with flags.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeSettings {
    pub model_base_url: String,
    pub store_base_url: String,
    pub model: String,
    pub store: StoreKind,
}

impl RuntimeSettings {
    pub fn resolve(args: &Args, config: &Config) -> Self {
        Self {
            model_base_url: args
                .model_url
                .clone()
                .unwrap_or_else(|| config.model_base_url().to_string()),
            store_base_url: args
                .store_url
                .clone()
                .unwrap_or_else(|| config.store_base_url().to_string()),
            model: args
                .model
                .clone()
                .unwrap_or_else(|| config.default_model().to_string()),
            store: args.store.unwrap_or_else(|| config.store_kind()),
        }
    }

    pub fn build_store(&self, client: &reqwest::Client) -> Arc<dyn ConversationStore> {
        match self.store {
            StoreKind::Http => Arc::new(HttpStore::new(client.clone(), &self.store_base_url)),
            StoreKind::Memory => Arc::new(MemoryStore::with_welcome()),
        }
    }

    /// Wire a [`ChatApp`] against the real endpoints.
    pub fn build_app(
        &self,
        store: Arc<dyn ConversationStore>,
    ) -> (ChatApp, UnboundedReceiver<SessionEvent>) {
        let client = reqwest::Client::new();
        ChatApp::new(
            store,
            Arc::new(HttpChatTransport::new(client, &self.model_base_url)),
            Arc::new(SystemClipboard),
            &self.model,
        )
    }
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    crate::logging::init(args.log.as_deref())?;

    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;
    let settings = RuntimeSettings::resolve(&args, &config);
    tracing::debug!(?settings, "resolved settings");

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&settings).await,
        Commands::Say { prompt } => run_say(&settings, prompt).await,
        Commands::Models => list_models(&settings).await,
        Commands::Conversations => list_conversations(&settings).await,
        Commands::Config { action } => run_config_command(action.unwrap_or(ConfigAction::Show)),
    }
}

#[cfg(test)]
mod tests;
