//! Command-line interface parsing and handling
//!
//! This module parses arguments, sets up logging, and either starts the web
//! server or runs one of the informational subcommands.

pub mod model_list;

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use crate::api::hub::HubClient;
use crate::api::inference::InferenceGateway;
use crate::cli::model_list::print_models;
use crate::core::config::data::path_display;
use crate::core::config::Config;
use crate::core::controller::SessionController;
use crate::core::models::ModelRegistry;
use crate::core::store::SessionStore;
use crate::ui::server::{serve, AppState};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(name = "chatpane")]
#[command(about = "A browser chat interface for Hugging Face hosted models")]
#[command(
    long_about = "Chatpane serves a small chat page in your browser. Each visitor enters a \
Hugging Face access token, picks one of the configured models, and chats with it through \
the Hugging Face inference API.\n\n\
Environment Variables:\n\
  RUST_LOG          Log filter (overrides --log-level and the config file)"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Read configuration from this file instead of the default location
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:8501
    #[arg(short = 'b', long, global = true, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Log level or filter directive used when RUST_LOG is unset
    #[arg(short = 'l', long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the web interface (default)
    Serve,
    /// List the models users can choose from
    Models,
    /// Show the effective configuration
    Config,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    tokio::runtime::Runtime::new()?.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Models => {
            let registry = load_registry(&config);
            print_models(&registry, &config);
            Ok(())
        }
        Commands::Config => {
            match args.config.clone().or_else(Config::get_config_path) {
                Some(path) => println!("Config file: {}", path_display(path)),
                None => println!("Config file: (none)"),
            }
            config.print_all();
            Ok(())
        }
        Commands::Serve => {
            let log_level = args.log_level.as_deref().unwrap_or(config.log_level());
            init_tracing(log_level);

            let bind = args.bind.as_deref().unwrap_or(config.bind());
            let addr: SocketAddr = match bind.parse() {
                Ok(addr) => addr,
                Err(e) => {
                    eprintln!("❌ Invalid bind address '{bind}': {e}");
                    std::process::exit(1);
                }
            };

            let state = build_state(&config)?;
            info!(
                models = state.controller.registry().entries().len(),
                hub = config.hub_url(),
                inference = config.inference_url(),
                "starting chat server"
            );
            let idle = config.session_idle_timeout();
            let reaper = state
                .store
                .spawn_reaper(idle.min(SESSION_SWEEP_INTERVAL), idle);
            let served = serve(addr, state).await;
            reaper.abort();
            served?;
            Ok(())
        }
    }
}

fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_registry(config: &Config) -> ModelRegistry {
    match ModelRegistry::from_config(config) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    }
}

/// Wire the HTTP client, remote clients, registry and session store together.
pub fn build_state(config: &Config) -> Result<AppState, Box<dyn Error>> {
    let registry = Arc::new(load_registry(config));
    let http = reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("chatpane/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let controller = SessionController::new(
        Arc::clone(&registry),
        Arc::new(HubClient::new(http.clone(), config.hub_url())),
        Arc::new(InferenceGateway::new(
            http,
            config.inference_url(),
            config.max_tokens(),
        )),
    );
    let store = SessionStore::new(registry, config.system_prompt());
    Ok(AppState::new(store, controller))
}
