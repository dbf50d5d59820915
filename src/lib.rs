//! Chatpane is a small browser chat interface for models hosted behind the
//! Hugging Face inference API.
//!
//! The crate is organized around a few collaborating layers:
//! - [`core`] owns per-visitor sessions, the model registry, configuration,
//!   and the action/command state machine that drives a chat.
//! - [`api`] holds the wire types and the clients for the hub identity check
//!   and the chat completion endpoint.
//! - [`ui`] renders HTML and serves it over HTTP.
//! - [`utils`] has URL helpers shared by the clients.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`], which
//! loads configuration, sets up logging, and starts [`ui::server`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
