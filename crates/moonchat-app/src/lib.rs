//! moonchat - command-line chat client for Moonshot/Kimi models
//!
//! The binary wires configuration, credentials and the completion client
//! into either a single question (`moonchat TEXT_OR_FILE...`) or an
//! interactive session (`moonchat -i`).

pub mod app;
pub mod cli;
pub mod config;

pub use cli::Cli;
pub use config::credentials::{current_user, resolve_api_key, MissingCredentialError, API_KEY_ENV};
pub use config::{ConfigLayer, Settings};
