#![warn(missing_docs)]
//! # insight-chat-app
//!
//! ## Purpose
//! Orchestrates session, feature selection, input adapters, transport and UI
//! state for `insight-chat`.
//!
//! ## Responsibilities
//! - Gate the main interface behind login and the startup session check.
//! - Turn picked files and typed text into analysis submissions.
//! - Map every reply or failure into exactly one conversation entry.
//! - Load runtime configuration from the environment and set up logging.
//!
//! ## Data flow
//! Front-end event -> [`ChatController`] -> staged input + optimistic user
//! message -> transport -> reply mapping -> [`insight_chat_ui::UiState`].
//!
//! ## Ownership and lifetimes
//! The controller exclusively owns all mutable state; every mutation takes
//! `&mut self`, so two submissions can never interleave.
//!
//! ## Error model
//! Remote failures become conversation entries. [`ControllerError`] is
//! reserved for local misuse and validation, [`AppError`] for startup.
//!
//! ## Security and privacy notes
//! - Credentials and cookies are never logged.
//! - Log redaction helpers strip password/token/cookie strings.
//! - No credential is hard-coded anywhere.

mod config;
mod controller;

pub use config::{API_BASE_URL_ENV, AppConfig, DEFAULT_API_BASE_URL, DEFAULT_LOG_FILTER, LOG_FILTER_ENV};
pub use controller::{
    AUTH_REQUIRED_MESSAGE, ChatController, Clock, ControllerError, GENERIC_FAILURE_MESSAGE,
    PendingSubmission, unix_timestamp_millis,
};

use insight_chat_auth::AuthError;
use insight_chat_transport::TransportError;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("INSIGHT_CHAT_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Installs the stderr `tracing` subscriber.
///
/// Invalid filter directives fall back to [`DEFAULT_LOG_FILTER`]. Calling
/// this twice keeps the first subscriber.
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Redacts common secret markers in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for key in ["password", "token", "authorization", "cookie", "session="] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

/// Replaces the value after every occurrence of `key`. A value runs from the
/// first character after `=`, `:`, spaces or quotes up to whitespace, `;`,
/// `&`, `,` or a quote.
fn redact_key_value(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    let mut redacted = String::with_capacity(input.len());
    let mut cursor = 0;

    while let Some(offset) = lower[cursor..].find(key) {
        let key_end = cursor + offset + key.len();
        let value_start = input[key_end..]
            .find(|c: char| !matches!(c, '=' | ':' | ' ' | '"'))
            .map_or(input.len(), |skip| key_end + skip);
        let value_end = input[value_start..]
            .find(|c: char| c.is_whitespace() || matches!(c, ';' | '&' | ',' | '"'))
            .map_or(input.len(), |len| value_start + len);

        redacted.push_str(&input[cursor..key_end]);
        if !key.ends_with('=') {
            redacted.push('=');
        }
        redacted.push_str("<redacted>");
        cursor = value_end;
    }

    redacted.push_str(&input[cursor..]);
    redacted
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Auth subsystem error (including base URL policy).
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),
    /// Transport construction or call error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Controller misuse or validation error.
    #[error("controller error: {0}")]
    Controller(#[from] ControllerError),
}
