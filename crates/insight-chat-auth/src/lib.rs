#![warn(missing_docs)]
//! # insight-chat-auth
//!
//! ## Purpose
//! Implements login primitives and session lifecycle handling for
//! `insight-chat`.
//!
//! ## Responsibilities
//! - Validate the API base URL policy (HTTPS, or HTTP on loopback only).
//! - Execute login, logout and session checks through an injectable transport.
//! - Model session transitions that gate the main interface.
//!
//! ## Data flow
//! Login form collects credentials -> [`AuthClient::login`] sends the request
//! through [`AuthTransport`] -> receives [`LoginResponse`] ->
//! [`AuthStateMachine`] updates session state.
//!
//! ## Ownership and lifetimes
//! Credentials and user identity are owned (`String`) so the state machine
//! never borrows from transient form or transport buffers.
//!
//! ## Error model
//! Server-declared login failures surface as [`AuthError::Rejected`] carrying
//! the server message; [`login_failure_message`] turns any [`AuthError`] into
//! form-ready text.
//!
//! ## Security and privacy notes
//! The session itself is an opaque cookie held by the transport. This crate
//! never logs credentials, and [`Credentials`] redacts the password in
//! `Debug` output.
//!
//! ## Example
//! ```rust
//! use insight_chat_auth::{AuthState, AuthStateMachine};
//!
//! let machine = AuthStateMachine::new();
//! assert!(matches!(machine.state(), AuthState::Unauthenticated));
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Fallback text when the server gives no reason for a failed login.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Login failed. Please try again.";

/// Hosts allowed to use plain HTTP.
const LOOPBACK_HOSTS: [&str; 3] = ["localhost", "127.0.0.1", "[::1]"];

/// User-provided login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account username.
    pub username: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// `POST /login` request body.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username for account lookup.
    pub username: String,
    /// Password for verification.
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Identity the server reports for an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Account username.
    pub username: String,
    /// Server-assigned role.
    #[serde(default)]
    pub role: Option<String>,
}

/// `POST /login` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Whether the login was accepted.
    pub success: bool,
    /// Failure reason on rejection.
    #[serde(default)]
    pub error: Option<String>,
    /// Informational message on success.
    #[serde(default)]
    pub message: Option<String>,
    /// Authenticated identity on success.
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// `GET /check-auth` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthStatusResponse {
    /// `true` only when the server confirms a live session.
    #[serde(default)]
    pub authenticated: bool,
    /// Identity of the live session.
    #[serde(default)]
    pub user: Option<UserInfo>,
}

/// Session state used to gate the main interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No session exists.
    Unauthenticated,
    /// Session confirmed by the server.
    Authenticated(Option<UserInfo>),
    /// A request was denied mid-session; the user must log in again.
    ReauthRequired,
}

/// Auth state machine with explicit legal transitions.
#[derive(Debug, Clone)]
pub struct AuthStateMachine {
    state: AuthState,
}

impl AuthStateMachine {
    /// Creates a new state machine in `Unauthenticated` state.
    pub fn new() -> Self {
        Self {
            state: AuthState::Unauthenticated,
        }
    }

    /// Returns current auth state snapshot.
    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Returns `true` while the session is confirmed.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    /// Identity of the current session, if known.
    pub fn user(&self) -> Option<&UserInfo> {
        match &self.state {
            AuthState::Authenticated(user) => user.as_ref(),
            _ => None,
        }
    }

    /// Applies login success transition.
    pub fn on_login_success(&mut self, user: Option<UserInfo>) {
        self.state = AuthState::Authenticated(user);
    }

    /// Applies the startup session check. Only an explicit confirmation
    /// authenticates; anything else leaves the state untouched.
    pub fn on_status_check(&mut self, status: &AuthStatusResponse) {
        if status.authenticated {
            self.state = AuthState::Authenticated(status.user.clone());
        }
    }

    /// A downstream request was denied authorization.
    pub fn on_authorization_lost(&mut self) {
        self.state = AuthState::ReauthRequired;
    }

    /// Explicit logout transition.
    pub fn logout(&mut self) {
        self.state = AuthState::Unauthenticated;
    }
}

impl Default for AuthStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Abstract transport used by auth client.
///
/// Implementations hold the session cookie and the API base URL.
pub trait AuthTransport: Send + Sync {
    /// Sends `POST /login`.
    ///
    /// Returns the decoded body whenever it parses as [`LoginResponse`], even
    /// for non-success HTTP statuses, so rejection reasons reach the form.
    fn login(&self, request: &LoginRequest) -> Result<LoginResponse, AuthError>;

    /// Sends `POST /logout`.
    fn logout(&self) -> Result<(), AuthError>;

    /// Sends `GET /check-auth`.
    fn check_auth(&self) -> Result<AuthStatusResponse, AuthError>;
}

/// Auth client that validates input and executes the login flow.
#[derive(Clone)]
pub struct AuthClient {
    transport: Arc<dyn AuthTransport>,
}

impl AuthClient {
    /// Creates an auth client over the given transport.
    pub fn new(transport: Arc<dyn AuthTransport>) -> Self {
        Self { transport }
    }

    /// Executes login and returns the server-reported identity.
    ///
    /// # Errors
    /// Returns [`AuthError::EmptyCredential`] for blank username/password
    /// without contacting the server, [`AuthError::Rejected`] when the server
    /// answers `success: false`, and propagates transport errors as-is.
    pub fn login(&self, credentials: &Credentials) -> Result<Option<UserInfo>, AuthError> {
        if credentials.username.trim().is_empty() || credentials.password.trim().is_empty() {
            return Err(AuthError::EmptyCredential);
        }

        let response = self.transport.login(&LoginRequest {
            username: credentials.username.trim().to_string(),
            password: credentials.password.clone(),
        })?;

        if !response.success {
            return Err(AuthError::Rejected(
                response
                    .error
                    .filter(|reason| !reason.trim().is_empty())
                    .unwrap_or_else(|| LOGIN_FALLBACK_MESSAGE.to_string()),
            ));
        }

        Ok(response.user)
    }

    /// Ends the remote session.
    ///
    /// # Errors
    /// Propagates transport errors; callers clear local state regardless.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.transport.logout()
    }

    /// Asks the server whether the current cookie is a live session.
    ///
    /// # Errors
    /// Propagates transport errors.
    pub fn check_status(&self) -> Result<AuthStatusResponse, AuthError> {
        self.transport.check_auth()
    }
}

/// Converts a login error into text for the login form.
pub fn login_failure_message(error: &AuthError) -> String {
    match error {
        AuthError::EmptyCredential => "Username and password are required".to_string(),
        AuthError::Rejected(reason) => reason.clone(),
        _ => LOGIN_FALLBACK_MESSAGE.to_string(),
    }
}

/// Validates the API base URL.
///
/// # Errors
/// Returns [`AuthError::InvalidEndpoint`] for unparseable URLs, plain HTTP to
/// non-loopback hosts, or URLs carrying a query or fragment.
pub fn validate_base_url(endpoint: &str) -> Result<Url, AuthError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| AuthError::InvalidEndpoint(format!("invalid api url: {error}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" => {
            let host = parsed.host_str().unwrap_or_default();
            if !LOOPBACK_HOSTS.contains(&host) {
                return Err(AuthError::InvalidEndpoint(
                    "api url must use https unless it targets a loopback host".to_string(),
                ));
            }
        }
        other => {
            return Err(AuthError::InvalidEndpoint(format!(
                "unsupported api url scheme: {other}"
            )));
        }
    }

    if parsed.query().is_some() || parsed.fragment().is_some() {
        return Err(AuthError::InvalidEndpoint(
            "api url must not carry a query or fragment".to_string(),
        ));
    }

    Ok(parsed)
}

/// Joins an endpoint path onto the API base URL.
pub fn endpoint_url(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Errors produced by auth client/state logic.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Base URL violates security or shape requirements.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Credentials are missing/blank.
    #[error("username and password must be non-empty")]
    EmptyCredential,
    /// Server declined the login.
    #[error("login rejected: {0}")]
    Rejected(String),
    /// Transport failure from the auth backend.
    #[error("auth transport failure: {0}")]
    Transport(String),
    /// Response payload violated the auth contract.
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
}
